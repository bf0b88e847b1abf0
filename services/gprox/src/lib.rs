//! GPROX
//!
//! HTTP proxy that provisions ACME DNS-01 challenge TXT records in Google
//! Cloud DNS on behalf of API-key authenticated callers.

pub mod api;
pub mod auth;
pub mod config;
pub mod error;
pub mod google;
pub mod manager;
pub mod metrics;
pub mod zones;
