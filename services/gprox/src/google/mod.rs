//! Google Cloud DNS
//!
//! REST client for the Cloud DNS v1 API, authenticated with service-account
//! OAuth2 tokens.
//!
//! - `auth`: bearer token sources
//! - `client`: record set creation and change submission with retries
//! - `cache`: process-wide memoized client handles

pub mod auth;
pub mod cache;
pub mod client;
pub mod types;

use thiserror::Error;

pub use auth::{ServiceAccountTokenSource, StaticTokenSource, TokenSource};
pub use cache::{ClientCache, ClientKey};
pub use client::{Backoff, CloudDnsClient, CLOUD_DNS_API};
pub use types::{Change, ResourceRecordSet};

/// OAuth2 scope for reading and writing Cloud DNS records
pub const CLOUD_DNS_SCOPE: &str = "https://www.googleapis.com/auth/ndev.clouddns.readwrite";

#[derive(Debug, Error)]
pub enum DnsApiError {
    /// The API answered with a non-2xx status
    #[error("Cloud DNS API returned {status}: {message}")]
    Api {
        status: u16,
        message: String,
        reason: Option<String>,
    },

    /// Connection, TLS, timeout or body read failure
    #[error("Cloud DNS transport error: {0}")]
    Transport(String),

    /// Credential loading or token refresh failure
    #[error("Google credentials error: {0}")]
    Auth(String),

    /// A 2xx response whose body is not JSON
    #[error("Failed to decode Cloud DNS response: {0}")]
    Decode(String),
}

impl DnsApiError {
    /// Whether the request may succeed if sent again
    pub fn is_retryable(&self) -> bool {
        match self {
            DnsApiError::Transport(_) => true,
            DnsApiError::Api { status, reason, .. } => {
                *status == 429
                    || *status >= 500
                    || (*status == 403
                        && matches!(
                            reason.as_deref(),
                            Some("rateLimitExceeded") | Some("userRateLimitExceeded")
                        ))
            }
            DnsApiError::Auth(_) | DnsApiError::Decode(_) => false,
        }
    }
}
