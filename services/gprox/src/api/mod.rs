//! HTTP API
//!
//! - `POST /v1/dns/add`, `POST /v1/dns/remove`: TXT record changes (207 Multi-Status)
//! - `GET /v1/health`, `GET /v1/live`: probes
//! - `GET /metrics`: Prometheus exposition

pub mod models;
pub mod routes;

use axum::{
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tower_http::trace::TraceLayer;

use crate::config::Settings;
use crate::manager::DnsManager;
use crate::metrics::DnsMetrics;

#[derive(Clone)]
pub struct AppState {
    pub settings: Arc<Settings>,
    pub manager: Arc<DnsManager>,
    pub metrics: DnsMetrics,
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/v1/dns/add", post(routes::dns::add_record))
        .route("/v1/dns/remove", post(routes::dns::remove_record))
        .route("/v1/health", get(routes::health::health))
        .route("/v1/live", get(routes::health::live))
        .route("/metrics", get(routes::health::metrics))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
