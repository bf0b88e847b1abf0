//! TXT record change endpoints

use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use tracing::info;

use crate::api::models::{DnsChangeRequest, ErrorResponse};
use crate::api::AppState;
use crate::auth::check_api_key;
use crate::manager::Operation;

pub async fn add_record(
    State(state): State<AppState>,
    Json(req): Json<DnsChangeRequest>,
) -> impl IntoResponse {
    handle(state, Operation::Add, req).await
}

pub async fn remove_record(
    State(state): State<AppState>,
    Json(req): Json<DnsChangeRequest>,
) -> impl IntoResponse {
    handle(state, Operation::Remove, req).await
}

async fn handle(
    state: AppState,
    operation: Operation,
    req: DnsChangeRequest,
) -> axum::response::Response {
    if let Err(e) = check_api_key(&req.api_key, &state.settings.api_keys) {
        return (StatusCode::FORBIDDEN, Json(ErrorResponse::new(e.to_string()))).into_response();
    }

    info!("Received {} request for {}", operation, req.fqdn);

    let results = match operation {
        Operation::Add => state.manager.add_txt_record(&req.fqdn, &req.value).await,
        Operation::Remove => state.manager.remove_txt_record(&req.fqdn, &req.value).await,
    };

    (StatusCode::MULTI_STATUS, Json(results)).into_response()
}
