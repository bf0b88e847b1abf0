//! Request and response bodies

use serde::{Deserialize, Serialize};

pub use crate::manager::{ChangeResult, ChangeStatus};

/// Body of `/v1/dns/add` and `/v1/dns/remove`
#[derive(Debug, Clone, Default, Deserialize)]
pub struct DnsChangeRequest {
    #[serde(default)]
    pub api_key: String,
    #[serde(default)]
    pub fqdn: String,
    #[serde(default)]
    pub value: String,
}

/// Single-object error body, used for authentication failures
#[derive(Debug, Clone, Serialize)]
pub struct ErrorResponse {
    pub status: ChangeStatus,
    pub message: String,
}

impl ErrorResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            status: ChangeStatus::Error,
            message: message.into(),
        }
    }
}
