//! Error types for TXT record changes
//!
//! Every failure is folded into a [`ChangeError`] at the orchestrator boundary and
//! rendered into a sanitized caller-facing message.

use thiserror::Error;

use crate::google::DnsApiError;
use crate::manager::Operation;

/// Zone resolution failures. Messages are safe to echo back to callers.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ZoneError {
    #[error("Invalid FQDN format: {0}")]
    InvalidFormat(String),

    #[error("No managed zone found for FQDN: {0}")]
    NoMatchingZone(String),
}

/// Failures of a single add/remove change
#[derive(Debug, Error)]
pub enum ChangeError {
    #[error("Missing required fields 'fqdn' or 'value'")]
    InvalidInput,

    #[error(transparent)]
    ZoneLookup(#[from] ZoneError),

    #[error("{0}")]
    Configuration(String),

    #[error("Cloud DNS API error: {0}")]
    Provider(String),

    #[error("Google API transport/auth failure: {0}")]
    Transport(String),

    #[error("Unexpected error: {0}")]
    Unexpected(String),
}

impl ChangeError {
    /// Message returned to the caller.
    ///
    /// Provider and transport details stay in the server log.
    pub fn user_message(&self, operation: Operation) -> String {
        let action = operation.as_str();
        match self {
            ChangeError::InvalidInput
            | ChangeError::ZoneLookup(_)
            | ChangeError::Configuration(_) => self.to_string(),
            ChangeError::Provider(_) => format!("Failed to {action} TXT record"),
            ChangeError::Transport(_) => format!(
                "Failed to {action} TXT record due to Google API connectivity/authentication issue"
            ),
            ChangeError::Unexpected(_) => "An unexpected error occurred".to_string(),
        }
    }
}

impl From<DnsApiError> for ChangeError {
    fn from(err: DnsApiError) -> Self {
        match err {
            DnsApiError::Api { .. } => ChangeError::Provider(err.to_string()),
            DnsApiError::Transport(_) | DnsApiError::Auth(_) => {
                ChangeError::Transport(err.to_string())
            }
            DnsApiError::Decode(_) => ChangeError::Unexpected(err.to_string()),
        }
    }
}
