//! API key validation

use subtle::ConstantTimeEq;
use thiserror::Error;
use tracing::{debug, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("Invalid API key")]
pub struct Forbidden;

/// Check a caller-supplied key against the configured keys.
///
/// Every configured key is compared so the time taken does not reveal which
/// one (if any) matched.
pub fn check_api_key(provided: &str, valid_keys: &[String]) -> Result<(), Forbidden> {
    let matched = valid_keys
        .iter()
        .fold(subtle::Choice::from(0u8), |acc, key| {
            acc | provided.as_bytes().ct_eq(key.as_bytes())
        });

    if bool::from(matched) {
        debug!(api_key = %redact(provided), "Valid API key used");
        Ok(())
    } else {
        warn!("Invalid API key presented");
        Err(Forbidden)
    }
}

/// Keep only a short prefix of a key for log lines. Short keys are hidden entirely.
fn redact(key: &str) -> String {
    if key.chars().count() <= 8 {
        return "***".to_string();
    }
    let prefix: String = key.chars().take(4).collect();
    format!("{prefix}***")
}
