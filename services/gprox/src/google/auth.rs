//! Google OAuth2 token sources
//!
//! Production tokens come from a service account JSON key file through
//! `gcloud-sdk`, which caches and refreshes them before expiry.

use async_trait::async_trait;
use gcloud_sdk::{GoogleAuthTokenGenerator, TokenSourceType};
use std::path::Path;
use tracing::debug;

use super::{DnsApiError, CLOUD_DNS_SCOPE};

/// Supplies bearer tokens for Cloud DNS requests
#[async_trait]
pub trait TokenSource: Send + Sync {
    async fn access_token(&self) -> Result<String, DnsApiError>;
}

/// Tokens minted from a service account key file
pub struct ServiceAccountTokenSource {
    generator: GoogleAuthTokenGenerator,
}

impl ServiceAccountTokenSource {
    /// Load credentials from a service account JSON file.
    ///
    /// Fails if the file does not exist or is not a valid key.
    pub async fn from_file(path: &Path) -> Result<Self, DnsApiError> {
        if !path.is_file() {
            return Err(DnsApiError::Auth(format!(
                "Google service account file is missing: {}",
                path.display()
            )));
        }

        debug!(
            "Initializing Google Cloud DNS credentials from {}",
            path.display()
        );

        let generator = GoogleAuthTokenGenerator::new(
            TokenSourceType::File(path.to_path_buf()),
            vec![CLOUD_DNS_SCOPE.to_string()],
        )
        .await
        .map_err(|e| DnsApiError::Auth(format!("Failed to load service account: {e}")))?;

        Ok(Self { generator })
    }
}

#[async_trait]
impl TokenSource for ServiceAccountTokenSource {
    async fn access_token(&self) -> Result<String, DnsApiError> {
        let token = self
            .generator
            .create_token()
            .await
            .map_err(|e| DnsApiError::Auth(format!("Failed to refresh access token: {e}")))?;

        Ok(token.token.as_sensitive_str().to_string())
    }
}

/// A fixed bearer token, for emulators and tests
#[derive(Debug, Clone)]
pub struct StaticTokenSource(String);

impl StaticTokenSource {
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }
}

#[async_trait]
impl TokenSource for StaticTokenSource {
    async fn access_token(&self) -> Result<String, DnsApiError> {
        Ok(self.0.clone())
    }
}
