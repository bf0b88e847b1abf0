//! Cloud DNS API Client
//!
//! Creates TXT record sets and submits deletion changes against
//! `dns.googleapis.com`. Transient failures (transport errors, 429, 5xx and
//! rate-limit 403s) are retried with exponential backoff.

use async_trait::async_trait;
use reqwest::Client;
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

use super::types::{Change, GoogleErrorResponse, ResourceRecordSet};
use super::{DnsApiError, TokenSource};
use crate::manager::RecordChanger;

pub const CLOUD_DNS_API: &str = "https://dns.googleapis.com";

/// Exponential backoff between retries
#[derive(Debug, Clone, Copy)]
pub struct Backoff {
    pub base: Duration,
    pub max: Duration,
}

impl Default for Backoff {
    fn default() -> Self {
        Self {
            base: Duration::from_secs(1),
            max: Duration::from_secs(32),
        }
    }
}

impl Backoff {
    /// Delay before retry number `attempt` (0-based): base, 2*base, 4*base, ...
    pub fn delay(&self, attempt: u32) -> Duration {
        self.base
            .saturating_mul(2u32.saturating_pow(attempt))
            .min(self.max)
    }
}

/// Cloud DNS v1 client
pub struct CloudDnsClient {
    http_client: Client,
    tokens: Arc<dyn TokenSource>,
    base_url: String,
    backoff: Backoff,
}

impl CloudDnsClient {
    /// Create a client whose requests are bounded by `timeout`
    pub fn new(tokens: Arc<dyn TokenSource>, timeout: Duration) -> Result<Self, DnsApiError> {
        let http_client = Client::builder()
            .user_agent(concat!("gprox/", env!("CARGO_PKG_VERSION")))
            .timeout(timeout)
            .build()
            .map_err(|e| DnsApiError::Transport(format!("Failed to create HTTP client: {e}")))?;

        Ok(Self {
            http_client,
            tokens,
            base_url: CLOUD_DNS_API.to_string(),
            backoff: Backoff::default(),
        })
    }

    /// Point the client at another endpoint (emulators, tests)
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    pub fn with_backoff(mut self, backoff: Backoff) -> Self {
        self.backoff = backoff;
        self
    }

    fn zone_url(&self, project_id: &str, managed_zone: &str, collection: &str) -> String {
        format!(
            "{}/dns/v1/projects/{}/managedZones/{}/{}",
            self.base_url, project_id, managed_zone, collection
        )
    }

    /// Create a resource record set in a managed zone
    pub async fn create_record_set(
        &self,
        project_id: &str,
        managed_zone: &str,
        record: &ResourceRecordSet,
        num_retries: u32,
    ) -> Result<serde_json::Value, DnsApiError> {
        debug!(body = ?record, "Attempting to add record set");

        let url = self.zone_url(project_id, managed_zone, "rrsets");
        let response = self.post_json(&url, record, num_retries).await?;

        info!(
            "TXT record added: {} with value {}",
            record.name,
            record.rrdatas.join(" ")
        );
        Ok(response)
    }

    /// Submit a change (additions and/or deletions) to a managed zone
    pub async fn create_change(
        &self,
        project_id: &str,
        managed_zone: &str,
        change: &Change,
        num_retries: u32,
    ) -> Result<serde_json::Value, DnsApiError> {
        debug!(body = ?change, "Attempting to submit change");

        let url = self.zone_url(project_id, managed_zone, "changes");
        let response = self.post_json(&url, change, num_retries).await?;

        for record in &change.deletions {
            info!(
                "TXT record removed: {} with value {}",
                record.name,
                record.rrdatas.join(" ")
            );
        }
        Ok(response)
    }

    async fn post_json<T>(
        &self,
        url: &str,
        body: &T,
        num_retries: u32,
    ) -> Result<serde_json::Value, DnsApiError>
    where
        T: Serialize + ?Sized + Sync,
    {
        let mut attempt = 0;
        loop {
            match self.post_once(url, body).await {
                Ok(response) => return Ok(response),
                Err(e) if attempt < num_retries && e.is_retryable() => {
                    let delay = self.backoff.delay(attempt);
                    warn!(
                        "Cloud DNS request failed (attempt {}/{}), retrying in {:.1}s: {}",
                        attempt + 1,
                        num_retries + 1,
                        delay.as_secs_f32(),
                        e
                    );
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
                Err(e) => return Err(e),
            }
        }
    }

    async fn post_once<T>(&self, url: &str, body: &T) -> Result<serde_json::Value, DnsApiError>
    where
        T: Serialize + ?Sized + Sync,
    {
        let token = self.tokens.access_token().await?;

        debug!("POST {}", url);
        let response = self
            .http_client
            .post(url)
            .bearer_auth(&token)
            .json(body)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    DnsApiError::Transport(format!("Request timed out: {e}"))
                } else {
                    DnsApiError::Transport(format!("Failed to call Cloud DNS API: {e}"))
                }
            })?;

        let status = response.status();
        let text = response
            .text()
            .await
            .map_err(|e| DnsApiError::Transport(format!("Failed to read response body: {e}")))?;

        debug!(status = status.as_u16(), body = %text, "Cloud DNS response");

        if !status.is_success() {
            return Err(api_error(status.as_u16(), &text));
        }

        serde_json::from_str(&text).map_err(|e| DnsApiError::Decode(e.to_string()))
    }
}

/// Build an API error, preferring the message from Google's error envelope
fn api_error(status: u16, body: &str) -> DnsApiError {
    match serde_json::from_str::<GoogleErrorResponse>(body) {
        Ok(parsed) => DnsApiError::Api {
            status,
            message: parsed.error.message,
            reason: parsed.error.errors.into_iter().find_map(|d| d.reason),
        },
        Err(_) => DnsApiError::Api {
            status,
            message: body.chars().take(512).collect(),
            reason: None,
        },
    }
}

#[async_trait]
impl RecordChanger for CloudDnsClient {
    async fn create_txt_record(
        &self,
        project_id: &str,
        managed_zone: &str,
        record: &ResourceRecordSet,
        num_retries: u32,
    ) -> Result<serde_json::Value, DnsApiError> {
        self.create_record_set(project_id, managed_zone, record, num_retries)
            .await
    }

    async fn delete_txt_record(
        &self,
        project_id: &str,
        managed_zone: &str,
        record: &ResourceRecordSet,
        num_retries: u32,
    ) -> Result<serde_json::Value, DnsApiError> {
        let change = Change::deletion(record.clone());
        self.create_change(project_id, managed_zone, &change, num_retries)
            .await
    }
}
