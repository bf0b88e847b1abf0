//! TXT Record Change Orchestration
//!
//! Validates a change request, resolves the managed zone, calls Cloud DNS and
//! folds the outcome into a [`ChangeResult`]. Every call increments the
//! request counter exactly once.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{error, warn};

use crate::config::Settings;
use crate::error::ChangeError;
use crate::google::{ClientCache, CloudDnsClient, DnsApiError, ResourceRecordSet};
use crate::metrics::{DnsMetrics, Outcome};
use crate::zones::resolve_zone;

/// Remote create/delete of TXT record sets
#[async_trait]
pub trait RecordChanger: Send + Sync {
    async fn create_txt_record(
        &self,
        project_id: &str,
        managed_zone: &str,
        record: &ResourceRecordSet,
        num_retries: u32,
    ) -> Result<serde_json::Value, DnsApiError>;

    async fn delete_txt_record(
        &self,
        project_id: &str,
        managed_zone: &str,
        record: &ResourceRecordSet,
        num_retries: u32,
    ) -> Result<serde_json::Value, DnsApiError>;
}

/// Hands out the [`RecordChanger`] to use for the current settings
#[async_trait]
pub trait ChangerSource: Send + Sync {
    async fn changer(&self, settings: &Settings) -> Result<Arc<dyn RecordChanger>, DnsApiError>;
}

#[async_trait]
impl ChangerSource for ClientCache<CloudDnsClient> {
    async fn changer(&self, settings: &Settings) -> Result<Arc<dyn RecordChanger>, DnsApiError> {
        let client: Arc<dyn RecordChanger> = self.get_or_build(settings).await?;
        Ok(client)
    }
}

/// A ready-made changer is its own source
#[async_trait]
impl ChangerSource for Arc<dyn RecordChanger> {
    async fn changer(&self, _settings: &Settings) -> Result<Arc<dyn RecordChanger>, DnsApiError> {
        Ok(self.clone())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    Add,
    Remove,
}

impl Operation {
    pub fn as_str(self) -> &'static str {
        match self {
            Operation::Add => "add",
            Operation::Remove => "remove",
        }
    }

    fn success_message(self) -> &'static str {
        match self {
            Operation::Add => "TXT record added successfully",
            Operation::Remove => "TXT record removed successfully",
        }
    }
}

impl std::fmt::Display for Operation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChangeStatus {
    Success,
    Error,
}

/// Outcome of one change request
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChangeResult {
    pub fqdn: String,
    pub status: ChangeStatus,
    pub message: String,
    /// Raw Cloud DNS response, on success only
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub response: Option<serde_json::Value>,
}

impl ChangeResult {
    fn success(fqdn: &str, message: &str, response: serde_json::Value) -> Self {
        Self {
            fqdn: fqdn.to_string(),
            status: ChangeStatus::Success,
            message: message.to_string(),
            response: Some(response),
        }
    }

    fn error(fqdn: &str, message: String) -> Self {
        Self {
            fqdn: fqdn.to_string(),
            status: ChangeStatus::Error,
            message,
            response: None,
        }
    }
}

/// Absolute record name for an FQDN.
///
/// The dot is appended unconditionally: callers send relative names.
pub fn record_name(fqdn: &str) -> String {
    format!("{fqdn}.")
}

pub struct DnsManager {
    settings: Arc<Settings>,
    changers: Arc<dyn ChangerSource>,
    metrics: DnsMetrics,
}

impl DnsManager {
    pub fn new(
        settings: Arc<Settings>,
        changers: Arc<dyn ChangerSource>,
        metrics: DnsMetrics,
    ) -> Self {
        Self {
            settings,
            changers,
            metrics,
        }
    }

    pub async fn add_txt_record(&self, fqdn: &str, value: &str) -> Vec<ChangeResult> {
        vec![self.handle_change(Operation::Add, fqdn, value).await]
    }

    pub async fn remove_txt_record(&self, fqdn: &str, value: &str) -> Vec<ChangeResult> {
        vec![self.handle_change(Operation::Remove, fqdn, value).await]
    }

    /// Apply one change and record its outcome
    pub async fn handle_change(
        &self,
        operation: Operation,
        fqdn: &str,
        value: &str,
    ) -> ChangeResult {
        match self.apply(operation, fqdn, value).await {
            Ok(response) => {
                self.metrics.record(operation, Outcome::Success);
                ChangeResult::success(fqdn, operation.success_message(), response)
            }
            Err(err) => {
                match &err {
                    ChangeError::InvalidInput
                    | ChangeError::ZoneLookup(_)
                    | ChangeError::Configuration(_) => warn!("{}", err),
                    ChangeError::Provider(detail) => {
                        error!("Failed to {} TXT record for {}: {}", operation, fqdn, detail)
                    }
                    ChangeError::Transport(detail) => error!(
                        "Google API transport/auth failure while attempting to {} TXT record \
                         for {}: {}",
                        operation, fqdn, detail
                    ),
                    ChangeError::Unexpected(detail) => {
                        error!("Unexpected error for {}: {}", fqdn, detail)
                    }
                }

                self.metrics.record(operation, Outcome::Error);
                ChangeResult::error(fqdn, err.user_message(operation))
            }
        }
    }

    async fn apply(
        &self,
        operation: Operation,
        fqdn: &str,
        value: &str,
    ) -> Result<serde_json::Value, ChangeError> {
        if fqdn.is_empty() || value.is_empty() {
            return Err(ChangeError::InvalidInput);
        }

        let managed_zone = resolve_zone(fqdn, &self.settings.managed_zones)?;
        let project_id = self.settings.project_id().ok_or_else(|| {
            ChangeError::Configuration("gcloud_project is not configured".to_string())
        })?;

        let record = ResourceRecordSet::txt(&record_name(fqdn), value, self.settings.ttl);
        let retries = self.settings.dns_api_num_retries;
        let changer = self.changers.changer(&self.settings).await?;

        let response = match operation {
            Operation::Add => {
                changer
                    .create_txt_record(project_id, &managed_zone, &record, retries)
                    .await?
            }
            Operation::Remove => {
                changer
                    .delete_txt_record(project_id, &managed_zone, &record, retries)
                    .await?
            }
        };

        Ok(response)
    }
}
