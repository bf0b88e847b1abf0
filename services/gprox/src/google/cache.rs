//! Memoized Cloud DNS client handles
//!
//! One client is built per (credentials file, timeout) pair and reused for the
//! life of the process. Concurrent first requests for the same key wait on a
//! single construction.

use std::collections::HashMap;
use std::future::Future;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::OnceCell;
use tracing::info;

use super::{CloudDnsClient, DnsApiError, ServiceAccountTokenSource};
use crate::config::Settings;

/// Identity of a client handle
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ClientKey {
    pub credentials: PathBuf,
    pub timeout_seconds: u64,
}

impl ClientKey {
    pub fn from_settings(settings: &Settings) -> Self {
        Self {
            credentials: settings.gcloud_service_account.clone(),
            timeout_seconds: settings.dns_api_timeout_seconds,
        }
    }
}

type Slot<T> = Arc<OnceCell<Arc<T>>>;

pub struct ClientCache<T = CloudDnsClient> {
    slots: Mutex<HashMap<ClientKey, Slot<T>>>,
}

impl<T> Default for ClientCache<T> {
    fn default() -> Self {
        Self {
            slots: Mutex::new(HashMap::new()),
        }
    }
}

impl<T> ClientCache<T> {
    /// Return the handle for `key`, running `init` if none exists yet.
    ///
    /// A failed `init` leaves the slot empty so a later call can try again.
    pub async fn get_or_try_init<F, Fut>(
        &self,
        key: ClientKey,
        init: F,
    ) -> Result<Arc<T>, DnsApiError>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, DnsApiError>>,
    {
        let slot = {
            let mut slots = self.slots.lock().unwrap_or_else(|e| e.into_inner());
            slots.entry(key).or_default().clone()
        };

        slot.get_or_try_init(move || async move { init().await.map(Arc::new) })
            .await
            .cloned()
    }

    /// Number of keys seen so far
    pub fn len(&self) -> usize {
        self.slots.lock().unwrap_or_else(|e| e.into_inner()).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl ClientCache<CloudDnsClient> {
    /// Client for the credentials and timeout in `settings`
    pub async fn get_or_build(
        &self,
        settings: &Settings,
    ) -> Result<Arc<CloudDnsClient>, DnsApiError> {
        let key = ClientKey::from_settings(settings);
        let credentials = key.credentials.clone();
        let timeout = Duration::from_secs(key.timeout_seconds);

        self.get_or_try_init(key, move || async move {
            info!(
                "Initializing Google Cloud DNS client with credentials {}",
                credentials.display()
            );
            let tokens = ServiceAccountTokenSource::from_file(&credentials).await?;
            CloudDnsClient::new(Arc::new(tokens), timeout)
        })
        .await
    }
}
