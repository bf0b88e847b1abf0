//! Configuration Loading
//!
//! Settings are read once at startup from a YAML file and shared read-only
//! with every request handler.

use serde::de::{self, MapAccess, Visitor};
use serde::{Deserialize, Deserializer};
use std::collections::HashSet;
use std::fmt;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Environment variable naming the configuration file
pub const CONFIG_PATH_ENV: &str = "GPROX_CONFIG_PATH";

/// Configuration file used when `GPROX_CONFIG_PATH` is unset
pub const DEFAULT_CONFIG_PATH: &str = "/etc/gprox/config.yaml";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Configuration file not found: {}", .0.display())]
    NotFound(PathBuf),

    #[error("Failed to read configuration file {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse YAML configuration: {0}")]
    Parse(#[from] serde_yaml::Error),

    #[error("Configuration validation failed: {0}")]
    Invalid(String),
}

/// Top-level keys read by [`Settings`]
const KNOWN_KEYS: &[&str] = &[
    "log_level",
    "gcloud_service_account",
    "gcloud_project",
    "managed_zones",
    "api_keys",
    "ttl",
    "dns_api_num_retries",
    "dns_api_timeout_seconds",
];

/// Service settings
#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    /// Application log level (DEBUG, INFO, WARNING, ERROR, CRITICAL)
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Path to the Google Cloud service account JSON
    pub gcloud_service_account: PathBuf,

    /// Google Cloud project ID
    #[serde(default)]
    pub gcloud_project: Option<String>,

    /// Managed zone name -> domain suffix, in file order
    #[serde(default)]
    pub managed_zones: ManagedZones,

    /// Valid API keys
    #[serde(default)]
    pub api_keys: Vec<String>,

    /// TTL for created TXT records
    #[serde(default = "default_ttl")]
    pub ttl: u32,

    /// Retries for Cloud DNS API requests
    #[serde(default = "default_num_retries")]
    pub dns_api_num_retries: u32,

    /// HTTP timeout in seconds for Cloud DNS API requests
    #[serde(default = "default_timeout_seconds")]
    pub dns_api_timeout_seconds: u64,

    /// Keys present in the file but not used by the service
    #[serde(skip)]
    unknown_keys: Vec<String>,
}

fn default_log_level() -> String {
    "INFO".to_string()
}
fn default_ttl() -> u32 {
    300
}
fn default_num_retries() -> u32 {
    3
}
fn default_timeout_seconds() -> u64 {
    10
}

impl Settings {
    /// Parse and validate settings from YAML text.
    ///
    /// An empty document is treated as an empty mapping.
    pub fn from_yaml_str(content: &str) -> Result<Self, ConfigError> {
        let value: serde_yaml::Value = serde_yaml::from_str(content)?;
        let value = if value.is_null() {
            serde_yaml::Value::Mapping(serde_yaml::Mapping::new())
        } else {
            value
        };

        let unknown_keys = match &value {
            serde_yaml::Value::Mapping(map) => map
                .keys()
                .filter_map(serde_yaml::Value::as_str)
                .filter(|key| !KNOWN_KEYS.contains(key))
                .map(str::to_string)
                .collect(),
            _ => Vec::new(),
        };

        let mut settings: Settings = serde_yaml::from_value(value)?;
        settings.unknown_keys = unknown_keys;
        settings.validate()?;
        Ok(settings)
    }

    /// Non-fatal problems found while loading, for logging once tracing is up
    pub fn warnings(&self) -> Vec<String> {
        let duplicates = self.managed_zones.duplicate_domains().into_iter().map(|domain| {
            format!(
                "Domain {domain} is configured for several managed zones, \
                 the first one listed wins"
            )
        });
        let unknown = self
            .unknown_keys
            .iter()
            .map(|key| format!("Ignoring unknown configuration key: {key}"));

        duplicates.chain(unknown).collect()
    }

    /// Project ID, if configured and non-empty
    pub fn project_id(&self) -> Option<&str> {
        self.gcloud_project
            .as_deref()
            .map(str::trim)
            .filter(|p| !p.is_empty())
    }

    /// `tracing` filter directive for the configured log level
    pub fn log_directive(&self) -> Option<&'static str> {
        match self.log_level.trim().to_ascii_uppercase().as_str() {
            "TRACE" => Some("trace"),
            "DEBUG" => Some("debug"),
            "INFO" => Some("info"),
            "WARN" | "WARNING" => Some("warn"),
            "ERROR" | "CRITICAL" | "FATAL" => Some("error"),
            _ => None,
        }
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.dns_api_timeout_seconds < 1 {
            return Err(ConfigError::Invalid(
                "dns_api_timeout_seconds must be at least 1".to_string(),
            ));
        }

        if self.log_directive().is_none() {
            return Err(ConfigError::Invalid(format!(
                "unknown log_level: {}",
                self.log_level
            )));
        }

        for zone in self.managed_zones.iter() {
            if zone.name.trim().is_empty() || zone.domain.trim().is_empty() {
                return Err(ConfigError::Invalid(format!(
                    "managed zone '{}' must have a non-empty name and domain",
                    zone.name
                )));
            }
        }

        Ok(())
    }
}

/// Load settings from a YAML file
pub fn load_settings(path: &Path) -> Result<Settings, ConfigError> {
    if !path.is_file() {
        return Err(ConfigError::NotFound(path.to_path_buf()));
    }

    let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: path.to_path_buf(),
        source,
    })?;

    Settings::from_yaml_str(&content)
}

/// A single managed zone entry
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ManagedZone {
    pub name: String,
    pub domain: String,
}

/// Managed zones keyed by name, keeping the order they were configured in
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ManagedZones(Vec<ManagedZone>);

impl ManagedZones {
    /// Name of the first zone whose domain equals `domain`
    pub fn find_by_domain(&self, domain: &str) -> Option<&str> {
        self.0
            .iter()
            .find(|zone| zone.domain == domain)
            .map(|zone| zone.name.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = &ManagedZone> {
        self.0.iter()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    fn duplicate_domains(&self) -> Vec<&str> {
        let mut seen = HashSet::new();
        let mut duplicates = Vec::new();
        for zone in &self.0 {
            if !seen.insert(zone.domain.as_str()) && !duplicates.contains(&zone.domain.as_str()) {
                duplicates.push(zone.domain.as_str());
            }
        }
        duplicates
    }
}

impl FromIterator<(String, String)> for ManagedZones {
    fn from_iter<I: IntoIterator<Item = (String, String)>>(iter: I) -> Self {
        Self(
            iter.into_iter()
                .map(|(name, domain)| ManagedZone { name, domain })
                .collect(),
        )
    }
}

impl<'de> Deserialize<'de> for ManagedZones {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        struct ZonesVisitor;

        impl<'de> Visitor<'de> for ZonesVisitor {
            type Value = ManagedZones;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("a mapping of managed zone name to domain")
            }

            fn visit_unit<E: de::Error>(self) -> Result<Self::Value, E> {
                Ok(ManagedZones::default())
            }

            fn visit_map<A>(self, mut map: A) -> Result<Self::Value, A::Error>
            where
                A: MapAccess<'de>,
            {
                let mut zones: Vec<ManagedZone> = Vec::new();
                while let Some((name, domain)) = map.next_entry::<String, String>()? {
                    if zones.iter().any(|zone| zone.name == name) {
                        return Err(de::Error::custom(format!(
                            "duplicate managed zone: {name}"
                        )));
                    }
                    zones.push(ManagedZone { name, domain });
                }
                Ok(ManagedZones(zones))
            }
        }

        deserializer.deserialize_any(ZonesVisitor)
    }
}
