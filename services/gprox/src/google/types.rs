//! Cloud DNS v1 REST resources

use serde::{Deserialize, Serialize};

/// A resource record set (`dns#resourceRecordSet`)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceRecordSet {
    pub kind: String,
    pub name: String,
    #[serde(rename = "type")]
    pub record_type: String,
    pub ttl: u32,
    pub rrdatas: Vec<String>,
}

impl ResourceRecordSet {
    /// A single-value TXT record set. The value is wrapped in double quotes as
    /// TXT RDATA requires.
    pub fn txt(name: &str, value: &str, ttl: u32) -> Self {
        Self {
            kind: "dns#resourceRecordSet".to_string(),
            name: name.to_string(),
            record_type: "TXT".to_string(),
            ttl,
            rrdatas: vec![format!("\"{value}\"")],
        }
    }
}

/// An atomic set of additions and deletions (`dns#change`)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Change {
    pub kind: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub additions: Vec<ResourceRecordSet>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub deletions: Vec<ResourceRecordSet>,
}

impl Change {
    pub fn deletion(record: ResourceRecordSet) -> Self {
        Self {
            kind: "dns#change".to_string(),
            additions: Vec::new(),
            deletions: vec![record],
        }
    }
}

/// Error envelope returned by Google APIs
#[derive(Debug, Deserialize)]
pub(crate) struct GoogleErrorResponse {
    pub error: GoogleError,
}

#[derive(Debug, Deserialize)]
pub(crate) struct GoogleError {
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub errors: Vec<GoogleErrorDetail>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct GoogleErrorDetail {
    #[serde(default)]
    pub reason: Option<String>,
}
