//! Prometheus metrics
//!
//! Counts TXT record operations by `operation` (add/remove) and `result`
//! (success/error).

use anyhow::{Context, Result};
use prometheus::{Encoder, IntCounterVec, Opts, Registry, TextEncoder};

use crate::manager::Operation;

/// Outcome label for a change attempt
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Success,
    Error,
}

impl Outcome {
    pub fn as_str(self) -> &'static str {
        match self {
            Outcome::Success => "success",
            Outcome::Error => "error",
        }
    }
}

/// DNS request counters registered on a service-owned registry
#[derive(Clone)]
pub struct DnsMetrics {
    registry: Registry,
    requests_total: IntCounterVec,
}

impl DnsMetrics {
    pub fn new() -> Result<Self> {
        let registry = Registry::new();

        let requests_total = IntCounterVec::new(
            Opts::new(
                "gprox_dns_requests_total",
                "Counts DNS TXT record operations processed by GPROX.",
            ),
            &["operation", "result"],
        )
        .context("Failed to create gprox_dns_requests_total metric")?;

        registry
            .register(Box::new(requests_total.clone()))
            .context("Failed to register gprox_dns_requests_total metric")?;

        Ok(Self {
            registry,
            requests_total,
        })
    }

    /// Record one change attempt
    pub fn record(&self, operation: Operation, outcome: Outcome) {
        self.requests_total
            .with_label_values(&[operation.as_str(), outcome.as_str()])
            .inc();
    }

    /// Current count for a label pair
    pub fn count(&self, operation: Operation, outcome: Outcome) -> u64 {
        self.requests_total
            .with_label_values(&[operation.as_str(), outcome.as_str()])
            .get()
    }

    /// Render all metrics in the Prometheus text exposition format
    pub fn render(&self) -> Result<String> {
        let mut buffer = Vec::new();
        TextEncoder::new()
            .encode(&self.registry.gather(), &mut buffer)
            .context("Failed to encode metrics")?;
        String::from_utf8(buffer).context("Metrics output is not valid UTF-8")
    }
}
