//! Managed Zone Resolution
//!
//! Maps an ACME challenge FQDN (e.g. `_acme-challenge.host.example.com`) onto the
//! Cloud DNS managed zone that owns it.

use tracing::debug;

use crate::config::ManagedZones;
use crate::error::ZoneError;

/// Prefix every DNS-01 challenge record must carry.
pub const ACME_CHALLENGE_PREFIX: &str = "_acme-challenge.";

/// Resolve the managed zone name for a challenge FQDN.
///
/// Zones are checked in configuration order, so when two zones could own the
/// same candidate suffix the one registered first wins.
pub fn resolve_zone(fqdn: &str, managed_zones: &ManagedZones) -> Result<String, ZoneError> {
    debug!(fqdn = %fqdn, "Parsing FQDN");

    let stripped = fqdn
        .strip_prefix(ACME_CHALLENGE_PREFIX)
        .ok_or_else(|| ZoneError::InvalidFormat(fqdn.to_string()))?;

    // Wildcard certificates request `_acme-challenge.<zone domain>` directly
    if let Some(zone) = managed_zones.find_by_domain(stripped) {
        debug!(zone = %zone, "Matched managed zone on apex");
        return Ok(zone.to_string());
    }

    let stripped = stripped.strip_suffix('.').unwrap_or(stripped);
    let labels: Vec<&str> = stripped.split('.').collect();

    // Skip the host label and test the remaining suffixes, shortest skip first
    for i in 1..labels.len() {
        let candidate = labels[i..].join(".");
        debug!(candidate = %candidate, "Testing possible domain");

        if let Some(zone) = managed_zones.find_by_domain(&candidate) {
            debug!(zone = %zone, domain = %candidate, "Matched managed zone");
            return Ok(zone.to_string());
        }
    }

    Err(ZoneError::NoMatchingZone(fqdn.to_string()))
}
