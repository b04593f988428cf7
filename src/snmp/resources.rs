//! Optional CPU/memory percentage sampling
//!
//! Queries whichever of the two OIDs are configured for a link. The
//! precedence (explicit custom OID over vendor-table OID) is decided by
//! the caller; this module just fetches and sanitizes percentages.

use crate::models::{SnmpProfile, SystemResources};
use crate::snmp::{SnmpClient, WireValue, parse_oid_str};

/// Coerces an SNMP value into a percentage. `NoSuchObject` and
/// `NoSuchInstance` mean the agent has no such metric and count as 0,
/// not as an error. Values outside [0,100] or non-finite become 0.
fn sanitize_percentage(value: &WireValue) -> f64 {
    let raw = match value {
        WireValue::Int(v) => *v as f64,
        WireValue::Uint(v) => *v as f64,
        WireValue::Bytes(bytes) => String::from_utf8_lossy(bytes)
            .trim()
            .parse::<f64>()
            .unwrap_or(0.0),
        WireValue::NoSuchObject | WireValue::NoSuchInstance => 0.0,
        _ => 0.0,
    };
    if raw.is_finite() && (0.0..=100.0).contains(&raw) {
        raw
    } else {
        0.0
    }
}

/// Fetches CPU/memory usage over whichever OIDs are present.
///
/// Returns `None` immediately when neither OID is supplied or parseable,
/// and `None` when the session cannot be established. A missing metric
/// on an otherwise healthy session reads as 0.
pub async fn get_system_resources(
    ip: &str,
    profile: &SnmpProfile,
    cpu_oid: Option<&str>,
    memory_oid: Option<&str>,
) -> Option<SystemResources> {
    let cpu = cpu_oid.and_then(parse_oid_str);
    let memory = memory_oid.and_then(parse_oid_str);
    if cpu.is_none() && memory.is_none() {
        return None;
    }

    let mut client = SnmpClient::connect(ip, profile).await?;
    let mut resources = SystemResources::default();

    if let Some(oid) = cpu {
        if let Some(varbind) = client.get(&oid).await {
            resources.cpu_usage = sanitize_percentage(&varbind.value);
        }
    }
    if let Some(oid) = memory {
        if let Some(varbind) = client.get(&oid).await {
            resources.memory_usage = sanitize_percentage(&varbind.value);
        }
    }

    client.close();
    Some(resources)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn percentages_are_sanitized() {
        assert_eq!(sanitize_percentage(&WireValue::Int(42)), 42.0);
        assert_eq!(sanitize_percentage(&WireValue::Uint(100)), 100.0);
        assert_eq!(sanitize_percentage(&WireValue::Int(-5)), 0.0);
        assert_eq!(sanitize_percentage(&WireValue::Uint(250)), 0.0);
        assert_eq!(sanitize_percentage(&WireValue::Bytes(b"37.5".to_vec())), 37.5);
        assert_eq!(sanitize_percentage(&WireValue::Bytes(b"junk".to_vec())), 0.0);
    }

    #[test]
    fn missing_object_counts_as_zero_not_error() {
        assert_eq!(sanitize_percentage(&WireValue::NoSuchObject), 0.0);
        assert_eq!(sanitize_percentage(&WireValue::NoSuchInstance), 0.0);
    }
}
