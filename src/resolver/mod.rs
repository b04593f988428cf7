//! Multi-vendor subscriber/VLAN topology discovery
//!
//! Resolves which interface on a concentrator carries a given PPPoE
//! username or corporate VLAN circuit, by walking vendor session MIBs,
//! ARP tables and route tables, with an SSH CLI fallback for devices
//! whose SNMP agent yields nothing.

pub mod cli;
pub mod corporate;
pub mod correlate;
pub mod oids;
pub mod ssh;
pub mod tables;

pub use corporate::lookup_corporate_link_info;
pub use correlate::lookup_pppoe_sessions;

use crate::models::Concentrator;
use oids::OidCandidate;

/// Concentrator vendor, a closed set. Selects the ordered OID-set
/// candidates, the CPU/memory table OIDs and the CLI fallback syntax.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Vendor {
    Mikrotik,
    Cisco,
    Huawei,
    Generic,
}

impl std::fmt::Display for Vendor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Vendor::Mikrotik => write!(f, "mikrotik"),
            Vendor::Cisco => write!(f, "cisco"),
            Vendor::Huawei => write!(f, "huawei"),
            Vendor::Generic => write!(f, "generic"),
        }
    }
}

/// Infers the vendor from free-text name/model hints. Pure so it can be
/// tested without a network stack. Unrecognized text defaults to
/// Mikrotik, the most common concentrator in the field.
pub fn infer_vendor(name: &str, model: &str) -> Vendor {
    let haystack = format!("{} {}", name, model).to_lowercase();
    if ["cisco", "asr", "ios"].iter().any(|t| haystack.contains(t)) {
        Vendor::Cisco
    } else if ["huawei", "ne40", "ne8k"].iter().any(|t| haystack.contains(t)) {
        Vendor::Huawei
    } else if ["mikrotik", "routeros"].iter().any(|t| haystack.contains(t)) {
        Vendor::Mikrotik
    } else {
        Vendor::Mikrotik
    }
}

/// Parses an explicit vendor tag. `None` for unknown tags so the caller
/// can fall back to inference.
pub fn vendor_from_tag(tag: &str) -> Option<Vendor> {
    match tag.trim().to_lowercase().as_str() {
        "cisco" => Some(Vendor::Cisco),
        "huawei" => Some(Vendor::Huawei),
        "mikrotik" => Some(Vendor::Mikrotik),
        "generic" => Some(Vendor::Generic),
        _ => None,
    }
}

/// Resolves the vendor for a concentrator record: the explicit tag wins,
/// otherwise it is inferred from the name/model text.
pub fn resolve_vendor(concentrator: &Concentrator) -> Vendor {
    if let Some(vendor) = concentrator.vendor.as_deref().and_then(vendor_from_tag) {
        return vendor;
    }
    infer_vendor(
        &concentrator.name,
        concentrator.model.as_deref().unwrap_or(""),
    )
}

impl Vendor {
    /// Ordered OID-set candidates tried during session correlation
    pub fn session_candidates(self) -> &'static [OidCandidate] {
        match self {
            Vendor::Mikrotik => oids::MIKROTIK_CANDIDATES,
            Vendor::Cisco => oids::CISCO_CANDIDATES,
            Vendor::Huawei => oids::HUAWEI_CANDIDATES,
            Vendor::Generic => oids::GENERIC_CANDIDATES,
        }
    }

    /// Vendor-table CPU usage OID, used when the link has no custom OID
    pub fn cpu_oid(self) -> Option<&'static [u64]> {
        match self {
            Vendor::Mikrotik | Vendor::Generic => Some(oids::HR_PROCESSOR_LOAD_FIRST),
            Vendor::Cisco => Some(oids::CISCO_CPU_5MIN),
            Vendor::Huawei => Some(oids::HUAWEI_ENTITY_CPU),
        }
    }

    /// Vendor-table memory usage OID
    pub fn memory_oid(self) -> Option<&'static [u64]> {
        match self {
            Vendor::Mikrotik | Vendor::Generic => None,
            Vendor::Cisco => Some(oids::CISCO_MEM_USED_PERCENT),
            Vendor::Huawei => Some(oids::HUAWEI_ENTITY_MEM),
        }
    }

    /// CLI command issued over the SSH fallback path
    pub fn cli_command(self) -> &'static str {
        match self {
            Vendor::Mikrotik | Vendor::Generic => "/ppp active print",
            Vendor::Cisco => "show subscriber session all",
            Vendor::Huawei => "display access-user",
        }
    }
}
