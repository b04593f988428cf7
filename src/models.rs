//! Data models for link monitoring and topology discovery

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A monitored WAN circuit. Owned by the administration subsystem;
/// this core only mutates the measured columns on each tick.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Link {
    pub id: i64,
    pub name: String,
    /// IP probed with ICMP
    pub monitored_ip: String,
    /// Router queried over SNMP (may differ from the monitored IP)
    pub snmp_router_ip: Option<String>,
    pub snmp_profile_id: Option<i64>,
    pub snmp_interface_index: Option<u32>,
    /// Vendor tag of the terminating equipment, used for CPU/memory OID fallback
    pub equipment_vendor: Option<String>,
    pub custom_cpu_oid: Option<String>,
    pub custom_memory_oid: Option<String>,
    pub latency_threshold: f64,
    pub packet_loss_threshold: f64,
    pub monitoring_enabled: bool,
    pub current_download: f64,
    pub current_upload: f64,
    pub latency: f64,
    pub packet_loss: f64,
    pub cpu_usage: f64,
    pub memory_usage: f64,
    pub status: LinkStatus,
    pub uptime: f64,
    pub last_updated: Option<DateTime<Utc>>,
}

/// SNMP credential profile, immutable for the duration of a tick
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SnmpProfile {
    pub id: i64,
    pub name: String,
    /// "1", "2c" or "3"
    pub version: String,
    pub port: u16,
    /// v1/v2c community
    pub community: Option<String>,
    /// v3 security name
    pub username: Option<String>,
    /// "noAuthNoPriv", "authNoPriv" or "authPriv"
    pub security_level: Option<String>,
    /// "MD5" or "SHA"
    pub auth_algorithm: Option<String>,
    pub auth_password: Option<String>,
    /// "DES" or "AES"
    pub priv_algorithm: Option<String>,
    pub priv_password: Option<String>,
    pub timeout_ms: u64,
    pub retries: u32,
}

/// A subscriber-aggregation or access device (BRAS, concentrator, PE router)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Concentrator {
    pub id: i64,
    pub name: String,
    pub model: Option<String>,
    /// Explicit vendor tag; inferred from name/model when absent
    pub vendor: Option<String>,
    pub ip_address: String,
    pub ssh_user: Option<String>,
    pub ssh_password: Option<String>,
    pub ssh_port: Option<u16>,
    pub snmp_profile_id: Option<i64>,
}

/// Raw 64-bit octet counters for one `(link, ifIndex)` pair.
/// Exactly one previous sample is retained per link id, in memory only.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct InterfaceCounterSample {
    pub in_octets: u64,
    pub out_octets: u64,
    /// Milliseconds since the Unix epoch
    pub timestamp_ms: i64,
}

/// Derived traffic rates, always non-negative and finite
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct TrafficRate {
    pub download_mbps: f64,
    pub upload_mbps: f64,
}

/// Result of a round of ICMP probes against one host
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct ProbeResult {
    pub latency_ms: f64,
    /// Percent, 0-100
    pub packet_loss: f64,
    pub success: bool,
}

impl ProbeResult {
    /// Canonical failure value: total loss, no latency
    pub fn failed() -> Self {
        Self {
            latency_ms: 0.0,
            packet_loss: 100.0,
            success: false,
        }
    }
}

/// CPU/memory usage percentages fetched over SNMP
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct SystemResources {
    pub cpu_usage: f64,
    pub memory_usage: f64,
}

/// Discovered PPPoE subscriber session
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PppoeSessionInfo {
    pub username: String,
    pub ip_address: Option<String>,
    pub mac_address: Option<String>,
    pub if_index: Option<u32>,
    pub if_name: Option<String>,
    pub if_alias: Option<String>,
}

/// Discovered corporate (non-PPPoE) circuit binding
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CorporateLinkInfo {
    pub vlan_interface: String,
    pub if_index: Option<u32>,
    pub ip_address: Option<String>,
    pub mac_address: Option<String>,
    /// Public /32 routed through the interface, used for external
    /// reputation monitoring. Distinct from the ARP-resolved client IP.
    pub ip_block: Option<String>,
}

/// Link health state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LinkStatus {
    Operational,
    Degraded,
    Offline,
}

impl std::fmt::Display for LinkStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LinkStatus::Operational => write!(f, "operational"),
            LinkStatus::Degraded => write!(f, "degraded"),
            LinkStatus::Offline => write!(f, "offline"),
        }
    }
}

impl std::str::FromStr for LinkStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "operational" => Ok(LinkStatus::Operational),
            "degraded" => Ok(LinkStatus::Degraded),
            "offline" => Ok(LinkStatus::Offline),
            _ => Err(format!("Unknown link status: {}", s)),
        }
    }
}

/// Event severity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EventKind {
    Error,
    Warning,
    Info,
}

impl std::fmt::Display for EventKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EventKind::Error => write!(f, "error"),
            EventKind::Warning => write!(f, "warning"),
            EventKind::Info => write!(f, "info"),
        }
    }
}

impl std::str::FromStr for EventKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "error" => Ok(EventKind::Error),
            "warning" => Ok(EventKind::Warning),
            "info" => Ok(EventKind::Info),
            _ => Err(format!("Unknown event kind: {}", s)),
        }
    }
}

/// Edge-triggered event produced by the health state machine,
/// consumed by the external audit/notification layer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Event {
    pub kind: EventKind,
    pub title: String,
    pub description: String,
    pub resolved: bool,
}

impl Event {
    pub fn new(kind: EventKind, title: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            kind,
            title: title.into(),
            description: description.into(),
            resolved: false,
        }
    }

    pub fn resolved(mut self) -> Self {
        self.resolved = true;
        self
    }
}
