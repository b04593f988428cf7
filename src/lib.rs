//! LinkPulse — WAN Link Telemetry & Topology Discovery
//!
//! This crate provides the collection core for a WAN monitoring system:
//! - ICMP probing with a simulated fallback when raw sockets are unavailable
//! - SNMP v1/v2c/v3 polling of 64-bit interface counters and CPU/memory
//! - Bandwidth derivation with counter-reset handling
//! - Link health state machine with edge-triggered events
//! - Multi-vendor PPPoE/corporate topology discovery (SNMP + SSH CLI fallback)
//! - SQLite persistence for inventory, metrics and events

pub mod bandwidth;
pub mod collector;
pub mod config;
pub mod database;
pub mod health;
pub mod logging;
pub mod models;
pub mod prober;
pub mod resolver;
pub mod snmp;

pub use bandwidth::calculate_bandwidth;
pub use collector::Collector;
pub use config::*;
pub use database::{Database, EventRecord, MetricRecord};
pub use health::{evaluate_status, nudge_uptime, threshold_alerts, transition_event};
pub use models::*;
pub use prober::ping_host;
pub use resolver::{
    Vendor, infer_vendor, lookup_corporate_link_info, lookup_pppoe_sessions, resolve_vendor,
    vendor_from_tag,
};
pub use snmp::{SnmpClient, parse_oid_str};

// Re-export logging macros for use across crate
pub use crate::logging::macros;
