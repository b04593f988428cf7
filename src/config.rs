//! Configuration constants for the link telemetry collector

use std::time::Duration;

/// Default collection sweep interval in seconds
pub const DEFAULT_COLLECT_INTERVAL: u64 = 30;

/// Minimum collection sweep interval in seconds
pub const MIN_COLLECT_INTERVAL: u64 = 5;

/// Maximum collection sweep interval in seconds
pub const MAX_COLLECT_INTERVAL: u64 = 3600;

/// ICMP probes issued per link per tick
pub const PING_COUNT: u32 = 4;

/// Timeout for each ICMP probe
pub const PING_TIMEOUT: Duration = Duration::from_millis(800);

// ====== Simulated Probe Configuration ======
//
// When the process lacks raw-socket capability the prober degrades to
// plausible synthetic values so downstream state machines keep working.

/// Lower bound of simulated base latency (ms)
pub const SIM_LATENCY_MIN_MS: f64 = 30.0;

/// Upper bound of simulated base latency (ms)
pub const SIM_LATENCY_MAX_MS: f64 = 70.0;

/// Usual ceiling for simulated packet loss (percent)
pub const SIM_LOSS_USUAL_MAX: f64 = 1.5;

/// Occasional ceiling for simulated packet loss (percent)
pub const SIM_LOSS_SPIKE_MAX: f64 = 5.0;

/// Fraction of simulated samples that exceed the usual loss ceiling
pub const SIM_LOSS_SPIKE_RATIO: f64 = 0.1;

// ====== SNMP Configuration ======

/// Default SNMP agent port
pub const SNMP_DEFAULT_PORT: u16 = 161;

/// Default per-request SNMP timeout when the profile omits one
pub const SNMP_DEFAULT_TIMEOUT: Duration = Duration::from_secs(3);

/// Safety margin added to the profile timeout. The external timer that
/// guarantees every SNMP call resolves fires at `timeout + this`.
pub const SNMP_SAFETY_MARGIN: Duration = Duration::from_millis(2000);

/// Budget for walking a single OID subtree during discovery
pub const SNMP_WALK_BUDGET: Duration = Duration::from_secs(20);

/// Hard cap on rows accepted from a single subtree walk
pub const SNMP_WALK_MAX_ROWS: usize = 50_000;

// ====== SSH Fallback Configuration ======

/// TCP connect/readiness timeout for the SSH CLI fallback,
/// independent of any SNMP timeout
pub const SSH_CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// Timeout for a single remote CLI command to produce its output
pub const SSH_COMMAND_TIMEOUT: Duration = Duration::from_secs(15);

/// Default SSH port when the concentrator record omits one
pub const SSH_DEFAULT_PORT: u16 = 22;

// ====== Health / Threshold Defaults ======

/// Packet loss (percent) at or above which a link is considered offline
pub const OFFLINE_LOSS_THRESHOLD: f64 = 50.0;

/// Default latency threshold (ms) when the link row omits one
pub const DEFAULT_LATENCY_THRESHOLD: f64 = 150.0;

/// Default packet loss threshold (percent) when the link row omits one
pub const DEFAULT_LOSS_THRESHOLD: f64 = 5.0;

/// Uptime estimator step applied while offline (percentage points per tick)
pub const UPTIME_STEP_DOWN: f64 = 0.01;

/// Uptime estimator step applied while operational (percentage points per tick)
pub const UPTIME_STEP_UP: f64 = 0.001;

// ====== Retention ======

/// Metric samples older than this many days are pruned each sweep
pub const METRIC_RETENTION_DAYS: i64 = 90;
