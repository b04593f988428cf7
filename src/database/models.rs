//! Database record types for the measured outputs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::models::EventKind;

/// One appended time-series sample
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MetricRecord {
    pub id: i64,
    pub link_id: i64,
    pub download_mbps: f64,
    pub upload_mbps: f64,
    pub latency: f64,
    pub packet_loss: f64,
    pub cpu_usage: f64,
    pub memory_usage: f64,
    pub timestamp: DateTime<Utc>,
}

/// One persisted event row
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EventRecord {
    pub id: i64,
    pub link_id: Option<i64>,
    pub kind: EventKind,
    pub title: String,
    pub description: String,
    pub resolved: bool,
    pub created_at: DateTime<Utc>,
}
