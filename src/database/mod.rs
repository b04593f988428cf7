//! SQLite persistence layer
//!
//! Stores the admin-owned inventory (links, SNMP profiles,
//! concentrators) that this core reads, and the measured outputs it
//! writes (link state columns, metric samples, events).

pub mod connection;
pub mod models;
pub mod queries;
pub mod schema;

pub use connection::Database;
pub use models::{EventRecord, MetricRecord};
