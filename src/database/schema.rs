//! Database schema definitions

use anyhow::{Context, Result};
use rusqlite::Connection;

/// Create all database tables
pub fn create_tables(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        r#"
        -- SNMP credential profiles (admin-owned)
        CREATE TABLE IF NOT EXISTS snmp_profiles (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            name TEXT NOT NULL,
            version TEXT NOT NULL DEFAULT '2c',
            port INTEGER NOT NULL DEFAULT 161,
            community TEXT,
            username TEXT,
            security_level TEXT,
            auth_algorithm TEXT,
            auth_password TEXT,
            priv_algorithm TEXT,
            priv_password TEXT,
            timeout_ms INTEGER NOT NULL DEFAULT 3000,
            retries INTEGER NOT NULL DEFAULT 1
        );

        -- Monitored WAN circuits (admin-owned rows, measured columns
        -- mutated by the collector)
        CREATE TABLE IF NOT EXISTS links (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            name TEXT NOT NULL,
            monitored_ip TEXT NOT NULL,
            snmp_router_ip TEXT,
            snmp_profile_id INTEGER,
            snmp_interface_index INTEGER,
            equipment_vendor TEXT,
            custom_cpu_oid TEXT,
            custom_memory_oid TEXT,
            latency_threshold REAL NOT NULL DEFAULT 150.0,
            packet_loss_threshold REAL NOT NULL DEFAULT 5.0,
            monitoring_enabled INTEGER NOT NULL DEFAULT 1,
            current_download REAL NOT NULL DEFAULT 0,
            current_upload REAL NOT NULL DEFAULT 0,
            latency REAL NOT NULL DEFAULT 0,
            packet_loss REAL NOT NULL DEFAULT 0,
            cpu_usage REAL NOT NULL DEFAULT 0,
            memory_usage REAL NOT NULL DEFAULT 0,
            status TEXT NOT NULL DEFAULT 'operational',
            uptime REAL NOT NULL DEFAULT 100.0,
            last_updated TEXT,
            FOREIGN KEY (snmp_profile_id) REFERENCES snmp_profiles(id) ON DELETE SET NULL
        );

        -- Subscriber-aggregation / access devices
        CREATE TABLE IF NOT EXISTS concentrators (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            name TEXT NOT NULL,
            model TEXT,
            vendor TEXT,
            ip_address TEXT NOT NULL,
            ssh_user TEXT,
            ssh_password TEXT,
            ssh_port INTEGER,
            snmp_profile_id INTEGER,
            FOREIGN KEY (snmp_profile_id) REFERENCES snmp_profiles(id) ON DELETE SET NULL
        );

        -- Appended time-series samples, one row per link per tick
        CREATE TABLE IF NOT EXISTS metrics (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            link_id INTEGER NOT NULL,
            download_mbps REAL NOT NULL DEFAULT 0,
            upload_mbps REAL NOT NULL DEFAULT 0,
            latency REAL NOT NULL DEFAULT 0,
            packet_loss REAL NOT NULL DEFAULT 0,
            cpu_usage REAL NOT NULL DEFAULT 0,
            memory_usage REAL NOT NULL DEFAULT 0,
            timestamp TEXT NOT NULL DEFAULT (datetime('now')),
            FOREIGN KEY (link_id) REFERENCES links(id) ON DELETE CASCADE
        );

        -- Edge-triggered events, consumed by the audit/notification layer
        CREATE TABLE IF NOT EXISTS events (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            link_id INTEGER,
            kind TEXT NOT NULL DEFAULT 'info',
            title TEXT NOT NULL,
            description TEXT NOT NULL DEFAULT '',
            resolved INTEGER NOT NULL DEFAULT 0,
            created_at TEXT NOT NULL DEFAULT (datetime('now')),
            FOREIGN KEY (link_id) REFERENCES links(id) ON DELETE SET NULL
        );

        CREATE INDEX IF NOT EXISTS idx_metrics_link_time ON metrics(link_id, timestamp);
        CREATE INDEX IF NOT EXISTS idx_events_created ON events(created_at);
        "#,
    )
    .context("Failed to create database tables")
}
