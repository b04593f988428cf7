//! Database query functions
//!
//! Inventory reads plus the measured-output writes performed each tick.
//! Every numeric measurement passes a finiteness/non-negativity guard
//! immediately before being written.

use anyhow::{Context, Result};
use chrono::{DateTime, Duration, Utc};
use rusqlite::{Connection, OptionalExtension, Row, params};

use super::models::{EventRecord, MetricRecord};
use crate::models::{Concentrator, Event, Link, LinkStatus, SnmpProfile};

/// Clamps a measurement to a storable value: non-finite or negative
/// readings become 0.
fn storable(value: f64) -> f64 {
    if value.is_finite() && value >= 0.0 {
        value
    } else {
        0.0
    }
}

fn link_from_row(row: &Row<'_>) -> rusqlite::Result<Link> {
    let status_text: String = row.get("status")?;
    Ok(Link {
        id: row.get("id")?,
        name: row.get("name")?,
        monitored_ip: row.get("monitored_ip")?,
        snmp_router_ip: row.get("snmp_router_ip")?,
        snmp_profile_id: row.get("snmp_profile_id")?,
        snmp_interface_index: row.get("snmp_interface_index")?,
        equipment_vendor: row.get("equipment_vendor")?,
        custom_cpu_oid: row.get("custom_cpu_oid")?,
        custom_memory_oid: row.get("custom_memory_oid")?,
        latency_threshold: row.get("latency_threshold")?,
        packet_loss_threshold: row.get("packet_loss_threshold")?,
        monitoring_enabled: row.get("monitoring_enabled")?,
        current_download: row.get("current_download")?,
        current_upload: row.get("current_upload")?,
        latency: row.get("latency")?,
        packet_loss: row.get("packet_loss")?,
        cpu_usage: row.get("cpu_usage")?,
        memory_usage: row.get("memory_usage")?,
        status: status_text.parse().unwrap_or(LinkStatus::Operational),
        uptime: row.get("uptime")?,
        last_updated: row.get("last_updated")?,
    })
}

/// Links with monitoring enabled, in id order
pub fn list_enabled_links(conn: &Connection) -> Result<Vec<Link>> {
    let mut stmt = conn
        .prepare("SELECT * FROM links WHERE monitoring_enabled = 1 ORDER BY id")
        .context("Failed to prepare enabled-links query")?;
    let links = stmt
        .query_map([], link_from_row)
        .context("Failed to query enabled links")?
        .collect::<rusqlite::Result<Vec<_>>>()
        .context("Failed to read link rows")?;
    Ok(links)
}

pub fn get_link(conn: &Connection, id: i64) -> Result<Option<Link>> {
    conn.query_row("SELECT * FROM links WHERE id = ?1", params![id], link_from_row)
        .optional()
        .context("Failed to query link")
}

pub fn get_snmp_profile(conn: &Connection, id: i64) -> Result<Option<SnmpProfile>> {
    conn.query_row(
        "SELECT * FROM snmp_profiles WHERE id = ?1",
        params![id],
        |row| {
            Ok(SnmpProfile {
                id: row.get("id")?,
                name: row.get("name")?,
                version: row.get("version")?,
                port: row.get("port")?,
                community: row.get("community")?,
                username: row.get("username")?,
                security_level: row.get("security_level")?,
                auth_algorithm: row.get("auth_algorithm")?,
                auth_password: row.get("auth_password")?,
                priv_algorithm: row.get("priv_algorithm")?,
                priv_password: row.get("priv_password")?,
                timeout_ms: row.get("timeout_ms")?,
                retries: row.get("retries")?,
            })
        },
    )
    .optional()
    .context("Failed to query SNMP profile")
}

fn concentrator_from_row(row: &Row<'_>) -> rusqlite::Result<Concentrator> {
    Ok(Concentrator {
        id: row.get("id")?,
        name: row.get("name")?,
        model: row.get("model")?,
        vendor: row.get("vendor")?,
        ip_address: row.get("ip_address")?,
        ssh_user: row.get("ssh_user")?,
        ssh_password: row.get("ssh_password")?,
        ssh_port: row.get("ssh_port")?,
        snmp_profile_id: row.get("snmp_profile_id")?,
    })
}

/// Finds a concentrator by numeric id or exact name
pub fn find_concentrator(conn: &Connection, ident: &str) -> Result<Option<Concentrator>> {
    if let Ok(id) = ident.parse::<i64>() {
        let by_id = conn
            .query_row(
                "SELECT * FROM concentrators WHERE id = ?1",
                params![id],
                concentrator_from_row,
            )
            .optional()
            .context("Failed to query concentrator by id")?;
        if by_id.is_some() {
            return Ok(by_id);
        }
    }
    conn.query_row(
        "SELECT * FROM concentrators WHERE name = ?1",
        params![ident],
        concentrator_from_row,
    )
    .optional()
    .context("Failed to query concentrator by name")
}

/// Writes the measured columns of a link row after a tick
pub fn update_link_measurements(conn: &Connection, link: &Link) -> Result<()> {
    conn.execute(
        r#"
        UPDATE links SET
            current_download = ?2,
            current_upload = ?3,
            latency = ?4,
            packet_loss = ?5,
            cpu_usage = ?6,
            memory_usage = ?7,
            status = ?8,
            uptime = ?9,
            last_updated = ?10
        WHERE id = ?1
        "#,
        params![
            link.id,
            storable(link.current_download),
            storable(link.current_upload),
            storable(link.latency),
            storable(link.packet_loss),
            storable(link.cpu_usage),
            storable(link.memory_usage),
            link.status.to_string(),
            storable(link.uptime).min(100.0),
            Utc::now(),
        ],
    )
    .context("Failed to update link measurements")?;
    Ok(())
}

/// Appends one metric sample for a link
pub fn insert_metric(conn: &Connection, link: &Link) -> Result<i64> {
    conn.execute(
        r#"
        INSERT INTO metrics (
            link_id, download_mbps, upload_mbps, latency, packet_loss,
            cpu_usage, memory_usage, timestamp
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
        "#,
        params![
            link.id,
            storable(link.current_download),
            storable(link.current_upload),
            storable(link.latency),
            storable(link.packet_loss),
            storable(link.cpu_usage),
            storable(link.memory_usage),
            Utc::now(),
        ],
    )
    .context("Failed to insert metric sample")?;
    Ok(conn.last_insert_rowid())
}

/// Persists one edge-triggered event
pub fn insert_event(conn: &Connection, link_id: Option<i64>, event: &Event) -> Result<i64> {
    conn.execute(
        r#"
        INSERT INTO events (link_id, kind, title, description, resolved, created_at)
        VALUES (?1, ?2, ?3, ?4, ?5, ?6)
        "#,
        params![
            link_id,
            event.kind.to_string(),
            event.title,
            event.description,
            event.resolved,
            Utc::now(),
        ],
    )
    .context("Failed to insert event")?;
    Ok(conn.last_insert_rowid())
}

/// Marks one event as resolved. Returns false when no such event exists.
pub fn mark_event_resolved(conn: &Connection, event_id: i64) -> Result<bool> {
    let changed = conn
        .execute(
            "UPDATE events SET resolved = 1 WHERE id = ?1",
            params![event_id],
        )
        .context("Failed to resolve event")?;
    Ok(changed > 0)
}

fn event_from_row(row: &Row<'_>) -> rusqlite::Result<EventRecord> {
    let kind_text: String = row.get("kind")?;
    Ok(EventRecord {
        id: row.get("id")?,
        link_id: row.get("link_id")?,
        kind: kind_text.parse().unwrap_or(crate::models::EventKind::Info),
        title: row.get("title")?,
        description: row.get("description")?,
        resolved: row.get("resolved")?,
        created_at: row.get("created_at")?,
    })
}

/// Most recent events, newest first
pub fn list_recent_events(conn: &Connection, limit: u32) -> Result<Vec<EventRecord>> {
    let mut stmt = conn
        .prepare("SELECT * FROM events ORDER BY id DESC LIMIT ?1")
        .context("Failed to prepare events query")?;
    let events = stmt
        .query_map(params![limit], event_from_row)
        .context("Failed to query events")?
        .collect::<rusqlite::Result<Vec<_>>>()
        .context("Failed to read event rows")?;
    Ok(events)
}

/// Metric samples for one link, newest first
pub fn list_link_metrics(conn: &Connection, link_id: i64, limit: u32) -> Result<Vec<MetricRecord>> {
    let mut stmt = conn
        .prepare("SELECT * FROM metrics WHERE link_id = ?1 ORDER BY id DESC LIMIT ?2")
        .context("Failed to prepare metrics query")?;
    let metrics = stmt
        .query_map(params![link_id, limit], |row| {
            Ok(MetricRecord {
                id: row.get("id")?,
                link_id: row.get("link_id")?,
                download_mbps: row.get("download_mbps")?,
                upload_mbps: row.get("upload_mbps")?,
                latency: row.get("latency")?,
                packet_loss: row.get("packet_loss")?,
                cpu_usage: row.get("cpu_usage")?,
                memory_usage: row.get("memory_usage")?,
                timestamp: row.get("timestamp")?,
            })
        })
        .context("Failed to query metrics")?
        .collect::<rusqlite::Result<Vec<_>>>()
        .context("Failed to read metric rows")?;
    Ok(metrics)
}

/// Deletes metric samples older than the retention horizon.
/// Returns the number of pruned rows.
pub fn prune_metrics(conn: &Connection, retention_days: i64) -> Result<usize> {
    let horizon: DateTime<Utc> = Utc::now() - Duration::days(retention_days);
    conn.execute(
        "DELETE FROM metrics WHERE timestamp < ?1",
        params![horizon],
    )
    .context("Failed to prune metrics")
}

// ====== Inventory writes (used by provisioning import and tests) ======

pub fn insert_snmp_profile(conn: &Connection, profile: &SnmpProfile) -> Result<i64> {
    conn.execute(
        r#"
        INSERT INTO snmp_profiles (
            name, version, port, community, username, security_level,
            auth_algorithm, auth_password, priv_algorithm, priv_password,
            timeout_ms, retries
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)
        "#,
        params![
            profile.name,
            profile.version,
            profile.port,
            profile.community,
            profile.username,
            profile.security_level,
            profile.auth_algorithm,
            profile.auth_password,
            profile.priv_algorithm,
            profile.priv_password,
            profile.timeout_ms,
            profile.retries,
        ],
    )
    .context("Failed to insert SNMP profile")?;
    Ok(conn.last_insert_rowid())
}

pub fn insert_link(conn: &Connection, link: &Link) -> Result<i64> {
    conn.execute(
        r#"
        INSERT INTO links (
            name, monitored_ip, snmp_router_ip, snmp_profile_id,
            snmp_interface_index, equipment_vendor, custom_cpu_oid,
            custom_memory_oid, latency_threshold, packet_loss_threshold,
            monitoring_enabled, status, uptime
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13)
        "#,
        params![
            link.name,
            link.monitored_ip,
            link.snmp_router_ip,
            link.snmp_profile_id,
            link.snmp_interface_index,
            link.equipment_vendor,
            link.custom_cpu_oid,
            link.custom_memory_oid,
            link.latency_threshold,
            link.packet_loss_threshold,
            link.monitoring_enabled,
            link.status.to_string(),
            storable(link.uptime).min(100.0),
        ],
    )
    .context("Failed to insert link")?;
    Ok(conn.last_insert_rowid())
}

pub fn insert_concentrator(conn: &Connection, concentrator: &Concentrator) -> Result<i64> {
    conn.execute(
        r#"
        INSERT INTO concentrators (
            name, model, vendor, ip_address, ssh_user, ssh_password,
            ssh_port, snmp_profile_id
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
        "#,
        params![
            concentrator.name,
            concentrator.model,
            concentrator.vendor,
            concentrator.ip_address,
            concentrator.ssh_user,
            concentrator.ssh_password,
            concentrator.ssh_port,
            concentrator.snmp_profile_id,
        ],
    )
    .context("Failed to insert concentrator")?;
    Ok(conn.last_insert_rowid())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::Database;

    fn test_link(name: &str) -> Link {
        Link {
            id: 0,
            name: name.to_string(),
            monitored_ip: "203.0.113.10".to_string(),
            snmp_router_ip: None,
            snmp_profile_id: None,
            snmp_interface_index: None,
            equipment_vendor: None,
            custom_cpu_oid: None,
            custom_memory_oid: None,
            latency_threshold: 150.0,
            packet_loss_threshold: 5.0,
            monitoring_enabled: true,
            current_download: 0.0,
            current_upload: 0.0,
            latency: 0.0,
            packet_loss: 0.0,
            cpu_usage: 0.0,
            memory_usage: 0.0,
            status: LinkStatus::Operational,
            uptime: 100.0,
            last_updated: None,
        }
    }

    #[test]
    fn measurement_guards_reject_bad_numbers() {
        assert_eq!(storable(f64::NAN), 0.0);
        assert_eq!(storable(f64::INFINITY), 0.0);
        assert_eq!(storable(-3.5), 0.0);
        assert_eq!(storable(42.5), 42.5);
    }

    #[test]
    fn link_roundtrip_and_measurement_update() {
        let db = Database::in_memory().expect("db");
        db.with_conn(|conn| {
            let id = insert_link(conn, &test_link("wan-1"))?;
            let mut link = get_link(conn, id)?.expect("link exists");
            assert_eq!(link.name, "wan-1");
            assert_eq!(link.status, LinkStatus::Operational);

            link.current_download = 12.5;
            link.latency = f64::NAN; // must be guarded on write
            link.status = LinkStatus::Degraded;
            update_link_measurements(conn, &link)?;

            let reloaded = get_link(conn, id)?.expect("link exists");
            assert_eq!(reloaded.current_download, 12.5);
            assert_eq!(reloaded.latency, 0.0);
            assert_eq!(reloaded.status, LinkStatus::Degraded);
            assert!(reloaded.last_updated.is_some());
            Ok(())
        })
        .expect("queries");
    }

    #[test]
    fn enabled_filter_skips_disabled_links() {
        let db = Database::in_memory().expect("db");
        db.with_conn(|conn| {
            insert_link(conn, &test_link("enabled"))?;
            let mut disabled = test_link("disabled");
            disabled.monitoring_enabled = false;
            insert_link(conn, &disabled)?;

            let links = list_enabled_links(conn)?;
            assert_eq!(links.len(), 1);
            assert_eq!(links[0].name, "enabled");
            Ok(())
        })
        .expect("queries");
    }

    #[test]
    fn events_and_metrics_append() {
        let db = Database::in_memory().expect("db");
        db.with_conn(|conn| {
            let id = insert_link(conn, &test_link("wan-1"))?;
            let link = get_link(conn, id)?.expect("link");

            insert_metric(conn, &link)?;
            insert_event(
                conn,
                Some(id),
                &Event::new(crate::models::EventKind::Error, "link offline", "probe dead"),
            )?;

            assert_eq!(list_link_metrics(conn, id, 10)?.len(), 1);
            let events = list_recent_events(conn, 10)?;
            assert_eq!(events.len(), 1);
            assert_eq!(events[0].title, "link offline");
            assert!(!events[0].resolved);

            assert!(mark_event_resolved(conn, events[0].id)?);
            assert!(list_recent_events(conn, 10)?[0].resolved);
            assert!(!mark_event_resolved(conn, 9999)?);
            Ok(())
        })
        .expect("queries");
    }

    #[test]
    fn concentrator_lookup_by_id_or_name() {
        let db = Database::in_memory().expect("db");
        db.with_conn(|conn| {
            let c = Concentrator {
                id: 0,
                name: "bng-01".to_string(),
                model: Some("CCR2004".to_string()),
                vendor: None,
                ip_address: "10.255.0.1".to_string(),
                ssh_user: None,
                ssh_password: None,
                ssh_port: None,
                snmp_profile_id: None,
            };
            let id = insert_concentrator(conn, &c)?;

            assert!(find_concentrator(conn, &id.to_string())?.is_some());
            assert!(find_concentrator(conn, "bng-01")?.is_some());
            assert!(find_concentrator(conn, "missing")?.is_none());
            Ok(())
        })
        .expect("queries");
    }

    #[test]
    fn prune_removes_nothing_when_all_samples_are_fresh() {
        let db = Database::in_memory().expect("db");
        db.with_conn(|conn| {
            let id = insert_link(conn, &test_link("wan-1"))?;
            let link = get_link(conn, id)?.expect("link");
            insert_metric(conn, &link)?;
            assert_eq!(prune_metrics(conn, 90)?, 0);
            assert_eq!(list_link_metrics(conn, id, 10)?.len(), 1);
            Ok(())
        })
        .expect("queries");
    }
}
