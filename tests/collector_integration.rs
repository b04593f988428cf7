//! End-to-end collection sweeps against an in-memory database:
//! probe -> health state machine -> persisted link state, metric
//! samples and edge-triggered events.

use linkpulse::database::queries;
use linkpulse::{Collector, Database, Link, LinkStatus};

fn seed_link(db: &Database, name: &str, monitored_ip: &str, enabled: bool) -> i64 {
    db.with_conn(|conn| {
        queries::insert_link(
            conn,
            &Link {
                id: 0,
                name: name.to_string(),
                monitored_ip: monitored_ip.to_string(),
                snmp_router_ip: None,
                snmp_profile_id: None,
                snmp_interface_index: None,
                equipment_vendor: None,
                custom_cpu_oid: None,
                custom_memory_oid: None,
                latency_threshold: 150.0,
                packet_loss_threshold: 5.0,
                monitoring_enabled: enabled,
                current_download: 0.0,
                current_upload: 0.0,
                latency: 0.0,
                packet_loss: 0.0,
                cpu_usage: 0.0,
                memory_usage: 0.0,
                status: LinkStatus::Operational,
                uptime: 100.0,
                last_updated: None,
            },
        )
    })
    .expect("link insert should succeed")
}

// A target that cannot be parsed as an address is a guaranteed probe
// failure, which drives the full offline path without any network.
const DEAD_TARGET: &str = "unreachable.invalid";

#[tokio::test]
async fn failed_probe_drives_link_offline_with_one_event() {
    let db = Database::in_memory().expect("db");
    let id = seed_link(&db, "wan-1", DEAD_TARGET, true);

    let collector = Collector::new(db.clone());
    collector.collect_all().await;

    let link = db
        .with_conn(|conn| queries::get_link(conn, id))
        .expect("query")
        .expect("link exists");
    assert_eq!(link.status, LinkStatus::Offline);
    assert_eq!(link.packet_loss, 100.0);
    assert!(link.last_updated.is_some());
    assert!((link.uptime - 99.99).abs() < 1e-9);

    let metrics = db
        .with_conn(|conn| queries::list_link_metrics(conn, id, 10))
        .expect("query");
    assert_eq!(metrics.len(), 1);

    let events = db
        .with_conn(|conn| queries::list_recent_events(conn, 10))
        .expect("query");
    assert_eq!(events.len(), 1);
    assert_eq!(events[0].title, "link offline");
    assert!(!events[0].resolved);
}

#[tokio::test]
async fn sustained_outage_appends_metrics_but_no_repeat_events() {
    let db = Database::in_memory().expect("db");
    let id = seed_link(&db, "wan-1", DEAD_TARGET, true);

    let collector = Collector::new(db.clone());
    collector.collect_all().await;
    collector.collect_all().await;
    collector.collect_all().await;

    let metrics = db
        .with_conn(|conn| queries::list_link_metrics(conn, id, 10))
        .expect("query");
    assert_eq!(metrics.len(), 3);

    // Only the first sweep crossed an edge
    let events = db
        .with_conn(|conn| queries::list_recent_events(conn, 10))
        .expect("query");
    assert_eq!(events.len(), 1);

    let link = db
        .with_conn(|conn| queries::get_link(conn, id))
        .expect("query")
        .expect("link exists");
    assert!((link.uptime - 99.97).abs() < 1e-9);
}

#[tokio::test]
async fn disabled_links_are_skipped_entirely() {
    let db = Database::in_memory().expect("db");
    let enabled = seed_link(&db, "wan-on", DEAD_TARGET, true);
    let disabled = seed_link(&db, "wan-off", DEAD_TARGET, false);

    let collector = Collector::new(db.clone());
    collector.collect_all().await;

    let touched = db
        .with_conn(|conn| queries::get_link(conn, enabled))
        .expect("query")
        .expect("link exists");
    assert!(touched.last_updated.is_some());

    let untouched = db
        .with_conn(|conn| queries::get_link(conn, disabled))
        .expect("query")
        .expect("link exists");
    assert!(untouched.last_updated.is_none());
    assert_eq!(untouched.status, LinkStatus::Operational);

    let metrics = db
        .with_conn(|conn| queries::list_link_metrics(conn, disabled, 10))
        .expect("query");
    assert!(metrics.is_empty());
}

#[tokio::test]
async fn dangling_snmp_config_still_yields_probe_data() {
    let db = Database::in_memory().expect("db");
    let first = seed_link(&db, "wan-1", DEAD_TARGET, true);
    let second = seed_link(&db, "wan-2", DEAD_TARGET, true);

    // wan-1 references a profile that no longer exists; its SNMP stage
    // is skipped, probe results are still persisted and wan-2 is
    // unaffected.
    db.with_conn(|conn| {
        conn.execute(
            "UPDATE links SET snmp_router_ip = '10.0.0.1', snmp_profile_id = 999 WHERE id = ?1",
            rusqlite::params![first],
        )
        .map_err(anyhow::Error::from)
    })
    .expect("update");

    let collector = Collector::new(db.clone());
    collector.collect_all().await;

    for id in [first, second] {
        let link = db
            .with_conn(|conn| queries::get_link(conn, id))
            .expect("query")
            .expect("link exists");
        assert!(link.last_updated.is_some());
        assert_eq!(link.status, LinkStatus::Offline);
        assert_eq!(link.current_download, 0.0);
    }
}
