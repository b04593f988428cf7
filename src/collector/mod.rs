//! Collection loop
//!
//! Sweeps all monitoring-enabled links on a fixed interval: ICMP probe,
//! counter sample, bandwidth derivation against the per-link previous
//! sample, resource sample, health state derivation, persistence.
//! Per-link failures are logged and never abort the sweep; a failed
//! link is simply retried on the next tick.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use tokio::sync::Mutex;

use crate::bandwidth::calculate_bandwidth;
use crate::config::{METRIC_RETENTION_DAYS, PING_COUNT};
use crate::database::{Database, queries};
use crate::health::{evaluate_status, nudge_uptime, threshold_alerts, transition_event};
use crate::models::{Event, InterfaceCounterSample, Link, SnmpProfile, TrafficRate};
use crate::prober::ping_host;
use crate::resolver::vendor_from_tag;
use crate::snmp::{counters, oid_to_string, resources};

/// Per-link slot holding the previous counter sample. The outer map is
/// locked only to fetch/insert slots; the slot's own mutex serializes
/// overlapping ticks for the same link while different links proceed
/// concurrently.
type SampleCache = Mutex<HashMap<i64, Arc<Mutex<Option<InterfaceCounterSample>>>>>;

pub struct Collector {
    db: Database,
    prev_samples: SampleCache,
}

impl Collector {
    pub fn new(db: Database) -> Self {
        Self {
            db,
            prev_samples: Mutex::new(HashMap::new()),
        }
    }

    /// Runs the timer-driven sweep forever. The first sweep fires
    /// immediately, then once per `interval_secs`.
    pub async fn run(&self, interval_secs: u64) {
        let mut ticker = tokio::time::interval(Duration::from_secs(interval_secs));
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
        loop {
            ticker.tick().await;
            self.collect_all().await;
        }
    }

    /// One sweep over every enabled link
    pub async fn collect_all(&self) {
        let links = match self.db.with_conn(queries::list_enabled_links) {
            Ok(links) => links,
            Err(e) => {
                tracing::error!("failed to load enabled links: {}", e);
                return;
            }
        };

        tracing::debug!("collection tick for {} links", links.len());
        for mut link in links {
            let link_id = link.id;
            if let Err(e) = self.collect_link(&mut link).await {
                tracing::warn!("collection for link {} failed: {}", link_id, e);
            }
        }

        match self
            .db
            .with_conn(|conn| queries::prune_metrics(conn, METRIC_RETENTION_DAYS))
        {
            Ok(pruned) if pruned > 0 => tracing::debug!("pruned {} metric samples", pruned),
            Ok(_) => {}
            Err(e) => tracing::warn!("metric pruning failed: {}", e),
        }
    }

    /// Collects one link end to end and persists the outcome
    pub async fn collect_link(&self, link: &mut Link) -> Result<()> {
        let probe = ping_host(&link.monitored_ip, PING_COUNT).await;

        let mut rate = TrafficRate::default();
        let mut cpu_usage = link.cpu_usage;
        let mut memory_usage = link.memory_usage;

        if let (Some(router_ip), Some(profile)) = (
            link.snmp_router_ip.clone(),
            self.load_profile(link.snmp_profile_id)?,
        ) {
            if let Some(if_index) = link.snmp_interface_index {
                rate = self.sample_bandwidth(link.id, &router_ip, &profile, if_index).await;
            }

            let (cpu, memory) = self.sample_resources(link, &router_ip, &profile).await;
            if let Some(v) = cpu {
                cpu_usage = v;
            }
            if let Some(v) = memory {
                memory_usage = v;
            }
        }

        let previous_status = link.status;
        let previous_latency = link.latency;
        let previous_loss = link.packet_loss;
        let new_status =
            evaluate_status(&probe, link.latency_threshold, link.packet_loss_threshold);

        let mut events: Vec<Event> = Vec::new();
        if let Some(event) = transition_event(&link.name, previous_status, new_status) {
            events.push(event);
        }
        events.extend(threshold_alerts(
            &link.name,
            previous_latency,
            previous_loss,
            &probe,
            link.latency_threshold,
            link.packet_loss_threshold,
        ));

        link.current_download = rate.download_mbps;
        link.current_upload = rate.upload_mbps;
        link.latency = probe.latency_ms;
        link.packet_loss = probe.packet_loss;
        link.cpu_usage = cpu_usage;
        link.memory_usage = memory_usage;
        link.status = new_status;
        link.uptime = nudge_uptime(link.uptime, new_status);

        self.db.with_conn(|conn| {
            queries::update_link_measurements(conn, link)?;
            queries::insert_metric(conn, link)?;
            for event in &events {
                queries::insert_event(conn, Some(link.id), event)?;
            }
            Ok(())
        })
    }

    fn load_profile(&self, profile_id: Option<i64>) -> Result<Option<SnmpProfile>> {
        match profile_id {
            Some(id) => self.db.with_conn(|conn| queries::get_snmp_profile(conn, id)),
            None => Ok(None),
        }
    }

    /// Fetches a counter sample and derives rates against the cached
    /// previous sample. The slot lock is held across the fetch so two
    /// overlapping ticks for the same link cannot interleave.
    async fn sample_bandwidth(
        &self,
        link_id: i64,
        router_ip: &str,
        profile: &SnmpProfile,
        if_index: u32,
    ) -> TrafficRate {
        let slot = {
            let mut cache = self.prev_samples.lock().await;
            Arc::clone(cache.entry(link_id).or_default())
        };
        let mut previous = slot.lock().await;

        let Some(sample) = counters::get_interface_traffic(router_ip, profile, if_index).await
        else {
            tracing::debug!("no counter sample for link {} via {}", link_id, router_ip);
            return TrafficRate::default();
        };

        let rate = match previous.as_ref() {
            Some(prev) => calculate_bandwidth(&sample, prev),
            None => TrafficRate::default(),
        };
        *previous = Some(sample);
        rate
    }

    /// Resource sampling with custom-OID-first precedence; the vendor
    /// table OID fills whichever direction has no custom OID. Returns a
    /// reading per direction only when that direction was queried, so a
    /// link without a memory OID keeps its last memory value.
    async fn sample_resources(
        &self,
        link: &Link,
        router_ip: &str,
        profile: &SnmpProfile,
    ) -> (Option<f64>, Option<f64>) {
        let vendor = link.equipment_vendor.as_deref().and_then(vendor_from_tag);

        let cpu_oid = link.custom_cpu_oid.clone().or_else(|| {
            vendor
                .and_then(|v| v.cpu_oid())
                .map(oid_to_string)
        });
        let memory_oid = link.custom_memory_oid.clone().or_else(|| {
            vendor
                .and_then(|v| v.memory_oid())
                .map(oid_to_string)
        });

        let Some(res) = resources::get_system_resources(
            router_ip,
            profile,
            cpu_oid.as_deref(),
            memory_oid.as_deref(),
        )
        .await
        else {
            return (None, None);
        };

        (
            cpu_oid.map(|_| res.cpu_usage),
            memory_oid.map(|_| res.memory_usage),
        )
    }
}
