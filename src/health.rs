//! Link health state machine
//!
//! Derives the link status from the latest probe sample and emits
//! edge-triggered events on state transitions and threshold crossings.
//! Same-state repeats never produce events, which keeps a sustained
//! outage from flooding the audit layer.

use crate::config::{OFFLINE_LOSS_THRESHOLD, UPTIME_STEP_DOWN, UPTIME_STEP_UP};
use crate::models::{Event, EventKind, LinkStatus, ProbeResult};

/// Derives the health state from a fresh probe sample.
///
/// Total (or near-total) loss wins over everything; threshold breaches
/// degrade; anything else is operational.
pub fn evaluate_status(
    probe: &ProbeResult,
    latency_threshold: f64,
    packet_loss_threshold: f64,
) -> LinkStatus {
    if !probe.success || probe.packet_loss >= OFFLINE_LOSS_THRESHOLD {
        LinkStatus::Offline
    } else if probe.latency_ms > latency_threshold || probe.packet_loss > packet_loss_threshold {
        LinkStatus::Degraded
    } else {
        LinkStatus::Operational
    }
}

/// Edge-triggered event for a state transition, if the edge is one of
/// the reportable ones. `None` for same-state repeats and for edges the
/// audit layer does not care about (e.g. offline -> degraded).
pub fn transition_event(link_name: &str, prev: LinkStatus, next: LinkStatus) -> Option<Event> {
    if prev == next {
        return None;
    }

    match (prev, next) {
        (_, LinkStatus::Offline) => Some(Event::new(
            EventKind::Error,
            "link offline",
            format!("Link {} stopped responding to probes", link_name),
        )),
        (LinkStatus::Operational, LinkStatus::Degraded) => Some(Event::new(
            EventKind::Warning,
            "link degraded",
            format!("Link {} exceeded its latency or loss threshold", link_name),
        )),
        (LinkStatus::Offline, LinkStatus::Operational) => Some(
            Event::new(
                EventKind::Info,
                "link restored",
                format!("Link {} is responding again", link_name),
            )
            .resolved(),
        ),
        (LinkStatus::Degraded, LinkStatus::Operational) => Some(
            Event::new(
                EventKind::Info,
                "link normalized",
                format!("Link {} is back under its thresholds", link_name),
            )
            .resolved(),
        ),
        _ => None,
    }
}

/// Threshold-crossing alerts, edge-triggered against the previous
/// sample: only fires when the new sample crosses a threshold the
/// previous one was under.
pub fn threshold_alerts(
    link_name: &str,
    prev_latency: f64,
    prev_loss: f64,
    probe: &ProbeResult,
    latency_threshold: f64,
    packet_loss_threshold: f64,
) -> Vec<Event> {
    let mut alerts = Vec::new();

    if probe.latency_ms > latency_threshold && prev_latency <= latency_threshold {
        alerts.push(Event::new(
            EventKind::Warning,
            "latency threshold exceeded",
            format!(
                "Link {} latency {:.1}ms crossed the {:.1}ms threshold",
                link_name, probe.latency_ms, latency_threshold
            ),
        ));
    }

    if probe.packet_loss > packet_loss_threshold && prev_loss <= packet_loss_threshold {
        alerts.push(Event::new(
            EventKind::Warning,
            "packet loss threshold exceeded",
            format!(
                "Link {} loss {:.1}% crossed the {:.1}% threshold",
                link_name, probe.packet_loss, packet_loss_threshold
            ),
        ));
    }

    alerts
}

/// Exponentially-smoothed availability estimator. Each tick nudges the
/// stored percentage: fast to degrade, slow to recover. Not an SLA
/// calculation; the asymmetric step sizes are the intended behavior.
pub fn nudge_uptime(uptime: f64, status: LinkStatus) -> f64 {
    let base = if uptime.is_finite() { uptime } else { 100.0 };
    let next = match status {
        LinkStatus::Offline => base - UPTIME_STEP_DOWN,
        LinkStatus::Operational => base + UPTIME_STEP_UP,
        LinkStatus::Degraded => base,
    };
    next.clamp(0.0, 100.0)
}
