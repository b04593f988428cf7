//! ICMP latency/loss probing with a simulated fallback
//!
//! Issues a short burst of ICMP echo requests per link and reduces the
//! replies to `{latency, packet loss, success}`. Environments without
//! raw-socket capability (containers, unprivileged CI) are detected once,
//! process-wide; from then on the prober returns plausible synthetic
//! values so the downstream health state machine keeps functioning.

use rand::Rng;
use std::net::IpAddr;
use std::sync::Arc;
use std::sync::OnceLock;
use surge_ping::{Client, Config, PingIdentifier, PingSequence};

use crate::config::{
    PING_TIMEOUT, SIM_LATENCY_MAX_MS, SIM_LATENCY_MIN_MS, SIM_LOSS_SPIKE_MAX, SIM_LOSS_SPIKE_RATIO,
    SIM_LOSS_USUAL_MAX,
};
use crate::models::ProbeResult;

/// ICMP client, created once for the whole process. `None` means the
/// environment refused a raw/ICMP socket and probes are simulated.
static ICMP_CLIENT: OnceLock<Option<Arc<Client>>> = OnceLock::new();

fn icmp_client() -> Option<Arc<Client>> {
    ICMP_CLIENT
        .get_or_init(|| match Client::new(&Config::default()) {
            Ok(client) => Some(Arc::new(client)),
            Err(e) => {
                tracing::warn!(
                    "ICMP socket unavailable ({}), switching to simulated probes",
                    e
                );
                None
            }
        })
        .clone()
}

/// Generates a pseudo-random ping identifier
fn rand_id() -> u16 {
    use std::time::SystemTime;
    let duration = SystemTime::now()
        .duration_since(SystemTime::UNIX_EPOCH)
        .unwrap_or_default();
    ((duration.as_nanos() % 0xFFFF) as u16).wrapping_add(1)
}

/// Synthetic probe result for restricted environments: base latency in
/// the 30-70ms band, loss usually under 1.5% with occasional spikes.
fn simulated_probe() -> ProbeResult {
    let mut rng = rand::thread_rng();
    let latency = rng.gen_range(SIM_LATENCY_MIN_MS..SIM_LATENCY_MAX_MS);
    let loss = if rng.r#gen::<f64>() < SIM_LOSS_SPIKE_RATIO {
        rng.gen_range(SIM_LOSS_USUAL_MAX..SIM_LOSS_SPIKE_MAX)
    } else {
        rng.gen_range(0.0..SIM_LOSS_USUAL_MAX)
    };
    ProbeResult {
        latency_ms: latency,
        packet_loss: loss,
        success: true,
    }
}

/// Probes `ip` with `count` ICMP echo requests.
///
/// Never fails: ICMP errors count as lost probes, a host that answers
/// nothing yields `{0, 100, false}`, and an unparseable address yields
/// the same failure value.
pub async fn ping_host(ip: &str, count: u32) -> ProbeResult {
    let addr: IpAddr = match ip.parse() {
        Ok(addr) => addr,
        Err(_) => {
            tracing::warn!("Unparseable probe target '{}'", ip);
            return ProbeResult::failed();
        }
    };

    let Some(client) = icmp_client() else {
        return simulated_probe();
    };

    let count = count.max(1);
    let payload = [0u8; 56];
    let mut pinger = client.pinger(addr, PingIdentifier(rand_id())).await;
    pinger.timeout(PING_TIMEOUT);

    let mut replies = 0u32;
    let mut total_rtt_ms = 0.0f64;

    for seq in 0..count {
        match pinger.ping(PingSequence(seq as u16), &payload).await {
            Ok((_packet, rtt)) => {
                replies += 1;
                total_rtt_ms += rtt.as_secs_f64() * 1000.0;
            }
            Err(_) => continue,
        }
    }

    if replies == 0 {
        return ProbeResult::failed();
    }

    let latency = total_rtt_ms / f64::from(replies);
    let loss = f64::from(count - replies) / f64::from(count) * 100.0;

    ProbeResult {
        latency_ms: latency,
        packet_loss: loss,
        success: true,
    }
}
