//! Bandwidth derivation from successive interface counter samples
//!
//! Counters are monotonically non-decreasing within a session lifetime;
//! a decrease means the device rebooted (or the counter was cleared) and
//! the delta is clamped to zero rather than producing a negative or
//! wraparound-sized rate.

use crate::models::{InterfaceCounterSample, TrafficRate};

/// Octet delta between two samples, clamped to zero on counter reset
fn counter_delta(current: u64, previous: u64) -> u64 {
    current.saturating_sub(previous)
}

/// Octets-per-second delta converted to Mbps, guarded against
/// non-finite intermediate values
fn rate_mbps(octet_diff: u64, delta_secs: f64) -> f64 {
    let bits_per_sec = (octet_diff as f64) * 8.0 / delta_secs;
    let mbps = bits_per_sec / 1_000_000.0;
    if mbps.is_finite() && mbps >= 0.0 {
        mbps
    } else {
        0.0
    }
}

/// Converts two counter samples into download/upload rates.
///
/// A non-positive or non-finite time delta (clock skew, duplicate
/// sample) yields zero rates, never a divide-by-zero artifact.
pub fn calculate_bandwidth(
    current: &InterfaceCounterSample,
    previous: &InterfaceCounterSample,
) -> TrafficRate {
    let delta_secs = (current.timestamp_ms - previous.timestamp_ms) as f64 / 1000.0;
    if !delta_secs.is_finite() || delta_secs <= 0.0 {
        return TrafficRate::default();
    }

    let in_diff = counter_delta(current.in_octets, previous.in_octets);
    let out_diff = counter_delta(current.out_octets, previous.out_octets);

    TrafficRate {
        download_mbps: rate_mbps(in_diff, delta_secs),
        upload_mbps: rate_mbps(out_diff, delta_secs),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample(in_octets: u64, out_octets: u64, timestamp_ms: i64) -> InterfaceCounterSample {
        InterfaceCounterSample {
            in_octets,
            out_octets,
            timestamp_ms,
        }
    }

    #[test]
    fn ten_second_window_rates() {
        let prev = sample(1_000_000, 500_000, 0);
        let curr = sample(2_000_000, 900_000, 10_000);
        let rate = calculate_bandwidth(&curr, &prev);
        assert!((rate.download_mbps - 0.8).abs() < 1e-9);
        assert!((rate.upload_mbps - 0.32).abs() < 1e-9);
    }

    #[test]
    fn counter_reset_clamps_to_zero() {
        let prev = sample(5_000_000, 5_000_000, 0);
        let curr = sample(1_000, 2_000, 10_000);
        let rate = calculate_bandwidth(&curr, &prev);
        assert_eq!(rate.download_mbps, 0.0);
        assert_eq!(rate.upload_mbps, 0.0);
    }

    #[test]
    fn non_positive_time_delta_yields_zero() {
        let prev = sample(1_000, 1_000, 10_000);
        let same_instant = sample(2_000, 2_000, 10_000);
        let backwards = sample(2_000, 2_000, 5_000);
        assert_eq!(
            calculate_bandwidth(&same_instant, &prev),
            TrafficRate::default()
        );
        assert_eq!(
            calculate_bandwidth(&backwards, &prev),
            TrafficRate::default()
        );
    }

    #[test]
    fn large_counters_stay_finite() {
        let prev = sample(0, 0, 0);
        let curr = sample(u64::MAX, u64::MAX, 1_000);
        let rate = calculate_bandwidth(&curr, &prev);
        assert!(rate.download_mbps.is_finite());
        assert!(rate.upload_mbps.is_finite());
    }
}
