//! 64-bit interface octet counter sampling
//!
//! Fetches `ifHCInOctets`/`ifHCOutOctets` for one interface index. The
//! wire value may arrive as a raw byte buffer, a Counter64, a plain
//! integer or a decimal string depending on the agent; all forms are
//! coerced through [`decode_counter`]. This call never panics and never
//! errors: anything unexpected yields `None`.

use chrono::Utc;

use crate::models::{InterfaceCounterSample, SnmpProfile};
use crate::snmp::{SnmpClient, WireValue};

/// IF-MIB ifHCInOctets
const OID_IF_HC_IN_OCTETS: &[u64] = &[1, 3, 6, 1, 2, 1, 31, 1, 1, 1, 6];
/// IF-MIB ifHCOutOctets
const OID_IF_HC_OUT_OCTETS: &[u64] = &[1, 3, 6, 1, 2, 1, 31, 1, 1, 1, 10];

/// Decodes a counter value from whatever shape the agent sent.
///
/// All-ASCII-digit buffers are DisplayString counters and parse as
/// decimal; any other byte buffer is accumulated big-endian
/// (`value = value*256 + byte`) regardless of length, wrapping rather
/// than panicking past 8 bytes.
pub fn decode_counter(value: &WireValue) -> Option<u64> {
    match value {
        WireValue::Uint(v) => Some(*v),
        WireValue::Int(v) if *v >= 0 => Some(*v as u64),
        WireValue::Bytes(bytes) if !bytes.is_empty() => {
            if bytes.iter().all(u8::is_ascii_digit) {
                String::from_utf8_lossy(bytes).parse().ok()
            } else {
                Some(
                    bytes
                        .iter()
                        .fold(0u64, |acc, b| acc.wrapping_mul(256).wrapping_add(u64::from(*b))),
                )
            }
        }
        _ => None,
    }
}

/// Fetches both octet counters for `if_index` on the router at `ip`.
///
/// `None` on session failure, timeout, or a malformed varbind in either
/// direction; partial samples are never returned.
pub async fn get_interface_traffic(
    ip: &str,
    profile: &SnmpProfile,
    if_index: u32,
) -> Option<InterfaceCounterSample> {
    let mut client = SnmpClient::connect(ip, profile).await?;
    let sample = fetch_counters(&mut client, if_index).await;
    client.close();
    sample
}

async fn fetch_counters(client: &mut SnmpClient, if_index: u32) -> Option<InterfaceCounterSample> {
    let in_oid = indexed(OID_IF_HC_IN_OCTETS, if_index);
    let out_oid = indexed(OID_IF_HC_OUT_OCTETS, if_index);

    let in_octets = decode_counter(&client.get(&in_oid).await?.value)?;
    let out_octets = decode_counter(&client.get(&out_oid).await?.value)?;

    Some(InterfaceCounterSample {
        in_octets,
        out_octets,
        timestamp_ms: Utc::now().timestamp_millis(),
    })
}

fn indexed(base: &[u64], if_index: u32) -> Vec<u64> {
    let mut oid = base.to_vec();
    oid.push(u64::from(if_index));
    oid
}
