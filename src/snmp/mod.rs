//! SNMP machinery shared by the collector and the topology resolver
//!
//! Wraps `snmp2` sessions behind [`SnmpClient`]: versioned session
//! construction from a credential profile, GET and subtree-walk
//! primitives, and the external safety timer that guarantees every
//! operation resolves within `profile.timeout + 2000ms` instead of
//! hanging on an unresponsive device.

pub mod counters;
pub mod resources;
pub mod session;

use snmp2::{AsyncSession, Oid, Value};
use std::time::{Duration, Instant};
use tokio::time::timeout;

use crate::config::{SNMP_SAFETY_MARGIN, SNMP_WALK_MAX_ROWS};
use crate::models::SnmpProfile;

pub use session::create_session;

/// Owned snapshot of a response varbind value. `snmp2` values borrow
/// from the response buffer; walks need them to outlive the PDU.
#[derive(Debug, Clone, PartialEq)]
pub enum WireValue {
    Int(i64),
    Uint(u64),
    Bytes(Vec<u8>),
    IpAddress([u8; 4]),
    Null,
    NoSuchObject,
    NoSuchInstance,
    EndOfMib,
    Other,
}

impl WireValue {
    fn from_value(value: &Value<'_>) -> Self {
        match value {
            Value::Integer(v) => WireValue::Int(*v),
            Value::Counter32(v) | Value::Unsigned32(v) | Value::Timeticks(v) => {
                WireValue::Uint(u64::from(*v))
            }
            Value::Counter64(v) => WireValue::Uint(*v),
            Value::OctetString(bytes) => WireValue::Bytes(bytes.to_vec()),
            Value::IpAddress(octets) => WireValue::IpAddress(*octets),
            Value::Null => WireValue::Null,
            Value::NoSuchObject => WireValue::NoSuchObject,
            Value::NoSuchInstance => WireValue::NoSuchInstance,
            Value::EndOfMibView => WireValue::EndOfMib,
            _ => WireValue::Other,
        }
    }

    /// Printable form used for usernames, interface names and aliases
    pub fn as_text(&self) -> Option<String> {
        match self {
            WireValue::Bytes(bytes) => {
                let text = String::from_utf8_lossy(bytes).trim().to_string();
                if text.is_empty() { None } else { Some(text) }
            }
            WireValue::Int(v) => Some(v.to_string()),
            WireValue::Uint(v) => Some(v.to_string()),
            WireValue::IpAddress(o) => Some(format!("{}.{}.{}.{}", o[0], o[1], o[2], o[3])),
            _ => None,
        }
    }

    pub fn as_u64(&self) -> Option<u64> {
        match self {
            WireValue::Int(v) if *v >= 0 => Some(*v as u64),
            WireValue::Uint(v) => Some(*v),
            _ => None,
        }
    }
}

/// One `(oid, value)` row from a GET or walk
#[derive(Debug, Clone)]
pub struct Varbind {
    pub oid: Vec<u64>,
    pub value: WireValue,
}

/// Parses a dotted OID string ("1.3.6.1.2.1...") into components.
/// Returns `None` for empty or malformed input.
pub fn parse_oid_str(oid: &str) -> Option<Vec<u64>> {
    let parts: Vec<u64> = oid
        .trim()
        .trim_start_matches('.')
        .split('.')
        .map(|p| p.parse::<u64>())
        .collect::<Result<_, _>>()
        .ok()?;
    if parts.is_empty() { None } else { Some(parts) }
}

/// Renders OID components back to dotted form
pub fn oid_to_string(oid: &[u64]) -> String {
    oid.iter()
        .map(|c| c.to_string())
        .collect::<Vec<_>>()
        .join(".")
}

fn oid_components(oid: &Oid<'_>) -> Vec<u64> {
    oid.to_id_string()
        .split('.')
        .filter_map(|p| p.parse::<u64>().ok())
        .collect()
}

/// A versioned SNMP session with an idempotent close guard.
///
/// Every operation is raced against `profile.timeout + 2000ms`; a
/// timeout force-closes the session and resolves the call with `None`
/// rather than propagating an error.
pub struct SnmpClient {
    session: Option<AsyncSession>,
    deadline: Duration,
    retries: u32,
}

impl SnmpClient {
    /// Builds a session for `target_ip` from the credential profile.
    /// Returns `None` on connect failure or timeout; never errors.
    pub async fn connect(target_ip: &str, profile: &SnmpProfile) -> Option<Self> {
        let deadline = Duration::from_millis(profile.timeout_ms) + SNMP_SAFETY_MARGIN;
        let session = match timeout(deadline, create_session(target_ip, profile)).await {
            Ok(Ok(session)) => session,
            Ok(Err(e)) => {
                tracing::warn!("SNMP session to {} failed: {}", target_ip, e);
                return None;
            }
            Err(_) => {
                tracing::warn!("SNMP session to {} timed out", target_ip);
                return None;
            }
        };
        Some(Self {
            session: Some(session),
            deadline,
            retries: profile.retries,
        })
    }

    /// Closes the underlying session. A no-op on second call.
    pub fn close(&mut self) {
        self.session.take();
    }

    pub fn is_closed(&self) -> bool {
        self.session.is_none()
    }

    /// Single GET with per-profile retries. `None` on timeout, transport
    /// error or malformed response; a timeout also closes the session.
    pub async fn get(&mut self, oid: &[u64]) -> Option<Varbind> {
        let attempts = self.retries.saturating_add(1);
        for _ in 0..attempts {
            let session = self.session.as_mut()?;
            let request = Oid::from(oid).ok()?;
            match timeout(self.deadline, session.get(&request)).await {
                Ok(Ok(mut response)) => {
                    let (oid, value) = response.varbinds.next()?;
                    return Some(Varbind {
                        oid: oid_components(&oid),
                        value: WireValue::from_value(&value),
                    });
                }
                Ok(Err(e)) => {
                    tracing::debug!("SNMP get failed: {}", e);
                    continue;
                }
                Err(_) => {
                    // Safety timer fired; the device is unresponsive.
                    self.close();
                    return None;
                }
            }
        }
        None
    }

    /// Walks the subtree under `root` via repeated GETNEXT, bounded by
    /// `budget` wall time and a row cap. Returns whatever rows were
    /// collected before the bound was hit; never errors.
    pub async fn walk(&mut self, root: &[u64], budget: Duration) -> Vec<Varbind> {
        let mut rows = Vec::new();
        let started = Instant::now();
        let mut current = root.to_vec();

        loop {
            if started.elapsed() > budget || rows.len() >= SNMP_WALK_MAX_ROWS {
                break;
            }
            let Some(session) = self.session.as_mut() else {
                break;
            };
            let Ok(request) = Oid::from(current.as_slice()) else {
                break;
            };
            match timeout(self.deadline, session.getnext(&request)).await {
                Ok(Ok(mut response)) => {
                    let Some((oid, value)) = response.varbinds.next() else {
                        break;
                    };
                    let components = oid_components(&oid);
                    if !components.starts_with(root) || components == current {
                        break;
                    }
                    let wire = WireValue::from_value(&value);
                    if wire == WireValue::EndOfMib {
                        break;
                    }
                    current = components.clone();
                    rows.push(Varbind {
                        oid: components,
                        value: wire,
                    });
                }
                Ok(Err(e)) => {
                    tracing::debug!("SNMP getnext failed: {}", e);
                    break;
                }
                Err(_) => {
                    self.close();
                    break;
                }
            }
        }

        rows
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lab_profile() -> SnmpProfile {
        SnmpProfile {
            id: 1,
            name: "lab".to_string(),
            version: "2c".to_string(),
            port: 161,
            community: Some("public".to_string()),
            username: None,
            security_level: None,
            auth_algorithm: None,
            auth_password: None,
            priv_algorithm: None,
            priv_password: None,
            timeout_ms: 500,
            retries: 0,
        }
    }

    // Session construction only binds a local UDP socket; no traffic
    // is sent until the first request.
    #[tokio::test]
    async fn close_twice_is_a_no_op() {
        let mut client = SnmpClient::connect("127.0.0.1", &lab_profile())
            .await
            .expect("local v2c session should build");
        assert!(!client.is_closed());
        client.close();
        assert!(client.is_closed());
        client.close();
        assert!(client.is_closed());
    }

    #[tokio::test]
    async fn get_on_closed_client_returns_none() {
        let mut client = SnmpClient::connect("127.0.0.1", &lab_profile())
            .await
            .expect("local v2c session should build");
        client.close();
        assert!(client.get(&[1, 3, 6, 1, 2, 1, 1, 1, 0]).await.is_none());
        assert!(
            client
                .walk(&[1, 3, 6, 1, 2, 1, 2], Duration::from_millis(100))
                .await
                .is_empty()
        );
    }

    #[test]
    fn oid_string_parsing() {
        assert_eq!(parse_oid_str("1.3.6.1.2.1"), Some(vec![1, 3, 6, 1, 2, 1]));
        assert_eq!(parse_oid_str(".1.3.6"), Some(vec![1, 3, 6]));
        assert_eq!(parse_oid_str(""), None);
        assert_eq!(parse_oid_str("1.3.x.6"), None);
    }

    #[test]
    fn wire_value_text_forms() {
        assert_eq!(
            WireValue::Bytes(b" edge-rtr ".to_vec()).as_text(),
            Some("edge-rtr".to_string())
        );
        assert_eq!(WireValue::Bytes(Vec::new()).as_text(), None);
        assert_eq!(
            WireValue::IpAddress([10, 0, 0, 1]).as_text(),
            Some("10.0.0.1".to_string())
        );
        assert_eq!(WireValue::NoSuchObject.as_text(), None);
    }

    #[test]
    fn wire_value_numeric_forms() {
        assert_eq!(WireValue::Int(42).as_u64(), Some(42));
        assert_eq!(WireValue::Int(-1).as_u64(), None);
        assert_eq!(WireValue::Uint(7).as_u64(), Some(7));
        assert_eq!(WireValue::Null.as_u64(), None);
    }
}
