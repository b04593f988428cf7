//! Pure table-shaping helpers for the resolver
//!
//! Everything here is network-free: walk rows come in, indexed maps come
//! out, so the composite-index and filtering logic is unit-testable.

use std::collections::HashMap;
use std::net::Ipv4Addr;
use std::sync::OnceLock;

use regex::Regex;

use crate::snmp::{Varbind, WireValue};

/// Strips interface-name decoration from a PPP username.
/// `<pppoe-joao.silva>` and `<ppp-joao.silva>` both become `joao.silva`.
pub fn normalize_username(raw: &str) -> String {
    static DECORATED: OnceLock<Regex> = OnceLock::new();
    let re = DECORATED.get_or_init(|| {
        Regex::new(r"^<(?:pppoe|ppp)-(.+)>$").expect("static regex")
    });
    let trimmed = raw.trim();
    match re.captures(trimmed) {
        Some(caps) => caps[1].to_string(),
        None => trimmed.to_string(),
    }
}

/// Indexes walk rows by the first OID component after the subtree
/// prefix, keeping the printable value. Rows with no printable value or
/// an empty suffix are dropped.
pub fn index_rows(rows: &[Varbind], subtree: &[u64]) -> Vec<(u32, String)> {
    rows.iter()
        .filter_map(|row| {
            let suffix = row.oid.get(subtree.len()..)?;
            let index = u32::try_from(*suffix.first()?).ok()?;
            let text = row.value.as_text()?;
            Some((index, text))
        })
        .collect()
}

/// Builds the normalized-username -> ifIndex map from one candidate's
/// walk rows. First-seen wins for duplicate usernames.
pub fn session_username_index(rows: &[Varbind], subtree: &[u64]) -> HashMap<String, u32> {
    let mut index = HashMap::new();
    for (if_index, raw) in index_rows(rows, subtree) {
        index.entry(normalize_username(&raw)).or_insert(if_index);
    }
    index
}

/// Targets present in a candidate's username index. An empty result on
/// a non-empty index means the candidate walked an unrelated branch and
/// the next candidate in the ordered list must be tried.
pub fn matched_targets<'a>(
    index: &HashMap<String, u32>,
    targets: &'a [(String, String)],
) -> Vec<&'a (String, String)> {
    targets
        .iter()
        .filter(|(_, normalized)| index.contains_key(normalized))
        .collect()
}

/// Formats a 6-byte physical address as colon-separated hex
pub fn format_mac(bytes: &[u8]) -> Option<String> {
    if bytes.len() != 6 {
        return None;
    }
    Some(
        bytes
            .iter()
            .map(|b| format!("{:02X}", b))
            .collect::<Vec<_>>()
            .join(":"),
    )
}

fn ipv4_from_components(components: &[u64]) -> Option<Ipv4Addr> {
    if components.len() != 4 {
        return None;
    }
    let octets: Vec<u8> = components
        .iter()
        .map(|c| u8::try_from(*c))
        .collect::<Result<_, _>>()
        .ok()?;
    Some(Ipv4Addr::new(octets[0], octets[1], octets[2], octets[3]))
}

/// Destinations that can never identify a subscriber interface:
/// default route, loopback, multicast, limited broadcast.
fn is_routable_destination(ip: Ipv4Addr) -> bool {
    !(ip.is_unspecified() || ip.is_loopback() || ip.is_multicast() || ip.is_broadcast())
}

/// Public-address filter for corporate `ip_block` detection. Rejects
/// RFC1918, CGNAT (100.64.0.0/10), loopback, link-local, multicast,
/// broadcast and the unspecified address.
pub fn is_public_ipv4(ip: Ipv4Addr) -> bool {
    let octets = ip.octets();
    let cgnat = octets[0] == 100 && (64..128).contains(&octets[1]);
    !(ip.is_private()
        || cgnat
        || ip.is_loopback()
        || ip.is_link_local()
        || ip.is_multicast()
        || ip.is_broadcast()
        || ip.is_unspecified())
}

/// ARP entry joined per ifIndex: first-seen IP plus MAC when available.
///
/// `net_rows` come from `ipNetToMediaNetAddress`, `phys_rows` from
/// `ipNetToMediaPhysAddress`; both carry `ifIndex.a.b.c.d` indices.
pub fn arp_by_ifindex(
    net_rows: &[Varbind],
    phys_rows: &[Varbind],
    subtree_len: usize,
) -> HashMap<u32, (Ipv4Addr, Option<String>)> {
    let mut macs: HashMap<(u32, Ipv4Addr), String> = HashMap::new();
    for row in phys_rows {
        let Some((if_index, ip)) = arp_index(&row.oid, subtree_len) else {
            continue;
        };
        if let WireValue::Bytes(bytes) = &row.value
            && let Some(mac) = format_mac(bytes)
        {
            macs.insert((if_index, ip), mac);
        }
    }

    let mut out: HashMap<u32, (Ipv4Addr, Option<String>)> = HashMap::new();
    for row in net_rows {
        let Some((if_index, ip)) = arp_index(&row.oid, subtree_len) else {
            continue;
        };
        out.entry(if_index)
            .or_insert_with(|| (ip, macs.get(&(if_index, ip)).cloned()));
    }
    out
}

fn arp_index(oid: &[u64], subtree_len: usize) -> Option<(u32, Ipv4Addr)> {
    let suffix = oid.get(subtree_len..)?;
    if suffix.len() != 5 {
        return None;
    }
    let if_index = u32::try_from(suffix[0]).ok()?;
    let ip = ipv4_from_components(&suffix[1..])?;
    Some((if_index, ip))
}

/// Inverts `ipCidrRouteIfIndex` rows into ifIndex -> destination IP.
///
/// The composite index encodes `dest(4).mask(4).tos(1).nextHop(4)`; the
/// first four components are the destination. Default, broadcast,
/// multicast and loopback-prefixed destinations are rejected, and only
/// the first-seen mapping per ifIndex is kept.
pub fn cidr_route_by_ifindex(rows: &[Varbind], subtree_len: usize) -> HashMap<u32, Ipv4Addr> {
    let mut out: HashMap<u32, Ipv4Addr> = HashMap::new();
    for row in rows {
        let Some(suffix) = row.oid.get(subtree_len..) else {
            continue;
        };
        if suffix.len() < 4 {
            continue;
        }
        let Some(dest) = ipv4_from_components(&suffix[..4]) else {
            continue;
        };
        if !is_routable_destination(dest) {
            continue;
        }
        let Some(if_index) = row.value.as_u64().and_then(|v| u32::try_from(v).ok()) else {
            continue;
        };
        out.entry(if_index).or_insert(dest);
    }
    out
}

/// A /32-masked route through `if_index` with a public destination,
/// from `ipCidrRouteIfIndex` rows. Used for corporate `ip_block`.
pub fn cidr_public_host_route(
    rows: &[Varbind],
    subtree_len: usize,
    if_index: u32,
) -> Option<Ipv4Addr> {
    for row in rows {
        let Some(suffix) = row.oid.get(subtree_len..) else {
            continue;
        };
        if suffix.len() < 8 {
            continue;
        }
        let (Some(dest), Some(mask)) = (
            ipv4_from_components(&suffix[..4]),
            ipv4_from_components(&suffix[4..8]),
        ) else {
            continue;
        };
        if mask != Ipv4Addr::new(255, 255, 255, 255) || !is_public_ipv4(dest) {
            continue;
        }
        let row_if_index = row.value.as_u64().and_then(|v| u32::try_from(v).ok());
        if row_if_index == Some(if_index) {
            return Some(dest);
        }
    }
    None
}

/// Inverts `ipRouteIfIndex` rows (index = IP, value = ifIndex) into
/// ifIndex -> IP with the same destination filter and first-seen rule.
pub fn standard_route_by_ifindex(rows: &[Varbind], subtree_len: usize) -> HashMap<u32, Ipv4Addr> {
    let mut out: HashMap<u32, Ipv4Addr> = HashMap::new();
    for row in rows {
        let Some(suffix) = row.oid.get(subtree_len..) else {
            continue;
        };
        let Some(dest) = ipv4_from_components(suffix) else {
            continue;
        };
        if !is_routable_destination(dest) {
            continue;
        }
        let Some(if_index) = row.value.as_u64().and_then(|v| u32::try_from(v).ok()) else {
            continue;
        };
        out.entry(if_index).or_insert(dest);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn varbind(oid: &[u64], value: WireValue) -> Varbind {
        Varbind {
            oid: oid.to_vec(),
            value,
        }
    }

    #[test]
    fn username_decoration_is_stripped() {
        assert_eq!(normalize_username("<pppoe-joao.silva>"), "joao.silva");
        assert_eq!(normalize_username("<ppp-maria>"), "maria");
        assert_eq!(normalize_username("  plain.user  "), "plain.user");
        // Only the documented decorations are stripped
        assert_eq!(normalize_username("<vlan-100>"), "<vlan-100>");
    }

    #[test]
    fn rows_index_by_first_suffix_component() {
        let subtree = &[1, 3, 6, 1][..];
        let rows = vec![
            varbind(&[1, 3, 6, 1, 12], WireValue::Bytes(b"user-a".to_vec())),
            varbind(&[1, 3, 6, 1, 13, 9], WireValue::Bytes(b"user-b".to_vec())),
            varbind(&[1, 3, 6, 1, 14], WireValue::Null),
        ];
        let indexed = index_rows(&rows, subtree);
        assert_eq!(indexed.len(), 2);
        assert_eq!(indexed[0], (12, "user-a".to_string()));
        assert_eq!(indexed[1], (13, "user-b".to_string()));
    }

    #[test]
    fn unrelated_candidate_rows_are_skipped_and_the_next_one_matches() {
        let subtree = &[1, 3, 6][..];
        let targets = vec![("joao.silva".to_string(), "joao.silva".to_string())];

        // First candidate walks fine but carries only unrelated users
        let first = vec![
            varbind(&[1, 3, 6, 1], WireValue::Bytes(b"<pppoe-other.user>".to_vec())),
            varbind(&[1, 3, 6, 2], WireValue::Bytes(b"<pppoe-another>".to_vec())),
        ];
        let first_index = session_username_index(&first, subtree);
        assert!(!first_index.is_empty());
        assert!(matched_targets(&first_index, &targets).is_empty());

        // Second candidate carries the requested username
        let second = vec![varbind(
            &[1, 3, 6, 7],
            WireValue::Bytes(b"<ppp-joao.silva>".to_vec()),
        )];
        let second_index = session_username_index(&second, subtree);
        let matched = matched_targets(&second_index, &targets);
        assert_eq!(matched.len(), 1);
        assert_eq!(second_index["joao.silva"], 7);
    }

    #[test]
    fn duplicate_session_rows_keep_the_first_ifindex() {
        let subtree = &[1, 3, 6][..];
        let rows = vec![
            varbind(&[1, 3, 6, 4], WireValue::Bytes(b"maria".to_vec())),
            varbind(&[1, 3, 6, 9], WireValue::Bytes(b"<pppoe-maria>".to_vec())),
        ];
        let index = session_username_index(&rows, subtree);
        assert_eq!(index["maria"], 4);
    }

    #[test]
    fn public_ip_filter_matrix() {
        for not_public in ["10.0.0.5", "172.20.0.1", "192.168.1.1", "100.70.0.1", "127.0.0.1"] {
            let ip: Ipv4Addr = not_public.parse().unwrap();
            assert!(!is_public_ipv4(ip), "{} should not be public", not_public);
        }
        let public: Ipv4Addr = "191.52.254.164".parse().unwrap();
        assert!(is_public_ipv4(public));
        // CGNAT boundary: 100.63.x is public, 100.127.x is not
        assert!(is_public_ipv4("100.63.0.1".parse().unwrap()));
        assert!(!is_public_ipv4("100.127.255.254".parse().unwrap()));
    }

    #[test]
    fn arp_rows_join_ip_and_mac_per_ifindex() {
        let subtree_len = 2;
        let net = vec![
            varbind(&[9, 9, 7, 10, 20, 30, 40], WireValue::IpAddress([10, 20, 30, 40])),
            // Second entry for ifIndex 7 is ignored (first-seen wins)
            varbind(&[9, 9, 7, 10, 20, 30, 41], WireValue::IpAddress([10, 20, 30, 41])),
        ];
        let phys = vec![varbind(
            &[9, 8, 7, 10, 20, 30, 40],
            WireValue::Bytes(vec![0xAA, 0xBB, 0xCC, 0x00, 0x11, 0x22]),
        )];
        let joined = arp_by_ifindex(&net, &phys, subtree_len);
        let (ip, mac) = joined.get(&7).expect("ifIndex 7");
        assert_eq!(*ip, Ipv4Addr::new(10, 20, 30, 40));
        assert_eq!(mac.as_deref(), Some("AA:BB:CC:00:11:22"));
    }

    #[test]
    fn cidr_composite_index_extracts_destination() {
        let subtree_len = 1;
        let rows = vec![
            // dest 100.70.0.9 mask /32 tos 0 nexthop 0.0.0.0 -> ifIndex 31
            varbind(
                &[5, 100, 70, 0, 9, 255, 255, 255, 255, 0, 0, 0, 0, 0],
                WireValue::Int(31),
            ),
            // default route is rejected
            varbind(
                &[5, 0, 0, 0, 0, 0, 0, 0, 0, 0, 10, 0, 0, 1],
                WireValue::Int(31),
            ),
        ];
        let map = cidr_route_by_ifindex(&rows, subtree_len);
        assert_eq!(map.get(&31), Some(&Ipv4Addr::new(100, 70, 0, 9)));
        assert_eq!(map.len(), 1);
    }

    #[test]
    fn public_host_route_requires_full_mask_and_public_dest() {
        let subtree_len = 1;
        let rows = vec![
            // Private /32 through ifIndex 31: rejected
            varbind(
                &[5, 10, 0, 0, 9, 255, 255, 255, 255, 0, 0, 0, 0, 0],
                WireValue::Int(31),
            ),
            // Public but /30: rejected
            varbind(
                &[5, 191, 52, 254, 164, 255, 255, 255, 252, 0, 0, 0, 0, 0],
                WireValue::Int(31),
            ),
            // Public /32 through another interface: rejected
            varbind(
                &[5, 191, 52, 254, 164, 255, 255, 255, 255, 0, 0, 0, 0, 0],
                WireValue::Int(99),
            ),
            // Public /32 through ifIndex 31: accepted
            varbind(
                &[5, 191, 52, 254, 165, 255, 255, 255, 255, 0, 0, 0, 0, 0],
                WireValue::Int(31),
            ),
        ];
        assert_eq!(
            cidr_public_host_route(&rows, subtree_len, 31),
            Some(Ipv4Addr::new(191, 52, 254, 165))
        );
        assert_eq!(cidr_public_host_route(&rows, subtree_len, 7), None);
    }

    #[test]
    fn standard_route_rows_invert_to_ifindex() {
        let subtree_len = 1;
        let rows = vec![
            varbind(&[2, 100, 70, 1, 2], WireValue::Int(12)),
            varbind(&[2, 224, 0, 0, 1], WireValue::Int(12)), // multicast rejected
            varbind(&[2, 100, 70, 1, 3], WireValue::Int(12)), // first-seen wins
        ];
        let map = standard_route_by_ifindex(&rows, subtree_len);
        assert_eq!(map.get(&12), Some(&Ipv4Addr::new(100, 70, 1, 2)));
    }

    #[test]
    fn mac_formatting() {
        assert_eq!(
            format_mac(&[0, 1, 2, 0xAB, 0xCD, 0xEF]),
            Some("00:01:02:AB:CD:EF".to_string())
        );
        assert_eq!(format_mac(&[1, 2, 3]), None);
    }
}
