//! Corporate (non-PPPoE) circuit lookup
//!
//! Resolves a VLAN interface name to its ifIndex by exact match against
//! `ifName`/`ifDescr`, joins the ARP table for the client IP and MAC,
//! and separately derives a public /32 `ip_block` from the CIDR route
//! table. The block is a different address from the ARP-resolved client
//! IP and the two are never conflated.

use crate::config::SNMP_WALK_BUDGET;
use crate::models::{Concentrator, CorporateLinkInfo, SnmpProfile};
use crate::snmp::{SnmpClient, Varbind};

use super::oids::{IF_DESCR, IF_NAME, IP_CIDR_ROUTE_IF_INDEX, IP_NET_TO_MEDIA_NET, IP_NET_TO_MEDIA_PHYS};
use super::tables::{arp_by_ifindex, cidr_public_host_route, index_rows};

/// Finds the ifIndex whose `ifName` or `ifDescr` equals the VLAN
/// interface name. Exact match only: a substring heuristic would risk
/// binding the wrong interface when VLAN ids nest (vlan10 vs vlan100).
fn find_if_index(
    vlan_interface: &str,
    names: &[(u32, String)],
    descrs: &[(u32, String)],
) -> Option<u32> {
    let wanted = vlan_interface.trim().to_lowercase();
    names
        .iter()
        .chain(descrs.iter())
        .find(|(_, text)| text.trim().to_lowercase() == wanted)
        .map(|(if_index, _)| *if_index)
}

/// Looks up the current binding of a corporate VLAN circuit.
///
/// Always returns a (possibly partially filled) record; every failing
/// branch is logged and leaves its fields `None`. Never errors.
pub async fn lookup_corporate_link_info(
    concentrator: &Concentrator,
    profile: &SnmpProfile,
    vlan_interface: &str,
) -> CorporateLinkInfo {
    let mut info = CorporateLinkInfo {
        vlan_interface: vlan_interface.to_string(),
        ..Default::default()
    };
    let router_ip = concentrator.ip_address.as_str();

    let (name_rows, descr_rows) = tokio::join!(
        walk_rows(router_ip, profile, IF_NAME),
        walk_rows(router_ip, profile, IF_DESCR),
    );
    let names = index_rows(&name_rows, IF_NAME);
    let descrs = index_rows(&descr_rows, IF_DESCR);

    let Some(if_index) = find_if_index(vlan_interface, &names, &descrs) else {
        tracing::warn!(
            "VLAN interface '{}' not found on {}",
            vlan_interface,
            router_ip
        );
        return info;
    };
    info.if_index = Some(if_index);

    // ARP join: client IP and MAC behind the interface
    let (net_rows, phys_rows) = tokio::join!(
        walk_rows(router_ip, profile, IP_NET_TO_MEDIA_NET),
        walk_rows(router_ip, profile, IP_NET_TO_MEDIA_PHYS),
    );
    let arp = arp_by_ifindex(&net_rows, &phys_rows, IP_NET_TO_MEDIA_NET.len());
    if let Some((ip, mac)) = arp.get(&if_index) {
        info.ip_address = Some(ip.to_string());
        info.mac_address = mac.clone();
    } else {
        tracing::debug!(
            "no ARP entry for ifIndex {} on {}",
            if_index,
            router_ip
        );
    }

    // Public /32 routed through the interface, used for external
    // blacklist/reputation monitoring
    let route_rows = walk_rows(router_ip, profile, IP_CIDR_ROUTE_IF_INDEX).await;
    if let Some(block) =
        cidr_public_host_route(&route_rows, IP_CIDR_ROUTE_IF_INDEX.len(), if_index)
    {
        info.ip_block = Some(block.to_string());
    }

    info
}

async fn walk_rows(router_ip: &str, profile: &SnmpProfile, subtree: &[u64]) -> Vec<Varbind> {
    match SnmpClient::connect(router_ip, profile).await {
        Some(mut client) => {
            let rows = client.walk(subtree, SNMP_WALK_BUDGET).await;
            client.close();
            rows
        }
        None => Vec::new(),
    }
}
