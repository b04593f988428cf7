//! PPPoE session correlation
//!
//! Joins the vendor OID-set walks into `{username -> ifIndex -> IP/MAC/
//! ifName}`. Candidates are tried in order and adopted only when their
//! username rows actually contain one of the requested targets; a
//! candidate that returns rows for an unrelated branch is skipped. When
//! SNMP yields nothing at all, the SSH CLI fallback takes over.

use std::collections::HashMap;
use std::net::Ipv4Addr;

use crate::config::SNMP_WALK_BUDGET;
use crate::models::{Concentrator, PppoeSessionInfo, SnmpProfile};
use crate::snmp::{SnmpClient, Varbind};

use super::oids::{
    self, AddressScheme, IF_ALIAS, IF_NAME, IP_CIDR_ROUTE_IF_INDEX, IP_NET_TO_MEDIA_NET,
    IP_NET_TO_MEDIA_PHYS, IP_ROUTE_IF_INDEX, OidCandidate,
};
use super::tables::{
    arp_by_ifindex, cidr_route_by_ifindex, index_rows, matched_targets, normalize_username,
    session_username_index, standard_route_by_ifindex,
};
use super::{Vendor, resolve_vendor, ssh};

/// Resolves the current session binding for each target username.
///
/// Always returns a map, possibly empty or partial: usernames that
/// cannot be found on any OID-set candidate or via the CLI fallback are
/// simply absent. Never errors.
pub async fn lookup_pppoe_sessions(
    concentrator: &Concentrator,
    profile: &SnmpProfile,
    usernames: &[String],
) -> HashMap<String, PppoeSessionInfo> {
    let vendor = resolve_vendor(concentrator);
    let targets: Vec<(String, String)> = usernames
        .iter()
        .map(|u| (u.clone(), normalize_username(u)))
        .collect();
    if targets.is_empty() {
        return HashMap::new();
    }

    let results = snmp_lookup(concentrator, profile, vendor, &targets).await;
    if !results.is_empty() {
        return results;
    }

    tracing::info!(
        "SNMP correlation on {} found nothing, trying CLI fallback",
        concentrator.ip_address
    );
    cli_fallback(concentrator, vendor, &targets).await
}

async fn snmp_lookup(
    concentrator: &Concentrator,
    profile: &SnmpProfile,
    vendor: Vendor,
    targets: &[(String, String)],
) -> HashMap<String, PppoeSessionInfo> {
    let router_ip = concentrator.ip_address.as_str();

    // IF-MIB names and aliases, used for output fields and the
    // alias-keyed retry for equipment that stores usernames there.
    let (name_rows, alias_rows) = tokio::join!(
        walk_rows(router_ip, profile, IF_NAME),
        walk_rows(router_ip, profile, IF_ALIAS),
    );
    let name_by_ifindex: HashMap<u32, String> = index_rows(&name_rows, IF_NAME).into_iter().collect();
    let alias_by_ifindex: HashMap<u32, String> =
        index_rows(&alias_rows, IF_ALIAS).into_iter().collect();

    for candidate in vendor.session_candidates() {
        let (user_rows, addr_rows) = tokio::join!(
            walk_rows(router_ip, profile, candidate.username_subtree),
            walk_optional(router_ip, profile, candidate.address_subtree),
        );
        if user_rows.is_empty() {
            tracing::debug!("candidate {} returned no rows", candidate.label);
            continue;
        }

        let ifindex_by_username = session_username_index(&user_rows, candidate.username_subtree);
        let matched = matched_targets(&ifindex_by_username, targets);
        if matched.is_empty() {
            // Rows exist but none belong to the requested usernames;
            // this is an unrelated branch, move to the next candidate.
            tracing::debug!(
                "candidate {} matched no requested username, skipping",
                candidate.label
            );
            continue;
        }

        tracing::info!(
            "candidate {} matched {} of {} usernames on {}",
            candidate.label,
            matched.len(),
            targets.len(),
            router_ip
        );

        let addresses =
            resolve_addresses(router_ip, profile, candidate, &addr_rows).await;

        let mut results = HashMap::new();
        for (original, normalized) in &matched {
            let if_index = ifindex_by_username[normalized];
            results.insert(
                original.clone(),
                build_info(
                    original,
                    if_index,
                    &addresses,
                    &name_by_ifindex,
                    &alias_by_ifindex,
                ),
            );
        }

        // Alias-keyed retry for the leftovers (e.g. Cisco ASR keeps the
        // username in ifAlias rather than a session table).
        let unmatched: Vec<&(String, String)> = targets
            .iter()
            .filter(|(original, _)| !results.contains_key(original))
            .collect();
        for (username, info) in alias_fallback(
            router_ip,
            profile,
            &unmatched,
            &name_by_ifindex,
            &alias_by_ifindex,
        )
        .await
        {
            results.insert(username, info);
        }

        return results;
    }

    // No candidate adopted. Alias-only equipment still carries the
    // username in interface descriptions; consult the alias index
    // before giving up on SNMP entirely.
    let all: Vec<&(String, String)> = targets.iter().collect();
    alias_fallback(router_ip, profile, &all, &name_by_ifindex, &alias_by_ifindex)
        .await
        .into_iter()
        .collect()
}

async fn alias_fallback(
    router_ip: &str,
    profile: &SnmpProfile,
    targets: &[&(String, String)],
    names: &HashMap<u32, String>,
    aliases: &HashMap<u32, String>,
) -> Vec<(String, PppoeSessionInfo)> {
    if targets.is_empty() || aliases.is_empty() {
        return Vec::new();
    }
    let arp = walk_arp(router_ip, profile).await;
    collect_alias_matches(targets, names, aliases, &arp)
}

/// Pure half of the alias retry: joins alias-index matches with
/// pre-walked ARP rows into session records.
fn collect_alias_matches(
    targets: &[&(String, String)],
    names: &HashMap<u32, String>,
    aliases: &HashMap<u32, String>,
    arp: &HashMap<u32, (Ipv4Addr, Option<String>)>,
) -> Vec<(String, PppoeSessionInfo)> {
    let mut found = Vec::new();
    for (original, normalized) in targets {
        if let Some(if_index) = alias_match(aliases, normalized) {
            let mut info = build_info(
                original,
                if_index,
                &ResolvedAddresses::default(),
                names,
                aliases,
            );
            if let Some((ip, mac)) = arp.get(&if_index) {
                info.ip_address = Some(ip.to_string());
                info.mac_address = mac.clone();
            }
            found.push((original.clone(), info));
        }
    }
    found
}

/// Per-ifIndex address material resolved for one adopted candidate
#[derive(Default)]
struct ResolvedAddresses {
    ip_by_row: HashMap<u32, String>,
    mac_by_row: HashMap<u32, String>,
}

impl ResolvedAddresses {
    fn ip(&self, if_index: u32) -> Option<String> {
        self.ip_by_row.get(&if_index).cloned()
    }

    fn mac(&self, if_index: u32) -> Option<String> {
        self.mac_by_row.get(&if_index).cloned()
    }
}

async fn resolve_addresses(
    router_ip: &str,
    profile: &SnmpProfile,
    candidate: &OidCandidate,
    addr_rows: &[Varbind],
) -> ResolvedAddresses {
    let mut ip_by_row = HashMap::new();
    let mut mac_by_row = HashMap::new();

    match candidate.addressing {
        AddressScheme::Row => {
            if let Some(subtree) = candidate.address_subtree {
                for (row, ip) in index_rows(addr_rows, subtree) {
                    ip_by_row.entry(row).or_insert(ip);
                }
            }
        }
        AddressScheme::Arp => {
            for (if_index, (ip, mac)) in walk_arp(router_ip, profile).await {
                ip_by_row.insert(if_index, ip.to_string());
                if let Some(mac) = mac {
                    mac_by_row.insert(if_index, mac);
                }
            }
        }
        AddressScheme::CidrRoute => {
            let rows = walk_rows(router_ip, profile, IP_CIDR_ROUTE_IF_INDEX).await;
            for (if_index, ip) in cidr_route_by_ifindex(&rows, IP_CIDR_ROUTE_IF_INDEX.len()) {
                ip_by_row.insert(if_index, ip.to_string());
            }
        }
        AddressScheme::StandardRoute => {
            let rows = walk_rows(router_ip, profile, IP_ROUTE_IF_INDEX).await;
            for (if_index, ip) in standard_route_by_ifindex(&rows, IP_ROUTE_IF_INDEX.len()) {
                ip_by_row.insert(if_index, ip.to_string());
            }
        }
    }

    ResolvedAddresses {
        ip_by_row,
        mac_by_row,
    }
}

fn build_info(
    username: &str,
    if_index: u32,
    addresses: &ResolvedAddresses,
    names: &HashMap<u32, String>,
    aliases: &HashMap<u32, String>,
) -> PppoeSessionInfo {
    PppoeSessionInfo {
        username: username.to_string(),
        ip_address: addresses.ip(if_index),
        mac_address: addresses.mac(if_index),
        if_index: Some(if_index),
        if_name: names.get(&if_index).cloned(),
        if_alias: aliases.get(&if_index).cloned(),
    }
}

/// Exact alias match first, then substring, mirroring how operators
/// annotate subscriber circuits in interface descriptions
fn alias_match(aliases: &HashMap<u32, String>, normalized: &str) -> Option<u32> {
    let mut containing: Option<u32> = None;
    for (if_index, alias) in aliases {
        let alias_normalized = normalize_username(alias);
        if alias_normalized == normalized {
            return Some(*if_index);
        }
        if containing.is_none() && alias_normalized.contains(normalized) {
            containing = Some(*if_index);
        }
    }
    containing
}

async fn cli_fallback(
    concentrator: &Concentrator,
    vendor: Vendor,
    targets: &[(String, String)],
) -> HashMap<String, PppoeSessionInfo> {
    let sessions = ssh::run_cli_lookup(concentrator, vendor).await;
    let mut results = HashMap::new();
    for (original, normalized) in targets {
        if let Some(ip) = sessions.get(normalized) {
            results.insert(
                original.clone(),
                PppoeSessionInfo {
                    username: original.clone(),
                    ip_address: Some(ip.clone()),
                    ..Default::default()
                },
            );
        }
    }
    results
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

async fn walk_optional(
    router_ip: &str,
    profile: &SnmpProfile,
    subtree: Option<&[u64]>,
) -> Vec<Varbind> {
    match subtree {
        Some(subtree) => walk_rows(router_ip, profile, subtree).await,
        None => Vec::new(),
    }
}

async fn walk_arp(
    router_ip: &str,
    profile: &SnmpProfile,
) -> HashMap<u32, (Ipv4Addr, Option<String>)> {
    let (net_rows, phys_rows) = tokio::join!(
        walk_rows(router_ip, profile, IP_NET_TO_MEDIA_NET),
        walk_rows(router_ip, profile, IP_NET_TO_MEDIA_PHYS),
    );
    arp_by_ifindex(&net_rows, &phys_rows, oids::IP_NET_TO_MEDIA_NET.len())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn alias_index_resolves_without_any_session_table() {
        let targets_owned = vec![("cliente.sul".to_string(), "cliente.sul".to_string())];
        let targets: Vec<&(String, String)> = targets_owned.iter().collect();
        let names = HashMap::from([(31, "pppoe-out31".to_string())]);
        let aliases = HashMap::from([(31, "<pppoe-cliente.sul>".to_string())]);
        let arp = HashMap::from([(
            31,
            (
                "100.64.3.9".parse::<Ipv4Addr>().unwrap(),
                Some("AA:BB:CC:00:11:22".to_string()),
            ),
        )]);

        let found = collect_alias_matches(&targets, &names, &aliases, &arp);
        assert_eq!(found.len(), 1);
        let (username, info) = &found[0];
        assert_eq!(username, "cliente.sul");
        assert_eq!(info.if_index, Some(31));
        assert_eq!(info.ip_address.as_deref(), Some("100.64.3.9"));
        assert_eq!(info.mac_address.as_deref(), Some("AA:BB:CC:00:11:22"));
        assert_eq!(info.if_name.as_deref(), Some("pppoe-out31"));
    }

    #[test]
    fn alias_misses_produce_no_entries() {
        let targets_owned = vec![("missing.user".to_string(), "missing.user".to_string())];
        let targets: Vec<&(String, String)> = targets_owned.iter().collect();
        let aliases = HashMap::from([(5, "uplink to core".to_string())]);

        let found = collect_alias_matches(&targets, &HashMap::new(), &aliases, &HashMap::new());
        assert!(found.is_empty());
    }

    #[test]
    fn exact_alias_wins_over_substring() {
        let aliases = HashMap::from([
            (1, "corp-joao.silva-backup".to_string()),
            (2, "joao.silva".to_string()),
        ]);
        assert_eq!(alias_match(&aliases, "joao.silva"), Some(2));
    }
}
