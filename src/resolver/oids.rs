//! OID constants and per-vendor candidate tables
//!
//! Candidates are ordered most-specific first; the correlator adopts the
//! first one whose username rows actually contain a requested target.

// ====== IF-MIB ======

/// ifDescr
pub const IF_DESCR: &[u64] = &[1, 3, 6, 1, 2, 1, 2, 2, 1, 2];
/// ifName
pub const IF_NAME: &[u64] = &[1, 3, 6, 1, 2, 1, 31, 1, 1, 1, 1];
/// ifAlias
pub const IF_ALIAS: &[u64] = &[1, 3, 6, 1, 2, 1, 31, 1, 1, 1, 18];

// ====== ARP / route tables ======

/// ipNetToMediaPhysAddress, index = ifIndex.ip
pub const IP_NET_TO_MEDIA_PHYS: &[u64] = &[1, 3, 6, 1, 2, 1, 4, 22, 1, 2];
/// ipNetToMediaNetAddress, index = ifIndex.ip
pub const IP_NET_TO_MEDIA_NET: &[u64] = &[1, 3, 6, 1, 2, 1, 4, 22, 1, 3];
/// ipCidrRouteIfIndex, index = dest.mask.tos.nextHop
pub const IP_CIDR_ROUTE_IF_INDEX: &[u64] = &[1, 3, 6, 1, 2, 1, 4, 24, 4, 1, 5];
/// ipRouteIfIndex (deprecated standard route table), index = dest
pub const IP_ROUTE_IF_INDEX: &[u64] = &[1, 3, 6, 1, 2, 1, 4, 21, 1, 2];

// ====== Resource OIDs ======

/// HOST-RESOURCES-MIB hrProcessorLoad, first processor
pub const HR_PROCESSOR_LOAD_FIRST: &[u64] = &[1, 3, 6, 1, 2, 1, 25, 3, 3, 1, 2, 1];
/// CISCO-PROCESS-MIB cpmCPUTotal5minRev, first CPU
pub const CISCO_CPU_5MIN: &[u64] = &[1, 3, 6, 1, 4, 1, 9, 9, 109, 1, 1, 1, 1, 8, 1];
/// CISCO-MEMORY-POOL-MIB processor pool used percentage
pub const CISCO_MEM_USED_PERCENT: &[u64] = &[1, 3, 6, 1, 4, 1, 9, 9, 48, 1, 1, 1, 5, 1];
/// HUAWEI-ENTITY-EXTENT-MIB hwEntityCpuUsage
pub const HUAWEI_ENTITY_CPU: &[u64] = &[1, 3, 6, 1, 4, 1, 2011, 5, 25, 31, 1, 1, 1, 1, 5, 1];
/// HUAWEI-ENTITY-EXTENT-MIB hwEntityMemUsage
pub const HUAWEI_ENTITY_MEM: &[u64] = &[1, 3, 6, 1, 4, 1, 2011, 5, 25, 31, 1, 1, 1, 1, 7, 1];

// ====== Vendor session tables ======

/// Mikrotik PPP active table: user name column
pub const MIKROTIK_PPP_ACTIVE_NAME: &[u64] = &[1, 3, 6, 1, 4, 1, 14988, 1, 1, 11, 1, 1, 2];
/// Mikrotik PPP active table: remote address column
pub const MIKROTIK_PPP_ACTIVE_ADDRESS: &[u64] = &[1, 3, 6, 1, 4, 1, 14988, 1, 1, 11, 1, 1, 3];
/// Mikrotik PPP secret table: user name column
pub const MIKROTIK_PPP_SECRET_NAME: &[u64] = &[1, 3, 6, 1, 4, 1, 14988, 1, 1, 12, 1, 1, 2];
/// CISCO-SUBSCRIBER-SESSION-MIB csubSessionUsername
pub const CISCO_SUBSCRIBER_USERNAME: &[u64] = &[1, 3, 6, 1, 4, 1, 9, 9, 786, 1, 1, 1, 1, 6];
/// CISCO-SUBSCRIBER-SESSION-MIB csubSessionIpAddr
pub const CISCO_SUBSCRIBER_IP: &[u64] = &[1, 3, 6, 1, 4, 1, 9, 9, 786, 1, 1, 1, 1, 19];
/// HUAWEI-BRAS-MIB hwAccessUserUserName
pub const HUAWEI_ACCESS_USER_NAME: &[u64] = &[1, 3, 6, 1, 4, 1, 2011, 5, 2, 1, 15, 1, 3];
/// HUAWEI-BRAS-MIB hwAccessUserIpAddress
pub const HUAWEI_ACCESS_USER_IP: &[u64] = &[1, 3, 6, 1, 4, 1, 2011, 5, 2, 1, 15, 1, 15];

/// How a candidate resolves the IP for a matched row
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AddressScheme {
    /// Address subtree shares the username subtree's row index
    Row,
    /// Direct address table: ARP (`ipNetToMedia*`) keyed by ifIndex
    Arp,
    /// CIDR route table: composite index encodes dest.mask.tos.nextHop
    CidrRoute,
    /// Standard route table: index = IP, value = ifIndex, inverted
    StandardRoute,
}

/// One ordered OID-set candidate for a vendor
#[derive(Debug, Clone, Copy)]
pub struct OidCandidate {
    pub label: &'static str,
    pub username_subtree: &'static [u64],
    pub address_subtree: Option<&'static [u64]>,
    pub addressing: AddressScheme,
}

pub const MIKROTIK_CANDIDATES: &[OidCandidate] = &[
    OidCandidate {
        label: "mikrotik-ppp-active",
        username_subtree: MIKROTIK_PPP_ACTIVE_NAME,
        address_subtree: Some(MIKROTIK_PPP_ACTIVE_ADDRESS),
        addressing: AddressScheme::Row,
    },
    OidCandidate {
        label: "mikrotik-ppp-secret",
        username_subtree: MIKROTIK_PPP_SECRET_NAME,
        address_subtree: None,
        addressing: AddressScheme::Arp,
    },
    OidCandidate {
        label: "ifmib-ppp-naming",
        username_subtree: IF_NAME,
        address_subtree: None,
        addressing: AddressScheme::Arp,
    },
];

pub const CISCO_CANDIDATES: &[OidCandidate] = &[
    OidCandidate {
        label: "cisco-subscriber-session",
        username_subtree: CISCO_SUBSCRIBER_USERNAME,
        address_subtree: Some(CISCO_SUBSCRIBER_IP),
        addressing: AddressScheme::Row,
    },
    OidCandidate {
        label: "cisco-ifalias-cidr-route",
        username_subtree: IF_ALIAS,
        address_subtree: None,
        addressing: AddressScheme::CidrRoute,
    },
];

pub const HUAWEI_CANDIDATES: &[OidCandidate] = &[OidCandidate {
    label: "huawei-bras-access-user",
    username_subtree: HUAWEI_ACCESS_USER_NAME,
    address_subtree: Some(HUAWEI_ACCESS_USER_IP),
    addressing: AddressScheme::Row,
}];

pub const GENERIC_CANDIDATES: &[OidCandidate] = &[
    OidCandidate {
        label: "ifmib-ppp-naming",
        username_subtree: IF_NAME,
        address_subtree: None,
        addressing: AddressScheme::Arp,
    },
    OidCandidate {
        label: "ifmib-route-table",
        username_subtree: IF_NAME,
        address_subtree: None,
        addressing: AddressScheme::StandardRoute,
    },
];
