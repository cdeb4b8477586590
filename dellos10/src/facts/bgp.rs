//! BGP neighbors and configuration.

use indexmap::IndexMap;
use roxmltree::Node;
use serde::Serialize;

use super::{FactResult, first_value, for_each_document};
use crate::convert::{UNKNOWN, UNKNOWN_BOOL, UNKNOWN_INT, convert_bool, convert_int, or_unknown};
use crate::driver::{Os10Driver, Session};
use crate::error::Result;
use crate::platform::dellos10::BGP_NOT_ACTIVE;
use crate::telemetry::get;

const SUMMARY_PATH: &str = "./data/bgp-oper/vrf/summary-info/";
const BULK_PEER_PATH: &str = "./bulk/data/peer-oper";
const SINGLE_PEER_PATH: &str = "./data/bgp-oper/vrf/peer-oper";
const GROUP_CONFIG_PATH: &str = "./data/bgp-router/vrf/peer-group-config";
const PEER_CONFIG_PATH: &str = "./data/bgp-router/vrf/peer-config";

/// Group name for neighbors that belong to no peer group.
pub const UNGROUPED: &str = "_";

/// VRF key of [`Os10Driver::get_bgp_neighbors`] results.
pub const GLOBAL_VRF: &str = "global";

/// VRF key of [`Os10Driver::get_bgp_neighbors_detail`] results.
pub const DEFAULT_VRF: &str = "default";

/// Router id and peers keyed by remote address.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BgpNeighbors {
    pub router_id: String,
    pub peers: IndexMap<String, BgpPeer>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BgpPeer {
    pub local_as: i64,
    pub remote_as: i64,
    pub remote_id: String,
    pub is_up: bool,
    pub is_enabled: bool,
    pub description: String,
    pub uptime: i64,
    pub address_family: IndexMap<String, AddressFamily>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct AddressFamily {
    pub sent_prefixes: i64,
    pub accepted_prefixes: i64,
    pub received_prefixes: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BgpPeerDetail {
    pub up: bool,
    pub local_as: i64,
    pub remote_as: i64,
    pub router_id: String,
    pub local_address: String,
    pub routing_table: String,
    pub local_address_configured: bool,
    pub local_port: i64,
    pub remote_address: String,
    pub remote_port: i64,
    pub multihop: bool,
    pub multipath: bool,
    pub remove_private_as: bool,
    pub import_policy: String,
    pub export_policy: String,
    pub input_messages: i64,
    pub output_messages: i64,
    pub input_updates: i64,
    pub output_updates: i64,
    pub messages_queued_out: i64,
    pub connection_state: String,
    pub previous_connection_state: String,
    pub last_event: String,
    pub suppress_4byte_as: bool,
    pub local_as_prepend: bool,
    pub holdtime: i64,
    pub configured_holdtime: i64,
    pub keepalive: i64,
    pub configured_keepalive: i64,
    pub active_prefix_count: i64,
    pub received_prefix_count: i64,
    pub accepted_prefix_count: i64,
    pub suppressed_prefix_count: i64,
    pub advertised_prefix_count: i64,
    pub flap_count: i64,
}

/// One peer group with its member neighbors.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BgpGroup {
    #[serde(rename = "type")]
    pub group_type: String,
    pub description: String,
    pub apply_groups: Vec<String>,
    pub multipath: bool,
    pub multihop_ttl: i64,
    pub local_address: String,
    pub local_as: i64,
    pub remote_as: i64,
    pub import_policy: String,
    pub export_policy: String,
    pub remove_private_as: bool,
    pub prefix_limit: IndexMap<String, i64>,
    pub neighbors: IndexMap<String, BgpConfigNeighbor>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BgpConfigNeighbor {
    pub description: String,
    pub import_policy: String,
    pub export_policy: String,
    pub local_address: String,
    pub local_as: i64,
    pub remote_as: i64,
    pub authentication_key: String,
    pub prefix_limit: IndexMap<String, i64>,
    pub route_reflector_client: bool,
    pub nhs: bool,
}

impl Default for BgpGroup {
    fn default() -> Self {
        Self {
            group_type: UNKNOWN.to_string(),
            description: UNKNOWN.to_string(),
            apply_groups: Vec::new(),
            multipath: UNKNOWN_BOOL,
            multihop_ttl: UNKNOWN_INT,
            local_address: UNKNOWN.to_string(),
            local_as: UNKNOWN_INT,
            remote_as: UNKNOWN_INT,
            import_policy: UNKNOWN.to_string(),
            export_policy: UNKNOWN.to_string(),
            remove_private_as: UNKNOWN_BOOL,
            prefix_limit: IndexMap::new(),
            neighbors: IndexMap::new(),
        }
    }
}

/// Session state `established` means up.
fn session_up(state: &str) -> bool {
    if state.is_empty() {
        UNKNOWN_BOOL
    } else {
        state.eq_ignore_ascii_case("established")
    }
}

/// The device reports `admin-down-state`; enabled is its negation.
fn admin_enabled(admin_down: &str) -> bool {
    if admin_down.is_empty() {
        UNKNOWN_BOOL
    } else {
        !convert_bool(admin_down)
    }
}

fn int(node: Node<'_, '_>, path: &str) -> i64 {
    convert_int(get(node, path).as_str())
}

/// Peers of a `show ip bgp neighbors` reply keyed by remote address.
pub fn parse_bgp_neighbors(raw: &str) -> Result<BgpNeighbors> {
    let router_id = first_value(raw, &format!("{SUMMARY_PATH}router-id"))?;
    let local_as = convert_int(first_value(raw, &format!("{SUMMARY_PATH}local-as"))?.as_str());

    let mut peers = IndexMap::new();
    for_each_document(raw, |doc| {
        for node in doc.get_all(BULK_PEER_PATH) {
            let remote_address = get(node, "remote-address");
            if remote_address.is_empty() {
                continue;
            }
            let mut address_family = IndexMap::new();
            address_family.insert(
                "ipv4".to_string(),
                AddressFamily {
                    sent_prefixes: int(node, "out-prefixes"),
                    accepted_prefixes: UNKNOWN_INT,
                    received_prefixes: int(node, "in-prefixes"),
                },
            );
            let peer = BgpPeer {
                local_as,
                remote_as: int(node, "remote-as"),
                remote_id: remote_address.clone(),
                is_up: session_up(&get(node, "bgp-state")),
                is_enabled: admin_enabled(&get(node, "admin-down-state")),
                description: UNKNOWN.to_string(),
                uptime: UNKNOWN_INT,
                address_family,
            };
            peers.insert(remote_address, peer);
        }
    })?;

    Ok(BgpNeighbors {
        router_id: or_unknown(&router_id),
        peers,
    })
}

/// Detailed peers grouped by remote AS.
///
/// A reply for one neighbor carries the peer under `data/bgp-oper`, the
/// full table under `bulk/data`; set `single` accordingly.
pub fn parse_bgp_neighbors_detail(raw: &str, single: bool) -> Result<IndexMap<i64, Vec<BgpPeerDetail>>> {
    let router_id = or_unknown(&first_value(raw, &format!("{SUMMARY_PATH}router-id"))?);
    let peer_path = if single { SINGLE_PEER_PATH } else { BULK_PEER_PATH };

    let mut by_as: IndexMap<i64, Vec<BgpPeerDetail>> = IndexMap::new();
    for_each_document(raw, |doc| {
        for node in doc.get_all(peer_path) {
            if get(node, "remote-as").is_empty() {
                continue;
            }
            let state = get(node, "bgp-state");
            let detail = BgpPeerDetail {
                up: session_up(&state),
                local_as: int(node, "local-as"),
                remote_as: int(node, "remote-as"),
                router_id: router_id.clone(),
                local_address: or_unknown(&get(node, "local-address")),
                routing_table: UNKNOWN.to_string(),
                local_address_configured: true,
                local_port: int(node, "local-port"),
                remote_address: or_unknown(&get(node, "remote-address")),
                remote_port: int(node, "remote-port"),
                multihop: UNKNOWN_BOOL,
                multipath: UNKNOWN_BOOL,
                remove_private_as: UNKNOWN_BOOL,
                import_policy: UNKNOWN.to_string(),
                export_policy: UNKNOWN.to_string(),
                input_messages: int(node, "rcvd-msgs"),
                output_messages: int(node, "sent-msgs"),
                input_updates: int(node, "rcvd-updates"),
                output_updates: int(node, "sent-updates"),
                messages_queued_out: UNKNOWN_INT,
                connection_state: or_unknown(&state),
                previous_connection_state: UNKNOWN.to_string(),
                last_event: UNKNOWN.to_string(),
                suppress_4byte_as: UNKNOWN_BOOL,
                local_as_prepend: UNKNOWN_BOOL,
                holdtime: int(node, "negotiated-hold-time"),
                configured_holdtime: int(node, "config-hold-time"),
                keepalive: int(node, "negotiated-keepalive"),
                configured_keepalive: int(node, "config-keepalive"),
                active_prefix_count: int(node, "in-prefixes"),
                received_prefix_count: int(node, "in-prefixes"),
                accepted_prefix_count: UNKNOWN_INT,
                suppressed_prefix_count: UNKNOWN_INT,
                advertised_prefix_count: int(node, "out-prefixes"),
                flap_count: UNKNOWN_INT,
            };
            by_as.entry(detail.remote_as).or_default().push(detail);
        }
    })?;
    Ok(by_as)
}

/// Peer groups from `show running-configuration bgp`, each with its
/// neighbors. Neighbors outside any group are collected under [`UNGROUPED`].
pub fn parse_bgp_config(raw: &str) -> Result<IndexMap<String, BgpGroup>> {
    let mut groups: IndexMap<String, BgpGroup> = IndexMap::new();
    for_each_document(raw, |doc| {
        for node in doc.get_all(GROUP_CONFIG_PATH) {
            let name = get(node, "name");
            if name.is_empty() {
                continue;
            }
            groups.insert(
                name,
                BgpGroup {
                    multihop_ttl: int(node, "ebgp-multihop-count"),
                    local_as: int(node, "local-as/as-number"),
                    remote_as: int(node, "remote-as"),
                    remove_private_as: convert_bool(get(node, "remove-private-as").as_str()),
                    ..Default::default()
                },
            );
        }

        for node in doc.get_all(PEER_CONFIG_PATH) {
            let remote_address = get(node, "remote-address");
            if remote_address.is_empty() {
                continue;
            }
            let neighbor = BgpConfigNeighbor {
                description: UNKNOWN.to_string(),
                import_policy: UNKNOWN.to_string(),
                export_policy: UNKNOWN.to_string(),
                local_address: or_unknown(&get(node, "local-address")),
                local_as: int(node, "local-as-number"),
                remote_as: int(node, "remote-as"),
                authentication_key: UNKNOWN.to_string(),
                prefix_limit: IndexMap::new(),
                route_reflector_client: convert_bool(get(node, "reflector-client").as_str()),
                nhs: UNKNOWN_BOOL,
            };

            let group = get(node, "associate-peer-group");
            let group = if group.is_empty() { UNGROUPED.to_string() } else { group };
            groups
                .entry(group)
                .or_default()
                .neighbors
                .insert(remote_address, neighbor);
        }
    })?;
    Ok(groups)
}

impl<S: Session> Os10Driver<S> {
    /// Router id and the state of every peer, under the [`GLOBAL_VRF`] key.
    pub async fn get_bgp_neighbors(
        &mut self,
    ) -> Result<FactResult<IndexMap<String, BgpNeighbors>>> {
        let output = self.dispatch("show ip bgp neighbors | display-xml").await?;
        if output.contains(BGP_NOT_ACTIVE) {
            return Ok(FactResult::Disabled(BGP_NOT_ACTIVE.to_string()));
        }
        let neighbors = parse_bgp_neighbors(&output)?;
        if neighbors.peers.is_empty() {
            return Ok(FactResult::Empty);
        }
        Ok(FactResult::Records(IndexMap::from([(
            GLOBAL_VRF.to_string(),
            neighbors,
        )])))
    }

    /// Detailed peer records grouped by remote AS, optionally for one
    /// neighbor, under the [`DEFAULT_VRF`] key.
    pub async fn get_bgp_neighbors_detail(
        &mut self,
        neighbor_address: Option<&str>,
    ) -> Result<FactResult<IndexMap<String, IndexMap<i64, Vec<BgpPeerDetail>>>>> {
        let neighbor = neighbor_address.map(str::trim).filter(|n| !n.is_empty());
        let command = match neighbor {
            Some(address) => format!("show ip bgp neighbors {address} | display-xml"),
            None => "show ip bgp neighbors | display-xml".to_string(),
        };

        let output = self.dispatch(&command).await?;
        if output.contains(BGP_NOT_ACTIVE) {
            return Ok(FactResult::Disabled(BGP_NOT_ACTIVE.to_string()));
        }
        let peers = parse_bgp_neighbors_detail(&output, neighbor.is_some())?;
        if peers.is_empty() {
            return Ok(FactResult::Empty);
        }
        Ok(FactResult::Records(IndexMap::from([(
            DEFAULT_VRF.to_string(),
            peers,
        )])))
    }

    /// Configured peer groups and neighbors.
    pub async fn get_bgp_config(&mut self) -> Result<IndexMap<String, BgpGroup>> {
        let output = self
            .dispatch("show running-configuration bgp | display-xml")
            .await?;
        parse_bgp_config(&output)
    }
}
