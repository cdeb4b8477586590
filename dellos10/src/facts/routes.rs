//! Routing table lookups from `show ip route`.

use std::net::IpAddr;

use indexmap::IndexMap;
use serde::Serialize;

use super::{FactResult, for_each_document};
use crate::convert::{UNKNOWN, UNKNOWN_INT, convert_bool, or_unknown};
use crate::driver::{Os10Driver, Session};
use crate::error::Result;
use crate::platform::dellos10::NO_ROUTES;
use crate::telemetry::get;

/// Routes appear under one of these depending on the command variant.
const ROUTE_PATHS: [&str; 2] = [
    "./bulk/data/route",
    "./data/routing/instance/ribs/rib/routes/route",
];

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Route {
    pub protocol: String,
    pub current_active: bool,
    pub last_active: bool,
    pub age: i64,
    pub next_hop: String,
    pub outgoing_interface: String,
    pub preference: i64,
    pub selected_next_hop: bool,
    pub inactive_reason: String,
    pub routing_table: String,
    pub protocol_attributes: IndexMap<String, String>,
}

/// Whether the prefix `network/len` covers `address`.
fn prefix_contains(prefix: &str, address: IpAddr) -> bool {
    let Some((network, len)) = prefix.split_once('/') else {
        return false;
    };
    let (Ok(network), Ok(len)) = (network.parse::<IpAddr>(), len.parse::<u32>()) else {
        return false;
    };
    match (network, address) {
        (IpAddr::V4(net), IpAddr::V4(addr)) if len <= 32 => {
            let mask = u32::MAX.checked_shl(32 - len).unwrap_or(0);
            u32::from(net) & mask == u32::from(addr) & mask
        }
        (IpAddr::V6(net), IpAddr::V6(addr)) if len <= 128 => {
            let mask = u128::MAX.checked_shl(128 - len).unwrap_or(0);
            u128::from(net) & mask == u128::from(addr) & mask
        }
        _ => false,
    }
}

/// Destination filter for one prefix.
///
/// A full address keeps every prefix covering it, a prefix with a length
/// keeps only itself, and a partial address (`10.1`) keeps prefixes it
/// starts on an octet or group boundary.
fn destination_matches(prefix: &str, destination: &str) -> bool {
    if destination.is_empty() || prefix == destination {
        return true;
    }
    if let Ok(address) = destination.parse::<IpAddr>() {
        return prefix_contains(prefix, address);
    }
    if destination.contains('/') {
        return false;
    }
    prefix
        .strip_prefix(destination)
        .is_some_and(|rest| rest.starts_with(['.', ':', '/']))
}

/// Routes grouped by destination prefix.
///
/// A full `destination` address keeps the prefixes covering it, a prefix
/// keeps only itself, and a partial address keeps prefixes it starts on an
/// octet boundary. `protocol` keeps routes whose source protocol contains
/// it. Empty filters match everything.
pub fn parse_routes(
    raw: &str,
    destination: &str,
    protocol: &str,
) -> Result<IndexMap<String, Vec<Route>>> {
    let mut routes: IndexMap<String, Vec<Route>> = IndexMap::new();
    for_each_document(raw, |doc| {
        for path in ROUTE_PATHS {
            for node in doc.get_all(path) {
                let source_protocol = get(node, "source-protocol");
                if !protocol.is_empty() && !source_protocol.contains(protocol) {
                    continue;
                }
                let prefix = get(node, "destination-prefix");
                if prefix.is_empty() || !destination_matches(&prefix, destination) {
                    continue;
                }

                routes.entry(prefix).or_default().push(Route {
                    protocol: or_unknown(&source_protocol),
                    current_active: convert_bool(get(node, "is-active").as_str()),
                    last_active: false,
                    age: UNKNOWN_INT,
                    next_hop: or_unknown(&get(node, "next-hop/address")),
                    outgoing_interface: or_unknown(&get(node, "next-hop/nhop-intf")),
                    preference: UNKNOWN_INT,
                    selected_next_hop: true,
                    inactive_reason: UNKNOWN.to_string(),
                    routing_table: UNKNOWN.to_string(),
                    protocol_attributes: IndexMap::new(),
                });
            }
        }
    })?;
    Ok(routes)
}

impl<S: Session> Os10Driver<S> {
    /// Routes towards `destination` learned by `protocol`.
    ///
    /// Both filters are applied to the full table after extraction; pass
    /// empty strings to get everything. No matching route gives
    /// [`FactResult::Empty`].
    pub async fn get_route_to(
        &mut self,
        destination: &str,
        protocol: &str,
    ) -> Result<FactResult<IndexMap<String, Vec<Route>>>> {
        let output = self.dispatch("show ip route | display-xml").await?;
        if output.trim().is_empty() || output.contains(NO_ROUTES) {
            return Ok(FactResult::Empty);
        }
        parse_routes(&output, destination.trim(), protocol.trim()).map(FactResult::from_map)
    }
}
