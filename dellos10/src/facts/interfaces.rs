//! Interface state, counters and addresses from `show interface`.

use indexmap::IndexMap;
use roxmltree::Node;
use serde::Serialize;

use super::for_each_document;
use crate::convert::{UNKNOWN_BOOL, convert_float, convert_int, or_unknown};
use crate::driver::{Os10Driver, Session};
use crate::error::Result;
use crate::telemetry::{get, get_all};

const SHOW_INTERFACE: &str = "show interface | display-xml";
const INTERFACE_PATH: &str = "./bulk/data/interface";

/// One interface, keyed by name in the getter's map.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Interface {
    pub is_up: bool,
    pub is_enabled: bool,
    pub description: String,
    pub last_flapped: f64,
    pub speed: i64,
    pub mac_address: String,
    pub counters: InterfaceCounters,
}

/// Traffic and error counters of one interface.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct InterfaceCounters {
    pub tx_errors: i64,
    pub rx_errors: i64,
    pub tx_discards: i64,
    pub rx_discards: i64,
    pub tx_octets: i64,
    pub rx_octets: i64,
    pub tx_unicast_packets: i64,
    pub rx_unicast_packets: i64,
    pub tx_multicast_packets: i64,
    pub rx_multicast_packets: i64,
    pub tx_broadcast_packets: i64,
    pub rx_broadcast_packets: i64,
}

/// Addresses configured on one interface, address → prefix length.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct InterfaceIp {
    pub ipv4: IndexMap<String, PrefixLength>,
    pub ipv6: IndexMap<String, PrefixLength>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PrefixLength {
    pub prefix_length: i64,
}

/// `up` → true, anything else → false, absent → [`UNKNOWN_BOOL`].
fn status_is_up(status: &str) -> bool {
    if status.is_empty() {
        UNKNOWN_BOOL
    } else {
        status.eq_ignore_ascii_case("up")
    }
}

fn counters(interface: Node<'_, '_>) -> InterfaceCounters {
    let stat = |name: &str| convert_int(get(interface, &format!("statistics/{name}")).as_str());
    InterfaceCounters {
        tx_errors: stat("out-errors"),
        rx_errors: stat("in-errors"),
        tx_discards: stat("out-discards"),
        rx_discards: stat("in-discards"),
        tx_octets: stat("out-octets"),
        rx_octets: stat("in-octets"),
        tx_unicast_packets: stat("out-unicast-pkts"),
        rx_unicast_packets: stat("in-unicast-pkts"),
        tx_multicast_packets: stat("out-multicast-pkts"),
        rx_multicast_packets: stat("in-multicast-pkts"),
        tx_broadcast_packets: stat("out-broadcast-pkts"),
        rx_broadcast_packets: stat("in-broadcast-pkts"),
    }
}

fn interface(node: Node<'_, '_>) -> Interface {
    Interface {
        is_up: status_is_up(&get(node, "oper-status")),
        is_enabled: status_is_up(&get(node, "admin-status")),
        description: or_unknown(&get(node, "description")),
        last_flapped: convert_float(get(node, "last-change-time").as_str()),
        speed: convert_int(get(node, "speed").as_str()),
        mac_address: or_unknown(&get(node, "phys-address")),
        counters: counters(node),
    }
}

/// Walk every interface element of every document, skipping unnamed ones.
fn each_interface(raw: &str, mut f: impl FnMut(String, Node<'_, '_>)) -> Result<()> {
    for_each_document(raw, |doc| {
        for node in doc.get_all(INTERFACE_PATH) {
            let name = get(node, "name");
            if !name.is_empty() {
                f(name, node);
            }
        }
    })
}

/// Interfaces keyed by name, in device order.
pub fn parse_interfaces(raw: &str) -> Result<IndexMap<String, Interface>> {
    let mut interfaces = IndexMap::new();
    each_interface(raw, |name, node| {
        interfaces.insert(name, interface(node));
    })?;
    Ok(interfaces)
}

/// Counters keyed by interface name.
pub fn parse_interfaces_counters(raw: &str) -> Result<IndexMap<String, InterfaceCounters>> {
    let mut all = IndexMap::new();
    each_interface(raw, |name, node| {
        all.insert(name, counters(node));
    })?;
    Ok(all)
}

/// Split `address/len` into its parts; a bare address gets the sentinel length.
fn split_prefix(value: &str) -> (String, PrefixLength) {
    let (address, len) = value.split_once('/').unwrap_or((value, ""));
    (
        address.trim().to_string(),
        PrefixLength {
            prefix_length: convert_int(len),
        },
    )
}

/// Addresses keyed by interface name. Interfaces without any address are left out.
pub fn parse_interfaces_ip(raw: &str) -> Result<IndexMap<String, InterfaceIp>> {
    let mut all = IndexMap::new();
    each_interface(raw, |name, node| {
        let mut ip = InterfaceIp::default();
        for (path, family) in [("ipv4-info/addr", &mut ip.ipv4), ("ipv6/global-addr", &mut ip.ipv6)] {
            for addr in get_all(node, path) {
                let text = addr.text().unwrap_or_default().trim();
                if !text.is_empty() {
                    let (address, prefix) = split_prefix(text);
                    family.insert(address, prefix);
                }
            }
        }
        if !ip.ipv4.is_empty() || !ip.ipv6.is_empty() {
            all.insert(name, ip);
        }
    })?;
    Ok(all)
}

impl<S: Session> Os10Driver<S> {
    /// State and counters of every interface.
    pub async fn get_interfaces(&mut self) -> Result<IndexMap<String, Interface>> {
        let output = self.dispatch(SHOW_INTERFACE).await?;
        parse_interfaces(&output)
    }

    /// Counters of every interface.
    pub async fn get_interfaces_counters(&mut self) -> Result<IndexMap<String, InterfaceCounters>> {
        let output = self.dispatch(SHOW_INTERFACE).await?;
        parse_interfaces_counters(&output)
    }

    /// IPv4 and IPv6 addresses of every interface that has one.
    pub async fn get_interfaces_ip(&mut self) -> Result<IndexMap<String, InterfaceIp>> {
        let output = self.dispatch(SHOW_INTERFACE).await?;
        parse_interfaces_ip(&output)
    }
}
