//! Normalised operational facts.
//!
//! Every getter follows the same path: one `display-xml` show command
//! through the dispatcher, the reply split into documents, fields pulled out
//! by path, and each record filled in completely. Fields the device did not
//! report hold the sentinels from [`crate::convert`].
//!
//! The parsing halves are plain functions over the raw reply so they can be
//! tested without a session.

mod bgp;
mod device;
mod interfaces;
mod lldp;
mod mac;
mod ping;
mod routes;
mod snmp;

pub use bgp::{
    AddressFamily, BgpConfigNeighbor, BgpGroup, BgpNeighbors, BgpPeer, BgpPeerDetail,
    DEFAULT_VRF, GLOBAL_VRF, UNGROUPED, parse_bgp_config, parse_bgp_neighbors,
    parse_bgp_neighbors_detail,
};
pub use device::{
    Facts, FileTransferStatus, ImageInstallStatus, ImageStatus, parse_facts, parse_image_status,
};
pub use interfaces::{
    Interface, InterfaceCounters, InterfaceIp, PrefixLength, parse_interfaces,
    parse_interfaces_counters, parse_interfaces_ip,
};
pub use lldp::{LldpNeighbor, LldpNeighborDetail, parse_lldp_neighbors, parse_lldp_neighbors_detail};
pub use mac::{MacEntry, parse_mac_address_table};
pub use ping::{PingOptions, PingProbe, PingResult, PingSuccess, parse_ping};
pub use routes::{Route, parse_routes};
pub use snmp::{SnmpCommunity, SnmpInformation, parse_snmp_information};

use serde::ser::{Serialize, SerializeMap, Serializer};

use crate::error::Result;
use crate::telemetry::{TelemetryDocument, split};

/// Outcome of a getter for a feature the device can report as switched off.
#[derive(Debug, Clone, PartialEq)]
pub enum FactResult<T> {
    /// Records were found.
    Records(T),

    /// The device says the feature is not running; holds its message.
    Disabled(String),

    /// The feature runs but reported nothing.
    Empty,
}

impl<T> FactResult<T> {
    /// The records, if any.
    pub fn records(&self) -> Option<&T> {
        match self {
            Self::Records(records) => Some(records),
            _ => None,
        }
    }

    /// Consume into the records, if any.
    pub fn into_records(self) -> Option<T> {
        match self {
            Self::Records(records) => Some(records),
            _ => None,
        }
    }

    pub fn is_disabled(&self) -> bool {
        matches!(self, Self::Disabled(_))
    }

    pub fn is_empty(&self) -> bool {
        matches!(self, Self::Empty)
    }
}

impl<K, V> FactResult<indexmap::IndexMap<K, V>> {
    /// `Records` for a non-empty map, `Empty` otherwise.
    pub(crate) fn from_map(map: indexmap::IndexMap<K, V>) -> Self {
        if map.is_empty() {
            Self::Empty
        } else {
            Self::Records(map)
        }
    }
}

/// `Records` serialise as the records themselves, `Disabled` as
/// `{"response": reason}` and `Empty` as `{}`.
impl<T: Serialize> Serialize for FactResult<T> {
    fn serialize<Ser: Serializer>(&self, serializer: Ser) -> std::result::Result<Ser::Ok, Ser::Error> {
        match self {
            Self::Records(records) => records.serialize(serializer),
            Self::Disabled(reason) => {
                let mut map = serializer.serialize_map(Some(1))?;
                map.serialize_entry("response", reason)?;
                map.end()
            }
            Self::Empty => serializer.serialize_map(Some(0))?.end(),
        }
    }
}

/// Parse every document in a raw reply and hand each to `f`.
pub(crate) fn for_each_document(
    raw: &str,
    mut f: impl FnMut(&TelemetryDocument<'_>),
) -> Result<()> {
    for text in split(raw) {
        let doc = TelemetryDocument::parse(&text)?;
        f(&doc);
    }
    Ok(())
}

/// First non-empty value at `path` across all documents of a reply.
pub(crate) fn first_value(raw: &str, path: &str) -> Result<String> {
    let mut found = String::new();
    for_each_document(raw, |doc| {
        if found.is_empty() {
            found = doc.get(path);
        }
    })?;
    Ok(found)
}

#[cfg(test)]
mod tests {
    use super::*;
    use indexmap::IndexMap;

    #[test]
    fn test_fact_result_serialization() {
        let disabled: FactResult<IndexMap<String, u32>> = FactResult::Disabled("LLDP not active".into());
        assert_eq!(
            serde_json::to_value(&disabled).unwrap(),
            serde_json::json!({"response": "LLDP not active"})
        );

        let empty: FactResult<IndexMap<String, u32>> = FactResult::Empty;
        assert_eq!(serde_json::to_value(&empty).unwrap(), serde_json::json!({}));

        let mut map = IndexMap::new();
        map.insert("a".to_string(), 1u32);
        let records = FactResult::Records(map);
        assert_eq!(serde_json::to_value(&records).unwrap(), serde_json::json!({"a": 1}));
    }

    #[test]
    fn test_from_map() {
        let empty: IndexMap<String, u32> = IndexMap::new();
        assert!(FactResult::from_map(empty).is_empty());
    }

    #[test]
    fn test_first_value_across_documents() {
        let raw = "<?xml version=\"1.0\"?><rpc-reply><data/></rpc-reply>\
                   <?xml version=\"1.0\"?><rpc-reply><data><id>7</id></data></rpc-reply>";
        assert_eq!(first_value(raw, "./data/id").unwrap(), "7");
        assert_eq!(first_value(raw, "./data/missing").unwrap(), "");
    }
}
