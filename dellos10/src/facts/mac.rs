//! MAC address table from `show mac address-table`.

use serde::Serialize;

use super::for_each_document;
use crate::convert::{UNKNOWN_FLOAT, UNKNOWN_INT, convert_int, or_unknown};
use crate::driver::{Os10Driver, Session};
use crate::error::Result;
use crate::telemetry::get;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MacEntry {
    pub mac: String,
    pub interface: String,
    pub vlan: i64,
    #[serde(rename = "static")]
    pub is_static: bool,
    pub active: bool,
    pub moves: i64,
    pub last_move: f64,
}

/// VLAN id from the device's `vlanN` form.
fn vlan_id(value: &str) -> i64 {
    let value = value.trim();
    let digits = value
        .get(..4)
        .filter(|prefix| prefix.eq_ignore_ascii_case("vlan"))
        .map_or(value, |_| &value[4..]);
    convert_int(digits)
}

/// Table entries in device order.
pub fn parse_mac_address_table(raw: &str) -> Result<Vec<MacEntry>> {
    let mut entries = Vec::new();
    for_each_document(raw, |doc| {
        for node in doc.get_all("./bulk/data/fwd-table") {
            entries.push(MacEntry {
                mac: or_unknown(&get(node, "mac-addr")),
                interface: or_unknown(&get(node, "if-name")),
                vlan: vlan_id(&get(node, "vlan")),
                is_static: get(node, "entry-type").eq_ignore_ascii_case("static"),
                active: true,
                moves: UNKNOWN_INT,
                last_move: UNKNOWN_FLOAT,
            });
        }
    })?;
    Ok(entries)
}

impl<S: Session> Os10Driver<S> {
    /// All learned and static MAC entries.
    pub async fn get_mac_address_table(&mut self) -> Result<Vec<MacEntry>> {
        let output = self.dispatch("show mac address-table | display-xml").await?;
        parse_mac_address_table(&output)
    }
}
