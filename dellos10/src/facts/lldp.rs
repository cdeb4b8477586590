//! LLDP neighbors from `show lldp neighbors`.

use indexmap::IndexMap;
use roxmltree::Node;
use serde::Serialize;

use super::{FactResult, for_each_document};
use crate::convert::{UNKNOWN, or_unknown};
use crate::driver::{Os10Driver, Session};
use crate::error::Result;
use crate::platform::dellos10::{LLDP_NOT_ACTIVE, NO_LLDP_NEIGHBORS};
use crate::telemetry::{get, get_all};

const BULK_INTERFACE_PATH: &str = "./bulk/data/interface";
const SINGLE_INTERFACE_PATH: &str = "./data/interfaces-state/interface";
const REMOTE_INFO_PATH: &str = "lldp-rem-neighbor-info/info";

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LldpNeighbor {
    pub hostname: String,
    pub port: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LldpNeighborDetail {
    pub parent_interface: String,
    pub remote_port: String,
    pub remote_port_description: String,
    pub remote_chassis_id: String,
    pub remote_system_name: String,
    pub remote_system_description: String,
    pub remote_system_capab: String,
    pub remote_system_enable_capab: String,
}

/// Remote entries of every local interface, skipping entries without a
/// remote port and interfaces without entries.
fn each_neighbor<T>(
    raw: &str,
    interface_path: &str,
    build: impl Fn(Node<'_, '_>, String) -> T,
) -> Result<IndexMap<String, Vec<T>>> {
    let mut neighbors = IndexMap::new();
    for_each_document(raw, |doc| {
        for local in doc.get_all(interface_path) {
            let entries: Vec<T> = get_all(local, REMOTE_INFO_PATH)
                .into_iter()
                .filter_map(|info| {
                    let port = get(info, "rem-port-desc");
                    (!port.is_empty()).then(|| build(info, port))
                })
                .collect();
            if !entries.is_empty() {
                neighbors.insert(get(local, "name"), entries);
            }
        }
    })?;
    Ok(neighbors)
}

/// Neighbors keyed by local interface.
pub fn parse_lldp_neighbors(raw: &str) -> Result<IndexMap<String, Vec<LldpNeighbor>>> {
    each_neighbor(raw, BULK_INTERFACE_PATH, |info, port| LldpNeighbor {
        hostname: or_unknown(&get(info, "rem-system-name")),
        port,
    })
}

/// Detailed neighbors keyed by local interface. `single` selects the layout
/// of a reply for one interface.
pub fn parse_lldp_neighbors_detail(
    raw: &str,
    single: bool,
) -> Result<IndexMap<String, Vec<LldpNeighborDetail>>> {
    let path = if single { SINGLE_INTERFACE_PATH } else { BULK_INTERFACE_PATH };
    each_neighbor(raw, path, |info, port| LldpNeighborDetail {
        parent_interface: UNKNOWN.to_string(),
        remote_port_description: port.clone(),
        remote_port: port,
        remote_chassis_id: or_unknown(&get(info, "rem-lldp-chassis-id")),
        remote_system_name: or_unknown(&get(info, "rem-system-name")),
        remote_system_description: or_unknown(&get(info, "rem-system-desc")),
        remote_system_capab: or_unknown(&get(info, "rem-sys-cap-supported")),
        remote_system_enable_capab: or_unknown(&get(info, "rem-sys-cap-enabled")),
    })
}

/// `Disabled` or `Empty` for the replies that carry no neighbor data.
fn special_reply<T>(output: &str) -> Option<FactResult<T>> {
    if output.contains(LLDP_NOT_ACTIVE) {
        Some(FactResult::Disabled(LLDP_NOT_ACTIVE.to_string()))
    } else if output.trim().is_empty() || output.contains(NO_LLDP_NEIGHBORS) {
        Some(FactResult::Empty)
    } else {
        None
    }
}

impl<S: Session> Os10Driver<S> {
    /// Remote host and port seen on each local interface.
    pub async fn get_lldp_neighbors(
        &mut self,
    ) -> Result<FactResult<IndexMap<String, Vec<LldpNeighbor>>>> {
        let output = self.dispatch("show lldp neighbors | display-xml").await?;
        if let Some(result) = special_reply(&output) {
            return Ok(result);
        }
        parse_lldp_neighbors(&output).map(FactResult::from_map)
    }

    /// Full remote details, for every interface or just `interface`.
    pub async fn get_lldp_neighbors_detail(
        &mut self,
        interface: Option<&str>,
    ) -> Result<FactResult<IndexMap<String, Vec<LldpNeighborDetail>>>> {
        let interface = interface.map(str::trim).filter(|i| !i.is_empty());
        let command = match interface {
            Some(name) => format!("show lldp neighbors interface {name} | display-xml"),
            None => "show lldp neighbors | display-xml".to_string(),
        };

        let output = self.dispatch(&command).await?;
        if let Some(result) = special_reply(&output) {
            return Ok(result);
        }
        parse_lldp_neighbors_detail(&output, interface.is_some()).map(FactResult::from_map)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::driver::DriverOptions;
    use crate::driver::mock::MockSession;

    const LLDP: &str = r#"<?xml version="1.0"?>
<rpc-reply><bulk><data>
  <interface>
    <name>ethernet1/1/49</name>
    <lldp-rem-neighbor-info>
      <info>
        <rem-port-desc>ethernet1/1/1</rem-port-desc>
        <rem-system-name>spine1</rem-system-name>
        <rem-lldp-chassis-id>90:b1:1c:f4:a5:23</rem-lldp-chassis-id>
        <rem-system-desc>Dell EMC Networking OS10 Enterprise</rem-system-desc>
        <rem-sys-cap-supported>router bridge</rem-sys-cap-supported>
        <rem-sys-cap-enabled>router</rem-sys-cap-enabled>
      </info>
    </lldp-rem-neighbor-info>
  </interface>
  <interface>
    <name>ethernet1/1/50</name>
    <lldp-rem-neighbor-info>
      <info><rem-system-name>no-port</rem-system-name></info>
    </lldp-rem-neighbor-info>
  </interface>
  <interface><name>ethernet1/1/51</name></interface>
</data></bulk></rpc-reply>"#;

    #[test]
    fn test_parse_lldp_neighbors() {
        let neighbors = parse_lldp_neighbors(LLDP).unwrap();
        assert_eq!(neighbors.len(), 1);
        assert_eq!(
            neighbors["ethernet1/1/49"],
            vec![LldpNeighbor {
                hostname: "spine1".to_string(),
                port: "ethernet1/1/1".to_string()
            }]
        );
    }

    #[test]
    fn test_parse_lldp_neighbors_detail() {
        let detail = parse_lldp_neighbors_detail(LLDP, false).unwrap();
        let entry = &detail["ethernet1/1/49"][0];
        assert_eq!(entry.parent_interface, "N/A");
        assert_eq!(entry.remote_port, "ethernet1/1/1");
        assert_eq!(entry.remote_port_description, "ethernet1/1/1");
        assert_eq!(entry.remote_chassis_id, "90:b1:1c:f4:a5:23");
        assert_eq!(entry.remote_system_capab, "router bridge");
        assert_eq!(entry.remote_system_enable_capab, "router");
    }

    #[tokio::test]
    async fn test_lldp_not_active() {
        let session = MockSession::new().reply("show lldp neighbors | display-xml", "LLDP not active");
        let mut driver = Os10Driver::new(session, DriverOptions::default());
        let result = driver.get_lldp_neighbors().await.unwrap();
        assert!(result.is_disabled());
        assert_eq!(
            serde_json::to_value(&result).unwrap(),
            serde_json::json!({"response": "LLDP not active"})
        );
    }

    #[tokio::test]
    async fn test_lldp_no_neighbors_is_empty() {
        let session = MockSession::new();
        let mut driver = Os10Driver::new(session, DriverOptions::default());
        assert!(driver.get_lldp_neighbors().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_lldp_detail_for_interface() {
        let raw = r#"<?xml version="1.0"?>
<rpc-reply><data><interfaces-state><interface>
  <name>ethernet1/1/49</name>
  <lldp-rem-neighbor-info><info>
    <rem-port-desc>ethernet1/1/1</rem-port-desc>
    <rem-system-name>spine1</rem-system-name>
  </info></lldp-rem-neighbor-info>
</interface></interfaces-state></data></rpc-reply>"#;
        let command = "show lldp neighbors interface ethernet1/1/49 | display-xml";
        let session = MockSession::new().reply(command, raw);
        let mut driver = Os10Driver::new(session, DriverOptions::default());
        let result = driver
            .get_lldp_neighbors_detail(Some("ethernet1/1/49"))
            .await
            .unwrap();
        let records = result.records().unwrap();
        assert_eq!(records["ethernet1/1/49"][0].remote_system_name, "spine1");
        assert_eq!(records["ethernet1/1/49"][0].remote_system_description, "N/A");
    }
}
