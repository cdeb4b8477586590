//! SNMP settings from `show running-configuration snmp`.
//!
//! This one is parsed from plain configuration text; the XML form of the
//! command carries nothing the text does not.

use indexmap::IndexMap;
use serde::Serialize;

use crate::convert::{UNKNOWN, or_unknown};
use crate::driver::{Os10Driver, Session};
use crate::error::Result;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SnmpInformation {
    pub chassis_id: String,
    pub community: IndexMap<String, SnmpCommunity>,
    pub contact: String,
    pub location: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SnmpCommunity {
    pub acl: String,
    pub mode: String,
}

/// Parse `snmp-server` lines. Unknown lines are ignored.
pub fn parse_snmp_information(text: &str) -> SnmpInformation {
    let mut info = SnmpInformation {
        chassis_id: UNKNOWN.to_string(),
        community: IndexMap::new(),
        contact: UNKNOWN.to_string(),
        location: UNKNOWN.to_string(),
    };

    for line in text.lines() {
        let fields: Vec<&str> = line.split_whitespace().collect();
        if fields.len() < 3 || fields[0] != "snmp-server" {
            continue;
        }
        let rest = fields[2..].join(" ");
        match fields[1] {
            "community" => {
                let mode = fields.get(3).map(|m| m.to_ascii_lowercase()).unwrap_or_default();
                let acl = fields.get(4).copied().unwrap_or_default();
                info.community.insert(
                    fields[2].to_string(),
                    SnmpCommunity {
                        acl: or_unknown(acl),
                        mode: or_unknown(&mode),
                    },
                );
            }
            "location" => info.location = rest,
            "contact" => info.contact = rest,
            "chassis-id" => info.chassis_id = rest,
            _ => {}
        }
    }
    info
}

impl<S: Session> Os10Driver<S> {
    /// Communities, contact, location and chassis id.
    pub async fn get_snmp_information(&mut self) -> Result<SnmpInformation> {
        let output = self.dispatch("show running-configuration snmp").await?;
        Ok(parse_snmp_information(&output))
    }
}
