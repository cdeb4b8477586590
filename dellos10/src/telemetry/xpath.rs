//! Path lookups over parsed telemetry documents.
//!
//! Paths use the ElementTree subset the device schemas need: `/`-separated
//! element names relative to a context element, with `.` and empty segments
//! ignored. Namespaces are ignored when matching names.

use log::debug;
use roxmltree::{Document, Node};

use crate::error::{Error, Result};

/// One parsed device reply.
#[derive(Debug)]
pub struct TelemetryDocument<'a> {
    doc: Document<'a>,
}

impl<'a> TelemetryDocument<'a> {
    /// Parse a reply, repairing trailing content once if the first parse fails.
    ///
    /// The repair keeps everything up to the last closing tag of the root
    /// element and drops what follows (prompt echoes, partial pages).
    pub fn parse(raw: &'a str) -> Result<Self> {
        if raw.trim().is_empty() {
            return Err(Error::MalformedTelemetry {
                message: "Response from the device is empty".to_string(),
                output: raw.to_string(),
            });
        }

        let first_error = match Document::parse(raw) {
            Ok(doc) => return Ok(Self { doc }),
            Err(e) => e,
        };

        let Some(repaired) = repair(raw) else {
            return Err(Error::MalformedTelemetry {
                message: first_error.to_string(),
                output: raw.to_string(),
            });
        };

        debug!(
            "telemetry: first parse failed ({}), retrying with {} of {} bytes",
            first_error,
            repaired.len(),
            raw.len()
        );

        Document::parse(repaired)
            .map(|doc| Self { doc })
            .map_err(|e| Error::MalformedTelemetry {
                message: e.to_string(),
                output: raw.to_string(),
            })
    }

    /// The root element (normally `rpc-reply`).
    pub fn root(&self) -> Node<'_, 'a> {
        self.doc.root_element()
    }

    /// Text at `path` below the root, or an empty string.
    pub fn get(&self, path: &str) -> String {
        get(self.root(), path)
    }

    /// All elements at `path` below the root, in document order.
    pub fn get_all(&self, path: &str) -> Vec<Node<'_, 'a>> {
        get_all(self.root(), path)
    }
}

/// Text of the first element at `path` below `node`, or an empty string.
pub fn get(node: Node<'_, '_>, path: &str) -> String {
    get_all(node, path)
        .first()
        .and_then(|n| n.text())
        .map(|t| t.trim().to_string())
        .unwrap_or_default()
}

/// All elements at `path` below `node`, in document order.
pub fn get_all<'a, 'input>(node: Node<'a, 'input>, path: &str) -> Vec<Node<'a, 'input>> {
    let mut current = vec![node];
    for segment in path.split('/').filter(|s| !s.is_empty() && *s != ".") {
        current = current
            .into_iter()
            .flat_map(|n| n.children())
            .filter(|c| c.is_element() && c.tag_name().name() == segment)
            .collect();
        if current.is_empty() {
            break;
        }
    }
    current
}

/// Trim everything after the last closing tag of the root element.
fn repair(raw: &str) -> Option<&str> {
    let name = root_element_name(raw)?;
    let closing = format!("</{name}>");
    let end = raw.rfind(&closing)? + closing.len();
    let repaired = raw[..end].trim();
    (repaired.len() < raw.trim().len()).then_some(repaired)
}

/// Name of the first element start tag, skipping declarations and comments.
fn root_element_name(raw: &str) -> Option<&str> {
    let mut rest = raw;
    loop {
        let start = rest.find('<')?;
        rest = &rest[start + 1..];
        match rest.chars().next()? {
            '?' | '!' | '/' => continue,
            _ => {
                let end = rest
                    .find(|c: char| c.is_whitespace() || c == '>' || c == '/')
                    .unwrap_or(rest.len());
                return (end > 0).then(|| &rest[..end]);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const VERSION: &str = r#"<?xml version="1.0"?>
<rpc-reply xmlns="urn:ietf:params:xml:ns:netconf:base:1.0">
  <data>
    <system-sw-state xmlns="http://www.dellemc.com/networking/os10/dell-system-software">
      <sw-version>
        <sw-version>10.4.0E(R3)</sw-version>
        <sw-platform>S4148F-ON</sw-platform>
      </sw-version>
    </system-sw-state>
  </data>
</rpc-reply>"#;

    #[test]
    fn test_get_nested_path_ignores_namespaces() {
        let doc = TelemetryDocument::parse(VERSION).unwrap();
        assert_eq!(doc.get("./data/system-sw-state/sw-version/sw-version"), "10.4.0E(R3)");
        assert_eq!(doc.get("data/system-sw-state/sw-version/sw-platform"), "S4148F-ON");
    }

    #[test]
    fn test_missing_path_is_empty() {
        let doc = TelemetryDocument::parse(VERSION).unwrap();
        assert_eq!(doc.get("./data/system-state/system-status/hostname"), "");
        assert!(doc.get_all("./bulk/data/interface").is_empty());
    }

    #[test]
    fn test_get_all_repeating_elements() {
        let raw = "<rpc-reply><bulk><data>\
                   <interface><name>ethernet1/1/1</name></interface>\
                   <interface><name>ethernet1/1/2</name></interface>\
                   </data></bulk></rpc-reply>";
        let doc = TelemetryDocument::parse(raw).unwrap();
        let names: Vec<String> = doc
            .get_all("./bulk/data/interface")
            .into_iter()
            .map(|n| get(n, "name"))
            .collect();
        assert_eq!(names, vec!["ethernet1/1/1", "ethernet1/1/2"]);
    }

    #[test]
    fn test_repair_trailing_prompt() {
        let raw = "<rpc-reply><data><x>1</x></data></rpc-reply>\nOS10# ";
        let doc = TelemetryDocument::parse(raw).unwrap();
        assert_eq!(doc.get("data/x"), "1");
    }

    #[test]
    fn test_repair_trailing_partial_document() {
        let raw = "<rpc-reply><data><x>1</x></data></rpc-reply><rpc-reply><da";
        let doc = TelemetryDocument::parse(raw).unwrap();
        assert_eq!(doc.get("data/x"), "1");
    }

    #[test]
    fn test_unrepairable_is_malformed() {
        let err = TelemetryDocument::parse("<rpc-reply><data>").unwrap_err();
        assert!(matches!(err, Error::MalformedTelemetry { .. }));
        assert_eq!(err.output(), Some("<rpc-reply><data>"));
    }

    #[test]
    fn test_empty_is_malformed() {
        let err = TelemetryDocument::parse("  ").unwrap_err();
        assert!(matches!(err, Error::MalformedTelemetry { .. }));
    }

    #[test]
    fn test_root_element_name() {
        assert_eq!(root_element_name("<?xml version=\"1.0\"?>\n<rpc-reply x=\"1\">"), Some("rpc-reply"));
        assert_eq!(root_element_name("<!-- c --><a/>"), Some("a"));
        assert_eq!(root_element_name("no markup"), None);
    }
}
