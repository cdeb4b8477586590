//! XML telemetry handling.
//!
//! OS10 answers `show ... | display-xml` with one or more XML documents.
//! Paged outputs arrive as several documents glued together, each with its
//! own `<?xml version="1.0"?>` declaration, and the last one is sometimes cut
//! short or followed by prompt noise. This module splits such replies into
//! individual documents, repairs trailing garbage, and offers a small
//! path-based lookup over the parsed trees.

mod splitter;
mod xpath;

pub use splitter::{XmlDocuments, split};
pub use xpath::{TelemetryDocument, get, get_all};
