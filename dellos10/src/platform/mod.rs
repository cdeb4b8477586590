//! Platform definition for Dell EMC Networking OS10.
//!
//! This module holds the prompt shape, failure markers, session setup
//! commands, and the fixed device messages the driver reacts to.

mod definition;
pub mod dellos10;

pub use definition::PlatformDefinition;
