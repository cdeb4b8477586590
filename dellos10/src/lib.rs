//! # dellos10
//!
//! Async driver for Dell EMC Networking OS10 switches over SSH.
//!
//! The driver sends `show ... | display-xml` commands, splits and parses the
//! XML replies, and returns typed fact records in which every field is
//! present (unreported values hold the sentinels from [`convert`]). It also
//! stages, commits, compares and discards candidate configurations, with a
//! rollback snapshot before every commit.
//!
//! ## Features
//!
//! - Async SSH connections via russh, candidate upload over SFTP
//! - Prompt tracking that survives hostname changes
//! - Splitting of back-to-back XML documents with trailing-garbage repair
//! - Facts: device, interfaces, counters, IPs, MAC table, routes, BGP, LLDP,
//!   SNMP, ping, image status
//! - Merge commits with automatic rollback when the device rejects the merge
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use dellos10::DriverBuilder;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), dellos10::Error> {
//!     let mut driver = DriverBuilder::new("192.168.1.1")
//!         .username("admin")
//!         .password("admin")
//!         .connect()
//!         .await?;
//!
//!     let facts = driver.get_facts().await?;
//!     println!("{} runs OS10 {}", facts.hostname, facts.os_version);
//!
//!     driver.load_merge_candidate(None, Some("ntp server 10.0.0.100")).await?;
//!     println!("{}", driver.compare_candidate().await?.commands());
//!     driver.commit().await?;
//!
//!     driver.close().await?;
//!     Ok(())
//! }
//! ```

pub mod channel;
pub mod config;
pub mod convert;
pub mod driver;
pub mod error;
pub mod facts;
pub mod platform;
pub mod telemetry;
pub mod transport;

// Re-export main types for convenience
pub use config::{CandidateSource, ConfigDiff, ConfigMode, LifecycleState};
pub use driver::{DriverBuilder, DriverOptions, Os10Driver, Session, SshSession, Transfer};
pub use error::{Error, Result};
pub use facts::FactResult;
pub use platform::PlatformDefinition;
pub use transport::{AuthMethod, SshConfig};
