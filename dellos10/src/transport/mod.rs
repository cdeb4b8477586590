//! SSH transport layer wrapping russh.
//!
//! Connection setup, authentication, host-key checking, and the two kinds of
//! channel the driver needs: an interactive PTY shell and SFTP uploads.

pub mod config;
mod ssh;

pub use config::{AuthMethod, HostKeyVerification, SshConfig};
pub use ssh::SshTransport;
