//! Driver options.

use std::path::PathBuf;
use std::time::Duration;

use secrecy::SecretString;
use serde::Deserialize;

const DEFAULT_SSH_PORT: u16 = 22;

/// Optional driver settings. Every field has a default, so an empty map
/// deserialises to [`DriverOptions::default`].
///
/// ```rust
/// use dellos10::driver::DriverOptions;
///
/// let options = DriverOptions::default();
/// assert_eq!(options.file_system, "/home/admin/");
/// assert_eq!(options.port(), 22);
/// ```
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct DriverOptions {
    /// Remote directory that holds the candidate, merge and rollback files.
    pub file_system: String,

    /// Remote file name for replace candidates.
    pub candidate_cfg: String,

    /// Remote file name for merge candidates.
    pub merge_cfg: String,

    /// Remote file name for the rollback snapshot.
    pub rollback_cfg: String,

    /// Connection transport. Only `ssh` is supported.
    pub transport: String,

    /// Port; defaults per transport.
    pub port: Option<u16>,

    /// Connect timeout in seconds.
    pub timeout: u64,

    /// Per-command timeout in seconds.
    pub session_timeout: u64,

    /// SSH keepalive interval in seconds; 0 disables it.
    pub keepalive: u64,

    /// Private key for key authentication.
    pub key_file: Option<PathBuf>,

    /// Authenticate with `key_file` instead of the password.
    pub use_keys: bool,

    /// Reject hosts missing from known_hosts.
    pub ssh_strict: bool,

    /// Secret for `enable` when the login lands in user exec.
    pub secret: Option<SecretString>,
}

impl Default for DriverOptions {
    fn default() -> Self {
        Self {
            file_system: "/home/admin/".to_string(),
            candidate_cfg: "candidate_config.txt".to_string(),
            merge_cfg: "merge_config.txt".to_string(),
            rollback_cfg: "rollback_config.txt".to_string(),
            transport: "ssh".to_string(),
            port: None,
            timeout: 120,
            session_timeout: 90,
            keepalive: 30,
            key_file: None,
            use_keys: false,
            ssh_strict: false,
            secret: None,
        }
    }
}

impl DriverOptions {
    /// Port to connect to: the configured one or the transport default.
    pub fn port(&self) -> u16 {
        self.port.unwrap_or(DEFAULT_SSH_PORT)
    }

    /// Connect timeout.
    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.timeout)
    }

    /// Per-command timeout.
    pub fn command_timeout(&self) -> Duration {
        Duration::from_secs(self.session_timeout)
    }

    /// Keepalive interval, `None` when disabled.
    pub fn keepalive_interval(&self) -> Option<Duration> {
        (self.keepalive > 0).then(|| Duration::from_secs(self.keepalive))
    }

    /// Absolute remote path of `file_name` under [`Self::file_system`].
    pub fn remote_path(&self, file_name: &str) -> String {
        if self.file_system.ends_with('/') {
            format!("{}{}", self.file_system, file_name)
        } else {
            format!("{}/{}", self.file_system, file_name)
        }
    }
}
