//! Builder for connected OS10 drivers.

use std::path::PathBuf;

use secrecy::SecretString;

use super::options::DriverOptions;
use super::os10::Os10Driver;
use super::ssh_session::SshSession;
use crate::error::{Error, Result, TransportError};
use crate::platform::{PlatformDefinition, dellos10};
use crate::transport::config::{AuthMethod, HostKeyVerification, SshConfig};

/// Builder for constructing an [`Os10Driver`] over SSH.
///
/// # Example
///
/// ```rust,no_run
/// use dellos10::driver::DriverBuilder;
///
/// # async fn example() -> Result<(), dellos10::Error> {
/// let mut driver = DriverBuilder::new("192.168.1.1")
///     .username("admin")
///     .password("admin")
///     .connect()
///     .await?;
/// let facts = driver.get_facts().await?;
/// println!("{} runs {}", facts.hostname, facts.os_version);
/// # Ok(())
/// # }
/// ```
pub struct DriverBuilder {
    host: String,
    username: Option<String>,
    password: Option<SecretString>,
    passphrase: Option<SecretString>,
    options: DriverOptions,
    platform: Option<PlatformDefinition>,
    known_hosts_path: Option<PathBuf>,
    terminal_width: Option<u32>,
    terminal_height: Option<u32>,
}

impl DriverBuilder {
    /// Start a builder for `host`.
    pub fn new(host: impl Into<String>) -> Self {
        Self {
            host: host.into(),
            username: None,
            password: None,
            passphrase: None,
            options: DriverOptions::default(),
            platform: None,
            known_hosts_path: None,
            terminal_width: None,
            terminal_height: None,
        }
    }

    /// Set the username for authentication.
    pub fn username(mut self, username: impl Into<String>) -> Self {
        self.username = Some(username.into());
        self
    }

    /// Set the password.
    pub fn password(mut self, password: impl Into<String>) -> Self {
        self.password = Some(SecretString::from(password.into()));
        self
    }

    /// Passphrase for an encrypted `key_file`.
    pub fn key_passphrase(mut self, passphrase: impl Into<String>) -> Self {
        self.passphrase = Some(SecretString::from(passphrase.into()));
        self
    }

    /// Replace all optional settings.
    pub fn options(mut self, options: DriverOptions) -> Self {
        self.options = options;
        self
    }

    /// Use a custom platform definition instead of the OS10 default.
    pub fn custom_platform(mut self, platform: PlatformDefinition) -> Self {
        self.platform = Some(platform);
        self
    }

    /// Use a specific known_hosts file.
    pub fn known_hosts_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.known_hosts_path = Some(path.into());
        self
    }

    /// Set terminal dimensions.
    pub fn terminal_size(mut self, width: u32, height: u32) -> Self {
        self.terminal_width = Some(width);
        self.terminal_height = Some(height);
        self
    }

    /// Build the SSH configuration without connecting.
    pub fn ssh_config(&self) -> Result<SshConfig> {
        if self.options.transport != "ssh" {
            return Err(TransportError::Unsupported(self.options.transport.clone()).into());
        }

        let username = self
            .username
            .clone()
            .ok_or_else(|| Error::invalid_argument("Username is required"))?;

        let auth = match (&self.options.key_file, self.options.use_keys, &self.password) {
            (Some(path), true, _) => AuthMethod::PrivateKey {
                path: path.clone(),
                passphrase: self.passphrase.clone(),
            },
            (None, true, _) => {
                return Err(Error::invalid_argument("use_keys is set but key_file is missing"));
            }
            (_, false, Some(password)) => AuthMethod::Password(password.clone()),
            (_, false, None) => {
                return Err(Error::invalid_argument("Password is required unless use_keys is set"));
            }
        };

        let host_key_verification = if self.options.ssh_strict {
            HostKeyVerification::Strict
        } else {
            HostKeyVerification::AcceptNew
        };

        let platform = self.platform.clone().unwrap_or_else(dellos10::platform);

        Ok(SshConfig {
            host: self.host.clone(),
            port: self.options.port(),
            username,
            auth,
            timeout: self.options.connect_timeout(),
            command_timeout: self.options.command_timeout(),
            inactivity_timeout: None,
            keepalive_interval: self.options.keepalive_interval(),
            terminal_width: self.terminal_width.unwrap_or(platform.terminal_width),
            terminal_height: self.terminal_height.unwrap_or(platform.terminal_height),
            host_key_verification,
            known_hosts_path: self.known_hosts_path.clone(),
        })
    }

    /// Connect and return a ready driver.
    pub async fn connect(self) -> Result<Os10Driver<SshSession>> {
        let ssh_config = self.ssh_config()?;
        let platform = self.platform.unwrap_or_else(dellos10::platform);
        let session = SshSession::open(ssh_config, platform, self.options.secret.clone()).await?;
        Ok(Os10Driver::new(session, self.options))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ssh_config_from_options() {
        let config = DriverBuilder::new("10.0.0.1")
            .username("admin")
            .password("admin")
            .ssh_config()
            .unwrap();
        assert_eq!(config.socket_addr(), "10.0.0.1:22");
        assert!(matches!(config.auth, AuthMethod::Password(_)));
        assert!(matches!(config.host_key_verification, HostKeyVerification::AcceptNew));
        assert_eq!(config.terminal_width, 511);
    }

    #[test]
    fn test_key_auth_and_strict() {
        let options = DriverOptions {
            use_keys: true,
            key_file: Some(PathBuf::from("/tmp/id_ed25519")),
            ssh_strict: true,
            ..Default::default()
        };
        let config = DriverBuilder::new("leaf1")
            .username("admin")
            .options(options)
            .ssh_config()
            .unwrap();
        assert!(matches!(config.auth, AuthMethod::PrivateKey { .. }));
        assert!(matches!(config.host_key_verification, HostKeyVerification::Strict));
    }

    #[test]
    fn test_missing_username() {
        let err = DriverBuilder::new("leaf1").password("x").ssh_config().unwrap_err();
        assert!(matches!(err, Error::InvalidArgument { .. }));
    }

    #[test]
    fn test_unsupported_transport() {
        let options = DriverOptions {
            transport: "telnet".to_string(),
            ..Default::default()
        };
        let err = DriverBuilder::new("leaf1")
            .username("admin")
            .password("x")
            .options(options)
            .ssh_config()
            .unwrap_err();
        assert!(matches!(err, Error::Transport(TransportError::Unsupported(_))));
    }
}
