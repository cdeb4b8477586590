//! [`Session`] and [`Transfer`] over one SSH connection.

use std::path::Path;
use std::time::Duration;

use log::{debug, info, warn};
use regex::bytes::Regex;
use secrecy::{ExposeSecret, SecretString};

use super::{Session, Transfer};
use crate::channel::{
    PtyChannel, base_prompt_pattern, compile_prompt_pattern, extract_base_prompt,
    normalize_output, strip_command_echo,
};
use crate::error::{ChannelError, Error, Result};
use crate::platform::PlatformDefinition;
use crate::transport::{SshConfig, SshTransport};

/// How far back from the end of the buffer prompts are searched for.
const SEARCH_DEPTH: usize = 1000;

/// Silence that ends a timing read.
const QUIET_PERIOD: Duration = Duration::from_millis(1500);

/// Interactive shell session on a device, plus SFTP uploads on the same
/// connection.
pub struct SshSession {
    transport: SshTransport,
    channel: PtyChannel,
    platform: PlatformDefinition,

    /// Hostname part of the prompt, e.g. `OS10` for `OS10(config)#`.
    base_prompt: String,

    /// Prompt regex built from `base_prompt`.
    prompt_pattern: Regex,

    timeout: Duration,
}

impl SshSession {
    /// Connect, wait for the first prompt, enter privileged mode if needed,
    /// and run the platform's on-open commands.
    pub async fn open(
        config: SshConfig,
        platform: PlatformDefinition,
        secret: Option<SecretString>,
    ) -> Result<Self> {
        let timeout = config.command_timeout;
        let addr = config.socket_addr();

        let transport = SshTransport::connect(config).await?;
        let shell = transport.open_shell().await?;

        let mut session = Self {
            transport,
            channel: PtyChannel::new(shell, SEARCH_DEPTH),
            prompt_pattern: platform.prompt_pattern.clone(),
            base_prompt: String::new(),
            platform,
            timeout,
        };

        let banner = session
            .channel
            .read_until_pattern(&session.platform.prompt_pattern, timeout)
            .await?;
        let banner = String::from_utf8_lossy(&banner).into_owned();
        session.learn_prompt(&banner)?;

        if banner.trim_end().ends_with('>') {
            session.enable(secret.as_ref()).await?;
        }

        for command in session.platform.on_open_commands.clone() {
            session.send_command(&command).await?;
        }

        info!(
            "{}: session open on {} (prompt {})",
            session.platform.name, addr, session.base_prompt
        );
        Ok(session)
    }

    /// The base prompt learned last.
    pub fn base_prompt(&self) -> &str {
        &self.base_prompt
    }

    fn learn_prompt(&mut self, output: &str) -> Result<String> {
        let base = extract_base_prompt(output, &self.platform.prompt_terminators)
            .ok_or_else(|| Error::connection_closed(format!("no prompt in {:?}", output)))?;

        if base != self.base_prompt {
            debug!("{}: base prompt is now {:?}", self.platform.name, base);
            self.prompt_pattern = base_prompt_pattern(&base, &self.platform.prompt_terminators)
                .map_err(ChannelError::from)?;
            self.base_prompt = base.clone();
        }
        Ok(base)
    }

    async fn enable(&mut self, secret: Option<&SecretString>) -> Result<()> {
        let output = self.send_command_timing("enable").await?;
        if output.to_ascii_lowercase().contains("password") {
            let secret = secret.map(|s| s.expose_secret()).unwrap_or_default();
            self.channel.send(secret).await?;
        }
        self.set_base_prompt().await?;
        Ok(())
    }

    async fn read_until_prompt(&mut self, pattern: &Regex) -> Result<String> {
        let data = self.channel.read_until_pattern(pattern, self.timeout).await?;
        Ok(String::from_utf8_lossy(&data).into_owned())
    }
}

impl Session for SshSession {
    async fn send_command(&mut self, command: &str) -> Result<String> {
        debug!("{}: send_command {:?}", self.platform.name, command);
        self.channel.clear_buffer();
        self.channel.send(command).await?;

        let pattern = self.prompt_pattern.clone();
        let raw = self.read_until_prompt(&pattern).await?;
        let output = normalize_output(&raw, command);
        if let Some(marker) = self.platform.detect_failure(&output) {
            debug!("{}: {:?} answered with {:?}", self.platform.name, command, marker);
        }
        Ok(output)
    }

    async fn send_command_expect(&mut self, command: &str, pattern: &str) -> Result<String> {
        debug!(
            "{}: send_command_expect {:?} until {:?}",
            self.platform.name, command, pattern
        );
        let expect = compile_prompt_pattern(pattern).map_err(ChannelError::from)?;

        self.channel.clear_buffer();
        self.channel.send(command).await?;

        let raw = self.read_until_prompt(&expect).await?;
        Ok(strip_command_echo(&raw, command).trim_end().to_string())
    }

    async fn send_command_timing(&mut self, command: &str) -> Result<String> {
        debug!("{}: send_command_timing {:?}", self.platform.name, command);
        self.channel.clear_buffer();
        self.channel.send(command).await?;

        let data = self.channel.read_until_quiet(QUIET_PERIOD, self.timeout).await?;
        let raw = String::from_utf8_lossy(&data);
        Ok(strip_command_echo(&raw, command).trim_end().to_string())
    }

    async fn set_base_prompt(&mut self) -> Result<String> {
        self.channel.clear_buffer();
        self.channel.send("").await?;

        let pattern = self.platform.prompt_pattern.clone();
        let output = self.read_until_prompt(&pattern).await?;
        self.learn_prompt(&output)
    }

    async fn is_alive(&mut self) -> bool {
        if self.transport.is_closed() {
            return false;
        }
        match self.channel.write_raw(&[0]).await {
            Ok(()) => !self.transport.is_closed(),
            Err(e) => {
                debug!("{}: liveness probe failed: {}", self.platform.name, e);
                false
            }
        }
    }

    async fn close(&mut self) -> Result<()> {
        for command in self.platform.on_close_commands.clone() {
            if let Err(e) = self.channel.send(&command).await {
                warn!("{}: on-close command {:?} failed: {}", self.platform.name, command, e);
            }
        }
        if let Err(e) = self.channel.close().await {
            warn!("{}: channel close failed: {}", self.platform.name, e);
        }
        self.transport.close().await
    }
}

impl Transfer for SshSession {
    async fn put(&mut self, local_source: &Path, remote_dest: &str) -> Result<()> {
        debug!(
            "{}: put {} -> {}",
            self.platform.name,
            local_source.display(),
            remote_dest
        );
        self.transport.upload(local_source, remote_dest).await
    }
}
