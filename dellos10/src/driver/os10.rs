//! The OS10 driver and its command dispatcher.

use indexmap::IndexMap;
use log::{debug, warn};
use serde::Serialize;

use super::options::DriverOptions;
use super::Session;
use crate::config::Lifecycle;
use crate::error::{Error, Result};
use crate::platform::dellos10::{ERROR_MARKER, INVALID_INPUT};

/// Driver for one Dell OS10 device.
///
/// Generic over the session so the dispatcher, fact getters and the
/// configuration lifecycle can run against anything implementing
/// [`Session`] (and [`Transfer`](super::Transfer) for candidate uploads).
pub struct Os10Driver<S> {
    pub(crate) session: S,
    pub(crate) options: DriverOptions,
    pub(crate) lifecycle: Lifecycle,
}

/// Which configurations [`Os10Driver::get_config`] should fetch.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ConfigRetrieve {
    #[default]
    All,
    Startup,
    Running,
    Candidate,
}

/// Configuration texts; the ones not requested stay empty.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct DeviceConfigs {
    pub startup: String,
    pub running: String,
    pub candidate: String,
}

impl<S: Session> Os10Driver<S> {
    /// Wrap an open session.
    pub fn new(session: S, options: DriverOptions) -> Self {
        Self {
            session,
            options,
            lifecycle: Lifecycle::default(),
        }
    }

    /// The options this driver was built with.
    pub fn options(&self) -> &DriverOptions {
        &self.options
    }

    /// Direct access to the session, for commands the driver does not wrap.
    pub fn session_mut(&mut self) -> &mut S {
        &mut self.session
    }

    /// Send one command and return its output.
    ///
    /// The prompt is re-read first since a previous command may have changed
    /// the hostname. A reply containing the `% Error` marker is returned as
    /// [`Error::Command`]; a failing channel as [`Error::ConnectionClosed`].
    /// Nothing is retried.
    pub async fn dispatch(&mut self, command: &str) -> Result<String> {
        debug!("dispatch: {}", command);
        self.session.set_base_prompt().await?;
        let output = self.session.send_command(command).await?;
        if output.contains(ERROR_MARKER) {
            return Err(Error::command(command, output));
        }
        Ok(output)
    }

    /// Run each command and collect its output, keyed by command.
    pub async fn cli(&mut self, commands: &[&str]) -> Result<IndexMap<String, String>> {
        let mut outputs = IndexMap::with_capacity(commands.len());
        for command in commands {
            let output = self.dispatch(command).await?;
            if output.contains(INVALID_INPUT) {
                return Err(Error::command(*command, output));
            }
            outputs.insert(command.to_string(), output);
        }
        Ok(outputs)
    }

    /// Fetch startup, running and/or candidate configuration.
    pub async fn get_config(&mut self, retrieve: ConfigRetrieve) -> Result<DeviceConfigs> {
        let mut configs = DeviceConfigs::default();
        let wants = |kind| retrieve == ConfigRetrieve::All || retrieve == kind;

        if wants(ConfigRetrieve::Startup) {
            configs.startup = self.dispatch("show startup-configuration").await?;
        }
        if wants(ConfigRetrieve::Running) {
            configs.running = self.dispatch("show running-configuration").await?;
        }
        if wants(ConfigRetrieve::Candidate) {
            configs.candidate = self.dispatch("show candidate-configuration").await?;
        }
        Ok(configs)
    }

    /// Whether the session still answers. Never fails.
    pub async fn is_alive(&mut self) -> bool {
        self.session.is_alive().await
    }

    /// Close the session.
    pub async fn close(&mut self) -> Result<()> {
        if let Err(e) = self.session.close().await {
            warn!("close: {}", e);
            return Err(e);
        }
        Ok(())
    }
}
