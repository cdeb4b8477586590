//! High-level driver for Dell OS10 devices.
//!
//! [`Os10Driver`] owns one session and exposes the command dispatcher, the
//! fact getters and the configuration lifecycle. The session itself sits
//! behind the [`Session`] and [`Transfer`] traits so the driver logic does
//! not depend on SSH.

mod builder;
#[cfg(test)]
pub(crate) mod mock;
mod options;
mod os10;
mod ssh_session;

pub use builder::DriverBuilder;
pub use options::DriverOptions;
pub use os10::{ConfigRetrieve, DeviceConfigs, Os10Driver};
pub use ssh_session::SshSession;

use std::future::Future;
use std::path::Path;

use crate::error::Result;

/// An interactive command session with one device.
///
/// All methods are strictly sequential: a command is sent, then its reply is
/// read in full before anything else is written.
pub trait Session: Send {
    /// Send a command and wait for the prompt. Returns the reply without the
    /// command echo and the trailing prompt.
    fn send_command(&mut self, command: &str) -> impl Future<Output = Result<String>> + Send;

    /// Send a command and wait until `pattern` (a regex) matches the end of
    /// the reply.
    ///
    /// Used where the prompt may change while the command runs, such as a
    /// configuration merge that edits the hostname.
    fn send_command_expect(
        &mut self,
        command: &str,
        pattern: &str,
    ) -> impl Future<Output = Result<String>> + Send;

    /// Send a command and read until the device goes quiet.
    ///
    /// Used for dialogues that end on a question instead of a prompt.
    fn send_command_timing(&mut self, command: &str) -> impl Future<Output = Result<String>> + Send;

    /// Re-read the prompt and remember its base (hostname) part.
    fn set_base_prompt(&mut self) -> impl Future<Output = Result<String>> + Send;

    /// Liveness probe. Never fails; a broken session reports `false`.
    fn is_alive(&mut self) -> impl Future<Output = bool> + Send;

    /// Close the session.
    fn close(&mut self) -> impl Future<Output = Result<()>> + Send;
}

/// File upload to the device file system.
pub trait Transfer: Send {
    /// Copy `local_source` to the absolute `remote_dest` path on the device.
    fn put(
        &mut self,
        local_source: &Path,
        remote_dest: &str,
    ) -> impl Future<Output = Result<()>> + Send;
}
