//! Error types for the OS10 driver.

use std::io;
use thiserror::Error;

/// Main error type for driver operations.
#[derive(Error, Debug)]
pub enum Error {
    /// SSH transport-level errors (connect, authenticate, host keys).
    #[error("Transport error: {0}")]
    Transport(#[from] TransportError),

    /// The device answered with an error marker; the output is not usable.
    #[error("Error while executing the command : {command} output :: {output}")]
    Command { command: String, output: String },

    /// The channel failed while a command was in flight.
    #[error("Connection closed: {message}")]
    ConnectionClosed { message: String },

    /// A file put did not complete.
    #[error("Transfer to '{destination}' failed: {message}")]
    TransferFailed { destination: String, message: String },

    /// A merge candidate could not be staged or was rejected on commit.
    #[error("{message}")]
    MergeConfig {
        message: String,
        command: String,
        output: String,
    },

    /// Replace staging failed, or a replace commit was attempted.
    #[error("{message}")]
    ReplaceConfig {
        message: String,
        command: String,
        output: String,
    },

    /// The XML reply could not be parsed, even after repair.
    #[error("Response from the device is not in expected format: {message}")]
    MalformedTelemetry { message: String, output: String },

    /// The caller passed arguments that can never succeed.
    #[error("Invalid argument: {message}")]
    InvalidArgument { message: String },

    /// Local I/O error (temporary candidate files).
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}

impl Error {
    /// Build a [`Error::Command`] from the command and the raw reply.
    pub fn command(command: impl Into<String>, output: impl Into<String>) -> Self {
        Self::Command {
            command: command.into(),
            output: output.into(),
        }
    }

    /// Build a [`Error::ConnectionClosed`].
    pub fn connection_closed(message: impl Into<String>) -> Self {
        Self::ConnectionClosed {
            message: message.into(),
        }
    }

    /// Build a [`Error::InvalidArgument`].
    pub fn invalid_argument(message: impl Into<String>) -> Self {
        Self::InvalidArgument {
            message: message.into(),
        }
    }

    /// Raw device output carried by this error, if any.
    pub fn output(&self) -> Option<&str> {
        match self {
            Self::Command { output, .. }
            | Self::MergeConfig { output, .. }
            | Self::ReplaceConfig { output, .. }
            | Self::MalformedTelemetry { output, .. } => Some(output),
            _ => None,
        }
    }

    /// Whether this error means the session is no longer usable.
    pub fn is_connection_closed(&self) -> bool {
        matches!(self, Self::ConnectionClosed { .. })
    }
}

/// Transport layer errors (SSH connection, authentication).
#[derive(Error, Debug)]
pub enum TransportError {
    /// SSH handshake or protocol error
    #[error("SSH error: {0}")]
    Ssh(#[from] russh::Error),

    /// Authentication failed
    #[error("Authentication failed for user '{user}'")]
    AuthenticationFailed { user: String },

    /// SSH key error
    #[error("SSH key error: {0}")]
    Key(String),

    /// Host key differs from the one recorded in known_hosts
    #[error("Host key for {host}:{port} changed (known_hosts line {line})")]
    HostKeyChanged { host: String, port: u16, line: usize },

    /// Host is not in known_hosts and strict checking is on
    #[error("Host key for {host}:{port} is unknown")]
    HostKeyUnknown { host: String, port: u16 },

    /// known_hosts could not be read or written
    #[error("known_hosts error: {0}")]
    KnownHosts(String),

    /// Operation timed out
    #[error("Operation timed out after {0:?}")]
    Timeout(std::time::Duration),

    /// Unsupported transport requested in the options
    #[error("Unsupported transport '{0}'")]
    Unsupported(String),
}

/// Channel layer errors (pattern matching, PTY operations).
#[derive(Error, Debug)]
pub enum ChannelError {
    /// Pattern matching timed out
    #[error("Pattern not found within {0:?}")]
    PatternTimeout(std::time::Duration),

    /// Channel closed unexpectedly
    #[error("Channel closed")]
    Closed,

    /// SSH protocol error on the channel
    #[error("Channel SSH error: {0}")]
    Ssh(russh::Error),

    /// Invalid regex pattern
    #[error("Invalid regex pattern: {0}")]
    InvalidPattern(#[from] regex::Error),
}

impl From<ChannelError> for Error {
    fn from(err: ChannelError) -> Self {
        match err {
            ChannelError::InvalidPattern(e) => Error::invalid_argument(e.to_string()),
            other => Error::connection_closed(other.to_string()),
        }
    }
}

/// Result type alias using the driver's Error.
pub type Result<T> = std::result::Result<T, Error>;
