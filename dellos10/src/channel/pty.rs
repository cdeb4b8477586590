//! PTY channel abstraction for the interactive shell.

use std::time::Duration;

use bytes::Bytes;
use log::trace;
use regex::bytes::Regex;
use russh::client::Msg;
use russh::{Channel, ChannelMsg};
use tokio::time::Instant;

use super::buffer::PatternBuffer;
use crate::error::ChannelError;

/// High-level PTY channel for an interactive device shell.
///
/// Wraps the russh shell channel and provides pattern-based read operations
/// with timeout handling.
pub struct PtyChannel {
    /// The underlying SSH shell channel.
    channel: Channel<Msg>,

    /// Pattern buffer for accumulating output.
    buffer: PatternBuffer,

    /// Whether the channel is still open.
    is_open: bool,
}

impl PtyChannel {
    /// Wrap an already opened shell channel.
    pub fn new(channel: Channel<Msg>, search_depth: usize) -> Self {
        Self {
            channel,
            buffer: PatternBuffer::new(search_depth),
            is_open: true,
        }
    }

    /// Discard anything buffered from earlier reads.
    pub fn clear_buffer(&mut self) {
        self.buffer.clear();
    }

    /// Send a line of input (a newline is appended).
    pub async fn send(&mut self, input: &str) -> Result<(), ChannelError> {
        trace!("pty send: {:?}", input);
        let line = format!("{input}\n");
        self.write_raw(line.as_bytes()).await
    }

    /// Write raw bytes to the channel.
    pub async fn write_raw(&mut self, data: &[u8]) -> Result<(), ChannelError> {
        if !self.is_open {
            return Err(ChannelError::Closed);
        }
        let result = self.channel.data(data).await;
        result.map_err(|e| {
            self.is_open = false;
            ChannelError::Ssh(e)
        })
    }

    /// Read until `pattern` matches the tail of the buffer.
    pub async fn read_until_pattern(
        &mut self,
        pattern: &Regex,
        timeout: Duration,
    ) -> Result<Bytes, ChannelError> {
        let deadline = Instant::now() + timeout;
        loop {
            if self.buffer.tail_contains(pattern) {
                return Ok(self.buffer.take());
            }
            if !self.read_chunk(deadline, timeout).await? {
                return Err(ChannelError::PatternTimeout(timeout));
            }
        }
    }

    /// Read until the device stays silent for `quiet`, or `timeout` passes.
    ///
    /// Used for commands that end on a question rather than a prompt.
    pub async fn read_until_quiet(
        &mut self,
        quiet: Duration,
        timeout: Duration,
    ) -> Result<Bytes, ChannelError> {
        let deadline = Instant::now() + timeout;
        loop {
            let window = (Instant::now() + quiet).min(deadline);
            if !self.read_chunk(window, timeout).await? {
                return Ok(self.buffer.take());
            }
        }
    }

    /// Read one message into the buffer. Returns `false` if `deadline` passed first.
    async fn read_chunk(&mut self, deadline: Instant, timeout: Duration) -> Result<bool, ChannelError> {
        loop {
            let msg = match tokio::time::timeout_at(deadline, self.channel.wait()).await {
                Ok(msg) => msg,
                Err(_) => return Ok(false),
            };

            match msg {
                Some(ChannelMsg::Data { ref data }) => {
                    trace!("pty recv: {} bytes", data.len());
                    self.buffer.extend(&data[..]);
                    return Ok(true);
                }
                Some(ChannelMsg::ExtendedData { ref data, .. }) => {
                    self.buffer.extend(&data[..]);
                    return Ok(true);
                }
                Some(ChannelMsg::Eof) | Some(ChannelMsg::Close) | None => {
                    self.is_open = false;
                    trace!("pty closed while waiting (timeout {:?})", timeout);
                    return Err(ChannelError::Closed);
                }
                Some(_) => continue,
            }
        }
    }

    /// Close the channel.
    pub async fn close(&mut self) -> Result<(), ChannelError> {
        if self.is_open {
            self.is_open = false;
            self.channel.close().await.map_err(ChannelError::Ssh)?;
        }
        Ok(())
    }
}
