//! Scripted in-memory session for tests.

use std::collections::{HashMap, HashSet, VecDeque};
use std::path::{Path, PathBuf};

use super::{Session, Transfer};
use crate::error::{Error, Result};

/// One recorded upload.
#[derive(Debug, Clone)]
pub(crate) struct Put {
    pub local: PathBuf,
    pub remote: String,
    /// Local file content at the time of the upload.
    pub content: String,
}

/// Session that replays canned replies and records every command.
///
/// Replies are queued per command; the last queued reply repeats once the
/// queue is down to one. Unknown commands answer with an empty string.
#[derive(Debug, Default)]
pub(crate) struct MockSession {
    replies: HashMap<String, VecDeque<String>>,
    closed_on: HashSet<String>,
    /// 1-based prompt resyncs that fail as if the channel dropped.
    failing_syncs: HashSet<usize>,
    pub commands: Vec<String>,
    pub puts: Vec<Put>,
    pub prompt_syncs: usize,
    pub fail_transfer: bool,
    pub alive: bool,
}

impl MockSession {
    pub fn new() -> Self {
        Self {
            alive: true,
            ..Default::default()
        }
    }

    /// Queue `output` as the next reply to `command`.
    pub fn reply(mut self, command: &str, output: &str) -> Self {
        self.replies
            .entry(command.to_string())
            .or_default()
            .push_back(output.to_string());
        self
    }

    /// Make `command` fail as if the channel dropped.
    pub fn closed_on(mut self, command: &str) -> Self {
        self.closed_on.insert(command.to_string());
        self
    }

    /// Make the `nth` prompt resync (counting from 1) fail.
    pub fn failing_prompt_sync(mut self, nth: usize) -> Self {
        self.failing_syncs.insert(nth);
        self
    }

    pub fn failing_transfer(mut self) -> Self {
        self.fail_transfer = true;
        self
    }

    fn answer(&mut self, command: &str) -> Result<String> {
        self.commands.push(command.to_string());
        if self.closed_on.contains(command) {
            return Err(Error::connection_closed("Channel closed"));
        }
        let Some(queue) = self.replies.get_mut(command) else {
            return Ok(String::new());
        };
        let reply = if queue.len() > 1 {
            queue.pop_front()
        } else {
            queue.front().cloned()
        };
        Ok(reply.unwrap_or_default())
    }
}

impl Session for MockSession {
    async fn send_command(&mut self, command: &str) -> Result<String> {
        self.answer(command)
    }

    async fn send_command_expect(&mut self, command: &str, _pattern: &str) -> Result<String> {
        self.answer(command)
    }

    async fn send_command_timing(&mut self, command: &str) -> Result<String> {
        self.answer(command)
    }

    async fn set_base_prompt(&mut self) -> Result<String> {
        self.prompt_syncs += 1;
        if self.failing_syncs.contains(&self.prompt_syncs) {
            return Err(Error::connection_closed("Pattern not found within 90s"));
        }
        Ok("OS10".to_string())
    }

    async fn is_alive(&mut self) -> bool {
        self.alive
    }

    async fn close(&mut self) -> Result<()> {
        self.alive = false;
        Ok(())
    }
}

impl Transfer for MockSession {
    async fn put(&mut self, local_source: &Path, remote_dest: &str) -> Result<()> {
        let content = std::fs::read_to_string(local_source)?;
        self.puts.push(Put {
            local: local_source.to_path_buf(),
            remote: remote_dest.to_string(),
            content,
        });
        if self.fail_transfer {
            return Err(Error::TransferFailed {
                destination: remote_dest.to_string(),
                message: "Permission denied".to_string(),
            });
        }
        Ok(())
    }
}
