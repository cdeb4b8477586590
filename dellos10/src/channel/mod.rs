//! Channel layer for pattern matching and PTY operations.
//!
//! This module handles the interactive shell channel,
//! including prompt detection, base-prompt tracking and ANSI stripping.

mod buffer;
mod patterns;
mod pty;

pub use buffer::PatternBuffer;
pub use patterns::{
    base_prompt_pattern, compile_prompt_pattern, extract_base_prompt, normalize_output,
    strip_command_echo,
};
pub use pty::PtyChannel;
