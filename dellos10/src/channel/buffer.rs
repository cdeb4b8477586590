//! Receive buffer for the shell channel.
//!
//! Prompt detection only looks at the last `search_depth` bytes, so a full
//! route table or a long paged XML reply does not get rescanned on every
//! packet.

use std::fmt;

use bytes::{Bytes, BytesMut};
use regex::bytes::Regex;

/// Output read from the device, minus terminal escapes.
///
/// ANSI escape sequences are removed on the way in. The escape parser keeps
/// its state between calls, so a sequence split across two SSH packets is
/// still stripped.
pub struct PatternBuffer {
    /// The accumulated output buffer.
    buffer: BytesMut,

    /// How many bytes from the end to search for patterns.
    search_depth: usize,

    /// Escape-sequence parser.
    parser: vte::Parser,
}

impl PatternBuffer {
    pub fn new(search_depth: usize) -> Self {
        Self {
            buffer: BytesMut::with_capacity(4096),
            search_depth,
            parser: vte::Parser::new(),
        }
    }

    /// Append a received chunk, dropping escape sequences.
    pub fn extend(&mut self, data: &[u8]) {
        let mut stripper = AnsiStripper {
            out: &mut self.buffer,
        };
        self.parser.advance(&mut stripper, data);
    }

    /// Find `pattern` within the last `search_depth` bytes.
    ///
    /// Offsets in the returned match are relative to the searched tail.
    pub fn search_tail(&self, pattern: &Regex) -> Option<regex::bytes::Match<'_>> {
        let start = self.buffer.len().saturating_sub(self.search_depth);
        pattern.find(&self.buffer[start..])
    }

    pub fn tail_contains(&self, pattern: &Regex) -> bool {
        self.search_tail(pattern).is_some()
    }

    /// Hand out everything read so far and start over.
    pub fn take(&mut self) -> Bytes {
        self.buffer.split().freeze()
    }

    pub fn as_slice(&self) -> &[u8] {
        &self.buffer
    }

    pub fn is_empty(&self) -> bool {
        self.buffer.is_empty()
    }

    /// Drop unread output, such as a banner or a stale prompt.
    pub fn clear(&mut self) {
        self.buffer.clear();
    }
}

impl Default for PatternBuffer {
    fn default() -> Self {
        Self::new(1000)
    }
}

impl fmt::Debug for PatternBuffer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PatternBuffer")
            .field("len", &self.buffer.len())
            .field("search_depth", &self.search_depth)
            .finish()
    }
}

/// Keeps printable text and line control, drops escape sequences.
struct AnsiStripper<'a> {
    out: &'a mut BytesMut,
}

impl vte::Perform for AnsiStripper<'_> {
    fn print(&mut self, c: char) {
        let mut utf8 = [0u8; 4];
        self.out.extend_from_slice(c.encode_utf8(&mut utf8).as_bytes());
    }

    fn execute(&mut self, byte: u8) {
        if matches!(byte, b'\n' | b'\r' | b'\t') {
            self.out.extend_from_slice(&[byte]);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_basic_extend() {
        let mut buffer = PatternBuffer::new(100);
        buffer.extend(b"Hello, world!");
        assert_eq!(buffer.as_slice(), b"Hello, world!");
    }

    #[test]
    fn test_ansi_stripping() {
        let mut buffer = PatternBuffer::new(100);
        buffer.extend(b"\x1b[32mGreen text\x1b[0m\r\nOS10#");
        assert_eq!(buffer.as_slice(), b"Green text\r\nOS10#");
    }

    #[test]
    fn test_ansi_sequence_split_across_chunks() {
        let mut buffer = PatternBuffer::new(100);
        buffer.extend(b"abc\x1b[3");
        buffer.extend(b"2mdef");
        assert_eq!(buffer.as_slice(), b"abcdef");
    }

    #[test]
    fn test_tail_search() {
        let mut buffer = PatternBuffer::new(20);
        buffer.extend(&[b'x'; 100]);
        buffer.extend(b"\nOS10#");

        let pattern = Regex::new(r"OS10#").unwrap();
        assert!(buffer.search_tail(&pattern).is_some());
    }

    #[test]
    fn test_tail_search_not_in_tail() {
        let mut buffer = PatternBuffer::new(10);
        buffer.extend(b"OS10#");
        buffer.extend(&[b'x'; 100]);

        let pattern = Regex::new(r"OS10#").unwrap();
        assert!(buffer.search_tail(&pattern).is_none());
        assert!(!buffer.tail_contains(&pattern));
    }

    #[test]
    fn test_take_clears_buffer() {
        let mut buffer = PatternBuffer::new(100);
        buffer.extend(b"test data");
        assert_eq!(&buffer.take()[..], b"test data");
        assert!(buffer.is_empty());
    }
}
