//! Line framing over a stream of received bytes.
//!
//! A line ends at `\n`. A single `\r` right before it belongs to the
//! terminator. Bytes after a terminator stay buffered for the next line, so a
//! read that returns several lines at once loses nothing.

use memchr::memchr;
use std::fmt;

const LF: u8 = b'\n';
const CR: u8 = b'\r';

/// Longest line held while waiting for its terminator.
///
/// A device that never sends `\n` gets its bytes handed back in pieces of
/// this size instead of growing the buffer without bound.
pub const MAX_LINE_LEN: usize = 64 * 1024;

/// Bytes received from the device and not yet handed to a caller.
#[derive(Debug, Clone)]
pub struct LineBuffer {
    buf: Vec<u8>,
    /// Prefix of `buf` already searched for `\n`.
    scanned: usize,
    limit: usize,
}

impl Default for LineBuffer {
    fn default() -> Self {
        Self::with_limit(MAX_LINE_LEN)
    }
}

impl LineBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    /// A buffer that gives up on a line after `limit` bytes (at least 1).
    pub fn with_limit(limit: usize) -> Self {
        Self {
            buf: Vec::new(),
            scanned: 0,
            limit: limit.max(1),
        }
    }

    pub fn push(&mut self, data: &[u8]) {
        self.buf.extend_from_slice(data);
    }

    /// Split off the first complete line, terminator removed.
    ///
    /// Only bytes pushed since the last call are searched.
    pub fn next_line(&mut self) -> Option<Vec<u8>> {
        let Some(offset) = memchr(LF, &self.buf[self.scanned..]) else {
            self.scanned = self.buf.len();
            return None;
        };
        let end = self.scanned + offset;
        let mut line: Vec<u8> = self.buf.drain(..=end).collect();
        self.scanned = 0;
        line.pop();
        if line.last() == Some(&CR) {
            line.pop();
        }
        Some(line)
    }

    /// Split off the first `limit` bytes when that much has been scanned
    /// without finding a terminator.
    ///
    /// Call after [`next_line`](Self::next_line) came back empty.
    pub fn split_overlong(&mut self) -> Option<Vec<u8>> {
        if self.scanned < self.limit {
            return None;
        }
        Some(self.take(self.limit))
    }

    /// Take up to `len` bytes from the front.
    pub fn take(&mut self, len: usize) -> Vec<u8> {
        let len = len.min(self.buf.len());
        self.scanned = self.scanned.saturating_sub(len);
        self.buf.drain(..len).collect()
    }

    /// Empty the buffer, returning an unterminated line.
    ///
    /// A trailing `\r` is dropped since it is most likely the first half of
    /// a terminator that did not arrive in time.
    pub fn take_partial(&mut self) -> Vec<u8> {
        self.scanned = 0;
        let mut partial = std::mem::take(&mut self.buf);
        if partial.last() == Some(&CR) {
            partial.pop();
        }
        partial
    }

    pub fn len(&self) -> usize {
        self.buf.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    pub fn clear(&mut self) {
        self.buf.clear();
        self.scanned = 0;
    }
}

/// Result of a framed line read.
///
/// `terminated` is false when the read timed out or the line outgrew
/// [`MAX_LINE_LEN`]. That separates "no data" (`bytes` empty, not
/// terminated) from a real empty line.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Line {
    pub bytes: Vec<u8>,
    pub terminated: bool,
}

impl Line {
    pub fn terminated(bytes: Vec<u8>) -> Self {
        Self {
            bytes,
            terminated: true,
        }
    }

    pub fn timed_out(bytes: Vec<u8>) -> Self {
        Self {
            bytes,
            terminated: false,
        }
    }

    /// Cut at the buffer's line limit with no terminator in sight.
    pub fn overlong(bytes: Vec<u8>) -> Self {
        Self {
            bytes,
            terminated: false,
        }
    }

    /// Timed out with nothing received.
    pub fn is_idle(&self) -> bool {
        !self.terminated && self.bytes.is_empty()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.bytes
    }

    /// Upper-case hex of the line bytes, for display.
    pub fn to_hex(&self) -> String {
        hex::encode_upper(&self.bytes)
    }

    pub fn to_string_lossy(&self) -> String {
        String::from_utf8_lossy(&self.bytes).into_owned()
    }
}

impl fmt::Display for Line {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&String::from_utf8_lossy(&self.bytes))
    }
}
