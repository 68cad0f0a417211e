//! Newline-delimited JSON framing.
//!
//! [`LineBuffer`] accumulates arbitrary byte chunks from a response body and
//! hands back complete lines. It does no decoding on its own.

use bytes::{Bytes, BytesMut};

#[derive(Debug, Default)]
pub struct LineBuffer {
    buf: BytesMut,
}

impl LineBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn extend(&mut self, chunk: &[u8]) {
        self.buf.extend_from_slice(chunk);
    }

    /// Pop the next complete line, without its terminator (`\n` or `\r\n`).
    pub fn next_line(&mut self) -> Option<Bytes> {
        let pos = self.buf.iter().position(|b| *b == b'\n')?;
        let mut line = self.buf.split_to(pos + 1);
        line.truncate(pos);
        if line.last() == Some(&b'\r') {
            line.truncate(pos - 1);
        }
        Some(line.freeze())
    }

    /// Take whatever is left once the body has ended.
    ///
    /// Returns `None` when the feed ended on a line boundary.
    pub fn finish(&mut self) -> Option<Bytes> {
        if self.buf.is_empty() {
            return None;
        }
        Some(self.buf.split().freeze())
    }

    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }
}
