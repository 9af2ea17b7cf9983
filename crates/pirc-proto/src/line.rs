//! Line framing over a byte stream.
//!
//! A [`LineBuffer`] accumulates whatever the socket hands us — partial
//! lines, several lines at once — and yields complete lines terminated by
//! `\n`, with a single trailing `\r` stripped. Lines are limited to
//! [`MAX_LINE_LEN`] bytes per the IRC standard; an overrun is a protocol
//! violation, not a recoverable command error.

use bytes::BytesMut;

use crate::error::ProtocolError;

/// Maximum wire length of one message, terminator included (RFC 1459).
pub const MAX_LINE_LEN: usize = 512;

/// Per-connection byte accumulator and line extractor.
#[derive(Debug, Default)]
pub struct LineBuffer {
    buf: BytesMut,
    /// Index of the next byte to check for `\n`, so repeated calls do not
    /// rescan the same partial line.
    next_index: usize,
}

impl LineBuffer {
    /// Create an empty buffer.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append bytes received from the socket.
    pub fn extend(&mut self, bytes: &[u8]) {
        self.buf.extend_from_slice(bytes);
    }

    /// Number of buffered bytes not yet framed into a line.
    pub fn len(&self) -> usize {
        self.buf.len()
    }

    /// Whether the buffer holds no unframed bytes.
    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    /// Extract the next complete line, if one has arrived.
    ///
    /// Returns `Ok(Some(line))` with the terminator removed and a single
    /// trailing `\r` stripped; `Ok(None)` when no `\n` is buffered yet.
    /// Zero-length lines are legal and returned as empty strings.
    ///
    /// Errors when a line exceeds [`MAX_LINE_LEN`] — terminated or not —
    /// or is not valid UTF-8. After an error the offending bytes are
    /// dropped, but callers are expected to disconnect the peer anyway.
    pub fn extract_line(&mut self) -> Result<Option<String>, ProtocolError> {
        if let Some(offset) = self.buf[self.next_index..].iter().position(|b| *b == b'\n') {
            let line = self.buf.split_to(self.next_index + offset + 1);
            self.next_index = 0;

            if line.len() > MAX_LINE_LEN {
                return Err(ProtocolError::LineTooLong {
                    actual: line.len(),
                    limit: MAX_LINE_LEN,
                });
            }

            // Drop the '\n', then at most one '\r' before it.
            let mut end = line.len() - 1;
            if end > 0 && line[end - 1] == b'\r' {
                end -= 1;
            }

            let text = std::str::from_utf8(&line[..end]).map_err(|e| {
                ProtocolError::InvalidUtf8 {
                    valid_up_to: e.valid_up_to(),
                }
            })?;

            Ok(Some(text.to_owned()))
        } else {
            self.next_index = self.buf.len();

            // An unterminated line already past the limit will never
            // become a legal message.
            if self.buf.len() > MAX_LINE_LEN {
                return Err(ProtocolError::LineTooLong {
                    actual: self.buf.len(),
                    limit: MAX_LINE_LEN,
                });
            }

            Ok(None)
        }
    }
}
