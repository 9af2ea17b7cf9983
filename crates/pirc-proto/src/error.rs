//! Protocol-level errors.
//!
//! These are framing violations, not command errors: command errors are
//! answered with numeric replies and keep the connection alive, while a
//! `ProtocolError` means the peer is no longer speaking IRC and should be
//! disconnected.

use thiserror::Error;

/// Errors surfaced by the line framer.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ProtocolError {
    /// A line (terminated or not) exceeded the wire limit.
    #[error("line exceeds {limit} bytes (got {actual})")]
    LineTooLong {
        /// Observed length, including the terminator if one arrived.
        actual: usize,
        /// The enforced limit.
        limit: usize,
    },

    /// A framed line was not valid UTF-8.
    #[error("line is not valid UTF-8 (valid up to byte {valid_up_to})")]
    InvalidUtf8 {
        /// Length of the valid prefix, per [`std::str::Utf8Error`].
        valid_up_to: usize,
    },
}

/// Result alias used throughout the crate.
pub type Result<T> = std::result::Result<T, ProtocolError>;
