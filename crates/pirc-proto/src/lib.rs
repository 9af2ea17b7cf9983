//! # pirc-proto
//!
//! Protocol support for pircd: RFC 1459 message parsing and serialization,
//! line framing over a byte stream, and the numeric reply table.
//!
//! Everything in this crate is pure protocol — no sockets, no server state —
//! so it can be tested exhaustively in isolation.
//!
//! ## Quick start
//!
//! ```rust
//! use pirc_proto::Message;
//!
//! let msg = Message::parse(":alice@irc.example PRIVMSG #rust :hello there");
//! assert_eq!(msg.prefix.as_deref(), Some("alice@irc.example"));
//! assert_eq!(msg.command, "PRIVMSG");
//! assert_eq!(msg.params, vec!["#rust", "hello there"]);
//!
//! // Serialization is a lossless round trip.
//! assert_eq!(Message::parse(&msg.to_string()), msg);
//! ```

#![deny(clippy::all)]
#![warn(missing_docs)]

pub mod chan;
pub mod error;
pub mod line;
pub mod message;
pub mod nick;
pub mod response;

pub use self::chan::ChannelExt;
pub use self::error::ProtocolError;
pub use self::line::{LineBuffer, MAX_LINE_LEN};
pub use self::message::Message;
pub use self::nick::{NickExt, MAX_NICK_LEN};
pub use self::response::Response;
