//! pircd - a compact IRC daemon.
//!
//! One thread, one readiness loop, explicit buffers: clients and channels
//! live in plain tables owned by the event loop, channels refer to
//! clients by fd, and all I/O is non-blocking with deferred-send output
//! buffers. The protocol layer (parsing, framing, numerics) lives in the
//! `pirc-proto` crate.

pub mod config;
pub mod handlers;
pub mod net;
pub mod server;
pub mod signals;
pub mod state;
