//! Command dispatch.
//!
//! One framed line becomes one [`dispatch`] call. The registration gate
//! runs first — before registration a client may only speak PASS, then
//! PASS/NICK/USER — and the verb is then matched against the fixed
//! command table. Handlers mutate server state and queue replies; the
//! only control flow they return is whether the client survives the
//! command.

pub mod helpers;

mod channel;
mod connection;
mod messaging;
mod misc;

use std::os::fd::RawFd;

use pirc_proto::{Message, Response};

use crate::state::ServerState;

/// What the event loop should do with the client after a command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    /// Keep the connection.
    Continue,
    /// Destroy the client (QUIT or equivalent).
    Disconnect,
}

/// Route one parsed message for one client.
pub fn dispatch(state: &mut ServerState, fd: RawFd, msg: &Message) -> Action {
    let verb = msg.verb();
    if verb.is_empty() {
        return Action::Continue;
    }

    let Some(client) = state.clients.get(&fd) else {
        return Action::Continue;
    };

    // The registration gate: PASS alone until the password is in, then
    // the NICK/USER pair, then everything.
    if !client.registered {
        let allowed = if !client.pass_ok {
            verb == "PASS"
        } else {
            matches!(verb.as_str(), "PASS" | "NICK" | "USER")
        };
        if !allowed {
            state.send_numeric(fd, Response::ERR_NOTREGISTERED, vec![], None);
            return Action::Continue;
        }
    }

    match verb.as_str() {
        "PASS" => connection::pass(state, fd, msg),
        "NICK" => connection::nick(state, fd, msg),
        "USER" => connection::user(state, fd, msg),
        "PING" => connection::ping(state, fd, msg),
        "QUIT" => connection::quit(state, fd, msg),
        "PRIVMSG" => messaging::privmsg(state, fd, msg),
        "JOIN" => channel::join(state, fd, msg),
        "PART" => channel::part(state, fd, msg),
        "KICK" => channel::kick(state, fd, msg),
        "INVITE" => channel::invite(state, fd, msg),
        "TOPIC" => channel::topic(state, fd, msg),
        "MODE" => channel::mode(state, fd, msg),
        "HELP" => misc::help(state, fd, msg),
        "CHANNELS" => misc::channels(state, fd, msg),
        _ => {
            state.send_numeric(
                fd,
                Response::ERR_UNKNOWNCOMMAND,
                vec![msg.command.clone()],
                None,
            );
            Action::Continue
        }
    }
}
