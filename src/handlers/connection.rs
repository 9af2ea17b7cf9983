//! Connection and registration handlers: PASS, NICK, USER, PING, QUIT.

use std::os::fd::RawFd;

use pirc_proto::{Message, NickExt, Response};
use tracing::{debug, info};

use super::{misc, Action};
use crate::state::ServerState;

pub fn pass(state: &mut ServerState, fd: RawFd, msg: &Message) -> Action {
    if msg.params.len() != 1 {
        state.need_more_params(fd, "PASS");
        return Action::Continue;
    }
    let Some(client) = state.clients.get_mut(&fd) else {
        return Action::Continue;
    };
    if client.pass_ok {
        state.send_numeric(fd, Response::ERR_ALREADYREGISTRED, vec![], None);
        return Action::Continue;
    }
    if msg.params[0] != state.config.password {
        debug!(fd, "password mismatch");
        state.send_numeric(fd, Response::ERR_PASSWDMISMATCH, vec![], None);
        return Action::Continue;
    }
    client.pass_ok = true;
    debug!(fd, "password accepted");
    Action::Continue
}

pub fn nick(state: &mut ServerState, fd: RawFd, msg: &Message) -> Action {
    let Some(new_nick) = msg.params.first().cloned() else {
        state.send_numeric(fd, Response::ERR_NONICKNAMEGIVEN, vec![], None);
        return Action::Continue;
    };

    if !new_nick.is_valid_nick() {
        state.send_numeric(
            fd,
            Response::ERR_ERRONEUSNICKNAME,
            vec![new_nick],
            None,
        );
        return Action::Continue;
    }
    if state.nick_in_use(&new_nick, fd) {
        state.send_numeric(fd, Response::ERR_NICKNAMEINUSE, vec![new_nick], None);
        return Action::Continue;
    }

    let Some(client) = state.clients.get_mut(&fd) else {
        return Action::Continue;
    };
    let old_nick = client.nick.replace(new_nick.clone());
    client.nick_ok = true;

    if let Some(old_nick) = old_nick {
        // A rename: tell everyone else who this client now is.
        info!(fd, old = %old_nick, new = %new_nick, "nick change");
        let relay = Message::nick(new_nick)
            .with_prefix(format!("{}@{}", old_nick, state.config.host));
        state.broadcast_all(&relay, fd);
    } else {
        debug!(fd, nick = %new_nick, "nick set");
    }

    complete_registration(state, fd);
    Action::Continue
}

pub fn user(state: &mut ServerState, fd: RawFd, msg: &Message) -> Action {
    let Some(client) = state.clients.get_mut(&fd) else {
        return Action::Continue;
    };
    if client.user_ok {
        state.send_numeric(fd, Response::ERR_ALREADYREGISTRED, vec![], None);
        return Action::Continue;
    }
    if msg.params.len() < 4 {
        state.need_more_params(fd, "USER");
        return Action::Continue;
    }

    let username = &msg.params[0];
    let mode = &msg.params[1];
    let unused = &msg.params[2];
    let realname = &msg.params[3];

    let valid = !username.is_empty()
        && username.chars().all(|c| c.is_ascii_alphanumeric())
        && mode == "0"
        && unused == "*";
    if !valid {
        state.need_more_params(fd, "USER");
        return Action::Continue;
    }

    let Some(client) = state.clients.get_mut(&fd) else {
        return Action::Continue;
    };
    client.user = Some(username.clone());
    client.realname = Some(realname.clone());
    client.user_ok = true;
    debug!(fd, user = %username, "user details accepted");

    complete_registration(state, fd);
    Action::Continue
}

pub fn ping(state: &mut ServerState, fd: RawFd, msg: &Message) -> Action {
    let Some(token) = msg.params.first().cloned() else {
        state.need_more_params(fd, "PING");
        return Action::Continue;
    };
    let pong = Message::pong(token).with_prefix(state.config.host.clone());
    state.send_to(fd, &pong);
    Action::Continue
}

pub fn quit(state: &mut ServerState, fd: RawFd, msg: &Message) -> Action {
    let reason = msg
        .params
        .first()
        .cloned()
        .unwrap_or_else(|| "Client Quit".to_owned());

    // Tell every peer sharing a channel, once each, before the dispatcher
    // tears the client down.
    let mut peers: Vec<RawFd> = state
        .channels
        .values()
        .filter(|c| c.is_member(fd))
        .flat_map(|c| c.members())
        .filter(|&peer| peer != fd)
        .collect();
    peers.sort_unstable();
    peers.dedup();

    let relay = Message::quit(reason.clone()).with_prefix(state.user_prefix(fd));
    for peer in peers {
        state.send_to(peer, &relay);
    }

    info!(fd, nick = %state.nick_of(fd), reason = %reason, "client quit");
    Action::Disconnect
}

/// On the transition into the registered state, greet the client.
fn complete_registration(state: &mut ServerState, fd: RawFd) {
    let Some(client) = state.clients.get_mut(&fd) else {
        return;
    };
    if !client.try_complete_registration() {
        return;
    }

    let nick = client.nick_or_star().to_owned();
    info!(fd, nick = %nick, "client registered");
    state.send_numeric(
        fd,
        Response::RPL_WELCOME,
        vec![],
        Some(format!("Welcome to the Internet Relay Network {}", nick)),
    );
    misc::send_help(state, fd);
}
