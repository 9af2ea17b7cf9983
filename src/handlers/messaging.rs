//! PRIVMSG routing.

use std::os::fd::RawFd;

use pirc_proto::{ChannelExt, Message, Response};
use tracing::trace;

use super::Action;
use crate::state::ServerState;

pub fn privmsg(state: &mut ServerState, fd: RawFd, msg: &Message) -> Action {
    if msg.params.len() < 2 {
        state.send_numeric(fd, Response::ERR_NORECIPIENT, vec![], None);
        return Action::Continue;
    }

    let targets = msg.params[0].clone();
    let text = msg.params[1].clone();
    let prefix = state.user_prefix(fd);

    for target in targets.split(',').filter(|t| !t.is_empty()) {
        if target.starts_with('#') {
            send_to_channel(state, fd, target, &text, &prefix);
        } else {
            send_to_nick(state, fd, target, &text, &prefix);
        }
    }
    Action::Continue
}

fn send_to_channel(state: &mut ServerState, fd: RawFd, target: &str, text: &str, prefix: &str) {
    let key = target.channel_key();
    match state.channels.get(key) {
        None => {
            state.send_numeric(
                fd,
                Response::ERR_NOSUCHCHANNEL,
                vec![target.to_owned()],
                None,
            );
        }
        Some(chan) if !chan.is_member(fd) => {
            state.send_numeric(
                fd,
                Response::ERR_CANNOTSENDTOCHAN,
                vec![target.to_owned()],
                None,
            );
        }
        Some(_) => {
            trace!(fd, target, "relaying to channel");
            let relay = Message::privmsg(target, text).with_prefix(prefix);
            // The sender never receives its own copy.
            state.broadcast_channel(key, &relay, Some(fd));
        }
    }
}

fn send_to_nick(state: &mut ServerState, fd: RawFd, target: &str, text: &str, prefix: &str) {
    match state.find_by_nick(target) {
        None => {
            state.send_numeric(fd, Response::ERR_NOSUCHNICK, vec![target.to_owned()], None);
        }
        Some(peer) => {
            trace!(fd, target, "relaying to nick");
            let relay = Message::privmsg(target, text).with_prefix(prefix);
            state.send_to(peer, &relay);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::handlers::dispatch;
    use crate::state::test_support::*;
    use crate::state::Channel;

    fn msg(line: &str) -> Message {
        Message::parse(line)
    }

    fn channel_with(state: &mut ServerState, name: &str, members: &[RawFd]) {
        let mut chan = Channel::new(name);
        for &fd in members {
            chan.add_member(fd);
        }
        state.channels.insert(name.to_owned(), chan);
    }

    #[test]
    fn test_channel_relay_excludes_sender() {
        let mut state = state();
        let (alice, _p1) = add_registered(&mut state, "alice");
        let (bob, _p2) = add_registered(&mut state, "bob");
        channel_with(&mut state, "room", &[alice, bob]);

        dispatch(&mut state, alice, &msg("PRIVMSG #room :hi"));

        let out = sent(&state, bob);
        assert_eq!(out, ":alice@irc.test PRIVMSG #room :hi\r\n");
        assert!(sent(&state, alice).is_empty());
    }

    #[test]
    fn test_direct_message() {
        let mut state = state();
        let (alice, _p1) = add_registered(&mut state, "alice");
        let (bob, _p2) = add_registered(&mut state, "bob");

        dispatch(&mut state, alice, &msg("PRIVMSG bob :psst"));
        assert!(sent(&state, bob).contains(":alice@irc.test PRIVMSG bob :psst"));
        assert!(sent(&state, alice).is_empty());
    }

    #[test]
    fn test_multiple_targets() {
        let mut state = state();
        let (alice, _p1) = add_registered(&mut state, "alice");
        let (bob, _p2) = add_registered(&mut state, "bob");
        let (carol, _p3) = add_registered(&mut state, "carol");
        channel_with(&mut state, "room", &[alice, bob]);

        dispatch(&mut state, alice, &msg("PRIVMSG #room,carol :hi all"));
        assert!(sent(&state, bob).contains("PRIVMSG #room :hi all"));
        assert!(sent(&state, carol).contains("PRIVMSG carol :hi all"));
    }

    #[test]
    fn test_no_recipient() {
        let mut state = state();
        let (alice, _p1) = add_registered(&mut state, "alice");

        dispatch(&mut state, alice, &msg("PRIVMSG"));
        assert!(sent(&state, alice).contains("411"));

        clear_sent(&mut state, alice);
        dispatch(&mut state, alice, &msg("PRIVMSG #room"));
        assert!(sent(&state, alice).contains("411"));
    }

    #[test]
    fn test_unknown_targets() {
        let mut state = state();
        let (alice, _p1) = add_registered(&mut state, "alice");

        dispatch(&mut state, alice, &msg("PRIVMSG ghost :anyone?"));
        assert!(sent(&state, alice).contains("401 alice ghost"));

        clear_sent(&mut state, alice);
        dispatch(&mut state, alice, &msg("PRIVMSG #nowhere :anyone?"));
        assert!(sent(&state, alice).contains("403 alice #nowhere"));
    }

    #[test]
    fn test_cannot_send_when_not_member() {
        let mut state = state();
        let (alice, _p1) = add_registered(&mut state, "alice");
        let (bob, _p2) = add_registered(&mut state, "bob");
        channel_with(&mut state, "room", &[bob]);

        dispatch(&mut state, alice, &msg("PRIVMSG #room :let me in"));
        assert!(sent(&state, alice).contains("404 alice #room"));
        assert!(sent(&state, bob).is_empty());
    }
}
