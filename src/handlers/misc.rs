//! Informational commands: HELP and CHANNELS.

use std::os::fd::RawFd;

use pirc_proto::{Message, Response};

use super::Action;
use crate::state::ServerState;

/// One usage line per supported command, sent in the `705` burst.
const HELP_TOPICS: &[&str] = &[
    "PASS <password> - authenticate with the server password",
    "NICK <nickname> - set or change your nickname",
    "USER <user> 0 * :<realname> - supply your user details",
    "PRIVMSG <target>[,<target>] :<text> - message a user or a channel",
    "JOIN <#channel>[,<#channel>] [<key>[,<key>]] - join or create channels",
    "PART <#channel>[,<#channel>] [:<reason>] - leave channels",
    "TOPIC <#channel> [:<text>] - show or set a channel topic",
    "MODE <#channel> <flags> [<args>] - change channel modes (+i +t +k +o +l)",
    "KICK <#channel> <nick> [:<reason>] - remove a user from a channel",
    "INVITE <nick> <#channel> - invite a user to a channel",
    "CHANNELS - list the channels you are in",
    "PING :<token> - check that the server is alive",
    "HELP - this listing",
    "QUIT [:<reason>] - disconnect",
];

pub fn help(state: &mut ServerState, fd: RawFd, _msg: &Message) -> Action {
    send_help(state, fd);
    Action::Continue
}

/// The full help burst: `704`, one `705` per command, `706`.
///
/// Also sent right after the `001` welcome.
pub fn send_help(state: &mut ServerState, fd: RawFd) {
    state.send_numeric(fd, Response::RPL_HELPSTART, vec![], None);
    for topic in HELP_TOPICS {
        state.send_numeric(fd, Response::RPL_HELPTXT, vec![], Some((*topic).to_owned()));
    }
    state.send_numeric(fd, Response::RPL_ENDOFHELP, vec![], None);
}

pub fn channels(state: &mut ServerState, fd: RawFd, _msg: &Message) -> Action {
    let listing = state.channels_of(fd).join(" ");
    state.send_numeric(fd, Response::RPL_WHOISCHANNELS, vec![], Some(listing));
    Action::Continue
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

    #[test]
    fn test_help_burst_shape() {
        let mut state = state();
        let (alice, _p) = add_registered(&mut state, "alice");

        dispatch(&mut state, alice, &msg("HELP"));
        let out = sent(&state, alice);
        assert!(out.contains("704 alice"));
        assert_eq!(out.matches("705 alice").count(), HELP_TOPICS.len());
        assert!(out.contains("706 alice :End of /HELP"));
    }

    #[test]
    fn test_channels_lists_memberships() {
        let mut state = state();
        let (alice, _p) = add_registered(&mut state, "alice");

        for name in ["beta", "alpha"] {
            let mut chan = Channel::new(name);
            chan.add_member(alice);
            state.channels.insert(name.to_owned(), chan);
        }

        dispatch(&mut state, alice, &msg("CHANNELS"));
        assert!(sent(&state, alice).contains("319 alice :#alpha #beta"));
    }

    #[test]
    fn test_channels_empty() {
        let mut state = state();
        let (alice, _p) = add_registered(&mut state, "alice");

        dispatch(&mut state, alice, &msg("CHANNELS"));
        assert!(sent(&state, alice).contains("319 alice :"));
    }
}
