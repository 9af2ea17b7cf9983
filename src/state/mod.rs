//! Server state: the client and channel tables.
//!
//! Both tables are owned by the event loop and mutated only on its thread.
//! Channels refer to clients by fd; every removal path goes through
//! [`ServerState::drop_from_channels`] before the client leaves the table,
//! which is what keeps the membership invariants single-step.

mod channel;
mod client;

pub use channel::Channel;
pub use client::{Client, ReadOutcome};

use std::collections::HashMap;
use std::os::fd::RawFd;

use pirc_proto::{Message, Response};
use tracing::debug;

use crate::config::Config;
use crate::handlers::helpers::server_reply;

/// The mutable heart of the server: configuration plus the two tables.
#[derive(Debug)]
pub struct ServerState {
    pub config: Config,
    /// Live clients, keyed by fd.
    pub clients: HashMap<RawFd, Client>,
    /// Active channels, keyed by name without the leading `#`.
    pub channels: HashMap<String, Channel>,
}

impl ServerState {
    pub fn new(config: Config) -> Self {
        Self {
            config,
            clients: HashMap::new(),
            channels: HashMap::new(),
        }
    }

    /// The server hostname used in reply prefixes.
    pub fn host(&self) -> &str {
        &self.config.host
    }

    /// Nick of a live client, `*` if unset or unknown.
    pub fn nick_of(&self, fd: RawFd) -> &str {
        self.clients
            .get(&fd)
            .map(Client::nick_or_star)
            .unwrap_or("*")
    }

    /// The `nick@host` source prefix for messages relayed from this client.
    pub fn user_prefix(&self, fd: RawFd) -> String {
        format!("{}@{}", self.nick_of(fd), self.config.host)
    }

    /// Whether any live client other than `except` holds this nick.
    pub fn nick_in_use(&self, nick: &str, except: RawFd) -> bool {
        self.clients
            .iter()
            .any(|(&fd, c)| fd != except && c.nick.as_deref() == Some(nick))
    }

    /// Resolve a nick to its fd.
    pub fn find_by_nick(&self, nick: &str) -> Option<RawFd> {
        self.clients
            .iter()
            .find(|(_, c)| c.nick.as_deref() == Some(nick))
            .map(|(&fd, _)| fd)
    }

    /// Display names (`#name`) of the channels this client is in, sorted.
    pub fn channels_of(&self, fd: RawFd) -> Vec<String> {
        let mut names: Vec<String> = self
            .channels
            .values()
            .filter(|c| c.is_member(fd))
            .map(Channel::display_name)
            .collect();
        names.sort();
        names
    }

    /// Queue one message for a client.
    pub fn send_to(&mut self, fd: RawFd, msg: &Message) {
        if let Some(client) = self.clients.get_mut(&fd) {
            client.queue_line(&msg.to_string());
        }
    }

    /// Queue a numeric reply for a client. `middles` go between the
    /// client's nick and the trailing text; `text` overrides the numeric's
    /// default wording.
    pub fn send_numeric(
        &mut self,
        fd: RawFd,
        response: Response,
        middles: Vec<String>,
        text: Option<String>,
    ) {
        let reply = server_reply(
            self.host(),
            self.nick_of(fd),
            response,
            middles,
            text,
        );
        self.send_to(fd, &reply);
    }

    /// Shorthand for `461` with the offending command as the middle param.
    pub fn need_more_params(&mut self, fd: RawFd, command: &str) {
        self.send_numeric(
            fd,
            Response::ERR_NEEDMOREPARAMS,
            vec![command.to_owned()],
            None,
        );
    }

    /// Queue a message for every member of a channel, optionally skipping
    /// one fd (usually the sender).
    pub fn broadcast_channel(&mut self, chan_key: &str, msg: &Message, skip: Option<RawFd>) {
        let members: Vec<RawFd> = match self.channels.get(chan_key) {
            Some(chan) => chan.members().filter(|&fd| Some(fd) != skip).collect(),
            None => return,
        };
        for fd in members {
            self.send_to(fd, msg);
        }
    }

    /// Queue a message for every live client except one.
    pub fn broadcast_all(&mut self, msg: &Message, skip: RawFd) {
        let fds: Vec<RawFd> = self.clients.keys().copied().filter(|&fd| fd != skip).collect();
        for fd in fds {
            self.send_to(fd, msg);
        }
    }

    /// Remove a client from every channel, destroying channels this
    /// empties. Must run before the client leaves the table.
    pub fn drop_from_channels(&mut self, fd: RawFd) {
        let mut emptied = Vec::new();
        for (key, chan) in self.channels.iter_mut() {
            chan.remove_member(fd);
            if chan.is_empty() {
                emptied.push(key.clone());
            }
        }
        for key in emptied {
            self.channels.remove(&key);
            debug!(channel = %key, "channel destroyed");
        }
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    //! Helpers for exercising handlers against real (loopback) sockets
    //! without an event loop.

    use super::*;

    /// A state with no clients, a `secret` password and `irc.test` host.
    pub fn state() -> ServerState {
        ServerState::new(Config::new(6667, "secret", "irc.test"))
    }

    /// Attach a fresh unregistered client; returns its fd and the peer
    /// socket (kept open so reads/writes behave).
    pub fn add_client(state: &mut ServerState) -> (RawFd, std::net::TcpStream) {
        let (client, peer) = super::client::test_pair();
        let fd = client.fd();
        state.clients.insert(fd, client);
        (fd, peer)
    }

    /// Attach a fully registered client with the given nick.
    pub fn add_registered(state: &mut ServerState, nick: &str) -> (RawFd, std::net::TcpStream) {
        let (fd, peer) = add_client(state);
        let client = state.clients.get_mut(&fd).unwrap();
        client.pass_ok = true;
        client.nick_ok = true;
        client.user_ok = true;
        client.registered = true;
        client.nick = Some(nick.to_owned());
        client.user = Some(nick.to_owned());
        client.realname = Some(nick.to_owned());
        (fd, peer)
    }

    /// Everything queued for this client so far, as text.
    pub fn sent(state: &ServerState, fd: RawFd) -> String {
        String::from_utf8_lossy(&state.clients[&fd].send_buf).into_owned()
    }

    /// Drop queued output so the next assertion starts clean.
    pub fn clear_sent(state: &mut ServerState, fd: RawFd) {
        state.clients.get_mut(&fd).unwrap().send_buf.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::test_support::*;
    use super::*;

    #[test]
    fn test_nick_lookup_and_uniqueness() {
        let mut state = state();
        let (alice, _p1) = add_registered(&mut state, "alice");
        let (bob, _p2) = add_registered(&mut state, "bob");

        assert_eq!(state.find_by_nick("alice"), Some(alice));
        assert_eq!(state.find_by_nick("bob"), Some(bob));
        assert_eq!(state.find_by_nick("carol"), None);

        assert!(state.nick_in_use("alice", bob));
        // A client never collides with itself.
        assert!(!state.nick_in_use("alice", alice));
    }

    #[test]
    fn test_drop_from_channels_destroys_empty() {
        let mut state = state();
        let (alice, _p1) = add_registered(&mut state, "alice");
        let (bob, _p2) = add_registered(&mut state, "bob");

        let mut chan = Channel::new("rust");
        chan.add_member(alice);
        chan.add_member(bob);
        chan.grant_operator(alice);
        state.channels.insert("rust".to_owned(), chan);

        state.drop_from_channels(alice);
        assert!(state.channels.contains_key("rust"));
        assert!(!state.channels["rust"].is_member(alice));
        assert!(!state.channels["rust"].is_operator(alice));

        state.drop_from_channels(bob);
        assert!(!state.channels.contains_key("rust"));
    }

    #[test]
    fn test_broadcast_channel_skips_sender() {
        let mut state = state();
        let (alice, _p1) = add_registered(&mut state, "alice");
        let (bob, _p2) = add_registered(&mut state, "bob");

        let mut chan = Channel::new("rust");
        chan.add_member(alice);
        chan.add_member(bob);
        state.channels.insert("rust".to_owned(), chan);

        let msg = Message::privmsg("#rust", "hi").with_prefix(state.user_prefix(alice));
        state.broadcast_channel("rust", &msg, Some(alice));

        assert!(sent(&state, bob).contains("PRIVMSG #rust :hi"));
        assert!(sent(&state, alice).is_empty());
    }

    #[test]
    fn test_channels_of_is_sorted() {
        let mut state = state();
        let (alice, _p1) = add_registered(&mut state, "alice");

        for name in ["zebra", "alpha", "mid"] {
            let mut chan = Channel::new(name);
            chan.add_member(alice);
            state.channels.insert(name.to_owned(), chan);
        }
        assert_eq!(state.channels_of(alice), vec!["#alpha", "#mid", "#zebra"]);
    }
}
