//! Channel state.
//!
//! A channel holds fd handles into the server's client table, never client
//! data itself. Lookups go through the table; removal from the table is
//! always preceded by removal from every channel.

use std::collections::HashSet;
use std::os::fd::RawFd;

/// One chat room. Keyed in the channel table by its name with the leading
/// `#` stripped; `name` here is the bare key.
#[derive(Debug)]
pub struct Channel {
    name: String,
    /// Topic text; empty means no topic is set.
    pub topic: String,
    /// Join key (+k) when set.
    pub key: Option<String>,
    /// Invite-only flag (+i).
    pub invite_only: bool,
    /// Topic settable by operators only (+t).
    pub topic_restricted: bool,
    /// Member limit (+l) when set.
    pub limit: Option<usize>,
    members: HashSet<RawFd>,
    operators: HashSet<RawFd>,
    invited: HashSet<RawFd>,
}

impl Channel {
    /// Create an empty channel. The caller is expected to add the founding
    /// member immediately; empty channels are never kept in the table.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            topic: String::new(),
            key: None,
            invite_only: false,
            topic_restricted: false,
            limit: None,
            members: HashSet::new(),
            operators: HashSet::new(),
            invited: HashSet::new(),
        }
    }

    /// Bare channel name (no `#`).
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Display name with the `#` prefix.
    pub fn display_name(&self) -> String {
        format!("#{}", self.name)
    }

    pub fn is_member(&self, fd: RawFd) -> bool {
        self.members.contains(&fd)
    }

    pub fn is_operator(&self, fd: RawFd) -> bool {
        self.operators.contains(&fd)
    }

    pub fn is_invited(&self, fd: RawFd) -> bool {
        self.invited.contains(&fd)
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    pub fn member_count(&self) -> usize {
        self.members.len()
    }

    /// Member fds in unspecified order.
    pub fn members(&self) -> impl Iterator<Item = RawFd> + '_ {
        self.members.iter().copied()
    }

    pub fn add_member(&mut self, fd: RawFd) {
        self.members.insert(fd);
        self.invited.remove(&fd);
    }

    /// Remove a member, dropping any operator status and pending invite.
    pub fn remove_member(&mut self, fd: RawFd) {
        self.members.remove(&fd);
        self.operators.remove(&fd);
        self.invited.remove(&fd);
    }

    /// Grant operator status. Only meaningful for members; enforced here
    /// to keep the operator-subset invariant unconditional.
    pub fn grant_operator(&mut self, fd: RawFd) {
        if self.members.contains(&fd) {
            self.operators.insert(fd);
        }
    }

    pub fn revoke_operator(&mut self, fd: RawFd) {
        self.operators.remove(&fd);
    }

    pub fn add_invite(&mut self, fd: RawFd) {
        self.invited.insert(fd);
    }
}
