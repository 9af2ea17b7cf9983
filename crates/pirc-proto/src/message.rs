//! IRC message model: parsing and serialization.
//!
//! A [`Message`] is the parsed form of one framed line: an optional source
//! prefix, a command verb, and an ordered parameter list. The model is
//! deliberately untyped — the dispatcher keys on the uppercased verb — and
//! symmetric: serializing a message and parsing it back recovers the same
//! `(prefix, command, params)` triple.

use std::fmt;

/// One parsed IRC message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message {
    /// Source prefix without the leading `:`, e.g. `alice@irc.example`.
    pub prefix: Option<String>,
    /// Command verb as received. Comparison is case-insensitive; callers
    /// uppercase before matching.
    pub command: String,
    /// Middle parameters followed by at most one trailing parameter.
    pub params: Vec<String>,
}

impl Message {
    /// Build a message from raw parts.
    pub fn new(
        prefix: Option<&str>,
        command: impl Into<String>,
        params: Vec<String>,
    ) -> Self {
        Self {
            prefix: prefix.map(str::to_owned),
            command: command.into(),
            params,
        }
    }

    /// Parse one framed line.
    ///
    /// Grammar: `[:prefix ] <command> [params…] [:trailing]`. Middles are
    /// separated by runs of spaces; everything after ` :` is a single
    /// trailing parameter, spaces included. An empty line parses to an
    /// empty command, which dispatchers treat as a no-op.
    pub fn parse(line: &str) -> Self {
        let mut rest = line;
        let mut prefix = None;

        if let Some(after) = rest.strip_prefix(':') {
            match after.split_once(' ') {
                Some((p, tail)) => {
                    prefix = Some(p.to_owned());
                    rest = tail;
                }
                None => {
                    // A bare prefix with no command.
                    return Self {
                        prefix: Some(after.to_owned()),
                        command: String::new(),
                        params: Vec::new(),
                    };
                }
            }
        }

        let rest = rest.trim_start_matches(' ');
        let (command, mut rest) = match rest.split_once(' ') {
            Some((c, tail)) => (c.to_owned(), tail),
            None => (rest.to_owned(), ""),
        };

        let mut params = Vec::new();
        loop {
            rest = rest.trim_start_matches(' ');
            if rest.is_empty() {
                break;
            }
            if let Some(trailing) = rest.strip_prefix(':') {
                params.push(trailing.to_owned());
                break;
            }
            match rest.split_once(' ') {
                Some((tok, tail)) => {
                    params.push(tok.to_owned());
                    rest = tail;
                }
                None => {
                    params.push(rest.to_owned());
                    break;
                }
            }
        }

        Self {
            prefix,
            command,
            params,
        }
    }

    /// Uppercased verb, for dispatch.
    pub fn verb(&self) -> String {
        self.command.to_ascii_uppercase()
    }

    /// Set the source prefix, builder-style.
    #[must_use]
    pub fn with_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.prefix = Some(prefix.into());
        self
    }

    /// Create a PRIVMSG to a target.
    pub fn privmsg(target: impl Into<String>, text: impl Into<String>) -> Self {
        Self::new(None, "PRIVMSG", vec![target.into(), text.into()])
    }

    /// Create a NOTICE to a target.
    pub fn notice(target: impl Into<String>, text: impl Into<String>) -> Self {
        Self::new(None, "NOTICE", vec![target.into(), text.into()])
    }

    /// Create a JOIN for a channel.
    pub fn join(channel: impl Into<String>) -> Self {
        Self::new(None, "JOIN", vec![channel.into()])
    }

    /// Create a PART, with an optional reason.
    pub fn part(channel: impl Into<String>, reason: Option<&str>) -> Self {
        let mut params = vec![channel.into()];
        if let Some(reason) = reason {
            params.push(reason.to_owned());
        }
        Self::new(None, "PART", params)
    }

    /// Create a QUIT relay with a reason.
    pub fn quit(reason: impl Into<String>) -> Self {
        Self::new(None, "QUIT", vec![reason.into()])
    }

    /// Create a NICK change relay.
    pub fn nick(new_nick: impl Into<String>) -> Self {
        Self::new(None, "NICK", vec![new_nick.into()])
    }

    /// Create a KICK, with an optional reason.
    pub fn kick(
        channel: impl Into<String>,
        target: impl Into<String>,
        reason: Option<&str>,
    ) -> Self {
        let mut params = vec![channel.into(), target.into()];
        if let Some(reason) = reason {
            params.push(reason.to_owned());
        }
        Self::new(None, "KICK", params)
    }

    /// Create an INVITE relay.
    pub fn invite(nick: impl Into<String>, channel: impl Into<String>) -> Self {
        Self::new(None, "INVITE", vec![nick.into(), channel.into()])
    }

    /// Create a TOPIC change relay.
    pub fn topic(channel: impl Into<String>, text: impl Into<String>) -> Self {
        Self::new(None, "TOPIC", vec![channel.into(), text.into()])
    }

    /// Create a MODE change relay.
    pub fn mode(channel: impl Into<String>, params: Vec<String>) -> Self {
        let mut all = vec![channel.into()];
        all.extend(params);
        Self::new(None, "MODE", all)
    }

    /// Create a PONG reply carrying the PING token.
    pub fn pong(token: impl Into<String>) -> Self {
        Self::new(None, "PONG", vec![token.into()])
    }
}

impl fmt::Display for Message {
    /// Serialize without the line terminator.
    ///
    /// The final parameter is always rendered as a trailing `:param`:
    /// this keeps the round trip lossless for parameters containing
    /// spaces (or nothing at all), and is what every reply and relay in
    /// the server wants anyway.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(prefix) = &self.prefix {
            write!(f, ":{} ", prefix)?;
        }
        f.write_str(&self.command)?;
        if let Some((trailing, middles)) = self.params.split_last() {
            for middle in middles {
                write!(f, " {}", middle)?;
            }
            write!(f, " :{}", trailing)?;
        }
        Ok(())
    }
}
