//! Shared reply construction.
//!
//! Every server-originated line goes through one of these builders so the
//! prefix and numeric formats stay uniform: numerics are
//! `:<host> <code> <nick> <params…> :<text>`, notices are
//! `:<host> NOTICE <target> :<text>`.

use pirc_proto::{Message, Response};

/// Build a numeric reply.
///
/// `nick` is the reply target (`*` for unregistered connections),
/// `middles` go between it and the trailing text, and `text` overrides
/// the numeric's default wording when given.
pub fn server_reply(
    host: &str,
    nick: &str,
    response: Response,
    middles: Vec<String>,
    text: Option<String>,
) -> Message {
    let mut params = Vec::with_capacity(middles.len() + 2);
    params.push(nick.to_owned());
    params.extend(middles);
    params.push(text.unwrap_or_else(|| response.default_text().to_owned()));
    Message::new(Some(host), format!("{:03}", response.code()), params)
}

/// Build a server NOTICE.
pub fn server_notice(host: &str, target: &str, text: &str) -> Message {
    Message::notice(target, text).with_prefix(host)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_numeric_format() {
        let msg = server_reply(
            "irc.test",
            "alice",
            Response::ERR_NICKNAMEINUSE,
            vec!["bob".to_owned()],
            None,
        );
        assert_eq!(
            msg.to_string(),
            ":irc.test 433 alice bob :Nickname is already in use"
        );
    }

    #[test]
    fn test_code_is_zero_padded() {
        let msg = server_reply("irc.test", "alice", Response::RPL_WELCOME, vec![], None);
        assert!(msg.to_string().starts_with(":irc.test 001 alice :"));
    }

    #[test]
    fn test_text_override() {
        let msg = server_reply(
            "irc.test",
            "*",
            Response::RPL_WELCOME,
            vec![],
            Some("Welcome alice".to_owned()),
        );
        assert_eq!(msg.to_string(), ":irc.test 001 * :Welcome alice");
    }

    #[test]
    fn test_notice_format() {
        let msg = server_notice("irc.test", "*", "hello");
        assert_eq!(msg.to_string(), ":irc.test NOTICE * :hello");
    }
}
