//! IRC numeric replies.
//!
//! The subset of RFC 1459 numerics this server emits, plus the ratified
//! HELP numerics (704–706). Codes are formatted as three digits on the
//! wire, so `RPL_WELCOME` renders as `001`.

#![allow(non_camel_case_types)]

/// A numeric reply code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u16)]
pub enum Response {
    /// 001 - Welcome to the network
    RPL_WELCOME = 1,
    /// 319 - Channels a user is on
    RPL_WHOISCHANNELS = 319,
    /// 331 - No topic is set
    RPL_NOTOPIC = 331,
    /// 332 - Channel topic
    RPL_TOPIC = 332,
    /// 341 - Invite confirmation to the inviter
    RPL_INVITING = 341,
    /// 353 - Names list
    RPL_NAMREPLY = 353,
    /// 366 - End of names list
    RPL_ENDOFNAMES = 366,
    /// 401 - No such nick
    ERR_NOSUCHNICK = 401,
    /// 403 - No such channel
    ERR_NOSUCHCHANNEL = 403,
    /// 404 - Cannot send to channel
    ERR_CANNOTSENDTOCHAN = 404,
    /// 411 - No recipient given
    ERR_NORECIPIENT = 411,
    /// 421 - Unknown command
    ERR_UNKNOWNCOMMAND = 421,
    /// 431 - No nickname given
    ERR_NONICKNAMEGIVEN = 431,
    /// 432 - Erroneous nickname
    ERR_ERRONEUSNICKNAME = 432,
    /// 433 - Nickname is already in use
    ERR_NICKNAMEINUSE = 433,
    /// 441 - They aren't on that channel
    ERR_USERNOTINCHANNEL = 441,
    /// 442 - You're not on that channel
    ERR_NOTONCHANNEL = 442,
    /// 443 - User is already on channel
    ERR_USERONCHANNEL = 443,
    /// 451 - You have not registered
    ERR_NOTREGISTERED = 451,
    /// 461 - Not enough parameters
    ERR_NEEDMOREPARAMS = 461,
    /// 462 - You may not reregister
    ERR_ALREADYREGISTRED = 462,
    /// 464 - Password incorrect
    ERR_PASSWDMISMATCH = 464,
    /// 471 - Cannot join channel (+l)
    ERR_CHANNELISFULL = 471,
    /// 472 - Unknown mode character
    ERR_UNKNOWNMODE = 472,
    /// 473 - Cannot join channel (+i)
    ERR_INVITEONLYCHAN = 473,
    /// 475 - Cannot join channel (+k)
    ERR_BADCHANNELKEY = 475,
    /// 476 - Bad channel name
    ERR_BADCHANMASK = 476,
    /// 482 - You're not channel operator
    ERR_CHANOPRIVSNEEDED = 482,
    /// 704 - Start of help
    RPL_HELPSTART = 704,
    /// 705 - Help text
    RPL_HELPTXT = 705,
    /// 706 - End of help
    RPL_ENDOFHELP = 706,
}

impl Response {
    /// The numeric code.
    pub fn code(&self) -> u16 {
        *self as u16
    }

    /// Whether this is an error numeric (4xx/5xx).
    pub fn is_error(&self) -> bool {
        (400..600).contains(&self.code())
    }

    /// The conventional reply text, used when the caller has nothing more
    /// specific to say.
    pub fn default_text(&self) -> &'static str {
        match self {
            Response::RPL_WELCOME => "Welcome to the Internet Relay Network",
            Response::RPL_WHOISCHANNELS => "",
            Response::RPL_NOTOPIC => "No topic is set",
            Response::RPL_TOPIC => "",
            Response::RPL_INVITING => "",
            Response::RPL_NAMREPLY => "",
            Response::RPL_ENDOFNAMES => "End of /NAMES list",
            Response::ERR_NOSUCHNICK => "No such nick",
            Response::ERR_NOSUCHCHANNEL => "No such channel",
            Response::ERR_CANNOTSENDTOCHAN => "Cannot send to channel",
            Response::ERR_NORECIPIENT => "No recipient given",
            Response::ERR_UNKNOWNCOMMAND => "Unknown command",
            Response::ERR_NONICKNAMEGIVEN => "No nickname given",
            Response::ERR_ERRONEUSNICKNAME => "Erroneous nickname",
            Response::ERR_NICKNAMEINUSE => "Nickname is already in use",
            Response::ERR_USERNOTINCHANNEL => "They aren't on that channel",
            Response::ERR_NOTONCHANNEL => "You're not on that channel",
            Response::ERR_USERONCHANNEL => "is already on channel",
            Response::ERR_NOTREGISTERED => "You have not registered",
            Response::ERR_NEEDMOREPARAMS => "Not enough parameters",
            Response::ERR_ALREADYREGISTRED => "You may not reregister",
            Response::ERR_PASSWDMISMATCH => "Password incorrect",
            Response::ERR_CHANNELISFULL => "Cannot join channel (+l)",
            Response::ERR_UNKNOWNMODE => "is unknown mode char to me",
            Response::ERR_INVITEONLYCHAN => "Cannot join channel (+i)",
            Response::ERR_BADCHANNELKEY => "Cannot join, bad key",
            Response::ERR_BADCHANMASK => "Bad channel name",
            Response::ERR_CHANOPRIVSNEEDED => "You're not channel operator",
            Response::RPL_HELPSTART => "Help topics",
            Response::RPL_HELPTXT => "",
            Response::RPL_ENDOFHELP => "End of /HELP",
        }
    }
}
