//! Channel membership and administration: JOIN, PART, KICK, INVITE,
//! TOPIC, MODE.

use std::os::fd::RawFd;

use pirc_proto::{ChannelExt, Message, Response};
use tracing::{debug, info};

use super::Action;
use crate::state::{Channel, ServerState};

pub fn join(state: &mut ServerState, fd: RawFd, msg: &Message) -> Action {
    if msg.params.is_empty() {
        state.need_more_params(fd, "JOIN");
        return Action::Continue;
    }

    let names = msg.params[0].clone();
    let keys: Vec<String> = msg
        .params
        .get(1)
        .map(|k| k.split(',').map(str::to_owned).collect())
        .unwrap_or_default();

    for (i, name) in names.split(',').enumerate() {
        if name.is_empty() {
            continue;
        }
        if !name.is_channel_name() {
            state.send_numeric(fd, Response::ERR_BADCHANMASK, vec![name.to_owned()], None);
            continue;
        }
        join_one(state, fd, name, keys.get(i).map(String::as_str));
    }
    Action::Continue
}

fn join_one(state: &mut ServerState, fd: RawFd, name: &str, key: Option<&str>) {
    let chan_key = name.channel_key().to_owned();

    let created = match state.channels.get(&chan_key) {
        Some(chan) => {
            if chan.is_member(fd) {
                return;
            }
            if let Some(required) = &chan.key {
                if key != Some(required.as_str()) {
                    state.send_numeric(
                        fd,
                        Response::ERR_BADCHANNELKEY,
                        vec![name.to_owned()],
                        None,
                    );
                    return;
                }
            }
            if chan.invite_only && !chan.is_invited(fd) {
                state.send_numeric(
                    fd,
                    Response::ERR_INVITEONLYCHAN,
                    vec![name.to_owned()],
                    None,
                );
                return;
            }
            if let Some(limit) = chan.limit {
                if chan.member_count() >= limit {
                    state.send_numeric(
                        fd,
                        Response::ERR_CHANNELISFULL,
                        vec![name.to_owned()],
                        None,
                    );
                    return;
                }
            }
            false
        }
        None => {
            state
                .channels
                .insert(chan_key.clone(), Channel::new(chan_key.clone()));
            true
        }
    };

    if let Some(chan) = state.channels.get_mut(&chan_key) {
        chan.add_member(fd);
        if created {
            // The founding joiner runs the channel.
            chan.grant_operator(fd);
        }
    }

    let nick = state.nick_of(fd).to_owned();
    info!(fd, nick = %nick, channel = %name, created, "join");

    // Echo to the joiner and announce to everyone already there.
    let join_relay = Message::join(name).with_prefix(state.user_prefix(fd));
    state.broadcast_channel(&chan_key, &join_relay, None);

    if created {
        let op_grant = Message::mode(name, vec!["+o".to_owned(), nick])
            .with_prefix(state.config.host.clone());
        state.broadcast_channel(&chan_key, &op_grant, None);
    }

    send_topic_reply(state, fd, name, &chan_key);
    send_names_reply(state, fd, name, &chan_key);
}

pub fn part(state: &mut ServerState, fd: RawFd, msg: &Message) -> Action {
    if msg.params.is_empty() {
        state.need_more_params(fd, "PART");
        return Action::Continue;
    }

    let names = msg.params[0].clone();
    let reason = msg.params.get(1).cloned();

    for name in names.split(',').filter(|n| !n.is_empty()) {
        part_one(state, fd, name, reason.as_deref());
    }
    Action::Continue
}

fn part_one(state: &mut ServerState, fd: RawFd, name: &str, reason: Option<&str>) {
    let chan_key = name.channel_key().to_owned();
    match state.channels.get(&chan_key) {
        None => {
            state.send_numeric(fd, Response::ERR_NOSUCHCHANNEL, vec![name.to_owned()], None);
            return;
        }
        Some(chan) if !chan.is_member(fd) => {
            state.send_numeric(fd, Response::ERR_NOTONCHANNEL, vec![name.to_owned()], None);
            return;
        }
        Some(_) => {}
    }

    // Everyone, including the parting client, sees the PART.
    let relay = Message::part(name, reason).with_prefix(state.user_prefix(fd));
    state.broadcast_channel(&chan_key, &relay, None);

    remove_member(state, fd, &chan_key);
    debug!(fd, channel = %name, "part");
}

pub fn kick(state: &mut ServerState, fd: RawFd, msg: &Message) -> Action {
    if msg.params.len() < 2 {
        state.need_more_params(fd, "KICK");
        return Action::Continue;
    }

    let name = msg.params[0].clone();
    let target_nick = msg.params[1].clone();
    let chan_key = name.channel_key().to_owned();

    match state.channels.get(&chan_key) {
        None => {
            state.send_numeric(fd, Response::ERR_NOSUCHCHANNEL, vec![name], None);
            return Action::Continue;
        }
        Some(chan) if !chan.is_member(fd) => {
            state.send_numeric(fd, Response::ERR_NOTONCHANNEL, vec![name], None);
            return Action::Continue;
        }
        Some(chan) if !chan.is_operator(fd) => {
            state.send_numeric(fd, Response::ERR_CHANOPRIVSNEEDED, vec![name], None);
            return Action::Continue;
        }
        Some(_) => {}
    }

    let target = state
        .find_by_nick(&target_nick)
        .filter(|&t| state.channels[&chan_key].is_member(t));
    let Some(target) = target else {
        state.send_numeric(
            fd,
            Response::ERR_USERNOTINCHANNEL,
            vec![target_nick, name],
            None,
        );
        return Action::Continue;
    };

    let reason = msg
        .params
        .get(2)
        .cloned()
        .unwrap_or_else(|| state.nick_of(fd).to_owned());

    info!(fd, channel = %name, target = %target_nick, "kick");
    let relay = Message::kick(&name, &target_nick, Some(reason.as_str()))
        .with_prefix(state.user_prefix(fd));
    state.broadcast_channel(&chan_key, &relay, None);

    remove_member(state, target, &chan_key);
    Action::Continue
}

pub fn invite(state: &mut ServerState, fd: RawFd, msg: &Message) -> Action {
    if msg.params.len() < 2 {
        state.need_more_params(fd, "INVITE");
        return Action::Continue;
    }

    let target_nick = msg.params[0].clone();
    let name = msg.params[1].clone();
    let chan_key = name.channel_key().to_owned();

    match state.channels.get(&chan_key) {
        None => {
            state.send_numeric(fd, Response::ERR_NOSUCHCHANNEL, vec![name], None);
            return Action::Continue;
        }
        Some(chan) if !chan.is_member(fd) => {
            state.send_numeric(fd, Response::ERR_NOTONCHANNEL, vec![name], None);
            return Action::Continue;
        }
        Some(chan) if !chan.is_operator(fd) => {
            state.send_numeric(fd, Response::ERR_CHANOPRIVSNEEDED, vec![name], None);
            return Action::Continue;
        }
        Some(_) => {}
    }

    let Some(target) = state.find_by_nick(&target_nick) else {
        state.send_numeric(fd, Response::ERR_NOSUCHNICK, vec![target_nick], None);
        return Action::Continue;
    };
    if state.channels[&chan_key].is_member(target) {
        state.send_numeric(
            fd,
            Response::ERR_USERONCHANNEL,
            vec![target_nick, name],
            None,
        );
        return Action::Continue;
    }

    if let Some(chan) = state.channels.get_mut(&chan_key) {
        chan.add_invite(target);
    }
    info!(fd, channel = %name, target = %target_nick, "invite");

    let relay = Message::invite(&target_nick, &name).with_prefix(state.user_prefix(fd));
    state.send_to(target, &relay);
    state.send_numeric(
        fd,
        Response::RPL_INVITING,
        vec![target_nick],
        Some(name),
    );
    Action::Continue
}

pub fn topic(state: &mut ServerState, fd: RawFd, msg: &Message) -> Action {
    if msg.params.is_empty() {
        state.need_more_params(fd, "TOPIC");
        return Action::Continue;
    }

    let name = msg.params[0].clone();
    let chan_key = name.channel_key().to_owned();

    match state.channels.get(&chan_key) {
        None => {
            state.send_numeric(fd, Response::ERR_NOSUCHCHANNEL, vec![name], None);
            return Action::Continue;
        }
        Some(chan) if !chan.is_member(fd) => {
            state.send_numeric(fd, Response::ERR_NOTONCHANNEL, vec![name], None);
            return Action::Continue;
        }
        Some(_) => {}
    }

    let Some(new_topic) = msg.params.get(1).cloned() else {
        send_topic_reply(state, fd, &name, &chan_key);
        return Action::Continue;
    };

    // Setting is gated on operator status only for +t channels.
    let chan = &state.channels[&chan_key];
    if chan.topic_restricted && !chan.is_operator(fd) {
        state.send_numeric(fd, Response::ERR_CHANOPRIVSNEEDED, vec![name], None);
        return Action::Continue;
    }

    if let Some(chan) = state.channels.get_mut(&chan_key) {
        chan.topic = new_topic.clone();
    }
    debug!(fd, channel = %name, "topic changed");

    let relay = Message::topic(&name, &new_topic).with_prefix(state.user_prefix(fd));
    state.broadcast_channel(&chan_key, &relay, None);
    Action::Continue
}

pub fn mode(state: &mut ServerState, fd: RawFd, msg: &Message) -> Action {
    if msg.params.len() < 2 {
        state.need_more_params(fd, "MODE");
        return Action::Continue;
    }

    let name = msg.params[0].clone();
    let chan_key = name.channel_key().to_owned();

    match state.channels.get(&chan_key) {
        None => {
            state.send_numeric(fd, Response::ERR_NOSUCHCHANNEL, vec![name], None);
            return Action::Continue;
        }
        Some(chan) if !chan.is_member(fd) => {
            state.send_numeric(fd, Response::ERR_NOTONCHANNEL, vec![name], None);
            return Action::Continue;
        }
        Some(chan) if !chan.is_operator(fd) => {
            state.send_numeric(fd, Response::ERR_CHANOPRIVSNEEDED, vec![name], None);
            return Action::Continue;
        }
        Some(_) => {}
    }

    let flags = msg.params[1].clone();
    let mut args = msg.params[2..].iter();

    let mut adding = true;
    let mut applied = String::new();
    let mut applied_args: Vec<String> = Vec::new();
    let mut last_sign = '\0';

    // Flags are applied left to right, each consuming zero or one
    // argument; the applied set is rebroadcast as a single MODE line.
    for flag in flags.chars() {
        match flag {
            '+' => adding = true,
            '-' => adding = false,
            'i' => {
                if let Some(chan) = state.channels.get_mut(&chan_key) {
                    chan.invite_only = adding;
                }
                push_flag(&mut applied, &mut last_sign, adding, 'i');
            }
            't' => {
                if let Some(chan) = state.channels.get_mut(&chan_key) {
                    chan.topic_restricted = adding;
                }
                push_flag(&mut applied, &mut last_sign, adding, 't');
            }
            'k' => {
                if adding {
                    let Some(arg) = args.next() else {
                        state.need_more_params(fd, "MODE");
                        break;
                    };
                    if let Some(chan) = state.channels.get_mut(&chan_key) {
                        chan.key = Some(arg.clone());
                    }
                    push_flag(&mut applied, &mut last_sign, adding, 'k');
                    applied_args.push(arg.clone());
                } else {
                    if let Some(chan) = state.channels.get_mut(&chan_key) {
                        chan.key = None;
                    }
                    push_flag(&mut applied, &mut last_sign, adding, 'k');
                }
            }
            'l' => {
                if adding {
                    let Some(arg) = args.next() else {
                        state.need_more_params(fd, "MODE");
                        break;
                    };
                    let Ok(limit) = arg.parse::<usize>() else {
                        state.need_more_params(fd, "MODE");
                        break;
                    };
                    if let Some(chan) = state.channels.get_mut(&chan_key) {
                        chan.limit = Some(limit);
                    }
                    push_flag(&mut applied, &mut last_sign, adding, 'l');
                    applied_args.push(arg.clone());
                } else if let Some(chan) = state.channels.get_mut(&chan_key) {
                    chan.limit = None;
                    push_flag(&mut applied, &mut last_sign, adding, 'l');
                }
            }
            'o' => {
                let Some(arg) = args.next() else {
                    state.need_more_params(fd, "MODE");
                    break;
                };
                let target = state
                    .find_by_nick(arg)
                    .filter(|&t| state.channels[&chan_key].is_member(t));
                let Some(target) = target else {
                    state.send_numeric(
                        fd,
                        Response::ERR_USERNOTINCHANNEL,
                        vec![arg.clone(), name.clone()],
                        None,
                    );
                    continue;
                };
                if let Some(chan) = state.channels.get_mut(&chan_key) {
                    if adding {
                        chan.grant_operator(target);
                    } else {
                        chan.revoke_operator(target);
                    }
                }
                push_flag(&mut applied, &mut last_sign, adding, 'o');
                applied_args.push(arg.clone());
            }
            unknown => {
                state.send_numeric(
                    fd,
                    Response::ERR_UNKNOWNMODE,
                    vec![unknown.to_string()],
                    None,
                );
            }
        }
    }

    if !applied.is_empty() {
        let mut relay_params = vec![applied];
        relay_params.extend(applied_args);
        let relay = Message::mode(&name, relay_params).with_prefix(state.user_prefix(fd));
        state.broadcast_channel(&chan_key, &relay, None);
    }
    Action::Continue
}

fn push_flag(applied: &mut String, last_sign: &mut char, adding: bool, flag: char) {
    let sign = if adding { '+' } else { '-' };
    if *last_sign != sign {
        applied.push(sign);
        *last_sign = sign;
    }
    applied.push(flag);
}

/// Remove a member and destroy the channel if that emptied it.
fn remove_member(state: &mut ServerState, fd: RawFd, chan_key: &str) {
    let emptied = match state.channels.get_mut(chan_key) {
        Some(chan) => {
            chan.remove_member(fd);
            chan.is_empty()
        }
        None => return,
    };
    if emptied {
        state.channels.remove(chan_key);
        debug!(channel = %chan_key, "channel destroyed");
    }
}

/// `332` with the topic, or `331` when none is set.
fn send_topic_reply(state: &mut ServerState, fd: RawFd, name: &str, chan_key: &str) {
    let topic = match state.channels.get(chan_key) {
        Some(chan) => chan.topic.clone(),
        None => return,
    };
    if topic.is_empty() {
        state.send_numeric(fd, Response::RPL_NOTOPIC, vec![name.to_owned()], None);
    } else {
        state.send_numeric(fd, Response::RPL_TOPIC, vec![name.to_owned()], Some(topic));
    }
}

/// `353` + `366`, with operators prefixed `@` and names sorted for a
/// stable wire order.
fn send_names_reply(state: &mut ServerState, fd: RawFd, name: &str, chan_key: &str) {
    let names = match state.channels.get(chan_key) {
        Some(chan) => {
            let mut names: Vec<String> = chan
                .members()
                .map(|m| {
                    let nick = state.nick_of(m);
                    if chan.is_operator(m) {
                        format!("@{}", nick)
                    } else {
                        nick.to_owned()
                    }
                })
                .collect();
            names.sort();
            names.join(" ")
        }
        None => return,
    };
    state.send_numeric(
        fd,
        Response::RPL_NAMREPLY,
        vec!["=".to_owned(), name.to_owned()],
        Some(names),
    );
    state.send_numeric(fd, Response::RPL_ENDOFNAMES, vec![name.to_owned()], None);
}
