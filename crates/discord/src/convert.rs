//! Mapping between serenity models and the platform-neutral types.

use {
    chrono::{DateTime, Utc},
    ekitten_common::types::{
        Author, ChannelKind, ChannelMessage, Community, InboundMessage, MemberJoin,
        MemberPresence, PresenceStatus, TextChannel,
    },
    serenity::all::{
        ChannelId, ChannelType, Guild, Member, Message, MessageId, OnlineStatus, Timestamp, User,
    },
};

use crate::error::Result;

/// Parse a snowflake; Discord IDs are never zero.
pub fn parse_snowflake(kind: &'static str, value: &str) -> Result<u64> {
    match value.parse::<u64>() {
        Ok(id) if id != 0 => Ok(id),
        _ => Err(ekitten_common::Error::invalid_id(kind, value).into()),
    }
}

pub fn channel_id(value: &str) -> Result<ChannelId> {
    parse_snowflake("channel", value).map(ChannelId::new)
}

pub fn message_id(value: &str) -> Result<MessageId> {
    parse_snowflake("message", value).map(MessageId::new)
}

/// Nickname first, then global name, then username.
pub fn pick_display_name(nick: Option<&str>, global_name: Option<&str>, username: &str) -> String {
    nick.or(global_name)
        .filter(|name| !name.trim().is_empty())
        .unwrap_or(username)
        .to_string()
}

pub fn presence_status(status: OnlineStatus) -> PresenceStatus {
    match status {
        OnlineStatus::Online => PresenceStatus::Online,
        OnlineStatus::Idle => PresenceStatus::Idle,
        OnlineStatus::DoNotDisturb => PresenceStatus::DoNotDisturb,
        _ => PresenceStatus::Offline,
    }
}

fn timestamp(ts: Timestamp) -> DateTime<Utc> {
    DateTime::from_timestamp(ts.unix_timestamp(), 0).unwrap_or_default()
}

fn author(user: &User, nick: Option<&str>) -> Author {
    Author {
        id: user.id.to_string(),
        display_name: pick_display_name(nick, user.global_name.as_deref(), &user.name),
        is_bot: user.bot,
    }
}

pub fn channel_message(msg: &Message) -> ChannelMessage {
    let nick = msg.member.as_ref().and_then(|m| m.nick.as_deref());
    let mut author = author(&msg.author, nick);
    author.is_bot |= msg.webhook_id.is_some();
    ChannelMessage {
        id: msg.id.to_string(),
        channel_id: msg.channel_id.to_string(),
        author,
        content: msg.content.clone(),
        created_at: timestamp(msg.timestamp),
    }
}

pub fn inbound_message(msg: &Message) -> InboundMessage {
    InboundMessage {
        message: channel_message(msg),
        guild_id: msg.guild_id.map(|id| id.to_string()),
        kind: if msg.guild_id.is_some() {
            ChannelKind::Guild
        } else {
            ChannelKind::Direct
        },
        referenced_message_id: msg
            .message_reference
            .as_ref()
            .and_then(|r| r.message_id)
            .map(|id| id.to_string()),
        mentions: msg.mentions.iter().map(|u| u.id.to_string()).collect(),
    }
}

pub fn member_join(member: &Member) -> MemberJoin {
    MemberJoin {
        community_id: member.guild_id.to_string(),
        member: author(&member.user, member.nick.as_deref()),
    }
}

/// Sort key for channel display order.
pub fn channel_order(position: u16, id: u64) -> (u16, u64) {
    (position, id)
}

pub fn community(guild: &Guild) -> Community {
    let mut text: Vec<_> = guild
        .channels
        .values()
        .filter(|c| c.kind == ChannelType::Text)
        .collect();
    text.sort_by_key(|c| channel_order(c.position, c.id.get()));
    Community {
        id: guild.id.to_string(),
        name: guild.name.clone(),
        channels: text
            .into_iter()
            .map(|c| TextChannel {
                id: c.id.to_string(),
                name: c.name.clone(),
            })
            .collect(),
    }
}

/// Presences from the guild cache. A presence without the `bot` flag falls
/// back to the cached member.
pub fn presences(guild: &Guild) -> Vec<MemberPresence> {
    guild
        .presences
        .values()
        .map(|p| {
            let is_bot = p.user.bot.unwrap_or_else(|| {
                guild
                    .members
                    .get(&p.user.id)
                    .is_some_and(|m| m.user.bot)
            });
            MemberPresence {
                user_id: p.user.id.to_string(),
                is_bot,
                status: presence_status(p.status),
            }
        })
        .collect()
}
