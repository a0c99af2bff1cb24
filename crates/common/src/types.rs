//! Platform-neutral chat types shared by the engine, the scheduler and the
//! platform adapters.

use {
    chrono::{DateTime, Utc},
    serde::{Deserialize, Serialize},
};

/// Who wrote a message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Author {
    pub id: String,
    /// Name shown to other members (nickname, global name or username).
    pub display_name: String,
    /// Bots, webhooks and other automated accounts.
    pub is_bot: bool,
}

impl Author {
    pub fn human(id: impl Into<String>, display_name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            display_name: display_name.into(),
            is_bot: false,
        }
    }

    pub fn bot(id: impl Into<String>, display_name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            display_name: display_name.into(),
            is_bot: true,
        }
    }
}

/// Kind of channel a message arrived in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChannelKind {
    /// A channel belonging to a community (guild).
    Guild,
    /// A one-to-one direct-message channel.
    Direct,
}

/// A message as returned by history fetches and lookups.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChannelMessage {
    pub id: String,
    pub channel_id: String,
    pub author: Author,
    pub content: String,
    pub created_at: DateTime<Utc>,
}

/// A message-create event delivered by the platform.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InboundMessage {
    pub message: ChannelMessage,
    pub guild_id: Option<String>,
    pub kind: ChannelKind,
    /// ID of the message this one replies to, if any.
    pub referenced_message_id: Option<String>,
    /// User IDs explicitly mentioned in the message.
    pub mentions: Vec<String>,
}

impl InboundMessage {
    pub fn channel_id(&self) -> &str {
        &self.message.channel_id
    }

    pub fn content(&self) -> &str {
        &self.message.content
    }

    pub fn author(&self) -> &Author {
        &self.message.author
    }

    pub fn is_direct(&self) -> bool {
        self.kind == ChannelKind::Direct
    }

    pub fn mentions_user(&self, user_id: &str) -> bool {
        self.mentions.iter().any(|id| id == user_id)
    }
}

/// A text channel inside a community.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TextChannel {
    pub id: String,
    pub name: String,
}

/// A community (guild) the bot is a member of, with its text channels in
/// display order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Community {
    pub id: String,
    pub name: String,
    pub channels: Vec<TextChannel>,
}

/// Presence status of a community member.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PresenceStatus {
    Online,
    Idle,
    DoNotDisturb,
    Offline,
}

/// Presence of a single community member.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MemberPresence {
    pub user_id: String,
    pub is_bot: bool,
    pub status: PresenceStatus,
}

impl MemberPresence {
    /// A human who is online or idle.
    pub fn is_available_human(&self) -> bool {
        !self.is_bot && matches!(self.status, PresenceStatus::Online | PresenceStatus::Idle)
    }
}

/// A member-join event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MemberJoin {
    pub community_id: String,
    pub member: Author,
}
