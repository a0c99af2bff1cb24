//! [`ChatPlatform`] backed by serenity's HTTP client and gateway cache.

use std::sync::{Arc, RwLock};

use {
    async_trait::async_trait,
    ekitten_channels::{ChatPlatform, Error, Result},
    ekitten_common::types::{ChannelMessage, Community, MemberPresence},
    serenity::all::{
        Cache, Context, CreateAllowedMentions, CreateMessage, GetMessages, GuildId, Http,
        ReactionType, UserId,
    },
    tracing::debug,
};

use crate::convert;

#[derive(Clone)]
struct Connection {
    http: Arc<Http>,
    cache: Arc<Cache>,
    bot_user_id: UserId,
}

/// Discord platform handle. Requests fail with [`Error::Unavailable`] until
/// the gateway reports ready.
#[derive(Default)]
pub struct DiscordPlatform {
    connection: RwLock<Option<Connection>>,
}

fn external(context: &'static str) -> impl FnOnce(serenity::Error) -> Error {
    move |e| Error::external(context, e)
}

impl DiscordPlatform {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store the gateway session once the bot identity is known.
    pub fn connect(&self, ctx: &Context, bot_user_id: UserId) {
        let mut slot = self.connection.write().unwrap_or_else(|e| e.into_inner());
        *slot = Some(Connection {
            http: Arc::clone(&ctx.http),
            cache: Arc::clone(&ctx.cache),
            bot_user_id,
        });
    }

    pub fn is_ready(&self) -> bool {
        self.connection
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .is_some()
    }

    fn connection(&self) -> Result<Connection> {
        self.connection
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
            .ok_or_else(|| Error::unavailable("discord gateway not ready"))
    }

    fn guild_id(value: &str) -> Result<GuildId> {
        Ok(convert::parse_snowflake("guild", value).map(GuildId::new)?)
    }
}

#[async_trait]
impl ChatPlatform for DiscordPlatform {
    fn bot_user_id(&self) -> Option<String> {
        self.connection
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .as_ref()
            .map(|c| c.bot_user_id.to_string())
    }

    async fn send_typing(&self, channel_id: &str) -> Result<()> {
        let conn = self.connection()?;
        let channel = convert::channel_id(channel_id)?;
        conn.http
            .broadcast_typing(channel)
            .await
            .map_err(external("typing indicator"))
    }

    async fn send(&self, channel_id: &str, content: &str) -> Result<()> {
        let conn = self.connection()?;
        let channel = convert::channel_id(channel_id)?;
        let sent = channel
            .say(conn.http.as_ref(), content)
            .await
            .map_err(external("send message"))?;
        debug!(channel_id, message_id = %sent.id, "sent message");
        Ok(())
    }

    async fn reply(&self, message: &ChannelMessage, content: &str) -> Result<()> {
        let conn = self.connection()?;
        let channel = convert::channel_id(&message.channel_id)?;
        let target = convert::message_id(&message.id)?;
        let builder = CreateMessage::new()
            .content(content)
            .reference_message((channel, target))
            .allowed_mentions(CreateAllowedMentions::new().replied_user(false));
        channel
            .send_message(conn.http.as_ref(), builder)
            .await
            .map_err(external("send reply"))?;
        Ok(())
    }

    async fn react(&self, message: &ChannelMessage, emoji: &str) -> Result<()> {
        let conn = self.connection()?;
        let channel = convert::channel_id(&message.channel_id)?;
        let target = convert::message_id(&message.id)?;
        conn.http
            .create_reaction(channel, target, &ReactionType::Unicode(emoji.to_string()))
            .await
            .map_err(external("add reaction"))
    }

    async fn fetch_recent_messages(
        &self,
        channel_id: &str,
        limit: u8,
    ) -> Result<Vec<ChannelMessage>> {
        let conn = self.connection()?;
        let channel = convert::channel_id(channel_id)?;
        let messages = channel
            .messages(conn.http.as_ref(), GetMessages::new().limit(limit))
            .await
            .map_err(external("fetch history"))?;
        Ok(messages.iter().map(convert::channel_message).collect())
    }

    async fn fetch_message(&self, channel_id: &str, message_id: &str) -> Result<ChannelMessage> {
        let conn = self.connection()?;
        let channel = convert::channel_id(channel_id)?;
        let id = convert::message_id(message_id)?;
        let message = channel
            .message(conn.http.as_ref(), id)
            .await
            .map_err(external("fetch message"))?;
        Ok(convert::channel_message(&message))
    }

    async fn communities(&self) -> Result<Vec<Community>> {
        let conn = self.connection()?;
        Ok(conn
            .cache
            .guilds()
            .into_iter()
            .filter_map(|id| conn.cache.guild(id).map(|g| convert::community(&g)))
            .collect())
    }

    async fn presences(&self, community_id: &str) -> Result<Vec<MemberPresence>> {
        let conn = self.connection()?;
        let id = Self::guild_id(community_id)?;
        conn.cache
            .guild(id)
            .map(|g| convert::presences(&g))
            .ok_or_else(|| Error::not_found("community", community_id))
    }
}
