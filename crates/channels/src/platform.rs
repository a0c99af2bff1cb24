use {
    async_trait::async_trait,
    ekitten_common::types::{ChannelMessage, Community, MemberPresence},
};

use crate::Result;

/// Everything the engine needs from a chat platform.
///
/// Implementations own connection management and rate limiting; every method
/// is a single request and may fail with a [`crate::Error`].
#[async_trait]
pub trait ChatPlatform: Send + Sync {
    /// The bot's own user ID, `None` until the connection is ready.
    fn bot_user_id(&self) -> Option<String>;

    /// Show a "typing" indicator in a channel.
    async fn send_typing(&self, channel_id: &str) -> Result<()>;

    /// Post a new message to a channel.
    async fn send(&self, channel_id: &str, content: &str) -> Result<()>;

    /// Reply to a message without pinging its author.
    async fn reply(&self, message: &ChannelMessage, content: &str) -> Result<()>;

    /// Add an emoji reaction to a message.
    async fn react(&self, message: &ChannelMessage, emoji: &str) -> Result<()>;

    /// Most recent messages of a channel, newest first.
    async fn fetch_recent_messages(
        &self,
        channel_id: &str,
        limit: u8,
    ) -> Result<Vec<ChannelMessage>>;

    /// A single message by ID.
    async fn fetch_message(&self, channel_id: &str, message_id: &str) -> Result<ChannelMessage>;

    /// Communities the bot is a member of.
    async fn communities(&self) -> Result<Vec<Community>>;

    /// Known member presences of a community.
    async fn presences(&self, community_id: &str) -> Result<Vec<MemberPresence>>;
}
