//! Discord event handler for serenity.
//!
//! Translates gateway events into engine calls. Serenity dispatches every
//! event on its own task, so handlers await the engine directly.

use std::sync::Arc;

use {
    ekitten_auto_reply::{MessageOutcome, ReplyEngine},
    serenity::{
        all::{Context, EventHandler, GatewayIntents, Member, Message, Ready},
        async_trait,
    },
    tracing::{debug, info},
};

use crate::{convert, platform::DiscordPlatform};

/// Handler for Discord gateway events.
pub struct DiscordHandler {
    engine: Arc<ReplyEngine>,
    platform: Arc<DiscordPlatform>,
}

impl DiscordHandler {
    pub fn new(engine: Arc<ReplyEngine>, platform: Arc<DiscordPlatform>) -> Self {
        Self { engine, platform }
    }

    /// Required gateway intents for the bot. Presences and members feed the
    /// proactive scheduler's "anyone around" check and welcomes.
    pub fn intents() -> GatewayIntents {
        GatewayIntents::GUILDS
            | GatewayIntents::GUILD_MESSAGES
            | GatewayIntents::DIRECT_MESSAGES
            | GatewayIntents::MESSAGE_CONTENT
            | GatewayIntents::GUILD_PRESENCES
            | GatewayIntents::GUILD_MEMBERS
    }
}

#[async_trait]
impl EventHandler for DiscordHandler {
    async fn ready(&self, ctx: Context, ready: Ready) {
        self.platform.connect(&ctx, ready.user.id);
        info!(
            user = %ready.user.name,
            user_id = %ready.user.id,
            guilds = ready.guilds.len(),
            "discord bot connected"
        );
    }

    async fn message(&self, _ctx: Context, msg: Message) {
        if msg.author.bot {
            return;
        }
        let inbound = convert::inbound_message(&msg);
        match self.engine.handle_message(inbound).await {
            MessageOutcome::Ignored | MessageOutcome::Suppressed => {},
            outcome => debug!(
                channel_id = %msg.channel_id,
                message_id = %msg.id,
                ?outcome,
                "handled message"
            ),
        }
    }

    async fn guild_member_addition(&self, _ctx: Context, new_member: Member) {
        let join = convert::member_join(&new_member);
        if let Some(channel_id) = self.engine.handle_member_join(join).await {
            debug!(guild_id = %new_member.guild_id, channel_id = %channel_id, "welcome sent");
        }
    }
}
