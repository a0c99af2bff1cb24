//! Reply gating: decides whether an inbound message gets a reply and why.

use {
    chrono::{DateTime, Utc},
    ekitten_channels::ChatPlatform,
    ekitten_common::{RandomSource, types::InboundMessage},
    ekitten_config::{EngagementConfig, IdentityConfig},
    tracing::debug,
};

/// Why the bot replies to a message, or `Suppressed` when it does not.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Trigger {
    Mention,
    DirectMessage,
    ReplyToBot,
    NameMention,
    /// The bot spoke in the channel `elapsed_ms` ago, inside the window.
    Engaged { elapsed_ms: u64 },
    /// The random reply roll succeeded with `roll`.
    RandomChance { roll: f64 },
    Suppressed,
}

impl Trigger {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Mention => "mention",
            Self::DirectMessage => "direct_message",
            Self::ReplyToBot => "reply_to_bot",
            Self::NameMention => "name_mention",
            Self::Engaged { .. } => "engaged",
            Self::RandomChance { .. } => "random_chance",
            Self::Suppressed => "suppressed",
        }
    }

    pub fn is_reply(&self) -> bool {
        !matches!(self, Self::Suppressed)
    }
}

/// Trigger plus the text to feed the model.
#[derive(Debug, Clone, PartialEq)]
pub struct Evaluation {
    pub trigger: Trigger,
    /// Empty when suppressed.
    pub query: String,
}

impl Evaluation {
    pub fn suppressed() -> Self {
        Self {
            trigger: Trigger::Suppressed,
            query: String::new(),
        }
    }
}

/// Per-message inputs the evaluator does not own.
pub struct TriggerInputs<'a> {
    pub bot_user_id: &'a str,
    pub last_spoke_at: Option<DateTime<Utc>>,
    pub now: DateTime<Utc>,
    pub platform: &'a dyn ChatPlatform,
    pub rng: &'a dyn RandomSource,
}

pub struct TriggerEvaluator {
    /// Lowercased, non-empty.
    aliases: Vec<String>,
    window_ms: u64,
    reply_probability: f64,
    dm_placeholder: String,
}

impl TriggerEvaluator {
    pub fn new(identity: &IdentityConfig, engagement: &EngagementConfig) -> Self {
        let aliases = identity
            .aliases
            .iter()
            .chain(std::iter::once(&identity.name))
            .map(|a| a.trim().to_lowercase())
            .filter(|a| !a.is_empty())
            .collect();
        Self {
            aliases,
            window_ms: engagement.window_ms,
            reply_probability: engagement.reply_probability,
            dm_placeholder: engagement.dm_placeholder.clone(),
        }
    }

    /// Decide the trigger, then extract the query. A non-DM message with no
    /// usable text is suppressed whatever its trigger.
    pub async fn evaluate(&self, msg: &InboundMessage, inputs: TriggerInputs<'_>) -> Evaluation {
        let trigger = self.decide(msg, &inputs).await;
        if !trigger.is_reply() {
            return Evaluation::suppressed();
        }
        match self.extract_query(trigger, msg.content(), inputs.bot_user_id) {
            Some(query) => Evaluation { trigger, query },
            None => {
                debug!(channel_id = msg.channel_id(), trigger = trigger.as_str(), "empty message, not replying");
                Evaluation::suppressed()
            },
        }
    }

    /// First matching rule wins.
    pub async fn decide(&self, msg: &InboundMessage, inputs: &TriggerInputs<'_>) -> Trigger {
        if msg.mentions_user(inputs.bot_user_id) {
            return Trigger::Mention;
        }
        if msg.is_direct() {
            return Trigger::DirectMessage;
        }
        if self.replies_to_bot(msg, inputs).await {
            return Trigger::ReplyToBot;
        }
        if self.mentions_name(msg.content()) {
            return Trigger::NameMention;
        }
        if let Some(elapsed_ms) = self.engaged_for(inputs.last_spoke_at, inputs.now) {
            return Trigger::Engaged { elapsed_ms };
        }
        let roll = inputs.rng.sample();
        if roll < self.reply_probability {
            Trigger::RandomChance { roll }
        } else {
            Trigger::Suppressed
        }
    }

    /// Text to send to the model, `None` when there is nothing to answer.
    pub fn extract_query(&self, trigger: Trigger, content: &str, bot_user_id: &str) -> Option<String> {
        let raw = content.trim();
        match trigger {
            Trigger::Suppressed => None,
            Trigger::Mention => {
                let stripped = strip_mention_tokens(content, bot_user_id);
                let query = if stripped.is_empty() { raw } else { stripped.as_str() };
                if query.is_empty() {
                    Some(self.dm_placeholder.clone())
                } else {
                    Some(query.to_string())
                }
            },
            Trigger::DirectMessage if raw.is_empty() => Some(self.dm_placeholder.clone()),
            _ if raw.is_empty() => None,
            _ => Some(raw.to_string()),
        }
    }

    fn mentions_name(&self, content: &str) -> bool {
        let content = content.to_lowercase();
        self.aliases.iter().any(|alias| content.contains(alias.as_str()))
    }

    /// Milliseconds since the bot last spoke, when that is inside the window.
    fn engaged_for(&self, last_spoke_at: Option<DateTime<Utc>>, now: DateTime<Utc>) -> Option<u64> {
        let last = last_spoke_at?;
        let elapsed = u64::try_from((now - last).num_milliseconds().max(0)).unwrap_or(0);
        (elapsed < self.window_ms).then_some(elapsed)
    }

    async fn replies_to_bot(&self, msg: &InboundMessage, inputs: &TriggerInputs<'_>) -> bool {
        let Some(referenced_id) = msg.referenced_message_id.as_deref() else {
            return false;
        };
        match inputs.platform.fetch_message(msg.channel_id(), referenced_id).await {
            Ok(referenced) => referenced.author.id == inputs.bot_user_id,
            Err(e) => {
                debug!(
                    channel_id = msg.channel_id(),
                    message_id = referenced_id,
                    error = %e,
                    "could not fetch referenced message"
                );
                false
            },
        }
    }
}

/// Remove every `<@id>` / `<@!id>` token for `user_id`, then trim.
pub fn strip_mention_tokens(content: &str, user_id: &str) -> String {
    content
        .replace(&format!("<@{user_id}>"), "")
        .replace(&format!("<@!{user_id}>"), "")
        .trim()
        .to_string()
}
