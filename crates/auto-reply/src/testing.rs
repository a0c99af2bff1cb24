//! In-memory fakes for the platform and the model, shared with the
//! scheduler's tests through the `testing` feature.

use std::{
    collections::{HashMap, VecDeque},
    sync::{Arc, Mutex},
};

use {
    async_trait::async_trait,
    chrono::{DateTime, Utc},
    ekitten_agents::{GenerationError, TextGenerator},
    ekitten_channels::{ChatPlatform, Error, Result},
    ekitten_common::types::{
        Author, ChannelKind, ChannelMessage, Community, InboundMessage, MemberPresence,
    },
};

/// Something the engine sent through the platform.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SentMessage {
    pub channel_id: String,
    pub content: String,
    /// ID of the message replied to; `None` for a plain send.
    pub reply_to: Option<String>,
}

#[derive(Default)]
struct PlatformState {
    next_id: u64,
    /// Chronological per channel.
    history: HashMap<String, Vec<ChannelMessage>>,
    communities: Vec<Community>,
    presences: HashMap<String, Vec<MemberPresence>>,
    sent: Vec<SentMessage>,
    typing: Vec<String>,
    reactions: Vec<(String, String)>,
    fail_sends: bool,
    fail_history: bool,
}

/// A [`ChatPlatform`] that records every call and serves canned history.
pub struct RecordingPlatform {
    bot_user_id: Option<String>,
    state: Mutex<PlatformState>,
}

impl RecordingPlatform {
    pub fn new(bot_user_id: &str) -> Self {
        Self {
            bot_user_id: Some(bot_user_id.to_string()),
            state: Mutex::new(PlatformState::default()),
        }
    }

    /// A platform that has not finished connecting.
    pub fn not_ready() -> Self {
        Self {
            bot_user_id: None,
            state: Mutex::new(PlatformState::default()),
        }
    }

    fn state(&self) -> std::sync::MutexGuard<'_, PlatformState> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Append a message to a channel's history and return it.
    pub fn push_message(
        &self,
        channel_id: &str,
        author: Author,
        content: &str,
        created_at: DateTime<Utc>,
    ) -> ChannelMessage {
        let mut state = self.state();
        state.next_id += 1;
        let message = ChannelMessage {
            id: format!("m{}", state.next_id),
            channel_id: channel_id.to_string(),
            author,
            content: content.to_string(),
            created_at,
        };
        state
            .history
            .entry(channel_id.to_string())
            .or_default()
            .push(message.clone());
        message
    }

    pub fn add_community(&self, community: Community, presences: Vec<MemberPresence>) {
        let mut state = self.state();
        state.presences.insert(community.id.clone(), presences);
        state.communities.push(community);
    }

    pub fn fail_sends(&self, fail: bool) {
        self.state().fail_sends = fail;
    }

    pub fn fail_history(&self, fail: bool) {
        self.state().fail_history = fail;
    }

    pub fn sent(&self) -> Vec<SentMessage> {
        self.state().sent.clone()
    }

    pub fn typing(&self) -> Vec<String> {
        self.state().typing.clone()
    }

    /// `(message_id, emoji)` pairs.
    pub fn reactions(&self) -> Vec<(String, String)> {
        self.state().reactions.clone()
    }

    fn record_send(&self, channel_id: &str, content: &str, reply_to: Option<&str>) -> Result<()> {
        let mut state = self.state();
        if state.fail_sends {
            return Err(Error::unavailable("sends disabled"));
        }
        state.sent.push(SentMessage {
            channel_id: channel_id.to_string(),
            content: content.to_string(),
            reply_to: reply_to.map(str::to_string),
        });
        Ok(())
    }
}

#[async_trait]
impl ChatPlatform for RecordingPlatform {
    fn bot_user_id(&self) -> Option<String> {
        self.bot_user_id.clone()
    }

    async fn send_typing(&self, channel_id: &str) -> Result<()> {
        self.state().typing.push(channel_id.to_string());
        Ok(())
    }

    async fn send(&self, channel_id: &str, content: &str) -> Result<()> {
        self.record_send(channel_id, content, None)
    }

    async fn reply(&self, message: &ChannelMessage, content: &str) -> Result<()> {
        self.record_send(&message.channel_id, content, Some(&message.id))
    }

    async fn react(&self, message: &ChannelMessage, emoji: &str) -> Result<()> {
        let mut state = self.state();
        if state.fail_sends {
            return Err(Error::unavailable("sends disabled"));
        }
        state.reactions.push((message.id.clone(), emoji.to_string()));
        Ok(())
    }

    async fn fetch_recent_messages(&self, channel_id: &str, limit: u8) -> Result<Vec<ChannelMessage>> {
        let state = self.state();
        if state.fail_history {
            return Err(Error::unavailable("history disabled"));
        }
        Ok(state
            .history
            .get(channel_id)
            .map(|msgs| msgs.iter().rev().take(usize::from(limit)).cloned().collect())
            .unwrap_or_default())
    }

    async fn fetch_message(&self, channel_id: &str, message_id: &str) -> Result<ChannelMessage> {
        self.state()
            .history
            .get(channel_id)
            .and_then(|msgs| msgs.iter().find(|m| m.id == message_id))
            .cloned()
            .ok_or_else(|| Error::not_found("message", message_id))
    }

    async fn communities(&self) -> Result<Vec<Community>> {
        Ok(self.state().communities.clone())
    }

    async fn presences(&self, community_id: &str) -> Result<Vec<MemberPresence>> {
        Ok(self
            .state()
            .presences
            .get(community_id)
            .cloned()
            .unwrap_or_default())
    }
}

#[derive(Default)]
struct GeneratorState {
    /// `Err` entries fail with an API error carrying the text.
    queue: VecDeque<std::result::Result<String, String>>,
    fallback: Option<String>,
    prompts: Vec<String>,
}

/// A [`TextGenerator`] that replays canned outputs and records prompts.
/// Clones share state.
#[derive(Clone, Default)]
pub struct ScriptedGenerator {
    state: Arc<Mutex<GeneratorState>>,
}

impl ScriptedGenerator {
    /// Always answers `text` once the queue is drained.
    pub fn replying(text: &str) -> Self {
        let generator = Self::default();
        generator.lock().fallback = Some(text.to_string());
        generator
    }

    /// Always fails once the queue is drained.
    pub fn failing() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn then_ok(self, text: &str) -> Self {
        self.lock().queue.push_back(Ok(text.to_string()));
        self
    }

    #[must_use]
    pub fn then_err(self, body: &str) -> Self {
        self.lock().queue.push_back(Err(body.to_string()));
        self
    }

    pub fn prompts(&self) -> Vec<String> {
        self.lock().prompts.clone()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, GeneratorState> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }
}

#[async_trait]
impl TextGenerator for ScriptedGenerator {
    async fn generate(&self, prompt: &str) -> std::result::Result<String, GenerationError> {
        let mut state = self.lock();
        state.prompts.push(prompt.to_string());
        let next = state
            .queue
            .pop_front()
            .or_else(|| state.fallback.clone().map(Ok));
        match next {
            Some(Ok(text)) => Ok(text),
            Some(Err(body)) => Err(GenerationError::Api { status: 500, body }),
            None => Err(GenerationError::Empty),
        }
    }
}

/// A human-authored guild message in `channel_id`, created now.
pub fn guild_message(channel_id: &str, author_id: &str, content: &str) -> InboundMessage {
    InboundMessage {
        message: ChannelMessage {
            id: format!("in-{author_id}-{}", content.len()),
            channel_id: channel_id.to_string(),
            author: Author::human(author_id, format!("user-{author_id}")),
            content: content.to_string(),
            created_at: Utc::now(),
        },
        guild_id: Some("g1".into()),
        kind: ChannelKind::Guild,
        referenced_message_id: None,
        mentions: Vec::new(),
    }
}
