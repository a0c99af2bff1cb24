//! Builds the prompt from recent channel history.

use {
    ekitten_channels::ChatPlatform,
    ekitten_common::types::ChannelMessage,
    ekitten_config::{EngagementConfig, IdentityConfig},
    tracing::warn,
};

/// Separates the history window from the message being answered.
pub const CURRENT_MESSAGE_MARKER: &str = "\n\nCurrent message to respond to: ";

pub struct ContextAssembler {
    history_limit: u8,
    bot_label: String,
}

impl ContextAssembler {
    pub fn new(identity: &IdentityConfig, engagement: &EngagementConfig) -> Self {
        Self {
            history_limit: engagement.history_limit,
            bot_label: identity.history_label.clone(),
        }
    }

    /// Prompt for `query` in `channel_id`. A failed history fetch degrades to
    /// the bare query.
    pub async fn assemble(
        &self,
        platform: &dyn ChatPlatform,
        channel_id: &str,
        bot_user_id: &str,
        query: &str,
    ) -> String {
        let history = if self.history_limit == 0 {
            String::new()
        } else {
            match platform.fetch_recent_messages(channel_id, self.history_limit).await {
                Ok(recent) => render_history(&recent, bot_user_id, &self.bot_label),
                Err(e) => {
                    warn!(channel_id, error = %e, "failed to fetch history");
                    String::new()
                },
            }
        };
        build_prompt(&history, query)
    }
}

/// Render `recent` (newest first) as chronological `"<label>: <content>"`
/// lines. Other bots and blank messages are dropped.
pub fn render_history(recent: &[ChannelMessage], bot_user_id: &str, bot_label: &str) -> String {
    recent
        .iter()
        .rev()
        .filter(|m| !m.author.is_bot || m.author.id == bot_user_id)
        .filter_map(|m| {
            let content = m.content.trim();
            if content.is_empty() {
                return None;
            }
            let label = if m.author.id == bot_user_id {
                bot_label
            } else {
                m.author.display_name.as_str()
            };
            Some(format!("{label}: {content}"))
        })
        .collect::<Vec<_>>()
        .join("\n")
}

pub fn build_prompt(history: &str, query: &str) -> String {
    if history.is_empty() {
        query.to_string()
    } else {
        format!("{history}{CURRENT_MESSAGE_MARKER}{query}")
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use {
        super::*,
        crate::testing::RecordingPlatform,
        chrono::{Duration, Utc},
        ekitten_common::types::Author,
    };

    const BOT: &str = "999";

    fn assembler() -> ContextAssembler {
        ContextAssembler::new(&IdentityConfig::default(), &EngagementConfig::default())
    }

    #[tokio::test]
    async fn renders_chronological_history() {
        let platform = RecordingPlatform::new(BOT);
        let t0 = Utc::now();
        platform.push_message("c1", Author::human("u1", "alice"), "hi all", t0);
        platform.push_message("c1", Author::bot(BOT, "e-kitten"), "meow!", t0 + Duration::seconds(1));
        platform.push_message("c1", Author::bot("other", "dyno"), "rank up", t0 + Duration::seconds(2));
        platform.push_message("c1", Author::human("u2", "bob"), "   ", t0 + Duration::seconds(3));
        platform.push_message("c1", Author::human("u2", "bob"), "is the cat here?", t0 + Duration::seconds(4));

        let prompt = assembler().assemble(&platform, "c1", BOT, "is the cat here?").await;
        assert_eq!(
            prompt,
            "alice: hi all\ne-kitten: meow!\nbob: is the cat here?\n\n\
             Current message to respond to: is the cat here?"
        );
    }

    #[tokio::test]
    async fn history_is_bounded() {
        let platform = RecordingPlatform::new(BOT);
        let t0 = Utc::now();
        for i in 0..20 {
            platform.push_message("c1", Author::human("u1", "alice"), &format!("m{i}"), t0 + Duration::seconds(i));
        }
        let prompt = assembler().assemble(&platform, "c1", BOT, "q").await;
        let (history, _) = prompt.split_once(CURRENT_MESSAGE_MARKER).unwrap();
        let lines: Vec<_> = history.lines().collect();
        assert_eq!(lines.len(), 15);
        assert_eq!(lines[0], "alice: m5");
        assert_eq!(lines[14], "alice: m19");
    }

    #[tokio::test]
    async fn empty_history_yields_bare_query() {
        let platform = RecordingPlatform::new(BOT);
        assert_eq!(assembler().assemble(&platform, "c1", BOT, "hello").await, "hello");
    }

    #[tokio::test]
    async fn fetch_failure_yields_bare_query() {
        let platform = RecordingPlatform::new(BOT);
        platform.push_message("c1", Author::human("u1", "alice"), "hi", Utc::now());
        platform.fail_history(true);
        assert_eq!(assembler().assemble(&platform, "c1", BOT, "hello").await, "hello");
    }
}
