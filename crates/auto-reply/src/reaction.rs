//! Emoji reactions to inbound messages, decided independently of replies.

use std::sync::Arc;

use {
    ekitten_agents::{TextGenerator, prompt::emoji_prompt},
    ekitten_channels::ChatPlatform,
    ekitten_common::{RandomSource, random::pick, types::ChannelMessage},
    ekitten_config::ReactionsConfig,
    tracing::{debug, warn},
};

#[cfg(feature = "metrics")]
use ekitten_metrics::{counter, labels, reactions as reaction_metrics};

const ZWJ: char = '\u{200D}';
const KEYCAP: char = '\u{20E3}';
const VARIATION_TEXT: char = '\u{FE0E}';
const VARIATION_EMOJI: char = '\u{FE0F}';

pub struct ReactionSelector {
    enabled: bool,
    probability: f64,
    model_probability: f64,
    emojis: Vec<String>,
    generator: Arc<dyn TextGenerator>,
    rng: Arc<dyn RandomSource>,
}

impl ReactionSelector {
    pub fn new(
        config: &ReactionsConfig,
        generator: Arc<dyn TextGenerator>,
        rng: Arc<dyn RandomSource>,
    ) -> Self {
        Self {
            enabled: config.enabled,
            probability: config.probability,
            model_probability: config.model_probability,
            emojis: config.emojis.clone(),
            generator,
            rng,
        }
    }

    /// Emoji to react with, or `None` when the roll says no.
    pub async fn choose(&self, content: &str) -> Option<String> {
        if !self.enabled || content.trim().is_empty() {
            return None;
        }
        if !self.rng.chance(self.probability) {
            return None;
        }
        if self.rng.chance(self.model_probability) {
            match self.generator.generate(&emoji_prompt(content)).await {
                Ok(text) => {
                    let candidate = text.trim();
                    if is_single_emoji(candidate) {
                        return Some(candidate.to_string());
                    }
                    debug!(output = candidate, "model emoji rejected, using curated set");
                },
                Err(e) => debug!(error = %e, "emoji generation failed, using curated set"),
            }
        }
        pick(self.rng.as_ref(), &self.emojis).cloned()
    }

    /// Choose and apply a reaction. Failures are logged, never returned.
    pub async fn react(&self, platform: &dyn ChatPlatform, message: &ChannelMessage) -> Option<String> {
        let emoji = self.choose(&message.content).await?;
        match platform.react(message, &emoji).await {
            Ok(()) => {
                #[cfg(feature = "metrics")]
                counter!(reaction_metrics::REACTIONS_TOTAL).increment(1);
                debug!(channel_id = %message.channel_id, message_id = %message.id, emoji = %emoji, "reacted");
                Some(emoji)
            },
            Err(e) => {
                #[cfg(feature = "metrics")]
                counter!(reaction_metrics::REACTION_ERRORS_TOTAL, labels::REASON => "platform").increment(1);
                warn!(channel_id = %message.channel_id, message_id = %message.id, error = %e, "failed to react");
                None
            },
        }
    }
}

/// Whether `text` is exactly one emoji glyph: a pictograph with optional
/// variation selector, skin tone or tag modifiers, ZWJ sequences of those,
/// a flag (two regional indicators) or a keycap.
pub fn is_single_emoji(text: &str) -> bool {
    let chars: Vec<char> = text.chars().collect();
    match chars.as_slice() {
        [] => false,
        [a, b] if is_regional_indicator(*a) && is_regional_indicator(*b) => true,
        [base, rest @ ..] if matches!(*base, '0'..='9' | '#' | '*') => {
            matches!(rest, [KEYCAP] | [VARIATION_EMOJI, KEYCAP])
        },
        _ => is_zwj_sequence(&chars),
    }
}

fn is_zwj_sequence(chars: &[char]) -> bool {
    let mut expect_base = true;
    for &c in chars {
        if expect_base {
            if !is_pictographic(c) {
                return false;
            }
            expect_base = false;
        } else if c == ZWJ {
            expect_base = true;
        } else if !is_modifier(c) {
            return false;
        }
    }
    !expect_base
}

fn is_regional_indicator(c: char) -> bool {
    ('\u{1F1E6}'..='\u{1F1FF}').contains(&c)
}

fn is_modifier(c: char) -> bool {
    matches!(c,
        VARIATION_TEXT | VARIATION_EMOJI
        | '\u{1F3FB}'..='\u{1F3FF}'
        | '\u{E0020}'..='\u{E007F}'
    )
}

fn is_pictographic(c: char) -> bool {
    matches!(c,
        '\u{00A9}' | '\u{00AE}' | '\u{203C}' | '\u{2049}' | '\u{2122}' | '\u{2139}'
        | '\u{2194}'..='\u{21AA}'
        | '\u{231A}'..='\u{23FF}'
        | '\u{24C2}'
        | '\u{25AA}'..='\u{25FE}'
        | '\u{2600}'..='\u{27BF}'
        | '\u{2934}' | '\u{2935}'
        | '\u{2B05}'..='\u{2B55}'
        | '\u{3030}' | '\u{303D}' | '\u{3297}' | '\u{3299}'
        | '\u{1F000}'..='\u{1F1E5}'
        | '\u{1F200}'..='\u{1F3FA}'
        | '\u{1F400}'..='\u{1FAFF}'
    )
}

#[cfg(test)]
mod tests {
    use {
        super::*,
        crate::testing::{RecordingPlatform, ScriptedGenerator, guild_message},
        ekitten_common::ScriptedRandom,
        rstest::rstest,
    };

    fn selector(generator: ScriptedGenerator, rolls: impl IntoIterator<Item = f64>) -> ReactionSelector {
        let config = ReactionsConfig {
            emojis: vec!["😺".into(), "🐾".into()],
            ..ReactionsConfig::default()
        };
        ReactionSelector::new(&config, Arc::new(generator), Arc::new(ScriptedRandom::new(rolls)))
    }

    #[rstest]
    #[case("😺", true)]
    #[case("❤️", true)]
    #[case("👍🏽", true)]
    #[case("👩‍💻", true)]
    #[case("👨‍👩‍👧‍👦", true)]
    #[case("🇫🇷", true)]
    #[case("#️⃣", true)]
    #[case("🏴󠁧󠁢󠁳󠁣󠁴󠁿", true)]
    #[case("", false)]
    #[case("😺😺", false)]
    #[case("a", false)]
    #[case("😺 nice", false)]
    #[case("🇫", false)]
    #[case("1", false)]
    #[case("👩‍", false)]
    fn single_emoji(#[case] text: &str, #[case] expected: bool) {
        assert_eq!(is_single_emoji(text), expected, "{text:?}");
    }

    #[tokio::test]
    async fn roll_above_probability_does_nothing() {
        let s = selector(ScriptedGenerator::replying("🔥"), [0.9]);
        assert_eq!(s.choose("hello").await, None);
    }

    #[tokio::test]
    async fn model_emoji_is_used_when_valid() {
        let generator = ScriptedGenerator::replying(" 🔥 ");
        let s = selector(generator.clone(), [0.1, 0.1]);
        assert_eq!(s.choose("this is lit").await.as_deref(), Some("🔥"));
        assert!(generator.prompts()[0].contains("this is lit"));
    }

    #[tokio::test]
    async fn invalid_model_output_falls_back_to_curated() {
        let s = selector(ScriptedGenerator::replying("fire emoji!"), [0.1, 0.1, 0.7]);
        assert_eq!(s.choose("this is lit").await.as_deref(), Some("🐾"));
    }

    #[tokio::test]
    async fn model_error_falls_back_to_curated() {
        let s = selector(ScriptedGenerator::failing(), [0.1, 0.1, 0.0]);
        assert_eq!(s.choose("hi").await.as_deref(), Some("😺"));
    }

    #[tokio::test]
    async fn curated_pick_skips_model() {
        let generator = ScriptedGenerator::replying("🔥");
        let s = selector(generator.clone(), [0.1, 0.9, 0.0]);
        assert_eq!(s.choose("hi").await.as_deref(), Some("😺"));
        assert!(generator.prompts().is_empty());
    }

    #[tokio::test]
    async fn empty_content_never_reacts() {
        let s = selector(ScriptedGenerator::replying("🔥"), [0.0, 0.0]);
        assert_eq!(s.choose("  ").await, None);
    }

    #[tokio::test]
    async fn react_applies_and_swallows_failures() {
        let platform = RecordingPlatform::new("999");
        let msg = guild_message("c1", "u1", "hi");

        let s = selector(ScriptedGenerator::replying("🔥"), [0.1, 0.9, 0.0]);
        assert_eq!(s.react(&platform, &msg.message).await.as_deref(), Some("😺"));
        assert_eq!(platform.reactions(), vec![(msg.message.id.clone(), "😺".to_string())]);

        platform.fail_sends(true);
        let s = selector(ScriptedGenerator::replying("🔥"), [0.1, 0.9, 0.0]);
        assert_eq!(s.react(&platform, &msg.message).await, None);
    }
}
