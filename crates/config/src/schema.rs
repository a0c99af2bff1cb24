/// Config schema types (identity, engagement, reactions, media, proactive,
/// providers, discord).
use {
    secrecy::{ExposeSecret, Secret},
    serde::{Deserialize, Serialize},
};

use crate::interval::parse_interval_ms;

/// Default personality injected as the model's system instruction.
pub const DEFAULT_SYSTEM_INSTRUCTION: &str = "\
You are e-kitten, a friendly and playful Discord bot. You're curious, helpful, \
and have a warm personality. You engage in conversations naturally and respond \
to messages as if you're part of the community. Keep your responses concise and \
conversational, matching the tone of the chat. Never prefix your reply with your \
own name. When a GIF would make your reply funnier, add a line \
MEDIA: \"search terms\" and it will be attached for you.";

/// Default apology sent when generation fails.
pub const DEFAULT_FALLBACK_REPLY: &str =
    "Sorry, I encountered an error while processing your request.";

/// Root configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct EkittenConfig {
    pub identity: IdentityConfig,
    pub engagement: EngagementConfig,
    pub reactions: ReactionsConfig,
    pub media: MediaConfig,
    pub proactive: ProactiveConfig,
    pub welcome: WelcomeConfig,
    pub providers: ProvidersConfig,
    pub discord: DiscordConfig,
    pub metrics: MetricsConfig,
}

/// Who the bot is and how it talks.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct IdentityConfig {
    /// Display name used in prompts.
    pub name: String,
    /// Names the bot answers to and strips from its own output. Matched
    /// case-insensitively.
    pub aliases: Vec<String>,
    /// Label used for the bot's own lines in the conversation history.
    pub history_label: String,
    /// System instruction sent with every generation.
    pub system_instruction: String,
    /// Reply sent when generation fails.
    pub fallback_reply: String,
}

impl Default for IdentityConfig {
    fn default() -> Self {
        Self {
            name: "e-kitten".into(),
            aliases: vec!["e-kitten".into(), "ekitten".into(), "kitten".into()],
            history_label: "e-kitten".into(),
            system_instruction: DEFAULT_SYSTEM_INSTRUCTION.into(),
            fallback_reply: DEFAULT_FALLBACK_REPLY.into(),
        }
    }
}

/// Reply gating.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EngagementConfig {
    /// After the bot speaks in a channel it replies unconditionally for this
    /// long. Defaults to 180 000 ms.
    pub window_ms: u64,
    /// Chance of replying to an otherwise untriggered message. Defaults to 0.30.
    pub reply_probability: f64,
    /// Number of recent messages fed to the model as context. Defaults to 15.
    pub history_limit: u8,
    /// Query used for an empty direct message.
    pub dm_placeholder: String,
}

impl Default for EngagementConfig {
    fn default() -> Self {
        Self {
            window_ms: 180_000,
            reply_probability: 0.30,
            history_limit: 15,
            dm_placeholder: "Hello!".into(),
        }
    }
}

/// Emoji reactions to inbound messages.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ReactionsConfig {
    pub enabled: bool,
    /// Chance of reacting to a message at all. Defaults to 0.35.
    pub probability: f64,
    /// Once reacting, chance of asking the model for the emoji instead of
    /// sampling the curated set. Defaults to 0.5.
    pub model_probability: f64,
    /// Curated emoji set.
    pub emojis: Vec<String>,
}

impl Default for ReactionsConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            probability: 0.35,
            model_probability: 0.5,
            emojis: [
                "😺", "😸", "😹", "😻", "🐱", "🐾", "💖", "✨", "😂", "👀", "🔥", "🥺", "😼",
                "🎉",
            ]
            .into_iter()
            .map(String::from)
            .collect(),
        }
    }
}

/// Media (GIF) attachments.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MediaConfig {
    /// Keyword of the in-text directive, e.g. `MEDIA: "happy cat"`.
    pub directive_keyword: String,
    /// Chance of attaching a random curated GIF when the model asked for
    /// none. Defaults to 0.05; 0 disables it.
    pub injection_probability: f64,
    /// Search terms used for opportunistic attachments.
    pub injection_terms: Vec<String>,
}

impl Default for MediaConfig {
    fn default() -> Self {
        Self {
            directive_keyword: "MEDIA".into(),
            injection_probability: 0.05,
            injection_terms: [
                "happy cat",
                "cat vibing",
                "excited kitten",
                "cat dance",
                "silly cat",
                "cat thumbs up",
                "sleepy cat",
                "cat wave",
            ]
            .into_iter()
            .map(String::from)
            .collect(),
        }
    }
}

/// Spontaneous messages during idle periods.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ProactiveConfig {
    pub enabled: bool,
    /// Timer period (e.g. "5m"). Defaults to "5m".
    pub every: String,
    /// Glob (`*` wildcard, case-insensitive) selecting candidate channels by
    /// name. Defaults to "*general*".
    pub channel_pattern: String,
    /// Minimum age of a channel's latest message (e.g. "2m").
    pub inactivity: String,
    /// Chance of speaking in the first eligible channel. Defaults to 1/12.
    pub probability: f64,
    pub active_hours: ActiveHoursConfig,
    /// Prompt override for spontaneous messages.
    pub prompt: Option<String>,
}

impl Default for ProactiveConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            every: "5m".into(),
            channel_pattern: "*general*".into(),
            inactivity: "2m".into(),
            probability: 1.0 / 12.0,
            active_hours: ActiveHoursConfig::default(),
            prompt: None,
        }
    }
}

impl ProactiveConfig {
    /// Timer period in milliseconds, falling back to 5 minutes.
    #[must_use]
    pub fn interval_ms(&self) -> u64 {
        parse_interval_ms(&self.every).unwrap_or(5 * 60 * 1000)
    }

    /// Inactivity threshold in milliseconds, falling back to 2 minutes.
    #[must_use]
    pub fn inactivity_ms(&self) -> u64 {
        parse_interval_ms(&self.inactivity).unwrap_or(2 * 60 * 1000)
    }
}

/// Active hours window for proactive messages, `start_hour <= h < end_hour`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ActiveHoursConfig {
    pub start_hour: u32,
    pub end_hour: u32,
    /// IANA timezone the window is evaluated in.
    pub timezone: String,
}

impl Default for ActiveHoursConfig {
    fn default() -> Self {
        Self {
            start_hour: 9,
            end_hour: 19,
            timezone: "America/New_York".into(),
        }
    }
}

/// Greeting for new community members.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct WelcomeConfig {
    pub enabled: bool,
    /// Prompt override; `{name}` is replaced by the member's display name.
    pub prompt: Option<String>,
}

/// External service credentials and endpoints.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ProvidersConfig {
    pub gemini: GeminiConfig,
    pub tenor: TenorConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeminiConfig {
    #[serde(
        default,
        serialize_with = "serialize_option_secret",
        skip_serializing_if = "Option::is_none"
    )]
    pub api_key: Option<Secret<String>>,
    pub model: String,
    pub base_url: String,
    pub timeout_secs: u64,
}

impl Default for GeminiConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            model: "gemini-2.5-flash".into(),
            base_url: "https://generativelanguage.googleapis.com".into(),
            timeout_secs: 60,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TenorConfig {
    /// Without a key GIF lookups are disabled.
    #[serde(
        default,
        serialize_with = "serialize_option_secret",
        skip_serializing_if = "Option::is_none"
    )]
    pub api_key: Option<Secret<String>>,
    pub client_key: String,
    pub base_url: String,
    /// Results fetched per search; one is picked at random.
    pub limit: u8,
    pub timeout_secs: u64,
}

impl Default for TenorConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            client_key: "ekitten".into(),
            base_url: "https://tenor.googleapis.com".into(),
            limit: 8,
            timeout_secs: 10,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct DiscordConfig {
    #[serde(
        default,
        serialize_with = "serialize_option_secret",
        skip_serializing_if = "Option::is_none"
    )]
    pub token: Option<Secret<String>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MetricsConfig {
    pub enabled: bool,
    /// Address of the Prometheus scrape endpoint (`GET /metrics`). `None`
    /// keeps the recorder in-process only.
    pub listen: Option<String>,
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            listen: Some("127.0.0.1:9464".into()),
        }
    }
}

// ── Serde helpers for Secret<String> ────────────────────────────────────────

fn serialize_option_secret<S: serde::Serializer>(
    secret: &Option<Secret<String>>,
    serializer: S,
) -> Result<S::Ok, S::Error> {
    match secret {
        Some(s) => serializer.serialize_some(s.expose_secret()),
        None => serializer.serialize_none(),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_engine_constants() {
        let cfg = EkittenConfig::default();
        assert_eq!(cfg.engagement.window_ms, 180_000);
        assert_eq!(cfg.engagement.reply_probability, 0.30);
        assert_eq!(cfg.engagement.history_limit, 15);
        assert_eq!(cfg.media.injection_probability, 0.05);
        assert_eq!(cfg.proactive.interval_ms(), 300_000);
        assert_eq!(cfg.proactive.inactivity_ms(), 120_000);
        assert_eq!(cfg.proactive.active_hours.start_hour, 9);
        assert_eq!(cfg.proactive.active_hours.end_hour, 19);
    }

    #[test]
    fn partial_toml_keeps_defaults() {
        let cfg: EkittenConfig = toml::from_str(
            r#"
            [identity]
            name = "Mochi"
            aliases = ["mochi"]

            [proactive]
            every = "10m"
            "#,
        )
        .unwrap();
        assert_eq!(cfg.identity.name, "Mochi");
        assert_eq!(cfg.identity.history_label, "e-kitten");
        assert_eq!(cfg.proactive.interval_ms(), 600_000);
        assert_eq!(cfg.proactive.channel_pattern, "*general*");
    }

    #[test]
    fn secrets_serialize_exposed_and_skip_when_absent() {
        let mut cfg = EkittenConfig::default();
        cfg.discord.token = Some(Secret::new("tok".into()));
        let out = toml::to_string(&cfg).unwrap();
        assert!(out.contains("token = \"tok\""));
        assert!(!out.contains("api_key"));
    }

    #[test]
    fn bad_interval_falls_back() {
        let cfg = ProactiveConfig {
            every: "soon".into(),
            ..Default::default()
        };
        assert_eq!(cfg.interval_ms(), 300_000);
    }
}
