//! Configuration validation.
//!
//! Reports syntax and type errors in a config file and semantic problems in a
//! parsed config (probabilities, active hours, timezone, intervals, aliases).

use std::path::{Path, PathBuf};

use ekitten_common::random::check_probability;

use crate::{interval::parse_interval_ms, schema::EkittenConfig};

/// Severity level for a diagnostic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Severity {
    Error,
    Warning,
    Info,
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Error => write!(f, "error"),
            Self::Warning => write!(f, "warning"),
            Self::Info => write!(f, "info"),
        }
    }
}

/// A single validation diagnostic.
#[derive(Debug, Clone)]
pub struct Diagnostic {
    pub severity: Severity,
    /// Dotted path, e.g. "proactive.active_hours.timezone"
    pub path: String,
    pub message: String,
}

impl Diagnostic {
    fn error(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            severity: Severity::Error,
            path: path.into(),
            message: message.into(),
        }
    }

    fn warning(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            severity: Severity::Warning,
            path: path.into(),
            message: message.into(),
        }
    }
}

/// Result of validating a configuration.
#[derive(Debug, Clone, Default)]
pub struct ValidationResult {
    pub diagnostics: Vec<Diagnostic>,
    pub config_path: Option<PathBuf>,
}

impl ValidationResult {
    /// Returns `true` if any diagnostic is an error.
    #[must_use]
    pub fn has_errors(&self) -> bool {
        self.diagnostics
            .iter()
            .any(|d| d.severity == Severity::Error)
    }

    /// Count diagnostics by severity.
    #[must_use]
    pub fn count(&self, severity: Severity) -> usize {
        self.diagnostics
            .iter()
            .filter(|d| d.severity == severity)
            .count()
    }
}

/// Validate a config file at the given path, or the discovered default
/// location if `path` is `None`.
#[must_use]
pub fn validate(path: Option<&Path>) -> ValidationResult {
    let config_path = path
        .map(Path::to_path_buf)
        .or_else(crate::loader::find_config_file);

    let Some(actual_path) = config_path else {
        let mut result = validate_config(&EkittenConfig::default());
        result.diagnostics.push(Diagnostic {
            severity: Severity::Info,
            path: String::new(),
            message: "no config file found; using defaults".into(),
        });
        return result;
    };

    let mut result = match crate::loader::load_config(&actual_path) {
        Ok(config) => validate_config(&config),
        Err(e) => ValidationResult {
            diagnostics: vec![Diagnostic::error("", format!("failed to load config: {e}"))],
            config_path: None,
        },
    };
    result.config_path = Some(actual_path);
    result
}

/// Semantic checks on a parsed config.
#[must_use]
pub fn validate_config(config: &EkittenConfig) -> ValidationResult {
    let mut diagnostics = Vec::new();

    for (path, p) in [
        ("engagement.reply_probability", config.engagement.reply_probability),
        ("reactions.probability", config.reactions.probability),
        ("reactions.model_probability", config.reactions.model_probability),
        ("media.injection_probability", config.media.injection_probability),
        ("proactive.probability", config.proactive.probability),
    ] {
        if let Err(e) = check_probability(p) {
            diagnostics.push(Diagnostic::error(path, e.to_string()));
        }
    }

    if config
        .identity
        .aliases
        .iter()
        .all(|a| a.trim().is_empty())
    {
        diagnostics.push(Diagnostic::error(
            "identity.aliases",
            "at least one non-empty alias is required",
        ));
    }

    if config.engagement.history_limit == 0 || config.engagement.history_limit > 100 {
        diagnostics.push(Diagnostic::error(
            "engagement.history_limit",
            "must be between 1 and 100",
        ));
    }

    if config.media.directive_keyword.trim().is_empty() {
        diagnostics.push(Diagnostic::error(
            "media.directive_keyword",
            "must not be empty",
        ));
    }

    if config.reactions.enabled && config.reactions.emojis.is_empty() {
        diagnostics.push(Diagnostic::warning(
            "reactions.emojis",
            "reactions are enabled but the curated emoji set is empty",
        ));
    }

    check_proactive(config, &mut diagnostics);

    if config.metrics.enabled
        && let Some(listen) = &config.metrics.listen
        && listen.parse::<std::net::SocketAddr>().is_err()
    {
        diagnostics.push(Diagnostic::error(
            "metrics.listen",
            format!("invalid socket address: {listen:?}"),
        ));
    }

    if config.discord.token.is_none() {
        diagnostics.push(Diagnostic::warning(
            "discord.token",
            "no Discord token configured (set DISCORD_TOKEN)",
        ));
    }
    if config.providers.gemini.api_key.is_none() {
        diagnostics.push(Diagnostic::warning(
            "providers.gemini.api_key",
            "no Gemini API key configured (set GEMINI_API_KEY)",
        ));
    }

    ValidationResult {
        diagnostics,
        config_path: None,
    }
}

fn check_proactive(config: &EkittenConfig, diagnostics: &mut Vec<Diagnostic>) {
    let proactive = &config.proactive;
    let hours = &proactive.active_hours;

    if hours.start_hour > 23 || hours.end_hour > 24 || hours.start_hour >= hours.end_hour {
        diagnostics.push(Diagnostic::error(
            "proactive.active_hours",
            format!(
                "invalid window {}..{} (need start < end, start <= 23, end <= 24)",
                hours.start_hour, hours.end_hour
            ),
        ));
    }

    if hours.timezone.parse::<chrono_tz::Tz>().is_err() {
        diagnostics.push(Diagnostic::error(
            "proactive.active_hours.timezone",
            format!("unknown timezone: {}", hours.timezone),
        ));
    }

    match parse_interval_ms(&proactive.every) {
        Some(0) | None => diagnostics.push(Diagnostic::error(
            "proactive.every",
            format!("invalid interval: {:?}", proactive.every),
        )),
        Some(_) => {},
    }

    if parse_interval_ms(&proactive.inactivity).is_none() {
        diagnostics.push(Diagnostic::error(
            "proactive.inactivity",
            format!("invalid interval: {:?}", proactive.inactivity),
        ));
    }

    if proactive.channel_pattern.trim().is_empty() {
        diagnostics.push(Diagnostic::error(
            "proactive.channel_pattern",
            "must not be empty",
        ));
    }
}
