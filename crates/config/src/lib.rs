//! Configuration loading, validation and env substitution.
//!
//! Config files: `ekitten.toml`, `ekitten.yaml`, `ekitten.yml` or `ekitten.json`,
//! searched in `./` then `~/.config/ekitten/`.
//!
//! Supports `${ENV_VAR}` substitution in all string values.

pub mod env_subst;
pub mod interval;
pub mod loader;
pub mod schema;
pub mod validate;

pub use {
    interval::parse_interval_ms,
    loader::{apply_env_overrides, config_dir, discover_and_load, load_config},
    schema::{
        ActiveHoursConfig, DiscordConfig, EkittenConfig, EngagementConfig, GeminiConfig,
        IdentityConfig, MediaConfig, MetricsConfig, ProactiveConfig, ProvidersConfig,
        ReactionsConfig, TenorConfig, WelcomeConfig,
    },
    validate::{Diagnostic, Severity, ValidationResult, validate, validate_config},
};
