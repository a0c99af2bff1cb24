use std::path::{Path, PathBuf};

use {
    secrecy::Secret,
    tracing::{debug, warn},
};

use crate::{env_subst::substitute_env, schema::EkittenConfig};

/// Standard config file names, checked in order.
const CONFIG_FILENAMES: &[&str] = &[
    "ekitten.toml",
    "ekitten.yaml",
    "ekitten.yml",
    "ekitten.json",
];

/// Load config from the given path (any supported format).
pub fn load_config(path: &Path) -> anyhow::Result<EkittenConfig> {
    let raw = std::fs::read_to_string(path)
        .map_err(|e| anyhow::anyhow!("failed to read {}: {e}", path.display()))?;
    let raw = substitute_env(&raw);
    parse_config(&raw, path)
}

/// Discover and load config from standard locations.
///
/// Search order:
/// 1. `./ekitten.{toml,yaml,yml,json}` (project-local)
/// 2. `~/.config/ekitten/ekitten.{toml,yaml,yml,json}` (user-global)
///
/// Returns `EkittenConfig::default()` if no config file is found or it fails
/// to load.
pub fn discover_and_load() -> EkittenConfig {
    if let Some(path) = find_config_file() {
        debug!(path = %path.display(), "loading config");
        match load_config(&path) {
            Ok(cfg) => return cfg,
            Err(e) => {
                warn!(path = %path.display(), error = %e, "failed to load config, using defaults");
            },
        }
    } else {
        debug!("no config file found, using defaults");
    }
    EkittenConfig::default()
}

/// Find the first config file in standard locations.
pub(crate) fn find_config_file() -> Option<PathBuf> {
    for name in CONFIG_FILENAMES {
        let p = PathBuf::from(name);
        if p.exists() {
            return Some(p);
        }
    }

    let config_dir = config_dir()?;
    CONFIG_FILENAMES
        .iter()
        .map(|name| config_dir.join(name))
        .find(|p| p.exists())
}

/// Returns the user-global config directory (`~/.config/ekitten/`).
pub fn config_dir() -> Option<PathBuf> {
    directories::ProjectDirs::from("", "", "ekitten").map(|d| d.config_dir().to_path_buf())
}

/// Fill secrets that the config file left empty from the process environment
/// (`DISCORD_TOKEN`, `GEMINI_API_KEY`, `TENOR_API_KEY`).
pub fn apply_env_overrides(config: &mut EkittenConfig) {
    apply_env_overrides_with(config, |name| std::env::var(name).ok());
}

fn apply_env_overrides_with(config: &mut EkittenConfig, lookup: impl Fn(&str) -> Option<String>) {
    let secret = |name: &str| {
        lookup(name)
            .filter(|v| !v.trim().is_empty())
            .map(Secret::new)
    };
    if config.discord.token.is_none() {
        config.discord.token = secret("DISCORD_TOKEN");
    }
    if config.providers.gemini.api_key.is_none() {
        config.providers.gemini.api_key = secret("GEMINI_API_KEY");
    }
    if config.providers.tenor.api_key.is_none() {
        config.providers.tenor.api_key = secret("TENOR_API_KEY");
    }
}

pub(crate) fn parse_config(raw: &str, path: &Path) -> anyhow::Result<EkittenConfig> {
    let ext = path.extension().and_then(|e| e.to_str()).unwrap_or("toml");

    match ext {
        "toml" => Ok(toml::from_str(raw)?),
        "yaml" | "yml" => Ok(serde_yaml::from_str(raw)?),
        "json" => Ok(serde_json::from_str(raw)?),
        _ => anyhow::bail!("unsupported config format: .{ext}"),
    }
}
