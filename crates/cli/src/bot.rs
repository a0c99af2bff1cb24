//! Wires config, providers and the Discord gateway into a running bot.

use std::{path::Path, sync::Arc};

use {
    anyhow::{Context, Result},
    ekitten_agents::GeminiProvider,
    ekitten_auto_reply::{ReplyEngine, Services},
    ekitten_channels::InMemoryEngagementStore,
    ekitten_common::{SystemClock, ThreadRandom},
    ekitten_config::{EkittenConfig, apply_env_overrides, discover_and_load, load_config},
    ekitten_cron::ProactiveScheduler,
    ekitten_discord::{DiscordHandler, DiscordPlatform, build_client},
    ekitten_media::{DisabledMediaSearch, MediaSearch, TenorSearch},
    ekitten_metrics::{MetricsRecorderConfig, init_metrics},
    tracing::{info, warn},
};

use crate::{config_commands::print_diagnostics, metrics_server};

/// Load config from `path`, or discover it, then fill secrets from the
/// environment.
pub fn load(path: Option<&Path>) -> Result<EkittenConfig> {
    let mut config = match path {
        Some(path) => load_config(path)?,
        None => discover_and_load(),
    };
    apply_env_overrides(&mut config);
    Ok(config)
}

pub async fn run(config: EkittenConfig) -> Result<()> {
    let diagnostics = ekitten_config::validate_config(&config);
    if diagnostics.has_errors() {
        print_diagnostics(&diagnostics, false);
        anyhow::bail!("invalid configuration");
    }

    let metrics = init_metrics(MetricsRecorderConfig {
        enabled: config.metrics.enabled,
        global_labels: vec![("bot".into(), config.identity.name.clone())],
    })?;
    let metrics_server = match &config.metrics.listen {
        Some(addr) if metrics.is_installed() => {
            let addr = addr.clone();
            Some(tokio::spawn(async move {
                if let Err(e) = metrics_server::serve(&addr, metrics).await {
                    warn!(addr = %addr, error = %e, "metrics endpoint stopped");
                }
            }))
        },
        _ => None,
    };

    let token = config
        .discord
        .token
        .clone()
        .context("discord.token is not set (or DISCORD_TOKEN)")?;

    let generator =
        GeminiProvider::from_config(&config.providers.gemini, &config.identity.system_instruction)?;
    info!(model = generator.model(), "text generation ready");

    let media: Arc<dyn MediaSearch> = match TenorSearch::from_config(&config.providers.tenor)? {
        Some(tenor) => Arc::new(tenor),
        None => {
            warn!("no tenor api key, media directives will be dropped");
            Arc::new(DisabledMediaSearch)
        },
    };

    let platform = Arc::new(DiscordPlatform::new());
    let services = Services {
        platform: platform.clone(),
        generator: Arc::new(generator),
        media,
        store: Arc::new(InMemoryEngagementStore::new()),
        clock: Arc::new(SystemClock),
        rng: Arc::new(ThreadRandom),
    };

    let engine = Arc::new(ReplyEngine::new(&config, services.clone())?);
    let scheduler = ProactiveScheduler::new(&config, services)?;
    scheduler.start().await;

    let handler = DiscordHandler::new(engine, platform);
    let mut client = build_client(&token, handler).await?;
    let shard_manager = client.shard_manager.clone();

    let result = tokio::select! {
        res = client.start() => res.context("discord client stopped"),
        _ = tokio::signal::ctrl_c() => {
            info!("shutdown requested");
            shard_manager.shutdown_all().await;
            Ok(())
        },
    };

    scheduler.stop().await;
    if let Some(server) = metrics_server {
        server.abort();
    }
    info!("ekitten stopped");
    result
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use {super::*, std::io::Write};

    #[test]
    fn explicit_path_must_parse() {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        writeln!(file, "[engagement]\nreply_probability = \"lots\"").unwrap();
        assert!(load(Some(file.path())).is_err());
    }

    #[test]
    fn explicit_path_is_loaded() {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        writeln!(file, "[identity]\nname = \"Biscuit\"").unwrap();
        let config = load(Some(file.path())).unwrap();
        assert_eq!(config.identity.name, "Biscuit");
    }

    #[tokio::test]
    async fn invalid_config_refuses_to_start() {
        let mut config = EkittenConfig::default();
        config.engagement.reply_probability = 2.0;
        let err = run(config).await.unwrap_err();
        assert!(err.to_string().contains("invalid configuration"));
    }
}
