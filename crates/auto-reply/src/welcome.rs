//! Greets members who join a community.

use std::sync::Arc;

use {
    ekitten_agents::prompt::welcome_prompt,
    ekitten_channels::gating::candidate_channels,
    ekitten_common::types::MemberJoin,
    ekitten_config::WelcomeConfig,
    tracing::{debug, info, warn},
};

use crate::{services::Services, shaper::ResponseShaper};

pub struct WelcomeGreeter {
    enabled: bool,
    prompt: Option<String>,
    channel_pattern: String,
    services: Services,
    shaper: Arc<ResponseShaper>,
}

impl WelcomeGreeter {
    pub fn new(
        config: &WelcomeConfig,
        channel_pattern: &str,
        services: Services,
        shaper: Arc<ResponseShaper>,
    ) -> Self {
        Self {
            enabled: config.enabled,
            prompt: config.prompt.clone(),
            channel_pattern: channel_pattern.to_string(),
            services,
            shaper,
        }
    }

    /// Send a welcome to the community's first candidate channel. Returns
    /// that channel's ID when something was sent.
    pub async fn greet(&self, join: &MemberJoin) -> Option<String> {
        if !self.enabled || join.member.is_bot {
            return None;
        }

        let communities = match self.services.platform.communities().await {
            Ok(c) => c,
            Err(e) => {
                warn!(community_id = %join.community_id, error = %e, "failed to list communities");
                return None;
            },
        };
        let community = communities.iter().find(|c| c.id == join.community_id)?;
        let Some(channel) = candidate_channels(community, &self.channel_pattern).into_iter().next()
        else {
            debug!(community_id = %community.id, "no channel to welcome in");
            return None;
        };

        let prompt = welcome_prompt(self.prompt.as_deref(), &join.member.display_name);
        let raw = match self.services.generator.generate(&prompt).await {
            Ok(raw) => raw,
            Err(e) => {
                warn!(community_id = %community.id, error = %e, "welcome generation failed");
                return None;
            },
        };
        let shaped = self.shaper.shape(&raw, self.services.rng.as_ref());
        let media = match shaped.media_term.as_deref() {
            Some(term) => self.services.media.search(term).await,
            None => None,
        };
        if self.services.post(&channel.id, &shaped.segments, media.as_deref()).await == 0 {
            return None;
        }

        self.services
            .store
            .record_spoke(&channel.id, self.services.clock.now());
        info!(
            community_id = %community.id,
            channel_id = %channel.id,
            member = %join.member.display_name,
            "welcomed new member"
        );
        Some(channel.id.clone())
    }
}
