use std::sync::Arc;

use {
    ekitten_agents::TextGenerator,
    ekitten_channels::{ChatPlatform, EngagementStore},
    ekitten_common::{Clock, RandomSource},
    ekitten_media::MediaSearch,
    tracing::warn,
};

/// Collaborators shared by the reply engine and the proactive scheduler.
#[derive(Clone)]
pub struct Services {
    pub platform: Arc<dyn ChatPlatform>,
    pub generator: Arc<dyn TextGenerator>,
    pub media: Arc<dyn MediaSearch>,
    pub store: Arc<dyn EngagementStore>,
    pub clock: Arc<dyn Clock>,
    pub rng: Arc<dyn RandomSource>,
}

impl Services {
    /// Send `content` to `channel_id` split into platform-sized segments,
    /// then attach `media` if present. Returns how many sends succeeded.
    ///
    /// Used for messages that do not reply to anyone (proactive, welcome).
    pub async fn post(&self, channel_id: &str, segments: &[String], media: Option<&str>) -> usize {
        let mut sent = 0;
        for segment in segments.iter().map(String::as_str).chain(media) {
            match self.platform.send(channel_id, segment).await {
                Ok(()) => sent += 1,
                Err(e) => warn!(channel_id, error = %e, "failed to send message"),
            }
        }
        sent
    }
}
