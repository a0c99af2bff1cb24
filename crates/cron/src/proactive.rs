//! Proactive messages: every period, for each community, speak once in the
//! first idle candidate channel when people are around and the roll allows.

use std::{sync::Arc, time::Duration};

use {
    chrono::{DateTime, Utc},
    ekitten_agents::prompt::proactive_prompt,
    ekitten_auto_reply::{ResponseShaper, Services},
    ekitten_channels::gating::candidate_channels,
    ekitten_common::types::Community,
    ekitten_config::EkittenConfig,
    tokio::{sync::Mutex, task::JoinHandle, time::MissedTickBehavior},
    tracing::{debug, info, warn},
};

#[cfg(feature = "metrics")]
use ekitten_metrics::{counter, labels, proactive as proactive_metrics};

use crate::{
    active_hours::ActiveHours,
    error::{Error, Result},
};

/// Why a community did or did not get a proactive message this tick.
#[derive(Debug, Clone, PartialEq)]
pub enum CommunityOutcome {
    OutsideActiveHours { local_hour: u32 },
    NoOneAround,
    NoCandidateChannels,
    /// Every candidate channel was empty, last spoken in by the bot, or
    /// active too recently.
    NoEligibleChannel,
    RollFailed { channel_id: String, roll: f64 },
    Sent { channel_id: String },
    /// A platform or model call failed; the community was skipped.
    Failed { reason: String },
}

impl CommunityOutcome {
    fn as_str(&self) -> &'static str {
        match self {
            Self::OutsideActiveHours { .. } => "outside_active_hours",
            Self::NoOneAround => "no_one_around",
            Self::NoCandidateChannels => "no_candidate_channels",
            Self::NoEligibleChannel => "no_eligible_channel",
            Self::RollFailed { .. } => "roll_failed",
            Self::Sent { .. } => "sent",
            Self::Failed { .. } => "failed",
        }
    }
}

/// Result of one scheduler pass, in community order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TickReport {
    pub communities: Vec<(String, CommunityOutcome)>,
}

impl TickReport {
    /// Channels that received a message.
    pub fn sent_channels(&self) -> Vec<&str> {
        self.communities
            .iter()
            .filter_map(|(_, outcome)| match outcome {
                CommunityOutcome::Sent { channel_id } => Some(channel_id.as_str()),
                _ => None,
            })
            .collect()
    }

    pub fn outcome(&self, community_id: &str) -> Option<&CommunityOutcome> {
        self.communities
            .iter()
            .find(|(id, _)| id == community_id)
            .map(|(_, outcome)| outcome)
    }
}

/// The proactive scheduler.
pub struct ProactiveScheduler {
    enabled: bool,
    period: Duration,
    inactivity: chrono::Duration,
    probability: f64,
    channel_pattern: String,
    prompt: String,
    active_hours: ActiveHours,
    services: Services,
    shaper: ResponseShaper,
    timer_handle: Mutex<Option<JoinHandle<()>>>,
}

impl ProactiveScheduler {
    pub fn new(config: &EkittenConfig, services: Services) -> Result<Arc<Self>> {
        let proactive = &config.proactive;
        let period_ms = proactive.interval_ms();
        if period_ms == 0 {
            return Err(Error::invalid_interval(&proactive.every));
        }
        let inactivity_ms = i64::try_from(proactive.inactivity_ms())
            .map_err(|_| Error::invalid_interval(&proactive.inactivity))?;
        Ok(Arc::new(Self {
            enabled: proactive.enabled,
            period: Duration::from_millis(period_ms),
            inactivity: chrono::Duration::milliseconds(inactivity_ms),
            probability: proactive.probability,
            channel_pattern: proactive.channel_pattern.clone(),
            prompt: proactive_prompt(proactive.prompt.as_deref()),
            active_hours: ActiveHours::from_config(&proactive.active_hours)?,
            shaper: ResponseShaper::new(&config.identity, &config.media)?,
            services,
            timer_handle: Mutex::new(None),
        }))
    }

    pub fn period(&self) -> Duration {
        self.period
    }

    /// Start the timer loop. The first pass runs one period from now.
    pub async fn start(self: &Arc<Self>) {
        if !self.enabled {
            info!("proactive messages disabled");
            return;
        }
        let mut handle = self.timer_handle.lock().await;
        if handle.is_some() {
            return;
        }

        let svc = Arc::clone(self);
        *handle = Some(tokio::spawn(async move {
            svc.timer_loop().await;
        }));
        info!(period_secs = self.period.as_secs(), "proactive scheduler started");
    }

    /// Stop the timer loop.
    pub async fn stop(&self) {
        if let Some(h) = self.timer_handle.lock().await.take() {
            h.abort();
            info!("proactive scheduler stopped");
        }
    }

    async fn timer_loop(self: &Arc<Self>) {
        let start = tokio::time::Instant::now() + self.period;
        let mut ticker = tokio::time::interval_at(start, self.period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        loop {
            ticker.tick().await;
            let report = self.tick().await;
            debug!(
                communities = report.communities.len(),
                sent = report.sent_channels().len(),
                "proactive tick finished"
            );
        }
    }

    /// Run one pass over every community. Never fails: per-community errors
    /// are logged and reported.
    pub async fn tick(&self) -> TickReport {
        #[cfg(feature = "metrics")]
        counter!(proactive_metrics::TICKS_TOTAL).increment(1);

        let mut report = TickReport::default();
        let Some(bot_user_id) = self.services.platform.bot_user_id() else {
            debug!("platform not ready, skipping proactive tick");
            return report;
        };
        let communities = match self.services.platform.communities().await {
            Ok(c) => c,
            Err(e) => {
                warn!(error = %e, "failed to list communities");
                return report;
            },
        };

        for community in &communities {
            let outcome = self.visit(community, &bot_user_id).await;
            match &outcome {
                CommunityOutcome::Sent { channel_id } => {
                    #[cfg(feature = "metrics")]
                    counter!(proactive_metrics::MESSAGES_SENT_TOTAL).increment(1);
                    info!(community = %community.name, channel_id = %channel_id, "sent proactive message");
                },
                CommunityOutcome::Failed { reason } => {
                    warn!(community = %community.name, reason = %reason, "proactive pass failed");
                },
                other => {
                    #[cfg(feature = "metrics")]
                    counter!(proactive_metrics::COMMUNITIES_SKIPPED_TOTAL, labels::REASON => other.as_str())
                        .increment(1);
                    debug!(community = %community.name, outcome = other.as_str(), "no proactive message");
                },
            }
            report.communities.push((community.id.clone(), outcome));
        }
        report
    }

    async fn visit(&self, community: &Community, bot_user_id: &str) -> CommunityOutcome {
        let now = self.services.clock.now();
        if !self.active_hours.contains(now) {
            return CommunityOutcome::OutsideActiveHours {
                local_hour: self.active_hours.local_hour(now),
            };
        }

        match self.services.platform.presences(&community.id).await {
            Ok(presences) if presences.iter().any(|p| p.is_available_human()) => {},
            Ok(_) => return CommunityOutcome::NoOneAround,
            Err(e) => {
                return CommunityOutcome::Failed {
                    reason: format!("presences: {e}"),
                };
            },
        }

        let candidates = candidate_channels(community, &self.channel_pattern);
        if candidates.is_empty() {
            return CommunityOutcome::NoCandidateChannels;
        }

        for channel in candidates {
            match self.is_idle(&channel.id, bot_user_id, now).await {
                Ok(true) => return self.roll_and_send(&channel.id).await,
                Ok(false) => {},
                Err(reason) => return CommunityOutcome::Failed { reason },
            }
        }
        CommunityOutcome::NoEligibleChannel
    }

    /// A channel is idle when its latest message is from someone else and at
    /// least the inactivity threshold old.
    async fn is_idle(
        &self,
        channel_id: &str,
        bot_user_id: &str,
        now: DateTime<Utc>,
    ) -> std::result::Result<bool, String> {
        let latest = self
            .services
            .platform
            .fetch_recent_messages(channel_id, 1)
            .await
            .map_err(|e| format!("history of {channel_id}: {e}"))?;
        let Some(last) = latest.first() else {
            return Ok(false);
        };
        if last.author.id == bot_user_id {
            return Ok(false);
        }
        Ok(now - last.created_at >= self.inactivity)
    }

    /// One roll for the community; on success generate, shape and send.
    async fn roll_and_send(&self, channel_id: &str) -> CommunityOutcome {
        let roll = self.services.rng.sample();
        if roll >= self.probability {
            return CommunityOutcome::RollFailed {
                channel_id: channel_id.to_string(),
                roll,
            };
        }

        let raw = match self.services.generator.generate(&self.prompt).await {
            Ok(raw) => raw,
            Err(e) => {
                return CommunityOutcome::Failed {
                    reason: format!("generation: {e}"),
                };
            },
        };
        let shaped = self.shaper.shape(&raw, self.services.rng.as_ref());
        let media = match shaped.media_term.as_deref() {
            Some(term) => self.services.media.search(term).await,
            None => None,
        };
        if self.services.post(channel_id, &shaped.segments, media.as_deref()).await == 0 {
            return CommunityOutcome::Failed {
                reason: format!("nothing sent to {channel_id}"),
            };
        }
        self.services
            .store
            .record_spoke(channel_id, self.services.clock.now());
        CommunityOutcome::Sent {
            channel_id: channel_id.to_string(),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use {
        super::*,
        chrono::TimeZone,
        ekitten_auto_reply::testing::{RecordingPlatform, ScriptedGenerator},
        ekitten_channels::{EngagementStore, InMemoryEngagementStore},
        ekitten_common::{
            Clock, ManualClock, ScriptedRandom,
            types::{Author, MemberPresence, PresenceStatus, TextChannel},
        },
        ekitten_media::DisabledMediaSearch,
    };

    const BOT: &str = "999";

    struct Harness {
        platform: Arc<RecordingPlatform>,
        store: Arc<InMemoryEngagementStore>,
        clock: Arc<ManualClock>,
        generator: ScriptedGenerator,
        scheduler: Arc<ProactiveScheduler>,
    }

    /// 15:00 UTC is 11:00 in New York in May.
    fn active_time() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 5, 1, 15, 0, 0).unwrap()
    }

    fn harness(rolls: impl IntoIterator<Item = f64>) -> Harness {
        let mut config = EkittenConfig::default();
        config.media.injection_probability = 0.0;
        let platform = Arc::new(RecordingPlatform::new(BOT));
        let store = Arc::new(InMemoryEngagementStore::new());
        let clock = Arc::new(ManualClock::new(active_time()));
        let generator = ScriptedGenerator::replying("Anyone up for cat pics?");
        let services = Services {
            platform: platform.clone(),
            generator: Arc::new(generator.clone()),
            media: Arc::new(DisabledMediaSearch),
            store: store.clone(),
            clock: clock.clone(),
            rng: Arc::new(ScriptedRandom::new(rolls)),
        };
        Harness {
            scheduler: ProactiveScheduler::new(&config, services).unwrap(),
            platform,
            store,
            clock,
            generator,
        }
    }

    fn channel(id: &str, name: &str) -> TextChannel {
        TextChannel {
            id: id.into(),
            name: name.into(),
        }
    }

    fn online(user_id: &str, is_bot: bool) -> MemberPresence {
        MemberPresence {
            user_id: user_id.into(),
            is_bot,
            status: PresenceStatus::Online,
        }
    }

    fn add_community(h: &Harness, id: &str, channels: Vec<TextChannel>, presences: Vec<MemberPresence>) {
        h.platform.add_community(
            Community {
                id: id.into(),
                name: format!("community-{id}"),
                channels,
            },
            presences,
        );
    }

    fn human_message(h: &Harness, channel_id: &str, minutes_ago: i64) {
        h.platform.push_message(
            channel_id,
            Author::human("u1", "alice"),
            "hello",
            h.clock.now() - chrono::Duration::minutes(minutes_ago),
        );
    }

    #[tokio::test]
    async fn idle_channel_gets_exactly_one_message() {
        let h = harness([0.0]);
        add_community(&h, "g1", vec![channel("c1", "general")], vec![online("u1", false)]);
        human_message(&h, "c1", 3);

        let report = h.scheduler.tick().await;
        assert_eq!(report.sent_channels(), ["c1"]);
        let sent = h.platform.sent();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].channel_id, "c1");
        assert_eq!(sent[0].content, "Anyone up for cat pics?");
        assert_eq!(sent[0].reply_to, None);
        assert_eq!(h.store.last_spoke("c1"), Some(active_time()));
        assert_eq!(h.generator.prompts(), vec![proactive_prompt(None)]);
    }

    #[tokio::test]
    async fn only_first_eligible_channel_is_used() {
        let h = harness([0.0, 0.0]);
        add_community(
            &h,
            "g1",
            vec![
                channel("c0", "rules"),
                channel("c1", "general"),
                channel("c2", "general-2"),
            ],
            vec![online("u1", false)],
        );
        human_message(&h, "c0", 60);
        human_message(&h, "c1", 10);
        human_message(&h, "c2", 10);

        let report = h.scheduler.tick().await;
        assert_eq!(report.sent_channels(), ["c1"]);
        assert_eq!(h.platform.sent().len(), 1);
    }

    #[tokio::test]
    async fn recent_or_bot_or_empty_channels_are_skipped() {
        let h = harness([0.0]);
        add_community(
            &h,
            "g1",
            vec![
                channel("empty", "general-empty"),
                channel("recent", "general-recent"),
                channel("bot", "general-bot"),
                channel("idle", "general-idle"),
            ],
            vec![online("u1", false)],
        );
        human_message(&h, "recent", 1);
        h.platform.push_message(
            "bot",
            Author::bot(BOT, "e-kitten"),
            "meow",
            h.clock.now() - chrono::Duration::minutes(30),
        );
        human_message(&h, "idle", 2);

        let report = h.scheduler.tick().await;
        assert_eq!(report.sent_channels(), ["idle"]);
    }

    #[tokio::test]
    async fn failed_roll_ends_the_community() {
        let h = harness([0.5, 0.0]);
        add_community(
            &h,
            "g1",
            vec![channel("c1", "general"), channel("c2", "general-2")],
            vec![online("u1", false)],
        );
        human_message(&h, "c1", 5);
        human_message(&h, "c2", 5);

        let report = h.scheduler.tick().await;
        assert_eq!(
            report.outcome("g1"),
            Some(&CommunityOutcome::RollFailed {
                channel_id: "c1".into(),
                roll: 0.5
            })
        );
        assert!(h.platform.sent().is_empty());
        assert!(h.store.is_empty());
    }

    #[tokio::test]
    async fn at_most_one_message_per_community() {
        let h = harness([0.0, 0.0]);
        add_community(&h, "g1", vec![channel("a1", "general")], vec![online("u1", false)]);
        add_community(&h, "g2", vec![channel("b1", "general")], vec![online("u2", false)]);
        human_message(&h, "a1", 5);
        human_message(&h, "b1", 5);

        let report = h.scheduler.tick().await;
        assert_eq!(report.sent_channels(), ["a1", "b1"]);
        assert_eq!(h.platform.sent().len(), 2);
    }

    #[tokio::test]
    async fn outside_active_hours_does_nothing() {
        let h = harness([0.0]);
        add_community(&h, "g1", vec![channel("c1", "general")], vec![online("u1", false)]);
        human_message(&h, "c1", 5);
        // 03:00 UTC is 23:00 in New York.
        h.clock.set(Utc.with_ymd_and_hms(2024, 5, 2, 3, 0, 0).unwrap());

        let report = h.scheduler.tick().await;
        assert_eq!(
            report.outcome("g1"),
            Some(&CommunityOutcome::OutsideActiveHours { local_hour: 23 })
        );
        assert!(h.platform.sent().is_empty());
    }

    #[tokio::test]
    async fn needs_an_available_human() {
        let h = harness([0.0]);
        let mut dnd = online("u2", false);
        dnd.status = PresenceStatus::DoNotDisturb;
        add_community(&h, "g1", vec![channel("c1", "general")], vec![online("b1", true), dnd]);
        human_message(&h, "c1", 5);

        let report = h.scheduler.tick().await;
        assert_eq!(report.outcome("g1"), Some(&CommunityOutcome::NoOneAround));
    }

    #[tokio::test]
    async fn no_matching_channel_names() {
        let h = harness([0.0]);
        add_community(&h, "g1", vec![channel("c1", "memes")], vec![online("u1", false)]);
        let report = h.scheduler.tick().await;
        assert_eq!(report.outcome("g1"), Some(&CommunityOutcome::NoCandidateChannels));
    }

    #[tokio::test]
    async fn generation_failure_skips_without_recording() {
        let mut config = EkittenConfig::default();
        config.media.injection_probability = 0.0;
        let h = harness([0.0]);
        let mut services = h.scheduler.services.clone();
        services.generator = Arc::new(ScriptedGenerator::failing());
        let scheduler = ProactiveScheduler::new(&config, services).unwrap();
        add_community(&h, "g1", vec![channel("c1", "general")], vec![online("u1", false)]);
        human_message(&h, "c1", 5);

        let report = scheduler.tick().await;
        assert!(matches!(report.outcome("g1"), Some(CommunityOutcome::Failed { .. })));
        assert!(h.platform.sent().is_empty());
        assert!(h.store.is_empty());
    }

    #[tokio::test]
    async fn history_failure_skips_community() {
        let h = harness([0.0]);
        add_community(&h, "g1", vec![channel("c1", "general")], vec![online("u1", false)]);
        h.platform.fail_history(true);
        let report = h.scheduler.tick().await;
        assert!(matches!(report.outcome("g1"), Some(CommunityOutcome::Failed { .. })));
    }

    #[tokio::test(start_paused = true)]
    async fn timer_fires_after_one_period() {
        let h = harness([0.0, 0.0]);
        add_community(&h, "g1", vec![channel("c1", "general")], vec![online("u1", false)]);
        human_message(&h, "c1", 5);

        h.scheduler.start().await;
        tokio::time::sleep(Duration::from_secs(299)).await;
        assert!(h.platform.sent().is_empty());

        tokio::time::sleep(Duration::from_secs(2)).await;
        assert_eq!(h.platform.sent().len(), 1);

        h.scheduler.stop().await;
        tokio::time::sleep(Duration::from_secs(600)).await;
        assert_eq!(h.platform.sent().len(), 1);
    }

    #[test]
    fn zero_interval_is_rejected() {
        let mut config = EkittenConfig::default();
        config.proactive.every = "0".into();
        let h = harness([]);
        assert!(matches!(
            ProactiveScheduler::new(&config, h.scheduler.services.clone()),
            Err(Error::InvalidInterval { .. })
        ));
    }
}
