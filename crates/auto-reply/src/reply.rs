use std::sync::Arc;

use {
    ekitten_common::types::{ChannelMessage, InboundMessage, MemberJoin},
    ekitten_config::EkittenConfig,
    tracing::{debug, info, warn},
};

#[cfg(feature = "metrics")]
use ekitten_metrics::{counter, engine as engine_metrics, histogram, labels, llm as llm_metrics};

use crate::{
    context::ContextAssembler,
    error::Result,
    reaction::ReactionSelector,
    services::Services,
    shaper::{ResponseShaper, ShapedResponse},
    trigger::{Trigger, TriggerEvaluator, TriggerInputs},
    welcome::WelcomeGreeter,
};

/// What happened to one inbound message.
#[derive(Debug, Clone, PartialEq)]
pub enum MessageOutcome {
    /// Automated author, or the platform is not ready.
    Ignored,
    Suppressed,
    Replied {
        trigger: Trigger,
        segments: Vec<String>,
        /// Media URL attached after the text.
        media: Option<String>,
    },
    /// Generation failed or produced nothing; the apology was sent.
    Fallback { trigger: Trigger },
}

/// Handles inbound messages end to end.
pub struct ReplyEngine {
    services: Services,
    evaluator: TriggerEvaluator,
    assembler: ContextAssembler,
    shaper: Arc<ResponseShaper>,
    reactions: Arc<ReactionSelector>,
    welcome: WelcomeGreeter,
    fallback_reply: String,
}

impl ReplyEngine {
    pub fn new(config: &EkittenConfig, services: Services) -> Result<Self> {
        let shaper = Arc::new(ResponseShaper::new(&config.identity, &config.media)?);
        let reactions = Arc::new(ReactionSelector::new(
            &config.reactions,
            Arc::clone(&services.generator),
            Arc::clone(&services.rng),
        ));
        let welcome = WelcomeGreeter::new(
            &config.welcome,
            &config.proactive.channel_pattern,
            services.clone(),
            Arc::clone(&shaper),
        );
        Ok(Self {
            evaluator: TriggerEvaluator::new(&config.identity, &config.engagement),
            assembler: ContextAssembler::new(&config.identity, &config.engagement),
            shaper,
            reactions,
            welcome,
            fallback_reply: config.identity.fallback_reply.clone(),
            services,
        })
    }

    /// Replace the reaction selector, e.g. to give it its own randomness.
    #[must_use]
    pub fn with_reactions(mut self, reactions: ReactionSelector) -> Self {
        self.reactions = Arc::new(reactions);
        self
    }

    pub fn services(&self) -> &Services {
        &self.services
    }

    pub fn shaper(&self) -> Arc<ResponseShaper> {
        Arc::clone(&self.shaper)
    }

    /// Process one message-create event. Never fails: every error is logged
    /// and turned into an outcome.
    pub async fn handle_message(&self, msg: InboundMessage) -> MessageOutcome {
        if msg.author().is_bot {
            return MessageOutcome::Ignored;
        }
        let Some(bot_user_id) = self.services.platform.bot_user_id() else {
            debug!(channel_id = msg.channel_id(), "platform not ready, ignoring message");
            return MessageOutcome::Ignored;
        };

        #[cfg(feature = "metrics")]
        let start = std::time::Instant::now();
        #[cfg(feature = "metrics")]
        counter!(engine_metrics::MESSAGES_RECEIVED_TOTAL).increment(1);

        if !msg.content().trim().is_empty() {
            self.spawn_reaction(msg.message.clone());
        }

        let channel_id = msg.channel_id().to_string();
        let evaluation = self
            .evaluator
            .evaluate(&msg, TriggerInputs {
                bot_user_id: &bot_user_id,
                last_spoke_at: self.services.store.last_spoke(&channel_id),
                now: self.services.clock.now(),
                platform: self.services.platform.as_ref(),
                rng: self.services.rng.as_ref(),
            })
            .await;
        let trigger = evaluation.trigger;
        if !trigger.is_reply() {
            #[cfg(feature = "metrics")]
            counter!(engine_metrics::SUPPRESSED_TOTAL).increment(1);
            debug!(channel_id = %channel_id, "not replying");
            return MessageOutcome::Suppressed;
        }

        info!(
            channel_id = %channel_id,
            author = %msg.author().display_name,
            trigger = trigger.as_str(),
            "replying"
        );
        #[cfg(feature = "metrics")]
        counter!(engine_metrics::REPLIES_TOTAL, labels::TRIGGER => trigger.as_str()).increment(1);

        if let Err(e) = self.services.platform.send_typing(&channel_id).await {
            debug!(channel_id = %channel_id, error = %e, "failed to send typing indicator");
        }

        let prompt = self
            .assembler
            .assemble(
                self.services.platform.as_ref(),
                &channel_id,
                &bot_user_id,
                &evaluation.query,
            )
            .await;

        #[cfg(feature = "metrics")]
        counter!(llm_metrics::GENERATIONS_TOTAL).increment(1);

        let outcome = match self.services.generator.generate(&prompt).await {
            Ok(raw) => {
                let shaped = self.shaper.shape(&raw, self.services.rng.as_ref());
                self.deliver(&msg.message, trigger, shaped).await
            },
            Err(e) => {
                #[cfg(feature = "metrics")]
                counter!(llm_metrics::GENERATION_ERRORS_TOTAL, labels::REASON => e.kind()).increment(1);
                warn!(channel_id = %channel_id, error = %e, "generation failed, sending fallback");
                self.send_fallback(&msg.message, trigger).await
            },
        };

        self.services
            .store
            .record_spoke(&channel_id, self.services.clock.now());

        #[cfg(feature = "metrics")]
        histogram!(engine_metrics::REPLY_DURATION_SECONDS).record(start.elapsed().as_secs_f64());

        outcome
    }

    /// Greet a new member. Returns the channel the greeting went to.
    pub async fn handle_member_join(&self, join: MemberJoin) -> Option<String> {
        self.welcome.greet(&join).await
    }

    fn spawn_reaction(&self, message: ChannelMessage) {
        let reactions = Arc::clone(&self.reactions);
        let platform = Arc::clone(&self.services.platform);
        tokio::spawn(async move {
            reactions.react(platform.as_ref(), &message).await;
        });
    }

    async fn deliver(
        &self,
        message: &ChannelMessage,
        trigger: Trigger,
        shaped: ShapedResponse,
    ) -> MessageOutcome {
        let media = match shaped.media_term.as_deref() {
            Some(term) => self.services.media.search(term).await,
            None => None,
        };
        if shaped.segments.is_empty() && media.is_none() {
            debug!(channel_id = %message.channel_id, "nothing left after shaping");
            return self.send_fallback(message, trigger).await;
        }

        for segment in &shaped.segments {
            if let Err(e) = self.services.platform.reply(message, segment).await {
                warn!(channel_id = %message.channel_id, error = %e, "failed to send reply segment");
            }
        }
        #[cfg(feature = "metrics")]
        counter!(engine_metrics::SEGMENTS_SENT_TOTAL).increment(shaped.segments.len() as u64);

        if let Some(url) = &media {
            match self.services.platform.reply(message, url).await {
                Ok(()) => {
                    #[cfg(feature = "metrics")]
                    counter!(ekitten_metrics::media::ATTACHED_TOTAL).increment(1);
                },
                Err(e) => warn!(channel_id = %message.channel_id, error = %e, "failed to send media"),
            }
        }

        MessageOutcome::Replied {
            trigger,
            segments: shaped.segments,
            media,
        }
    }

    async fn send_fallback(&self, message: &ChannelMessage, trigger: Trigger) -> MessageOutcome {
        #[cfg(feature = "metrics")]
        counter!(engine_metrics::FALLBACKS_TOTAL).increment(1);
        if let Err(e) = self.services.platform.reply(message, &self.fallback_reply).await {
            warn!(channel_id = %message.channel_id, error = %e, "failed to send fallback reply");
        }
        MessageOutcome::Fallback { trigger }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use {
        super::*,
        crate::testing::{RecordingPlatform, ScriptedGenerator, SentMessage, guild_message},
        async_trait::async_trait,
        chrono::{Duration, TimeZone, Utc},
        ekitten_channels::{EngagementStore, InMemoryEngagementStore},
        ekitten_common::{
            Clock, ManualClock, ScriptedRandom,
            types::{Author, ChannelKind},
        },
        ekitten_media::{DisabledMediaSearch, MediaSearch},
    };

    const BOT: &str = "999";

    struct FixedMedia;

    #[async_trait]
    impl MediaSearch for FixedMedia {
        async fn search(&self, term: &str) -> Option<String> {
            Some(format!("https://gifs.example/{}.gif", term.replace(' ', "-")))
        }
    }

    struct Harness {
        platform: Arc<RecordingPlatform>,
        generator: ScriptedGenerator,
        store: Arc<InMemoryEngagementStore>,
        clock: Arc<ManualClock>,
        engine: ReplyEngine,
    }

    fn harness_with(
        generator: ScriptedGenerator,
        rolls: impl IntoIterator<Item = f64>,
        media: Arc<dyn MediaSearch>,
    ) -> Harness {
        let mut config = EkittenConfig::default();
        config.media.injection_probability = 0.0;
        let platform = Arc::new(RecordingPlatform::new(BOT));
        let store = Arc::new(InMemoryEngagementStore::new());
        let clock = Arc::new(ManualClock::new(
            Utc.with_ymd_and_hms(2024, 5, 1, 15, 0, 0).unwrap(),
        ));
        let services = Services {
            platform: platform.clone(),
            generator: Arc::new(generator.clone()),
            media,
            store: store.clone(),
            clock: clock.clone(),
            rng: Arc::new(ScriptedRandom::new(rolls)),
        };
        let no_reactions = ReactionSelector::new(
            &config.reactions,
            Arc::new(generator.clone()),
            Arc::new(ScriptedRandom::constant(0.99)),
        );
        let engine = ReplyEngine::new(&config, services)
            .unwrap()
            .with_reactions(no_reactions);
        Harness {
            platform,
            generator,
            store,
            clock,
            engine,
        }
    }

    fn harness(generator: ScriptedGenerator) -> Harness {
        harness_with(generator, [], Arc::new(DisabledMediaSearch))
    }

    fn mention(content: &str) -> InboundMessage {
        let mut msg = guild_message("c1", "u1", content);
        msg.mentions = vec![BOT.into()];
        msg
    }

    #[tokio::test]
    async fn bot_authors_are_ignored() {
        let h = harness(ScriptedGenerator::replying("hi"));
        let mut msg = mention("<@999> hi");
        msg.message.author = Author::bot("other", "dyno");
        assert_eq!(h.engine.handle_message(msg).await, MessageOutcome::Ignored);
        assert!(h.platform.sent().is_empty());
        assert!(h.generator.prompts().is_empty());
    }

    #[tokio::test]
    async fn not_ready_platform_ignores() {
        let mut h = harness(ScriptedGenerator::replying("hi"));
        let mut services = h.engine.services().clone();
        services.platform = Arc::new(RecordingPlatform::not_ready());
        h.engine = ReplyEngine::new(&EkittenConfig::default(), services).unwrap();
        assert_eq!(h.engine.handle_message(mention("hi")).await, MessageOutcome::Ignored);
    }

    #[tokio::test]
    async fn mention_gets_a_reply_and_records_engagement() {
        let h = harness(ScriptedGenerator::replying("e-kitten: Hi there!"));
        let msg = mention("<@999> hello");
        let msg_id = msg.message.id.clone();

        let outcome = h.engine.handle_message(msg).await;
        assert_eq!(outcome, MessageOutcome::Replied {
            trigger: Trigger::Mention,
            segments: vec!["Hi there!".into()],
            media: None,
        });
        assert_eq!(h.platform.typing(), vec!["c1".to_string()]);
        assert_eq!(h.platform.sent(), vec![SentMessage {
            channel_id: "c1".into(),
            content: "Hi there!".into(),
            reply_to: Some(msg_id),
        }]);
        assert_eq!(h.generator.prompts(), vec!["hello".to_string()]);
        assert_eq!(h.store.last_spoke("c1"), Some(h.clock.now()));
    }

    #[tokio::test]
    async fn prompt_includes_history() {
        let h = harness(ScriptedGenerator::replying("purr"));
        let t0 = h.clock.now() - Duration::minutes(10);
        h.platform
            .push_message("c1", Author::human("u2", "bob"), "cats are great", t0);
        h.engine.handle_message(mention("<@999> agree?")).await;
        assert_eq!(
            h.generator.prompts(),
            vec!["bob: cats are great\n\nCurrent message to respond to: agree?".to_string()]
        );
    }

    #[tokio::test]
    async fn suppressed_message_sends_nothing() {
        let h = harness_with(ScriptedGenerator::replying("hi"), [0.9], Arc::new(DisabledMediaSearch));
        let outcome = h.engine.handle_message(guild_message("c1", "u1", "just chatting")).await;
        assert_eq!(outcome, MessageOutcome::Suppressed);
        assert!(h.platform.sent().is_empty());
        assert!(h.platform.typing().is_empty());
        assert_eq!(h.store.last_spoke("c1"), None);
    }

    #[tokio::test]
    async fn generation_failure_sends_fallback_and_records() {
        let h = harness(ScriptedGenerator::failing());
        let outcome = h.engine.handle_message(mention("<@999> hi")).await;
        assert_eq!(outcome, MessageOutcome::Fallback {
            trigger: Trigger::Mention
        });
        let sent = h.platform.sent();
        assert_eq!(sent.len(), 1);
        assert_eq!(
            sent[0].content,
            "Sorry, I encountered an error while processing your request."
        );
        assert!(h.store.last_spoke("c1").is_some());
    }

    #[tokio::test]
    async fn engagement_window_follows_a_reply() {
        let h = harness_with(
            ScriptedGenerator::replying("meow"),
            [0.9, 0.9],
            Arc::new(DisabledMediaSearch),
        );
        h.engine.handle_message(mention("<@999> hi")).await;

        h.clock.advance(Duration::seconds(60));
        let outcome = h.engine.handle_message(guild_message("c1", "u2", "what?")).await;
        assert!(matches!(outcome, MessageOutcome::Replied {
            trigger: Trigger::Engaged { elapsed_ms: 60_000 },
            ..
        }));

        h.clock.advance(Duration::minutes(3));
        let outcome = h.engine.handle_message(guild_message("c1", "u2", "ok")).await;
        assert_eq!(outcome, MessageOutcome::Suppressed);
    }

    #[tokio::test]
    async fn long_reply_is_split() {
        let h = harness(ScriptedGenerator::replying(&"x".repeat(2500)));
        let outcome = h.engine.handle_message(mention("<@999> essay please")).await;
        let MessageOutcome::Replied { segments, .. } = outcome else {
            panic!("expected a reply");
        };
        assert_eq!(segments.len(), 2);
        let sent = h.platform.sent();
        assert_eq!(sent.len(), 2);
        assert_eq!(sent[0].content.len(), 1900);
        assert_eq!(sent[1].content.len(), 600);
    }

    #[tokio::test]
    async fn media_directive_attaches_gif() {
        let h = harness_with(
            ScriptedGenerator::replying("So cute!\nMEDIA: \"happy cat\""),
            [],
            Arc::new(FixedMedia),
        );
        let outcome = h.engine.handle_message(mention("<@999> show me a cat")).await;
        assert_eq!(outcome, MessageOutcome::Replied {
            trigger: Trigger::Mention,
            segments: vec!["So cute!".into()],
            media: Some("https://gifs.example/happy-cat.gif".into()),
        });
        let contents: Vec<_> = h.platform.sent().into_iter().map(|s| s.content).collect();
        assert_eq!(contents, ["So cute!", "https://gifs.example/happy-cat.gif"]);
    }

    #[tokio::test]
    async fn directive_without_result_keeps_text_only() {
        let h = harness(ScriptedGenerator::replying("Nice\nMEDIA: nothing"));
        let outcome = h.engine.handle_message(mention("<@999> hey")).await;
        assert_eq!(outcome, MessageOutcome::Replied {
            trigger: Trigger::Mention,
            segments: vec!["Nice".into()],
            media: None,
        });
    }

    #[tokio::test]
    async fn empty_shaped_output_falls_back() {
        let h = harness(ScriptedGenerator::replying("e-kitten:"));
        let outcome = h.engine.handle_message(mention("<@999> hey")).await;
        assert_eq!(outcome, MessageOutcome::Fallback {
            trigger: Trigger::Mention
        });
    }

    #[tokio::test]
    async fn empty_dm_replies_to_placeholder() {
        let h = harness(ScriptedGenerator::replying("Hi!"));
        let mut msg = guild_message("d1", "u1", "");
        msg.kind = ChannelKind::Direct;
        msg.guild_id = None;
        let outcome = h.engine.handle_message(msg).await;
        assert!(matches!(outcome, MessageOutcome::Replied {
            trigger: Trigger::DirectMessage,
            ..
        }));
        assert_eq!(h.generator.prompts(), vec!["Hello!".to_string()]);
    }

    #[tokio::test]
    async fn send_failures_still_record_engagement() {
        let h = harness(ScriptedGenerator::replying("hi"));
        h.platform.fail_sends(true);
        let outcome = h.engine.handle_message(mention("<@999> hi")).await;
        assert!(matches!(outcome, MessageOutcome::Replied { .. }));
        assert!(h.store.last_spoke("c1").is_some());
    }

    #[tokio::test]
    async fn reaction_runs_detached() {
        let h = harness(ScriptedGenerator::replying("hi"));
        let config = EkittenConfig::default();
        let always = ReactionSelector::new(
            &config.reactions,
            Arc::new(ScriptedGenerator::failing()),
            Arc::new(ScriptedRandom::constant(0.0)),
        );
        let engine = ReplyEngine::new(&config, h.engine.services().clone())
            .unwrap()
            .with_reactions(always);

        let msg = mention("<@999> hello");
        let msg_id = msg.message.id.clone();
        engine.handle_message(msg).await;

        for _ in 0..50 {
            if !h.platform.reactions().is_empty() {
                break;
            }
            tokio::time::sleep(std::time::Duration::from_millis(10)).await;
        }
        let reactions = h.platform.reactions();
        assert_eq!(reactions.len(), 1);
        assert_eq!(reactions[0].0, msg_id);
    }
}
