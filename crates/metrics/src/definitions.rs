//! Metric name constants, grouped by component.

/// Inbound message handling and replies.
pub mod engine {
    /// Inbound messages seen (after ignoring automated authors).
    pub const MESSAGES_RECEIVED_TOTAL: &str = "ekitten_messages_received_total";
    /// Replies attempted, labelled by trigger.
    pub const REPLIES_TOTAL: &str = "ekitten_replies_total";
    /// Messages the trigger evaluator suppressed.
    pub const SUPPRESSED_TOTAL: &str = "ekitten_suppressed_total";
    /// Fallback apologies sent after a generation failure.
    pub const FALLBACKS_TOTAL: &str = "ekitten_fallbacks_total";
    /// Time from receiving a message to finishing the reply.
    pub const REPLY_DURATION_SECONDS: &str = "ekitten_reply_duration_seconds";
    /// Segments sent per reply.
    pub const SEGMENTS_SENT_TOTAL: &str = "ekitten_segments_sent_total";
}

/// Emoji reactions.
pub mod reactions {
    pub const REACTIONS_TOTAL: &str = "ekitten_reactions_total";
    pub const REACTION_ERRORS_TOTAL: &str = "ekitten_reaction_errors_total";
}

/// Media attachments.
pub mod media {
    pub const LOOKUPS_TOTAL: &str = "ekitten_media_lookups_total";
    pub const ATTACHED_TOTAL: &str = "ekitten_media_attached_total";
}

/// Proactive scheduler.
pub mod proactive {
    pub const TICKS_TOTAL: &str = "ekitten_proactive_ticks_total";
    pub const MESSAGES_SENT_TOTAL: &str = "ekitten_proactive_messages_sent_total";
    pub const COMMUNITIES_SKIPPED_TOTAL: &str = "ekitten_proactive_communities_skipped_total";
}

/// Text generation.
pub mod llm {
    pub const GENERATIONS_TOTAL: &str = "ekitten_llm_generations_total";
    pub const GENERATION_ERRORS_TOTAL: &str = "ekitten_llm_generation_errors_total";
}

/// Common label keys.
pub mod labels {
    pub const TRIGGER: &str = "trigger";
    pub const SOURCE: &str = "source";
    pub const REASON: &str = "reason";
}

/// Histogram bucket boundaries.
pub mod buckets {
    /// Reply latency buckets (seconds), dominated by model latency.
    pub const REPLY_DURATION: [f64; 10] = [0.25, 0.5, 1.0, 2.0, 3.0, 5.0, 8.0, 13.0, 21.0, 60.0];
}
