//! Inbound message processing: the glue between the chat platform and the
//! text model.
//!
//! Flow: inbound message → ignore automated authors → reaction (detached) →
//! trigger evaluation → typing indicator → context assembly → generate →
//! shape → media lookup → reply → engagement update.

pub mod chunk;
pub mod context;
pub mod directives;
pub mod error;
pub mod reaction;
pub mod reply;
pub mod services;
pub mod shaper;
#[cfg(any(test, feature = "testing"))]
pub mod testing;
pub mod trigger;
pub mod welcome;

pub use {
    error::{Error, Result},
    reaction::ReactionSelector,
    reply::{MessageOutcome, ReplyEngine},
    services::Services,
    shaper::{ResponseShaper, ShapedResponse},
    trigger::{Evaluation, Trigger, TriggerEvaluator},
};
