//! Chat platform abstraction.
//!
//! The engine and the scheduler only talk to a chat platform through the
//! [`ChatPlatform`] trait; adapters (Discord) implement it. This crate also
//! owns the per-channel engagement store and channel-name gating.

pub mod error;
pub mod gating;
pub mod platform;
pub mod store;

pub use {
    error::{Error, Result},
    platform::ChatPlatform,
    store::{EngagementStore, InMemoryEngagementStore},
};
