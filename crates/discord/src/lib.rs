//! Discord adapter: serenity gateway events in, [`ChatPlatform`] calls out.
//!
//! [`ChatPlatform`]: ekitten_channels::ChatPlatform

pub mod client;
pub mod convert;
pub mod error;
pub mod handler;
pub mod platform;

pub use {
    client::build_client,
    error::{Error, Result},
    handler::DiscordHandler,
    platform::DiscordPlatform,
};
