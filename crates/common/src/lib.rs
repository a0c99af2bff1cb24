//! Shared types, error definitions, and utilities used across all ekitten crates.

pub mod clock;
pub mod error;
pub mod random;
pub mod types;

pub use {
    clock::{Clock, ManualClock, SystemClock},
    error::{EkittenError, Error, FromMessage, Result},
    random::{RandomSource, ScriptedRandom, ThreadRandom},
};
