//! Background work on a timer: the proactive scheduler that starts
//! conversations in idle channels during active hours.

pub mod active_hours;
pub mod error;
pub mod proactive;

pub use {
    active_hours::ActiveHours,
    error::{Error, Result},
    proactive::{CommunityOutcome, ProactiveScheduler, TickReport},
};
