//! GIF search used to attach media to replies.

pub mod error;
pub mod search;
pub mod tenor;

pub use {
    error::{Error, Result},
    search::{DisabledMediaSearch, MediaSearch},
    tenor::TenorSearch,
};
