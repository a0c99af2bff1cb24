//! Metric names and recorder setup for ekitten.
//!
//! Crates record through the `metrics` facade macros re-exported here. When
//! the `prometheus` feature is enabled, [`init_metrics`] installs a Prometheus
//! recorder whose handle renders the text exposition format.
//!
//! ```rust,ignore
//! use ekitten_metrics::{counter, engine, labels};
//!
//! counter!(engine::REPLIES_TOTAL, labels::TRIGGER => "mention").increment(1);
//! ```

mod definitions;
mod recorder;

pub use {
    definitions::*,
    recorder::{MetricsHandle, MetricsRecorderConfig, init_metrics},
};

pub use metrics::{counter, gauge, histogram};
