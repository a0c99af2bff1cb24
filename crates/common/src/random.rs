//! Injectable randomness for every probabilistic branch (reply chance,
//! reactions, media injection, proactive rolls).

use std::{collections::VecDeque, sync::Mutex};

use rand::Rng;

use crate::error::{Error, Result};

/// Source of uniform samples.
pub trait RandomSource: Send + Sync {
    /// Uniform sample in `[0, 1)`.
    fn sample(&self) -> f64;

    /// Uniform index in `0..len`. `len` must be non-zero.
    fn index(&self, len: usize) -> usize;

    /// Draw one sample and report whether it falls under `probability`.
    fn chance(&self, probability: f64) -> bool {
        self.sample() < probability
    }
}

/// Pick a uniformly random element, `None` for an empty slice.
pub fn pick<'a, T>(rng: &dyn RandomSource, items: &'a [T]) -> Option<&'a T> {
    if items.is_empty() {
        return None;
    }
    items.get(rng.index(items.len()))
}

/// Validate that `p` is a probability.
pub fn check_probability(p: f64) -> Result<f64> {
    if (0.0..=1.0).contains(&p) {
        Ok(p)
    } else {
        Err(Error::Probability(p))
    }
}

/// Thread-local RNG backed randomness.
#[derive(Debug, Clone, Copy, Default)]
pub struct ThreadRandom;

impl RandomSource for ThreadRandom {
    fn sample(&self) -> f64 {
        rand::rng().random::<f64>()
    }

    fn index(&self, len: usize) -> usize {
        rand::rng().random_range(0..len)
    }
}

/// Replays a fixed sequence of samples, then a fallback value forever.
///
/// `index(len)` consumes one sample `s` and maps it to `floor(s * len)`.
#[derive(Debug)]
pub struct ScriptedRandom {
    samples: Mutex<VecDeque<f64>>,
    fallback: f64,
}

impl ScriptedRandom {
    pub fn new(samples: impl IntoIterator<Item = f64>) -> Self {
        Self {
            samples: Mutex::new(samples.into_iter().collect()),
            fallback: 0.99,
        }
    }

    /// Every draw returns `value`.
    pub fn constant(value: f64) -> Self {
        Self::new([]).with_fallback(value)
    }

    #[must_use]
    pub fn with_fallback(mut self, value: f64) -> Self {
        self.fallback = value;
        self
    }

    /// Number of scripted samples not yet consumed.
    pub fn remaining(&self) -> usize {
        self.samples.lock().unwrap_or_else(|e| e.into_inner()).len()
    }

    fn next(&self) -> f64 {
        self.samples
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .pop_front()
            .unwrap_or(self.fallback)
    }
}

impl RandomSource for ScriptedRandom {
    fn sample(&self) -> f64 {
        self.next()
    }

    fn index(&self, len: usize) -> usize {
        let idx = (self.next() * len as f64) as usize;
        idx.min(len.saturating_sub(1))
    }
}
