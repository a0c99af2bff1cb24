//! Turns raw model output into platform-safe, in-character segments.

use {
    ekitten_common::{RandomSource, random::pick},
    ekitten_config::{IdentityConfig, MediaConfig},
    tracing::debug,
};

use crate::{
    chunk::chunk_message,
    directives::{IdentityStripper, MediaDirective},
    error::Result,
};

/// Text segments to send plus an optional media search term.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ShapedResponse {
    pub segments: Vec<String>,
    pub media_term: Option<String>,
}

impl ShapedResponse {
    pub fn is_empty(&self) -> bool {
        self.segments.is_empty() && self.media_term.is_none()
    }
}

pub struct ResponseShaper {
    identity: IdentityStripper,
    directive: MediaDirective,
    injection_probability: f64,
    injection_terms: Vec<String>,
}

impl ResponseShaper {
    pub fn new(identity: &IdentityConfig, media: &MediaConfig) -> Result<Self> {
        let mut aliases = identity.aliases.clone();
        aliases.push(identity.name.clone());
        Ok(Self {
            identity: IdentityStripper::new(&aliases)?,
            directive: MediaDirective::new(&media.directive_keyword)?,
            injection_probability: media.injection_probability,
            injection_terms: media.injection_terms.clone(),
        })
    }

    /// Strip identity leaks, pull out the media directive, maybe inject a
    /// media term, then chunk.
    pub fn shape(&self, raw: &str, rng: &dyn RandomSource) -> ShapedResponse {
        let text = self.identity.strip(raw);
        let (text, directive_term) = self.directive.extract(&text);
        let media_term = directive_term.or_else(|| self.injected_term(rng));
        if let Some(term) = &media_term {
            debug!(term = %term, "media attached to reply");
        }
        ShapedResponse {
            segments: chunk_message(&text),
            media_term,
        }
    }

    /// Only draws from `rng` when injection is enabled.
    fn injected_term(&self, rng: &dyn RandomSource) -> Option<String> {
        if self.injection_probability <= 0.0 || self.injection_terms.is_empty() {
            return None;
        }
        if !rng.chance(self.injection_probability) {
            return None;
        }
        pick(rng, &self.injection_terms).cloned()
    }
}
