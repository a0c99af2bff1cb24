//! Tenor v2 GIF search.

use std::{collections::HashMap, sync::Arc, time::Duration};

use {
    async_trait::async_trait,
    ekitten_common::{RandomSource, ThreadRandom, random::pick},
    ekitten_config::TenorConfig,
    secrecy::{ExposeSecret, Secret},
    serde::Deserialize,
    tracing::{debug, warn},
};

#[cfg(feature = "metrics")]
use ekitten_metrics::{counter, labels, media as media_metrics};

use crate::{
    error::{Error, Result},
    search::MediaSearch,
};

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    results: Vec<SearchResult>,
}

#[derive(Debug, Deserialize)]
struct SearchResult {
    #[serde(default)]
    media_formats: HashMap<String, MediaFormat>,
}

#[derive(Debug, Deserialize)]
struct MediaFormat {
    url: String,
}

/// Tenor search client; picks one GIF at random among the top results.
pub struct TenorSearch {
    api_key: Secret<String>,
    client_key: String,
    base_url: String,
    limit: u8,
    client: reqwest::Client,
    rng: Arc<dyn RandomSource>,
}

impl TenorSearch {
    pub fn new(api_key: Secret<String>, config: &TenorConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| Error::external("building tenor client", e))?;
        Ok(Self {
            api_key,
            client_key: config.client_key.clone(),
            base_url: config.base_url.trim_end_matches('/').to_string(),
            limit: config.limit.max(1),
            client,
            rng: Arc::new(ThreadRandom),
        })
    }

    /// `None` when no API key is configured.
    pub fn from_config(config: &TenorConfig) -> Result<Option<Self>> {
        match &config.api_key {
            Some(key) => Self::new(key.clone(), config).map(Some),
            None => Ok(None),
        }
    }

    #[must_use]
    pub fn with_random(mut self, rng: Arc<dyn RandomSource>) -> Self {
        self.rng = rng;
        self
    }

    async fn search_urls(&self, term: &str) -> Result<Vec<String>> {
        let url = format!("{}/v2/search", self.base_url);
        let limit = self.limit.to_string();
        let resp = self
            .client
            .get(&url)
            .query(&[
                ("q", term),
                ("key", self.api_key.expose_secret().as_str()),
                ("client_key", self.client_key.as_str()),
                ("limit", limit.as_str()),
                ("media_filter", "gif"),
            ])
            .send()
            .await
            .map_err(|e| Error::external("tenor search request", e))?;

        let status = resp.status();
        if !status.is_success() {
            return Err(Error::Status {
                status: status.as_u16(),
            });
        }

        let body: SearchResponse = resp
            .json()
            .await
            .map_err(|e| Error::external("decoding tenor response", e))?;
        Ok(body
            .results
            .into_iter()
            .filter_map(|mut r| r.media_formats.remove("gif"))
            .map(|f| f.url)
            .collect())
    }
}

#[async_trait]
impl MediaSearch for TenorSearch {
    async fn search(&self, term: &str) -> Option<String> {
        let term = term.trim();
        if term.is_empty() {
            return None;
        }

        #[cfg(feature = "metrics")]
        counter!(media_metrics::LOOKUPS_TOTAL, labels::SOURCE => "tenor").increment(1);

        match self.search_urls(term).await {
            Ok(urls) => {
                let picked = pick(self.rng.as_ref(), &urls).cloned();
                if picked.is_none() {
                    debug!(term, "no gif results");
                }
                picked
            },
            Err(e) => {
                warn!(term, error = %e, "gif search failed");
                None
            },
        }
    }
}
