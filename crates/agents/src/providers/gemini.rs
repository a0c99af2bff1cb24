use std::time::Duration;

use {
    async_trait::async_trait,
    ekitten_config::GeminiConfig,
    secrecy::{ExposeSecret, Secret},
    tracing::{debug, trace, warn},
};

use crate::model::{GenerationError, TextGenerator};

/// Google Gemini `generateContent` client with a fixed system instruction.
pub struct GeminiProvider {
    api_key: Secret<String>,
    model: String,
    base_url: String,
    system_instruction: String,
    client: reqwest::Client,
}

impl GeminiProvider {
    pub fn new(
        api_key: Secret<String>,
        model: String,
        base_url: String,
        system_instruction: String,
        timeout: Duration,
    ) -> Result<Self, GenerationError> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            api_key,
            model,
            base_url: base_url.trim_end_matches('/').to_string(),
            system_instruction,
            client,
        })
    }

    /// Build a provider from config. Fails when no API key is set.
    pub fn from_config(
        config: &GeminiConfig,
        system_instruction: &str,
    ) -> Result<Self, GenerationError> {
        let Some(api_key) = config.api_key.clone() else {
            return Err(GenerationError::not_configured(
                "providers.gemini.api_key is not set",
            ));
        };
        Self::new(
            api_key,
            config.model.clone(),
            config.base_url.clone(),
            system_instruction.to_string(),
            Duration::from_secs(config.timeout_secs),
        )
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    fn request_body(&self, prompt: &str) -> serde_json::Value {
        let mut body = serde_json::json!({
            "contents": [{
                "role": "user",
                "parts": [{ "text": prompt }],
            }],
        });
        if !self.system_instruction.is_empty() {
            body["systemInstruction"] = serde_json::json!({
                "parts": [{ "text": self.system_instruction }]
            });
        }
        body
    }
}

/// Concatenate the text parts of the first candidate.
fn extract_text(resp: &serde_json::Value) -> Option<String> {
    let text: String = resp["candidates"][0]["content"]["parts"]
        .as_array()?
        .iter()
        .filter_map(|part| part["text"].as_str())
        .collect();
    (!text.trim().is_empty()).then_some(text)
}

#[async_trait]
impl TextGenerator for GeminiProvider {
    async fn generate(&self, prompt: &str) -> Result<String, GenerationError> {
        let body = self.request_body(prompt);
        debug!(
            model = %self.model,
            prompt_len = prompt.len(),
            "gemini generate request"
        );

        let url = format!(
            "{}/v1beta/models/{}:generateContent",
            self.base_url, self.model
        );
        let http_resp = self
            .client
            .post(&url)
            .header("x-goog-api-key", self.api_key.expose_secret())
            .json(&body)
            .send()
            .await?;

        let status = http_resp.status();
        if !status.is_success() {
            let body_text = http_resp.text().await.unwrap_or_default();
            warn!(status = %status, body = %body_text, "gemini API error");
            return Err(GenerationError::Api {
                status: status.as_u16(),
                body: body_text,
            });
        }

        let resp = http_resp.json::<serde_json::Value>().await?;
        trace!(response = %resp, "gemini raw response");

        if let Some(reason) = resp["promptFeedback"]["blockReason"].as_str() {
            warn!(reason, "gemini blocked prompt");
            return Err(GenerationError::Blocked {
                reason: reason.to_string(),
            });
        }

        extract_text(&resp).ok_or(GenerationError::Empty)
    }
}
