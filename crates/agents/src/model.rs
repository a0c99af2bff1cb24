use async_trait::async_trait;

/// Why a generation call failed.
#[derive(Debug, thiserror::Error)]
pub enum GenerationError {
    /// The provider is missing credentials or other required settings.
    #[error("model not configured: {message}")]
    NotConfigured { message: String },

    /// Network or decoding failure.
    #[error(transparent)]
    Transport(#[from] reqwest::Error),

    /// The API answered with a non-success status.
    #[error("model API error HTTP {status}: {body}")]
    Api { status: u16, body: String },

    /// The model refused the prompt (safety filters, quota, ...).
    #[error("model blocked the prompt: {reason}")]
    Blocked { reason: String },

    /// The response contained no text.
    #[error("model returned no text")]
    Empty,
}

impl GenerationError {
    #[must_use]
    pub fn not_configured(message: impl Into<String>) -> Self {
        Self::NotConfigured {
            message: message.into(),
        }
    }

    /// Short machine-friendly reason, used as a metrics label.
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            Self::NotConfigured { .. } => "not_configured",
            Self::Transport(_) => "transport",
            Self::Api { .. } => "api",
            Self::Blocked { .. } => "blocked",
            Self::Empty => "empty",
        }
    }
}

/// A generative text model: one prompt in, one text out.
#[async_trait]
pub trait TextGenerator: Send + Sync {
    async fn generate(&self, prompt: &str) -> Result<String, GenerationError>;
}
