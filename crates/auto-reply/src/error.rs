#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// A configured alias or keyword produced an invalid pattern.
    #[error("invalid pattern: {0}")]
    Pattern(#[from] regex::Error),

    #[error("{message}")]
    Message { message: String },
}

impl Error {
    #[must_use]
    pub fn message(message: impl Into<String>) -> Self {
        Self::Message {
            message: message.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
