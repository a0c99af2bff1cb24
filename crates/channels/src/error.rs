use std::error::Error as StdError;

/// Crate-wide result type for platform operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Typed platform errors shared by every [`ChatPlatform`](crate::ChatPlatform)
/// implementation.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Input payload or parameter is invalid.
    #[error("invalid platform input: {message}")]
    InvalidInput { message: String },

    /// The referenced message, channel or community does not exist.
    #[error("{kind} not found: {id}")]
    NotFound { kind: &'static str, id: String },

    /// Operation is currently unavailable (not connected/ready).
    #[error("platform operation unavailable: {message}")]
    Unavailable { message: String },

    /// Wrapped source error from the platform client.
    #[error("platform operation failed: {context}: {source}")]
    External {
        context: String,
        #[source]
        source: Box<dyn StdError + Send + Sync>,
    },

    /// Shared domain error (e.g. an unparseable id).
    #[error(transparent)]
    Common(#[from] ekitten_common::Error),
}

impl Error {
    #[must_use]
    pub fn invalid_input(message: impl std::fmt::Display) -> Self {
        Self::InvalidInput {
            message: message.to_string(),
        }
    }

    #[must_use]
    pub fn not_found(kind: &'static str, id: impl std::fmt::Display) -> Self {
        Self::NotFound {
            kind,
            id: id.to_string(),
        }
    }

    #[must_use]
    pub fn unavailable(message: impl std::fmt::Display) -> Self {
        Self::Unavailable {
            message: message.to_string(),
        }
    }

    #[must_use]
    pub fn external(
        context: impl Into<String>,
        source: impl StdError + Send + Sync + 'static,
    ) -> Self {
        Self::External {
            context: context.into(),
            source: Box::new(source),
        }
    }
}
