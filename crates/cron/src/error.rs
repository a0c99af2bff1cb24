use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("unknown timezone: {timezone}")]
    UnknownTimezone { timezone: String },

    #[error("invalid interval: {value}")]
    InvalidInterval { value: String },

    #[error(transparent)]
    Shaper(#[from] ekitten_auto_reply::Error),

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

    #[must_use]
    pub fn unknown_timezone(timezone: impl Into<String>) -> Self {
        Self::UnknownTimezone {
            timezone: timezone.into(),
        }
    }

    #[must_use]
    pub fn invalid_interval(value: impl Into<String>) -> Self {
        Self::InvalidInterval {
            value: value.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
