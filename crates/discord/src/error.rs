use ekitten_common::FromMessage;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("{0}")]
    Message(String),

    #[error(transparent)]
    Common(#[from] ekitten_common::Error),

    #[error("discord: {0}")]
    Serenity(#[from] Box<serenity::Error>),
}

impl From<serenity::Error> for Error {
    fn from(err: serenity::Error) -> Self {
        Self::Serenity(Box::new(err))
    }
}

impl FromMessage for Error {
    fn from_message(message: String) -> Self {
        Self::Message(message)
    }
}

impl From<Error> for ekitten_channels::Error {
    fn from(err: Error) -> Self {
        match err {
            Error::Common(e) => Self::Common(e),
            Error::Message(message) => Self::invalid_input(message),
            Error::Serenity(e) => Self::external("discord request", *e),
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;

ekitten_common::impl_context!();
