use thiserror::Error;

/// Failures surfaced by the core library. Every variant is terminal for a
/// single lookup; callers decide how to report it.
#[derive(Debug, Error)]
pub enum Error {
    /// The request could not be sent, the body could not be read, or the
    /// server answered with a non-success status and no API error document.
    #[error("transport error: {0}")]
    Transport(String),

    /// The API answered with an embedded status code other than 200.
    #[error("{0}")]
    Api(String),

    #[error(transparent)]
    Decode(#[from] DecodeError),

    #[error("invalid request url: {0}")]
    InvalidUrl(String),
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum DecodeError {
    #[error("malformed response: {0}")]
    Malformed(String),
}

impl DecodeError {
    pub(crate) fn malformed(message: impl Into<String>) -> Self {
        Self::Malformed(message.into())
    }
}

impl Error {
    /// Process exit code a binary should use for this error.
    pub fn exit_code(&self) -> u8 {
        match self {
            Error::Transport(_) => 2,
            Error::Api(_) => 3,
            Error::Decode(_) => 4,
            Error::InvalidUrl(_) => 1,
        }
    }
}
