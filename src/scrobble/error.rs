use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ScrobbleError {
    /// Transport-level failure talking to the API.
    #[error("request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// The API answered with an error object.
    #[error("Last.fm error {code}: {message}")]
    Api { code: u32, message: String },

    #[error("Last.fm API key and secret are not configured")]
    MissingCredentials,

    #[error("timed out waiting for authorization")]
    Timeout,

    #[error("authorization cancelled")]
    Cancelled,

    #[error("session store {}: {message}", path.display())]
    Store { path: PathBuf, message: String },

    #[error("unexpected response: {0}")]
    Parse(String),
}

impl ScrobbleError {
    pub(crate) fn store(path: impl Into<PathBuf>, message: impl ToString) -> Self {
        Self::Store {
            path: path.into(),
            message: message.to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, ScrobbleError>;
