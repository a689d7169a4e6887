//! Error types for photofetch.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    /// Connection, timeout, non-success status or body read failure.
    /// The engine folds every variant of this into a retryable failure.
    #[error("transport error: {0}")]
    Transport(String),

    #[error("attempt deadline of {0:?} exceeded")]
    Deadline(std::time::Duration),

    /// Payload could not be decoded. Terminal for the affected identifier.
    #[error("decode error: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("configuration error: {0}")]
    Config(String),

    #[error("engine stopped before completion: {0}")]
    Join(#[from] tokio::task::JoinError),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("{0}")]
    Other(String),
}

impl From<reqwest::Error> for Error {
    fn from(e: reqwest::Error) -> Self {
        Self::Transport(e.to_string())
    }
}

pub type Result<T> = std::result::Result<T, Error>;
