//! Worker error types.

use thiserror::Error;

pub type WorkerResult<T> = Result<T, WorkerError>;

#[derive(Debug, Error)]
pub enum WorkerError {
    #[error("unable to stage media file: {0}")]
    Staging(String),

    #[error("delivery failure: {0}")]
    Delivery(String),

    #[error("cleanup failure: {0}")]
    Cleanup(String),

    #[error("configuration error: {0}")]
    Config(String),

    #[error("encoding failure: {0}")]
    Media(#[from] optibot_media::MediaError),

    #[error("backend request failed: {0}")]
    Client(#[from] optibot_clients::ClientError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl WorkerError {
    pub fn staging(msg: impl Into<String>) -> Self {
        Self::Staging(msg.into())
    }

    pub fn delivery(msg: impl Into<String>) -> Self {
        Self::Delivery(msg.into())
    }

    pub fn cleanup(msg: impl Into<String>) -> Self {
        Self::Cleanup(msg.into())
    }

    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }
}
