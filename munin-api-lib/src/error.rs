use std::time::Duration;

use thiserror::Error;

/// Errors that can occur in the API runtime
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("listener error: {0}")]
    Listener(#[from] std::io::Error),

    #[error("configuration error: {0}")]
    Config(String),

    #[error("HTTP error: {0}")]
    Http(String),

    #[error("could not derive client identity: {0}")]
    ClientIdentity(String),

    #[error("shutdown deadline of {0:?} elapsed before drain completed")]
    ShutdownTimeout(Duration),
}

pub type Result<T> = std::result::Result<T, ApiError>;
