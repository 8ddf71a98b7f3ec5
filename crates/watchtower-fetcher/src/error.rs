//! Fetcher error types.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum FetcherError {
    #[error("invalid URL: {0}")]
    InvalidUrl(String),

    #[error("DNS resolution failed: {0}")]
    Dns(String),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
}

impl FetcherError {
    /// Classifies this error against the shared taxonomy so callers can
    /// dispatch without matching `FetcherError`'s own variants.
    pub fn kind(&self) -> watchtower_types::ErrorKind {
        use watchtower_types::ErrorKind;
        match self {
            FetcherError::InvalidUrl(_) => ErrorKind::Integrity,
            FetcherError::Dns(_) | FetcherError::Http(_) => ErrorKind::TransientIo,
        }
    }
}

pub type FetcherResult<T> = Result<T, FetcherError>;
