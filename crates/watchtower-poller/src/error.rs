//! Poller error types.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum PollerError {
    #[error("event source error: {0}")]
    Source(String),

    #[error(transparent)]
    Db(#[from] watchtower_db::DbError),
}

impl PollerError {
    /// Classifies this error against the shared taxonomy so callers can
    /// dispatch without matching `PollerError`'s own variants.
    pub fn kind(&self) -> watchtower_types::ErrorKind {
        match self {
            PollerError::Source(_) => watchtower_types::ErrorKind::TransientIo,
            PollerError::Db(e) => e.kind(),
        }
    }
}

pub type PollerResult<T> = Result<T, PollerError>;
