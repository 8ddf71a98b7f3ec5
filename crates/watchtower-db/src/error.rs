//! Database error types.

use thiserror::Error;

/// Database operation errors (spec.md §7's `StorageCorruption` kind covers
/// `Migration`/`SchemaTooNew`; everything else is `TransientIO` at worst).
#[derive(Debug, Error)]
pub enum DbError {
    #[error("connection error: {0}")]
    Connection(String),

    #[error("migration error: {0}")]
    Migration(String),

    #[error("schema version {found} is newer than this build supports ({supported})")]
    SchemaTooNew { found: i64, supported: i64 },

    #[error("query error: {0}")]
    Query(#[from] sqlx::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("not found: {0}")]
    NotFound(String),
}

impl DbError {
    /// Classifies this error against the shared taxonomy so callers can
    /// dispatch without matching `DbError`'s own variants.
    pub fn kind(&self) -> watchtower_types::ErrorKind {
        use watchtower_types::ErrorKind;
        match self {
            DbError::Migration(_) | DbError::SchemaTooNew { .. } => ErrorKind::StorageCorruption,
            DbError::Serialization(_) => ErrorKind::Integrity,
            DbError::Connection(_) | DbError::Query(_) | DbError::NotFound(_) => ErrorKind::TransientIo,
        }
    }
}

pub type DbResult<T> = Result<T, DbError>;
