//! Orchestrator error types.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum OrchestratorError {
    #[error("configuration error: {0}")]
    Config(#[from] config::ConfigError),

    #[error(transparent)]
    Db(#[from] watchtower_db::DbError),

    #[error(transparent)]
    Poller(#[from] watchtower_poller::error::PollerError),

    #[error(transparent)]
    TransLog(#[from] watchtower_translog::TransLogError),
}

impl OrchestratorError {
    /// Classifies this error against the shared taxonomy so `main` can
    /// decide whether a config-load failure is fatal at startup.
    pub fn kind(&self) -> watchtower_types::ErrorKind {
        match self {
            OrchestratorError::Config(_) => watchtower_types::ErrorKind::Config,
            OrchestratorError::Db(e) => e.kind(),
            OrchestratorError::Poller(e) => e.kind(),
            OrchestratorError::TransLog(e) => e.kind(),
        }
    }
}

pub type OrchestratorResult<T> = Result<T, OrchestratorError>;
