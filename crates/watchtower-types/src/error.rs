//! Shared error taxonomy (spec.md §7): a kind, not a single type — each
//! crate defines its own `thiserror::Error` enum, but tags its fatal/
//! recoverable variants against this taxonomy so the orchestrator can
//! dispatch on it without matching concrete error types across crates.

/// Classification a component attaches to one of its own error variants.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Network/DB timeouts and 5xx — retried next tick, not tick-fatal.
    TransientIo,
    /// Fetcher refused a target — recorded as fetch status, never retried.
    SsrfBlocked,
    /// Card failed schema validation — surfaces as a signal.
    SchemaInvalid,
    /// Canonicalization/hash/signature mismatch.
    Integrity,
    /// Malformed configuration or keypair — fatal at startup.
    Config,
    /// Failed migration or constraint violation on an idempotent path.
    StorageCorruption,
}

impl ErrorKind {
    /// Startup/storage-corruption errors abort the process; everything
    /// else is recoverable at the per-agent or per-tick level.
    pub fn is_fatal_at_startup(self) -> bool {
        matches!(self, ErrorKind::Config | ErrorKind::StorageCorruption)
    }
}
