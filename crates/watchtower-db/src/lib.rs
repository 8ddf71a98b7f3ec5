//! Embedded persistence for the watchtower (spec.md §4.3).
//!
//! A single SQLite database file backs every component: cursors, the
//! known-agent roster, identity snapshots, behavioral snapshots, risk
//! reports, and alerts. One writer connection (`Store::open`'s pool is
//! capped at `max_connections(1)`) matches the single-threaded,
//! cooperative concurrency model in spec.md §5 — there is no contention
//! to resolve, so no row-level locking is needed.

pub mod alerts;
pub mod config;
pub mod cursors;
pub mod error;
pub mod events;
pub mod identity;
pub mod reports;
pub mod snapshots;
pub mod store;

pub use config::DatabaseConfig;
pub use error::{DbError, DbResult};
pub use store::Store;
