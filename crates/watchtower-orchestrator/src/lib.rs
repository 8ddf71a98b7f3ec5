//! The watchtower orchestrator (spec.md §4.9): owns the tick loop and
//! wires the poller, fetcher, signal derivation, scoring, persistence,
//! and transparency log together. Runs single-threaded cooperative
//! (spec.md §5) — ticks are serial, I/O suspends, CPU-bound steps don't.

pub mod config;
pub mod error;
pub mod pipeline;

pub use config::{load_config, OrchestratorConfig};
pub use error::{OrchestratorError, OrchestratorResult};
pub use pipeline::{run_tick, TickReport};
