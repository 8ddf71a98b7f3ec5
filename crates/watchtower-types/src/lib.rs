//! Watchtower Types - canonical domain entities for the agent registry
//! watchtower, with zero dependencies on other watchtower crates.
//!
//! This crate defines the data model in full: identifiers, events, signals,
//! reports, alerts, transparency leaves, and the configuration surface the
//! rest of the pipeline consumes.

pub mod agent_id;
pub mod alert;
pub mod config;
pub mod cursor;
pub mod error;
pub mod events;
pub mod identity;
pub mod leaf;
pub mod report;
pub mod severity;
pub mod signal;
pub mod snapshot;

pub use agent_id::{AgentId, AgentIdParseError};
pub use alert::{Alert, AlertIdFields};
pub use config::Config;
pub use cursor::Cursor;
pub use error::ErrorKind;
pub use events::{EventType, RegistrationEvent};
pub use identity::{FetchStatus, IdentitySnapshot, IdentitySnapshotIdFields};
pub use leaf::{LeafIdFields, TransparencyLeaf, LEAF_VERSION};
pub use report::{Confidence, RiskReport, RiskReportIdFields, SignalRef, REPORT_VERSION};
pub use severity::Severity;
pub use signal::{sort_signals, Evidence, Signal};
pub use snapshot::{Snapshot, SnapshotIdFields};
