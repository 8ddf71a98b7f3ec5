//! Behavioral snapshots: the signals derived for an agent at a point in time.

use crate::signal::Signal;
use serde::{Deserialize, Serialize};

/// `snapshot_id = SHA256(canonicalJson({agentId, signals}))`. Insertion-idempotent.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Snapshot {
    pub snapshot_id: String,
    pub agent_id: String,
    pub observed_at: i64,
    pub signals: Vec<Signal>,
}

#[derive(Serialize)]
pub struct SnapshotIdFields<'a> {
    #[serde(rename = "agentId")]
    pub agent_id: &'a str,
    pub signals: &'a [Signal],
}

impl Snapshot {
    pub fn id_fields(&self) -> SnapshotIdFields<'_> {
        SnapshotIdFields {
            agent_id: &self.agent_id,
            signals: &self.signals,
        }
    }
}
