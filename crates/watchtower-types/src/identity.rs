//! Identity snapshots: the result of fetching an agent's off-chain card.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum FetchStatus {
    Ok,
    Unreachable,
    Timeout,
    InvalidSchema,
    SsrfBlocked,
}

impl FetchStatus {
    pub fn is_ok(self) -> bool {
        matches!(self, FetchStatus::Ok)
    }
}

/// Immutable record of one attempt to fetch `agentUri`.
///
/// `snapshot_id = SHA256(canonicalJson({agentId, agentUri, fetchStatus, cardHash}))`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IdentitySnapshot {
    pub snapshot_id: String,
    pub agent_id: String,
    pub agent_uri: String,
    pub fetch_status: FetchStatus,
    pub card_hash: Option<String>,
    pub card_json: Option<serde_json::Value>,
    pub fetched_at: i64,
    pub http_status: Option<u16>,
    pub error: Option<String>,
}

/// The subset of `IdentitySnapshot` that feeds `snapshot_id`'s content hash.
#[derive(Serialize)]
pub struct IdentitySnapshotIdFields<'a> {
    #[serde(rename = "agentId")]
    pub agent_id: &'a str,
    #[serde(rename = "agentUri")]
    pub agent_uri: &'a str,
    #[serde(rename = "fetchStatus")]
    pub fetch_status: FetchStatus,
    #[serde(rename = "cardHash")]
    pub card_hash: &'a Option<String>,
}

impl IdentitySnapshot {
    pub fn id_fields(&self) -> IdentitySnapshotIdFields<'_> {
        IdentitySnapshotIdFields {
            agent_id: &self.agent_id,
            agent_uri: &self.agent_uri,
            fetch_status: self.fetch_status,
            card_hash: &self.card_hash,
        }
    }
}
