//! On-chain registration events consumed from an `EventSource`.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub enum EventType {
    Registered,
    Transfer,
}

/// A decoded registration/transfer event.
///
/// Uniquely keyed by `(chain_id, registry_addr, tx_hash, log_index)`;
/// duplicates on re-ingest are silently ignored by the persistence layer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegistrationEvent {
    pub chain_id: u64,
    pub registry_addr: String,
    pub agent_token_id: String,
    pub agent_uri: String,
    pub owner_address: String,
    pub event_type: EventType,
    pub block_number: u64,
    pub tx_hash: String,
    pub log_index: u64,
}

impl RegistrationEvent {
    /// Natural primary key for idempotent insertion.
    pub fn natural_key(&self) -> (u64, String, String, u64) {
        (self.chain_id, self.registry_addr.to_lowercase(), self.tx_hash.to_lowercase(), self.log_index)
    }
}
