//! The `EventSource` capability the poller drives, and a deterministic
//! in-memory test double implementing it.

use crate::error::PollerResult;
use watchtower_types::RegistrationEvent;

#[async_trait::async_trait]
pub trait EventSource: Send + Sync {
    /// The chain's current head block number.
    async fn latest_block_number(&self) -> PollerResult<u64>;

    /// Registration/transfer events with `from <= blockNumber <= to`.
    async fn registration_events(&self, from: u64, to: u64) -> PollerResult<Vec<RegistrationEvent>>;
}

/// In-memory `EventSource` for tests: a fixed head and a fixed event set,
/// filtered by block range on each call.
pub struct FixedEventSource {
    pub latest_block: u64,
    pub events: Vec<RegistrationEvent>,
}

#[async_trait::async_trait]
impl EventSource for FixedEventSource {
    async fn latest_block_number(&self) -> PollerResult<u64> {
        Ok(self.latest_block)
    }

    async fn registration_events(&self, from: u64, to: u64) -> PollerResult<Vec<RegistrationEvent>> {
        Ok(self
            .events
            .iter()
            .filter(|e| e.block_number >= from && e.block_number <= to)
            .cloned()
            .collect())
    }
}
