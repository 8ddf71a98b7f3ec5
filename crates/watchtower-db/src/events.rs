//! Registration event ingestion (spec.md §4.3, §4.4) and the agent roster
//! it feeds.

use crate::error::DbResult;
use crate::store::Store;
use watchtower_types::{EventType, RegistrationEvent};

impl Store {
    /// Insert `event`, ignoring it if its natural key already exists
    /// (spec.md §3: duplicates on re-ingest are silently ignored). Also
    /// upserts the `agents` roster row so the orchestrator can enumerate
    /// known agents. `observed_at` is the wall-clock Unix timestamp at
    /// which this event was ingested — it becomes the agent's
    /// `firstSeenAt` on first sight, which `ID_NEWBORN` compares against
    /// (spec.md §4.6), never the event's block number.
    pub async fn append_event(&self, event: &RegistrationEvent, observed_at: i64) -> DbResult<()> {
        let event_type = match event.event_type {
            EventType::Registered => "Registered",
            EventType::Transfer => "Transfer",
        };
        let registry_addr = event.registry_addr.to_lowercase();

        let mut tx = self.writer.begin().await?;

        sqlx::query(
            "INSERT OR IGNORE INTO identity_events
             (chain_id, registry_addr, agent_token_id, agent_uri, owner_address, event_type, block_number, tx_hash, log_index)
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(event.chain_id as i64)
        .bind(&registry_addr)
        .bind(&event.agent_token_id)
        .bind(&event.agent_uri)
        .bind(&event.owner_address)
        .bind(event_type)
        .bind(event.block_number as i64)
        .bind(event.tx_hash.to_lowercase())
        .bind(event.log_index as i64)
        .execute(&mut *tx)
        .await?;

        let agent_id = format!("erc8004:{}:{}:{}", event.chain_id, registry_addr, event.agent_token_id);
        sqlx::query(
            "INSERT OR IGNORE INTO agents (agent_id, chain_id, registry_addr, token_id, first_seen_at)
             VALUES (?, ?, ?, ?, ?)",
        )
        .bind(&agent_id)
        .bind(event.chain_id as i64)
        .bind(&registry_addr)
        .bind(&event.agent_token_id)
        .bind(observed_at)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(())
    }

    /// Distinct token IDs known for `(chainId, registryAddr)`, as full
    /// `AgentId` strings, sorted for deterministic per-tick iteration
    /// order (spec.md §5).
    pub async fn list_known_agent_ids(&self, chain_id: u64, registry_addr: &str) -> DbResult<Vec<String>> {
        let rows: Vec<(String,)> = sqlx::query_as(
            "SELECT agent_id FROM agents WHERE chain_id = ? AND registry_addr = ? ORDER BY agent_id ASC",
        )
        .bind(chain_id as i64)
        .bind(registry_addr.to_lowercase())
        .fetch_all(&self.writer)
        .await?;
        Ok(rows.into_iter().map(|(id,)| id).collect())
    }

    /// The most recently observed event for `agent_id` (by block number,
    /// then log index), used to find `firstSeenAt` and the current
    /// `agentUri`.
    pub async fn latest_event_for_agent(&self, agent_id: &str) -> DbResult<Option<RegistrationEvent>> {
        let Some(agent) = self.find_agent(agent_id).await? else {
            return Ok(None);
        };
        let row: Option<(String, String, String, String, i64, String, i64)> = sqlx::query_as(
            "SELECT agent_uri, owner_address, event_type, agent_token_id, block_number, tx_hash, log_index
             FROM identity_events
             WHERE chain_id = ? AND registry_addr = ? AND agent_token_id = ?
             ORDER BY block_number DESC, log_index DESC LIMIT 1",
        )
        .bind(agent.0 as i64)
        .bind(&agent.1)
        .bind(&agent.2)
        .fetch_optional(&self.writer)
        .await?;

        Ok(row.map(|(agent_uri, owner_address, event_type, agent_token_id, block_number, tx_hash, log_index)| {
            RegistrationEvent {
                chain_id: agent.0,
                registry_addr: agent.1.clone(),
                agent_token_id,
                agent_uri,
                owner_address,
                event_type: if event_type == "Transfer" { EventType::Transfer } else { EventType::Registered },
                block_number: block_number as u64,
                tx_hash,
                log_index: log_index as u64,
            }
        }))
    }

    /// `(chain_id, registry_addr, token_id, first_seen_at)` for `agent_id`.
    pub async fn find_agent(&self, agent_id: &str) -> DbResult<Option<(u64, String, String, i64)>> {
        let row: Option<(i64, String, String, i64)> = sqlx::query_as(
            "SELECT chain_id, registry_addr, token_id, first_seen_at FROM agents WHERE agent_id = ?",
        )
        .bind(agent_id)
        .fetch_optional(&self.writer)
        .await?;
        Ok(row.map(|(c, r, t, f)| (c as u64, r, t, f)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn event(tx_hash: &str, log_index: u64, block: u64) -> RegistrationEvent {
        RegistrationEvent {
            chain_id: 1,
            registry_addr: "0xABC".to_string(),
            agent_token_id: "42".to_string(),
            agent_uri: "https://example.com/card.json".to_string(),
            owner_address: "0xowner".to_string(),
            event_type: EventType::Registered,
            block_number: block,
            tx_hash: tx_hash.to_string(),
            log_index,
        }
    }

    #[tokio::test]
    async fn double_ingest_of_same_event_persists_exactly_one_row() {
        let store = Store::open_in_memory().await.unwrap();
        let e = event("0xDEAD", 0, 1000);
        store.append_event(&e, 1_700_000_000).await.unwrap();
        store.append_event(&e, 1_700_000_000).await.unwrap();

        let count: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM identity_events")
            .fetch_one(&store.writer)
            .await
            .unwrap();
        assert_eq!(count.0, 1);
    }

    #[tokio::test]
    async fn known_agents_are_listed_and_latest_event_is_tracked() {
        let store = Store::open_in_memory().await.unwrap();
        store.append_event(&event("0xA", 0, 100), 1_700_000_000).await.unwrap();
        store.append_event(&event("0xB", 0, 200), 1_700_000_050).await.unwrap();

        let ids = store.list_known_agent_ids(1, "0xabc").await.unwrap();
        assert_eq!(ids, vec!["erc8004:1:0xabc:42".to_string()]);

        let latest = store.latest_event_for_agent("erc8004:1:0xabc:42").await.unwrap().unwrap();
        assert_eq!(latest.block_number, 200);
    }

    #[tokio::test]
    async fn first_seen_at_is_the_wall_clock_observed_at_not_the_block_number() {
        let store = Store::open_in_memory().await.unwrap();
        store.append_event(&event("0xA", 0, 100), 1_700_000_000).await.unwrap();

        let (_, _, _, first_seen_at) = store.find_agent("erc8004:1:0xabc:42").await.unwrap().unwrap();
        assert_eq!(first_seen_at, 1_700_000_000);
    }
}
