//! Behavioral snapshot storage (spec.md §4.3).

use crate::error::DbResult;
use crate::store::Store;
use watchtower_types::Snapshot;

impl Store {
    /// Insertion-idempotent on `snapshot_id` (spec.md §3).
    pub async fn insert_snapshot(&self, snap: &Snapshot) -> DbResult<()> {
        let signals_json = serde_json::to_string(&snap.signals)?;
        sqlx::query(
            "INSERT OR IGNORE INTO snapshots (snapshot_id, agent_id, observed_at, signals_json)
             VALUES (?, ?, ?, ?)",
        )
        .bind(&snap.snapshot_id)
        .bind(&snap.agent_id)
        .bind(snap.observed_at)
        .bind(signals_json)
        .execute(&self.writer)
        .await?;
        Ok(())
    }

    /// The latest `n` snapshots for `agent_id`, most recent first.
    pub async fn latest_snapshots(&self, agent_id: &str, n: u32) -> DbResult<Vec<Snapshot>> {
        let rows: Vec<(String, String, i64, String)> = sqlx::query_as(
            "SELECT snapshot_id, agent_id, observed_at, signals_json FROM snapshots
             WHERE agent_id = ? ORDER BY observed_at DESC LIMIT ?",
        )
        .bind(agent_id)
        .bind(n as i64)
        .fetch_all(&self.writer)
        .await?;

        rows.into_iter()
            .map(|(snapshot_id, agent_id, observed_at, signals_json)| {
                Ok(Snapshot {
                    snapshot_id,
                    agent_id,
                    observed_at,
                    signals: serde_json::from_str(&signals_json)?,
                })
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn keeps_most_recent_n_snapshots_in_order() {
        let store = Store::open_in_memory().await.unwrap();
        for t in [1_000_i64, 2_000, 3_000] {
            store
                .insert_snapshot(&Snapshot {
                    snapshot_id: format!("snap-{t}"),
                    agent_id: "erc8004:1:0xabc:1".to_string(),
                    observed_at: t,
                    signals: vec![],
                })
                .await
                .unwrap();
        }

        let latest = store.latest_snapshots("erc8004:1:0xabc:1", 2).await.unwrap();
        assert_eq!(latest.len(), 2);
        assert_eq!(latest[0].observed_at, 3_000);
        assert_eq!(latest[1].observed_at, 2_000);
    }
}
