//! Identity snapshot storage and churn-window queries (spec.md §4.3, §4.6).

use crate::error::DbResult;
use crate::store::Store;
use watchtower_types::{FetchStatus, IdentitySnapshot};

type IdentitySnapshotRow = (String, String, String, String, Option<String>, Option<String>, i64, Option<i64>, Option<String>);

fn status_str(s: FetchStatus) -> &'static str {
    match s {
        FetchStatus::Ok => "OK",
        FetchStatus::Unreachable => "UNREACHABLE",
        FetchStatus::Timeout => "TIMEOUT",
        FetchStatus::InvalidSchema => "INVALID_SCHEMA",
        FetchStatus::SsrfBlocked => "SSRF_BLOCKED",
    }
}

fn status_from_str(s: &str) -> FetchStatus {
    match s {
        "OK" => FetchStatus::Ok,
        "UNREACHABLE" => FetchStatus::Unreachable,
        "TIMEOUT" => FetchStatus::Timeout,
        "INVALID_SCHEMA" => FetchStatus::InvalidSchema,
        _ => FetchStatus::SsrfBlocked,
    }
}

impl Store {
    /// Immutable once inserted (spec.md §3); `INSERT OR IGNORE` on the
    /// content-addressed `snapshot_id` makes repeated inserts of the same
    /// observation a no-op rather than an error.
    pub async fn insert_identity_snapshot(&self, snap: &IdentitySnapshot) -> DbResult<()> {
        let card_json = snap.card_json.as_ref().map(serde_json::to_string).transpose()?;
        sqlx::query(
            "INSERT OR IGNORE INTO identity_snapshots
             (snapshot_id, agent_id, agent_uri, fetch_status, card_hash, card_json, fetched_at, http_status, error)
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(&snap.snapshot_id)
        .bind(&snap.agent_id)
        .bind(&snap.agent_uri)
        .bind(status_str(snap.fetch_status))
        .bind(&snap.card_hash)
        .bind(card_json)
        .bind(snap.fetched_at)
        .bind(snap.http_status.map(|s| s as i64))
        .bind(&snap.error)
        .execute(&self.writer)
        .await?;
        Ok(())
    }

    pub async fn latest_identity_snapshot(&self, agent_id: &str) -> DbResult<Option<IdentitySnapshot>> {
        let row: Option<IdentitySnapshotRow> =
            sqlx::query_as(
                "SELECT snapshot_id, agent_id, agent_uri, fetch_status, card_hash, card_json, fetched_at, http_status, error
                 FROM identity_snapshots WHERE agent_id = ? ORDER BY fetched_at DESC LIMIT 1",
            )
            .bind(agent_id)
            .fetch_optional(&self.writer)
            .await?;

        row.map(row_to_snapshot).transpose()
    }

    /// Distinct `cardHash` values observed for `agent_id` within the last
    /// `window_seconds` before `now`, for churn detection (spec.md §4.6
    /// `ID_CARD_CHURN`).
    pub async fn distinct_card_hashes_since(
        &self,
        agent_id: &str,
        now: i64,
        window_seconds: u32,
    ) -> DbResult<Vec<String>> {
        let since = now - window_seconds as i64;
        let rows: Vec<(String,)> = sqlx::query_as(
            "SELECT DISTINCT card_hash FROM identity_snapshots
             WHERE agent_id = ? AND fetched_at >= ? AND card_hash IS NOT NULL",
        )
        .bind(agent_id)
        .bind(since)
        .fetch_all(&self.writer)
        .await?;
        Ok(rows.into_iter().map(|(h,)| h).collect())
    }
}

fn row_to_snapshot(row: IdentitySnapshotRow) -> DbResult<IdentitySnapshot> {
    let (snapshot_id, agent_id, agent_uri, fetch_status, card_hash, card_json, fetched_at, http_status, error) = row;
    Ok(IdentitySnapshot {
        snapshot_id,
        agent_id,
        agent_uri,
        fetch_status: status_from_str(&fetch_status),
        card_hash,
        card_json: card_json.map(|s| serde_json::from_str(&s)).transpose()?,
        fetched_at,
        http_status: http_status.map(|s| s as u16),
        error,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use watchtower_crypto::sha256_hex;

    fn snap(agent_id: &str, fetched_at: i64, card_hash: &str) -> IdentitySnapshot {
        IdentitySnapshot {
            snapshot_id: sha256_hex(format!("{agent_id}{fetched_at}{card_hash}")),
            agent_id: agent_id.to_string(),
            agent_uri: "https://example.com/card.json".to_string(),
            fetch_status: FetchStatus::Ok,
            card_hash: Some(card_hash.to_string()),
            card_json: Some(serde_json::json!({"type": "AgentRegistration"})),
            fetched_at,
            http_status: Some(200),
            error: None,
        }
    }

    #[tokio::test]
    async fn latest_snapshot_and_churn_window_query() {
        let store = Store::open_in_memory().await.unwrap();
        store.insert_identity_snapshot(&snap("erc8004:1:0xabc:1", 1_000, "hash-a")).await.unwrap();
        store.insert_identity_snapshot(&snap("erc8004:1:0xabc:1", 2_000, "hash-b")).await.unwrap();
        store.insert_identity_snapshot(&snap("erc8004:1:0xabc:1", 3_000, "hash-c")).await.unwrap();

        let latest = store.latest_identity_snapshot("erc8004:1:0xabc:1").await.unwrap().unwrap();
        assert_eq!(latest.card_hash.as_deref(), Some("hash-c"));

        let hashes = store
            .distinct_card_hashes_since("erc8004:1:0xabc:1", 3_000, 1_500)
            .await
            .unwrap();
        assert_eq!(hashes.len(), 2);
    }
}
