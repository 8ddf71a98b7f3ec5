//! Cursor get/set (spec.md §4.3, §4.4).

use crate::error::DbResult;
use crate::store::Store;
use watchtower_types::Cursor;

impl Store {
    pub async fn get_cursor(&self, chain_id: u64, registry_addr: &str) -> DbResult<Cursor> {
        let addr = registry_addr.to_lowercase();
        let row: Option<(i64,)> =
            sqlx::query_as("SELECT last_block FROM cursors WHERE chain_id = ? AND registry_addr = ?")
                .bind(chain_id as i64)
                .bind(&addr)
                .fetch_optional(&self.writer)
                .await?;
        Ok(Cursor {
            chain_id,
            registry_addr: addr,
            last_block: row.map(|(b,)| b as u64).unwrap_or(0),
        })
    }

    pub async fn set_cursor(&self, chain_id: u64, registry_addr: &str, last_block: u64) -> DbResult<()> {
        sqlx::query(
            "INSERT INTO cursors (chain_id, registry_addr, last_block) VALUES (?, ?, ?)
             ON CONFLICT(chain_id, registry_addr) DO UPDATE SET last_block = excluded.last_block",
        )
        .bind(chain_id as i64)
        .bind(registry_addr.to_lowercase())
        .bind(last_block as i64)
        .execute(&self.writer)
        .await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn defaults_to_zero_and_persists_updates() {
        let store = Store::open_in_memory().await.unwrap();
        let c = store.get_cursor(1, "0xABC").await.unwrap();
        assert_eq!(c.last_block, 0);

        store.set_cursor(1, "0xABC", 1099).await.unwrap();
        let c = store.get_cursor(1, "0xabc").await.unwrap();
        assert_eq!(c.last_block, 1099);

        store.set_cursor(1, "0xabc", 1148).await.unwrap();
        let c = store.get_cursor(1, "0xABC").await.unwrap();
        assert_eq!(c.last_block, 1148);
    }
}
