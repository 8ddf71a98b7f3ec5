//! Connection management and idempotent schema migration.

use crate::config::DatabaseConfig;
use crate::error::{DbError, DbResult};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::SqlitePool;
use std::str::FromStr;
use tracing::info;

/// Current schema version this build understands. Opening a database
/// stamped with a newer version is fatal (spec.md §4.3's migration
/// invariant): a newer writer may have added columns or tables this code
/// doesn't know to maintain.
pub const CURRENT_SCHEMA_VERSION: i64 = 1;

const MIGRATIONS: &[&str] = &[
    // v1
    r#"
    CREATE TABLE IF NOT EXISTS schema_version (version INTEGER NOT NULL);

    CREATE TABLE IF NOT EXISTS cursors (
        chain_id INTEGER NOT NULL,
        registry_addr TEXT NOT NULL,
        last_block INTEGER NOT NULL,
        PRIMARY KEY (chain_id, registry_addr)
    );

    CREATE TABLE IF NOT EXISTS agents (
        agent_id TEXT PRIMARY KEY,
        chain_id INTEGER NOT NULL,
        registry_addr TEXT NOT NULL,
        token_id TEXT NOT NULL,
        first_seen_at INTEGER NOT NULL
    );

    CREATE TABLE IF NOT EXISTS identity_events (
        chain_id INTEGER NOT NULL,
        registry_addr TEXT NOT NULL,
        agent_token_id TEXT NOT NULL,
        agent_uri TEXT NOT NULL,
        owner_address TEXT NOT NULL,
        event_type TEXT NOT NULL,
        block_number INTEGER NOT NULL,
        tx_hash TEXT NOT NULL,
        log_index INTEGER NOT NULL,
        PRIMARY KEY (chain_id, registry_addr, tx_hash, log_index)
    );

    CREATE TABLE IF NOT EXISTS identity_snapshots (
        snapshot_id TEXT PRIMARY KEY,
        agent_id TEXT NOT NULL,
        agent_uri TEXT NOT NULL,
        fetch_status TEXT NOT NULL,
        card_hash TEXT,
        card_json TEXT,
        fetched_at INTEGER NOT NULL,
        http_status INTEGER,
        error TEXT
    );

    CREATE TABLE IF NOT EXISTS snapshots (
        snapshot_id TEXT PRIMARY KEY,
        agent_id TEXT NOT NULL,
        observed_at INTEGER NOT NULL,
        signals_json TEXT NOT NULL
    );

    CREATE TABLE IF NOT EXISTS risk_reports (
        report_id TEXT PRIMARY KEY,
        agent_id TEXT NOT NULL,
        generated_at INTEGER NOT NULL,
        overall_risk INTEGER NOT NULL,
        confidence TEXT NOT NULL,
        reasons_json TEXT NOT NULL,
        evidence_json TEXT NOT NULL,
        signals_json TEXT NOT NULL
    );

    CREATE TABLE IF NOT EXISTS alerts (
        alert_id TEXT PRIMARY KEY,
        agent_id TEXT NOT NULL,
        alert_type TEXT NOT NULL,
        severity TEXT NOT NULL,
        description TEXT NOT NULL,
        evidence_json TEXT NOT NULL,
        created_at INTEGER NOT NULL,
        is_active INTEGER NOT NULL
    );

    CREATE INDEX IF NOT EXISTS idx_identity_snapshots_agent ON identity_snapshots(agent_id, fetched_at);
    CREATE INDEX IF NOT EXISTS idx_snapshots_agent ON snapshots(agent_id, observed_at);
    CREATE INDEX IF NOT EXISTS idx_risk_reports_agent ON risk_reports(agent_id, generated_at);
    CREATE INDEX IF NOT EXISTS idx_alerts_agent ON alerts(agent_id, is_active);
    "#,
];

/// The embedded relational store. Exactly one `Store` should hold the
/// writer pool (`max_connections(1)`); readers may use `reader_pool`
/// concurrently (spec.md §5).
#[derive(Clone)]
pub struct Store {
    pub(crate) writer: SqlitePool,
}

impl Store {
    pub async fn open(config: &DatabaseConfig) -> DbResult<Self> {
        if let Some(parent) = config.path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| DbError::Connection(e.to_string()))?;
        }
        let opts = SqliteConnectOptions::from_str(&format!("sqlite://{}", config.path.display()))
            .map_err(|e| DbError::Connection(e.to_string()))?
            .create_if_missing(true);
        let writer = SqlitePoolOptions::new()
            .max_connections(1)
            .connect_with(opts)
            .await
            .map_err(|e| DbError::Connection(e.to_string()))?;

        let store = Self { writer };
        store.migrate().await?;
        Ok(store)
    }

    /// In-memory store for tests: isolated per `Store` instance.
    pub async fn open_in_memory() -> DbResult<Self> {
        let writer = SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await
            .map_err(|e| DbError::Connection(e.to_string()))?;
        let store = Self { writer };
        store.migrate().await?;
        Ok(store)
    }

    async fn migrate(&self) -> DbResult<()> {
        let version_row: Option<(i64,)> = sqlx::query_as("SELECT version FROM schema_version LIMIT 1")
            .fetch_optional(&self.writer)
            .await
            .unwrap_or(None);

        let current = version_row.map(|(v,)| v).unwrap_or(0);
        if current > CURRENT_SCHEMA_VERSION {
            return Err(DbError::SchemaTooNew {
                found: current,
                supported: CURRENT_SCHEMA_VERSION,
            });
        }

        for (idx, migration) in MIGRATIONS.iter().enumerate() {
            let version = (idx + 1) as i64;
            if version <= current {
                continue;
            }
            info!(version, "applying schema migration");
            sqlx::raw_sql(migration)
                .execute(&self.writer)
                .await
                .map_err(|e| DbError::Migration(e.to_string()))?;
        }

        if current == 0 {
            sqlx::query("INSERT INTO schema_version (version) VALUES (?)")
                .bind(CURRENT_SCHEMA_VERSION)
                .execute(&self.writer)
                .await
                .map_err(|e| DbError::Migration(e.to_string()))?;
        } else if current < CURRENT_SCHEMA_VERSION {
            sqlx::query("UPDATE schema_version SET version = ?")
                .bind(CURRENT_SCHEMA_VERSION)
                .execute(&self.writer)
                .await
                .map_err(|e| DbError::Migration(e.to_string()))?;
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn opens_and_migrates_idempotently() {
        let store = Store::open_in_memory().await.unwrap();
        // Re-running migrate on an already-migrated store is a no-op.
        store.migrate().await.unwrap();
    }

    #[tokio::test]
    async fn rejects_a_schema_version_newer_than_supported() {
        let store = Store::open_in_memory().await.unwrap();
        sqlx::query("UPDATE schema_version SET version = ?")
            .bind(CURRENT_SCHEMA_VERSION + 1)
            .execute(&store.writer)
            .await
            .unwrap();
        let err = store.migrate().await.unwrap_err();
        assert!(matches!(err, DbError::SchemaTooNew { .. }));
    }
}
