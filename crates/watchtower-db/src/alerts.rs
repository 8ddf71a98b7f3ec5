//! Alert storage (spec.md §4.3, §4.7).

use crate::error::DbResult;
use crate::store::Store;
use watchtower_types::{Alert, Severity};

type AlertRow = (String, String, String, String, String, String, i64, i64);

fn severity_str(s: Severity) -> &'static str {
    match s {
        Severity::Low => "LOW",
        Severity::Medium => "MEDIUM",
        Severity::High => "HIGH",
        Severity::Critical => "CRITICAL",
    }
}

fn severity_from_str(s: &str) -> Severity {
    match s {
        "CRITICAL" => Severity::Critical,
        "HIGH" => Severity::High,
        "MEDIUM" => Severity::Medium,
        _ => Severity::Low,
    }
}

impl Store {
    /// Insert every alert in `alerts` inside one transaction, so a tick's
    /// emissions are all-or-nothing (spec.md §4.3). Each insert is itself
    /// `INSERT OR IGNORE` on `alert_id`, giving "at most one active alert
    /// per stable key" (spec.md §3) for free: re-emission of the same
    /// condition reproduces the same `alert_id` and is a no-op.
    pub async fn insert_alerts(&self, alerts: &[Alert]) -> DbResult<()> {
        let mut tx = self.writer.begin().await?;
        for alert in alerts {
            sqlx::query(
                "INSERT OR IGNORE INTO alerts
                 (alert_id, agent_id, alert_type, severity, description, evidence_json, created_at, is_active)
                 VALUES (?, ?, ?, ?, ?, ?, ?, ?)",
            )
            .bind(&alert.alert_id)
            .bind(&alert.agent_id)
            .bind(&alert.alert_type)
            .bind(severity_str(alert.severity))
            .bind(&alert.description)
            .bind(serde_json::to_string(&alert.evidence_links)?)
            .bind(alert.created_at)
            .bind(alert.is_active as i64)
            .execute(&mut *tx)
            .await?;
        }
        tx.commit().await?;
        Ok(())
    }

    pub async fn deactivate_alert(&self, alert_id: &str) -> DbResult<()> {
        sqlx::query("UPDATE alerts SET is_active = 0 WHERE alert_id = ?")
            .bind(alert_id)
            .execute(&self.writer)
            .await?;
        Ok(())
    }

    pub async fn list_alerts(&self, agent_id: Option<&str>, active_only: bool) -> DbResult<Vec<Alert>> {
        let rows: Vec<AlertRow> = match (agent_id, active_only) {
            (Some(a), true) => {
                sqlx::query_as(
                    "SELECT alert_id, agent_id, alert_type, severity, description, evidence_json, created_at, is_active
                     FROM alerts WHERE agent_id = ? AND is_active = 1 ORDER BY created_at DESC",
                )
                .bind(a)
                .fetch_all(&self.writer)
                .await?
            }
            (Some(a), false) => {
                sqlx::query_as(
                    "SELECT alert_id, agent_id, alert_type, severity, description, evidence_json, created_at, is_active
                     FROM alerts WHERE agent_id = ? ORDER BY created_at DESC",
                )
                .bind(a)
                .fetch_all(&self.writer)
                .await?
            }
            (None, true) => {
                sqlx::query_as(
                    "SELECT alert_id, agent_id, alert_type, severity, description, evidence_json, created_at, is_active
                     FROM alerts WHERE is_active = 1 ORDER BY created_at DESC",
                )
                .fetch_all(&self.writer)
                .await?
            }
            (None, false) => {
                sqlx::query_as(
                    "SELECT alert_id, agent_id, alert_type, severity, description, evidence_json, created_at, is_active
                     FROM alerts ORDER BY created_at DESC",
                )
                .fetch_all(&self.writer)
                .await?
            }
        };

        rows.into_iter()
            .map(|(alert_id, agent_id, alert_type, severity, description, evidence_json, created_at, is_active)| {
                Ok(Alert {
                    alert_id,
                    agent_id,
                    alert_type,
                    severity: severity_from_str(&severity),
                    description,
                    evidence_links: serde_json::from_str(&evidence_json)?,
                    created_at,
                    is_active: is_active != 0,
                })
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn alert(id: &str, agent_id: &str, is_active: bool) -> Alert {
        Alert {
            alert_id: id.to_string(),
            agent_id: agent_id.to_string(),
            alert_type: "ID_CARD_UNREACHABLE".to_string(),
            severity: Severity::High,
            description: "card unreachable".to_string(),
            evidence_links: vec![],
            created_at: 1_000,
            is_active,
        }
    }

    #[tokio::test]
    async fn re_emission_of_same_alert_id_is_a_no_op() {
        let store = Store::open_in_memory().await.unwrap();
        store.insert_alerts(&[alert("a1", "erc8004:1:0xabc:1", true)]).await.unwrap();
        store.insert_alerts(&[alert("a1", "erc8004:1:0xabc:1", true)]).await.unwrap();

        let all = store.list_alerts(None, false).await.unwrap();
        assert_eq!(all.len(), 1);
    }

    #[tokio::test]
    async fn filters_by_agent_and_active_only() {
        let store = Store::open_in_memory().await.unwrap();
        store
            .insert_alerts(&[
                alert("a1", "erc8004:1:0xabc:1", true),
                alert("a2", "erc8004:1:0xabc:2", true),
            ])
            .await
            .unwrap();
        store.deactivate_alert("a1").await.unwrap();

        let active = store.list_alerts(None, true).await.unwrap();
        assert_eq!(active.len(), 1);
        assert_eq!(active[0].alert_id, "a2");

        let for_agent = store.list_alerts(Some("erc8004:1:0xabc:1"), false).await.unwrap();
        assert_eq!(for_agent.len(), 1);
        assert!(!for_agent[0].is_active);
    }
}
