//! Risk report storage (spec.md §4.3, §4.7).

use crate::error::DbResult;
use crate::store::Store;
use watchtower_types::{Confidence, RiskReport, SignalRef};

type RiskReportRow = (String, String, i64, i64, String, String, String, String);

fn confidence_str(c: Confidence) -> &'static str {
    match c {
        Confidence::Low => "LOW",
        Confidence::Medium => "MEDIUM",
        Confidence::High => "HIGH",
    }
}

fn confidence_from_str(s: &str) -> Confidence {
    match s {
        "HIGH" => Confidence::High,
        "MEDIUM" => Confidence::Medium,
        _ => Confidence::Low,
    }
}

impl Store {
    /// Insertion-idempotent on `report_id`: two reports with identical
    /// inputs (ignoring `generatedAt`) collide and only the first persists
    /// (spec.md §3).
    pub async fn insert_report(&self, report: &RiskReport) -> DbResult<()> {
        sqlx::query(
            "INSERT OR IGNORE INTO risk_reports
             (report_id, agent_id, generated_at, overall_risk, confidence, reasons_json, evidence_json, signals_json)
             VALUES (?, ?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(&report.report_id)
        .bind(&report.agent_id)
        .bind(report.generated_at)
        .bind(report.overall_risk as i64)
        .bind(confidence_str(report.confidence))
        .bind(serde_json::to_string(&report.reasons)?)
        .bind(serde_json::to_string(&report.evidence_links)?)
        .bind(serde_json::to_string(&report.signals)?)
        .execute(&self.writer)
        .await?;
        Ok(())
    }

    pub async fn latest_report(&self, agent_id: &str) -> DbResult<Option<RiskReport>> {
        let row: Option<RiskReportRow> = sqlx::query_as(
            "SELECT report_id, agent_id, generated_at, overall_risk, confidence, reasons_json, evidence_json, signals_json
             FROM risk_reports WHERE agent_id = ? ORDER BY generated_at DESC LIMIT 1",
        )
        .bind(agent_id)
        .fetch_optional(&self.writer)
        .await?;

        row.map(
            |(report_id, agent_id, generated_at, overall_risk, confidence, reasons_json, evidence_json, signals_json)| {
                Ok(RiskReport {
                    report_version: watchtower_types::REPORT_VERSION.to_string(),
                    report_id,
                    agent_id,
                    generated_at,
                    overall_risk: overall_risk as u8,
                    confidence: confidence_from_str(&confidence),
                    reasons: serde_json::from_str(&reasons_json)?,
                    evidence_links: serde_json::from_str(&evidence_json)?,
                    signals: serde_json::from_str::<Vec<SignalRef>>(&signals_json)?,
                })
            },
        )
        .transpose()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn report(report_id: &str, generated_at: i64) -> RiskReport {
        RiskReport {
            report_version: watchtower_types::REPORT_VERSION.to_string(),
            report_id: report_id.to_string(),
            agent_id: "erc8004:1:0xabc:1".to_string(),
            generated_at,
            overall_risk: 42,
            confidence: Confidence::Medium,
            reasons: vec!["newborn agent".to_string()],
            evidence_links: vec![],
            signals: vec![],
        }
    }

    #[tokio::test]
    async fn identical_report_ids_deduplicate() {
        let store = Store::open_in_memory().await.unwrap();
        store.insert_report(&report("r1", 1_000)).await.unwrap();
        store.insert_report(&report("r1", 2_000)).await.unwrap();

        let count: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM risk_reports")
            .fetch_one(&store.writer)
            .await
            .unwrap();
        assert_eq!(count.0, 1);

        let latest = store.latest_report("erc8004:1:0xabc:1").await.unwrap().unwrap();
        assert_eq!(latest.generated_at, 1_000);
    }
}
