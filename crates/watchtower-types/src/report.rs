//! Risk reports: the scored aggregation of an agent's signals.

use crate::signal::Evidence;
use serde::{Deserialize, Serialize};

pub const REPORT_VERSION: &str = "0.1.0";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Confidence {
    Low,
    Medium,
    High,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignalRef {
    pub signal_id: String,
    pub severity: crate::severity::Severity,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RiskReport {
    pub report_version: String,
    pub report_id: String,
    pub agent_id: String,
    pub generated_at: i64,
    pub overall_risk: u8,
    pub confidence: Confidence,
    pub reasons: Vec<String>,
    pub evidence_links: Vec<Evidence>,
    pub signals: Vec<SignalRef>,
}

/// The fields that feed `report_id`'s content hash — everything except
/// `generated_at` (spec.md §3's explicit exclusion list).
#[derive(Serialize)]
pub struct RiskReportIdFields<'a> {
    pub report_version: &'a str,
    pub agent_id: &'a str,
    pub overall_risk: u8,
    pub confidence: Confidence,
    pub reasons: &'a [String],
    pub evidence_links: &'a [Evidence],
    pub signals: &'a [SignalRef],
}

impl RiskReport {
    pub fn id_fields(&self) -> RiskReportIdFields<'_> {
        RiskReportIdFields {
            report_version: &self.report_version,
            agent_id: &self.agent_id,
            overall_risk: self.overall_risk,
            confidence: self.confidence,
            reasons: &self.reasons,
            evidence_links: &self.evidence_links,
            signals: &self.signals,
        }
    }
}
