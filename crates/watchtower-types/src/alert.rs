//! Alerts: content-addressed, at-most-one-active-per-stable-key.

use crate::severity::Severity;
use crate::signal::Evidence;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Alert {
    pub alert_id: String,
    pub agent_id: String,
    pub alert_type: String,
    pub severity: Severity,
    pub description: String,
    pub evidence_links: Vec<Evidence>,
    pub created_at: i64,
    pub is_active: bool,
}

/// The fields that feed `alert_id`'s content hash: `(agentId, type, severity,
/// stableEvidenceKey)`. `stable_evidence_key` is caller-derived (usually the
/// sorted, joined `evidence` refs) so that re-emission of the same condition
/// reproduces the same id.
#[derive(Serialize)]
pub struct AlertIdFields<'a> {
    pub agent_id: &'a str,
    pub alert_type: &'a str,
    pub severity: Severity,
    pub stable_evidence_key: &'a str,
}
