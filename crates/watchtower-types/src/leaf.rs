//! Transparency leaves: signed, content-addressed attestations of a risk report.

use serde::{Deserialize, Serialize};

pub const LEAF_VERSION: &str = "0.1.0";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransparencyLeaf {
    pub leaf_version: String,
    pub leaf_id: String,
    pub written_at: i64,
    pub agent_id: String,
    pub risk_report_hash: String,
    pub overall_risk: u8,
    pub receipt_id: Option<String>,
    pub manifest_sha256: Option<String>,
    pub card_hash: Option<String>,
    pub watchtower_sig: String,
}

/// Fields that feed `leaf_id`'s content hash: every leaf field except
/// `written_at` and `watchtower_sig`.
#[derive(Serialize)]
pub struct LeafIdFields<'a> {
    pub leaf_version: &'a str,
    pub agent_id: &'a str,
    pub risk_report_hash: &'a str,
    pub overall_risk: u8,
    pub receipt_id: &'a Option<String>,
    pub manifest_sha256: &'a Option<String>,
    pub card_hash: &'a Option<String>,
}

impl TransparencyLeaf {
    pub fn id_fields(&self) -> LeafIdFields<'_> {
        LeafIdFields {
            leaf_version: &self.leaf_version,
            agent_id: &self.agent_id,
            risk_report_hash: &self.risk_report_hash,
            overall_risk: self.overall_risk,
            receipt_id: &self.receipt_id,
            manifest_sha256: &self.manifest_sha256,
            card_hash: &self.card_hash,
        }
    }
}
