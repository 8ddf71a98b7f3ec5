//! Watchtower Verify - transparency log inspection toolkit.
//!
//! Transparency leaves are the social objects of the watchtower:
//! - Shareable
//! - Content-addressed (stable under re-serialization)
//! - Machine-verifiable by anyone holding the watchtower's public key
//!
//! This crate provides tools for:
//! - Verifying every leaf in an NDJSON log file
//! - Inspecting a single leaf's contents
//! - Diffing two leaves

use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;
use watchtower_crypto::{canonical_json, sha256_hex, verify_data};
use watchtower_translog::{verify_log_file, VerifyReport};
use watchtower_types::TransparencyLeaf;

#[derive(Error, Debug)]
pub enum VerifyToolError {
    #[error("file error: {message}")]
    FileError { message: String },

    #[error("JSON error: {message}")]
    JsonError { message: String },

    #[error("log error: {0}")]
    Log(#[from] watchtower_translog::TransLogError),
}

pub type Result<T> = std::result::Result<T, VerifyToolError>;

/// Verify every leaf in an NDJSON transparency log file against a public key.
pub fn verify_log_path(path: &Path, public_key_b64: &str) -> Result<VerifyReport> {
    Ok(verify_log_file(path, public_key_b64)?)
}

/// Result of inspecting a single leaf.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LeafInspection {
    pub leaf_id: String,
    pub leaf_id_matches: bool,
    pub signature_valid: Option<bool>,
    pub agent_id: String,
    pub overall_risk: u8,
    pub written_at: i64,
    pub details: serde_json::Value,
}

/// Inspect a single leaf, optionally checking its signature against a
/// supplied public key.
pub fn inspect_leaf_json(json: &str, public_key_b64: Option<&str>) -> Result<LeafInspection> {
    let leaf: TransparencyLeaf = serde_json::from_str(json).map_err(|e| VerifyToolError::JsonError {
        message: e.to_string(),
    })?;

    let recomputed_id = sha256_hex(canonical_json(&leaf.id_fields()));
    let leaf_id_matches = recomputed_id == leaf.leaf_id;

    let signature_valid = public_key_b64.map(|pk| verify_data(leaf.leaf_id.as_bytes(), &leaf.watchtower_sig, pk));

    let details = serde_json::to_value(&leaf).map_err(|e| VerifyToolError::JsonError {
        message: e.to_string(),
    })?;

    Ok(LeafInspection {
        leaf_id: leaf.leaf_id,
        leaf_id_matches,
        signature_valid,
        agent_id: leaf.agent_id,
        overall_risk: leaf.overall_risk,
        written_at: leaf.written_at,
        details,
    })
}

/// Inspect a leaf read from a file (a single NDJSON line, or a bare JSON object).
pub fn inspect_leaf_file(path: &str, public_key_b64: Option<&str>) -> Result<LeafInspection> {
    let content = std::fs::read_to_string(path).map_err(|e| VerifyToolError::FileError {
        message: e.to_string(),
    })?;
    inspect_leaf_json(content.trim(), public_key_b64)
}

/// A single field difference between two leaves.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FieldDiff {
    pub field: String,
    pub value_a: serde_json::Value,
    pub value_b: serde_json::Value,
}

/// Differences between two leaves.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LeafDiff {
    pub leaf_a_id: String,
    pub leaf_b_id: String,
    pub differences: Vec<FieldDiff>,
}

/// Compare two leaves field-by-field.
pub fn diff_leaves(json_a: &str, json_b: &str) -> Result<LeafDiff> {
    let a: serde_json::Value = serde_json::from_str(json_a).map_err(|e| VerifyToolError::JsonError {
        message: format!("failed to parse leaf A: {e}"),
    })?;
    let b: serde_json::Value = serde_json::from_str(json_b).map_err(|e| VerifyToolError::JsonError {
        message: format!("failed to parse leaf B: {e}"),
    })?;

    let leaf_a_id = a.get("leaf_id").and_then(|v| v.as_str()).unwrap_or("unknown").to_string();
    let leaf_b_id = b.get("leaf_id").and_then(|v| v.as_str()).unwrap_or("unknown").to_string();

    let mut differences = vec![];
    if let (Some(obj_a), Some(obj_b)) = (a.as_object(), b.as_object()) {
        let mut all_keys: Vec<&String> = obj_a.keys().chain(obj_b.keys()).collect();
        all_keys.sort();
        all_keys.dedup();

        for key in all_keys {
            let val_a = obj_a.get(key).cloned().unwrap_or(serde_json::Value::Null);
            let val_b = obj_b.get(key).cloned().unwrap_or(serde_json::Value::Null);
            if val_a != val_b {
                differences.push(FieldDiff { field: key.clone(), value_a: val_a, value_b: val_b });
            }
        }
    }

    Ok(LeafDiff { leaf_a_id, leaf_b_id, differences })
}

#[cfg(test)]
mod tests {
    use super::*;
    use watchtower_crypto::KeyPair;
    use watchtower_translog::{append_leaf, LeafInput};

    fn sample_input() -> LeafInput {
        LeafInput {
            agent_id: "erc8004:1:0xabc:1".to_string(),
            risk_report_hash: "deadbeef".to_string(),
            overall_risk: 42,
            receipt_id: None,
            manifest_sha256: None,
            card_hash: None,
        }
    }

    #[test]
    fn inspect_reports_matching_id_and_valid_signature() {
        let kp = KeyPair::generate();
        let dir = tempfile::tempdir().unwrap();
        let leaf = append_leaf(dir.path(), sample_input(), 1_700_000_000, &kp).unwrap();

        let json = serde_json::to_string(&leaf).unwrap();
        let inspection = inspect_leaf_json(&json, Some(&kp.public_key_b64())).unwrap();

        assert!(inspection.leaf_id_matches);
        assert_eq!(inspection.signature_valid, Some(true));
        assert_eq!(inspection.agent_id, "erc8004:1:0xabc:1");
    }

    #[test]
    fn inspect_detects_tampered_leaf() {
        let kp = KeyPair::generate();
        let dir = tempfile::tempdir().unwrap();
        let leaf = append_leaf(dir.path(), sample_input(), 1_700_000_000, &kp).unwrap();

        let mut tampered = leaf.clone();
        tampered.overall_risk = 99;
        let json = serde_json::to_string(&tampered).unwrap();

        let inspection = inspect_leaf_json(&json, Some(&kp.public_key_b64())).unwrap();
        assert!(!inspection.leaf_id_matches);
    }

    #[test]
    fn diff_leaves_reports_changed_fields() {
        let kp = KeyPair::generate();
        let dir = tempfile::tempdir().unwrap();
        let leaf_a = append_leaf(dir.path(), sample_input(), 1_700_000_000, &kp).unwrap();
        let mut input_b = sample_input();
        input_b.overall_risk = 7;
        let leaf_b = append_leaf(dir.path(), input_b, 1_700_000_100, &kp).unwrap();

        let diff = diff_leaves(&serde_json::to_string(&leaf_a).unwrap(), &serde_json::to_string(&leaf_b).unwrap()).unwrap();
        assert!(diff.differences.iter().any(|d| d.field == "overall_risk"));
    }
}
