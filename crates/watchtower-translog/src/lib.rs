//! Append-only, signed transparency log (spec.md §4.8). One leaf per
//! line, NDJSON, sharded by UTC date. Writes use `O_APPEND` semantics so
//! concurrent appenders cannot interleave within a line; nothing is ever
//! rewritten or truncated.

use chrono::{TimeZone, Utc};
use serde::Serialize;
use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, warn};
use watchtower_crypto::{canonical_json, sha256_hex, verify_data, Signer};
use watchtower_types::TransparencyLeaf;

#[derive(Debug, Error)]
pub enum TransLogError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("signing error: {0}")]
    Signing(#[from] watchtower_crypto::CryptoError),
}

impl TransLogError {
    /// Classifies this error against the shared taxonomy so callers can
    /// dispatch without matching `TransLogError`'s own variants.
    pub fn kind(&self) -> watchtower_types::ErrorKind {
        use watchtower_types::ErrorKind;
        match self {
            TransLogError::Io(_) => ErrorKind::TransientIo,
            TransLogError::Serialization(_) | TransLogError::Signing(_) => ErrorKind::Integrity,
        }
    }
}

pub type TransLogResult<T> = Result<T, TransLogError>;

/// Everything needed to mint a leaf except `writtenAt` and the signature,
/// which `append_leaf` computes.
pub struct LeafInput {
    pub agent_id: String,
    pub risk_report_hash: String,
    pub overall_risk: u8,
    pub receipt_id: Option<String>,
    pub manifest_sha256: Option<String>,
    pub card_hash: Option<String>,
}

fn shard_path(dir: &Path, written_at: i64) -> PathBuf {
    let date = Utc.timestamp_opt(written_at, 0).single().unwrap_or_else(Utc::now);
    dir.join(format!("leaves-{}.ndjson", date.format("%Y-%m-%d")))
}

/// Signs and appends a leaf for `input`, returning the written leaf.
/// `written_at` is seconds since the Unix epoch; the caller supplies it
/// so the function stays pure with respect to the wall clock.
pub fn append_leaf(dir: &Path, input: LeafInput, written_at: i64, signer: &impl Signer) -> TransLogResult<TransparencyLeaf> {
    std::fs::create_dir_all(dir)?;

    let mut leaf = TransparencyLeaf {
        leaf_version: watchtower_types::LEAF_VERSION.to_string(),
        leaf_id: String::new(),
        written_at,
        agent_id: input.agent_id,
        risk_report_hash: input.risk_report_hash,
        overall_risk: input.overall_risk,
        receipt_id: input.receipt_id,
        manifest_sha256: input.manifest_sha256,
        card_hash: input.card_hash,
        watchtower_sig: String::new(),
    };
    leaf.leaf_id = sha256_hex(canonical_json(&leaf.id_fields()));
    leaf.watchtower_sig = signer.sign(leaf.leaf_id.as_bytes());

    let line = serde_json::to_string(&leaf)?;
    let path = shard_path(dir, written_at);
    let mut file = OpenOptions::new().create(true).append(true).open(&path)?;
    writeln!(file, "{line}")?;
    debug!(path = %path.display(), leaf_id = %leaf.leaf_id, "appended transparency leaf");

    Ok(leaf)
}

#[derive(Debug, Clone, Serialize)]
pub struct LineError {
    pub line: usize,
    pub leaf_id: Option<String>,
    pub error: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct VerifyReport {
    pub total_leaves: usize,
    pub valid_leaves: usize,
    pub invalid_leaves: usize,
    pub errors: Vec<LineError>,
}

/// Verifies every leaf in `path` against `public_key_b64` (base64 SPKI-DER
/// Ed25519), per spec.md §4.8. Torn trailing lines and blank lines are
/// tolerated, not counted.
pub fn verify_log_file(path: &Path, public_key_b64: &str) -> TransLogResult<VerifyReport> {
    let content = std::fs::read_to_string(path)?;

    let mut report = VerifyReport { total_leaves: 0, valid_leaves: 0, invalid_leaves: 0, errors: vec![] };

    for (idx, raw_line) in content.lines().enumerate() {
        let line = raw_line.trim();
        if line.is_empty() {
            continue;
        }
        report.total_leaves += 1;

        let leaf: TransparencyLeaf = match serde_json::from_str(line) {
            Ok(l) => l,
            Err(e) => {
                report.invalid_leaves += 1;
                report.errors.push(LineError { line: idx + 1, leaf_id: None, error: "invalid JSON".to_string() });
                warn!(line = idx + 1, error = %e, "transparency log line failed to parse");
                continue;
            }
        };

        let recomputed_id = sha256_hex(canonical_json(&leaf.id_fields()));
        if recomputed_id != leaf.leaf_id {
            report.invalid_leaves += 1;
            report.errors.push(LineError { line: idx + 1, leaf_id: Some(leaf.leaf_id.clone()), error: "leaf_id mismatch".to_string() });
            continue;
        }

        if !verify_data(leaf.leaf_id.as_bytes(), &leaf.watchtower_sig, public_key_b64) {
            report.invalid_leaves += 1;
            report.errors.push(LineError { line: idx + 1, leaf_id: Some(leaf.leaf_id.clone()), error: "signature mismatch".to_string() });
            continue;
        }

        report.valid_leaves += 1;
    }

    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use watchtower_crypto::KeyPair;

    fn input() -> LeafInput {
        LeafInput {
            agent_id: "erc8004:1:0xabc:1".to_string(),
            risk_report_hash: "deadbeef".to_string(),
            overall_risk: 42,
            receipt_id: None,
            manifest_sha256: None,
            card_hash: None,
        }
    }

    /// Seed scenario S4: a written leaf round-trips through verification.
    #[test]
    fn appended_leaf_verifies() {
        let dir = tempfile::tempdir().unwrap();
        let keypair = KeyPair::generate();

        let leaf = append_leaf(dir.path(), input(), 1_700_000_000, &keypair).unwrap();
        let path = shard_path(dir.path(), 1_700_000_000);
        let report = verify_log_file(&path, &keypair.public_key_b64()).unwrap();

        assert_eq!(report.total_leaves, 1);
        assert_eq!(report.valid_leaves, 1);
        assert_eq!(report.invalid_leaves, 0);
        assert_eq!(leaf.agent_id, "erc8004:1:0xabc:1");
    }

    #[test]
    fn tampered_leaf_content_is_detected() {
        let dir = tempfile::tempdir().unwrap();
        let keypair = KeyPair::generate();
        append_leaf(dir.path(), input(), 1_700_000_000, &keypair).unwrap();
        let path = shard_path(dir.path(), 1_700_000_000);

        let original = std::fs::read_to_string(&path).unwrap();
        let tampered = original.replace("42", "99");
        std::fs::write(&path, tampered).unwrap();

        let report = verify_log_file(&path, &keypair.public_key_b64()).unwrap();
        assert_eq!(report.invalid_leaves, 1);
    }

    #[test]
    fn wrong_public_key_fails_verification() {
        let dir = tempfile::tempdir().unwrap();
        let keypair = KeyPair::generate();
        let other = KeyPair::generate();
        append_leaf(dir.path(), input(), 1_700_000_000, &keypair).unwrap();
        let path = shard_path(dir.path(), 1_700_000_000);

        let report = verify_log_file(&path, &other.public_key_b64()).unwrap();
        assert_eq!(report.invalid_leaves, 1);
    }

    #[test]
    fn blank_lines_are_tolerated_and_not_counted() {
        let dir = tempfile::tempdir().unwrap();
        let keypair = KeyPair::generate();
        append_leaf(dir.path(), input(), 1_700_000_000, &keypair).unwrap();
        let path = shard_path(dir.path(), 1_700_000_000);

        let mut content = std::fs::read_to_string(&path).unwrap();
        content.push('\n');
        std::fs::write(&path, content).unwrap();

        let report = verify_log_file(&path, &keypair.public_key_b64()).unwrap();
        assert_eq!(report.total_leaves, 1);
    }
}
