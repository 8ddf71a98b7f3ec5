//! Deterministic, evidence-carrying observations about an agent.

use crate::severity::Severity;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Evidence {
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(rename = "ref")]
    pub reference: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Signal {
    pub signal_id: String,
    pub severity: Severity,
    pub weight: f64,
    pub observed_at: i64,
    pub evidence: Vec<Evidence>,
}

impl Signal {
    /// Sorts evidence deterministically by `(type, ref)`.
    pub fn with_sorted_evidence(mut self) -> Self {
        self.evidence.sort();
        self
    }
}

/// Orders signals by severity descending, then `signal_id` ascending —
/// the stable order spec.md §4.6 requires of signal derivation output.
pub fn sort_signals(signals: &mut [Signal]) {
    signals.sort_by(|a, b| b.severity.cmp(&a.severity).then_with(|| a.signal_id.cmp(&b.signal_id)));
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sig(id: &str, sev: Severity) -> Signal {
        Signal {
            signal_id: id.to_string(),
            severity: sev,
            weight: 0.5,
            observed_at: 0,
            evidence: vec![],
        }
    }

    #[test]
    fn sorts_by_severity_desc_then_id_asc() {
        let mut signals = vec![
            sig("z_sig", Severity::High),
            sig("a_sig", Severity::High),
            sig("crit_sig", Severity::Critical),
            sig("low_sig", Severity::Low),
        ];
        sort_signals(&mut signals);
        let ids: Vec<&str> = signals.iter().map(|s| s.signal_id.as_str()).collect();
        assert_eq!(ids, vec!["crit_sig", "a_sig", "z_sig", "low_sig"]);
    }
}
