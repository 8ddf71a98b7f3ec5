//! Risk scoring and alert emission (spec.md §4.7).

use std::collections::{BTreeMap, BTreeSet};
use watchtower_crypto::{canonical_json, sha256_hex};
use watchtower_types::{
    Alert, AlertIdFields, Confidence, Evidence, RiskReport, Severity, Signal, SignalRef, Snapshot, REPORT_VERSION,
};

/// A human-readable tag for a signal type. Falls back to the id itself
/// for signals this table doesn't know about yet.
fn reason_for(signal_id: &str) -> String {
    match signal_id {
        "ID_NEWBORN" => "agent recently registered".to_string(),
        "ID_CARD_UNREACHABLE" => "agent card is unreachable".to_string(),
        "ID_CARD_SCHEMA_INVALID" => "agent card failed schema validation".to_string(),
        "ID_CARD_CHURN" => "agent card has churned repeatedly".to_string(),
        "ID_FUNDING_MIXER" => "agent funded from a denylisted source".to_string(),
        other => other.to_string(),
    }
}

pub struct ScoringInput<'a> {
    pub agent_id: String,
    pub generated_at: i64,
    /// Latest-N snapshots, oldest first or newest first — order doesn't
    /// matter for scoring, only count.
    pub snapshots: &'a [Snapshot],
    /// Currently-active alerts for this agent, used to suppress
    /// re-emission of an alert already raised for the same condition.
    pub active_alerts: &'a [Alert],
}

pub struct ScoringOutput {
    pub report: RiskReport,
    pub new_alerts: Vec<Alert>,
}

/// Deduplicates `signals` by `signal_id`, keeping the highest-severity
/// instance of each.
fn dedup_by_signal_id(signals: impl Iterator<Item = Signal>) -> Vec<Signal> {
    let mut by_id: BTreeMap<String, Signal> = BTreeMap::new();
    for signal in signals {
        by_id
            .entry(signal.signal_id.clone())
            .and_modify(|existing| {
                if signal.severity > existing.severity {
                    *existing = signal.clone();
                }
            })
            .or_insert(signal);
    }
    let mut result: Vec<Signal> = by_id.into_values().collect();
    watchtower_types::sort_signals(&mut result);
    result
}

fn stable_evidence_key(evidence: &[Evidence]) -> String {
    let mut sorted = evidence.to_vec();
    sorted.sort();
    sorted.iter().map(|e| format!("{}:{}", e.kind, e.reference)).collect::<Vec<_>>().join("|")
}

/// Runs the scoring algorithm over `input`'s snapshots, producing a
/// deterministic report (ignoring `generatedAt`) and the set of newly
/// emitted alerts.
pub fn score(input: &ScoringInput<'_>) -> ScoringOutput {
    let all_signals: Vec<Signal> = input.snapshots.iter().flat_map(|s| s.signals.clone()).collect();
    let distinct_signals = dedup_by_signal_id(all_signals.into_iter());

    let raw: f64 = distinct_signals.iter().map(|s| s.severity.score_weight() as f64 * s.weight).sum();
    let has_critical = distinct_signals.iter().any(|s| s.severity == Severity::Critical);
    let overall_risk = if has_critical { 100 } else { raw.round().clamp(0.0, 100.0) as u8 };

    let snapshots_with_signals = input.snapshots.iter().filter(|s| !s.signals.is_empty()).count();
    let distinct_types = distinct_signals.len();
    let confidence = if distinct_types >= 3 && snapshots_with_signals >= 2 {
        Confidence::High
    } else if distinct_types >= 1 && snapshots_with_signals >= 2 {
        Confidence::Medium
    } else {
        Confidence::Low
    };

    let reasons: Vec<String> = distinct_signals.iter().map(|s| reason_for(&s.signal_id)).collect();

    let mut evidence_set: BTreeSet<Evidence> = BTreeSet::new();
    for signal in &distinct_signals {
        for evidence in &signal.evidence {
            evidence_set.insert(evidence.clone());
        }
    }
    let evidence_links: Vec<Evidence> = evidence_set.into_iter().collect();

    let signal_refs: Vec<SignalRef> =
        distinct_signals.iter().map(|s| SignalRef { signal_id: s.signal_id.clone(), severity: s.severity }).collect();

    let mut report = RiskReport {
        report_version: REPORT_VERSION.to_string(),
        report_id: String::new(),
        agent_id: input.agent_id.clone(),
        generated_at: input.generated_at,
        overall_risk,
        confidence,
        reasons,
        evidence_links,
        signals: signal_refs,
    };
    report.report_id = sha256_hex(canonical_json(&report.id_fields()));

    let new_alerts = distinct_signals
        .iter()
        .filter(|s| s.severity >= Severity::High)
        .filter_map(|s| {
            let stable_key = stable_evidence_key(&s.evidence);
            let alert_id = sha256_hex(canonical_json(&AlertIdFields {
                agent_id: &input.agent_id,
                alert_type: &s.signal_id,
                severity: s.severity,
                stable_evidence_key: &stable_key,
            }));
            if input.active_alerts.iter().any(|a| a.alert_id == alert_id && a.is_active) {
                return None;
            }
            Some(Alert {
                alert_id,
                agent_id: input.agent_id.clone(),
                alert_type: s.signal_id.clone(),
                severity: s.severity,
                description: reason_for(&s.signal_id),
                evidence_links: s.evidence.clone(),
                created_at: input.generated_at,
                is_active: true,
            })
        })
        .collect();

    ScoringOutput { report, new_alerts }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn signal(id: &str, sev: Severity, weight: f64) -> Signal {
        Signal {
            signal_id: id.to_string(),
            severity: sev,
            weight,
            observed_at: 1_000,
            evidence: vec![Evidence { kind: "agent".to_string(), reference: "erc8004:1:0xabc:1".to_string() }],
        }
    }

    fn snapshot(id: &str, signals: Vec<Signal>) -> Snapshot {
        Snapshot { snapshot_id: id.to_string(), agent_id: "erc8004:1:0xabc:1".to_string(), observed_at: 1_000, signals }
    }

    /// Seed scenario S1: fixed inputs produce a deterministic report.
    #[test]
    fn deterministic_scoring_ignores_generated_at() {
        let snapshots = vec![snapshot("s1", vec![signal("ID_NEWBORN", Severity::Medium, 0.3)])];
        let input_a = ScoringInput { agent_id: "erc8004:1:0xabc:1".to_string(), generated_at: 1_000, snapshots: &snapshots, active_alerts: &[] };
        let input_b = ScoringInput { agent_id: "erc8004:1:0xabc:1".to_string(), generated_at: 2_000, snapshots: &snapshots, active_alerts: &[] };

        let out_a = score(&input_a);
        let out_b = score(&input_b);
        assert_eq!(out_a.report.report_id, out_b.report.report_id);
        assert_eq!(out_a.report.overall_risk, out_b.report.overall_risk);
    }

    /// Seed scenario S2: a CRITICAL signal overrides the weighted sum to 100.
    #[test]
    fn critical_signal_overrides_overall_risk_to_100() {
        let snapshots = vec![snapshot("s1", vec![signal("ID_CRITICAL_TEST", Severity::Critical, 0.1)])];
        let input = ScoringInput { agent_id: "erc8004:1:0xabc:1".to_string(), generated_at: 1_000, snapshots: &snapshots, active_alerts: &[] };
        let out = score(&input);
        assert_eq!(out.report.overall_risk, 100);
    }

    #[test]
    fn dedup_keeps_highest_severity_instance() {
        let snapshots = vec![
            snapshot("s1", vec![signal("ID_CARD_UNREACHABLE", Severity::Medium, 0.3)]),
            snapshot("s2", vec![signal("ID_CARD_UNREACHABLE", Severity::High, 0.8)]),
        ];
        let input = ScoringInput { agent_id: "erc8004:1:0xabc:1".to_string(), generated_at: 1_000, snapshots: &snapshots, active_alerts: &[] };
        let out = score(&input);
        assert_eq!(out.report.signals.len(), 1);
        assert_eq!(out.report.signals[0].severity, Severity::High);
    }

    #[test]
    fn confidence_high_requires_three_types_across_two_snapshots() {
        let snapshots = vec![
            snapshot(
                "s1",
                vec![
                    signal("ID_NEWBORN", Severity::Medium, 0.3),
                    signal("ID_CARD_UNREACHABLE", Severity::High, 0.8),
                    signal("ID_CARD_CHURN", Severity::Medium, 0.5),
                ],
            ),
            snapshot("s2", vec![signal("ID_NEWBORN", Severity::Medium, 0.3)]),
        ];
        let input = ScoringInput { agent_id: "erc8004:1:0xabc:1".to_string(), generated_at: 1_000, snapshots: &snapshots, active_alerts: &[] };
        let out = score(&input);
        assert_eq!(out.report.confidence, Confidence::High);
    }

    #[test]
    fn high_severity_signal_emits_alert_but_not_twice() {
        let snapshots = vec![snapshot("s1", vec![signal("ID_CARD_UNREACHABLE", Severity::High, 0.8)])];
        let input = ScoringInput { agent_id: "erc8004:1:0xabc:1".to_string(), generated_at: 1_000, snapshots: &snapshots, active_alerts: &[] };
        let out = score(&input);
        assert_eq!(out.new_alerts.len(), 1);

        let active = vec![out.new_alerts[0].clone()];
        let input2 = ScoringInput { agent_id: "erc8004:1:0xabc:1".to_string(), generated_at: 2_000, snapshots: &snapshots, active_alerts: &active };
        let out2 = score(&input2);
        assert!(out2.new_alerts.is_empty(), "already-active alert for the same condition must not be re-emitted");
    }
}
