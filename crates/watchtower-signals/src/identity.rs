//! Identity signal rules (spec.md §4.6). Pure: no I/O, callers supply
//! everything derived from store lookups.

use watchtower_types::{Evidence, FetchStatus, Severity, Signal};

pub const ID_NEWBORN: &str = "ID_NEWBORN";
pub const ID_CARD_UNREACHABLE: &str = "ID_CARD_UNREACHABLE";
pub const ID_CARD_SCHEMA_INVALID: &str = "ID_CARD_SCHEMA_INVALID";
pub const ID_CARD_CHURN: &str = "ID_CARD_CHURN";

pub struct IdentitySignalInput {
    pub agent_id: String,
    pub first_seen_at: i64,
    pub observed_at: i64,
    pub latest_fetch_status: Option<FetchStatus>,
    pub latest_snapshot_id: Option<String>,
    pub distinct_card_hashes_in_window: usize,
    pub newborn_age_seconds: u32,
    pub churn_threshold: u32,
}

/// Derives the identity-side signals an agent exhibits at `observed_at`,
/// in the stable order `sort_signals` imposes.
pub fn derive_identity_signals(input: &IdentitySignalInput) -> Vec<Signal> {
    let mut signals = Vec::new();

    if input.observed_at - input.first_seen_at < input.newborn_age_seconds as i64 {
        signals.push(Signal {
            signal_id: ID_NEWBORN.to_string(),
            severity: Severity::Medium,
            weight: 0.3,
            observed_at: input.observed_at,
            evidence: vec![Evidence { kind: "agent".to_string(), reference: input.agent_id.clone() }],
        });
    }

    let snapshot_evidence = || {
        vec![Evidence {
            kind: "identity_snapshot".to_string(),
            reference: input.latest_snapshot_id.clone().unwrap_or_default(),
        }]
    };

    match input.latest_fetch_status {
        Some(FetchStatus::Unreachable) | Some(FetchStatus::Timeout) | Some(FetchStatus::SsrfBlocked) => {
            signals.push(Signal {
                signal_id: ID_CARD_UNREACHABLE.to_string(),
                severity: Severity::High,
                weight: 0.8,
                observed_at: input.observed_at,
                evidence: snapshot_evidence(),
            });
        }
        Some(FetchStatus::InvalidSchema) => {
            signals.push(Signal {
                signal_id: ID_CARD_SCHEMA_INVALID.to_string(),
                severity: Severity::High,
                weight: 0.8,
                observed_at: input.observed_at,
                evidence: snapshot_evidence(),
            });
        }
        _ => {}
    }

    if input.distinct_card_hashes_in_window >= input.churn_threshold as usize {
        signals.push(Signal {
            signal_id: ID_CARD_CHURN.to_string(),
            severity: Severity::Medium,
            weight: 0.5,
            observed_at: input.observed_at,
            evidence: vec![Evidence { kind: "agent".to_string(), reference: input.agent_id.clone() }],
        });
    }

    watchtower_types::sort_signals(&mut signals);
    signals
}
