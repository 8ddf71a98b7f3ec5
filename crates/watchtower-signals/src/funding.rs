//! Context-side (funding) signal rules (spec.md §4.6). Classification of
//! the first inbound value transfer's sender follows the precedence
//! denylist > allowlist > bridgelist > contract-bit > default; emitting
//! the delegated-payment signal itself requires decoding a settlement-side
//! topic this watchtower does not yet subscribe to, so
//! `derive_funding_signals` only ever sees a sender the caller already
//! resolved and classifies it — it never reaches into chain data itself.

use std::collections::HashSet;
use watchtower_types::{Evidence, Severity, Signal};

pub const ID_FUNDING_MIXER: &str = "ID_FUNDING_MIXER";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FundingClass {
    Eoa,
    Contract,
    Cex,
    Mixer,
    Bridge,
    Unknown,
}

/// Classifies `sender` using denylist > allowlist > bridgelist >
/// contract-bit > default precedence (spec.md §4.6). `is_contract` is
/// `None` when the caller couldn't determine whether `sender` carries
/// code (e.g. the lookup itself failed) — that resolves to `Unknown`
/// rather than guessing `Eoa`, since an EVM address is provably one or
/// the other only once its code has actually been checked.
pub fn classify_sender(
    sender: &str,
    denylist: &HashSet<String>,
    allowlist: &HashSet<String>,
    bridgelist: &HashSet<String>,
    is_contract: Option<bool>,
) -> FundingClass {
    let sender = sender.to_lowercase();
    if denylist.contains(&sender) {
        return FundingClass::Mixer;
    }
    if allowlist.contains(&sender) {
        return FundingClass::Cex;
    }
    if bridgelist.contains(&sender) {
        return FundingClass::Bridge;
    }
    match is_contract {
        Some(true) => FundingClass::Contract,
        Some(false) => FundingClass::Eoa,
        None => FundingClass::Unknown,
    }
}

/// Emits a high-severity signal when the funding source classifies as a
/// mixer or otherwise denylisted sender; otherwise empty.
pub fn derive_funding_signals(agent_id: &str, sender: &str, class: FundingClass, observed_at: i64) -> Vec<Signal> {
    match class {
        FundingClass::Mixer => vec![Signal {
            signal_id: ID_FUNDING_MIXER.to_string(),
            severity: Severity::High,
            weight: 0.8,
            observed_at,
            evidence: vec![
                Evidence { kind: "agent".to_string(), reference: agent_id.to_string() },
                Evidence { kind: "funding_sender".to_string(), reference: sender.to_lowercase() },
            ],
        }],
        _ => vec![],
    }
}
