//! Pure signal derivation (spec.md §4.6): identity-side rules and the
//! funding/context classifier. No I/O beyond what callers already read
//! from the store.

pub mod funding;
pub mod identity;

pub use funding::{classify_sender, derive_funding_signals, FundingClass};
pub use identity::{derive_identity_signals, IdentitySignalInput};
