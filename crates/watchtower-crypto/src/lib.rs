//! Watchtower Crypto - deterministic canonicalization, SHA-256 hashing, and
//! Ed25519 signing. Every content-addressed id and every signature in the
//! pipeline is built from the primitives in this crate.

pub mod canon;
pub mod hash;
pub mod keys;
pub mod signature;

pub use canon::canonical_json;
pub use hash::sha256_hex;
pub use keys::{verifying_key_from_spki_b64, KeyPair, KeyPairFile};
pub use signature::{sign_data, sign_report, verify_data, verify_report_signature, ReportSignature, Signer};

use thiserror::Error;

#[derive(Debug, Error)]
pub enum CryptoError {
    #[error("key generation failed: {0}")]
    KeyGenerationFailed(String),
    #[error("signing failed: {0}")]
    SigningFailed(String),
    #[error("verification failed: {0}")]
    VerificationFailed(String),
    #[error("invalid key format: {0}")]
    InvalidKeyFormat(String),
}

pub type CryptoResult<T> = Result<T, CryptoError>;
