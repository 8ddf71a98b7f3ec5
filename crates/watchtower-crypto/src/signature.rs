//! Detached Ed25519 signing/verification (spec.md §4.2).

use crate::canon::canonical_json;
use crate::keys::{verifying_key_from_spki_b64, KeyPair};
use crate::{CryptoError, CryptoResult};
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use ed25519_dalek::{Signature as Ed25519Signature, Signer as _, Verifier as _};
use serde::{Deserialize, Serialize};

/// A `Signer` capability: `sign`/`public_key`, so future backends (KMS,
/// threshold signers) plug in without touching callers. The local Ed25519
/// `KeyPair` is the only implementation carried in this repo (spec.md §9).
pub trait Signer {
    fn sign(&self, bytes: &[u8]) -> String;
    fn public_key_b64(&self) -> String;
}

impl Signer for KeyPair {
    fn sign(&self, bytes: &[u8]) -> String {
        sign_data(bytes, self)
    }

    fn public_key_b64(&self) -> String {
        self.public_key_b64()
    }
}

/// Sign `message`, returning base64(signature). Never fails: a `SigningKey`
/// can sign any byte slice.
pub fn sign_data(message: &[u8], kp: &KeyPair) -> String {
    let sig: Ed25519Signature = kp.signing_key().sign(message);
    BASE64.encode(sig.to_bytes())
}

/// Verify `message` against `sig_b64`/`pub_key_b64`. Bad signatures and bad
/// key/signature encodings both return `false` — they never throw
/// (spec.md §4.2's "bad signature ⇒ false, never throw").
pub fn verify_data(message: &[u8], sig_b64: &str, pub_key_b64_spki: &str) -> bool {
    let verify = || -> CryptoResult<bool> {
        let sig_bytes = BASE64
            .decode(sig_b64)
            .map_err(|e| CryptoError::VerificationFailed(e.to_string()))?;
        let sig_bytes: [u8; 64] = sig_bytes
            .try_into()
            .map_err(|_| CryptoError::VerificationFailed("signature must be 64 bytes".into()))?;
        let signature = Ed25519Signature::from_bytes(&sig_bytes);
        let verifying_key = verifying_key_from_spki_b64(pub_key_b64_spki)?;
        Ok(verifying_key.verify(message, &signature).is_ok())
    };
    verify().unwrap_or(false)
}

/// A detached signature over a canonicalized report-like value.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportSignature {
    pub algo: String,
    pub public_key: String,
    pub signature: String,
    pub signed_at: i64,
}

/// Sign `canonicalJson(report)` with `kp`, stamping `signed_at` from the
/// caller-provided clock (excluded from every content hash per spec.md §5).
pub fn sign_report<T: Serialize>(report: &T, kp: &KeyPair, signed_at: i64) -> ReportSignature {
    let bytes = canonical_json(report).into_bytes();
    ReportSignature {
        algo: "ed25519".to_string(),
        public_key: kp.to_keypair_file().map(|f| f.public_key).unwrap_or_default(),
        signature: sign_data(&bytes, kp),
        signed_at,
    }
}

/// Recompute `canonicalJson(report)` and check it against `sig`.
pub fn verify_report_signature<T: Serialize>(report: &T, sig: &ReportSignature) -> bool {
    let bytes = canonical_json(report).into_bytes();
    verify_data(&bytes, &sig.signature, &sig.public_key)
}
