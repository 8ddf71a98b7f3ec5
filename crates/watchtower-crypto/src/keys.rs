//! Ed25519 keypair load/generate (spec.md §4.2).

use crate::{CryptoError, CryptoResult};
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use ed25519_dalek::pkcs8::{DecodePrivateKey, DecodePublicKey, EncodePrivateKey, EncodePublicKey};
use ed25519_dalek::{SigningKey, VerifyingKey};
use rand::rngs::OsRng;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// An Ed25519 keypair. The signing key never implements `Serialize` or
/// `Debug` on purpose — the only way out of this type is through
/// `to_keypair_file`'s explicit DER + base64 encoding.
#[derive(Clone)]
pub struct KeyPair {
    signing_key: SigningKey,
    verifying_key: VerifyingKey,
}

/// On-disk keypair format: `{publicKey, privateKey}`, each base64 of the
/// SPKI-DER / PKCS8-DER encoding (spec.md §6).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KeyPairFile {
    #[serde(rename = "publicKey")]
    pub public_key: String,
    #[serde(rename = "privateKey")]
    pub private_key: String,
}

impl KeyPair {
    pub fn generate() -> Self {
        let signing_key = SigningKey::generate(&mut OsRng);
        let verifying_key = signing_key.verifying_key();
        Self { signing_key, verifying_key }
    }

    pub(crate) fn signing_key(&self) -> &SigningKey {
        &self.signing_key
    }

    pub fn verifying_key(&self) -> &VerifyingKey {
        &self.verifying_key
    }

    /// Base64 SPKI-DER encoding of the public key — the same form carried
    /// in the keypair file and expected by `verify_data`/`verifying_key_from_spki_b64`.
    pub fn public_key_b64(&self) -> String {
        self.to_keypair_file()
            .map(|f| f.public_key)
            .expect("verifying key always encodes to SPKI-DER")
    }

    pub fn to_keypair_file(&self) -> CryptoResult<KeyPairFile> {
        let public_der = self
            .verifying_key
            .to_public_key_der()
            .map_err(|e| CryptoError::InvalidKeyFormat(e.to_string()))?;
        let private_der = self
            .signing_key
            .to_pkcs8_der()
            .map_err(|e| CryptoError::InvalidKeyFormat(e.to_string()))?;
        Ok(KeyPairFile {
            public_key: BASE64.encode(public_der.as_bytes()),
            private_key: BASE64.encode(private_der.as_bytes()),
        })
    }

    pub fn from_keypair_file(file: &KeyPairFile) -> CryptoResult<Self> {
        let private_der = BASE64
            .decode(&file.private_key)
            .map_err(|e| CryptoError::InvalidKeyFormat(e.to_string()))?;
        let signing_key = SigningKey::from_pkcs8_der(&private_der)
            .map_err(|e| CryptoError::InvalidKeyFormat(e.to_string()))?;
        let verifying_key = signing_key.verifying_key();
        Ok(Self { signing_key, verifying_key })
    }

    /// Load the keypair at `path`, or generate and persist a fresh one if
    /// it doesn't exist yet. Malformed key material is fatal (spec.md §4.2).
    pub fn ensure_keypair(path: impl AsRef<Path>) -> CryptoResult<Self> {
        let path = path.as_ref();
        if path.exists() {
            let contents = std::fs::read_to_string(path)
                .map_err(|e| CryptoError::InvalidKeyFormat(e.to_string()))?;
            let file: KeyPairFile = serde_json::from_str(&contents)
                .map_err(|e| CryptoError::InvalidKeyFormat(e.to_string()))?;
            Self::from_keypair_file(&file)
        } else {
            let kp = Self::generate();
            let file = kp.to_keypair_file()?;
            let contents = serde_json::to_string_pretty(&file)
                .map_err(|e| CryptoError::InvalidKeyFormat(e.to_string()))?;
            if let Some(parent) = path.parent() {
                std::fs::create_dir_all(parent).map_err(|e| CryptoError::InvalidKeyFormat(e.to_string()))?;
            }
            std::fs::write(path, contents).map_err(|e| CryptoError::InvalidKeyFormat(e.to_string()))?;
            Ok(kp)
        }
    }
}

/// Parse a base64-encoded SPKI-DER public key, as found in a keypair file.
pub fn verifying_key_from_spki_b64(public_key_b64: &str) -> CryptoResult<VerifyingKey> {
    let der = BASE64
        .decode(public_key_b64)
        .map_err(|e| CryptoError::InvalidKeyFormat(e.to_string()))?;
    VerifyingKey::from_public_key_der(&der).map_err(|e| CryptoError::InvalidKeyFormat(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keypair_file_round_trips() {
        let kp = KeyPair::generate();
        let file = kp.to_keypair_file().unwrap();
        let restored = KeyPair::from_keypair_file(&file).unwrap();
        assert_eq!(kp.verifying_key().as_bytes(), restored.verifying_key().as_bytes());
    }

    #[test]
    fn ensure_keypair_persists_and_reloads() {
        let dir = std::env::temp_dir().join(format!("wt-keytest-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("keypair.json");
        let kp1 = KeyPair::ensure_keypair(&path).unwrap();
        let kp2 = KeyPair::ensure_keypair(&path).unwrap();
        assert_eq!(kp1.verifying_key().as_bytes(), kp2.verifying_key().as_bytes());
        std::fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn public_key_der_parses_back() {
        let kp = KeyPair::generate();
        let file = kp.to_keypair_file().unwrap();
        let vk = verifying_key_from_spki_b64(&file.public_key).unwrap();
        assert_eq!(vk.as_bytes(), kp.verifying_key().as_bytes());
    }
}
