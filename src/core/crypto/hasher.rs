// src/core/crypto/hasher.rs
use sha3::{Digest, Sha3_256};

/// Salted digest over a biometric embedding.
///
/// Implementations must be deterministic: the same embedding and salt always
/// produce the same digest, which is what integrity verification relies on.
#[cfg_attr(test, mockall::automock)]
pub trait TemplateHasher: Send + Sync {
    fn hash(&self, embedding: &[f64], salt: &str) -> String;

    fn algorithm(&self) -> &'static str;
}

/// SHA3-256 over the little-endian embedding bytes followed by the salt.
#[derive(Debug, Default, Clone, Copy)]
pub struct Sha3Hasher;

impl TemplateHasher for Sha3Hasher {
    fn hash(&self, embedding: &[f64], salt: &str) -> String {
        let mut hasher = Sha3_256::new();
        for value in embedding {
            hasher.update(value.to_le_bytes());
        }
        hasher.update(salt.as_bytes());
        hex::encode(hasher.finalize())
    }

    fn algorithm(&self) -> &'static str {
        "SHA3-256"
    }
}

/// Non-cryptographic 32-bit rolling hash padded to 64 hex digits.
///
/// Kept for parity with the simulated demo; trivially forgeable.
#[derive(Debug, Default, Clone, Copy)]
pub struct RollingHasher;

impl TemplateHasher for RollingHasher {
    fn hash(&self, embedding: &[f64], salt: &str) -> String {
        let serialized = serde_json::to_string(embedding).unwrap_or_default();
        let hash = serialized
            .encode_utf16()
            .chain(salt.encode_utf16())
            .fold(0i32, |hash, unit| {
                (hash << 5).wrapping_sub(hash).wrapping_add(unit as i32)
            });
        format!("{:064x}", hash.unsigned_abs())
    }

    fn algorithm(&self) -> &'static str {
        "ROLLING-32"
    }
}
