// src/core/crypto/cipher.rs
use aes_gcm::{
    aead::{Aead, KeyInit},
    Aes256Gcm, Key, Nonce,
};
use rand::{rngs::OsRng, RngCore};
use sha3::{Digest, Sha3_256};

use crate::utils::error::{NodeError, Result};

const NONCE_LEN: usize = 12;
pub const SEALED_PREFIX: &str = "AES256-GCM::";

/// Seals embeddings into the opaque blob stored next to each template.
pub struct TemplateCipher {
    cipher: Aes256Gcm,
}

impl TemplateCipher {
    pub fn new(key: &[u8]) -> Self {
        let hash = Sha3_256::digest(key);
        let cipher_key = Key::<Aes256Gcm>::from_slice(hash.as_slice());
        Self {
            cipher: Aes256Gcm::new(cipher_key),
        }
    }

    /// Cipher keyed with fresh random material, valid for this process only.
    pub fn ephemeral() -> Self {
        let mut key = [0u8; 32];
        OsRng.fill_bytes(&mut key);
        Self::new(&key)
    }

    pub fn seal(&self, embedding: &[f64]) -> Result<String> {
        let plaintext: Vec<u8> = embedding.iter().flat_map(|v| v.to_le_bytes()).collect();

        let mut nonce_bytes = [0u8; NONCE_LEN];
        OsRng.fill_bytes(&mut nonce_bytes);
        let nonce = Nonce::from_slice(&nonce_bytes);

        let ciphertext = self.cipher
            .encrypt(nonce, plaintext.as_slice())
            .map_err(|e| NodeError::Crypto(format!("template seal failed: {}", e)))?;

        let mut blob = Vec::with_capacity(NONCE_LEN + ciphertext.len());
        blob.extend_from_slice(&nonce_bytes);
        blob.extend_from_slice(&ciphertext);

        Ok(format!("{}{}", SEALED_PREFIX, hex::encode(blob)))
    }

    pub fn open(&self, sealed: &str) -> Result<Vec<f64>> {
        let encoded = sealed
            .strip_prefix(SEALED_PREFIX)
            .ok_or_else(|| NodeError::Crypto("missing sealed blob prefix".into()))?;
        let blob = hex::decode(encoded)
            .map_err(|e| NodeError::Crypto(format!("invalid sealed blob: {}", e)))?;

        if blob.len() < NONCE_LEN {
            return Err(NodeError::Crypto("Invalid encrypted data length".into()));
        }

        let (nonce_bytes, ciphertext) = blob.split_at(NONCE_LEN);
        let plaintext = self.cipher
            .decrypt(Nonce::from_slice(nonce_bytes), ciphertext)
            .map_err(|e| NodeError::Crypto(format!("template open failed: {}", e)))?;

        if plaintext.len() % 8 != 0 {
            return Err(NodeError::Crypto("sealed embedding has a partial value".into()));
        }

        Ok(plaintext
            .chunks_exact(8)
            .map(|chunk| {
                let mut bytes = [0u8; 8];
                bytes.copy_from_slice(chunk);
                f64::from_le_bytes(bytes)
            })
            .collect())
    }
}
