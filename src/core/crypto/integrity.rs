// src/core/crypto/integrity.rs
use std::sync::Arc;

use super::hasher::TemplateHasher;
use crate::core::identity::types::BiometricTemplate;

/// Recomputes template digests and compares them with the stored value.
#[derive(Clone)]
pub struct IntegrityVerifier {
    hasher: Arc<dyn TemplateHasher>,
}

impl IntegrityVerifier {
    pub fn new(hasher: Arc<dyn TemplateHasher>) -> Self {
        Self { hasher }
    }

    pub fn seal(&self, embedding: &[f64], salt: &str) -> String {
        self.hasher.hash(embedding, salt)
    }

    pub fn verify(&self, template: &BiometricTemplate) -> bool {
        self.hasher.hash(&template.embedding, &template.salt) == template.data_hash
    }

    pub fn algorithm(&self) -> &'static str {
        self.hasher.algorithm()
    }
}
