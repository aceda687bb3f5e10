// tests/common/mod.rs
#![allow(dead_code)]

use biosentinel::{
    core::identity::{biometric, BiometricTemplate, Identity, Role},
    utils::config::Config,
    BiometricEngine,
};

pub const CLIENT_IP: &str = "192.168.1.10";

pub struct TestContext {
    pub engine: BiometricEngine,
}

impl TestContext {
    /// Engine with default policy and no simulated latency.
    pub fn new() -> Self {
        Self::with_config(Config::default().without_latency())
    }

    pub fn with_config(config: Config) -> Self {
        Self {
            engine: BiometricEngine::new(config).expect("valid test configuration"),
        }
    }

    pub async fn enrolled(&self, username: &str) -> (Identity, BiometricTemplate) {
        let identity = self
            .engine
            .register_identity(username, Role::User)
            .await
            .expect("Failed to register identity");
        let template = self
            .engine
            .enroll(identity.id, None)
            .await
            .expect("Failed to enroll identity");
        (identity, template)
    }
}

/// A capture close to `embedding`, as a re-scan of the same face would be.
pub fn rescan(embedding: &[f64]) -> Vec<f64> {
    let noise = biometric::synthesize_embedding(embedding.len());
    embedding.iter().zip(noise).map(|(v, n)| v + n * 0.01).collect()
}
