// src/core/attacks/threshold.rs
use async_trait::async_trait;
use uuid::Uuid;

use super::{record_detection, AttackKind, AttackOutcome, AttackScenario, SecurityPosture};
use crate::{
    core::{identity::biometric, services::VerificationRequest},
    BiometricEngine,
};

/// Drops the matching threshold and authenticates with a random sample.
///
/// The lowered threshold applies to the attacker's request only; the global
/// setting is left untouched.
pub struct ThresholdManipulation;

#[async_trait]
impl AttackScenario for ThresholdManipulation {
    fn kind(&self) -> AttackKind {
        AttackKind::ThresholdManipulation
    }

    async fn execute(
        &self,
        engine: &BiometricEngine,
        target: Uuid,
        posture: SecurityPosture,
    ) -> AttackOutcome {
        let config = engine.config();
        let threshold = config.attacks.manipulated_threshold;

        if posture.is_hardened() {
            record_detection(
                engine,
                format!("Threshold manipulation blocked: write of {:.2} to locked config.", threshold),
                &config.attacks.attacker_ip,
                Some((target, None)),
            );
            return AttackOutcome::blocked("Config Locked. Write access denied.");
        }

        let sample = biometric::synthesize_embedding(config.engine.embedding_size);
        let request = VerificationRequest::new(target, Some(sample), config.attacks.attacker_ip.clone())
            .with_threshold(threshold)
            .as_attack();
        let response = engine.verify_guarded(request, posture.guards()).await;

        let message = if response.success {
            format!(
                "Threshold lowered to {:.2}: random sample accepted (score {:.4}).",
                threshold, response.similarity_score
            )
        } else {
            format!(
                "Threshold lowered to {:.2}; random sample scored {:.4}. {}",
                threshold, response.similarity_score, response.message
            )
        };

        let mut outcome = AttackOutcome::from_auth(response);
        outcome.message = message;
        outcome
    }
}
