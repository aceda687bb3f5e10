// src/core/attacks/brute_force.rs
use async_trait::async_trait;
use tracing::debug;
use uuid::Uuid;

use super::{AttackKind, AttackOutcome, AttackScenario, SecurityPosture};
use crate::{
    core::{identity::biometric, services::VerificationRequest},
    BiometricEngine,
};

/// Floods the matcher with freshly synthesized samples at a strict threshold.
pub struct BruteForce;

#[async_trait]
impl AttackScenario for BruteForce {
    fn kind(&self) -> AttackKind {
        AttackKind::BruteForce
    }

    async fn execute(
        &self,
        engine: &BiometricEngine,
        target: Uuid,
        posture: SecurityPosture,
    ) -> AttackOutcome {
        let config = engine.config();
        let guards = posture.guards();
        let mut best_score = 0.0_f64;

        for attempt in 1..=config.attacks.brute_force_attempts {
            let sample = biometric::synthesize_embedding(config.engine.embedding_size);
            let request = VerificationRequest::new(target, Some(sample), config.attacks.attacker_ip.clone())
                .with_threshold(config.attacks.brute_force_threshold)
                .as_attack();

            let response = engine.verify_guarded(request, guards).await;
            debug!(attempt, score = response.similarity_score, "Brute force attempt");

            if response.is_rate_limited() {
                let mut outcome = AttackOutcome::blocked("Brute Force Throttled (Rate Limit Active)");
                outcome.auth = Some(response);
                return outcome;
            }
            if response.success {
                let mut outcome = AttackOutcome::succeeded(format!("Brute Force SUCCESS after {} attempts", attempt));
                outcome.auth = Some(response);
                return outcome;
            }

            best_score = best_score.max(response.similarity_score);
        }

        AttackOutcome::failed(format!("Brute Force Failed. Best Score: {:.4}", best_score))
    }
}
