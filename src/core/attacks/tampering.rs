// src/core/attacks/tampering.rs
use async_trait::async_trait;
use tracing::warn;
use uuid::Uuid;

use super::{AttackKind, AttackOutcome, AttackScenario, SecurityPosture};
use crate::{core::services::VerificationRequest, BiometricEngine};

pub const CORRUPTED_HASH: &str = "0xCORRUPTED_HASH";

/// Overwrites the stored template hash, keeps the embedding, and tries to
/// authenticate with the genuine embedding. The hash reverts on its own
/// after the configured delay.
pub struct Tampering;

#[async_trait]
impl AttackScenario for Tampering {
    fn kind(&self) -> AttackKind {
        AttackKind::Tampering
    }

    async fn execute(
        &self,
        engine: &BiometricEngine,
        target: Uuid,
        posture: SecurityPosture,
    ) -> AttackOutcome {
        let config = engine.config();

        let template = match engine.store().get(target).await.and_then(|identity| identity.template) {
            Some(template) => template,
            None => return AttackOutcome::failed("No template."),
        };

        if let Err(e) = engine
            .store()
            .corrupt_hash(target, CORRUPTED_HASH, config.get_tamper_revert_delay())
            .await
        {
            warn!(identity_id = %target, "Tampering could not reach the template: {}", e);
            return AttackOutcome::failed(e.to_string());
        }

        let request = VerificationRequest::new(
            target,
            Some(template.embedding),
            config.attacks.attacker_ip.clone(),
        )
        .as_attack();

        AttackOutcome::from_auth(engine.verify_guarded(request, posture.guards()).await)
    }
}
