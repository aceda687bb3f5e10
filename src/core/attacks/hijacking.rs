// src/core/attacks/hijacking.rs
use async_trait::async_trait;
use uuid::Uuid;

use super::{record_detection, AttackKind, AttackOutcome, AttackScenario, SecurityPosture};
use crate::{core::services::VerificationRequest, utils::error::SessionError, BiometricEngine};

/// Authenticates the victim, then presents the stolen access token from
/// another address. The hardened posture enforces the token's IP binding.
pub struct SessionHijacking;

#[async_trait]
impl AttackScenario for SessionHijacking {
    fn kind(&self) -> AttackKind {
        AttackKind::SessionHijacking
    }

    async fn execute(
        &self,
        engine: &BiometricEngine,
        target: Uuid,
        posture: SecurityPosture,
    ) -> AttackOutcome {
        let config = engine.config();
        let hijacker_ip = config.attacks.hijacker_ip.as_str();

        let victim = match engine.store().get(target).await {
            Some(identity) => identity,
            None => return AttackOutcome::failed("Could not establish victim session."),
        };
        let embedding = victim.template.as_ref().map(|template| template.embedding.clone());

        let request = VerificationRequest::new(target, embedding, config.engine.default_client_ip.clone());
        let victim_auth = engine.verify(request).await;
        let stolen_token = match victim_auth.access_token.as_deref() {
            Some(token) => token,
            None => return AttackOutcome::failed("Could not establish victim session."),
        };

        match engine
            .sessions()
            .validate(stolen_token, hijacker_ip, posture.is_hardened())
            .await
        {
            Ok(_) => AttackOutcome::succeeded("Session Hijacked! Access granted."),
            Err(SessionError::IpMismatch { bound, used }) => {
                record_detection(
                    engine,
                    format!("Session Hijacking Blocked: Token bound to {}, used by {}", bound, used),
                    hijacker_ip,
                    Some((target, Some(victim.username))),
                );
                AttackOutcome::blocked("Token Invalid: IP Mismatch (Geo-binding active).")
            }
            Err(e) => AttackOutcome::failed(e.to_string()),
        }
    }
}
