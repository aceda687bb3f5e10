// src/core/attacks/replay.rs
use async_trait::async_trait;
use uuid::Uuid;

use super::{record_detection, AttackKind, AttackOutcome, AttackScenario, SecurityPosture};
use crate::{core::services::VerificationRequest, BiometricEngine};

/// Resubmits the latest captured sample for the target.
///
/// The hardened posture refuses packets older than the freshness window.
pub struct Replay;

#[async_trait]
impl AttackScenario for Replay {
    fn kind(&self) -> AttackKind {
        AttackKind::Replay
    }

    async fn execute(
        &self,
        engine: &BiometricEngine,
        target: Uuid,
        posture: SecurityPosture,
    ) -> AttackOutcome {
        let config = engine.config();
        let attacker_ip = config.attacks.attacker_ip.as_str();

        let packet = match engine.capture().latest_for(target) {
            Some(packet) => packet,
            None => return AttackOutcome::failed("No packets captured."),
        };

        if posture.is_hardened() {
            let age = packet.age();
            if age > config.get_replay_window() {
                let username = engine.store().get(target).await.map(|identity| identity.username);
                record_detection(
                    engine,
                    format!("REPLAY BLOCKED: Stale Packet (Age: {}ms, nonce {}).", age.as_millis(), packet.nonce),
                    attacker_ip,
                    Some((target, username)),
                );
                return AttackOutcome::blocked("Replay Detected: Timestamp expired.");
            }
        }

        let request = VerificationRequest::new(target, Some(packet.embedding), attacker_ip).as_attack();
        AttackOutcome::from_auth(engine.verify_guarded(request, posture.guards()).await)
    }
}
