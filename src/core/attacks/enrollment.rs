// src/core/attacks/enrollment.rs
use async_trait::async_trait;
use uuid::Uuid;

use super::{record_detection, AttackKind, AttackOutcome, AttackScenario, SecurityPosture};
use crate::{core::identity::types::Role, BiometricEngine};

/// Broken object-level authorization: enrolls an admin identity by
/// referencing an object the caller does not own.
pub struct UnauthorizedEnrollment;

#[async_trait]
impl AttackScenario for UnauthorizedEnrollment {
    fn kind(&self) -> AttackKind {
        AttackKind::UnauthorizedEnrollment
    }

    async fn execute(
        &self,
        engine: &BiometricEngine,
        target: Uuid,
        posture: SecurityPosture,
    ) -> AttackOutcome {
        let attacker_ip = engine.config().attacks.attacker_ip.clone();

        if posture.is_hardened() {
            record_detection(
                engine,
                "BOLA Exploitation Blocked: Enrollment checks failed.".to_string(),
                &attacker_ip,
                Some((target, Some("shadow_admin".to_string()))),
            );
            return AttackOutcome::blocked("Enrollment Rejected: Invalid Identity Reference.");
        }

        let username = format!("shadow_admin_{}", &Uuid::new_v4().simple().to_string()[..8]);
        let identity = match engine.register_identity(&username, Role::Admin).await {
            Ok(identity) => identity,
            Err(e) => return AttackOutcome::failed(format!("Shadow registration failed: {}", e)),
        };

        match engine.enroll(identity.id, None).await {
            Ok(_) => AttackOutcome::succeeded(format!(
                "Vulnerability Exploited: Shadow Admin Enrolled ({}).",
                username
            )),
            Err(e) => AttackOutcome::failed(format!("Shadow enrollment failed: {}", e)),
        }
    }
}
