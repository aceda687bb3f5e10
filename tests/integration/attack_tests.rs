// tests/integration/attack_tests.rs
use std::time::Duration;
use async_trait::async_trait;
use biosentinel::{
    core::{
        attacks::{AttackKind, AttackOutcome, AttackScenario, SecurityPosture},
        audit::AuditEventKind,
        identity::Role,
        services::VerificationRequest,
    },
    utils::error::AuthError,
    BiometricEngine,
};
use uuid::Uuid;

use crate::common::{rescan, TestContext, CLIENT_IP};

#[tokio::test(start_paused = true)]
async fn test_stale_replay_blocked_when_hardened() {
    let ctx = TestContext::new();
    let (identity, template) = ctx.enrolled("alice").await;
    ctx.engine.capture_traffic(identity.id, rescan(&template.embedding));

    tokio::time::advance(Duration::from_secs(6)).await;

    let outcome = ctx.engine
        .run_attack_scenario(AttackKind::Replay, identity.id, SecurityPosture::Hardened)
        .await;
    assert!(outcome.blocked);
    assert!(!outcome.success);
    assert_eq!(outcome.message, "Replay Detected: Timestamp expired.");
    assert_eq!(ctx.engine.audit().count_kind(AuditEventKind::AttackDetected), 1);
}

#[tokio::test(start_paused = true)]
async fn test_fresh_replay_is_accepted() {
    let ctx = TestContext::new();
    let (identity, template) = ctx.enrolled("alice").await;
    ctx.engine.capture_traffic(identity.id, rescan(&template.embedding));

    tokio::time::advance(Duration::from_secs(2)).await;

    let outcome = ctx.engine
        .run_attack_scenario(AttackKind::Replay, identity.id, SecurityPosture::Hardened)
        .await;
    assert!(outcome.success, "fresh replay rejected: {}", outcome.message);

    // Replayed traffic is an impostor attempt that got through.
    assert_eq!(ctx.engine.get_metrics().false_accepts, 1);
}

#[tokio::test(start_paused = true)]
async fn test_stale_replay_accepted_at_baseline() {
    let ctx = TestContext::new();
    let (identity, template) = ctx.enrolled("alice").await;
    ctx.engine.capture_traffic(identity.id, rescan(&template.embedding));

    tokio::time::advance(Duration::from_secs(6)).await;

    let outcome = ctx.engine
        .run_attack_scenario(AttackKind::Replay, identity.id, SecurityPosture::Baseline)
        .await;
    assert!(outcome.success, "baseline replay rejected: {}", outcome.message);
    assert!(!outcome.blocked);
    assert_eq!(ctx.engine.audit().count_kind(AuditEventKind::AttackDetected), 0);
}

#[tokio::test(start_paused = true)]
async fn test_replay_at_freshness_limit_is_not_stale() {
    let ctx = TestContext::new();
    let (identity, template) = ctx.enrolled("alice").await;
    ctx.engine.capture_traffic(identity.id, rescan(&template.embedding));

    tokio::time::advance(Duration::from_secs(5)).await;

    let outcome = ctx.engine
        .run_attack_scenario(AttackKind::Replay, identity.id, SecurityPosture::Hardened)
        .await;
    assert!(!outcome.blocked);
    assert!(outcome.success, "replay at the limit rejected: {}", outcome.message);
}

#[tokio::test]
async fn test_replay_without_capture() {
    let ctx = TestContext::new();
    let (identity, _) = ctx.enrolled("alice").await;

    let outcome = ctx.engine
        .run_attack_scenario(AttackKind::Replay, identity.id, SecurityPosture::Baseline)
        .await;
    assert!(!outcome.success && !outcome.blocked);
    assert_eq!(outcome.message, "No packets captured.");
}

#[tokio::test(start_paused = true)]
async fn test_tampering_detected_and_reverted() {
    let ctx = TestContext::new();
    let (identity, template) = ctx.enrolled("alice").await;

    let outcome = ctx.engine
        .run_attack_scenario(AttackKind::Tampering, identity.id, SecurityPosture::Hardened)
        .await;
    assert!(outcome.blocked);
    let auth = outcome.auth.expect("tampering goes through verification");
    assert_eq!(auth.outcome, Some(AuthError::IntegrityViolation));
    assert_eq!(auth.message, "CRITICAL: Data Integrity Violation. Account Locked.");
    assert!(ctx.engine.store().has_pending_restore(identity.id).await);

    // Still locked for the owner until the hash reverts.
    let locked = ctx.engine
        .verify(VerificationRequest::new(identity.id, Some(template.embedding.clone()), CLIENT_IP))
        .await;
    assert_eq!(locked.outcome, Some(AuthError::IntegrityViolation));

    tokio::time::advance(Duration::from_secs(6)).await;

    let restored = ctx.engine
        .verify(VerificationRequest::new(identity.id, Some(template.embedding.clone()), CLIENT_IP))
        .await;
    assert!(restored.success);
    assert!(!ctx.engine.store().has_pending_restore(identity.id).await);
}

#[tokio::test]
async fn test_tampering_goes_unnoticed_without_integrity_check() {
    let ctx = TestContext::new();
    let (identity, _) = ctx.enrolled("alice").await;

    let outcome = ctx.engine
        .run_attack_scenario(AttackKind::Tampering, identity.id, SecurityPosture::Baseline)
        .await;
    assert!(outcome.success);
}

#[tokio::test]
async fn test_brute_force_throttled_when_hardened() {
    let ctx = TestContext::new();
    let (identity, _) = ctx.enrolled("alice").await;

    let outcome = ctx.engine
        .run_attack_scenario(AttackKind::BruteForce, identity.id, SecurityPosture::Hardened)
        .await;
    assert!(outcome.blocked);
    assert_eq!(outcome.message, "Brute Force Throttled (Rate Limit Active)");
    assert_eq!(outcome.auth.unwrap().outcome, Some(AuthError::RateLimited));

    // Five attempts reached the matcher before the sixth was refused.
    assert_eq!(ctx.engine.get_metrics().true_rejects, 5);
    assert_eq!(ctx.engine.audit().count_kind(AuditEventKind::RateLimitExceeded), 1);
}

#[tokio::test]
async fn test_brute_force_exhausts_budget_without_rate_limit() {
    let ctx = TestContext::new();
    let (identity, _) = ctx.enrolled("alice").await;

    let outcome = ctx.engine
        .run_attack_scenario(AttackKind::BruteForce, identity.id, SecurityPosture::Baseline)
        .await;
    assert!(!outcome.success && !outcome.blocked);
    assert!(outcome.message.starts_with("Brute Force Failed. Best Score:"));
    assert_eq!(ctx.engine.get_metrics().true_rejects, 20);
}

#[tokio::test]
async fn test_unauthorized_enrollment() {
    let ctx = TestContext::new();
    let (identity, _) = ctx.enrolled("alice").await;

    let blocked = ctx.engine
        .run_attack_scenario(AttackKind::UnauthorizedEnrollment, identity.id, SecurityPosture::Hardened)
        .await;
    assert!(blocked.blocked);
    assert_eq!(blocked.message, "Enrollment Rejected: Invalid Identity Reference.");
    assert_eq!(ctx.engine.list_identities().await.len(), 1);

    let exploited = ctx.engine
        .run_attack_scenario(AttackKind::UnauthorizedEnrollment, identity.id, SecurityPosture::Baseline)
        .await;
    assert!(exploited.success);

    let identities = ctx.engine.list_identities().await;
    assert_eq!(identities.len(), 2);
    let shadow = identities
        .iter()
        .find(|i| i.username.starts_with("shadow_admin_"))
        .expect("shadow admin registered");
    assert_eq!(shadow.role, Role::Admin);
    assert!(shadow.enrolled);
}

#[tokio::test]
async fn test_session_hijacking() {
    let ctx = TestContext::new();
    let (identity, _) = ctx.enrolled("alice").await;

    let blocked = ctx.engine
        .run_attack_scenario(AttackKind::SessionHijacking, identity.id, SecurityPosture::Hardened)
        .await;
    assert!(blocked.blocked);
    assert_eq!(blocked.message, "Token Invalid: IP Mismatch (Geo-binding active).");

    let hijacked = ctx.engine
        .run_attack_scenario(AttackKind::SessionHijacking, identity.id, SecurityPosture::Baseline)
        .await;
    assert!(hijacked.success);
    assert_eq!(hijacked.message, "Session Hijacked! Access granted.");
}

#[tokio::test]
async fn test_threshold_manipulation_leaves_global_threshold() {
    let ctx = TestContext::new();
    let (identity, _) = ctx.enrolled("alice").await;

    let blocked = ctx.engine
        .run_attack_scenario(AttackKind::ThresholdManipulation, identity.id, SecurityPosture::Hardened)
        .await;
    assert!(blocked.blocked);
    assert_eq!(blocked.message, "Config Locked. Write access denied.");
    assert_eq!(ctx.engine.get_metrics().total_attempts, 0);

    let baseline = ctx.engine
        .run_attack_scenario(AttackKind::ThresholdManipulation, identity.id, SecurityPosture::Baseline)
        .await;
    assert!(!baseline.blocked);
    assert!(baseline.message.starts_with("Threshold lowered to 0.10"));
    assert!(baseline.auth.is_some());
    assert_eq!(ctx.engine.get_metrics().threshold, 0.94);
    assert_eq!(ctx.engine.get_metrics().total_attempts, 1);
}

#[tokio::test]
async fn test_scenario_runs_are_audited() {
    let ctx = TestContext::new();
    let (identity, _) = ctx.enrolled("alice").await;

    ctx.engine
        .run_attack_scenario(AttackKind::SessionHijacking, identity.id, SecurityPosture::Hardened)
        .await;

    let events = ctx.engine.get_audit_log();
    assert_eq!(events[0].event_type, AuditEventKind::SimulationResult);
    assert_eq!(events.last().map(|e| e.event_type), Some(AuditEventKind::SystemAlert));
    assert_eq!(ctx.engine.audit().count_kind(AuditEventKind::SimulationStart), 1);

    let summary = ctx.engine.audit_summary();
    assert_eq!(summary.threats_detected, 1);

    let exported: Vec<serde_json::Value> =
        serde_json::from_str(&ctx.engine.export_audit_log().unwrap()).unwrap();
    assert_eq!(exported.len(), events.len());
    assert_eq!(exported[0]["eventType"], "SIMULATION_RESULT");
}

struct CannedReplay;

#[async_trait]
impl AttackScenario for CannedReplay {
    fn kind(&self) -> AttackKind {
        AttackKind::Replay
    }

    async fn execute(&self, _engine: &BiometricEngine, _target: Uuid, _posture: SecurityPosture) -> AttackOutcome {
        AttackOutcome::succeeded("canned")
    }
}

#[tokio::test]
async fn test_custom_scenario_replaces_builtin() {
    let mut ctx = TestContext::new();
    let (identity, _) = ctx.enrolled("alice").await;

    ctx.engine.register_scenario(Box::new(CannedReplay));
    let outcome = ctx.engine
        .run_attack_scenario(AttackKind::Replay, identity.id, SecurityPosture::Hardened)
        .await;
    assert!(outcome.success);
    assert_eq!(outcome.message, "canned");
}
