// tests/integration/verification_tests.rs
use std::time::Duration;
use biosentinel::{
    core::{audit::{AuditEventKind, Severity}, identity::{biometric, Role}, services::VerificationRequest},
    utils::{config::Config, error::{AuthError, NodeError, SessionError}},
};
use uuid::Uuid;

use crate::common::{rescan, TestContext, CLIENT_IP};

#[tokio::test]
async fn test_genuine_sample_is_verified() {
    let ctx = TestContext::new();
    let (identity, template) = ctx.enrolled("alice").await;

    let response = ctx.engine
        .verify(VerificationRequest::new(identity.id, Some(rescan(&template.embedding)), CLIENT_IP))
        .await;

    assert!(response.success, "genuine rescan rejected: {:?}", response);
    assert_eq!(response.message, "Identity Verified");
    assert!(response.similarity_score >= 0.94);
    assert_eq!(response.expires_in, Some(900));

    let token = response.access_token.expect("access token issued");
    let session = ctx.engine.validate_session(&token, CLIENT_IP).await.unwrap();
    assert_eq!(session.identity_id, identity.id);
    assert_eq!(session.role, Role::User);
}

#[tokio::test]
async fn test_self_similarity_is_exact() {
    let ctx = TestContext::new();
    let (identity, template) = ctx.enrolled("mirror").await;

    let first = ctx.engine
        .verify(VerificationRequest::new(identity.id, Some(template.embedding.clone()), CLIENT_IP))
        .await;
    let second = ctx.engine
        .verify(VerificationRequest::new(identity.id, Some(template.embedding.clone()), CLIENT_IP))
        .await;

    assert!((first.similarity_score - 1.0).abs() < 1e-9);
    assert_eq!(first.similarity_score, second.similarity_score);
}

#[tokio::test]
async fn test_impostor_sample_is_rejected() {
    let ctx = TestContext::new();
    let (identity, _) = ctx.enrolled("alice").await;

    let impostor = biometric::synthesize_embedding(128);
    let response = ctx.engine
        .verify(VerificationRequest::new(identity.id, Some(impostor), CLIENT_IP))
        .await;

    assert!(!response.success);
    assert_eq!(response.outcome, Some(AuthError::NoMatch));
    assert_eq!(response.message, "Identity Verification Failed");
    assert!(response.access_token.is_none());
    assert_eq!(ctx.engine.audit().latest().unwrap().event_type, AuditEventKind::AuthFailure);
}

#[tokio::test]
async fn test_liveness_rejects_flat_and_missing_samples() {
    let ctx = TestContext::new();
    let (identity, _) = ctx.enrolled("alice").await;

    let flat = ctx.engine
        .verify(VerificationRequest::new(identity.id, Some(vec![0.5; 128]), CLIENT_IP))
        .await;
    assert_eq!(flat.outcome, Some(AuthError::LivenessFailed));
    assert_eq!(flat.message, "Liveness Check Failed");

    let missing = ctx.engine
        .verify(VerificationRequest::new(identity.id, None, CLIENT_IP))
        .await;
    assert_eq!(missing.outcome, Some(AuthError::LivenessFailed));

    // Liveness rejections never reach the matcher.
    assert_eq!(ctx.engine.get_metrics().total_attempts, 0);
}

#[tokio::test]
async fn test_liveness_rejects_non_finite_samples() {
    let ctx = TestContext::new();
    let (identity, template) = ctx.enrolled("alice").await;

    for poison in [f64::NAN, f64::INFINITY, f64::NEG_INFINITY] {
        let mut sample = template.embedding.clone();
        sample[3] = poison;

        let response = ctx.engine
            .verify(VerificationRequest::new(identity.id, Some(sample), CLIENT_IP))
            .await;
        assert_eq!(response.outcome, Some(AuthError::LivenessFailed));
        assert_eq!(response.similarity_score, 0.0);
    }

    assert_eq!(ctx.engine.get_metrics().total_attempts, 0);
}

#[tokio::test]
async fn test_not_enrolled_identities() {
    let ctx = TestContext::new();
    let pending = ctx.engine.register_identity("pending", Role::User).await.unwrap();

    for identity_id in [pending.id, Uuid::new_v4()] {
        let response = ctx.engine
            .verify(VerificationRequest::new(identity_id, Some(biometric::synthesize_embedding(128)), CLIENT_IP))
            .await;
        assert_eq!(response.outcome, Some(AuthError::NotEnrolled));
        assert_eq!(response.message, "Identity not found or not enrolled");
    }
}

#[tokio::test(start_paused = true)]
async fn test_rate_limit_blocks_sixth_attempt() {
    let ctx = TestContext::new();
    let (identity, template) = ctx.enrolled("alice").await;
    let request = || VerificationRequest::new(identity.id, Some(template.embedding.clone()), "10.1.1.1");

    for _ in 0..5 {
        assert!(ctx.engine.verify(request()).await.success);
    }

    let blocked = ctx.engine.verify(request()).await;
    assert!(blocked.is_rate_limited());
    assert_eq!(blocked.message, "Too many attempts. Access blocked for 60s.");
    assert_eq!(ctx.engine.audit().count_kind(AuditEventKind::RateLimitExceeded), 1);

    // Repeated blocks stay quiet; other addresses are unaffected.
    assert!(ctx.engine.verify(request()).await.is_rate_limited());
    assert_eq!(ctx.engine.audit().count_kind(AuditEventKind::RateLimitExceeded), 1);
    assert!(ctx.engine
        .verify(VerificationRequest::new(identity.id, Some(template.embedding.clone()), CLIENT_IP))
        .await
        .success);

    tokio::time::advance(Duration::from_secs(61)).await;
    assert!(ctx.engine.verify(request()).await.success);
}

#[tokio::test]
async fn test_far_frr_reporting() {
    let ctx = TestContext::new();
    let (identity, template) = ctx.enrolled("alice").await;

    let genuine = VerificationRequest::new(identity.id, Some(template.embedding.clone()), CLIENT_IP);
    assert!(ctx.engine.verify(genuine).await.success);

    let impostor = VerificationRequest::new(identity.id, Some(biometric::synthesize_embedding(128)), "10.2.2.2")
        .as_attack();
    assert!(!ctx.engine.verify(impostor).await.success);

    // A genuine capture that falls under a strict override counts as a false reject.
    let strict = VerificationRequest::new(identity.id, Some(rescan(&template.embedding)), CLIENT_IP)
        .with_threshold(1.0);
    assert!(!ctx.engine.verify(strict).await.success);

    let metrics = ctx.engine.get_metrics();
    assert_eq!(metrics.total_attempts, 3);
    assert_eq!(metrics.true_accepts, 1);
    assert_eq!(metrics.true_rejects, 1);
    assert_eq!(metrics.false_rejects, 1);
    assert_eq!(metrics.far, "0.00");
    assert_eq!(metrics.frr, "50.00");
}

#[tokio::test]
async fn test_set_threshold_flags_unsafe_values() {
    let ctx = TestContext::new();

    ctx.engine.set_threshold(0.3).unwrap();
    assert_eq!(ctx.engine.get_metrics().threshold, 0.3);

    let events = ctx.engine.get_audit_log();
    assert_eq!(events[0].event_type, AuditEventKind::ConfigChange);
    assert_eq!(events[1].event_type, AuditEventKind::SystemAlert);
    assert_eq!(events[1].severity, Severity::Critical);

    assert!(matches!(ctx.engine.set_threshold(f64::NAN), Err(NodeError::Config(_))));
    assert!(matches!(ctx.engine.set_threshold(1.5), Err(NodeError::Config(_))));
    assert_eq!(ctx.engine.get_metrics().threshold, 0.3);
}

#[tokio::test]
async fn test_session_binding_and_invalidation() {
    let ctx = TestContext::new();
    let (identity, template) = ctx.enrolled("alice").await;

    let response = ctx.engine
        .verify(VerificationRequest::new(identity.id, Some(template.embedding.clone()), CLIENT_IP))
        .await;
    let token = response.access_token.unwrap();

    let err = ctx.engine.validate_session(&token, "198.51.100.1").await.unwrap_err();
    assert!(matches!(err, NodeError::Session(SessionError::IpMismatch { .. })));

    assert!(ctx.engine.invalidate_session(&token).await);
    let err = ctx.engine.validate_session(&token, CLIENT_IP).await.unwrap_err();
    assert!(matches!(err, NodeError::Session(SessionError::UnknownToken)));
}

#[tokio::test(start_paused = true)]
async fn test_session_expiry() {
    let mut config = Config::default().without_latency();
    config.session.access_ttl_secs = 10;
    let ctx = TestContext::with_config(config);
    let (identity, template) = ctx.enrolled("alice").await;

    let token = ctx.engine
        .verify(VerificationRequest::new(identity.id, Some(template.embedding.clone()), CLIENT_IP))
        .await
        .access_token
        .unwrap();

    tokio::time::advance(Duration::from_secs(11)).await;
    let err = ctx.engine.validate_session(&token, CLIENT_IP).await.unwrap_err();
    assert!(matches!(err, NodeError::Session(SessionError::Expired)));
}

#[tokio::test]
async fn test_audit_log_is_bounded() {
    let mut config = Config::default().without_latency();
    config.audit.capacity = 10;
    let ctx = TestContext::with_config(config);
    let (identity, template) = ctx.enrolled("alice").await;

    for i in 0..20 {
        let ip = format!("10.9.0.{}", i);
        ctx.engine
            .verify(VerificationRequest::new(identity.id, Some(template.embedding.clone()), ip))
            .await;
    }

    let events = ctx.engine.get_audit_log();
    assert_eq!(events.len(), 10);
    assert_eq!(events[0].source_ip, "10.9.0.19");
    assert!(events.windows(2).all(|pair| pair[0].timestamp >= pair[1].timestamp));
}
