// src/core/services/verification.rs
use std::sync::Arc;
use serde::Serialize;
use tracing::debug;
use uuid::Uuid;

use super::{identity::simulate_latency, session::SessionIssuer};
use crate::{
    core::{
        audit::{AuditEvent, AuditEventKind, AuditLog, Severity},
        crypto::integrity::IntegrityVerifier,
        identity::{biometric, store::TemplateStore},
        security::rate_limiter::RateLimiter,
    },
    utils::{config::Config, error::AuthError, metrics::MetricsAggregator},
};

const SYSTEM_INTERNAL: &str = "SYSTEM_INTERNAL";

/// A single verification attempt.
#[derive(Debug, Clone, PartialEq)]
pub struct VerificationRequest {
    pub identity_id: Uuid,
    pub sample: Option<Vec<f64>>,
    pub threshold_override: Option<f64>,
    pub source_ip: String,
    pub simulated_attack: bool,
}

impl VerificationRequest {
    pub fn new(identity_id: Uuid, sample: Option<Vec<f64>>, source_ip: impl Into<String>) -> Self {
        Self {
            identity_id,
            sample,
            threshold_override: None,
            source_ip: source_ip.into(),
            simulated_attack: false,
        }
    }

    pub fn with_threshold(mut self, threshold: f64) -> Self {
        self.threshold_override = Some(threshold);
        self
    }

    pub fn as_attack(mut self) -> Self {
        self.simulated_attack = true;
        self
    }
}

/// Which optional defenses the pipeline applies.
///
/// Liveness and matching always run; rate limiting and the template
/// integrity check can be switched off to model a weaker deployment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PipelineGuards {
    pub rate_limit: bool,
    pub integrity: bool,
}

impl PipelineGuards {
    pub const ALL: PipelineGuards = PipelineGuards {
        rate_limit: true,
        integrity: true,
    };
}

impl Default for PipelineGuards {
    fn default() -> Self {
        Self::ALL
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthResponse {
    pub success: bool,
    pub message: String,
    pub similarity_score: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub access_token: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub refresh_token: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expires_in: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub outcome: Option<AuthError>,
}

impl AuthResponse {
    fn rejected(outcome: AuthError, message: impl Into<String>, similarity_score: f64) -> Self {
        Self {
            success: false,
            message: message.into(),
            similarity_score,
            access_token: None,
            refresh_token: None,
            expires_in: None,
            outcome: Some(outcome),
        }
    }

    pub fn is_rate_limited(&self) -> bool {
        self.outcome == Some(AuthError::RateLimited)
    }
}

/// Rate limit → enrollment → liveness → integrity → similarity → threshold.
pub struct VerificationService {
    config: Arc<Config>,
    rate_limiter: Arc<RateLimiter>,
    store: Arc<TemplateStore>,
    integrity: IntegrityVerifier,
    metrics: Arc<MetricsAggregator>,
    sessions: Arc<SessionIssuer>,
    audit: Arc<AuditLog>,
}

impl VerificationService {
    pub fn new(
        config: Arc<Config>,
        rate_limiter: Arc<RateLimiter>,
        store: Arc<TemplateStore>,
        integrity: IntegrityVerifier,
        metrics: Arc<MetricsAggregator>,
        sessions: Arc<SessionIssuer>,
        audit: Arc<AuditLog>,
    ) -> Self {
        Self {
            config,
            rate_limiter,
            store,
            integrity,
            metrics,
            sessions,
            audit,
        }
    }

    pub async fn verify(&self, request: VerificationRequest) -> AuthResponse {
        self.verify_guarded(request, PipelineGuards::ALL).await
    }

    pub async fn verify_guarded(
        &self,
        request: VerificationRequest,
        guards: PipelineGuards,
    ) -> AuthResponse {
        let source_ip = request.source_ip.as_str();

        if guards.rate_limit && !self.rate_limiter.allow(source_ip) {
            return AuthResponse::rejected(
                AuthError::RateLimited,
                format!(
                    "Too many attempts. Access blocked for {}s.",
                    self.rate_limiter.window().as_secs()
                ),
                0.0,
            );
        }

        simulate_latency(self.config.engine.processing_latency_ms).await;

        let threshold = request
            .threshold_override
            .unwrap_or_else(|| self.metrics.threshold());

        let identity = self.store.get(request.identity_id).await;
        let (identity, template) = match identity {
            Some(identity) => match identity.template.clone() {
                Some(template) => (identity, template),
                None => return self.not_enrolled(&request),
            },
            None => return self.not_enrolled(&request),
        };

        let sample = match request.sample.as_deref() {
            Some(sample) => sample,
            None => {
                debug!(identity_id = %identity.id, "Verification without biometric data");
                return AuthResponse::rejected(AuthError::LivenessFailed, "No biometric data", 0.0);
            }
        };

        let spread = biometric::spread(sample);
        // NaN spread from non-finite components fails the comparison too.
        if !biometric::is_finite(sample) || !(spread >= self.config.matching.liveness_floor) {
            self.audit.record(
                AuditEvent::new(
                    AuditEventKind::AuthFailure,
                    Severity::Warning,
                    "Spoof Detected: Low variance",
                    source_ip,
                )
                .with_identity(identity.id)
                .with_username(identity.username.clone())
                .with_metadata(serde_json::json!({ "spread": spread })),
            );
            return AuthResponse::rejected(AuthError::LivenessFailed, "Liveness Check Failed", 0.0);
        }

        if guards.integrity && !self.integrity.verify(&template) {
            self.audit.record(
                AuditEvent::new(
                    AuditEventKind::SystemAlert,
                    Severity::Critical,
                    format!(
                        "DATA INTEGRITY VIOLATION: Template for {} modified externally.",
                        identity.username
                    ),
                    SYSTEM_INTERNAL,
                )
                .with_identity(identity.id)
                .with_username(identity.username.clone())
                .with_metadata(serde_json::json!({ "requestIp": source_ip })),
            );
            return AuthResponse::rejected(
                AuthError::IntegrityViolation,
                "CRITICAL: Data Integrity Violation. Account Locked.",
                0.0,
            );
        }

        simulate_latency(self.config.engine.processing_latency_ms / 2).await;

        let score = biometric::cosine_similarity(sample, &template.embedding);
        let matched = score >= threshold;
        self.metrics.record_attempt(matched, request.simulated_attack);

        if !matched {
            self.audit.record(
                AuditEvent::new(
                    AuditEventKind::AuthFailure,
                    Severity::Warning,
                    format!("Biometric Mismatch: {} (Score: {:.4})", identity.username, score),
                    source_ip,
                )
                .with_identity(identity.id)
                .with_username(identity.username.clone())
                .with_metadata(serde_json::json!({ "score": score, "threshold": threshold })),
            );
            return AuthResponse::rejected(AuthError::NoMatch, "Identity Verification Failed", score);
        }

        let tokens = self.sessions.issue(&identity, source_ip).await;
        self.audit.record(
            AuditEvent::new(
                AuditEventKind::AuthSuccess,
                Severity::Info,
                format!("Access Granted: {} (Score: {:.4})", identity.username, score),
                source_ip,
            )
            .with_identity(identity.id)
            .with_username(identity.username.clone())
            .with_metadata(serde_json::json!({ "score": score, "threshold": threshold })),
        );

        AuthResponse {
            success: true,
            message: "Identity Verified".to_string(),
            similarity_score: score,
            access_token: Some(tokens.access_token),
            refresh_token: Some(tokens.refresh_token),
            expires_in: Some(tokens.expires_in),
            outcome: None,
        }
    }

    fn not_enrolled(&self, request: &VerificationRequest) -> AuthResponse {
        self.audit.record(
            AuditEvent::new(
                AuditEventKind::AuthFailure,
                Severity::Warning,
                format!("Identity Check Failed: {}", request.identity_id),
                request.source_ip.clone(),
            )
            .with_identity(request.identity_id),
        );
        AuthResponse::rejected(AuthError::NotEnrolled, "Identity not found or not enrolled", 0.0)
    }
}
