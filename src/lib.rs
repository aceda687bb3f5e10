pub mod core;
pub mod utils;

use std::sync::Arc;
use tracing::info;
use uuid::Uuid;

use crate::{
    core::{
        attacks::{AttackHarness, AttackKind, AttackOutcome, AttackScenario, PacketCapture, SecurityPosture},
        audit::{AuditEvent, AuditLog, AuditSummary},
        crypto::{IntegrityVerifier, Sha3Hasher, TemplateCipher, TemplateHasher},
        identity::{BiometricTemplate, Identity, Role, TemplateStore},
        security::RateLimiter,
        services::{
            AuthResponse, IdentityService, PipelineGuards, Session, SessionIssuer,
            VerificationRequest, VerificationService,
        },
    },
    utils::{
        config::Config,
        error::Result,
        metrics::{BiometricMetrics, MetricsAggregator},
        monitoring::Monitor,
    },
};

/// Owns every piece of engine state; one instance per process or test.
pub struct BiometricEngine {
    config: Arc<Config>,
    audit: Arc<AuditLog>,
    store: Arc<TemplateStore>,
    metrics: Arc<MetricsAggregator>,
    sessions: Arc<SessionIssuer>,
    identity_service: IdentityService,
    verification_service: VerificationService,
    capture: PacketCapture,
    harness: AttackHarness,
}

impl BiometricEngine {
    pub fn new(config: Config) -> Result<Self> {
        Self::with_hasher(config, Arc::new(Sha3Hasher))
    }

    /// Builds an engine whose template digests come from `hasher`.
    pub fn with_hasher(config: Config, hasher: Arc<dyn TemplateHasher>) -> Result<Self> {
        config.validate()?;
        let config = Arc::new(config);

        let audit = Arc::new(AuditLog::new(config.audit.capacity));
        let store = Arc::new(TemplateStore::new());
        let integrity = IntegrityVerifier::new(hasher);
        let cipher = Arc::new(TemplateCipher::ephemeral());

        let rate_limiter = Arc::new(RateLimiter::new(
            config.get_rate_limit_window(),
            config.rate_limit.max_attempts,
            audit.clone(),
        ));
        let metrics = Arc::new(MetricsAggregator::new(
            config.matching.threshold,
            config.matching.unsafe_threshold,
            audit.clone(),
        ));
        let sessions = Arc::new(SessionIssuer::new(
            config.get_access_ttl(),
            config.get_refresh_ttl(),
            audit.clone(),
        ));

        let identity_service = IdentityService::new(
            config.clone(),
            store.clone(),
            integrity.clone(),
            cipher,
            audit.clone(),
        );
        let verification_service = VerificationService::new(
            config.clone(),
            rate_limiter,
            store.clone(),
            integrity.clone(),
            metrics.clone(),
            sessions.clone(),
            audit.clone(),
        );

        info!(
            hash_algorithm = integrity.algorithm(),
            threshold = config.matching.threshold,
            "Biometric engine initialized"
        );

        Ok(Self {
            config,
            audit,
            store,
            metrics,
            sessions,
            identity_service,
            verification_service,
            capture: PacketCapture::new(),
            harness: AttackHarness::new(),
        })
    }

    pub async fn register_identity(&self, username: &str, role: Role) -> Result<Identity> {
        self.identity_service.register_identity(username, role).await
    }

    pub async fn enroll(&self, identity_id: Uuid, embedding: Option<Vec<f64>>) -> Result<BiometricTemplate> {
        self.identity_service.enroll(identity_id, embedding).await
    }

    pub async fn verify(&self, request: VerificationRequest) -> AuthResponse {
        self.verification_service.verify(request).await
    }

    /// Verification with a reduced set of defenses, as used by attack scenarios.
    pub async fn verify_guarded(&self, request: VerificationRequest, guards: PipelineGuards) -> AuthResponse {
        self.verification_service.verify_guarded(request, guards).await
    }

    pub fn set_threshold(&self, value: f64) -> Result<()> {
        self.metrics.set_threshold(value)
    }

    pub fn get_metrics(&self) -> BiometricMetrics {
        self.metrics.snapshot()
    }

    pub fn get_audit_log(&self) -> Vec<AuditEvent> {
        self.audit.events()
    }

    pub fn audit_summary(&self) -> AuditSummary {
        self.audit.summary()
    }

    pub fn export_audit_log(&self) -> Result<String> {
        self.audit
            .export_json()
            .map_err(|e| crate::utils::error::NodeError::Scenario(format!("audit export failed: {}", e)))
    }

    pub async fn run_attack_scenario(
        &self,
        kind: AttackKind,
        target: Uuid,
        posture: SecurityPosture,
    ) -> AttackOutcome {
        self.harness.run(self, kind, target, posture).await
    }

    /// Replaces the handler for the scenario's kind.
    pub fn register_scenario(&mut self, scenario: Box<dyn AttackScenario>) {
        self.harness.register(scenario);
    }

    /// Records an observed sample for later replay; returns the packet count.
    pub fn capture_traffic(&self, identity_id: Uuid, embedding: Vec<f64>) -> usize {
        self.capture.record(identity_id, embedding)
    }

    pub fn rotate_token(&self, refresh_token: &str) -> String {
        self.sessions.rotate(refresh_token)
    }

    pub async fn validate_session(&self, token: &str, source_ip: &str) -> Result<Session> {
        Ok(self.sessions.validate(token, source_ip, true).await?)
    }

    pub async fn invalidate_session(&self, token: &str) -> bool {
        self.sessions.invalidate(token).await
    }

    pub async fn list_identities(&self) -> Vec<Identity> {
        self.store.list().await
    }

    pub async fn get_identity(&self, identity_id: Uuid) -> Option<Identity> {
        self.store.get(identity_id).await
    }

    pub async fn unseal_template(&self, identity_id: Uuid) -> Result<Vec<f64>> {
        self.identity_service.unseal_template(identity_id).await
    }

    pub fn monitor(&self) -> Monitor {
        Monitor::new(
            self.metrics.clone(),
            self.sessions.clone(),
            self.config.get_metrics_log_interval(),
        )
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn audit(&self) -> &AuditLog {
        &self.audit
    }

    pub fn store(&self) -> &TemplateStore {
        &self.store
    }

    pub fn sessions(&self) -> &SessionIssuer {
        &self.sessions
    }

    pub fn capture(&self) -> &PacketCapture {
        &self.capture
    }
}
