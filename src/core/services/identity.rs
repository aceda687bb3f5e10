use std::sync::Arc;
use std::time::Duration;
use chrono::Utc;
use rand::{distributions::Alphanumeric, Rng};
use tracing::{info, warn};
use uuid::Uuid;

use crate::{
    core::{
        audit::{AuditEvent, AuditEventKind, AuditLog, Severity},
        crypto::{cipher::TemplateCipher, integrity::IntegrityVerifier},
        identity::{
            biometric,
            store::TemplateStore,
            types::{BiometricTemplate, Identity, Role, TemplateAlgorithm},
        },
    },
    utils::{
        config::Config,
        error::{IdentityError, NodeError, Result},
    },
};

const INTERNAL_REGISTRY: &str = "INTERNAL_REGISTRY";
const SALT_LEN: usize = 16;

/// Registration and enrollment of identities.
pub struct IdentityService {
    config: Arc<Config>,
    store: Arc<TemplateStore>,
    integrity: IntegrityVerifier,
    cipher: Arc<TemplateCipher>,
    audit: Arc<AuditLog>,
}

impl IdentityService {
    pub fn new(
        config: Arc<Config>,
        store: Arc<TemplateStore>,
        integrity: IntegrityVerifier,
        cipher: Arc<TemplateCipher>,
        audit: Arc<AuditLog>,
    ) -> Self {
        Self {
            config,
            store,
            integrity,
            cipher,
            audit,
        }
    }

    pub async fn register_identity(&self, username: &str, role: Role) -> Result<Identity> {
        simulate_latency(self.config.engine.registration_latency_ms).await;

        let username = username.trim();
        if username.is_empty() {
            return Err(IdentityError::InvalidUsername(username.to_string()).into());
        }

        let identity = self.store.register(username, role).await?;

        self.audit.record(
            AuditEvent::new(
                AuditEventKind::SystemAlert,
                Severity::Info,
                format!("New Identity Registered: {} [{}]", identity.username, identity.role),
                INTERNAL_REGISTRY,
            )
            .with_identity(identity.id)
            .with_username(identity.username.clone()),
        );

        Ok(identity)
    }

    /// Enrolls a template for `identity_id`, synthesizing a capture when none
    /// is supplied. Captures whose spread is below the enrollment floor fail.
    pub async fn enroll(
        &self,
        identity_id: Uuid,
        embedding: Option<Vec<f64>>,
    ) -> Result<BiometricTemplate> {
        simulate_latency(self.config.engine.enrollment_latency_ms).await;

        let identity = self
            .store
            .get(identity_id)
            .await
            .ok_or_else(|| IdentityError::IdentityNotFound(identity_id.to_string()))?;

        let embedding = embedding
            .unwrap_or_else(|| biometric::synthesize_embedding(self.config.engine.embedding_size));
        if embedding.is_empty() || !biometric::is_finite(&embedding) {
            return Err(IdentityError::InvalidEmbedding(
                "embedding must be non-empty and finite".into(),
            )
            .into());
        }

        let expected = self.config.engine.embedding_size;
        if embedding.len() != expected {
            return Err(IdentityError::InvalidEmbedding(format!(
                "expected {} components, got {}",
                expected,
                embedding.len()
            ))
            .into());
        }

        let spread = biometric::spread(&embedding);
        let floor = self.config.matching.enrollment_floor;
        if spread < floor {
            warn!(identity_id = %identity_id, spread, "Enrollment rejected by quality gate");
            self.audit.record(
                AuditEvent::new(
                    AuditEventKind::SystemAlert,
                    Severity::Warning,
                    format!("Enrollment rejected for {}: biometric quality low", identity.username),
                    self.config.engine.default_client_ip.clone(),
                )
                .with_identity(identity.id)
                .with_username(identity.username.clone()),
            );
            return Err(IdentityError::LowBiometricQuality { spread, floor }.into());
        }

        let salt: String = rand::thread_rng()
            .sample_iter(&Alphanumeric)
            .take(SALT_LEN)
            .map(char::from)
            .collect();
        let data_hash = self.integrity.seal(&embedding, &salt);
        let encrypted_data = self.cipher.seal(&embedding)?;

        let template = BiometricTemplate {
            id: Uuid::new_v4(),
            identity_id,
            algorithm: TemplateAlgorithm::FaceIdV4,
            embedding,
            salt,
            data_hash,
            encrypted_data,
            created_at: Utc::now(),
        };

        self.store.attach_template(identity_id, template.clone()).await?;

        info!(identity_id = %identity_id, hash_algorithm = self.integrity.algorithm(), "Template enrolled");
        self.audit.record(
            AuditEvent::new(
                AuditEventKind::Enrollment,
                Severity::Info,
                format!("User {} enrolled. Template Hashed & Salted.", identity.username),
                self.config.engine.default_client_ip.clone(),
            )
            .with_identity(identity.id)
            .with_username(identity.username),
        );

        Ok(template)
    }

    /// Decrypts the sealed copy of a stored template's embedding.
    pub async fn unseal_template(&self, identity_id: Uuid) -> Result<Vec<f64>> {
        let identity = self
            .store
            .get(identity_id)
            .await
            .ok_or_else(|| IdentityError::IdentityNotFound(identity_id.to_string()))?;
        let template = identity
            .template
            .ok_or_else(|| NodeError::Identity(IdentityError::IdentityNotFound(format!(
                "{} is not enrolled",
                identity_id
            ))))?;

        self.cipher.open(&template.encrypted_data)
    }
}

pub(crate) async fn simulate_latency(millis: u64) {
    if millis > 0 {
        tokio::time::sleep(Duration::from_millis(millis)).await;
    }
}
