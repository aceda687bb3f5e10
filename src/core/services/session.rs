// src/core/services/session.rs
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::sync::RwLock;
use tokio::time::Instant;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::core::audit::{AuditEvent, AuditEventKind, AuditLog, Severity};
use crate::core::identity::types::{Identity, Role};
use crate::utils::error::SessionError;

const ACCESS_PREFIX: &str = "jwt_access_";
const REFRESH_PREFIX: &str = "jwt_refresh_";

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Session {
    pub identity_id: Uuid,
    pub ip: String,
    pub role: Role,
    pub issued_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
    #[serde(skip)]
    expires: Instant,
}

impl Session {
    pub fn is_expired(&self, now: Instant) -> bool {
        now >= self.expires
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionTokens {
    pub access_token: String,
    pub refresh_token: String,
    pub expires_in: u64,
}

/// Mints access/refresh tokens and tracks the sessions bound to them.
pub struct SessionIssuer {
    sessions: RwLock<HashMap<String, Session>>,
    access_ttl: Duration,
    refresh_ttl: Duration,
    audit: Arc<AuditLog>,
}

impl SessionIssuer {
    pub fn new(access_ttl: Duration, refresh_ttl: Duration, audit: Arc<AuditLog>) -> Self {
        Self {
            sessions: RwLock::new(HashMap::new()),
            access_ttl,
            refresh_ttl,
            audit,
        }
    }

    pub async fn issue(&self, identity: &Identity, source_ip: &str) -> SessionTokens {
        let access_token = mint(ACCESS_PREFIX);
        let refresh_token = mint(REFRESH_PREFIX);

        let issued_at = Utc::now();
        let expires_at = issued_at
            + chrono::Duration::from_std(self.access_ttl).unwrap_or_else(|_| chrono::Duration::zero());

        let session = Session {
            identity_id: identity.id,
            ip: source_ip.to_string(),
            role: identity.role,
            issued_at,
            expires_at,
            expires: Instant::now() + self.access_ttl,
        };

        self.sessions.write().await.insert(access_token.clone(), session);
        debug!(identity_id = %identity.id, source_ip, "Session issued");

        SessionTokens {
            access_token,
            refresh_token,
            expires_in: self.access_ttl.as_secs(),
        }
    }

    /// Looks up a live session for `token` presented from `source_ip`.
    ///
    /// With `enforce_binding` the caller's address must equal the issuing one.
    /// Expired sessions are dropped on access.
    pub async fn validate(
        &self,
        token: &str,
        source_ip: &str,
        enforce_binding: bool,
    ) -> Result<Session, SessionError> {
        let now = Instant::now();
        let mut sessions = self.sessions.write().await;

        let session = sessions.get(token).ok_or(SessionError::UnknownToken)?;
        if session.is_expired(now) {
            sessions.remove(token);
            return Err(SessionError::Expired);
        }

        if enforce_binding && session.ip != source_ip {
            return Err(SessionError::IpMismatch {
                bound: session.ip.clone(),
                used: source_ip.to_string(),
            });
        }

        Ok(session.clone())
    }

    pub async fn invalidate(&self, token: &str) -> bool {
        let removed = self.sessions.write().await.remove(token);
        if let Some(session) = &removed {
            self.audit.record(
                AuditEvent::new(
                    AuditEventKind::SystemAlert,
                    Severity::Info,
                    "Session invalidated",
                    session.ip.clone(),
                )
                .with_identity(session.identity_id),
            );
        }
        removed.is_some()
    }

    /// Mints a replacement access token.
    ///
    /// The presented refresh token is not validated and no session is bound to
    /// the new token. This is a known gap of the rotation endpoint.
    pub fn rotate(&self, refresh_token: &str) -> String {
        warn!(
            presented_prefix = refresh_token.get(..REFRESH_PREFIX.len()).unwrap_or(refresh_token),
            "Token rotation performed without refresh-token validation"
        );
        mint("new_access_token_")
    }

    pub async fn purge_expired(&self) -> usize {
        let now = Instant::now();
        let mut sessions = self.sessions.write().await;
        let before = sessions.len();
        sessions.retain(|_, session| !session.is_expired(now));
        let purged = before - sessions.len();
        if purged > 0 {
            info!(purged, "Expired sessions purged");
        }
        purged
    }

    pub async fn active_sessions(&self) -> usize {
        let now = Instant::now();
        self.sessions
            .read()
            .await
            .values()
            .filter(|session| !session.is_expired(now))
            .count()
    }

    pub fn refresh_ttl(&self) -> Duration {
        self.refresh_ttl
    }
}

fn mint(prefix: &str) -> String {
    format!("{}{}_{}", prefix, Utc::now().timestamp_millis(), Uuid::new_v4().simple())
}
