// src/core/audit.rs

use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, VecDeque};
use tracing::{error, info, warn};
use uuid::Uuid;

pub const DEFAULT_AUDIT_CAPACITY: usize = 100;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AuditEventKind {
    AuthSuccess,
    AuthFailure,
    Enrollment,
    AttackDetected,
    SystemAlert,
    ConfigChange,
    RateLimitExceeded,
    SimulationStart,
    SimulationResult,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Severity {
    Info,
    Warning,
    Critical,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuditEvent {
    pub id: Uuid,
    pub timestamp: DateTime<Utc>,
    pub event_type: AuditEventKind,
    pub severity: Severity,
    pub details: String,
    pub source_ip: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub identity_id: Option<Uuid>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metadata: Option<serde_json::Value>,
}

impl AuditEvent {
    pub fn new(
        event_type: AuditEventKind,
        severity: Severity,
        details: impl Into<String>,
        source_ip: impl Into<String>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            timestamp: Utc::now(),
            event_type,
            severity,
            details: details.into(),
            source_ip: source_ip.into(),
            identity_id: None,
            username: None,
            metadata: None,
        }
    }

    pub fn with_identity(mut self, identity_id: Uuid) -> Self {
        self.identity_id = Some(identity_id);
        self
    }

    pub fn with_username(mut self, username: impl Into<String>) -> Self {
        self.username = Some(username.into());
        self
    }

    pub fn with_metadata(mut self, metadata: serde_json::Value) -> Self {
        self.metadata = Some(metadata);
        self
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct AuditSummary {
    pub total_events: usize,
    pub auth_events: usize,
    pub access_denied: usize,
    pub threats_detected: usize,
    pub events_by_type: BTreeMap<AuditEventKind, usize>,
}

/// Newest-first, capacity-bounded security ledger.
pub struct AuditLog {
    events: RwLock<VecDeque<AuditEvent>>,
    capacity: usize,
}

impl AuditLog {
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            events: RwLock::new(VecDeque::with_capacity(capacity)),
            capacity,
        }
    }

    pub fn record(&self, event: AuditEvent) -> Uuid {
        match event.severity {
            Severity::Info => info!(
                kind = ?event.event_type,
                source_ip = %event.source_ip,
                username = event.username.as_deref().unwrap_or("-"),
                "{}", event.details
            ),
            Severity::Warning => warn!(
                kind = ?event.event_type,
                source_ip = %event.source_ip,
                username = event.username.as_deref().unwrap_or("-"),
                "{}", event.details
            ),
            Severity::Critical => error!(
                kind = ?event.event_type,
                source_ip = %event.source_ip,
                username = event.username.as_deref().unwrap_or("-"),
                "{}", event.details
            ),
        }

        let id = event.id;
        let mut events = self.events.write();
        events.push_front(event);
        events.truncate(self.capacity);
        id
    }

    /// Snapshot of the retained events, newest first.
    pub fn events(&self) -> Vec<AuditEvent> {
        self.events.read().iter().cloned().collect()
    }

    pub fn latest(&self) -> Option<AuditEvent> {
        self.events.read().front().cloned()
    }

    pub fn len(&self) -> usize {
        self.events.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.read().is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn count_kind(&self, kind: AuditEventKind) -> usize {
        self.events.read().iter().filter(|e| e.event_type == kind).count()
    }

    pub fn summary(&self) -> AuditSummary {
        let events = self.events.read();
        let mut summary = AuditSummary {
            total_events: events.len(),
            ..AuditSummary::default()
        };

        for event in events.iter() {
            *summary.events_by_type.entry(event.event_type).or_insert(0) += 1;

            match event.event_type {
                AuditEventKind::AuthSuccess => summary.auth_events += 1,
                AuditEventKind::AuthFailure => {
                    summary.auth_events += 1;
                    summary.access_denied += 1;
                }
                _ => {}
            }

            if event.severity == Severity::Critical
                || event.event_type == AuditEventKind::AttackDetected
            {
                summary.threats_detected += 1;
            }
        }

        summary
    }

    /// Newest-first JSON array for log viewers and exporters.
    pub fn export_json(&self) -> serde_json::Result<String> {
        let events = self.events();
        serde_json::to_string_pretty(&events)
    }
}

impl Default for AuditLog {
    fn default() -> Self {
        Self::new(DEFAULT_AUDIT_CAPACITY)
    }
}
