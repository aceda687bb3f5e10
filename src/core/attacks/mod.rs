//! Scripted adversarial scenarios run against the verification pipeline

pub mod capture;
mod brute_force;
mod enrollment;
mod hijacking;
mod replay;
mod tampering;
mod threshold;

use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;
use async_trait::async_trait;
use serde::Serialize;
use tracing::info;
use uuid::Uuid;

use crate::{
    core::{
        audit::{AuditEvent, AuditEventKind, Severity},
        services::{identity::simulate_latency, AuthResponse, PipelineGuards},
    },
    utils::error::{AuthError, NodeError},
    BiometricEngine,
};

pub use brute_force::BruteForce;
pub use capture::{CapturedPacket, PacketCapture};
pub use enrollment::UnauthorizedEnrollment;
pub use hijacking::SessionHijacking;
pub use replay::Replay;
pub use tampering::Tampering;
pub use threshold::ThresholdManipulation;

const SIMULATOR_ACTOR: &str = "admin_simulator";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AttackKind {
    Replay,
    Tampering,
    BruteForce,
    UnauthorizedEnrollment,
    SessionHijacking,
    ThresholdManipulation,
}

impl AttackKind {
    pub const ALL: [AttackKind; 6] = [
        AttackKind::Replay,
        AttackKind::Tampering,
        AttackKind::BruteForce,
        AttackKind::UnauthorizedEnrollment,
        AttackKind::SessionHijacking,
        AttackKind::ThresholdManipulation,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            AttackKind::Replay => "REPLAY",
            AttackKind::Tampering => "TAMPERING",
            AttackKind::BruteForce => "BRUTE_FORCE",
            AttackKind::UnauthorizedEnrollment => "UNAUTHORIZED_ENROLLMENT",
            AttackKind::SessionHijacking => "SESSION_HIJACKING",
            AttackKind::ThresholdManipulation => "THRESHOLD_MANIPULATION",
        }
    }
}

impl fmt::Display for AttackKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AttackKind {
    type Err = NodeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_ascii_uppercase().replace('-', "_");
        AttackKind::ALL
            .into_iter()
            .find(|kind| kind.as_str() == normalized)
            .ok_or_else(|| NodeError::Scenario(format!("unknown attack scenario '{}'", s)))
    }
}

/// Named set of active defenses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SecurityPosture {
    Baseline,
    Hardened,
}

impl SecurityPosture {
    pub fn is_hardened(&self) -> bool {
        matches!(self, SecurityPosture::Hardened)
    }

    /// Pipeline defenses active under this posture.
    pub fn guards(&self) -> PipelineGuards {
        match self {
            SecurityPosture::Hardened => PipelineGuards::ALL,
            SecurityPosture::Baseline => PipelineGuards {
                rate_limit: false,
                integrity: false,
            },
        }
    }
}

impl fmt::Display for SecurityPosture {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SecurityPosture::Baseline => f.write_str("baseline"),
            SecurityPosture::Hardened => f.write_str("hardened"),
        }
    }
}

impl FromStr for SecurityPosture {
    type Err = NodeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "baseline" | "low" => Ok(SecurityPosture::Baseline),
            "hardened" | "high" => Ok(SecurityPosture::Hardened),
            other => Err(NodeError::Scenario(format!("unknown security posture '{}'", other))),
        }
    }
}

/// Verdict of one scenario run.
///
/// `success` means the attack achieved its goal; `blocked` means a defense
/// engaged. A run can be neither, e.g. a brute force that exhausts its budget.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AttackOutcome {
    pub success: bool,
    pub blocked: bool,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub auth: Option<AuthResponse>,
}

impl AttackOutcome {
    pub fn succeeded(message: impl Into<String>) -> Self {
        Self { success: true, blocked: false, message: message.into(), auth: None }
    }

    pub fn blocked(message: impl Into<String>) -> Self {
        Self { success: false, blocked: true, message: message.into(), auth: None }
    }

    pub fn failed(message: impl Into<String>) -> Self {
        Self { success: false, blocked: false, message: message.into(), auth: None }
    }

    /// Maps a verification response: access granted is a success, a terminal
    /// defense outcome is a block, anything else a plain failure.
    pub fn from_auth(response: AuthResponse) -> Self {
        let mut outcome = match response.outcome {
            None if response.success => AttackOutcome::succeeded(response.message.clone()),
            Some(AuthError::RateLimited) | Some(AuthError::IntegrityViolation) => {
                AttackOutcome::blocked(response.message.clone())
            }
            _ => AttackOutcome::failed(response.message.clone()),
        };
        outcome.auth = Some(response);
        outcome
    }
}

#[async_trait]
pub trait AttackScenario: Send + Sync {
    fn kind(&self) -> AttackKind;

    async fn execute(
        &self,
        engine: &BiometricEngine,
        target: Uuid,
        posture: SecurityPosture,
    ) -> AttackOutcome;
}

/// Registry of scenario handlers keyed by attack kind.
pub struct AttackHarness {
    scenarios: HashMap<AttackKind, Box<dyn AttackScenario>>,
}

impl AttackHarness {
    pub fn empty() -> Self {
        Self { scenarios: HashMap::new() }
    }

    pub fn new() -> Self {
        let mut harness = Self::empty();
        harness.register(Box::new(Replay));
        harness.register(Box::new(Tampering));
        harness.register(Box::new(BruteForce));
        harness.register(Box::new(UnauthorizedEnrollment));
        harness.register(Box::new(SessionHijacking));
        harness.register(Box::new(ThresholdManipulation));
        harness
    }

    /// Installs `scenario`, replacing any handler for the same kind.
    pub fn register(&mut self, scenario: Box<dyn AttackScenario>) {
        self.scenarios.insert(scenario.kind(), scenario);
    }

    pub fn kinds(&self) -> Vec<AttackKind> {
        AttackKind::ALL
            .into_iter()
            .filter(|kind| self.scenarios.contains_key(kind))
            .collect()
    }

    pub async fn run(
        &self,
        engine: &BiometricEngine,
        kind: AttackKind,
        target: Uuid,
        posture: SecurityPosture,
    ) -> AttackOutcome {
        let config = engine.config();
        let attacker_ip = config.attacks.attacker_ip.as_str();

        engine.audit().record(
            AuditEvent::new(
                AuditEventKind::SimulationStart,
                Severity::Info,
                format!(
                    "{}: Adversary Emulation Started against {}. Profile: {}",
                    kind, target, posture
                ),
                attacker_ip,
            )
            .with_username(SIMULATOR_ACTOR)
            .with_identity(target),
        );

        simulate_latency(config.engine.attack_latency_ms).await;

        let outcome = match self.scenarios.get(&kind) {
            Some(scenario) => scenario.execute(engine, target, posture).await,
            None => AttackOutcome::failed("Unknown Attack"),
        };

        info!(
            attack = %kind,
            posture = %posture,
            success = outcome.success,
            blocked = outcome.blocked,
            "Attack scenario finished"
        );

        let severity = if outcome.success { Severity::Warning } else { Severity::Info };
        engine.audit().record(
            AuditEvent::new(
                AuditEventKind::SimulationResult,
                severity,
                format!("{}: Result: {}", kind, outcome.message),
                attacker_ip,
            )
            .with_username(SIMULATOR_ACTOR)
            .with_identity(target)
            .with_metadata(serde_json::json!({
                "attackType": kind,
                "posture": posture,
                "success": outcome.success,
                "blocked": outcome.blocked,
            })),
        );

        outcome
    }
}

impl Default for AttackHarness {
    fn default() -> Self {
        Self::new()
    }
}

/// CRITICAL audit entry for an attack stopped by a defense.
pub(crate) fn record_detection(
    engine: &BiometricEngine,
    details: String,
    source_ip: &str,
    target: Option<(Uuid, Option<String>)>,
) {
    let mut event = AuditEvent::new(
        AuditEventKind::AttackDetected,
        Severity::Critical,
        details,
        source_ip,
    );
    if let Some((identity_id, username)) = target {
        event = event.with_identity(identity_id);
        if let Some(username) = username {
            event = event.with_username(username);
        }
    }
    engine.audit().record(event);
}
