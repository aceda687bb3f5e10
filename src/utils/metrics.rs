// src/utils/metrics.rs
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use parking_lot::RwLock;
use serde::Serialize;

use crate::core::audit::{AuditEvent, AuditEventKind, AuditLog, Severity};
use crate::utils::error::{NodeError, Result};

pub const ADMIN_CONSOLE: &str = "ADMIN_CONSOLE";
pub const ADMIN_ACTOR: &str = "admin_console";

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BiometricMetrics {
    pub far: String,
    pub frr: String,
    pub threshold: f64,
    pub total_attempts: u64,
    pub true_accepts: u64,
    pub false_accepts: u64,
    pub true_rejects: u64,
    pub false_rejects: u64,
}

/// Confusion-matrix counters for completed matching attempts.
pub struct MetricsAggregator {
    true_accepts: AtomicU64,
    false_accepts: AtomicU64,
    true_rejects: AtomicU64,
    false_rejects: AtomicU64,
    threshold: RwLock<f64>,
    unsafe_threshold: f64,
    audit: Arc<AuditLog>,
}

impl MetricsAggregator {
    pub fn new(threshold: f64, unsafe_threshold: f64, audit: Arc<AuditLog>) -> Self {
        Self {
            true_accepts: AtomicU64::new(0),
            false_accepts: AtomicU64::new(0),
            true_rejects: AtomicU64::new(0),
            false_rejects: AtomicU64::new(0),
            threshold: RwLock::new(threshold),
            unsafe_threshold,
            audit,
        }
    }

    /// `simulated_attack` marks the attempt as an impostor attempt.
    pub fn record_attempt(&self, matched: bool, simulated_attack: bool) {
        let counter = match (matched, simulated_attack) {
            (true, false) => &self.true_accepts,
            (true, true) => &self.false_accepts,
            (false, true) => &self.true_rejects,
            (false, false) => &self.false_rejects,
        };
        counter.fetch_add(1, Ordering::SeqCst);
    }

    pub fn threshold(&self) -> f64 {
        *self.threshold.read()
    }

    /// Applies a new global matching threshold.
    ///
    /// Values below the unsafe floor raise a CRITICAL alert but are still
    /// applied. Non-finite values and values outside [0, 1] are refused.
    pub fn set_threshold(&self, value: f64) -> Result<()> {
        if !value.is_finite() || !(0.0..=1.0).contains(&value) {
            return Err(NodeError::Config(format!("threshold {} outside [0, 1]", value)));
        }

        if value < self.unsafe_threshold {
            self.audit.record(
                AuditEvent::new(
                    AuditEventKind::SystemAlert,
                    Severity::Critical,
                    format!("Unsafe configuration attempt detected. Threshold {} is too low.", value),
                    ADMIN_CONSOLE,
                )
                .with_username(ADMIN_ACTOR),
            );
        }

        let previous = {
            let mut threshold = self.threshold.write();
            std::mem::replace(&mut *threshold, value)
        };

        self.audit.record(
            AuditEvent::new(
                AuditEventKind::ConfigChange,
                Severity::Warning,
                format!("Biometric Matching Threshold adjusted to {:.1}%", value * 100.0),
                ADMIN_CONSOLE,
            )
            .with_username(ADMIN_ACTOR)
            .with_metadata(serde_json::json!({ "previous": previous, "threshold": value })),
        );

        Ok(())
    }

    pub fn snapshot(&self) -> BiometricMetrics {
        let true_accepts = self.true_accepts.load(Ordering::SeqCst);
        let false_accepts = self.false_accepts.load(Ordering::SeqCst);
        let true_rejects = self.true_rejects.load(Ordering::SeqCst);
        let false_rejects = self.false_rejects.load(Ordering::SeqCst);

        let genuine_attempts = true_accepts + false_rejects;
        let impostor_attempts = true_rejects + false_accepts;

        BiometricMetrics {
            far: percentage(false_accepts, impostor_attempts),
            frr: percentage(false_rejects, genuine_attempts),
            threshold: self.threshold(),
            total_attempts: genuine_attempts + impostor_attempts,
            true_accepts,
            false_accepts,
            true_rejects,
            false_rejects,
        }
    }
}

fn percentage(numerator: u64, denominator: u64) -> String {
    if denominator == 0 {
        return "0.00".to_string();
    }
    format!("{:.2}", numerator as f64 / denominator as f64 * 100.0)
}
