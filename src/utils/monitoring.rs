// src/utils/monitoring.rs
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;

use crate::{core::services::SessionIssuer, utils::metrics::MetricsAggregator};

/// Periodically reports matcher error rates through tracing and drops
/// expired sessions.
pub struct Monitor {
    metrics: Arc<MetricsAggregator>,
    sessions: Arc<SessionIssuer>,
    log_interval: Duration,
}

impl Monitor {
    pub fn new(
        metrics: Arc<MetricsAggregator>,
        sessions: Arc<SessionIssuer>,
        log_interval: Duration,
    ) -> Self {
        Self { metrics, sessions, log_interval }
    }

    pub fn start(self) -> JoinHandle<()> {
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(self.log_interval);
            // The first tick completes immediately.
            ticker.tick().await;
            loop {
                ticker.tick().await;
                self.tick().await;
            }
        })
    }

    pub async fn tick(&self) {
        self.sessions.purge_expired().await;
        self.log_metrics();
    }

    pub fn log_metrics(&self) {
        let snapshot = self.metrics.snapshot();
        tracing::info!(
            far = %snapshot.far,
            frr = %snapshot.frr,
            threshold = snapshot.threshold,
            total_attempts = snapshot.total_attempts,
            false_accepts = snapshot.false_accepts,
            false_rejects = snapshot.false_rejects,
            "Biometric metrics"
        );
    }
}
