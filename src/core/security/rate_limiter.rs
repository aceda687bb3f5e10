// src/core/security/rate_limiter.rs
use std::collections::{HashMap, VecDeque};
use std::sync::Arc;
use std::time::Duration;
use parking_lot::Mutex;
use tokio::time::Instant;
use tracing::debug;

use crate::core::audit::{AuditEvent, AuditEventKind, AuditLog, Severity};

#[derive(Debug, Default)]
struct RateWindow {
    attempts: VecDeque<Instant>,
    blocked: bool,
}

impl RateWindow {
    fn prune(&mut self, now: Instant, window: Duration) {
        while let Some(&oldest) = self.attempts.front() {
            if now.saturating_duration_since(oldest) >= window {
                self.attempts.pop_front();
            } else {
                break;
            }
        }
    }
}

/// Sliding-window attempt counter keyed by source address.
pub struct RateLimiter {
    windows: Mutex<HashMap<String, RateWindow>>,
    window: Duration,
    max_attempts: usize,
    audit: Arc<AuditLog>,
}

impl RateLimiter {
    pub fn new(window: Duration, max_attempts: usize, audit: Arc<AuditLog>) -> Self {
        Self {
            windows: Mutex::new(HashMap::new()),
            window,
            max_attempts,
            audit,
        }
    }

    /// Records an attempt for `source` and reports whether it may proceed.
    ///
    /// Blocked attempts are not added to the window, so a source regains one
    /// attempt each time an allowed attempt ages out. Only the transition into
    /// the blocked state is audited. Sources with no attempt left in the
    /// window are dropped.
    pub fn allow(&self, source: &str) -> bool {
        let now = Instant::now();
        let newly_blocked = {
            let mut windows = self.windows.lock();
            let window = self.window;
            windows.retain(|_, entry| {
                entry.prune(now, window);
                !entry.attempts.is_empty()
            });

            let entry = windows.entry(source.to_string()).or_default();
            entry.prune(now, self.window);

            if entry.attempts.len() < self.max_attempts {
                entry.attempts.push_back(now);
                entry.blocked = false;
                return true;
            }

            let newly_blocked = !entry.blocked;
            entry.blocked = true;
            newly_blocked
        };

        if newly_blocked {
            self.audit.record(AuditEvent::new(
                AuditEventKind::RateLimitExceeded,
                Severity::Warning,
                format!("IP {} throttled. Too many authentication attempts.", source),
                source,
            ));
        } else {
            debug!(source_ip = %source, "Attempt rejected while throttled");
        }

        false
    }

    /// Attempts currently counted against `source` inside the window.
    pub fn attempts(&self, source: &str) -> usize {
        let now = Instant::now();
        let mut windows = self.windows.lock();
        match windows.get_mut(source) {
            Some(entry) => {
                entry.prune(now, self.window);
                entry.attempts.len()
            }
            None => 0,
        }
    }

    /// Number of sources currently holding a rate window.
    pub fn tracked_sources(&self) -> usize {
        self.windows.lock().len()
    }

    pub fn window(&self) -> Duration {
        self.window
    }

    pub fn max_attempts(&self) -> usize {
        self.max_attempts
    }
}
