use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;
use config::{Config as ConfigLib, ConfigBuilder, ConfigError, Environment, File, builder::DefaultState};
use crate::utils::error::{Result, NodeError};

const ENV_PREFIX: &str = "BIOSENTINEL";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    pub engine: EngineConfig,
    pub rate_limit: RateLimitConfig,
    pub matching: MatchingConfig,
    pub session: SessionConfig,
    pub audit: AuditConfig,
    pub attacks: AttackConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineConfig {
    pub processing_latency_ms: u64,
    pub enrollment_latency_ms: u64,
    pub registration_latency_ms: u64,
    pub attack_latency_ms: u64,
    pub embedding_size: usize,
    pub default_client_ip: String,
    pub metrics_log_interval_secs: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RateLimitConfig {
    pub window_secs: u64,
    pub max_attempts: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MatchingConfig {
    pub threshold: f64,
    pub liveness_floor: f64,
    pub enrollment_floor: f64,
    pub unsafe_threshold: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionConfig {
    pub access_ttl_secs: u64,
    pub refresh_ttl_secs: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditConfig {
    pub capacity: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AttackConfig {
    pub replay_window_secs: u64,
    pub tamper_revert_secs: u64,
    pub brute_force_attempts: usize,
    pub brute_force_threshold: f64,
    pub manipulated_threshold: f64,
    pub attacker_ip: String,
    pub hijacker_ip: String,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            processing_latency_ms: 600,
            enrollment_latency_ms: 800,
            registration_latency_ms: 600,
            attack_latency_ms: 1200,
            embedding_size: 128,
            default_client_ip: "192.168.1.10".to_string(),
            metrics_log_interval_secs: 30,
        }
    }
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            window_secs: 60,
            max_attempts: 5,
        }
    }
}

impl Default for MatchingConfig {
    fn default() -> Self {
        Self {
            threshold: 0.94,
            liveness_floor: 0.02,
            enrollment_floor: 0.05,
            unsafe_threshold: 0.5,
        }
    }
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            access_ttl_secs: 15 * 60,
            refresh_ttl_secs: 7 * 24 * 3600,
        }
    }
}

impl Default for AuditConfig {
    fn default() -> Self {
        Self { capacity: 100 }
    }
}

impl Default for AttackConfig {
    fn default() -> Self {
        Self {
            replay_window_secs: 5,
            tamper_revert_secs: 5,
            brute_force_attempts: 20,
            brute_force_threshold: 0.98,
            manipulated_threshold: 0.1,
            attacker_ip: "10.0.66.6".to_string(),
            hijacker_ip: "203.0.113.55".to_string(),
        }
    }
}

impl Config {
    /// Loads compiled defaults, then `config/biosentinel.*` if present, then
    /// `BIOSENTINEL_*` environment variables (e.g. `BIOSENTINEL_MATCHING__THRESHOLD`).
    pub fn load() -> Result<Self> {
        let config = Self::builder()?
            .add_source(File::with_name("config/biosentinel").required(false))
            .add_source(Self::environment())
            .build()?;

        Self::finish(config)
    }

    /// Like [`Config::load`] but reads an explicit file, which must exist.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref().to_str()
            .ok_or_else(|| NodeError::Config("config path is not valid UTF-8".into()))?;

        let config = Self::builder()?
            .add_source(File::with_name(path))
            .add_source(Self::environment())
            .build()?;

        Self::finish(config)
    }

    fn builder() -> Result<ConfigBuilder<DefaultState>> {
        let d = Self::default();
        let builder = ConfigLib::builder()
            .set_default("engine.processing_latency_ms", d.engine.processing_latency_ms as i64)?
            .set_default("engine.enrollment_latency_ms", d.engine.enrollment_latency_ms as i64)?
            .set_default("engine.registration_latency_ms", d.engine.registration_latency_ms as i64)?
            .set_default("engine.attack_latency_ms", d.engine.attack_latency_ms as i64)?
            .set_default("engine.embedding_size", d.engine.embedding_size as i64)?
            .set_default("engine.default_client_ip", d.engine.default_client_ip)?
            .set_default("engine.metrics_log_interval_secs", d.engine.metrics_log_interval_secs as i64)?
            .set_default("rate_limit.window_secs", d.rate_limit.window_secs as i64)?
            .set_default("rate_limit.max_attempts", d.rate_limit.max_attempts as i64)?
            .set_default("matching.threshold", d.matching.threshold)?
            .set_default("matching.liveness_floor", d.matching.liveness_floor)?
            .set_default("matching.enrollment_floor", d.matching.enrollment_floor)?
            .set_default("matching.unsafe_threshold", d.matching.unsafe_threshold)?
            .set_default("session.access_ttl_secs", d.session.access_ttl_secs as i64)?
            .set_default("session.refresh_ttl_secs", d.session.refresh_ttl_secs as i64)?
            .set_default("audit.capacity", d.audit.capacity as i64)?
            .set_default("attacks.replay_window_secs", d.attacks.replay_window_secs as i64)?
            .set_default("attacks.tamper_revert_secs", d.attacks.tamper_revert_secs as i64)?
            .set_default("attacks.brute_force_attempts", d.attacks.brute_force_attempts as i64)?
            .set_default("attacks.brute_force_threshold", d.attacks.brute_force_threshold)?
            .set_default("attacks.manipulated_threshold", d.attacks.manipulated_threshold)?
            .set_default("attacks.attacker_ip", d.attacks.attacker_ip)?
            .set_default("attacks.hijacker_ip", d.attacks.hijacker_ip)?;

        Ok(builder)
    }

    fn environment() -> Environment {
        Environment::with_prefix(ENV_PREFIX)
            .prefix_separator("_")
            .separator("__")
            .try_parsing(true)
    }

    fn finish(config: ConfigLib) -> Result<Self> {
        let config: Self = config.try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.rate_limit.window_secs == 0 {
            return Err(NodeError::Config("rate_limit.window_secs must be greater than 0".into()));
        }
        if self.rate_limit.max_attempts == 0 {
            return Err(NodeError::Config("rate_limit.max_attempts must be greater than 0".into()));
        }

        let unit_range = [
            ("matching.threshold", self.matching.threshold),
            ("matching.liveness_floor", self.matching.liveness_floor),
            ("matching.enrollment_floor", self.matching.enrollment_floor),
            ("matching.unsafe_threshold", self.matching.unsafe_threshold),
            ("attacks.brute_force_threshold", self.attacks.brute_force_threshold),
            ("attacks.manipulated_threshold", self.attacks.manipulated_threshold),
        ];
        for (key, value) in unit_range {
            if !(0.0..=1.0).contains(&value) {
                return Err(NodeError::Config(format!("{} must lie in [0, 1], got {}", key, value)));
            }
        }

        if self.matching.liveness_floor > self.matching.enrollment_floor {
            return Err(NodeError::Config(
                "matching.liveness_floor must not exceed matching.enrollment_floor".into(),
            ));
        }
        if self.audit.capacity == 0 {
            return Err(NodeError::Config("audit.capacity must be greater than 0".into()));
        }
        if self.engine.embedding_size == 0 {
            return Err(NodeError::Config("engine.embedding_size must be greater than 0".into()));
        }
        if self.engine.metrics_log_interval_secs == 0 {
            return Err(NodeError::Config("engine.metrics_log_interval_secs must be greater than 0".into()));
        }

        Ok(())
    }

    /// Same configuration with every simulated delay removed.
    pub fn without_latency(mut self) -> Self {
        self.engine.processing_latency_ms = 0;
        self.engine.enrollment_latency_ms = 0;
        self.engine.registration_latency_ms = 0;
        self.engine.attack_latency_ms = 0;
        self
    }

    pub fn get_rate_limit_window(&self) -> Duration {
        Duration::from_secs(self.rate_limit.window_secs)
    }

    pub fn get_access_ttl(&self) -> Duration {
        Duration::from_secs(self.session.access_ttl_secs)
    }

    pub fn get_refresh_ttl(&self) -> Duration {
        Duration::from_secs(self.session.refresh_ttl_secs)
    }

    pub fn get_replay_window(&self) -> Duration {
        Duration::from_secs(self.attacks.replay_window_secs)
    }

    pub fn get_tamper_revert_delay(&self) -> Duration {
        Duration::from_secs(self.attacks.tamper_revert_secs)
    }

    pub fn get_metrics_log_interval(&self) -> Duration {
        Duration::from_secs(self.engine.metrics_log_interval_secs)
    }
}

impl From<ConfigError> for NodeError {
    fn from(error: ConfigError) -> Self {
        NodeError::Config(error.to_string())
    }
}
