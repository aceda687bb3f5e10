// src/utils/error.rs
use serde::Serialize;
use thiserror::Error;

/// Outcomes of a verification attempt that did not grant access.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AuthError {
    #[error("rejected: rate limited")]
    RateLimited,

    #[error("rejected: identity not found or not enrolled")]
    NotEnrolled,

    #[error("rejected: liveness check failed")]
    LivenessFailed,

    #[error("fatal: template integrity violation")]
    IntegrityViolation,

    #[error("rejected: biometric mismatch")]
    NoMatch,
}

impl AuthError {
    /// Integrity violations signal storage compromise rather than a failed login.
    pub fn is_fatal(&self) -> bool {
        matches!(self, AuthError::IntegrityViolation)
    }
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum IdentityError {
    #[error("Username '{0}' is already taken.")]
    DuplicateUsername(String),

    #[error("Biometric Quality Low: Image too uniform (spread {spread:.4}, floor {floor:.4}).")]
    LowBiometricQuality { spread: f64, floor: f64 },

    #[error("Identity not found: {0}")]
    IdentityNotFound(String),

    #[error("Invalid username: '{0}'")]
    InvalidUsername(String),

    #[error("Invalid embedding: {0}")]
    InvalidEmbedding(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SessionError {
    #[error("Unknown access token")]
    UnknownToken,

    #[error("Access token expired")]
    Expired,

    #[error("Token Invalid: IP Mismatch (bound to {bound}, used by {used})")]
    IpMismatch { bound: String, used: String },
}

#[derive(Debug, Error)]
pub enum NodeError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Identity error: {0}")]
    Identity(#[from] IdentityError),

    #[error("Session error: {0}")]
    Session(#[from] SessionError),

    #[error("Crypto error: {0}")]
    Crypto(String),

    #[error("Scenario error: {0}")]
    Scenario(String),
}

pub type Result<T> = std::result::Result<T, NodeError>;
