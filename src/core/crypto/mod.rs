//! Template hashing, integrity verification and sealing

pub mod cipher;
pub mod hasher;
pub mod integrity;

// Re-export commonly used types
pub use cipher::TemplateCipher;
pub use hasher::{RollingHasher, Sha3Hasher, TemplateHasher};
pub use integrity::IntegrityVerifier;
