//! Identities, their biometric templates and the store holding both

pub mod biometric;
pub mod store;
pub mod types;

pub use store::TemplateStore;
pub use types::{BiometricTemplate, Identity, Role, TemplateAlgorithm};
