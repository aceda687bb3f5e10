pub mod identity;
pub mod session;
pub mod verification;

pub use identity::IdentityService;
pub use session::{Session, SessionIssuer, SessionTokens};
pub use verification::{AuthResponse, PipelineGuards, VerificationRequest, VerificationService};
