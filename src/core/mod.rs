pub mod attacks;
pub mod audit;
pub mod crypto;
pub mod identity;
pub mod security;
pub mod services;
