#[path = "../common/mod.rs"]
mod common;

mod attack_tests;
mod verification_tests;
