//! gts-risk
//!
//! Risk-policy verifier for proposed actions.
//!
//! - Every check runs; all violations are collected into one result
//! - Projection of positions is independent of the transition applier
//! - Deterministic, pure logic. No IO, no time, no state mutation.

mod engine;
mod types;

pub use engine::verify_transition;
pub use types::*;
