//! gts-sim
//!
//! Gated step-transition engine.
//!
//! Pipeline per plan step: PRICE CONTEXT -> VERIFY -> APPLY -> DELTA -> EXPLAIN
//!
//! - One action per step, one price-context index per step, strictly in order
//! - Halts at the first rejected step; the rejected step is still recorded
//! - Missing prices and out-of-range steps are fatal errors, not rejections
//! - Deterministic given identical inputs (the run id is the only fresh value)

mod engine;
pub mod explain;
pub mod market;
pub mod types;

pub use engine::simulate_plan;
pub use explain::explain_transition;
pub use market::{MarketPath, MarketPathError, PriceSource};
pub use types::{Provenance, SimError, SimulationResult, StepResult};
