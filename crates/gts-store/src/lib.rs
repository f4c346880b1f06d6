//! gts-store
//!
//! JSON-file persistence for the current state, simulation runs and risk
//! policies, plus promotion of an approved run into the current state.
//!
//! Layout under a data dir:
//! - `state.json`     current State
//! - `runs.json`      run_id -> SimulationResult
//! - `policies.json`  policy_id -> Policy

mod execute;
mod stores;

pub use execute::{execute_run, ExecutionResult};
pub use stores::{PolicyStore, RunStore, StateStore, Stores};
