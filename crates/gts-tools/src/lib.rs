//! gts-tools
//!
//! Budgeted tool-invocation loop: the same attempt/gate/commit-or-stop shape
//! as the simulator, applied to tool calls.
//!
//! Goals:
//! - Requests processed strictly in input order
//! - First budget breach or failed tool halts the loop
//! - Budget counters owned by one loop execution
//! - Memory operations metered against the same Budget

pub mod builtin;
pub mod memory;
mod registry;
mod runtime;
mod types;

pub use registry::{ToolFn, ToolRegistry};
pub use runtime::{run_tool_loop, run_tool_loop_with_state, ToolLoopOutcome};
pub use types::*;
