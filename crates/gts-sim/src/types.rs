use std::collections::BTreeMap;

use gts_portfolio::{Action, PriceContext, State, StateDelta};
use gts_risk::VerificationError;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::market::MarketPathError;

/// One attempted plan step.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct StepResult {
    pub step_index: usize,
    /// Action re-priced from this step's price context.
    pub action: Action,
    pub accepted: bool,
    #[serde(default)]
    pub errors: Vec<VerificationError>,
    pub price_context: PriceContext,
    pub explanation: String,
    pub state_delta: StateDelta,
}

/// Policy and planner provenance copied into a SimulationResult.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Provenance {
    pub policy_id: Option<String>,
    pub policy_version: Option<String>,
    pub policy_hash: Option<String>,
    pub planner_name: Option<String>,
    pub planner_metadata: Option<BTreeMap<String, Value>>,
}

/// Full outcome of one simulation run.
///
/// Invariants:
/// - `trajectory.len() == accepted steps + 1`
/// - `steps` ends at the first rejection, if any
/// - `approved == rejected_step_index.is_none()`
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SimulationResult {
    pub run_id: String,
    pub trajectory: Vec<State>,
    pub steps: Vec<StepResult>,
    pub approved: bool,
    pub rejected_step_index: Option<usize>,
    #[serde(flatten)]
    pub provenance: Provenance,
}

impl SimulationResult {
    /// Last state of the trajectory (the initial state if nothing was accepted).
    pub fn final_state(&self) -> Option<&State> {
        self.trajectory.last()
    }

    /// The rejected step, if the run halted on one.
    pub fn rejected_step(&self) -> Option<&StepResult> {
        self.rejected_step_index
            .and_then(|i| self.steps.iter().find(|s| s.step_index == i))
    }
}

/// Fatal simulation preconditions. These propagate to the caller and are
/// never recorded as a StepResult.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SimError {
    /// The plan is longer than the market path.
    PriceContextOutOfRange { step_index: usize, len: usize },
    /// The step's price context has no price for the action's symbol.
    MissingPrice { step_index: usize, symbol: String },
    /// Any other market path failure.
    Market(MarketPathError),
}

impl From<MarketPathError> for SimError {
    fn from(e: MarketPathError) -> Self {
        match e {
            MarketPathError::OutOfRange { step_index, len } => {
                SimError::PriceContextOutOfRange { step_index, len }
            }
            other => SimError::Market(other),
        }
    }
}

impl std::fmt::Display for SimError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SimError::PriceContextOutOfRange { step_index, len } => write!(
                f,
                "price context out of range: step {} (path length {})",
                step_index, len
            ),
            SimError::MissingPrice { step_index, symbol } => {
                write!(f, "no price for '{}' at step {}", symbol, step_index)
            }
            SimError::Market(e) => write!(f, "market path: {}", e),
        }
    }
}

impl std::error::Error for SimError {}
