use anyhow::Result;
use gts_portfolio::State;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::{RunStore, StateStore};

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ExecutionResult {
    pub run_id: String,
    pub approved: bool,
    pub state: Option<State>,
    pub message: String,
}

impl ExecutionResult {
    fn refused(run_id: &str, message: &str) -> Self {
        Self {
            run_id: run_id.to_string(),
            approved: false,
            state: None,
            message: message.to_string(),
        }
    }
}

/// Promote an approved run's final state to the current state.
///
/// Idempotent: if the current state already equals the run's final state
/// nothing is written. Store IO failures propagate as `Err`; unknown or
/// rejected runs are reported in the result.
pub fn execute_run(
    run_store: &RunStore,
    state_store: &StateStore,
    run_id: &str,
) -> Result<ExecutionResult> {
    let Some(run) = run_store.get_run(run_id)? else {
        return Ok(ExecutionResult::refused(run_id, "Run not found."));
    };
    if !run.approved {
        return Ok(ExecutionResult::refused(run_id, "Run is rejected."));
    }
    let Some(final_state) = run.trajectory.last().cloned() else {
        return Ok(ExecutionResult::refused(run_id, "Run is rejected."));
    };

    if let Some(current) = state_store.get_current_state()? {
        if current == final_state {
            return Ok(ExecutionResult {
                run_id: run_id.to_string(),
                approved: true,
                state: Some(current),
                message: "Run already executed.".to_string(),
            });
        }
    }

    state_store.update_state(&final_state)?;
    info!(
        run_id,
        cash = final_state.cash_balance,
        positions = final_state.positions.len(),
        "state promoted"
    );
    Ok(ExecutionResult {
        run_id: run_id.to_string(),
        approved: true,
        state: Some(final_state),
        message: "Run executed successfully.".to_string(),
    })
}
