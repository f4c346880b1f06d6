use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::{Budget, BudgetLimiter, BudgetState, ToolRegistry, ToolRequest, ToolResult};

/// Results (partial if halted early) plus the final counters.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ToolLoopOutcome {
    pub results: Vec<ToolResult>,
    pub budget_state: BudgetState,
    /// Set when the loop halted on a budget ceiling.
    pub limiter: Option<BudgetLimiter>,
}

impl ToolLoopOutcome {
    /// True iff every produced result is ok.
    pub fn ok(&self) -> bool {
        self.results.iter().all(|r| r.ok)
    }

    pub fn breach(&self) -> Option<BudgetLimiter> {
        self.limiter
    }

    /// Index of the result that halted the loop, if any.
    pub fn failed_index(&self) -> Option<usize> {
        self.results.iter().position(|r| !r.ok)
    }
}

/// Drive `requests` through the budget gate with fresh counters.
pub fn run_tool_loop(
    requests: &[ToolRequest],
    registry: &ToolRegistry,
    budget: &Budget,
) -> ToolLoopOutcome {
    run_tool_loop_with_state(requests, registry, budget, BudgetState::default())
}

/// Same as [`run_tool_loop`] starting from caller-owned counters, so model and
/// memory usage recorded elsewhere counts against the ceilings.
pub fn run_tool_loop_with_state(
    requests: &[ToolRequest],
    registry: &ToolRegistry,
    budget: &Budget,
    mut budget_state: BudgetState,
) -> ToolLoopOutcome {
    let mut results = Vec::with_capacity(requests.len());
    let mut limiter = None;

    for (i, request) in requests.iter().enumerate() {
        budget_state.increment_step();
        if budget_state.steps > budget.max_steps {
            limiter = Some(BudgetLimiter::MaxSteps);
        } else {
            budget_state.increment_tool_calls();
            // model/memory counters are incremented by their callers, not here
            limiter = budget_state.first_breach(budget);
        }

        if let Some(l) = limiter {
            warn!(
                request = i,
                tool = request.name.as_str(),
                limiter = l.as_str(),
                "budget exceeded"
            );
            results.push(ToolResult::failure(l.breach_message()));
            break;
        }

        let result = registry.invoke(request);
        let failed = !result.ok;
        if failed {
            warn!(
                request = i,
                tool = request.name.as_str(),
                error = result.error.as_deref().unwrap_or(""),
                "tool failed"
            );
        }
        results.push(result);
        if failed {
            break;
        }
    }

    info!(
        requests = requests.len(),
        results = results.len(),
        steps = budget_state.steps,
        tool_calls = budget_state.tool_calls,
        "tool loop complete"
    );

    ToolLoopOutcome {
        results,
        budget_state,
        limiter,
    }
}
