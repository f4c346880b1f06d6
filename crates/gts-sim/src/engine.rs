use gts_portfolio::{apply_action, compute_state_delta, Action, State};
use gts_risk::verify_transition;
use tracing::{debug, info};
use uuid::Uuid;

use crate::explain::explain_transition;
use crate::market::PriceSource;
use crate::types::{Provenance, SimError, SimulationResult, StepResult};

/// Drive `plan` through VERIFY -> APPLY -> DELTA -> EXPLAIN, one action per
/// step against `market_path.price_context(step)`.
///
/// Per step:
/// 1. Fetch the price context (out of range => `SimError`)
/// 2. Re-price the action from it (missing symbol => `SimError`)
/// 3. Verify against the last trajectory state
/// 4. Accepted: apply and push the next state. Rejected: next = prior
/// 5. Record delta + explanation as a StepResult regardless of outcome
/// 6. Stop after the first rejection
///
/// A fresh run id is generated once per call.
pub fn simulate_plan<P>(
    initial_state: &State,
    plan: &[Action],
    market_path: &P,
    provenance: Provenance,
) -> Result<SimulationResult, SimError>
where
    P: PriceSource + ?Sized,
{
    let run_id = Uuid::new_v4().to_string();

    let mut trajectory: Vec<State> = vec![initial_state.clone()];
    let mut steps: Vec<StepResult> = Vec::with_capacity(plan.len());
    let mut rejected_step_index: Option<usize> = None;

    for (step_index, action) in plan.iter().enumerate() {
        let price_context = market_path.price_context(step_index)?;

        let price = *price_context
            .get(action.symbol())
            .ok_or_else(|| SimError::MissingPrice {
                step_index,
                symbol: action.symbol().to_string(),
            })?;
        let priced_action = action.with_price(price);

        let prior = match trajectory.last() {
            Some(s) => s.clone(),
            None => initial_state.clone(),
        };

        let verification = verify_transition(&prior, &priced_action);

        let next_state = if verification.accepted {
            apply_action(&prior, &priced_action).next_state
        } else {
            prior.clone()
        };

        let state_delta = compute_state_delta(&prior, &next_state, &price_context);
        let explanation = explain_transition(
            &prior,
            &priced_action,
            &next_state,
            &verification,
            &price_context,
        );

        debug!(
            run_id = %run_id,
            step_index,
            symbol = priced_action.symbol(),
            side = priced_action.side().as_str(),
            price,
            accepted = verification.accepted,
            codes = ?verification.codes(),
            "simulation step"
        );

        let accepted = verification.accepted;
        steps.push(StepResult {
            step_index,
            action: priced_action,
            accepted,
            errors: verification.errors,
            price_context,
            explanation,
            state_delta,
        });

        if !accepted {
            rejected_step_index = Some(step_index);
            break;
        }

        trajectory.push(next_state);
    }

    let approved = rejected_step_index.is_none();

    info!(
        run_id = %run_id,
        approved,
        rejected_step_index = ?rejected_step_index,
        steps = steps.len(),
        "simulation complete"
    );

    Ok(SimulationResult {
        run_id,
        trajectory,
        steps,
        approved,
        rejected_step_index,
        provenance,
    })
}
