use serde::{Deserialize, Serialize};

use crate::metrics::{gross_exposure, project_positions, single_symbol_prices};
use crate::types::{Action, State};
use crate::PriceContext;

/// Outcome of applying one action to one state.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TransitionResult {
    pub prior: State,
    pub action: Action,
    pub next_state: State,
    pub prices: PriceContext,
}

/// Deterministically compute the next state.
///
/// Never rejects: acceptance is the verifier's job. Sells may drive a
/// position negative here.
///
/// Exposure is recomputed under the single-symbol price context of the action
/// (see `single_symbol_prices`), so other held symbols are not re-marked.
pub fn apply_action(state: &State, action: &Action) -> TransitionResult {
    let prices = single_symbol_prices(action);
    let positions = project_positions(&state.positions, action);

    let cash_balance = match action {
        Action::PlaceBuy { .. } => state.cash_balance - action.notional(),
        Action::PlaceSell { .. } => state.cash_balance + action.notional(),
    };

    let next_state = State {
        cash_balance,
        exposure: gross_exposure(&positions, &prices),
        positions,
        risk_limits: state.risk_limits.clone(),
    };

    TransitionResult {
        prior: state.clone(),
        action: action.clone(),
        next_state,
        prices,
    }
}
