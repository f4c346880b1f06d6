use gts_portfolio::{gross_exposure, project_positions, single_symbol_prices, Action, State};

use crate::{VerificationCode, VerificationError, VerificationResult};

fn is_positive(x: f64) -> bool {
    x.is_finite() && x > 0.0
}

/// Evaluate `action` against `state` and its attached risk limits.
///
/// Checks, in collection order:
/// 1. invalid_action (quantity / price not strictly positive, empty symbol)
/// 2. insufficient_cash (buy) / insufficient_position (sell)
/// 3. invalid_equity when projected equity <= 0; leverage and per-symbol
///    checks are skipped in that case since they divide by equity
/// 4. leverage_limit
/// 5. per projected symbol: position_value_limit, position_concentration
///
/// Prices come from the action alone, so only the acted-on symbol is marked.
/// Projected equity is the pre-trade equity under that price: a trade at the
/// marked price moves value between cash and position without changing it.
pub fn verify_transition(state: &State, action: &Action) -> VerificationResult {
    let mut errors: Vec<VerificationError> = Vec::new();

    if !is_positive(action.quantity()) || !is_positive(action.price()) {
        errors.push(VerificationError::new(
            VerificationCode::InvalidAction,
            "Quantity and price must be positive.",
        ));
    }

    if action.symbol().is_empty() {
        errors.push(VerificationError::new(VerificationCode::InvalidAction, "Symbol is required."));
    }

    let prices = single_symbol_prices(action);
    let projected_equity = state.equity(&prices);

    match action {
        Action::PlaceBuy { .. } => {
            if action.notional() > state.cash_balance {
                errors.push(VerificationError::new(
                    VerificationCode::InsufficientCash,
                    "Cash balance is insufficient.",
                ));
            }
        }
        Action::PlaceSell { quantity, .. } => {
            if *quantity > state.position(action.symbol()) {
                errors.push(VerificationError::new(
                    VerificationCode::InsufficientPosition,
                    "Cannot sell more than current position.",
                ));
            }
        }
    }

    let projected_positions = project_positions(&state.positions, action);
    let projected_exposure = gross_exposure(&projected_positions, &prices);

    if projected_equity.is_nan() || projected_equity <= 0.0 {
        errors.push(VerificationError::new(
            VerificationCode::InvalidEquity,
            "Equity must remain positive.",
        ));
        return VerificationResult::from_errors(errors);
    }

    let limits = &state.risk_limits;

    let leverage = projected_exposure / projected_equity;
    if leverage > limits.max_leverage {
        errors.push(VerificationError::new(
            VerificationCode::LeverageLimit,
            "Projected leverage exceeds limit.",
        ));
    }

    // deterministic iteration (BTreeMap)
    for (symbol, qty) in &projected_positions {
        let position_value = (qty * prices.get(symbol).copied().unwrap_or(0.0)).abs();
        if position_value > limits.max_position_value {
            errors.push(VerificationError::new(
                VerificationCode::PositionValueLimit,
                format!("Position value for {symbol} exceeds limit."),
            ));
        }
        if position_value / projected_equity > limits.max_position_pct {
            errors.push(VerificationError::new(
                VerificationCode::PositionConcentration,
                format!("Position concentration for {symbol} exceeds limit."),
            ));
        }
    }

    VerificationResult::from_errors(errors)
}
