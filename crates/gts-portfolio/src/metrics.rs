use crate::types::Action;
use crate::{Positions, PriceContext};

/// Gross exposure: Σ |qty * price|. Symbols without a price contribute zero.
pub fn gross_exposure(positions: &Positions, prices: &PriceContext) -> f64 {
    // deterministic iteration (BTreeMap)
    positions
        .iter()
        .map(|(sym, qty)| (qty * prices.get(sym).copied().unwrap_or(0.0)).abs())
        .sum()
}

/// Equity: cash + Σ qty * price. Symbols without a price contribute zero.
pub fn equity(cash_balance: f64, positions: &Positions, prices: &PriceContext) -> f64 {
    cash_balance
        + positions
            .iter()
            .map(|(sym, qty)| qty * prices.get(sym).copied().unwrap_or(0.0))
            .sum::<f64>()
}

/// Positions as they would be after `action`, without touching any state.
///
/// Shared by the transition applier and the verifier so that verification
/// never depends on the applier's output.
pub fn project_positions(positions: &Positions, action: &Action) -> Positions {
    let mut projected = positions.clone();
    let held = projected.get(action.symbol()).copied().unwrap_or(0.0);
    let next = match action {
        Action::PlaceBuy { quantity, .. } => held + quantity,
        Action::PlaceSell { quantity, .. } => held - quantity,
    };
    projected.insert(action.symbol().to_string(), next);
    projected
}

/// Price context containing only the acted-on symbol at the action's price.
///
/// Known approximation: exposure and equity computed under this context only
/// mark the acted-on symbol. Other held symbols contribute zero, so gross
/// exposure is undercounted when several symbols are held at once.
pub fn single_symbol_prices(action: &Action) -> PriceContext {
    let mut m = PriceContext::new();
    m.insert(action.symbol().to_string(), action.price());
    m
}
