//! gts-portfolio
//!
//! Portfolio state model for the gated step simulator:
//! - immutable `State` snapshots with attached `RiskLimits`
//! - `Action` (PlaceBuy / PlaceSell) as a closed tagged enum
//! - transition applier (State + Action -> next State)
//! - state delta computation under a price context
//!
//! Pure deterministic logic. No IO, no time, no randomness.

mod deltas;
mod metrics;
mod transitions;
mod types;

pub use deltas::{compute_state_delta, StateDelta, ValueDelta};
pub use metrics::{equity, gross_exposure, project_positions, single_symbol_prices};
pub use transitions::{apply_action, TransitionResult};
pub use types::{Action, RiskLimits, Side, State};

use std::collections::BTreeMap;

/// Canonical price context type (symbol -> price) for one simulation step.
pub type PriceContext = BTreeMap<String, f64>;

/// Canonical position map type (symbol -> signed quantity).
pub type Positions = BTreeMap<String, f64>;

/// Helper to build a PriceContext with minimal boilerplate.
pub fn prices<I, S>(items: I) -> PriceContext
where
    I: IntoIterator<Item = (S, f64)>,
    S: Into<String>,
{
    let mut m = PriceContext::new();
    for (sym, px) in items {
        m.insert(sym.into(), px);
    }
    m
}
