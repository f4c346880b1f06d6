use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use crate::types::State;
use crate::PriceContext;

/// before / after / (after - before) triple.
#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ValueDelta {
    pub before: f64,
    pub after: f64,
    pub delta: f64,
}

impl ValueDelta {
    pub fn new(before: f64, after: f64) -> Self {
        Self {
            before,
            after,
            delta: after - before,
        }
    }
}

/// Structured change report between two states.
///
/// `positions` only lists symbols whose quantity changed.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct StateDelta {
    pub cash: ValueDelta,
    pub equity: ValueDelta,
    pub exposure: ValueDelta,
    pub positions: BTreeMap<String, ValueDelta>,
}

impl StateDelta {
    /// True when nothing moved.
    pub fn is_zero(&self) -> bool {
        self.cash.delta == 0.0
            && self.equity.delta == 0.0
            && self.exposure.delta == 0.0
            && self.positions.is_empty()
    }
}

/// Diff `prior` -> `next`. Equity on both sides is marked with `prices`, not
/// taken from the states' own exposure field.
pub fn compute_state_delta(prior: &State, next: &State, prices: &PriceContext) -> StateDelta {
    let mut symbols: BTreeSet<&String> = prior.positions.keys().collect();
    symbols.extend(next.positions.keys());

    let mut positions = BTreeMap::new();
    for sym in symbols {
        let before = prior.position(sym);
        let after = next.position(sym);
        if before != after {
            positions.insert(sym.clone(), ValueDelta::new(before, after));
        }
    }

    StateDelta {
        cash: ValueDelta::new(prior.cash_balance, next.cash_balance),
        equity: ValueDelta::new(prior.equity(prices), next.equity(prices)),
        exposure: ValueDelta::new(prior.exposure, next.exposure),
        positions,
    }
}
