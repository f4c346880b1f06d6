use serde::{Deserialize, Serialize};

use crate::metrics::equity;
use crate::{Positions, PriceContext};

/// BUY or SELL direction of an action.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Side {
    Buy,
    Sell,
}

impl Side {
    pub fn as_str(&self) -> &'static str {
        match self {
            Side::Buy => "BUY",
            Side::Sell => "SELL",
        }
    }
}

/// Risk configuration attached to every State.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RiskLimits {
    /// Exposure / equity ceiling.
    pub max_leverage: f64,
    /// Per-symbol concentration ceiling as a fraction of equity.
    pub max_position_pct: f64,
    /// Absolute per-symbol value ceiling.
    pub max_position_value: f64,
}

impl RiskLimits {
    pub fn new(max_leverage: f64, max_position_pct: f64, max_position_value: f64) -> Self {
        Self {
            max_leverage,
            max_position_pct,
            max_position_value,
        }
    }
}

impl Default for RiskLimits {
    fn default() -> Self {
        Self {
            max_leverage: 1.0,
            max_position_pct: 0.5,
            max_position_value: 100_000.0,
        }
    }
}

/// Immutable portfolio snapshot.
///
/// `exposure` is the gross notional under the price context that produced this
/// state. It is recomputed on every transition and never patched in place.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct State {
    pub cash_balance: f64,
    #[serde(default)]
    pub positions: Positions,
    #[serde(default)]
    pub exposure: f64,
    #[serde(default)]
    pub risk_limits: RiskLimits,
}

impl State {
    /// Flat state: cash only, no positions, zero exposure.
    pub fn new(cash_balance: f64, risk_limits: RiskLimits) -> Self {
        Self {
            cash_balance,
            positions: Positions::new(),
            exposure: 0.0,
            risk_limits,
        }
    }

    /// Cash plus mark-to-market of held positions. Symbols missing from
    /// `prices` contribute zero.
    pub fn equity(&self, prices: &PriceContext) -> f64 {
        equity(self.cash_balance, &self.positions, prices)
    }

    /// Signed quantity held for `symbol` (0 when absent).
    pub fn position(&self, symbol: &str) -> f64 {
        self.positions.get(symbol).copied().unwrap_or(0.0)
    }
}

/// Proposed order. The price is supplied by the step's price context at
/// simulation time; any caller-supplied price is overwritten.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Action {
    PlaceBuy {
        symbol: String,
        quantity: f64,
        #[serde(default)]
        price: f64,
    },
    PlaceSell {
        symbol: String,
        quantity: f64,
        #[serde(default)]
        price: f64,
    },
}

impl Action {
    pub fn buy(symbol: impl Into<String>, quantity: f64, price: f64) -> Self {
        Action::PlaceBuy {
            symbol: symbol.into(),
            quantity,
            price,
        }
    }

    pub fn sell(symbol: impl Into<String>, quantity: f64, price: f64) -> Self {
        Action::PlaceSell {
            symbol: symbol.into(),
            quantity,
            price,
        }
    }

    pub fn side(&self) -> Side {
        match self {
            Action::PlaceBuy { .. } => Side::Buy,
            Action::PlaceSell { .. } => Side::Sell,
        }
    }

    pub fn symbol(&self) -> &str {
        match self {
            Action::PlaceBuy { symbol, .. } | Action::PlaceSell { symbol, .. } => symbol,
        }
    }

    pub fn quantity(&self) -> f64 {
        match self {
            Action::PlaceBuy { quantity, .. } | Action::PlaceSell { quantity, .. } => *quantity,
        }
    }

    pub fn price(&self) -> f64 {
        match self {
            Action::PlaceBuy { price, .. } | Action::PlaceSell { price, .. } => *price,
        }
    }

    /// Variant name as used on the wire ("PlaceBuy" / "PlaceSell").
    pub fn kind(&self) -> &'static str {
        match self {
            Action::PlaceBuy { .. } => "PlaceBuy",
            Action::PlaceSell { .. } => "PlaceSell",
        }
    }

    /// quantity * price.
    pub fn notional(&self) -> f64 {
        self.quantity() * self.price()
    }

    /// Same action re-priced.
    pub fn with_price(&self, price: f64) -> Self {
        match self {
            Action::PlaceBuy {
                symbol, quantity, ..
            } => Action::buy(symbol.clone(), *quantity, price),
            Action::PlaceSell {
                symbol, quantity, ..
            } => Action::sell(symbol.clone(), *quantity, price),
        }
    }
}
