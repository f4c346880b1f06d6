use serde::{Deserialize, Serialize};

/// Closed verification error taxonomy.
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VerificationCode {
    /// Non-positive quantity or price, or empty symbol.
    InvalidAction,
    /// Buy notional exceeds cash.
    InsufficientCash,
    /// Sell quantity exceeds held quantity.
    InsufficientPosition,
    /// Projected equity is not strictly positive.
    InvalidEquity,
    /// Projected exposure / equity exceeds max_leverage.
    LeverageLimit,
    /// Projected |qty * price| for a symbol exceeds max_position_value.
    PositionValueLimit,
    /// Projected |qty * price| / equity for a symbol exceeds max_position_pct.
    PositionConcentration,
}

impl VerificationCode {
    /// Stable wire string.
    pub fn as_str(&self) -> &'static str {
        match self {
            VerificationCode::InvalidAction => "invalid_action",
            VerificationCode::InsufficientCash => "insufficient_cash",
            VerificationCode::InsufficientPosition => "insufficient_position",
            VerificationCode::InvalidEquity => "invalid_equity",
            VerificationCode::LeverageLimit => "leverage_limit",
            VerificationCode::PositionValueLimit => "position_value_limit",
            VerificationCode::PositionConcentration => "position_concentration",
        }
    }
}

impl std::fmt::Display for VerificationCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One violated check: code + human message.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct VerificationError {
    pub code: VerificationCode,
    pub message: String,
}

impl VerificationError {
    pub fn new(code: VerificationCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }
}

impl std::fmt::Display for VerificationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.code, self.message)
    }
}

impl std::error::Error for VerificationError {}

/// Verifier output. `errors` is empty iff `accepted`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct VerificationResult {
    pub accepted: bool,
    #[serde(default)]
    pub errors: Vec<VerificationError>,
}

impl VerificationResult {
    pub fn from_errors(errors: Vec<VerificationError>) -> Self {
        Self {
            accepted: errors.is_empty(),
            errors,
        }
    }

    /// True if any collected error carries `code`.
    pub fn has(&self, code: VerificationCode) -> bool {
        self.errors.iter().any(|e| e.code == code)
    }

    /// Error codes in collection order.
    pub fn codes(&self) -> Vec<VerificationCode> {
        self.errors.iter().map(|e| e.code).collect()
    }
}
