//! Market path: per-step price contexts.
//!
//! JSON fixture format
//!
//! ```json
//! { "symbols": ["AAPL", "MSFT"],
//!   "steps": [ {"AAPL": 100.0, "MSFT": 198.0}, {"AAPL": 101.0, "MSFT": 199.0} ] }
//! ```

use std::fs;
use std::path::Path;

use gts_portfolio::PriceContext;
use serde::{Deserialize, Serialize};

/// Errors from price-context access and fixture loading.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MarketPathError {
    OutOfRange { step_index: usize, len: usize },
    Parse(String),
    Io(String),
}

impl From<std::io::Error> for MarketPathError {
    fn from(e: std::io::Error) -> Self {
        MarketPathError::Io(e.to_string())
    }
}

impl std::fmt::Display for MarketPathError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MarketPathError::OutOfRange { step_index, len } => {
                write!(f, "step index {step_index} out of range (length {len})")
            }
            MarketPathError::Parse(e) => write!(f, "invalid market path: {}", e),
            MarketPathError::Io(e) => write!(f, "io error: {}", e),
        }
    }
}

impl std::error::Error for MarketPathError {}

/// Collaborator that supplies one price context per simulation step.
pub trait PriceSource {
    /// Prices for `step_index`; fails when outside `[0, len)`.
    fn price_context(&self, step_index: usize) -> Result<PriceContext, MarketPathError>;

    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// In-memory market path loaded from a fixture.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct MarketPath {
    #[serde(default)]
    pub symbols: Vec<String>,
    pub steps: Vec<PriceContext>,
}

impl MarketPath {
    pub fn new(symbols: Vec<String>, steps: Vec<PriceContext>) -> Self {
        Self { symbols, steps }
    }

    /// Parse fixture JSON (pure).
    pub fn from_json_str(raw: &str) -> Result<Self, MarketPathError> {
        serde_json::from_str(raw).map_err(|e| MarketPathError::Parse(e.to_string()))
    }

    /// Load a fixture from disk.
    pub fn from_fixture(path: impl AsRef<Path>) -> Result<Self, MarketPathError> {
        let raw = fs::read_to_string(path)?;
        Self::from_json_str(&raw)
    }
}

impl PriceSource for MarketPath {
    fn price_context(&self, step_index: usize) -> Result<PriceContext, MarketPathError> {
        self.steps
            .get(step_index)
            .cloned()
            .ok_or(MarketPathError::OutOfRange {
                step_index,
                len: self.steps.len(),
            })
    }

    fn len(&self) -> usize {
        self.steps.len()
    }
}
