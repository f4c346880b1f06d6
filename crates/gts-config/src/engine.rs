use std::path::PathBuf;

use anyhow::{bail, Result};
use gts_portfolio::{RiskLimits, State};
use gts_tools::Budget;
use serde_json::Value;

/// Typed engine settings read from a merged config document.
///
/// Every field has a default, so `{}` is a valid config.
#[derive(Clone, Debug, PartialEq)]
pub struct EngineConfig {
    pub engine_id: String,
    pub initial_cash: f64,
    pub risk_limits: RiskLimits,
    pub budget: Budget,
    /// Memory backend toggle. Never read from the process environment.
    pub memory_enabled: bool,
    pub data_dir: PathBuf,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            engine_id: "gts".to_string(),
            initial_cash: 1_000.0,
            risk_limits: RiskLimits::new(2.0, 0.8, 5_000.0),
            budget: Budget::new(5, 5),
            memory_enabled: false,
            data_dir: PathBuf::from("data"),
        }
    }
}

impl EngineConfig {
    pub fn from_config_json(v: &Value) -> Result<Self> {
        let d = Self::default();

        let initial_cash = f64_at(v, "/account/initial_cash", d.initial_cash)?;
        if initial_cash <= 0.0 {
            bail!("CONFIG_INVALID /account/initial_cash: must be > 0 (got {initial_cash})");
        }

        let risk_limits = RiskLimits::new(
            non_negative(v, "/risk/max_leverage", d.risk_limits.max_leverage)?,
            non_negative(v, "/risk/max_position_pct", d.risk_limits.max_position_pct)?,
            non_negative(
                v,
                "/risk/max_position_value",
                d.risk_limits.max_position_value,
            )?,
        );

        let budget = Budget {
            max_steps: u64_at(v, "/budget/max_steps", d.budget.max_steps)?,
            max_tool_calls: u64_at(v, "/budget/max_tool_calls", d.budget.max_tool_calls)?,
            max_model_calls: u64_at(v, "/budget/max_model_calls", d.budget.max_model_calls)?,
            max_memory_ops: u64_at(v, "/budget/max_memory_ops", d.budget.max_memory_ops)?,
            max_memory_bytes: u64_at(v, "/budget/max_memory_bytes", d.budget.max_memory_bytes)?,
        };
        if budget.max_steps < 1 {
            bail!("CONFIG_INVALID /budget/max_steps: must be >= 1");
        }

        Ok(Self {
            engine_id: str_at(v, "/engine/engine_id", &d.engine_id)?,
            initial_cash,
            risk_limits,
            budget,
            memory_enabled: bool_at(v, "/memory/enabled", d.memory_enabled)?,
            data_dir: PathBuf::from(str_at(v, "/storage/data_dir", "data")?),
        })
    }

    /// Flat starting state: configured cash, no positions.
    pub fn initial_state(&self) -> State {
        State::new(self.initial_cash, self.risk_limits.clone())
    }
}

fn present<'a>(v: &'a Value, ptr: &str) -> Option<&'a Value> {
    v.pointer(ptr).filter(|x| !x.is_null())
}

fn f64_at(v: &Value, ptr: &str, default: f64) -> Result<f64> {
    match present(v, ptr) {
        None => Ok(default),
        Some(x) => match x.as_f64() {
            Some(f) if f.is_finite() => Ok(f),
            _ => bail!("CONFIG_INVALID {ptr}: expected a finite number"),
        },
    }
}

fn non_negative(v: &Value, ptr: &str, default: f64) -> Result<f64> {
    let f = f64_at(v, ptr, default)?;
    if f < 0.0 {
        bail!("CONFIG_INVALID {ptr}: must be >= 0 (got {f})");
    }
    Ok(f)
}

fn u64_at(v: &Value, ptr: &str, default: u64) -> Result<u64> {
    match present(v, ptr) {
        None => Ok(default),
        Some(x) => match x.as_u64() {
            Some(n) => Ok(n),
            None => bail!("CONFIG_INVALID {ptr}: expected a non-negative integer"),
        },
    }
}

fn bool_at(v: &Value, ptr: &str, default: bool) -> Result<bool> {
    match present(v, ptr) {
        None => Ok(default),
        Some(x) => match x.as_bool() {
            Some(b) => Ok(b),
            None => bail!("CONFIG_INVALID {ptr}: expected a boolean"),
        },
    }
}

fn str_at(v: &Value, ptr: &str, default: &str) -> Result<String> {
    match present(v, ptr) {
        None => Ok(default.to_string()),
        Some(x) => match x.as_str() {
            Some(s) if !s.trim().is_empty() => Ok(s.to_string()),
            _ => bail!("CONFIG_INVALID {ptr}: expected a non-empty string"),
        },
    }
}
