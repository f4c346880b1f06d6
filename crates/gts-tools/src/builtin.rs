//! Built-in tools backed by a market path and a starting state.

use std::sync::Arc;

use gts_portfolio::{Action, State};
use gts_sim::{simulate_plan, MarketPath, PriceSource, Provenance};
use serde_json::{json, Value};

use crate::{ToolName, ToolRegistry, ToolRequest, ToolResult};

/// Register `get_price_context` and `simulate_and_verify`.
///
/// `evaluate_strategy` is left unregistered; requests for it fail with the
/// registry's unknown-tool error.
pub fn register_simulation_tools(
    registry: &mut ToolRegistry,
    market_path: MarketPath,
    initial_state: State,
) {
    let path = Arc::new(market_path);
    let state = Arc::new(initial_state);

    let p = Arc::clone(&path);
    let price_context = move |req: &ToolRequest| get_price_context(p.as_ref(), req);
    registry.register(ToolName::GetPriceContext, price_context);

    let verify = move |req: &ToolRequest| simulate_and_verify(path.as_ref(), state.as_ref(), req);
    registry.register(ToolName::SimulateAndVerify, verify);
}

fn step_arg(req: &ToolRequest) -> Result<usize, String> {
    match req.args.get("step") {
        None | Some(Value::Null) => Ok(0),
        Some(v) => v
            .as_u64()
            .map(|s| s as usize)
            .ok_or_else(|| format!("invalid step: {}", v)),
    }
}

fn get_price_context(path: &MarketPath, req: &ToolRequest) -> ToolResult {
    let step = match step_arg(req) {
        Ok(s) => s,
        Err(e) => return ToolResult::failure(e),
    };
    match path.price_context(step) {
        Ok(prices) => ToolResult::success(json!({ "prices": prices })),
        Err(e) => ToolResult::failure(e.to_string()),
    }
}

fn parse_actions(req: &ToolRequest) -> Result<Vec<Action>, String> {
    let items = match req.args.get("actions") {
        None | Some(Value::Null) => return Ok(Vec::new()),
        Some(Value::Array(items)) => items,
        Some(other) => return Err(format!("invalid actions: expected a list, got {}", other)),
    };
    items
        .iter()
        .enumerate()
        .map(|(i, item)| {
            serde_json::from_value::<Action>(item.clone())
                .map_err(|e| format!("invalid action at index {}: {}", i, e))
        })
        .collect()
}

fn simulate_and_verify(path: &MarketPath, initial_state: &State, req: &ToolRequest) -> ToolResult {
    let actions = match parse_actions(req) {
        Ok(a) => a,
        Err(e) => return ToolResult::failure(e),
    };

    let result = match simulate_plan(initial_state, &actions, path, Provenance::default()) {
        Ok(r) => r,
        Err(e) => return ToolResult::failure(e.to_string()),
    };

    let explanation = result
        .steps
        .last()
        .map(|s| s.explanation.clone())
        .unwrap_or_default();
    let violations: Vec<Value> = result
        .steps
        .iter()
        .flat_map(|s| s.errors.iter())
        .map(|e| json!({ "code": e.code.as_str(), "message": e.message }))
        .collect();

    ToolResult::success(json!({
        "approved": result.approved,
        "explanation": explanation,
        "violations": violations,
        "run_id": result.run_id,
    }))
}
