//! Built-in tools over a market path: price lookup, plan simulation with
//! violations, malformed payloads, unregistered evaluate_strategy.

use gts_portfolio::{prices, RiskLimits, State};
use gts_sim::MarketPath;
use gts_tools::builtin::register_simulation_tools;
use gts_tools::{run_tool_loop, Budget, ToolName, ToolRegistry, ToolRequest};
use serde_json::json;

fn registry() -> ToolRegistry {
    let path = MarketPath::new(
        vec!["AAPL".into()],
        vec![prices([("AAPL", 100.0)]), prices([("AAPL", 101.0)])],
    );
    let mut reg = ToolRegistry::new();
    let s0 = State::new(1_000.0, RiskLimits::new(2.0, 0.8, 5_000.0));
    register_simulation_tools(&mut reg, path, s0);
    reg
}

#[test]
fn price_context_defaults_to_step_zero() {
    let reg = registry();
    let r = reg.invoke(&ToolRequest::new(ToolName::GetPriceContext));
    assert!(r.ok);
    assert_eq!(r.output["prices"]["AAPL"], 100.0);

    let req = ToolRequest::new(ToolName::GetPriceContext).with_arg("step", json!(1));
    let r = reg.invoke(&req);
    assert_eq!(r.output["prices"]["AAPL"], 101.0);

    let req = ToolRequest::new(ToolName::GetPriceContext).with_arg("step", json!(9));
    let r = reg.invoke(&req);
    assert!(!r.ok);
    assert!(r.error.unwrap().contains("out of range"));
}

#[test]
fn simulate_and_verify_reports_violations() {
    let reg = registry();
    let req = ToolRequest::new(ToolName::SimulateAndVerify).with_arg(
        "actions",
        json!([
            {"type": "PlaceBuy", "symbol": "AAPL", "quantity": 1.0},
            {"type": "PlaceBuy", "symbol": "AAPL", "quantity": 20.0}
        ]),
    );
    let r = reg.invoke(&req);
    assert!(r.ok);
    assert_eq!(r.output["approved"], false);
    assert_eq!(r.output["violations"][0]["code"], "insufficient_cash");
    assert!(r.output["explanation"]
        .as_str()
        .unwrap()
        .starts_with("Rejected: "));
    assert!(r.output["run_id"].as_str().is_some_and(|s| !s.is_empty()));
}

#[test]
fn malformed_action_is_a_failed_result() {
    let reg = registry();
    let req = ToolRequest::new(ToolName::SimulateAndVerify)
        .with_arg("actions", json!([{"type": "Hold", "symbol": "AAPL"}]));
    let r = reg.invoke(&req);
    assert!(!r.ok);
    assert!(r.error.unwrap().starts_with("invalid action at index 0"));
}

#[test]
fn loop_halts_at_unregistered_evaluate_strategy() {
    let reg = registry();
    let reqs = vec![
        ToolRequest::new(ToolName::GetPriceContext).with_arg("step", json!(0)),
        ToolRequest::new(ToolName::EvaluateStrategy),
        ToolRequest::new(ToolName::SimulateAndVerify),
    ];
    let out = run_tool_loop(&reqs, &reg, &Budget::new(5, 5));
    assert_eq!(out.results.len(), 2);
    assert_eq!(
        out.results[1].error.as_deref(),
        Some("unknown tool: evaluate_strategy")
    );
}
