//! Each budget ceiling halts the loop with `budget exceeded: <limiter>` and
//! nothing after the breaching request is invoked.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use gts_tools::{
    run_tool_loop, run_tool_loop_with_state, Budget, BudgetLimiter, BudgetState, ToolName,
    ToolRegistry, ToolRequest, ToolResult,
};
use serde_json::json;

fn counting_registry() -> (ToolRegistry, Arc<AtomicUsize>) {
    let calls = Arc::new(AtomicUsize::new(0));
    let c = Arc::clone(&calls);
    let mut reg = ToolRegistry::new();
    reg.register(ToolName::GetPriceContext, move |_| {
        c.fetch_add(1, Ordering::SeqCst);
        ToolResult::success(json!({"ok": true}))
    });
    (reg, calls)
}

fn requests(n: usize) -> Vec<ToolRequest> {
    vec![ToolRequest::new(ToolName::GetPriceContext); n]
}

#[test]
fn max_tool_calls_n_with_n_plus_one_requests() {
    let (reg, calls) = counting_registry();
    let n = 3;
    let out = run_tool_loop(&requests(n + 2), &reg, &Budget::new(10, n as u64));

    assert_eq!(out.results.len(), n + 1);
    assert!(out.results[..n].iter().all(|r| r.ok));
    let last = &out.results[n];
    assert!(!last.ok);
    assert!(last.error.as_deref().unwrap().contains("max_tool_calls"));
    assert_eq!(calls.load(Ordering::SeqCst), n);
    assert_eq!(out.breach(), Some(BudgetLimiter::MaxToolCalls));
    assert_eq!(out.budget_state.tool_calls, n as u64 + 1);
    assert!(!out.ok());
    assert_eq!(out.failed_index(), Some(n));
}

#[test]
fn max_steps_breach_does_not_count_a_tool_call() {
    let (reg, calls) = counting_registry();
    let out = run_tool_loop(&requests(2), &reg, &Budget::new(1, 5));

    assert_eq!(out.results.len(), 2);
    assert_eq!(
        out.results[1].error.as_deref(),
        Some("budget exceeded: max_steps")
    );
    assert_eq!(out.budget_state.steps, 2);
    assert_eq!(out.budget_state.tool_calls, 1);
    assert_eq!(calls.load(Ordering::SeqCst), 1);
}

#[test]
fn caller_counted_model_calls_breach_on_first_request() {
    let (reg, calls) = counting_registry();
    let mut state = BudgetState::default();
    state.increment_model_calls();

    let out = run_tool_loop_with_state(&requests(2), &reg, &Budget::new(5, 5), state);

    assert_eq!(out.results.len(), 1);
    assert_eq!(
        out.results[0].error.as_deref(),
        Some("budget exceeded: max_model_calls")
    );
    assert_eq!(calls.load(Ordering::SeqCst), 0);
}

#[test]
fn caller_counted_memory_usage_breaches() {
    let (reg, _) = counting_registry();

    let mut ops = BudgetState::default();
    ops.increment_memory_ops();
    let out = run_tool_loop_with_state(&requests(1), &reg, &Budget::new(5, 5), ops);
    assert_eq!(out.breach(), Some(BudgetLimiter::MaxMemoryOps));

    let mut bytes = BudgetState::default();
    bytes.add_memory_bytes(10);
    let budget = Budget::new(5, 5).with_memory(1, 9);
    let out = run_tool_loop_with_state(&requests(1), &reg, &budget, bytes);
    assert_eq!(out.breach(), Some(BudgetLimiter::MaxMemoryBytes));
    assert_eq!(
        out.results[0].error.as_deref(),
        Some("budget exceeded: max_memory_bytes")
    );
}

#[test]
fn within_budget_runs_everything() {
    let (reg, calls) = counting_registry();
    let budget = Budget::new(3, 3);
    let out = run_tool_loop(&requests(3), &reg, &budget);
    assert!(out.ok());
    assert_eq!(out.breach(), None);
    assert_eq!(calls.load(Ordering::SeqCst), 3);
    assert!(out.budget_state.within_budget(&budget));
}
