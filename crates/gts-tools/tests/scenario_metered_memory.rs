//! Memory operations are charged against the budget; a refused operation
//! leaves both the store and the counters untouched.

use gts_tools::memory::{
    estimate_memory_bytes, InMemoryMemoryStore, MemoryBackend, MemoryErrorCode, MemoryStore,
    MemoryStoreError, MeteredMemory,
};
use gts_tools::{run_tool_loop_with_state, Budget, ToolName, ToolRegistry, ToolRequest};
use serde_json::json;

#[test]
fn put_and_get_count_ops_and_bytes() {
    let note = json!({"note": "hello"});
    let bytes = estimate_memory_bytes(&note);
    let budget = Budget::new(1, 0).with_memory(2, bytes);
    let mut mem = MeteredMemory::new(InMemoryMemoryStore::new(), budget);

    mem.put("alpha", note.clone()).unwrap();
    assert_eq!(mem.get("alpha").unwrap(), Some(note));

    let state = mem.budget_state();
    assert_eq!(state.memory_ops, 2);
    assert_eq!(state.memory_bytes, bytes);

    let err = mem.get("alpha").unwrap_err();
    assert_eq!(err.code, MemoryErrorCode::MemoryBudgetExceeded);
    assert_eq!(err.message, "budget exceeded: max_memory_ops");
    assert_eq!(mem.budget_state().memory_ops, 2);
}

#[test]
fn oversized_put_is_refused_before_write() {
    let note = json!({"note": "hello"});
    let budget = Budget::new(1, 0).with_memory(5, estimate_memory_bytes(&note) - 1);
    let mut mem = MeteredMemory::new(InMemoryMemoryStore::new(), budget);

    let err = mem.put("alpha", note).unwrap_err();
    assert_eq!(err.message, "budget exceeded: max_memory_bytes");

    let (store, state) = mem.into_parts();
    assert!(store.is_empty());
    assert_eq!(state.memory_ops, 0);
    assert_eq!(state.memory_bytes, 0);
}

#[test]
fn zero_memory_budget_refuses_first_op() {
    let mut mem = MeteredMemory::new(MemoryBackend::from_enabled(true), Budget::new(1, 0));
    let err = mem.get("alpha").unwrap_err();
    assert_eq!(
        err.to_string(),
        "memory_budget_exceeded: budget exceeded: max_memory_ops"
    );
}

#[test]
fn disabled_backend_still_charges_then_fails() {
    let budget = Budget::new(1, 0).with_memory(1, 100);
    let mut mem = MeteredMemory::new(MemoryBackend::from_enabled(false), budget);
    let err = mem.put("k", json!(1)).unwrap_err();
    assert_eq!(err.code, MemoryErrorCode::MemoryDisabled);
}

#[test]
fn memory_usage_feeds_the_tool_loop() {
    let budget = Budget::new(5, 5).with_memory(1, 100);
    let mut mem = MeteredMemory::new(InMemoryMemoryStore::new(), budget);
    mem.put("k", json!({"v": 1})).unwrap();
    // A second op over the ceiling is refused, so the counters stay in budget.
    assert!(mem.put("k", json!({"v": 2})).is_err());

    let (_, state) = mem.into_parts();
    let reg = ToolRegistry::new();
    let out = run_tool_loop_with_state(
        &[ToolRequest::new(ToolName::GetPriceContext)],
        &reg,
        &budget,
        state,
    );
    // Within budget, so the request reaches the (empty) registry.
    assert_eq!(out.breach(), None);
    assert_eq!(
        out.results[0].error.as_deref(),
        Some("unknown tool: get_price_context")
    );
}

/// Backend whose storage cannot be reached.
struct OfflineStore;

impl MemoryStore for OfflineStore {
    fn put(&mut self, _key: &str, _value: serde_json::Value) -> Result<(), MemoryStoreError> {
        Err(MemoryStoreError::new(MemoryErrorCode::MemoryUnavailable, "connection refused"))
    }

    fn get(&mut self, _key: &str) -> Result<Option<serde_json::Value>, MemoryStoreError> {
        Err(MemoryStoreError::new(MemoryErrorCode::MemoryUnavailable, "connection refused"))
    }
}

#[test]
fn unavailable_backend_error_passes_through_after_charge() {
    let budget = Budget::new(1, 0).with_memory(2, 100);
    let mut mem = MeteredMemory::new(OfflineStore, budget);

    let err = mem.put("k", json!(1)).unwrap_err();
    assert_eq!(err.code, MemoryErrorCode::MemoryUnavailable);
    assert_eq!(err.to_string(), "memory_unavailable: connection refused");
    assert_eq!(mem.budget_state().memory_ops, 1);
    assert_eq!(mem.budget_state().memory_bytes, 1);

    let err = mem.get("k").unwrap_err();
    assert_eq!(err.code, MemoryErrorCode::MemoryUnavailable);
    // ceiling reached: refused before the backend is asked
    let err = mem.get("k").unwrap_err();
    assert_eq!(err.code, MemoryErrorCode::MemoryBudgetExceeded);
}
