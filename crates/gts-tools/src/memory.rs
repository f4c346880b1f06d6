//! Agent memory stores and budget metering.
//!
//! `MeteredMemory` charges one memory op per `put`/`get` and the estimated
//! payload bytes of each `put` against a [`Budget`]. An operation that would
//! cross a ceiling is refused before it touches the store or the counters.

use std::collections::BTreeMap;
use std::io;

use serde::Serialize;
use serde_json::ser::Formatter;
use serde_json::Value;
use tracing::warn;

use crate::{Budget, BudgetLimiter, BudgetState};

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum MemoryErrorCode {
    MemoryDisabled,
    MemoryUnavailable,
    MemoryBudgetExceeded,
}

impl MemoryErrorCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            MemoryErrorCode::MemoryDisabled => "memory_disabled",
            MemoryErrorCode::MemoryUnavailable => "memory_unavailable",
            MemoryErrorCode::MemoryBudgetExceeded => "memory_budget_exceeded",
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MemoryStoreError {
    pub code: MemoryErrorCode,
    pub message: String,
}

impl MemoryStoreError {
    pub fn new(code: MemoryErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }

    fn over_budget(limiter: BudgetLimiter) -> Self {
        let message = limiter.breach_message();
        Self::new(MemoryErrorCode::MemoryBudgetExceeded, message)
    }
}

impl std::fmt::Display for MemoryStoreError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.code.as_str(), self.message)
    }
}

impl std::error::Error for MemoryStoreError {}

/// Key/value memory. Backends that cannot reach their storage report
/// `memory_unavailable`.
pub trait MemoryStore {
    fn put(&mut self, key: &str, value: Value) -> Result<(), MemoryStoreError>;

    fn get(&mut self, key: &str) -> Result<Option<Value>, MemoryStoreError>;
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct InMemoryMemoryStore {
    storage: BTreeMap<String, Value>,
}

impl InMemoryMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.storage.len()
    }

    pub fn is_empty(&self) -> bool {
        self.storage.is_empty()
    }
}

impl MemoryStore for InMemoryMemoryStore {
    fn put(&mut self, key: &str, value: Value) -> Result<(), MemoryStoreError> {
        self.storage.insert(key.to_string(), value);
        Ok(())
    }

    fn get(&mut self, key: &str) -> Result<Option<Value>, MemoryStoreError> {
        Ok(self.storage.get(key).cloned())
    }
}

/// Accepts writes and forgets them.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct NoOpMemoryStore;

impl MemoryStore for NoOpMemoryStore {
    fn put(&mut self, _key: &str, _value: Value) -> Result<(), MemoryStoreError> {
        Ok(())
    }

    fn get(&mut self, _key: &str) -> Result<Option<Value>, MemoryStoreError> {
        Ok(None)
    }
}

/// Backend picked from the explicit `memory.enabled` setting.
#[derive(Clone, Debug, PartialEq)]
pub enum MemoryBackend {
    InMemory(InMemoryMemoryStore),
    /// Memory switched off: every operation fails with `memory_disabled`.
    Disabled,
}

impl MemoryBackend {
    /// Enabled gives a fresh in-memory store; disabled refuses every operation.
    pub fn from_enabled(enabled: bool) -> Self {
        if enabled {
            MemoryBackend::InMemory(InMemoryMemoryStore::new())
        } else {
            MemoryBackend::Disabled
        }
    }

    pub fn is_enabled(&self) -> bool {
        !matches!(self, MemoryBackend::Disabled)
    }

    fn disabled() -> MemoryStoreError {
        MemoryStoreError::new(MemoryErrorCode::MemoryDisabled, "memory backend disabled")
    }
}

impl MemoryStore for MemoryBackend {
    fn put(&mut self, key: &str, value: Value) -> Result<(), MemoryStoreError> {
        match self {
            MemoryBackend::InMemory(s) => s.put(key, value),
            MemoryBackend::Disabled => Err(Self::disabled()),
        }
    }

    fn get(&mut self, key: &str) -> Result<Option<Value>, MemoryStoreError> {
        match self {
            MemoryBackend::InMemory(s) => s.get(key),
            MemoryBackend::Disabled => Err(Self::disabled()),
        }
    }
}

/// Single-line JSON with `", "` between items and `": "` after keys.
struct SpacedFormatter;

impl Formatter for SpacedFormatter {
    fn begin_array_value<W>(&mut self, writer: &mut W, first: bool) -> io::Result<()>
    where
        W: ?Sized + io::Write,
    {
        if first {
            Ok(())
        } else {
            writer.write_all(b", ")
        }
    }

    fn begin_object_key<W>(&mut self, writer: &mut W, first: bool) -> io::Result<()>
    where
        W: ?Sized + io::Write,
    {
        if first {
            Ok(())
        } else {
            writer.write_all(b", ")
        }
    }

    fn begin_object_value<W>(&mut self, writer: &mut W) -> io::Result<()>
    where
        W: ?Sized + io::Write,
    {
        writer.write_all(b": ")
    }
}

/// Byte length of the key-sorted single-line JSON encoding of `payload`,
/// written with `", "` and `": "` separators.
///
/// Non-ASCII text is counted as its UTF-8 bytes, not as `\uXXXX` escapes.
pub fn estimate_memory_bytes(payload: &Value) -> u64 {
    // serde_json maps are BTreeMap-backed, so object keys serialize sorted.
    let mut buf = Vec::new();
    let mut ser = serde_json::Serializer::with_formatter(&mut buf, SpacedFormatter);
    if payload.serialize(&mut ser).is_err() {
        return 0;
    }
    buf.len() as u64
}

/// A store wrapped with budget accounting.
#[derive(Debug)]
pub struct MeteredMemory<S> {
    store: S,
    budget: Budget,
    state: BudgetState,
}

impl<S: MemoryStore> MeteredMemory<S> {
    pub fn new(store: S, budget: Budget) -> Self {
        Self::with_state(store, budget, BudgetState::default())
    }

    pub fn with_state(store: S, budget: Budget, state: BudgetState) -> Self {
        Self {
            store,
            budget,
            state,
        }
    }

    pub fn budget_state(&self) -> BudgetState {
        self.state
    }

    pub fn into_parts(self) -> (S, BudgetState) {
        (self.store, self.state)
    }

    fn charge(&mut self, bytes: u64) -> Result<(), MemoryStoreError> {
        let mut next = self.state;
        next.increment_memory_ops();
        next.add_memory_bytes(bytes);
        if next.memory_ops > self.budget.max_memory_ops {
            return Err(self.refuse(BudgetLimiter::MaxMemoryOps));
        }
        if next.memory_bytes > self.budget.max_memory_bytes {
            return Err(self.refuse(BudgetLimiter::MaxMemoryBytes));
        }
        self.state = next;
        Ok(())
    }

    fn refuse(&self, limiter: BudgetLimiter) -> MemoryStoreError {
        warn!(
            limiter = limiter.as_str(),
            memory_ops = self.state.memory_ops,
            memory_bytes = self.state.memory_bytes,
            "memory budget exceeded"
        );
        MemoryStoreError::over_budget(limiter)
    }
}

impl<S: MemoryStore> MemoryStore for MeteredMemory<S> {
    fn put(&mut self, key: &str, value: Value) -> Result<(), MemoryStoreError> {
        self.charge(estimate_memory_bytes(&value))?;
        self.store.put(key, value)
    }

    fn get(&mut self, key: &str) -> Result<Option<Value>, MemoryStoreError> {
        self.charge(0)?;
        self.store.get(key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn estimate_counts_sorted_json_with_spaced_separators() {
        // {"a": "x", "b": 1}
        let v = json!({"b": 1, "a": "x"});
        assert_eq!(estimate_memory_bytes(&v), 18);
        // [1, 2, {"k": []}]
        assert_eq!(estimate_memory_bytes(&json!([1, 2, {"k": []}])), 17);
        assert_eq!(estimate_memory_bytes(&json!("x")), 3);
    }

    #[test]
    fn noop_forgets() {
        let mut s = NoOpMemoryStore;
        s.put("k", json!(1)).unwrap();
        assert_eq!(s.get("k").unwrap(), None);
    }

    #[test]
    fn disabled_backend_refuses() {
        let mut b = MemoryBackend::from_enabled(false);
        assert!(!b.is_enabled());
        let err = b.get("k").unwrap_err();
        assert_eq!(err.code, MemoryErrorCode::MemoryDisabled);
        assert!(MemoryBackend::from_enabled(true).is_enabled());
    }
}
