//! Risk policy documents and their content hash.
//!
//! The hash is sha256 over the canonical (key-sorted, compact) JSON of the
//! policy with the `policy_hash` key removed. Content and hash travel together:
//! changing any limit means recomputing the hash.

use std::collections::BTreeMap;

use anyhow::{bail, Context, Result};
use gts_portfolio::RiskLimits;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::sha256_hex;

pub const DEFAULT_POLICY_VERSION: &str = "v1";

const HASH_KEY: &str = "policy_hash";

pub fn compute_policy_hash(policy: &Value) -> String {
    let payload = match policy {
        Value::Object(map) => {
            let mut m = map.clone();
            m.remove(HASH_KEY);
            Value::Object(m)
        }
        other => other.clone(),
    };
    // Value serialization cannot fail: keys are strings and floats are finite.
    let canonical = serde_json::to_string(&payload).unwrap_or_default();
    sha256_hex(canonical.as_bytes())
}

/// Fill `policy_version` and `policy_hash` when absent. An existing hash is
/// kept as is.
pub fn ensure_policy_metadata(policy: Value, default_version: &str) -> Value {
    let Value::Object(mut map) = policy else {
        return policy;
    };
    map.entry("policy_version")
        .or_insert_with(|| Value::String(default_version.to_string()));
    if !map.contains_key(HASH_KEY) {
        let hash = compute_policy_hash(&Value::Object(map.clone()));
        map.insert(HASH_KEY.to_string(), Value::String(hash));
    }
    Value::Object(map)
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Policy {
    pub policy_id: String,
    #[serde(default)]
    pub policy_version: String,
    #[serde(default)]
    pub policy_hash: String,
    pub risk_limits: RiskLimits,
    /// Extra descriptive fields; part of the hashed content.
    #[serde(flatten)]
    pub extra: BTreeMap<String, Value>,
    /// Document this policy was loaded from. Numbers keep their written form
    /// (`2` stays `2`) so the hash matches the one stamped on the document.
    #[serde(skip)]
    source: Option<Value>,
}

impl PartialEq for Policy {
    fn eq(&self, other: &Self) -> bool {
        self.policy_id == other.policy_id
            && self.policy_version == other.policy_version
            && self.policy_hash == other.policy_hash
            && self.risk_limits == other.risk_limits
            && self.extra == other.extra
    }
}

/// Take the source's number literal wherever the typed value is numerically
/// equal to it; anything edited since loading keeps its typed form.
fn align_numbers(typed: Value, source: &Value) -> Value {
    match (typed, source) {
        (Value::Number(t), Value::Number(s)) if t.as_f64() == s.as_f64() => {
            Value::Number(s.clone())
        }
        (Value::Object(t), Value::Object(s)) => Value::Object(
            t.into_iter()
                .map(|(k, v)| {
                    let v = match s.get(&k) {
                        Some(sv) => align_numbers(v, sv),
                        None => v,
                    };
                    (k, v)
                })
                .collect(),
        ),
        (Value::Array(t), Value::Array(s)) => Value::Array(
            t.into_iter()
                .enumerate()
                .map(|(i, v)| match s.get(i) {
                    Some(sv) => align_numbers(v, sv),
                    None => v,
                })
                .collect(),
        ),
        (t, _) => t,
    }
}

impl Policy {
    pub fn new(policy_id: impl Into<String>, risk_limits: RiskLimits) -> Result<Self> {
        let mut p = Self {
            policy_id: policy_id.into(),
            policy_version: DEFAULT_POLICY_VERSION.to_string(),
            policy_hash: String::new(),
            risk_limits,
            extra: BTreeMap::new(),
            source: None,
        };
        p.policy_hash = p.compute_hash()?;
        Ok(p)
    }

    /// Parse a policy document. Version and hash are filled in when absent
    /// and the hash is taken over the document as written; a supplied hash
    /// must match.
    pub fn from_document(doc: Value, default_version: &str) -> Result<Self> {
        let doc = ensure_policy_metadata(doc, default_version);
        let mut policy: Policy =
            serde_json::from_value(doc.clone()).context("invalid policy document")?;
        if policy.policy_id.trim().is_empty() {
            bail!("POLICY_INVALID: policy_id must not be empty");
        }
        let computed = compute_policy_hash(&doc);
        if policy.policy_hash != computed {
            bail!(
                "POLICY_HASH_MISMATCH policy_id={} stored={} computed={}",
                policy.policy_id,
                policy.policy_hash,
                computed
            );
        }
        policy.source = Some(doc);
        Ok(policy)
    }

    pub fn from_json_str(raw: &str) -> Result<Self> {
        let doc: Value = serde_json::from_str(raw).context("policy is not valid json")?;
        Self::from_document(doc, DEFAULT_POLICY_VERSION)
    }

    pub fn to_value(&self) -> Result<Value> {
        let typed = serde_json::to_value(self).context("policy serialize failed")?;
        Ok(match &self.source {
            Some(source) => align_numbers(typed, source),
            None => typed,
        })
    }

    pub fn compute_hash(&self) -> Result<String> {
        Ok(compute_policy_hash(&self.to_value()?))
    }

    pub fn verify_hash(&self) -> Result<()> {
        let computed = self.compute_hash()?;
        if computed != self.policy_hash {
            bail!(
                "POLICY_HASH_MISMATCH policy_id={} stored={} computed={}",
                self.policy_id,
                self.policy_hash,
                computed
            );
        }
        Ok(())
    }
}
