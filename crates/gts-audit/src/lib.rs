use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use gts_sim::{SimulationResult, StepResult};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sha2::{Digest, Sha256};
use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Decision {
    Approved,
    Rejected,
}

impl Decision {
    pub fn as_str(&self) -> &'static str {
        match self {
            Decision::Approved => "APPROVED",
            Decision::Rejected => "REJECTED",
        }
    }
}

/// One line of the decision tape: the gate outcome of one step.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TapeEntry {
    pub seq: u64,
    pub run_id: String,
    pub ts_utc: DateTime<Utc>,
    pub step_index: usize,
    pub decision: Decision,
    pub explanation: String,
    pub error_codes: Vec<String>,
    pub hash_prev: Option<String>,
    pub hash_self: Option<String>,
}

/// Append-only, hash-chained JSONL record of step decisions.
///
/// Each entry carries the previous entry's hash, so editing, dropping or
/// reordering lines breaks verification from that line on.
pub struct DecisionTape {
    path: PathBuf,
    last_hash: Option<String>,
    seq: u64,
}

impl DecisionTape {
    /// Open (or create) a tape, resuming seq and chain head from any existing
    /// entries.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).with_context(|| format!("create_dir_all {:?}", parent))?;
        }

        let mut tape = Self {
            path,
            last_hash: None,
            seq: 0,
        };
        if tape.path.exists() {
            let content = fs::read_to_string(&tape.path)
                .with_context(|| format!("read decision tape {:?}", tape.path))?;
            for (i, line) in content.lines().enumerate() {
                if line.trim().is_empty() {
                    continue;
                }
                let entry: TapeEntry = serde_json::from_str(line.trim())
                    .with_context(|| format!("parse tape entry at line {}", i + 1))?;
                tape.seq = entry.seq + 1;
                tape.last_hash = entry.hash_self;
            }
        }
        Ok(tape)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn last_hash(&self) -> Option<&str> {
        self.last_hash.as_deref()
    }

    /// Number of entries written so far (the next entry's seq).
    pub fn seq(&self) -> u64 {
        self.seq
    }

    pub fn append_step(&mut self, run_id: &str, step: &StepResult) -> Result<TapeEntry> {
        let mut entry = TapeEntry {
            seq: self.seq,
            run_id: run_id.to_string(),
            ts_utc: Utc::now(),
            step_index: step.step_index,
            decision: if step.accepted {
                Decision::Approved
            } else {
                Decision::Rejected
            },
            explanation: step.explanation.clone(),
            error_codes: step.errors.iter().map(|e| e.code.to_string()).collect(),
            hash_prev: self.last_hash.clone(),
            hash_self: None,
        };
        let self_hash = compute_entry_hash(&entry)?;
        entry.hash_self = Some(self_hash.clone());

        append_line(&self.path, &canonical_json_line(&entry)?)?;
        self.seq += 1;
        self.last_hash = Some(self_hash);
        Ok(entry)
    }

    /// One entry per attempted step, in order.
    pub fn append_run(&mut self, result: &SimulationResult) -> Result<Vec<TapeEntry>> {
        result
            .steps
            .iter()
            .map(|s| self.append_step(&result.run_id, s))
            .collect()
    }
}

fn append_line(path: &Path, line: &str) -> Result<()> {
    let mut f = OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .with_context(|| format!("open decision tape {:?}", path))?;
    f.write_all(line.as_bytes()).context("write tape line failed")?;
    f.write_all(b"\n").context("write newline failed")?;
    Ok(())
}

fn canonical_json_line<T: Serialize>(v: &T) -> Result<String> {
    let raw = serde_json::to_value(v).context("serialize tape entry failed")?;
    serde_json::to_string(&sort_keys(&raw)).context("json stringify failed")
}

fn sort_keys(v: &Value) -> Value {
    match v {
        Value::Object(map) => {
            let mut keys: Vec<_> = map.keys().collect();
            keys.sort();
            let mut new = serde_json::Map::new();
            for k in keys {
                new.insert(k.clone(), sort_keys(&map[k]));
            }
            Value::Object(new)
        }
        Value::Array(arr) => Value::Array(arr.iter().map(sort_keys).collect()),
        _ => v.clone(),
    }
}

/// sha256 over the canonical JSON of the entry with `hash_self` cleared.
pub fn compute_entry_hash(entry: &TapeEntry) -> Result<String> {
    let mut clone = entry.clone();
    clone.hash_self = None;
    let canonical = canonical_json_line(&clone)?;
    let mut hasher = Sha256::new();
    hasher.update(canonical.as_bytes());
    Ok(hex::encode(hasher.finalize()))
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VerifyResult {
    Valid { entries: usize },
    /// `line` is 1-based.
    Broken { line: usize, reason: String },
}

impl VerifyResult {
    pub fn is_valid(&self) -> bool {
        matches!(self, VerifyResult::Valid { .. })
    }
}

pub fn verify_tape(path: impl AsRef<Path>) -> Result<VerifyResult> {
    let content = fs::read_to_string(path.as_ref())
        .with_context(|| format!("read decision tape {:?}", path.as_ref()))?;
    Ok(verify_tape_str(&content))
}

/// Check chain links, self hashes and seq continuity. Unparseable lines are
/// reported as a break, not an error.
pub fn verify_tape_str(content: &str) -> VerifyResult {
    let mut prev_hash: Option<String> = None;
    let mut entries = 0usize;

    for (i, line) in content.lines().enumerate() {
        let trimmed = line.trim();
        if trimmed.is_empty() {
            continue;
        }
        let line_no = i + 1;

        let entry: TapeEntry = match serde_json::from_str(trimmed) {
            Ok(e) => e,
            Err(e) => {
                return VerifyResult::Broken {
                    line: line_no,
                    reason: format!("unparseable entry: {e}"),
                }
            }
        };

        if entry.hash_prev != prev_hash {
            return VerifyResult::Broken {
                line: line_no,
                reason: format!(
                    "hash_prev mismatch: expected {:?}, got {:?}",
                    prev_hash, entry.hash_prev
                ),
            };
        }

        let recomputed = match compute_entry_hash(&entry) {
            Ok(h) => h,
            Err(e) => {
                return VerifyResult::Broken {
                    line: line_no,
                    reason: e.to_string(),
                }
            }
        };
        if entry.hash_self.as_deref() != Some(recomputed.as_str()) {
            return VerifyResult::Broken {
                line: line_no,
                reason: format!(
                    "hash_self mismatch: claimed {:?}, recomputed {}",
                    entry.hash_self, recomputed
                ),
            };
        }

        if entry.seq != entries as u64 {
            return VerifyResult::Broken {
                line: line_no,
                reason: format!("seq gap: expected {}, got {}", entries, entry.seq),
            };
        }

        prev_hash = entry.hash_self;
        entries += 1;
    }

    VerifyResult::Valid { entries }
}
