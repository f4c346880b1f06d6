use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use gts_config::{Policy, DEFAULT_POLICY_VERSION};
use gts_portfolio::State;
use gts_sim::SimulationResult;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;

fn read_json<T: DeserializeOwned>(path: &Path) -> Result<Option<T>> {
    if !path.exists() {
        return Ok(None);
    }
    let raw = fs::read_to_string(path).with_context(|| format!("read failed: {}", path.display()))?;
    let v = serde_json::from_str(&raw)
        .with_context(|| format!("parse failed: {}", path.display()))?;
    Ok(Some(v))
}

fn write_json<T: Serialize>(path: &Path, value: &T) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("create dir failed: {}", parent.display()))?;
    }
    let json = serde_json::to_string_pretty(value)
        .with_context(|| format!("serialize failed: {}", path.display()))?;
    fs::write(path, format!("{json}\n"))
        .with_context(|| format!("write failed: {}", path.display()))
}

/// Single current state.
#[derive(Debug, Clone)]
pub struct StateStore {
    path: PathBuf,
}

impl StateStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn get_current_state(&self) -> Result<Option<State>> {
        read_json(&self.path)
    }

    pub fn init_state(&self, state: &State) -> Result<()> {
        write_json(&self.path, state)
    }

    pub fn update_state(&self, state: &State) -> Result<()> {
        self.init_state(state)
    }
}

/// Simulation results keyed by run_id.
#[derive(Debug, Clone)]
pub struct RunStore {
    path: PathBuf,
}

impl RunStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn save_run(&self, result: &SimulationResult) -> Result<()> {
        let mut runs = self.load()?;
        runs.insert(result.run_id.clone(), result.clone());
        write_json(&self.path, &runs)
    }

    pub fn get_run(&self, run_id: &str) -> Result<Option<SimulationResult>> {
        Ok(self.load()?.remove(run_id))
    }

    pub fn run_ids(&self) -> Result<Vec<String>> {
        Ok(self.load()?.into_keys().collect())
    }

    fn load(&self) -> Result<BTreeMap<String, SimulationResult>> {
        Ok(read_json(&self.path)?.unwrap_or_default())
    }
}

/// Risk policies keyed by policy_id. Saving overwrites the previous version.
#[derive(Debug, Clone)]
pub struct PolicyStore {
    path: PathBuf,
}

impl PolicyStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn save_policy(&self, policy: &Policy) -> Result<()> {
        policy.verify_hash()?;
        let mut policies = self.load()?;
        policies.insert(policy.policy_id.clone(), policy.to_value()?);
        write_json(&self.path, &policies)
    }

    /// Stored policy; its hash is re-verified on read.
    pub fn get_policy(&self, policy_id: &str) -> Result<Option<Policy>> {
        match self.load()?.remove(policy_id) {
            Some(doc) => {
                let p = Policy::from_document(doc, DEFAULT_POLICY_VERSION)
                    .with_context(|| format!("stored policy {policy_id} failed verification"))?;
                Ok(Some(p))
            }
            None => Ok(None),
        }
    }

    fn load(&self) -> Result<BTreeMap<String, Value>> {
        Ok(read_json(&self.path)?.unwrap_or_default())
    }
}

/// The three stores rooted at one data dir.
#[derive(Debug, Clone)]
pub struct Stores {
    pub state: StateStore,
    pub runs: RunStore,
    pub policies: PolicyStore,
}

impl Stores {
    pub fn open(data_dir: impl AsRef<Path>) -> Self {
        let d = data_dir.as_ref();
        Self {
            state: StateStore::new(d.join("state.json")),
            runs: RunStore::new(d.join("runs.json")),
            policies: PolicyStore::new(d.join("policies.json")),
        }
    }
}
