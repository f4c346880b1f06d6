use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use gts_sim::{SimulationResult, StepResult};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::fs;
use std::path::{Path, PathBuf};

pub const SCHEMA_VERSION: i32 = 1;

const TRAJECTORY_JSON: &str = "trajectory.json";
const DECISION_JSON: &str = "decision.json";
const DELTAS_JSON: &str = "deltas.json";
const STEPS_CSV: &str = "steps.csv";
const MANIFEST_JSON: &str = "manifest.json";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunManifest {
    pub schema_version: i32,
    pub run_id: String,
    pub engine_id: String,
    pub config_hash: String,
    pub policy_hash: Option<String>,
    pub created_at_utc: DateTime<Utc>,
    pub artifacts: ArtifactList,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArtifactList {
    pub trajectory_json: String,
    pub decision_json: String,
    pub deltas_json: String,
    pub steps_csv: String,
    pub manifest_json: String,
}

impl Default for ArtifactList {
    fn default() -> Self {
        Self {
            trajectory_json: TRAJECTORY_JSON.to_string(),
            decision_json: DECISION_JSON.to_string(),
            deltas_json: DELTAS_JSON.to_string(),
            steps_csv: STEPS_CSV.to_string(),
            manifest_json: MANIFEST_JSON.to_string(),
        }
    }
}

/// Paths written for one run.
#[derive(Debug, Clone)]
pub struct ArtifactPaths {
    pub run_dir: PathBuf,
    pub trajectory: PathBuf,
    pub decision: PathBuf,
    pub deltas: PathBuf,
    pub steps_csv: PathBuf,
    pub manifest: PathBuf,
}

/// Writes `<root>/<run_id>/` for a finished simulation.
#[derive(Debug, Clone)]
pub struct ArtifactWriter {
    root: PathBuf,
    engine_id: String,
    config_hash: String,
}

impl ArtifactWriter {
    pub fn new(root: impl Into<PathBuf>, engine_id: &str, config_hash: &str) -> Self {
        Self {
            root: root.into(),
            engine_id: engine_id.to_string(),
            config_hash: config_hash.to_string(),
        }
    }

    pub fn write(&self, result: &SimulationResult) -> Result<ArtifactPaths> {
        let run_dir = self.root.join(&result.run_id);
        fs::create_dir_all(&run_dir)
            .with_context(|| format!("create artifacts dir failed: {}", run_dir.display()))?;

        let paths = ArtifactPaths {
            trajectory: run_dir.join(TRAJECTORY_JSON),
            decision: run_dir.join(DECISION_JSON),
            deltas: run_dir.join(DELTAS_JSON),
            steps_csv: run_dir.join(STEPS_CSV),
            manifest: run_dir.join(MANIFEST_JSON),
            run_dir,
        };

        write_json(&paths.trajectory, &trajectory_payload(result))?;
        write_json(&paths.decision, &decision_payload(result))?;
        write_json(&paths.deltas, &deltas_payload(result))?;
        write_steps_csv(&paths.steps_csv, &result.steps)?;

        let manifest = RunManifest {
            schema_version: SCHEMA_VERSION,
            run_id: result.run_id.clone(),
            engine_id: self.engine_id.clone(),
            config_hash: self.config_hash.clone(),
            policy_hash: result.provenance.policy_hash.clone(),
            created_at_utc: Utc::now(),
            artifacts: ArtifactList::default(),
        };
        write_json(&paths.manifest, &manifest)?;

        Ok(paths)
    }
}

pub fn read_manifest(path: &Path) -> Result<RunManifest> {
    let raw = fs::read_to_string(path)
        .with_context(|| format!("read manifest failed: {}", path.display()))?;
    serde_json::from_str(&raw).with_context(|| format!("parse manifest failed: {}", path.display()))
}

fn trajectory_payload(result: &SimulationResult) -> Value {
    json!({
        "run_id": result.run_id,
        "trajectory": result.trajectory,
        "steps": result.steps,
    })
}

fn decision_payload(result: &SimulationResult) -> Value {
    let p = &result.provenance;
    let errors: Vec<Value> = result
        .steps
        .iter()
        .filter(|s| !s.errors.is_empty())
        .map(|s| json!({ "step_index": s.step_index, "errors": s.errors }))
        .collect();
    json!({
        "run_id": result.run_id,
        "approved": result.approved,
        "rejected_step_index": result.rejected_step_index,
        "errors": errors,
        "planner": {
            "planner_name": p.planner_name,
            "planner_metadata": p.planner_metadata,
        },
        "policy": {
            "policy_id": p.policy_id,
            "policy_version": p.policy_version,
            "policy_hash": p.policy_hash,
        },
    })
}

fn deltas_payload(result: &SimulationResult) -> Value {
    let deltas: Vec<_> = result.steps.iter().map(|s| &s.state_delta).collect();
    json!({ "run_id": result.run_id, "deltas": deltas })
}

fn write_json<T: Serialize>(path: &Path, value: &T) -> Result<()> {
    let json = serde_json::to_string_pretty(value)
        .with_context(|| format!("serialize failed: {}", path.display()))?;
    fs::write(path, format!("{json}\n"))
        .with_context(|| format!("write failed: {}", path.display()))
}

fn write_steps_csv(path: &Path, steps: &[StepResult]) -> Result<()> {
    let mut w = csv::Writer::from_path(path)
        .with_context(|| format!("open steps csv failed: {}", path.display()))?;
    w.write_record([
        "step_index",
        "action",
        "symbol",
        "quantity",
        "price",
        "accepted",
        "error_codes",
        "cash_after",
        "exposure_after",
        "explanation",
    ])?;
    for s in steps {
        let codes: Vec<&str> = s.errors.iter().map(|e| e.code.as_str()).collect();
        w.write_record([
            s.step_index.to_string(),
            s.action.kind().to_string(),
            s.action.symbol().to_string(),
            s.action.quantity().to_string(),
            s.action.price().to_string(),
            s.accepted.to_string(),
            codes.join("|"),
            s.state_delta.cash.after.to_string(),
            s.state_delta.exposure.after.to_string(),
            s.explanation.clone(),
        ])?;
    }
    w.flush()
        .with_context(|| format!("flush steps csv failed: {}", path.display()))?;
    Ok(())
}
