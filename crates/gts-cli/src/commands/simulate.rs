use anyhow::{Context, Result};
use gts_artifacts::ArtifactWriter;
use gts_audit::DecisionTape;
use gts_config::{Policy, DEFAULT_POLICY_VERSION};
use gts_portfolio::{Action, State};
use gts_sim::{simulate_plan, MarketPath, Provenance};
use gts_store::Stores;
use serde_json::Value;
use std::path::PathBuf;
use tracing::info;

use super::{load_engine_config, read_json};

pub struct SimulateArgs {
    pub state: Option<PathBuf>,
    pub plan: PathBuf,
    pub path: PathBuf,
    pub policy: Option<PathBuf>,
    pub config_paths: Vec<String>,
    pub data_dir: Option<PathBuf>,
    pub artifacts: Option<PathBuf>,
    pub tape: Option<PathBuf>,
    pub planner: Option<String>,
}

pub fn run(args: SimulateArgs) -> Result<()> {
    let (loaded, cfg) = load_engine_config(&args.config_paths)?;
    let stores = Stores::open(args.data_dir.as_ref().unwrap_or(&cfg.data_dir));

    let policy = match &args.policy {
        Some(p) => {
            let doc: Value = read_json(p, "policy")?;
            let policy = Policy::from_document(doc, DEFAULT_POLICY_VERSION)?;
            stores.policies.save_policy(&policy)?;
            policy
        }
        None => match stores.policies.get_policy("default")? {
            Some(p) => p,
            None => Policy::new("default", cfg.risk_limits.clone())?,
        },
    };

    let initial_state: State = match &args.state {
        Some(p) => read_json(p, "state")?,
        None => match stores.state.get_current_state()? {
            Some(s) => s,
            None => {
                let mut s = cfg.initial_state();
                s.risk_limits = policy.risk_limits.clone();
                stores.state.init_state(&s)?;
                s
            }
        },
    };

    let plan: Vec<Action> = read_json(&args.plan, "plan")?;
    let market_path = MarketPath::from_fixture(&args.path)
        .with_context(|| format!("load market path failed: {}", args.path.display()))?;

    let provenance = Provenance {
        policy_id: Some(policy.policy_id.clone()),
        policy_version: Some(policy.policy_version.clone()),
        policy_hash: Some(policy.policy_hash.clone()),
        planner_name: args.planner.clone(),
        planner_metadata: None,
    };

    let result = simulate_plan(&initial_state, &plan, &market_path, provenance)
        .context("simulation failed")?;

    stores.runs.save_run(&result)?;

    if let Some(root) = &args.artifacts {
        let paths = ArtifactWriter::new(root, &cfg.engine_id, &loaded.config_hash).write(&result)?;
        info!(run_dir = %paths.run_dir.display(), "artifacts written");
    }

    if let Some(tape_path) = &args.tape {
        let mut tape = DecisionTape::open(tape_path)?;
        tape.append_run(&result)?;
    }

    println!("approved={} run_id={}", result.approved, result.run_id);
    if let Some(k) = result.rejected_step_index {
        println!("rejected_step_index={k}");
    }
    for step in &result.steps {
        println!("step {}: {}", step.step_index, step.explanation);
    }
    Ok(())
}
