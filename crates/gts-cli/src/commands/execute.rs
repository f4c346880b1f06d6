use anyhow::Result;
use gts_store::{execute_run, Stores};
use std::path::Path;

pub fn run(data_dir: &Path, run_id: &str) -> Result<()> {
    let stores = Stores::open(data_dir);
    let res = execute_run(&stores.runs, &stores.state, run_id)?;

    println!("approved={} run_id={}", res.approved, res.run_id);
    println!("message={}", res.message);
    if let Some(state) = &res.state {
        println!("{}", serde_json::to_string_pretty(state)?);
    }
    Ok(())
}
