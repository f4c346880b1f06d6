use anyhow::{Context, Result};
use gts_sim::MarketPath;
use gts_tools::builtin::register_simulation_tools;
use gts_tools::memory::{MemoryBackend, MemoryStore, MeteredMemory};
use gts_tools::{run_tool_loop_with_state, ToolRegistry, ToolRequest};
use std::path::Path;
use tracing::warn;

use super::{load_engine_config, read_json};

pub fn run(requests_path: &Path, path: &Path, config_paths: &[String]) -> Result<()> {
    let (_, cfg) = load_engine_config(config_paths)?;

    let requests: Vec<ToolRequest> = read_json(requests_path, "tool requests")?;
    let market_path = MarketPath::from_fixture(path)
        .with_context(|| format!("load market path failed: {}", path.display()))?;

    let mut registry = ToolRegistry::new();
    register_simulation_tools(&mut registry, market_path, cfg.initial_state());

    // The request batch is remembered through the metered store, so memory
    // usage counts against the same budget as the tool calls.
    let backend = MemoryBackend::from_enabled(cfg.memory_enabled);
    let mut memory = MeteredMemory::new(backend, cfg.budget);
    if cfg.memory_enabled {
        if let Err(e) = memory.put("tool_requests", serde_json::to_value(&requests)?) {
            warn!(code = e.code.as_str(), error = %e.message, "memory write refused");
        }
    }
    let (_, budget_state) = memory.into_parts();

    let outcome = run_tool_loop_with_state(&requests, &registry, &cfg.budget, budget_state);

    match outcome.breach() {
        Some(l) => println!("ok={} limiter={}", outcome.ok(), l),
        None => println!("ok={}", outcome.ok()),
    }
    println!("{}", serde_json::to_string_pretty(&outcome)?);
    Ok(())
}
