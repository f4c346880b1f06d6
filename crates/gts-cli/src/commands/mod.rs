//! Command handlers for the `gts` binary.
//!
//! Shared file/config helpers live here; each subcommand has its own module.

pub mod execute;
pub mod integrity;
pub mod simulate;
pub mod tools;

use anyhow::{Context, Result};
use gts_config::{report_unused_keys, EngineConfig, LoadedConfig, UnusedKeyPolicy};
use serde::de::DeserializeOwned;
use std::fs;
use std::path::Path;
use tracing::warn;

/// Read and parse a JSON file. A UTF-8 BOM is tolerated.
pub fn read_json<T: DeserializeOwned>(path: &Path, what: &str) -> Result<T> {
    let bytes = fs::read(path).with_context(|| format!("read {what} failed: {}", path.display()))?;
    let bytes = bytes.strip_prefix(&[0xEF, 0xBB, 0xBF]).unwrap_or(&bytes);
    serde_json::from_slice(bytes)
        .with_context(|| format!("{what} must be valid JSON: {}", path.display()))
}

/// Merge config layers (none means all defaults) and type them.
pub fn load_engine_config(paths: &[String]) -> Result<(LoadedConfig, EngineConfig)> {
    let path_refs: Vec<&str> = paths.iter().map(|s| s.as_str()).collect();
    let loaded = if path_refs.is_empty() {
        gts_config::load_layered_yaml_from_strings(&[])?
    } else {
        gts_config::load_layered_yaml(&path_refs)?
    };

    let report = report_unused_keys(&loaded.config_json, UnusedKeyPolicy::Warn)?;
    for ptr in &report.unused_leaf_pointers {
        warn!(pointer = ptr.as_str(), "unused config key");
    }

    let cfg = EngineConfig::from_config_json(&loaded.config_json)?;
    Ok((loaded, cfg))
}
