use anyhow::{bail, Result};
use gts_audit::{verify_tape, VerifyResult};
use gts_config::{Policy, DEFAULT_POLICY_VERSION};
use serde_json::Value;
use std::path::Path;

use super::read_json;

pub fn policy_hash(path: &Path) -> Result<()> {
    let doc: Value = read_json(path, "policy")?;
    let policy = Policy::from_document(doc, DEFAULT_POLICY_VERSION)?;
    println!("policy_hash={}", policy.policy_hash);
    println!("{}", serde_json::to_string_pretty(&policy.to_value()?)?);
    Ok(())
}

pub fn config_hash(paths: &[String]) -> Result<()> {
    let path_refs: Vec<&str> = paths.iter().map(|s| s.as_str()).collect();
    let loaded = gts_config::load_layered_yaml(&path_refs)?;
    println!("config_hash={}", loaded.config_hash);
    println!("{}", loaded.canonical_json);
    Ok(())
}

pub fn tape_verify(path: &Path) -> Result<()> {
    match verify_tape(path)? {
        VerifyResult::Valid { entries } => {
            println!("tape_valid=true entries={entries}");
            Ok(())
        }
        VerifyResult::Broken { line, reason } => {
            println!("tape_valid=false line={line}");
            bail!("TAPE_CHAIN_BROKEN line={line} reason={reason}");
        }
    }
}
