//! Config hash is a pure function of merged content: key order in the source
//! YAML does not matter, values and overlays do.

use gts_config::load_layered_yaml_from_strings;

const BASE_YAML: &str = r#"
engine:
  engine_id: "MAIN"
account:
  initial_cash: 1000
risk:
  max_leverage: 2.0
  max_position_pct: 0.8
"#;

const BASE_YAML_REORDERED: &str = r#"
risk:
  max_position_pct: 0.8
  max_leverage: 2.0
account:
  initial_cash: 1000
engine:
  engine_id: "MAIN"
"#;

const OVERLAY_YAML: &str = r#"
risk:
  max_leverage: 1.0
budget:
  max_steps: 3
"#;

#[test]
fn reordered_keys_produce_same_hash() {
    let a = load_layered_yaml_from_strings(&[BASE_YAML]).unwrap();
    let b = load_layered_yaml_from_strings(&[BASE_YAML_REORDERED]).unwrap();
    assert_eq!(a.config_hash, b.config_hash);
    assert_eq!(a.canonical_json, b.canonical_json);
    assert!(a.canonical_json.starts_with(r#"{"account":"#));
}

#[test]
fn overlay_overrides_and_changes_hash() {
    let base = load_layered_yaml_from_strings(&[BASE_YAML]).unwrap();
    let merged = load_layered_yaml_from_strings(&[BASE_YAML, OVERLAY_YAML]).unwrap();
    assert_ne!(base.config_hash, merged.config_hash);

    let v = &merged.config_json;
    assert_eq!(v.pointer("/risk/max_leverage").unwrap(), 1.0);
    assert_eq!(v.pointer("/risk/max_position_pct").unwrap(), 0.8);
    assert_eq!(v.pointer("/budget/max_steps").unwrap(), 3);
}

#[test]
fn hash_is_64_hex_chars() {
    let loaded = load_layered_yaml_from_strings(&[BASE_YAML]).unwrap();
    assert_eq!(loaded.config_hash.len(), 64);
    assert!(loaded.config_hash.chars().all(|c| c.is_ascii_hexdigit()));
}

#[test]
fn empty_layers_are_stable() {
    let a = load_layered_yaml_from_strings(&["{}"]).unwrap();
    let b = load_layered_yaml_from_strings(&["", "{}"]).unwrap();
    assert_eq!(a.config_hash, b.config_hash);
    assert_eq!(a.canonical_json, "{}");
}

#[test]
fn loads_layers_from_disk_in_order() {
    let dir = tempfile::tempdir().unwrap();
    let base = dir.path().join("base.yaml");
    let overlay = dir.path().join("overlay.yaml");
    std::fs::write(&base, BASE_YAML).unwrap();
    std::fs::write(&overlay, OVERLAY_YAML).unwrap();

    let paths = [base.to_str().unwrap(), overlay.to_str().unwrap()];
    let from_disk = gts_config::load_layered_yaml(&paths).unwrap();
    let from_str = load_layered_yaml_from_strings(&[BASE_YAML, OVERLAY_YAML]).unwrap();
    assert_eq!(from_disk.config_hash, from_str.config_hash);

    let missing = dir.path().join("nope.yaml");
    let err = gts_config::load_layered_yaml(&[missing.to_str().unwrap()]).unwrap_err();
    assert!(err.to_string().contains("failed to read yaml path"));
}
