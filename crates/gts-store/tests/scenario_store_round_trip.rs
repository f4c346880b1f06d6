//! Stores persist to JSON files keyed by id and survive reopening.

use gts_config::{ensure_policy_metadata, Policy, DEFAULT_POLICY_VERSION};
use gts_portfolio::{prices, Action, RiskLimits, State};
use gts_sim::{simulate_plan, MarketPath, Provenance};
use gts_store::Stores;

#[test]
fn runs_are_keyed_by_run_id() {
    let dir = tempfile::tempdir().unwrap();
    let stores = Stores::open(dir.path().join("nested/data"));
    let path = MarketPath::new(vec![], vec![prices([("AAPL", 10.0)])]);
    let s0 = State::new(100.0, RiskLimits::default());

    let a = simulate_plan(
        &s0,
        &[Action::buy("AAPL", 1.0, 0.0)],
        &path,
        Provenance::default(),
    )
    .unwrap();
    let b = simulate_plan(
        &s0,
        &[Action::sell("AAPL", 1.0, 0.0)],
        &path,
        Provenance::default(),
    )
    .unwrap();
    stores.runs.save_run(&a).unwrap();
    stores.runs.save_run(&b).unwrap();

    let reopened = Stores::open(dir.path().join("nested/data"));
    assert_eq!(reopened.runs.get_run(&a.run_id).unwrap(), Some(a.clone()));
    assert_eq!(reopened.runs.get_run(&b.run_id).unwrap(), Some(b));
    assert_eq!(reopened.runs.run_ids().unwrap().len(), 2);
    assert_eq!(reopened.runs.get_run("missing").unwrap(), None);
}

#[test]
fn policies_are_verified_on_save_and_read() {
    let dir = tempfile::tempdir().unwrap();
    let stores = Stores::open(dir.path());

    let policy = Policy::new("default", RiskLimits::new(2.0, 0.8, 5_000.0)).unwrap();
    stores.policies.save_policy(&policy).unwrap();
    let loaded = stores.policies.get_policy("default").unwrap();
    assert_eq!(loaded, Some(policy.clone()));
    assert_eq!(stores.policies.get_policy("other").unwrap(), None);

    let mut tampered = policy;
    tampered.risk_limits.max_leverage = 9.0;
    let err = stores.policies.save_policy(&tampered).unwrap_err();
    assert!(err.to_string().contains("POLICY_HASH_MISMATCH"));
}

#[test]
fn integer_limit_policy_keeps_its_hash_through_the_store() {
    let dir = tempfile::tempdir().unwrap();
    let stores = Stores::open(dir.path());

    let doc = serde_json::json!({
        "policy_id": "ints",
        "risk_limits": {"max_leverage": 2, "max_position_pct": 1, "max_position_value": 5000}
    });
    let stamped = ensure_policy_metadata(doc, DEFAULT_POLICY_VERSION);
    let policy = Policy::from_document(stamped, DEFAULT_POLICY_VERSION).unwrap();
    stores.policies.save_policy(&policy).unwrap();

    let loaded = stores.policies.get_policy("ints").unwrap().unwrap();
    assert_eq!(loaded, policy);
    assert_eq!(loaded.policy_hash, policy.policy_hash);
}

#[test]
fn state_update_overwrites() {
    let dir = tempfile::tempdir().unwrap();
    let stores = Stores::open(dir.path());
    assert_eq!(stores.state.get_current_state().unwrap(), None);

    let s = State::new(50.0, RiskLimits::default());
    stores.state.init_state(&s).unwrap();
    let mut next = s.clone();
    next.cash_balance = 40.0;
    stores.state.update_state(&next).unwrap();
    assert_eq!(stores.state.get_current_state().unwrap(), Some(next));
}
