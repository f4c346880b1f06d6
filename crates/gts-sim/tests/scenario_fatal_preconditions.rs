//! Out-of-range price contexts and unpriced symbols are fatal errors returned
//! to the caller, not recorded rejections.

use gts_portfolio::{prices, Action, RiskLimits, State};
use gts_sim::{simulate_plan, MarketPath, Provenance, SimError};

#[test]
fn plan_longer_than_path_is_fatal() {
    let path = MarketPath::new(vec![], vec![prices([("AAPL", 10.0)])]);
    let s0 = State::new(1_000.0, RiskLimits::default());
    let plan = vec![Action::buy("AAPL", 1.0, 0.0), Action::buy("AAPL", 1.0, 0.0)];

    let err = simulate_plan(&s0, &plan, &path, Provenance::default()).unwrap_err();
    let expected = SimError::PriceContextOutOfRange {
        step_index: 1,
        len: 1,
    };
    assert_eq!(err, expected);
}

#[test]
fn missing_symbol_price_is_fatal() {
    let path = MarketPath::new(vec![], vec![prices([("AAPL", 10.0)])]);
    let s0 = State::new(1_000.0, RiskLimits::default());

    let err = simulate_plan(
        &s0,
        &[Action::sell("TSLA", 1.0, 5.0)],
        &path,
        Provenance::default(),
    )
    .unwrap_err();
    let expected = SimError::MissingPrice {
        step_index: 0,
        symbol: "TSLA".to_string(),
    };
    assert_eq!(err, expected);
    assert_eq!(err.to_string(), "no price for 'TSLA' at step 0");
}
