//! The verifier never short-circuits inside one call: every violated check is
//! reported, in collection order.

use gts_portfolio::{Action, RiskLimits, State};
use gts_risk::{verify_transition, VerificationCode};

#[test]
fn buy_over_cash_also_reports_leverage_and_concentration() {
    // cash 900, holding 1 AAPL; buy 20 more @101.
    let mut s = State::new(900.0, RiskLimits::default());
    s.positions.insert("AAPL".to_string(), 1.0);

    let r = verify_transition(&s, &Action::buy("AAPL", 20.0, 101.0));
    assert!(!r.accepted);
    assert_eq!(
        r.codes(),
        vec![
            VerificationCode::InsufficientCash,
            VerificationCode::LeverageLimit,
            VerificationCode::PositionConcentration,
        ]
    );
}

#[test]
fn invalid_action_reports_quantity_and_symbol_separately() {
    let s = State::new(1_000.0, RiskLimits::default());
    let r = verify_transition(&s, &Action::buy("", 0.0, 10.0));

    assert!(!r.accepted);
    let invalid: Vec<_> = r
        .errors
        .iter()
        .filter(|e| e.code == VerificationCode::InvalidAction)
        .map(|e| e.message.as_str())
        .collect();
    assert_eq!(
        invalid,
        vec![
            "Quantity and price must be positive.",
            "Symbol is required.",
        ]
    );
}

#[test]
fn nan_price_is_invalid_action() {
    let s = State::new(1_000.0, RiskLimits::default());
    let r = verify_transition(&s, &Action::buy("AAPL", 1.0, f64::NAN));
    assert!(r.has(VerificationCode::InvalidAction));
}

#[test]
fn per_symbol_messages_name_the_symbol() {
    let s = State::new(1_000_000.0, RiskLimits::new(10.0, 1.0, 1_000.0));
    let r = verify_transition(&s, &Action::buy("MSFT", 11.0, 100.0));
    assert_eq!(r.codes(), vec![VerificationCode::PositionValueLimit]);
    assert_eq!(
        r.errors[0].message,
        "Position value for MSFT exceeds limit."
    );
    assert_eq!(
        r.errors[0].to_string(),
        "position_value_limit: Position value for MSFT exceeds limit."
    );
}
