//! Human-readable rendering of one verification outcome.

use gts_portfolio::{Action, PriceContext, State};
use gts_risk::VerificationResult;

/// Explain the transition `prior` -> `next` under `verification`.
///
/// - accepted: cash and exposure before -> after with signed deltas
/// - rejected: every `code: message`, plus prior equity / cash / exposure
/// - rejected without errors: generic message (the verifier never produces
///   this, kept as a fallback)
pub fn explain_transition(
    prior: &State,
    _action: &Action,
    next: &State,
    verification: &VerificationResult,
    prices: &PriceContext,
) -> String {
    if verification.accepted {
        let cash_delta = next.cash_balance - prior.cash_balance;
        let exposure_delta = next.exposure - prior.exposure;
        return format!(
            "Accepted: cash {:.2} → {:.2} ({:+.2}), exposure {:.2} → {:.2} ({:+.2}).",
            prior.cash_balance,
            next.cash_balance,
            cash_delta,
            prior.exposure,
            next.exposure,
            exposure_delta
        );
    }

    if verification.errors.is_empty() {
        return "Rejected: transition failed verification.".to_string();
    }

    let messages = verification
        .errors
        .iter()
        .map(|e| format!("{}: {}", e.code, e.message))
        .collect::<Vec<_>>()
        .join(", ");

    format!(
        "Rejected: {}. Equity={:.2}, cash={:.2}, exposure={:.2}.",
        messages,
        prior.equity(prices),
        prior.cash_balance,
        prior.exposure
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use gts_portfolio::{apply_action, prices, RiskLimits};
    use gts_risk::{VerificationCode, VerificationError};

    #[test]
    fn accepted_renders_signed_deltas() {
        let s0 = State::new(1_000.0, RiskLimits::default());
        let a = Action::buy("AAPL", 1.0, 100.0);
        let s1 = apply_action(&s0, &a).next_state;
        let v = VerificationResult::from_errors(vec![]);

        let text = explain_transition(&s0, &a, &s1, &v, &prices([("AAPL", 100.0)]));
        assert_eq!(
            text,
            "Accepted: cash 1000.00 → 900.00 (-100.00), exposure 0.00 → 100.00 (+100.00)."
        );
    }

    #[test]
    fn rejected_lists_codes_and_context() {
        let mut s0 = State::new(900.0, RiskLimits::default());
        s0.positions.insert("AAPL".to_string(), 1.0);
        s0.exposure = 100.0;
        let a = Action::buy("AAPL", 20.0, 101.0);
        let v = VerificationResult::from_errors(vec![VerificationError::new(
            VerificationCode::InsufficientCash,
            "Cash balance is insufficient.",
        )]);

        let text = explain_transition(&s0, &a, &s0, &v, &prices([("AAPL", 101.0)]));
        assert_eq!(
            text,
            "Rejected: insufficient_cash: Cash balance is insufficient.. \
             Equity=1001.00, cash=900.00, exposure=100.00."
        );
    }

    #[test]
    fn rejected_without_errors_falls_back() {
        let s0 = State::new(1.0, RiskLimits::default());
        let v = VerificationResult {
            accepted: false,
            errors: vec![],
        };
        let action = Action::buy("X", 1.0, 1.0);
        let text = explain_transition(&s0, &action, &s0, &v, &PriceContext::new());
        assert_eq!(text, "Rejected: transition failed verification.");
    }
}
