use crate::model::game_state::GameState;

/// Price movement produced by one accepted turn.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PriceMove {
    pub old: f64,
    pub new: f64,
    pub percent_change: f64,
    pub positive: bool,
}

/// `(new - old) / old * 100`, or 0 when there is no positive base to divide by.
pub fn percent_change(old: f64, new: f64) -> f64 {
    if old > 0.0 {
        (new - old) / old * 100.0
    } else {
        0.0
    }
}

/// An unchanged price counts as positive so the indicator does not flicker.
pub fn is_positive(old: f64, new: f64) -> bool {
    new >= old
}

/// Above this, 4-decimal rounding is a no-op and scaling by 10^4 could
/// overflow to infinity.
const ROUNDING_LIMIT: f64 = 1e15;

/// Rounds to 4 decimals and floors at zero (negative zero included).
/// There is no upper clamp: huge finite prices pass through as they are.
pub fn sanitize_price(raw: f64) -> f64 {
    if !raw.is_finite() || raw <= 0.0 {
        return 0.0;
    }
    if raw >= ROUNDING_LIMIT {
        return raw;
    }
    let rounded = (raw * 10_000.0).round() / 10_000.0;
    if rounded > 0.0 {
        rounded
    } else {
        0.0
    }
}

/// Moves the session to `new_price`: updates the price, the chart window and
/// the change indicators.
pub fn apply_price(state: &mut GameState, new_price: f64) -> PriceMove {
    let old = state.price;
    let price_move = PriceMove {
        old,
        new: new_price,
        percent_change: percent_change(old, new_price),
        positive: is_positive(old, new_price),
    };

    state.price = new_price;
    state.price_history.push(new_price);
    state.price_change_percent = price_move.percent_change;
    state.is_price_positive = price_move.positive;

    log::info!(
        "Price change: {:.2}% (from ${:.4} to ${:.4})",
        price_move.percent_change,
        old,
        new_price
    );

    price_move
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::game_state::PRICE_HISTORY_CAPACITY;

    #[test]
    fn percent_change_guards_zero_base() {
        assert_eq!(percent_change(0.0, 5.0), 0.0);
        assert_eq!(percent_change(0.01, 0.02), 100.0);
        assert_eq!(percent_change(0.02, 0.01), -50.0);
    }

    #[test]
    fn ties_are_positive() {
        assert!(is_positive(0.01, 0.01));
        assert!(is_positive(0.01, 0.02));
        assert!(!is_positive(0.02, 0.01));
    }

    #[test]
    fn sanitize_rounds_and_clamps() {
        assert_eq!(sanitize_price(0.123456), 0.1235);
        assert_eq!(sanitize_price(-5.0), 0.0);
        assert_eq!(sanitize_price(-0.00001), 0.0);
        assert!(sanitize_price(-0.00001).is_sign_positive());
        assert_eq!(sanitize_price(12_345.0), 12_345.0);
    }

    #[test]
    fn huge_finite_prices_pass_through() {
        assert_eq!(sanitize_price(1e305), 1e305);
        assert_eq!(sanitize_price(f64::MAX), f64::MAX);
        assert_eq!(sanitize_price(f64::INFINITY), 0.0);
        assert_eq!(sanitize_price(f64::NAN), 0.0);
    }

    #[test]
    fn apply_price_updates_chart_and_indicators() {
        let mut state = GameState::new("PEPE", 0.01);
        let mv = apply_price(&mut state, 0.005);
        assert_eq!(mv.percent_change, -50.0);
        assert!(!state.is_price_positive);
        assert_eq!(state.price, 0.005);
        assert_eq!(state.price_history.last_n(2), vec![0.01, 0.005]);
    }

    #[test]
    fn chart_window_stays_bounded() {
        let mut state = GameState::new("PEPE", 0.01);
        for i in 0..50 {
            apply_price(&mut state, 0.01 + i as f64);
        }
        assert_eq!(state.price_history.len(), PRICE_HISTORY_CAPACITY);
    }
}
