//! Property tests for pipeline invariants.
//!
//! Uses proptest to verify:
//! 1. RSI stays within [0, 100]
//! 2. Bollinger bands stay ordered
//! 3. Labels drop exactly the last bar
//! 4. Backtest equity starts at 1 and trade counts are bounded
//! 5. Feature output length equals input length minus warm-up

use chrono::NaiveDate;
use proptest::prelude::*;
use signalscope_core::backtest::run_backtest;
use signalscope_core::domain::{PriceBar, PriceSeries, Signal};
use signalscope_core::features::generate_features;
use signalscope_core::indicators::rsi_of_series;
use signalscope_core::labels::{label_closes, label_rows};

// ── Strategies (proptest) ────────────────────────────────────────────

fn arb_closes(min: usize, max: usize) -> impl Strategy<Value = Vec<f64>> {
    prop::collection::vec(1.0..500.0_f64, min..max)
}

fn arb_signal() -> impl Strategy<Value = Signal> {
    prop_oneof![Just(Signal::Sell), Just(Signal::Hold), Just(Signal::Buy)]
}

fn to_series(closes: &[f64]) -> PriceSeries {
    let base = NaiveDate::from_ymd_opt(2020, 1, 1).unwrap();
    let bars = closes
        .iter()
        .enumerate()
        .map(|(i, &c)| PriceBar {
            date: base + chrono::Duration::days(i as i64),
            open: c,
            high: c * 1.01,
            low: c * 0.99,
            close: c,
            volume: 1000.0 + i as f64,
        })
        .collect();
    PriceSeries::new("PROP", bars).unwrap()
}

proptest! {
    #[test]
    fn rsi_is_bounded(closes in arb_closes(15, 120)) {
        for v in rsi_of_series(&closes, 14) {
            if !v.is_nan() {
                prop_assert!((0.0..=100.0).contains(&v), "rsi {}", v);
            }
        }
    }

    #[test]
    fn bands_are_ordered_and_length_is_input_minus_warmup(closes in arb_closes(26, 150)) {
        let set = generate_features(&to_series(&closes)).unwrap();
        prop_assert_eq!(set.len(), closes.len() - 19);
        for row in &set.rows {
            prop_assert!(row.features.bb_upper >= row.features.bb_middle);
            prop_assert!(row.features.bb_middle >= row.features.bb_lower);
        }
    }

    #[test]
    fn labels_drop_exactly_one(closes in arb_closes(0, 80)) {
        prop_assert_eq!(label_closes(&closes).len(), closes.len().saturating_sub(1));
    }

    #[test]
    fn labeled_rows_drop_exactly_one(closes in arb_closes(20, 80)) {
        let set = generate_features(&to_series(&closes)).unwrap();
        prop_assert_eq!(label_rows(&set.rows).len(), set.len() - 1);
    }

    #[test]
    fn backtest_invariants(
        pairs in prop::collection::vec((1.0..500.0_f64, arb_signal()), 1..100)
    ) {
        let (closes, signals): (Vec<f64>, Vec<Signal>) = pairs.into_iter().unzip();
        let r = run_backtest(&closes, &signals).unwrap();
        prop_assert_eq!(r.cumulative_strategy[0], 1.0);
        prop_assert_eq!(r.cumulative_market[0], 1.0);
        prop_assert_eq!(r.strategy_returns.len(), closes.len());
        prop_assert!(r.trades <= closes.len());
        for t in 1..closes.len() {
            prop_assert_eq!(r.positions[t].is_long(), signals[t - 1] == Signal::Buy);
        }
    }

    #[test]
    fn all_hold_is_zero(closes in arb_closes(1, 60)) {
        let r = run_backtest(&closes, &vec![Signal::Hold; closes.len()]).unwrap();
        prop_assert_eq!(r.total_return, 0.0);
        prop_assert_eq!(r.trades, 0);
    }
}
