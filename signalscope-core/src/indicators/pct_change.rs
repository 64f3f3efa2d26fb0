//! Bar-over-bar percent change of close or volume, as a fraction.
//!
//! pct[t] = x[t] / x[t-1] - 1. Undefined (NaN) at bar 0 and wherever the
//! previous value is zero or NaN.
//! Lookback: 1.

use super::Indicator;
use crate::domain::PriceBar;

/// Bar field a percent-change series is computed over.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PriceField {
    Close,
    Volume,
}

impl PriceField {
    fn extract(self, bar: &PriceBar) -> f64 {
        match self {
            PriceField::Close => bar.close,
            PriceField::Volume => bar.volume,
        }
    }
}

#[derive(Debug, Clone)]
pub struct PctChange {
    field: PriceField,
    name: String,
}

impl PctChange {
    pub fn new(name: impl Into<String>, field: PriceField) -> Self {
        Self {
            field,
            name: name.into(),
        }
    }
}

impl Indicator for PctChange {
    fn name(&self) -> &str {
        &self.name
    }

    fn lookback(&self) -> usize {
        1
    }

    fn compute(&self, bars: &[PriceBar]) -> Vec<f64> {
        let values: Vec<f64> = bars.iter().map(|b| self.field.extract(b)).collect();
        pct_change_of_series(&values)
    }
}

pub fn pct_change_of_series(values: &[f64]) -> Vec<f64> {
    let mut result = vec![f64::NAN; values.len()];
    for i in 1..values.len() {
        let prev = values[i - 1];
        let curr = values[i];
        if prev.is_nan() || curr.is_nan() || prev == 0.0 {
            continue;
        }
        result[i] = curr / prev - 1.0;
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::indicators::{assert_approx, make_bars, DEFAULT_EPSILON};

    #[test]
    fn close_pct_change() {
        let bars = make_bars(&[100.0, 110.0, 99.0]);
        let result = PctChange::new("returns", PriceField::Close).compute(&bars);
        assert!(result[0].is_nan());
        assert_approx(result[1], 0.10, DEFAULT_EPSILON);
        assert_approx(result[2], -0.10, DEFAULT_EPSILON);
    }

    #[test]
    fn volume_pct_change() {
        let mut bars = make_bars(&[100.0, 100.0, 100.0]);
        bars[0].volume = 200.0;
        bars[1].volume = 300.0;
        bars[2].volume = 150.0;
        let result = PctChange::new("volume_change", PriceField::Volume).compute(&bars);
        assert_approx(result[1], 0.5, DEFAULT_EPSILON);
        assert_approx(result[2], -0.5, DEFAULT_EPSILON);
    }

    #[test]
    fn zero_previous_value_is_undefined() {
        let result = pct_change_of_series(&[0.0, 5.0, 10.0]);
        assert!(result[1].is_nan());
        assert_approx(result[2], 1.0, DEFAULT_EPSILON);
    }
}
