//! Label generator: forward-looking ground truth for supervised training.
//!
//! Each bar is labelled by the sign of the next bar's close change. The
//! final bar has no successor and is dropped. Labels look one bar ahead by
//! construction, so they are used for training only and never fed back into
//! the feature engine.

use serde::Serialize;

use crate::domain::Label;
use crate::features::FeatureRow;

/// A feature row paired with the next bar's outcome.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct LabeledRow {
    pub row: FeatureRow,
    /// Close of the following bar.
    pub future_close: f64,
    /// `future_close - close`.
    pub price_diff: f64,
    pub label: Label,
}

/// Label every row except the last.
pub fn label_rows(rows: &[FeatureRow]) -> Vec<LabeledRow> {
    rows.windows(2)
        .map(|pair| {
            let (row, next) = (pair[0], pair[1]);
            let price_diff = next.bar.close - row.bar.close;
            LabeledRow {
                row,
                future_close: next.bar.close,
                price_diff,
                label: Label::from_change(price_diff),
            }
        })
        .collect()
}

/// Label a bare close sequence. Length is `closes.len() - 1` (0 for empty input).
pub fn label_closes(closes: &[f64]) -> Vec<Label> {
    closes
        .windows(2)
        .map(|w| Label::from_change(w[1] - w[0]))
        .collect()
}
