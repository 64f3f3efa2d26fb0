//! Threshold classifier on RSI and the MACD crossover.
//!
//! Needs no training artifact, so analysis can run before a forest exists.

use serde::{Deserialize, Serialize};

use crate::predictor::{standard_feature_names, Classifier};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RuleClassifier {
    pub oversold: f64,
    pub overbought: f64,
    #[serde(skip, default = "standard_feature_names")]
    feature_names: Vec<String>,
}

impl RuleClassifier {
    pub fn new(oversold: f64, overbought: f64) -> Self {
        Self {
            oversold,
            overbought,
            feature_names: standard_feature_names(),
        }
    }

    fn feature(&self, features: &[f64], name: &str) -> f64 {
        self.feature_names
            .iter()
            .position(|n| n == name)
            .and_then(|i| features.get(i).copied())
            .unwrap_or(f64::NAN)
    }
}

impl Default for RuleClassifier {
    fn default() -> Self {
        Self::new(30.0, 70.0)
    }
}

impl Classifier for RuleClassifier {
    fn name(&self) -> &str {
        "rsi_macd_rules"
    }

    fn feature_names(&self) -> &[String] {
        &self.feature_names
    }

    /// Oversold RSI buys, overbought RSI sells; otherwise follow the MACD
    /// crossover, holding when the lines are equal.
    fn predict(&self, features: &[f64]) -> i64 {
        let rsi = self.feature(features, "rsi");
        let macd = self.feature(features, "macd");
        let signal = self.feature(features, "macd_signal");

        if rsi <= self.oversold {
            1
        } else if rsi >= self.overbought {
            -1
        } else if macd > signal {
            1
        } else if macd < signal {
            -1
        } else {
            0
        }
    }
}
