//! Classifier capability consumed by the predictor.

use crate::features::FEATURE_NAMES;

/// An opaque classifier mapping a fixed-width feature vector to a class.
///
/// Implementations declare the feature names they were trained on; the
/// predictor binds columns by those names in that order before calling
/// [`Classifier::predict`]. The returned class is expected to be one of
/// {-1, 0, 1}; anything else is reported as an incompatible model.
pub trait Classifier: Send + Sync {
    /// Short identifier used in logs and reports.
    fn name(&self) -> &str;

    /// Feature names in the order `predict` expects its input.
    fn feature_names(&self) -> &[String];

    /// False until the model has been fitted or loaded.
    fn is_ready(&self) -> bool {
        true
    }

    fn predict(&self, features: &[f64]) -> i64;
}

/// The canonical feature order as owned strings, for classifiers trained on
/// the standard feature set.
pub fn standard_feature_names() -> Vec<String> {
    FEATURE_NAMES.iter().map(|s| s.to_string()).collect()
}
