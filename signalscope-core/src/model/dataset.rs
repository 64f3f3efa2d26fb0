//! Training matrix assembled from labelled feature rows.

use rand::Rng;
use serde::Serialize;

use crate::domain::{Label, Signal};
use crate::labels::LabeledRow;
use crate::predictor::standard_feature_names;

/// Dense feature matrix plus labels, columns named by `feature_names`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TrainingSet {
    pub feature_names: Vec<String>,
    pub features: Vec<Vec<f64>>,
    pub labels: Vec<Label>,
}

impl TrainingSet {
    pub fn empty(feature_names: Vec<String>) -> Self {
        Self {
            feature_names,
            features: Vec::new(),
            labels: Vec::new(),
        }
    }

    /// Standard feature columns from labelled rows. Rows with any
    /// non-finite value are skipped.
    pub fn from_labeled(rows: &[LabeledRow]) -> Self {
        let mut set = Self::empty(standard_feature_names());
        for row in rows {
            set.push(row.row.features.to_array().to_vec(), row.label);
        }
        set
    }

    /// Append one sample. Returns false if it was rejected as non-finite.
    pub fn push(&mut self, features: Vec<f64>, label: Label) -> bool {
        if features.len() != self.feature_names.len() || !features.iter().all(|v| v.is_finite()) {
            return false;
        }
        self.features.push(features);
        self.labels.push(label);
        true
    }

    /// Append every sample of `other`. Column names must match.
    pub fn extend(&mut self, other: TrainingSet) -> bool {
        if other.feature_names != self.feature_names {
            return false;
        }
        self.features.extend(other.features);
        self.labels.extend(other.labels);
        true
    }

    pub fn n_samples(&self) -> usize {
        self.labels.len()
    }

    pub fn n_features(&self) -> usize {
        self.feature_names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    /// Sample count per class, indexed by [`Signal::index`].
    pub fn class_counts(&self) -> [usize; 3] {
        let mut counts = [0; 3];
        for label in &self.labels {
            counts[label.index()] += 1;
        }
        counts
    }

    /// Indices drawn with replacement, same size as the set.
    pub fn bootstrap_indices<R: Rng>(&self, rng: &mut R) -> Vec<usize> {
        let n = self.n_samples();
        (0..n).map(|_| rng.gen_range(0..n)).collect()
    }
}

/// Class with the most votes; ties go to the lowest class index.
pub(crate) fn majority(counts: &[usize; 3]) -> Signal {
    let mut best = 0;
    for i in 1..3 {
        if counts[i] > counts[best] {
            best = i;
        }
    }
    Signal::from_index(best).unwrap_or(Signal::Hold)
}
