//! Random forest of gini trees, fitted in parallel.

use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::info;

use super::dataset::{majority, TrainingSet};
use super::tree::{DecisionTree, TreeConfig};
use crate::domain::Signal;
use crate::error::PipelineError;
use crate::predictor::Classifier;
use crate::rng::RngHierarchy;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ForestConfig {
    pub n_trees: usize,
    pub max_depth: usize,
    pub min_samples_split: usize,
    /// Features tried per split. `None` uses ceil(sqrt(n_features)).
    pub max_features: Option<usize>,
    pub bootstrap: bool,
    pub seed: u64,
}

impl Default for ForestConfig {
    fn default() -> Self {
        Self {
            n_trees: 100,
            max_depth: 5,
            min_samples_split: 2,
            max_features: None,
            bootstrap: true,
            seed: 42,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RandomForest {
    config: ForestConfig,
    feature_names: Vec<String>,
    trees: Vec<DecisionTree>,
}

impl RandomForest {
    /// A forest with no trees. Not ready for prediction.
    pub fn unfitted(config: ForestConfig) -> Self {
        Self {
            config,
            feature_names: Vec::new(),
            trees: Vec::new(),
        }
    }

    /// Fit `config.n_trees` trees. Tree `i` draws its bootstrap sample and
    /// feature subsets from its own sub-seed, so the result does not depend
    /// on the rayon thread count.
    pub fn fit(data: &TrainingSet, config: ForestConfig) -> Result<Self, PipelineError> {
        if data.is_empty() {
            return Err(PipelineError::DataUnavailable(
                "cannot fit a forest on an empty training set".to_string(),
            ));
        }
        if config.n_trees == 0 {
            return Err(PipelineError::ModelUnavailable(
                "forest needs at least one tree".to_string(),
            ));
        }

        let n_features = data.n_features();
        let tree_config = TreeConfig {
            max_depth: config.max_depth,
            min_samples_split: config.min_samples_split,
            max_features: Some(
                config
                    .max_features
                    .unwrap_or_else(|| (n_features as f64).sqrt().ceil() as usize),
            ),
        };
        let seeds = RngHierarchy::new(config.seed);
        let all: Vec<usize> = (0..data.n_samples()).collect();

        let trees: Vec<DecisionTree> = (0..config.n_trees)
            .into_par_iter()
            .map(|i| {
                let mut rng = seeds.rng_for("tree", i as u64);
                if config.bootstrap {
                    let sample = data.bootstrap_indices(&mut rng);
                    DecisionTree::fit(data, &sample, &tree_config, &mut rng)
                } else {
                    DecisionTree::fit(data, &all, &tree_config, &mut rng)
                }
            })
            .collect();

        info!(
            trees = trees.len(),
            samples = data.n_samples(),
            features = n_features,
            "random forest fitted"
        );

        Ok(Self {
            config,
            feature_names: data.feature_names.clone(),
            trees,
        })
    }

    pub fn config(&self) -> &ForestConfig {
        &self.config
    }

    pub fn n_trees(&self) -> usize {
        self.trees.len()
    }

    /// Vote count per class, indexed by [`Signal::index`].
    pub fn votes(&self, features: &[f64]) -> [usize; 3] {
        let mut votes = [0; 3];
        for tree in &self.trees {
            votes[tree.predict(features).index()] += 1;
        }
        votes
    }

    pub fn predict_signal(&self, features: &[f64]) -> Signal {
        majority(&self.votes(features))
    }

    /// Fraction of samples whose majority vote matches the label.
    pub fn accuracy(&self, data: &TrainingSet) -> f64 {
        if data.is_empty() {
            return 0.0;
        }
        let correct = data
            .features
            .iter()
            .zip(&data.labels)
            .filter(|(x, y)| self.predict_signal(x) == **y)
            .count();
        correct as f64 / data.n_samples() as f64
    }
}

impl Classifier for RandomForest {
    fn name(&self) -> &str {
        "random_forest"
    }

    fn feature_names(&self) -> &[String] {
        &self.feature_names
    }

    fn is_ready(&self) -> bool {
        !self.trees.is_empty()
    }

    fn predict(&self, features: &[f64]) -> i64 {
        i64::from(self.predict_signal(features).value())
    }
}
