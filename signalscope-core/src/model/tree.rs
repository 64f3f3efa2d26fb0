//! Gini classification tree over the three signal classes.

use rand::seq::SliceRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};

use super::dataset::{majority, TrainingSet};
use crate::domain::Signal;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TreeConfig {
    pub max_depth: usize,
    pub min_samples_split: usize,
    /// Features considered at each split. `None` considers all of them.
    pub max_features: Option<usize>,
}

impl Default for TreeConfig {
    fn default() -> Self {
        Self {
            max_depth: 5,
            min_samples_split: 2,
            max_features: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Node {
    Leaf {
        class: Signal,
        counts: [usize; 3],
    },
    Split {
        feature: usize,
        threshold: f64,
        left: Box<Node>,
        right: Box<Node>,
    },
}

impl Node {
    pub fn depth(&self) -> usize {
        match self {
            Node::Leaf { .. } => 0,
            Node::Split { left, right, .. } => 1 + left.depth().max(right.depth()),
        }
    }

    pub fn n_leaves(&self) -> usize {
        match self {
            Node::Leaf { .. } => 1,
            Node::Split { left, right, .. } => left.n_leaves() + right.n_leaves(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DecisionTree {
    root: Node,
}

struct Split {
    feature: usize,
    threshold: f64,
    gain: f64,
}

impl DecisionTree {
    /// Fit on the samples at `indices` (duplicates allowed, as for a bootstrap).
    pub fn fit<R: Rng>(
        data: &TrainingSet,
        indices: &[usize],
        config: &TreeConfig,
        rng: &mut R,
    ) -> Self {
        let root = build(data, indices.to_vec(), 0, config, rng);
        Self { root }
    }

    pub fn root(&self) -> &Node {
        &self.root
    }

    pub fn predict(&self, features: &[f64]) -> Signal {
        let mut node = &self.root;
        loop {
            match node {
                Node::Leaf { class, .. } => return *class,
                Node::Split {
                    feature,
                    threshold,
                    left,
                    right,
                } => {
                    let value = features.get(*feature).copied().unwrap_or(f64::NAN);
                    node = if value <= *threshold { left } else { right };
                }
            }
        }
    }
}

fn counts_of(data: &TrainingSet, indices: &[usize]) -> [usize; 3] {
    let mut counts = [0; 3];
    for &i in indices {
        counts[data.labels[i].index()] += 1;
    }
    counts
}

fn gini(counts: &[usize; 3], total: usize) -> f64 {
    if total == 0 {
        return 0.0;
    }
    let n = total as f64;
    1.0 - counts.iter().map(|&c| (c as f64 / n).powi(2)).sum::<f64>()
}

fn leaf(counts: [usize; 3]) -> Node {
    Node::Leaf {
        class: majority(&counts),
        counts,
    }
}

fn build<R: Rng>(
    data: &TrainingSet,
    indices: Vec<usize>,
    depth: usize,
    config: &TreeConfig,
    rng: &mut R,
) -> Node {
    let counts = counts_of(data, &indices);
    let impurity = gini(&counts, indices.len());
    if depth >= config.max_depth || indices.len() < config.min_samples_split || impurity <= 0.0 {
        return leaf(counts);
    }

    let Some(split) = best_split(data, &indices, &counts, impurity, config, rng) else {
        return leaf(counts);
    };

    let (left, right): (Vec<usize>, Vec<usize>) = indices
        .into_iter()
        .partition(|&i| data.features[i][split.feature] <= split.threshold);

    Node::Split {
        feature: split.feature,
        threshold: split.threshold,
        left: Box::new(build(data, left, depth + 1, config, rng)),
        right: Box::new(build(data, right, depth + 1, config, rng)),
    }
}

/// Sweep each candidate feature in sorted order, moving one sample at a time
/// from the right partition to the left.
fn best_split<R: Rng>(
    data: &TrainingSet,
    indices: &[usize],
    parent_counts: &[usize; 3],
    parent_impurity: f64,
    config: &TreeConfig,
    rng: &mut R,
) -> Option<Split> {
    let n_features = data.n_features();
    let mut candidates: Vec<usize> = (0..n_features).collect();
    candidates.shuffle(rng);
    candidates.truncate(config.max_features.unwrap_or(n_features).clamp(1, n_features.max(1)));

    let n = indices.len();
    let mut best: Option<Split> = None;

    for feature in candidates {
        let mut sorted: Vec<(f64, usize)> = indices
            .iter()
            .map(|&i| (data.features[i][feature], data.labels[i].index()))
            .collect();
        sorted.sort_by(|a, b| a.0.total_cmp(&b.0));

        let mut left = [0usize; 3];
        let mut right = *parent_counts;
        for k in 0..n - 1 {
            let (value, class) = sorted[k];
            left[class] += 1;
            right[class] -= 1;

            let next = sorted[k + 1].0;
            if next <= value {
                continue;
            }
            let n_left = k + 1;
            let n_right = n - n_left;
            let weighted = (n_left as f64 * gini(&left, n_left)
                + n_right as f64 * gini(&right, n_right))
                / n as f64;
            let gain = parent_impurity - weighted;
            if gain > 1e-12 && best.as_ref().map_or(true, |b| gain > b.gain) {
                best = Some(Split {
                    feature,
                    threshold: value + (next - value) / 2.0,
                    gain,
                });
            }
        }
    }
    best
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn separable() -> TrainingSet {
        let mut set = TrainingSet::empty(vec!["x".into(), "noise".into()]);
        for i in 0..30 {
            let x = i as f64;
            let label = if x < 10.0 {
                Signal::Sell
            } else if x < 20.0 {
                Signal::Hold
            } else {
                Signal::Buy
            };
            set.push(vec![x, (i % 3) as f64], label);
        }
        set
    }

    fn all(set: &TrainingSet) -> Vec<usize> {
        (0..set.n_samples()).collect()
    }

    #[test]
    fn fits_separable_classes_exactly() {
        let set = separable();
        let tree = DecisionTree::fit(
            &set,
            &all(&set),
            &TreeConfig::default(),
            &mut StdRng::seed_from_u64(0),
        );
        for (x, label) in set.features.iter().zip(&set.labels) {
            assert_eq!(tree.predict(x), *label);
        }
        assert_eq!(tree.predict(&[-5.0, 0.0]), Signal::Sell);
        assert_eq!(tree.predict(&[100.0, 0.0]), Signal::Buy);
    }

    #[test]
    fn depth_is_bounded() {
        let set = separable();
        let config = TreeConfig {
            max_depth: 1,
            ..TreeConfig::default()
        };
        let tree = DecisionTree::fit(&set, &all(&set), &config, &mut StdRng::seed_from_u64(0));
        assert!(tree.root().depth() <= 1);
        assert!(tree.root().n_leaves() <= 2);
    }

    #[test]
    fn pure_node_is_a_leaf() {
        let mut set = TrainingSet::empty(vec!["x".into()]);
        for i in 0..5 {
            set.push(vec![i as f64], Signal::Hold);
        }
        let tree = DecisionTree::fit(
            &set,
            &all(&set),
            &TreeConfig::default(),
            &mut StdRng::seed_from_u64(0),
        );
        assert_eq!(
            tree.root(),
            &Node::Leaf {
                class: Signal::Hold,
                counts: [0, 5, 0]
            }
        );
    }

    #[test]
    fn constant_feature_cannot_split() {
        let mut set = TrainingSet::empty(vec!["x".into()]);
        set.push(vec![1.0], Signal::Buy);
        set.push(vec![1.0], Signal::Sell);
        let tree = DecisionTree::fit(
            &set,
            &all(&set),
            &TreeConfig::default(),
            &mut StdRng::seed_from_u64(0),
        );
        assert_eq!(tree.root().n_leaves(), 1);
        assert_eq!(tree.predict(&[1.0]), Signal::Sell);
    }

    #[test]
    fn gini_of_balanced_three_classes() {
        assert!((gini(&[1, 1, 1], 3) - 2.0 / 3.0).abs() < 1e-12);
        assert_eq!(gini(&[4, 0, 0], 4), 0.0);
        assert_eq!(gini(&[0, 0, 0], 0), 0.0);
    }
}
