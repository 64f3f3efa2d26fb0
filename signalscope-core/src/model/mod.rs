//! Classifiers: a random forest trained on labelled features, a rule-based
//! fallback, and the on-disk artifact store.

pub mod dataset;
pub mod forest;
pub mod rules;
pub mod store;
pub mod tree;

pub use dataset::TrainingSet;
pub use forest::{ForestConfig, RandomForest};
pub use rules::RuleClassifier;
pub use store::{ModelArtifact, ModelKind, ModelStore, ModelStoreError, ARTIFACT_SCHEMA_VERSION};
pub use tree::{DecisionTree, Node, TreeConfig};
