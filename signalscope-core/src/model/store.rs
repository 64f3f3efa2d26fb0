//! Classifier artifacts on disk.
//!
//! An artifact is a JSON document wrapping the serialized model with a schema
//! version, the feature names it was trained on and a BLAKE3 fingerprint of
//! the model payload. Loading checks all three before handing out a
//! classifier.

use std::fs;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info};

use super::forest::RandomForest;
use super::rules::RuleClassifier;
use crate::error::PipelineError;
use crate::predictor::{validate_feature_schema, Classifier};

pub const ARTIFACT_SCHEMA_VERSION: u32 = 1;

#[derive(Debug, Error)]
pub enum ModelStoreError {
    #[error("model artifact not found at {0}")]
    NotFound(PathBuf),

    #[error("model artifact I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("model artifact is not valid JSON: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("incompatible model artifact: {0}")]
    Incompatible(String),
}

impl From<ModelStoreError> for PipelineError {
    fn from(e: ModelStoreError) -> Self {
        PipelineError::ModelUnavailable(e.to_string())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "params", rename_all = "snake_case")]
pub enum ModelKind {
    RandomForest(RandomForest),
    Rules(RuleClassifier),
}

impl ModelKind {
    pub fn into_classifier(self) -> Box<dyn Classifier> {
        match self {
            ModelKind::RandomForest(forest) => Box::new(forest),
            ModelKind::Rules(rules) => Box::new(rules),
        }
    }

    fn classifier(&self) -> &dyn Classifier {
        match self {
            ModelKind::RandomForest(forest) => forest,
            ModelKind::Rules(rules) => rules,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelArtifact {
    pub schema_version: u32,
    pub created_at: DateTime<Utc>,
    pub feature_names: Vec<String>,
    /// BLAKE3 hex digest of the serialized `model`.
    pub fingerprint: String,
    pub model: ModelKind,
}

impl ModelArtifact {
    pub fn new(model: ModelKind) -> Result<Self, ModelStoreError> {
        let fingerprint = fingerprint(&model)?;
        Ok(Self {
            schema_version: ARTIFACT_SCHEMA_VERSION,
            created_at: Utc::now(),
            feature_names: model.classifier().feature_names().to_vec(),
            fingerprint,
            model,
        })
    }

    /// Check version, fingerprint and feature schema.
    pub fn verify(&self) -> Result<(), ModelStoreError> {
        if self.schema_version != ARTIFACT_SCHEMA_VERSION {
            return Err(ModelStoreError::Incompatible(format!(
                "schema version {} (expected {ARTIFACT_SCHEMA_VERSION})",
                self.schema_version
            )));
        }
        let actual = fingerprint(&self.model)?;
        if actual != self.fingerprint {
            return Err(ModelStoreError::Incompatible(format!(
                "fingerprint mismatch (stored {}, computed {actual})",
                self.fingerprint
            )));
        }
        if self.model.classifier().feature_names() != self.feature_names.as_slice() {
            return Err(ModelStoreError::Incompatible(
                "declared feature names differ from the model's".to_string(),
            ));
        }
        validate_feature_schema(&self.feature_names)
            .map_err(|e| ModelStoreError::Incompatible(e.to_string()))
    }
}

fn fingerprint(model: &ModelKind) -> Result<String, ModelStoreError> {
    let payload = serde_json::to_vec(model)?;
    Ok(blake3::hash(&payload).to_hex().to_string())
}

/// Reads and writes model artifacts.
pub struct ModelStore;

impl ModelStore {
    /// Write an artifact atomically (`.tmp` then rename).
    pub fn save(path: &Path, model: ModelKind) -> Result<ModelArtifact, ModelStoreError> {
        let artifact = ModelArtifact::new(model)?;
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }
        let tmp = path.with_extension("json.tmp");
        fs::write(&tmp, serde_json::to_vec_pretty(&artifact)?)?;
        fs::rename(&tmp, path)?;
        info!(path = %path.display(), fingerprint = %artifact.fingerprint, "model saved");
        Ok(artifact)
    }

    pub fn load_artifact(path: &Path) -> Result<ModelArtifact, ModelStoreError> {
        if !path.exists() {
            return Err(ModelStoreError::NotFound(path.to_path_buf()));
        }
        let bytes = fs::read(path)?;
        let artifact: ModelArtifact = serde_json::from_slice(&bytes)?;
        artifact.verify()?;
        debug!(path = %path.display(), created_at = %artifact.created_at, "model loaded");
        Ok(artifact)
    }

    /// Load a verified classifier.
    pub fn load(path: &Path) -> Result<Box<dyn Classifier>, ModelStoreError> {
        Ok(Self::load_artifact(path)?.model.into_classifier())
    }
}
