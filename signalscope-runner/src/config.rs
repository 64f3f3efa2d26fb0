//! Application configuration loaded from `signalscope.toml`.
//!
//! Every section and key is optional; missing values fall back to the
//! defaults below. CLI flags override whatever the file sets.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use signalscope_core::model::ForestConfig;
use thiserror::Error;

/// Default config file name looked up in the working directory.
pub const DEFAULT_CONFIG_FILE: &str = "signalscope.toml";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file '{path}': {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("invalid config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("invalid config value: {0}")]
    Invalid(String),
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub data: DataConfig,
    pub model: ModelConfig,
    pub training: TrainingConfig,
    pub analysis: AnalysisConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DataConfig {
    pub cache_dir: PathBuf,
    /// Never touch the network.
    pub offline: bool,
    /// Fall back to generated bars when real data is unavailable.
    pub synthetic: bool,
}

impl Default for DataConfig {
    fn default() -> Self {
        Self {
            cache_dir: PathBuf::from("data"),
            offline: false,
            synthetic: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ModelConfig {
    pub path: PathBuf,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from("models/global_model.json"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrainingConfig {
    pub symbols: Vec<String>,
    pub lookback_days: i64,
    pub n_trees: usize,
    pub max_depth: usize,
    pub min_samples_split: usize,
    pub seed: u64,
}

impl Default for TrainingConfig {
    fn default() -> Self {
        Self {
            symbols: ["AAPL", "MSFT", "GOOG", "AMZN", "TSLA", "INFY.NS", "TCS.NS"]
                .into_iter()
                .map(String::from)
                .collect(),
            lookback_days: 182,
            n_trees: 100,
            max_depth: 5,
            min_samples_split: 2,
            seed: 42,
        }
    }
}

impl TrainingConfig {
    pub fn forest_config(&self) -> ForestConfig {
        ForestConfig {
            n_trees: self.n_trees,
            max_depth: self.max_depth,
            min_samples_split: self.min_samples_split,
            seed: self.seed,
            ..ForestConfig::default()
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisConfig {
    pub symbol: String,
    pub lookback_days: i64,
    pub output_dir: PathBuf,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            symbol: "AAPL".into(),
            lookback_days: 365,
            output_dir: PathBuf::from("results"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// `tracing` filter directive, e.g. `info` or `signalscope_core=debug`.
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".into(),
        }
    }
}

impl AppConfig {
    pub fn from_toml(toml_str: &str) -> Result<Self, ConfigError> {
        let config: AppConfig = toml::from_str(toml_str)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml(&content)
    }

    /// Load `path` if given, else `signalscope.toml` if it exists, else defaults.
    pub fn load_or_default(path: Option<&Path>) -> Result<Self, ConfigError> {
        match path {
            Some(p) => Self::from_file(p),
            None => {
                let default_path = Path::new(DEFAULT_CONFIG_FILE);
                if default_path.exists() {
                    Self::from_file(default_path)
                } else {
                    Ok(Self::default())
                }
            }
        }
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.training.lookback_days <= 0 {
            return Err(ConfigError::Invalid(format!(
                "training.lookback_days must be positive, got {}",
                self.training.lookback_days
            )));
        }
        if self.analysis.lookback_days <= 0 {
            return Err(ConfigError::Invalid(format!(
                "analysis.lookback_days must be positive, got {}",
                self.analysis.lookback_days
            )));
        }
        if self.training.n_trees == 0 {
            return Err(ConfigError::Invalid("training.n_trees must be at least 1".into()));
        }
        if self.training.min_samples_split < 2 {
            return Err(ConfigError::Invalid(format!(
                "training.min_samples_split must be at least 2, got {}",
                self.training.min_samples_split
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_file_gives_defaults() {
        let config = AppConfig::from_toml("").unwrap();
        assert_eq!(config, AppConfig::default());
        assert_eq!(config.training.symbols.len(), 7);
        assert_eq!(config.training.lookback_days, 182);
        assert_eq!(config.analysis.symbol, "AAPL");
        assert_eq!(config.model.path, PathBuf::from("models/global_model.json"));
        assert_eq!(config.logging.level, "info");
    }

    #[test]
    fn partial_sections_keep_other_defaults() {
        let config = AppConfig::from_toml(
            r#"
[training]
symbols = ["SPY"]
n_trees = 10

[analysis]
symbol = "QQQ"
"#,
        )
        .unwrap();
        assert_eq!(config.training.symbols, vec!["SPY".to_string()]);
        assert_eq!(config.training.n_trees, 10);
        assert_eq!(config.training.max_depth, 5);
        assert_eq!(config.analysis.symbol, "QQQ");
        assert_eq!(config.analysis.lookback_days, 365);
        assert_eq!(config.data.cache_dir, PathBuf::from("data"));
    }

    #[test]
    fn forest_config_carries_training_values() {
        let mut training = TrainingConfig::default();
        training.n_trees = 7;
        training.seed = 9;
        let forest = training.forest_config();
        assert_eq!(forest.n_trees, 7);
        assert_eq!(forest.seed, 9);
        assert!(forest.bootstrap);
    }

    #[test]
    fn invalid_values_are_rejected() {
        let err = AppConfig::from_toml("[training]\nn_trees = 0\n").unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));

        let err = AppConfig::from_toml("[analysis]\nlookback_days = -3\n").unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));
    }

    #[test]
    fn malformed_toml_is_a_parse_error() {
        let err = AppConfig::from_toml("[training\n").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn missing_file_is_a_read_error() {
        let err = AppConfig::from_file(Path::new("/definitely/not/here.toml")).unwrap_err();
        assert!(matches!(err, ConfigError::Read { .. }));
    }
}
