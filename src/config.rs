use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

use crate::error::Result;

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Config {
    pub data_path: PathBuf,
    /// Truncate train and test data to their first 100 rows.
    pub test_mode: bool,
    pub submission: String,
    pub cv: CvParams,
    pub model_params: ModelParams,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            data_path: PathBuf::from("."),
            test_mode: false,
            submission: "starting_kit".to_string(),
            cv: CvParams::default(),
            model_params: ModelParams::default(),
        }
    }
}

impl AsRef<Path> for Config {
    fn as_ref(&self) -> &Path {
        self.data_path.as_ref()
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CvParams {
    pub n_splits: usize,
    pub test_size: f64,
    pub random_state: u64,
}

impl Default for CvParams {
    fn default() -> Self {
        Self {
            n_splits: 7,
            test_size: 0.2,
            random_state: 57,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ModelParams {
    pub n_estimators: usize,
    /// 0 means grow trees until leaves are pure.
    pub max_depth: usize,
    pub min_samples_leaf: usize,
    pub random_state: u64,
    pub learning_rate: f64,
    pub boosting_iterations: usize,
}

impl Default for ModelParams {
    fn default() -> Self {
        Self {
            n_estimators: 500,
            max_depth: 0,
            min_samples_leaf: 1,
            random_state: 0,
            learning_rate: 0.1,
            boosting_iterations: 100,
        }
    }
}

impl Config {
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let contents = fs::read_to_string(path)?;
        let config: Config = toml::from_str(&contents)?;
        Ok(config)
    }

    /// Like [`Config::load`], but a missing file yields the defaults.
    pub fn load_or_default<P: AsRef<Path>>(path: P) -> Result<Self> {
        if path.as_ref().exists() {
            Self::load(path)
        } else {
            Ok(Self::default())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_config_uses_defaults() {
        let config: Config = toml::from_str(
            r#"
            test_mode = true
            [cv]
            n_splits = 3
            "#,
        )
        .unwrap();
        assert!(config.test_mode);
        assert_eq!(config.cv.n_splits, 3);
        assert_eq!(config.cv.random_state, 57);
        assert_eq!(config.model_params.n_estimators, 500);
        assert_eq!(config.submission, "starting_kit");
    }

    #[test]
    fn test_missing_file_gives_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config::load_or_default(dir.path().join("absent.toml")).unwrap();
        assert!(!config.test_mode);
        assert_eq!(config.cv.test_size, 0.2);
    }

    #[test]
    fn test_malformed_config_is_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(&path, "test_mode = \"maybe\"").unwrap();
        assert!(Config::load(&path).is_err());
    }
}
