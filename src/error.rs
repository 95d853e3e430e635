use polars::error::PolarsError;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, KitError>;

#[derive(Debug, Error)]
pub enum KitError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Data loading error: {0}")]
    Polars(#[from] PolarsError),

    #[error("Config error: {0}")]
    Config(#[from] toml::de::Error),

    #[error("Missing field: {0}")]
    MissingField(String),

    #[error("{0} used before fit")]
    NotFitted(&'static str),

    #[error("Feature mismatch: fitted on {expected} columns, got {actual}")]
    FeatureMismatch { expected: usize, actual: usize },

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Training error: {0}")]
    Training(String),
}
