pub mod config;
pub mod cross_validation;
pub mod data_loader;
pub mod encoder;
pub mod error;
pub mod feature_engineering;
pub mod metrics;
pub mod models;
pub mod problem;
pub mod workflow;

pub use config::Config;
pub use data_loader::{DataLoader, Dataset};
pub use error::{KitError, Result};
pub use feature_engineering::{AdmissionTypeFeatureExtractor, FeatureExtractor, NumericFeatureExtractor};
pub use models::{GBDTModel, LinearRegression, RandomForestRegressor, Regressor};
pub use workflow::Submission;
