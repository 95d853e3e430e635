//! Problem definition: what is predicted, how it is split, how it is scored.

use std::path::Path;

use crate::cross_validation::{CvSplit, ShuffleSplit};
use crate::data_loader::{DataLoader, Dataset};
use crate::error::Result;
use crate::metrics::ScoreType;

pub const PROBLEM_TITLE: &str = "ICU length-of-stay regression";

/// Length-of-stay, the regression target.
pub const TARGET_COLUMN: &str = "los";

pub fn score_types() -> [ScoreType; 3] {
    ScoreType::ALL
}

/// 7 shuffled splits holding out 20% of the rows each, seeded with 57.
pub fn get_cv(n_samples: usize) -> Result<Vec<CvSplit>> {
    ShuffleSplit::default().split(n_samples)
}

pub fn get_train_data<P: AsRef<Path>>(path: P, test_mode: bool) -> Result<Dataset> {
    DataLoader::new(path, test_mode).get_train_data()
}

pub fn get_test_data<P: AsRef<Path>>(path: P, test_mode: bool) -> Result<Dataset> {
    DataLoader::new(path, test_mode).get_test_data()
}
