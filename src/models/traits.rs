use gbdt::decision_tree::{Data, DataVec};
use ndarray::{Array1, Array2};

use crate::config::ModelParams;
use crate::error::{KitError, Result};

/// A regression model: `fit` once, then `predict` any number of times.
///
/// Feature columns are positional. `predict` fails with
/// [`KitError::FeatureMismatch`] when the matrix width differs from the one
/// seen at `fit`; keeping the column order stable is the feature
/// extractor's job.
pub trait Regressor {
    fn fit(&mut self, features: &Array2<f64>, target: &Array1<f64>) -> Result<()>;

    /// One prediction per input row.
    fn predict(&self, features: &Array2<f64>) -> Result<Array1<f64>>;

    fn name(&self) -> &'static str;
}

pub trait ModelFactory: Sized {
    fn create(params: &ModelParams) -> Self;
}

pub(crate) fn check_training_input(features: &Array2<f64>, target: &Array1<f64>) -> Result<()> {
    if features.nrows() != target.len() {
        return Err(KitError::InvalidInput(format!(
            "{} feature rows but {} targets",
            features.nrows(),
            target.len()
        )));
    }
    if features.nrows() == 0 {
        return Err(KitError::InvalidInput("cannot fit on zero rows".to_string()));
    }
    Ok(())
}

pub(crate) fn check_predict_input(expected: usize, features: &Array2<f64>) -> Result<()> {
    if features.ncols() != expected {
        return Err(KitError::FeatureMismatch {
            expected,
            actual: features.ncols(),
        });
    }
    Ok(())
}

pub trait IntoDataVec {
    /// Row-major conversion to the `gbdt` input format; targets become labels.
    fn to_data_vec(&self, target: Option<&Array1<f64>>) -> DataVec;
}

impl IntoDataVec for Array2<f64> {
    fn to_data_vec(&self, target: Option<&Array1<f64>>) -> DataVec {
        self.rows()
            .into_iter()
            .enumerate()
            .map(|(row_idx, row)| {
                let feature: Vec<f32> = row.iter().map(|&v| v as f32).collect();
                match target {
                    Some(y) => Data::new_training_data(feature, 1.0, y[row_idx] as f32, None),
                    None => Data::new_test_data(feature, None),
                }
            })
            .collect()
    }
}
