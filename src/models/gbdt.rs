use super::traits::{check_predict_input, check_training_input, IntoDataVec, ModelFactory, Regressor};
use crate::config::ModelParams;
use crate::error::{KitError, Result};
use gbdt::{config::Config as GBDTConfig, gradient_boost::GBDT};
use ndarray::{Array1, Array2};
use tracing::debug;

pub struct GBDTModel {
    model: Option<GBDT>,
    config: GBDTConfig,
    n_features: usize,
}

impl GBDTModel {
    pub fn new(iterations: usize, max_depth: u32, shrinkage: f32) -> Self {
        let mut config = GBDTConfig::new();
        config.set_iterations(iterations);
        config.set_max_depth(max_depth);
        config.set_shrinkage(shrinkage);
        config.set_loss("SquaredError");
        config.set_debug(false);
        config.set_data_sample_ratio(1.0);
        config.set_feature_sample_ratio(1.0);
        config.set_training_optimization_level(2);

        Self {
            model: None,
            config,
            n_features: 0,
        }
    }
}

impl ModelFactory for GBDTModel {
    fn create(params: &ModelParams) -> Self {
        let max_depth = if params.max_depth > 0 { params.max_depth as u32 } else { 6 };
        Self::new(params.boosting_iterations, max_depth, params.learning_rate as f32)
    }
}

impl Regressor for GBDTModel {
    fn fit(&mut self, features: &Array2<f64>, target: &Array1<f64>) -> Result<()> {
        check_training_input(features, target)?;
        if features.ncols() == 0 {
            return Err(KitError::InvalidInput("gradient boosting needs at least one feature".to_string()));
        }

        self.n_features = features.ncols();
        self.config.set_feature_size(self.n_features);
        let mut train_data = features.to_data_vec(Some(target));

        debug!(rows = train_data.len(), cols = self.n_features, "Boosting");
        let mut gbdt = GBDT::new(&self.config);
        gbdt.fit(&mut train_data);

        self.model = Some(gbdt);
        Ok(())
    }

    fn predict(&self, features: &Array2<f64>) -> Result<Array1<f64>> {
        let model = self.model.as_ref().ok_or(KitError::NotFitted("GBDTModel"))?;
        check_predict_input(self.n_features, features)?;

        let test_data = features.to_data_vec(None);
        let predictions = model.predict(&test_data);
        Ok(predictions.into_iter().map(f64::from).collect())
    }

    fn name(&self) -> &'static str {
        "gradient_boosting"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    fn test_learns_a_step() {
        let x = Array2::from_shape_fn((40, 1), |(i, _)| i as f64);
        let y = x.column(0).mapv(|v| if v < 20.0 { 1.0 } else { 3.0 });

        let mut model = GBDTModel::new(50, 3, 0.3);
        model.fit(&x, &y).unwrap();
        let pred = model.predict(&array![[2.0], [35.0]]).unwrap();

        assert_eq!(pred.len(), 2);
        assert!(pred[0] < pred[1]);
        assert!((pred[0] - 1.0).abs() < 0.5);
        assert!((pred[1] - 3.0).abs() < 0.5);
    }

    #[test]
    fn test_shape_checks() {
        let model = GBDTModel::new(5, 2, 0.1);
        assert!(matches!(model.predict(&array![[1.0]]), Err(KitError::NotFitted(_))));

        let mut model = GBDTModel::new(5, 2, 0.1);
        model.fit(&array![[1.0, 0.0], [2.0, 1.0]], &array![1.0, 2.0]).unwrap();
        assert!(matches!(
            model.predict(&array![[1.0]]),
            Err(KitError::FeatureMismatch { expected: 2, actual: 1 })
        ));
    }
}
