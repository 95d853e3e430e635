pub mod decision_tree;
pub mod gbdt;
pub mod linear;
pub mod random_forest;
pub mod traits;

pub use self::gbdt::GBDTModel;
pub use decision_tree::DecisionTree;
pub use linear::LinearRegression;
pub use random_forest::RandomForestRegressor;
pub use traits::{IntoDataVec, ModelFactory, Regressor};

use serde::Deserialize;
use std::str::FromStr;

use crate::config::ModelParams;
use crate::error::KitError;

/// The interchangeable regressors a submission can use.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RegressorKind {
    RandomForest,
    Linear,
    GradientBoosting,
}

impl RegressorKind {
    pub fn build(&self, params: &ModelParams) -> Box<dyn Regressor> {
        match self {
            Self::RandomForest => Box::new(RandomForestRegressor::create(params)),
            Self::Linear => Box::new(LinearRegression::create(params)),
            Self::GradientBoosting => Box::new(GBDTModel::create(params)),
        }
    }
}

impl FromStr for RegressorKind {
    type Err = KitError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "random_forest" => Ok(Self::RandomForest),
            "linear" => Ok(Self::Linear),
            "gradient_boosting" => Ok(Self::GradientBoosting),
            other => Err(KitError::InvalidInput(format!("unknown regressor: {}", other))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_names_round_trip_to_regressor_names() {
        let params = ModelParams::default();
        for name in ["random_forest", "linear", "gradient_boosting"] {
            let kind: RegressorKind = name.parse().unwrap();
            assert_eq!(kind.build(&params).name(), name);
        }
        assert!("svm".parse::<RegressorKind>().is_err());
    }
}
