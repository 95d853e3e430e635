//! Bagged regression trees

use ndarray::{Array1, Array2};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use rayon::prelude::*;
use tracing::debug;

use super::decision_tree::DecisionTree;
use super::traits::{check_predict_input, check_training_input, ModelFactory, Regressor};
use crate::config::ModelParams;
use crate::error::{KitError, Result};

#[derive(Debug, Clone)]
pub struct RandomForestRegressor {
    trees: Vec<DecisionTree>,
    pub n_estimators: usize,
    pub max_depth: Option<usize>,
    pub min_samples_leaf: usize,
    /// Features drawn per split; `None` tries all of them.
    pub max_features: Option<usize>,
    pub bootstrap: bool,
    pub random_state: u64,
    n_features: usize,
}

impl Default for RandomForestRegressor {
    fn default() -> Self {
        Self::new(100)
    }
}

impl RandomForestRegressor {
    pub fn new(n_estimators: usize) -> Self {
        Self {
            trees: Vec::new(),
            n_estimators,
            max_depth: None,
            min_samples_leaf: 1,
            max_features: None,
            bootstrap: true,
            random_state: 0,
            n_features: 0,
        }
    }

    pub fn with_max_depth(mut self, depth: usize) -> Self {
        self.max_depth = Some(depth);
        self
    }

    pub fn with_min_samples_leaf(mut self, min_samples: usize) -> Self {
        self.min_samples_leaf = min_samples;
        self
    }

    pub fn with_max_features(mut self, max_features: usize) -> Self {
        self.max_features = Some(max_features);
        self
    }

    pub fn with_bootstrap(mut self, bootstrap: bool) -> Self {
        self.bootstrap = bootstrap;
        self
    }

    pub fn with_random_state(mut self, seed: u64) -> Self {
        self.random_state = seed;
        self
    }

    pub fn n_trees(&self) -> usize {
        self.trees.len()
    }

    fn build_tree(&self, tree_idx: usize, x: &Array2<f64>, y: &Array1<f64>) -> DecisionTree {
        let seed = self.random_state.wrapping_add(tree_idx as u64);
        let mut rng = ChaCha8Rng::seed_from_u64(seed);
        let n_samples = x.nrows();

        let mut indices: Vec<usize> = if self.bootstrap {
            (0..n_samples).map(|_| rng.gen_range(0..n_samples)).collect()
        } else {
            (0..n_samples).collect()
        };

        let mut tree = DecisionTree::new()
            .with_min_samples_leaf(self.min_samples_leaf)
            .with_random_state(rng.gen());
        if let Some(depth) = self.max_depth {
            tree = tree.with_max_depth(depth);
        }
        if let Some(k) = self.max_features {
            tree = tree.with_max_features(k);
        }

        tree.fit_indices(x, y, &mut indices);
        tree
    }
}

impl ModelFactory for RandomForestRegressor {
    fn create(params: &ModelParams) -> Self {
        let mut forest = Self::new(params.n_estimators)
            .with_min_samples_leaf(params.min_samples_leaf)
            .with_random_state(params.random_state);
        if params.max_depth > 0 {
            forest = forest.with_max_depth(params.max_depth);
        }
        forest
    }
}

impl Regressor for RandomForestRegressor {
    fn fit(&mut self, features: &Array2<f64>, target: &Array1<f64>) -> Result<()> {
        check_training_input(features, target)?;
        if self.n_estimators == 0 {
            return Err(KitError::InvalidInput("n_estimators must be at least 1".to_string()));
        }

        debug!(
            n_estimators = self.n_estimators,
            rows = features.nrows(),
            cols = features.ncols(),
            "Growing forest"
        );
        self.n_features = features.ncols();
        let trees: Vec<DecisionTree> = (0..self.n_estimators)
            .into_par_iter()
            .map(|tree_idx| self.build_tree(tree_idx, features, target))
            .collect();
        self.trees = trees;
        Ok(())
    }

    fn predict(&self, features: &Array2<f64>) -> Result<Array1<f64>> {
        if self.trees.is_empty() {
            return Err(KitError::NotFitted("RandomForestRegressor"));
        }
        check_predict_input(self.n_features, features)?;

        let per_tree = self
            .trees
            .par_iter()
            .map(|tree| tree.predict(features))
            .collect::<Result<Vec<Array1<f64>>>>()?;

        let mut sum = Array1::<f64>::zeros(features.nrows());
        for predictions in &per_tree {
            sum += predictions;
        }
        Ok(sum / per_tree.len() as f64)
    }

    fn name(&self) -> &'static str {
        "random_forest"
    }
}
