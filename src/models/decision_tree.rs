//! CART regression tree with a squared-error criterion

use ndarray::{Array1, Array2};
use rand::seq::index;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

use super::traits::{check_predict_input, check_training_input, Regressor};
use crate::error::{KitError, Result};

#[derive(Debug, Clone)]
enum TreeNode {
    Leaf {
        value: f64,
    },
    Split {
        feature_idx: usize,
        threshold: f64,
        left: Box<TreeNode>,
        right: Box<TreeNode>,
    },
}

impl TreeNode {
    fn predict_row(&self, row: &[f64]) -> f64 {
        let mut node = self;
        loop {
            match node {
                TreeNode::Leaf { value } => return *value,
                TreeNode::Split {
                    feature_idx,
                    threshold,
                    left,
                    right,
                } => {
                    node = if row[*feature_idx] <= *threshold { left } else { right };
                }
            }
        }
    }

    fn depth(&self) -> usize {
        match self {
            TreeNode::Leaf { .. } => 0,
            TreeNode::Split { left, right, .. } => 1 + left.depth().max(right.depth()),
        }
    }
}

#[derive(Debug, Clone)]
pub struct DecisionTree {
    root: Option<TreeNode>,
    pub max_depth: Option<usize>,
    pub min_samples_split: usize,
    pub min_samples_leaf: usize,
    /// Features drawn per split; `None` tries all of them.
    pub max_features: Option<usize>,
    pub random_state: u64,
    n_features: usize,
}

impl Default for DecisionTree {
    fn default() -> Self {
        Self::new()
    }
}

impl DecisionTree {
    pub fn new() -> Self {
        Self {
            root: None,
            max_depth: None,
            min_samples_split: 2,
            min_samples_leaf: 1,
            max_features: None,
            random_state: 0,
            n_features: 0,
        }
    }

    pub fn with_max_depth(mut self, depth: usize) -> Self {
        self.max_depth = Some(depth);
        self
    }

    pub fn with_min_samples_leaf(mut self, min_samples: usize) -> Self {
        self.min_samples_leaf = min_samples.max(1);
        self
    }

    pub fn with_max_features(mut self, max_features: usize) -> Self {
        self.max_features = Some(max_features.max(1));
        self
    }

    pub fn with_random_state(mut self, seed: u64) -> Self {
        self.random_state = seed;
        self
    }

    /// Depth of the fitted tree, `None` before fit.
    pub fn depth(&self) -> Option<usize> {
        self.root.as_ref().map(TreeNode::depth)
    }

    /// Fits on the rows listed in `indices`; repeated indices act as sample weights.
    pub(crate) fn fit_indices(&mut self, x: &Array2<f64>, y: &Array1<f64>, indices: &mut [usize]) {
        let mut rng = ChaCha8Rng::seed_from_u64(self.random_state);
        self.n_features = x.ncols();
        self.root = Some(self.build(x, y, indices, 0, &mut rng));
    }

    fn build(
        &self,
        x: &Array2<f64>,
        y: &Array1<f64>,
        indices: &mut [usize],
        depth: usize,
        rng: &mut ChaCha8Rng,
    ) -> TreeNode {
        let n = indices.len();
        let sum: f64 = indices.iter().map(|&i| y[i]).sum();
        let value = sum / n as f64;

        let first = y[indices[0]];
        let should_stop = n < self.min_samples_split
            || n < 2 * self.min_samples_leaf
            || self.max_depth.map_or(false, |d| depth >= d)
            || indices.iter().all(|&i| y[i] == first);
        if should_stop {
            return TreeNode::Leaf { value };
        }

        let Some((feature_idx, threshold)) = self.find_best_split(x, y, indices, sum, rng) else {
            return TreeNode::Leaf { value };
        };

        let mut mid = 0;
        for k in 0..n {
            if x[[indices[k], feature_idx]] <= threshold {
                indices.swap(k, mid);
                mid += 1;
            }
        }
        let (left_idx, right_idx) = indices.split_at_mut(mid);

        TreeNode::Split {
            feature_idx,
            threshold,
            left: Box::new(self.build(x, y, left_idx, depth + 1, rng)),
            right: Box::new(self.build(x, y, right_idx, depth + 1, rng)),
        }
    }

    /// Best (feature, threshold) by squared-error reduction, or `None` if no split helps.
    fn find_best_split(
        &self,
        x: &Array2<f64>,
        y: &Array1<f64>,
        indices: &[usize],
        total: f64,
        rng: &mut ChaCha8Rng,
    ) -> Option<(usize, f64)> {
        let n = indices.len();
        let n_features = x.ncols();
        let candidates: Vec<usize> = match self.max_features {
            Some(k) if k < n_features => index::sample(rng, n_features, k).into_vec(),
            _ => (0..n_features).collect(),
        };

        // Minimizing child SSE is maximizing sum_l²/n_l + sum_r²/n_r.
        let parent_score = total * total / n as f64;
        let mut best: Option<(usize, f64, f64)> = None;
        let mut order = indices.to_vec();

        for feature_idx in candidates {
            order.sort_by(|&a, &b| x[[a, feature_idx]].total_cmp(&x[[b, feature_idx]]));

            let mut left_sum = 0.0;
            for k in 0..n - 1 {
                left_sum += y[order[k]];
                let n_left = k + 1;
                let n_right = n - n_left;
                if n_left < self.min_samples_leaf || n_right < self.min_samples_leaf {
                    continue;
                }

                let lo = x[[order[k], feature_idx]];
                let hi = x[[order[k + 1], feature_idx]];
                if lo == hi {
                    continue;
                }

                let right_sum = total - left_sum;
                let score = left_sum * left_sum / n_left as f64 + right_sum * right_sum / n_right as f64;
                if score - parent_score <= 1e-12 * parent_score.abs().max(1.0) {
                    continue;
                }
                if best.map_or(true, |(_, _, s)| score > s) {
                    let mut threshold = lo / 2.0 + hi / 2.0;
                    if threshold >= hi {
                        threshold = lo;
                    }
                    best = Some((feature_idx, threshold, score));
                }
            }
        }

        best.map(|(feature_idx, threshold, _)| (feature_idx, threshold))
    }
}

impl Regressor for DecisionTree {
    fn fit(&mut self, features: &Array2<f64>, target: &Array1<f64>) -> Result<()> {
        check_training_input(features, target)?;
        let mut indices: Vec<usize> = (0..features.nrows()).collect();
        self.fit_indices(features, target, &mut indices);
        Ok(())
    }

    fn predict(&self, features: &Array2<f64>) -> Result<Array1<f64>> {
        let root = self.root.as_ref().ok_or(KitError::NotFitted("DecisionTree"))?;
        check_predict_input(self.n_features, features)?;
        Ok(features
            .rows()
            .into_iter()
            .map(|row| match row.as_slice() {
                Some(values) => root.predict_row(values),
                None => root.predict_row(&row.to_vec()),
            })
            .collect())
    }

    fn name(&self) -> &'static str {
        "decision_tree"
    }
}
