//! Shuffle-split cross-validation

use rand::seq::SliceRandom;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

use crate::config::CvParams;
use crate::error::{KitError, Result};

/// A single train/test split
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CvSplit {
    pub train_indices: Vec<usize>,
    pub test_indices: Vec<usize>,
    pub fold_idx: usize,
}

/// Independent random train/test partitions, each holding out `test_size` of the rows.
#[derive(Debug, Clone)]
pub struct ShuffleSplit {
    pub n_splits: usize,
    pub test_size: f64,
    pub random_state: u64,
}

impl Default for ShuffleSplit {
    fn default() -> Self {
        Self::from(&CvParams::default())
    }
}

impl From<&CvParams> for ShuffleSplit {
    fn from(params: &CvParams) -> Self {
        Self {
            n_splits: params.n_splits,
            test_size: params.test_size,
            random_state: params.random_state,
        }
    }
}

impl ShuffleSplit {
    pub fn new(n_splits: usize, test_size: f64, random_state: u64) -> Self {
        Self {
            n_splits,
            test_size,
            random_state,
        }
    }

    /// Generate `n_splits` partitions of `0..n_samples`.
    ///
    /// One RNG is seeded from `random_state` and reused across splits, so the
    /// same parameters always give the same splits.
    pub fn split(&self, n_samples: usize) -> Result<Vec<CvSplit>> {
        if self.n_splits == 0 {
            return Err(KitError::InvalidInput("n_splits must be at least 1".to_string()));
        }
        if !(self.test_size > 0.0 && self.test_size < 1.0) {
            return Err(KitError::InvalidInput(format!(
                "test_size must be in (0, 1), got {}",
                self.test_size
            )));
        }

        let n_test = (self.test_size * n_samples as f64).ceil() as usize;
        let n_train = n_samples.saturating_sub(n_test);
        if n_test == 0 || n_train == 0 {
            return Err(KitError::InvalidInput(format!(
                "{} samples with test_size {} leaves an empty train or test set",
                n_samples, self.test_size
            )));
        }

        let mut rng = ChaCha8Rng::seed_from_u64(self.random_state);
        let mut indices: Vec<usize> = (0..n_samples).collect();

        Ok((0..self.n_splits)
            .map(|fold_idx| {
                indices.shuffle(&mut rng);
                CvSplit {
                    test_indices: indices[..n_test].to_vec(),
                    train_indices: indices[n_test..].to_vec(),
                    fold_idx,
                }
            })
            .collect())
    }
}
