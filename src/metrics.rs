use ndarray::Array1;
use std::fmt;

use crate::error::{KitError, Result};

/// Scores reported for every split. All of them are lower-is-better.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ScoreType {
    /// Mean absolute relative error
    Mare,
    Rmse,
    /// RMSE of the relative errors
    RelativeRmse,
}

impl ScoreType {
    pub const ALL: [ScoreType; 3] = [ScoreType::Mare, ScoreType::Rmse, ScoreType::RelativeRmse];

    pub fn name(&self) -> &'static str {
        match self {
            Self::Mare => "mare",
            Self::Rmse => "rmse",
            Self::RelativeRmse => "rel_rmse",
        }
    }

    pub fn precision(&self) -> usize {
        2
    }

    pub fn is_lower_the_better(&self) -> bool {
        true
    }

    pub fn score(&self, y_true: &Array1<f64>, y_pred: &Array1<f64>) -> Result<f64> {
        if y_true.len() != y_pred.len() {
            return Err(KitError::InvalidInput(format!(
                "{} predictions for {} ground-truth values",
                y_pred.len(),
                y_true.len()
            )));
        }
        if y_true.is_empty() {
            return Err(KitError::InvalidInput("cannot score an empty split".to_string()));
        }

        let n = y_true.len() as f64;
        let pairs = y_true.iter().zip(y_pred.iter());
        let value = match self {
            Self::Mare => pairs.map(|(t, p)| ((t - p) / t).abs()).sum::<f64>() / n,
            Self::Rmse => (pairs.map(|(t, p)| (t - p).powi(2)).sum::<f64>() / n).sqrt(),
            Self::RelativeRmse => {
                (pairs.map(|(t, p)| ((t - p) / t).powi(2)).sum::<f64>() / n).sqrt()
            }
        };
        Ok(value)
    }
}

impl fmt::Display for ScoreType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Values of every [`ScoreType`] on one set of predictions.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Scores {
    pub mare: f64,
    pub rmse: f64,
    pub rel_rmse: f64,
}

impl Scores {
    pub fn compute(y_true: &Array1<f64>, y_pred: &Array1<f64>) -> Result<Self> {
        Ok(Self {
            mare: ScoreType::Mare.score(y_true, y_pred)?,
            rmse: ScoreType::Rmse.score(y_true, y_pred)?,
            rel_rmse: ScoreType::RelativeRmse.score(y_true, y_pred)?,
        })
    }

    pub fn get(&self, score_type: ScoreType) -> f64 {
        match score_type {
            ScoreType::Mare => self.mare,
            ScoreType::Rmse => self.rmse,
            ScoreType::RelativeRmse => self.rel_rmse,
        }
    }
}

impl fmt::Display for Scores {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parts: Vec<String> = ScoreType::ALL
            .iter()
            .map(|s| format!("{}={:.*}", s, s.precision(), self.get(*s)))
            .collect();
        f.write_str(&parts.join(" "))
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FoldScores {
    pub fold_idx: usize,
    pub train: Scores,
    pub valid: Scores,
}

/// Mean and standard deviation of one score across folds.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScoreSummary {
    pub score_type: ScoreType,
    pub mean: f64,
    pub std: f64,
}

impl fmt::Display for ScoreSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let p = self.score_type.precision();
        write!(f, "{}: {:.*} ± {:.*}", self.score_type, p, self.mean, p, self.std)
    }
}

#[derive(Debug, Default)]
pub struct ScoreCollector {
    folds: Vec<FoldScores>,
}

impl ScoreCollector {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn update(&mut self, fold: FoldScores) {
        self.folds.push(fold);
    }

    pub fn folds(&self) -> &[FoldScores] {
        &self.folds
    }

    /// Per-score summary of validation scores; empty when no fold was recorded.
    pub fn valid_summary(&self) -> Vec<ScoreSummary> {
        self.summarize(|fold| &fold.valid)
    }

    pub fn train_summary(&self) -> Vec<ScoreSummary> {
        self.summarize(|fold| &fold.train)
    }

    fn summarize(&self, pick: impl Fn(&FoldScores) -> &Scores) -> Vec<ScoreSummary> {
        if self.folds.is_empty() {
            return Vec::new();
        }
        let n = self.folds.len() as f64;
        ScoreType::ALL
            .iter()
            .map(|&score_type| {
                let values: Vec<f64> = self.folds.iter().map(|f| pick(f).get(score_type)).collect();
                let mean = values.iter().sum::<f64>() / n;
                let var = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / n;
                ScoreSummary {
                    score_type,
                    mean,
                    std: var.sqrt(),
                }
            })
            .collect()
    }
}
