use ndarray::{Array1, Axis};
use polars::prelude::*;
use serde::Deserialize;
use std::str::FromStr;
use tracing::{debug, info, instrument};

use crate::config::ModelParams;
use crate::cross_validation::CvSplit;
use crate::data_loader::Dataset;
use crate::error::{KitError, Result};
use crate::feature_engineering::{AdmissionTypeFeatureExtractor, FeatureExtractor, NumericFeatureExtractor};
use crate::metrics::{FoldScores, ScoreCollector, Scores};
use crate::models::{Regressor, RegressorKind};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExtractorKind {
    /// Mean-imputed vitals only.
    Numeric,
    /// Vitals plus one-hot admission type.
    AdmissionType,
}

impl ExtractorKind {
    pub fn build(&self) -> Box<dyn FeatureExtractor> {
        match self {
            Self::Numeric => Box::new(NumericFeatureExtractor::default()),
            Self::AdmissionType => Box::new(AdmissionTypeFeatureExtractor::default()),
        }
    }
}

impl FromStr for ExtractorKind {
    type Err = KitError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "numeric" => Ok(Self::Numeric),
            "admission_type" => Ok(Self::AdmissionType),
            other => Err(KitError::InvalidInput(format!("unknown feature extractor: {}", other))),
        }
    }
}

/// A feature extractor paired with a regressor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Submission {
    pub name: String,
    pub extractor: ExtractorKind,
    pub regressor: RegressorKind,
}

impl Submission {
    /// Vitals into a random forest.
    pub fn starting_kit() -> Self {
        Self {
            name: "starting_kit".to_string(),
            extractor: ExtractorKind::Numeric,
            regressor: RegressorKind::RandomForest,
        }
    }

    /// Vitals and one-hot admission type into least squares.
    pub fn admission_type() -> Self {
        Self {
            name: "admission_type".to_string(),
            extractor: ExtractorKind::AdmissionType,
            regressor: RegressorKind::Linear,
        }
    }

    /// Resolves a preset name or an `<extractor>:<regressor>` pair.
    pub fn by_name(name: &str) -> Result<Self> {
        match name {
            "starting_kit" => Ok(Self::starting_kit()),
            "admission_type" => Ok(Self::admission_type()),
            custom => {
                let (extractor, regressor) = custom.split_once(':').ok_or_else(|| {
                    KitError::InvalidInput(format!("unknown submission: {}", custom))
                })?;
                Ok(Self {
                    name: custom.to_string(),
                    extractor: extractor.parse()?,
                    regressor: regressor.parse()?,
                })
            }
        }
    }
}

/// Fitted extractor and regressor of one submission.
pub struct TrainedSubmission {
    extractor: Box<dyn FeatureExtractor>,
    regressor: Box<dyn Regressor>,
}

impl TrainedSubmission {
    pub fn predict(&self, table: &DataFrame) -> Result<Array1<f64>> {
        let features = self.extractor.transform(table)?;
        self.regressor.predict(&features)
    }

    pub fn feature_names(&self) -> Result<Vec<String>> {
        self.extractor.feature_names()
    }
}

pub fn take_rows(table: &DataFrame, rows: &[usize]) -> Result<DataFrame> {
    let idx: Vec<IdxSize> = rows.iter().map(|&r| r as IdxSize).collect();
    let idx = IdxCa::from_vec("row_idx".into(), idx);
    Ok(table.take(&idx)?)
}

/// Fits a submission on the given rows of `data`.
#[instrument(skip_all, fields(submission = %submission.name, rows = rows.len()))]
pub fn train_submission(
    submission: &Submission,
    params: &ModelParams,
    data: &Dataset,
    rows: &[usize],
) -> Result<TrainedSubmission> {
    let table = take_rows(&data.features, rows)?;
    let target = data.target.select(Axis(0), rows);

    let mut extractor = submission.extractor.build();
    extractor.fit(&table, &target)?;
    let features = extractor.transform(&table)?;
    debug!(shape = ?features.dim(), "Features extracted");

    let mut regressor = submission.regressor.build(params);
    regressor.fit(&features, &target)?;
    debug!(regressor = regressor.name(), "Regressor fitted");

    Ok(TrainedSubmission { extractor, regressor })
}

/// Predicts the given rows of `data` and scores them against the target.
pub fn score_rows(trained: &TrainedSubmission, data: &Dataset, rows: &[usize]) -> Result<Scores> {
    let table = take_rows(&data.features, rows)?;
    let predictions = trained.predict(&table)?;
    Scores::compute(&data.target.select(Axis(0), rows), &predictions)
}

pub fn cross_validate(
    submission: &Submission,
    params: &ModelParams,
    data: &Dataset,
    splits: &[CvSplit],
) -> Result<ScoreCollector> {
    let mut collector = ScoreCollector::new();
    for split in splits {
        let trained = train_submission(submission, params, data, &split.train_indices)?;
        let fold = FoldScores {
            fold_idx: split.fold_idx,
            train: score_rows(&trained, data, &split.train_indices)?,
            valid: score_rows(&trained, data, &split.test_indices)?,
        };
        info!(fold = fold.fold_idx, "train {} | valid {}", fold.train, fold.valid);
        collector.update(fold);
    }
    Ok(collector)
}

#[derive(Debug)]
pub struct Evaluation {
    pub cv: ScoreCollector,
    pub test: Scores,
}

/// Cross-validates on `train`, then refits on all of it and scores `test`.
pub fn evaluate(
    submission: &Submission,
    params: &ModelParams,
    train: &Dataset,
    test: &Dataset,
    splits: &[CvSplit],
) -> Result<Evaluation> {
    let cv = cross_validate(submission, params, train, splits)?;

    let all_rows: Vec<usize> = (0..train.len()).collect();
    let trained = train_submission(submission, params, train, &all_rows)?;
    let predictions = trained.predict(&test.features)?;
    let test_scores = Scores::compute(&test.target, &predictions)?;
    info!("test {}", test_scores);

    Ok(Evaluation { cv, test: test_scores })
}
