use ndarray::{s, Array1, Array2};
use polars::prelude::*;
use tracing::debug;

use crate::encoder::{OneHotEncoder, MISSING_CATEGORY};
use crate::error::{KitError, Result};

/// Admission vitals used by both example submissions.
pub const VITAL_COLUMNS: [&str; 5] = [
    "heartrate_mean",
    "sysbp_mean",
    "diasbp_mean",
    "resprate_mean",
    "tempc_mean",
];

pub const ADMISSION_TYPE_COLUMN: &str = "admission_type";

/// Turns a raw sample table into the numeric matrix a [`crate::models::Regressor`] consumes.
///
/// `fit` learns whatever state the extractor needs from the training table
/// and is called once; `transform` only reads that state.
pub trait FeatureExtractor: Send + Sync {
    fn fit(&mut self, table: &DataFrame, target: &Array1<f64>) -> Result<()>;

    fn transform(&self, table: &DataFrame) -> Result<Array2<f64>>;

    /// Output column names, in matrix column order.
    fn feature_names(&self) -> Result<Vec<String>>;
}

/// Reads a column as floats, treating nulls and NaNs as missing.
fn numeric_column(table: &DataFrame, name: &str) -> Result<Vec<Option<f64>>> {
    let column = table
        .column(name)
        .map_err(|_| KitError::MissingField(name.to_string()))?;
    let series = column.as_materialized_series().cast(&DataType::Float64)?;
    Ok(series
        .f64()?
        .into_iter()
        .map(|v| v.filter(|x| !x.is_nan()))
        .collect())
}

/// Reads a column as strings, replacing nulls with [`MISSING_CATEGORY`].
fn categorical_column(table: &DataFrame, name: &str) -> Result<Vec<String>> {
    let column = table
        .column(name)
        .map_err(|_| KitError::MissingField(name.to_string()))?;
    let series = column.as_materialized_series().cast(&DataType::String)?;
    Ok(series
        .str()?
        .into_iter()
        .map(|v| v.unwrap_or(MISSING_CATEGORY).to_string())
        .collect())
}

/// Replaces missing values with the mean of the present ones.
///
/// The mean comes from `values` itself, so the same row can be filled
/// differently depending on the batch it arrives in. A column with no
/// present value is filled with 0.0.
pub fn fill_mean(values: &[Option<f64>]) -> Vec<f64> {
    let (sum, count) = values
        .iter()
        .flatten()
        .fold((0.0, 0usize), |(sum, count), v| (sum + v, count + 1));
    let mean = if count > 0 { sum / count as f64 } else { 0.0 };
    values.iter().map(|v| v.unwrap_or(mean)).collect()
}

/// Mean-imputed numeric columns, nothing else.
#[derive(Debug, Clone)]
pub struct NumericFeatureExtractor {
    columns: Vec<String>,
}

impl Default for NumericFeatureExtractor {
    fn default() -> Self {
        Self::with_columns(&VITAL_COLUMNS)
    }
}

impl NumericFeatureExtractor {
    pub fn with_columns<S: AsRef<str>>(columns: &[S]) -> Self {
        Self {
            columns: columns.iter().map(|c| c.as_ref().to_string()).collect(),
        }
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }
}

impl FeatureExtractor for NumericFeatureExtractor {
    fn fit(&mut self, table: &DataFrame, target: &Array1<f64>) -> Result<()> {
        check_aligned(table, target)
    }

    fn transform(&self, table: &DataFrame) -> Result<Array2<f64>> {
        let mut out = Array2::zeros((table.height(), self.columns.len()));
        for (name, mut out_col) in self.columns.iter().zip(out.columns_mut()) {
            let raw = numeric_column(table, name)?;
            let missing = raw.iter().filter(|v| v.is_none()).count();
            if missing > 0 {
                debug!(column = %name, missing, "Mean-imputing column");
            }
            for (dst, value) in out_col.iter_mut().zip(fill_mean(&raw)) {
                *dst = value;
            }
        }
        Ok(out)
    }

    fn feature_names(&self) -> Result<Vec<String>> {
        Ok(self.columns.clone())
    }
}

/// Mean-imputed numeric columns followed by a one-hot admission type.
#[derive(Debug, Clone)]
pub struct AdmissionTypeFeatureExtractor {
    numeric: NumericFeatureExtractor,
    column: String,
    encoder: Option<OneHotEncoder>,
}

impl Default for AdmissionTypeFeatureExtractor {
    fn default() -> Self {
        Self::with_columns(&VITAL_COLUMNS, ADMISSION_TYPE_COLUMN)
    }
}

impl AdmissionTypeFeatureExtractor {
    pub fn with_columns<S: AsRef<str>>(numeric: &[S], categorical: &str) -> Self {
        Self {
            numeric: NumericFeatureExtractor::with_columns(numeric),
            column: categorical.to_string(),
            encoder: None,
        }
    }

    pub fn encoder(&self) -> Option<&OneHotEncoder> {
        self.encoder.as_ref()
    }

    fn fitted_encoder(&self) -> Result<&OneHotEncoder> {
        self.encoder
            .as_ref()
            .ok_or(KitError::NotFitted("AdmissionTypeFeatureExtractor"))
    }
}

impl FeatureExtractor for AdmissionTypeFeatureExtractor {
    fn fit(&mut self, table: &DataFrame, target: &Array1<f64>) -> Result<()> {
        check_aligned(table, target)?;
        // numeric columns are validated here so a bad table fails at fit, not later
        for name in self.numeric.columns() {
            table
                .column(name)
                .map_err(|_| KitError::MissingField(name.clone()))?;
        }

        let encoder = OneHotEncoder::fit(categorical_column(table, &self.column)?);
        debug!(categories = ?encoder.categories(), "Fitted admission type encoder");
        self.encoder = Some(encoder);
        Ok(())
    }

    fn transform(&self, table: &DataFrame) -> Result<Array2<f64>> {
        let encoder = self.fitted_encoder()?;
        let numeric = self.numeric.transform(table)?;
        let categories = categorical_column(table, &self.column)?;

        let n_numeric = numeric.ncols();
        let mut out = Array2::zeros((table.height(), n_numeric + encoder.width()));
        out.slice_mut(s![.., ..n_numeric]).assign(&numeric);
        out.slice_mut(s![.., n_numeric..])
            .assign(&encoder.transform(&categories));
        Ok(out)
    }

    fn feature_names(&self) -> Result<Vec<String>> {
        let encoder = self.fitted_encoder()?;
        let mut names = self.numeric.feature_names()?;
        names.extend(
            encoder
                .categories()
                .iter()
                .map(|c| format!("{}={}", self.column, c)),
        );
        Ok(names)
    }
}

fn check_aligned(table: &DataFrame, target: &Array1<f64>) -> Result<()> {
    if table.height() != target.len() {
        return Err(KitError::InvalidInput(format!(
            "table has {} rows but target has {}",
            table.height(),
            target.len()
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::encoder::OTHER_CATEGORY;
    use ndarray::array;

    fn vitals_table() -> DataFrame {
        df!(
            "heartrate_mean" => [Some(80.0), None, Some(100.0)],
            "sysbp_mean" => [Some(120.0), Some(110.0), None],
            "diasbp_mean" => [None::<f64>, None, None],
            "resprate_mean" => [Some(16.0), Some(18.0), Some(20.0)],
            "tempc_mean" => [Some(36.6), Some(f64::NAN), Some(37.0)],
            "admission_type" => [Some("EMERGENCY"), Some("ELECTIVE"), None]
        )
        .unwrap()
    }

    #[test]
    fn test_fill_mean() {
        assert_eq!(fill_mean(&[Some(1.0), None, Some(3.0)]), vec![1.0, 2.0, 3.0]);
        assert_eq!(fill_mean(&[None, None]), vec![0.0, 0.0]);
        assert!(fill_mean(&[]).is_empty());
    }

    #[test]
    fn test_numeric_transform_has_no_missing_values() {
        let table = vitals_table();
        let extractor = NumericFeatureExtractor::default();
        let x = extractor.transform(&table).unwrap();

        assert_eq!(x.dim(), (3, 5));
        assert!(x.iter().all(|v| v.is_finite()));
        assert_eq!(x.column(0), array![80.0, 90.0, 100.0]);
        assert_eq!(x.column(2), array![0.0, 0.0, 0.0]);
        assert!((x[[1, 4]] - 36.8).abs() < 1e-9);
    }

    #[test]
    fn test_imputation_uses_the_transformed_batch() {
        let extractor = NumericFeatureExtractor::with_columns(&["heartrate_mean"]);
        let a = df!("heartrate_mean" => [Some(10.0), None]).unwrap();
        let b = df!("heartrate_mean" => [Some(30.0), None]).unwrap();
        assert_eq!(extractor.transform(&a).unwrap()[[1, 0]], 10.0);
        assert_eq!(extractor.transform(&b).unwrap()[[1, 0]], 30.0);
    }

    #[test]
    fn test_missing_column_is_missing_field() {
        let table = df!("heartrate_mean" => [80.0]).unwrap();
        let extractor = NumericFeatureExtractor::default();
        match extractor.transform(&table) {
            Err(KitError::MissingField(name)) => assert_eq!(name, "sysbp_mean"),
            other => panic!("expected missing field, got {:?}", other),
        }

        let mut extractor = AdmissionTypeFeatureExtractor::with_columns(&["heartrate_mean"], "admission_type");
        let result = extractor.fit(&table, &array![1.0]);
        assert!(matches!(result, Err(KitError::MissingField(name)) if name == "admission_type"));
    }

    #[test]
    fn test_fit_checks_target_length() {
        let mut extractor = NumericFeatureExtractor::default();
        let result = extractor.fit(&vitals_table(), &array![1.0]);
        assert!(matches!(result, Err(KitError::InvalidInput(_))));
    }

    #[test]
    fn test_transform_before_fit() {
        let extractor = AdmissionTypeFeatureExtractor::default();
        assert!(matches!(
            extractor.transform(&vitals_table()),
            Err(KitError::NotFitted(_))
        ));
    }

    #[test]
    fn test_admission_type_end_to_end() {
        let train = df!(
            "heartrate_mean" => [80.0, f64::NAN],
            "admission_type" => ["EMERGENCY", "ELECTIVE"]
        )
        .unwrap();
        let mut extractor = AdmissionTypeFeatureExtractor::with_columns(&["heartrate_mean"], "admission_type");
        extractor.fit(&train, &array![5.0, 2.0]).unwrap();

        let x = extractor.transform(&train).unwrap();
        assert_eq!(x.column(0), array![80.0, 80.0]);
        assert_ne!(x.slice(s![0, 1..]), x.slice(s![1, 1..]));
        assert_eq!(
            extractor.feature_names().unwrap(),
            [
                "heartrate_mean",
                "admission_type=ELECTIVE",
                "admission_type=EMERGENCY",
                "admission_type=other"
            ]
        );

        let test = df!(
            "heartrate_mean" => [70.0, 75.0],
            "admission_type" => ["URGENT", OTHER_CATEGORY]
        )
        .unwrap();
        let y = extractor.transform(&test).unwrap();
        assert_eq!(y.slice(s![0, 1..]), y.slice(s![1, 1..]));
        assert_eq!(y.slice(s![0, 1..]), array![0.0, 0.0, 1.0]);
    }

    #[test]
    fn test_missing_category_seen_at_fit_gets_its_own_level() {
        let table = vitals_table();
        let mut extractor = AdmissionTypeFeatureExtractor::default();
        extractor.fit(&table, &array![1.0, 2.0, 3.0]).unwrap();
        let encoder = extractor.encoder().unwrap();
        assert!(encoder.categories().iter().any(|c| c == MISSING_CATEGORY));

        let x = extractor.transform(&table).unwrap();
        assert_eq!(x.ncols(), 5 + 4);
        for row in x.slice(s![.., 5..]).rows() {
            assert_eq!(row.sum(), 1.0);
        }
    }

    #[test]
    fn test_missing_category_unseen_at_fit_maps_to_other() {
        let train = df!("heartrate_mean" => [80.0], "admission_type" => ["EMERGENCY"]).unwrap();
        let test = df!("heartrate_mean" => [80.0], "admission_type" => [None::<&str>]).unwrap();
        let mut extractor = AdmissionTypeFeatureExtractor::with_columns(&["heartrate_mean"], "admission_type");
        extractor.fit(&train, &array![1.0]).unwrap();
        let x = extractor.transform(&test).unwrap();
        assert_eq!(x.row(0), array![80.0, 0.0, 1.0]);
    }

    #[test]
    fn test_literal_missing_value_shares_the_null_indicator() {
        let train = df!(
            "heartrate_mean" => [80.0, 70.0],
            "admission_type" => [Some("EMERGENCY"), None]
        )
        .unwrap();
        let test = df!(
            "heartrate_mean" => [80.0, 80.0],
            "admission_type" => [Some(MISSING_CATEGORY), None]
        )
        .unwrap();
        let mut extractor = AdmissionTypeFeatureExtractor::with_columns(&["heartrate_mean"], "admission_type");
        extractor.fit(&train, &array![1.0, 2.0]).unwrap();
        let x = extractor.transform(&test).unwrap();
        assert_eq!(x.row(0), x.row(1));
        assert_eq!(x.row(0), array![80.0, 0.0, 1.0, 0.0]);
    }

    #[test]
    fn test_transform_is_deterministic() {
        let table = vitals_table();
        let mut extractor = AdmissionTypeFeatureExtractor::default();
        extractor.fit(&table, &array![1.0, 2.0, 3.0]).unwrap();
        let first = extractor.transform(&table).unwrap();
        let second = extractor.transform(&table).unwrap();
        assert_eq!(first, second);
    }
}
