use ndarray::Array1;
use polars::prelude::*;
use std::fs::File;
use std::path::{Path, PathBuf};
use tracing::{debug, info, instrument};

use crate::error::{KitError, Result};
use crate::problem::TARGET_COLUMN;

/// Number of rows kept when test mode is on.
pub const TEST_MODE_ROWS: usize = 100;

/// A feature table and its row-aligned target vector.
#[derive(Debug, Clone)]
pub struct Dataset {
    pub features: DataFrame,
    pub target: Array1<f64>,
}

impl Dataset {
    pub fn len(&self) -> usize {
        self.target.len()
    }

    pub fn is_empty(&self) -> bool {
        self.target.is_empty()
    }
}

/// DataLoader reads the `data/train.csv` and `data/test.csv` files of a kit checkout
#[derive(Debug, Clone)]
pub struct DataLoader {
    root: PathBuf,
    test_mode: bool,
}

impl DataLoader {
    pub fn new<P: AsRef<Path>>(root: P, test_mode: bool) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
            test_mode,
        }
    }

    pub fn get_train_data(&self) -> Result<Dataset> {
        self.read_data("train.csv")
    }

    pub fn get_test_data(&self) -> Result<Dataset> {
        self.read_data("test.csv")
    }

    #[instrument(skip(self), fields(root = %self.root.display(), test_mode = self.test_mode))]
    fn read_data(&self, file_name: &str) -> Result<Dataset> {
        let path = self.root.join("data").join(file_name);
        info!("Loading {}", path.display());

        let file = File::open(&path)?;
        // infer over every row; a vitals column can be integral for a long prefix
        let df = CsvReadOptions::default()
            .with_has_header(true)
            .with_infer_schema_length(None)
            .into_reader_with_file_handle(file)
            .finish()?;
        debug!(shape = ?df.shape(), "CSV parsed");

        let df = if self.test_mode {
            df.head(Some(TEST_MODE_ROWS))
        } else {
            df
        };

        split_target(df)
    }
}

/// Separates the target column from the feature table.
pub fn split_target(df: DataFrame) -> Result<Dataset> {
    let column = df
        .column(TARGET_COLUMN)
        .map_err(|_| KitError::MissingField(TARGET_COLUMN.to_string()))?;
    let series = column.as_materialized_series().cast(&DataType::Float64)?;

    let target = series
        .f64()?
        .into_iter()
        .enumerate()
        .map(|(row, value)| {
            value.ok_or_else(|| {
                KitError::InvalidInput(format!("{} is missing at row {}", TARGET_COLUMN, row))
            })
        })
        .collect::<Result<Vec<f64>>>()?;

    let features = df.drop(TARGET_COLUMN)?;
    debug!(rows = target.len(), columns = features.width(), "Target split off");

    Ok(Dataset {
        features,
        target: Array1::from_vec(target),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fmt::Write as _;
    use std::fs;

    fn write_csv(root: &Path, name: &str, rows: usize) {
        let mut contents = String::from("subject_id,heartrate_mean,admission_type,los\n");
        for i in 0..rows {
            let heart = if i % 3 == 0 { String::new() } else { format!("{}", 60 + i % 40) };
            writeln!(contents, "{},{},EMERGENCY,{}", i, heart, 1.0 + i as f64 / 10.0).unwrap();
        }
        fs::create_dir_all(root.join("data")).unwrap();
        fs::write(root.join("data").join(name), contents).unwrap();
    }

    #[test]
    fn test_train_data_splits_target() {
        let dir = tempfile::tempdir().unwrap();
        write_csv(dir.path(), "train.csv", 10);

        let data = DataLoader::new(dir.path(), false).get_train_data().unwrap();
        assert_eq!(data.len(), 10);
        assert!(data.features.column(TARGET_COLUMN).is_err());
        assert!(data.features.column("heartrate_mean").is_ok());
        assert!((data.target[3] - 1.3).abs() < 1e-12);
    }

    #[test]
    fn test_test_mode_truncates_to_100_rows() {
        let dir = tempfile::tempdir().unwrap();
        write_csv(dir.path(), "train.csv", 250);
        write_csv(dir.path(), "test.csv", 40);

        let loader = DataLoader::new(dir.path(), true);
        let train = loader.get_train_data().unwrap();
        assert_eq!(train.len(), TEST_MODE_ROWS);
        assert_eq!(train.features.height(), TEST_MODE_ROWS);

        let test = loader.get_test_data().unwrap();
        assert_eq!(test.len(), 40);

        let full = DataLoader::new(dir.path(), false).get_train_data().unwrap();
        assert_eq!(full.len(), 250);
    }

    #[test]
    fn test_missing_target_column() {
        let df = df!("heartrate_mean" => [80.0, 90.0]).unwrap();
        match split_target(df) {
            Err(KitError::MissingField(name)) => assert_eq!(name, TARGET_COLUMN),
            other => panic!("expected missing field, got {:?}", other),
        }
    }

    #[test]
    fn test_fractional_values_after_integral_prefix() {
        let dir = tempfile::tempdir().unwrap();
        let mut contents = String::from("heartrate_mean,los\n");
        for i in 0..150 {
            if i < 120 {
                writeln!(contents, "{},{}", 60 + i % 40, 1 + i % 5).unwrap();
            } else {
                writeln!(contents, "{}.5,{}.5", 60 + i % 40, 1 + i % 5).unwrap();
            }
        }
        fs::create_dir_all(dir.path().join("data")).unwrap();
        fs::write(dir.path().join("data").join("train.csv"), contents).unwrap();

        let data = DataLoader::new(dir.path(), false).get_train_data().unwrap();
        assert_eq!(data.len(), 150);
        assert!((data.target[120] - 1.5).abs() < 1e-12);
        let heart = data.features.column("heartrate_mean").unwrap();
        let heart = heart.as_materialized_series().cast(&DataType::Float64).unwrap();
        assert_eq!(heart.f64().unwrap().get(120), Some(60.5));
        assert_eq!(heart.f64().unwrap().get(0), Some(60.0));
    }

    #[test]
    fn test_null_target_is_invalid_input() {
        let df = df!(
            "heartrate_mean" => [80.0, 90.0, 70.0],
            "los" => [Some(1.0), None, Some(3.0)]
        )
        .unwrap();
        match split_target(df) {
            Err(KitError::InvalidInput(msg)) => assert!(msg.contains("row 1"), "{}", msg),
            other => panic!("expected invalid input, got {:?}", other),
        }
    }

    #[test]
    fn test_missing_file_is_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let result = DataLoader::new(dir.path(), false).get_test_data();
        assert!(matches!(result, Err(KitError::Io(_))));
    }
}
