//! One-hot encoding with a reserved category for unseen values

use ndarray::{Array2, ArrayViewMut1};
use std::collections::BTreeSet;

/// Category every unseen value is mapped to at transform time.
pub const OTHER_CATEGORY: &str = "other";
/// Stand-in for a missing categorical value.
///
/// A real value spelled `missing` is indistinguishable from a null: both
/// set the same indicator.
pub const MISSING_CATEGORY: &str = "missing";

/// Fitted category levels, sorted, always including [`OTHER_CATEGORY`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OneHotEncoder {
    categories: Vec<String>,
}

impl OneHotEncoder {
    pub fn fit<I, S>(values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut levels: BTreeSet<String> = values
            .into_iter()
            .map(|v| v.as_ref().to_string())
            .collect();
        levels.insert(OTHER_CATEGORY.to_string());

        Self {
            categories: levels.into_iter().collect(),
        }
    }

    pub fn categories(&self) -> &[String] {
        &self.categories
    }

    pub fn width(&self) -> usize {
        self.categories.len()
    }

    /// Index of the indicator set for `value`; unseen values get the "other" slot.
    pub fn index_of(&self, value: &str) -> usize {
        match self.categories.binary_search_by(|c| c.as_str().cmp(value)) {
            Ok(idx) => idx,
            Err(_) => self
                .categories
                .binary_search_by(|c| c.as_str().cmp(OTHER_CATEGORY))
                .unwrap_or_default(),
        }
    }

    pub fn encode_into(&self, value: &str, mut row: ArrayViewMut1<'_, f64>) {
        row.fill(0.0);
        row[self.index_of(value)] = 1.0;
    }

    pub fn transform<S: AsRef<str>>(&self, values: &[S]) -> Array2<f64> {
        let mut out = Array2::zeros((values.len(), self.width()));
        for (value, row) in values.iter().zip(out.rows_mut()) {
            self.encode_into(value.as_ref(), row);
        }
        out
    }
}
