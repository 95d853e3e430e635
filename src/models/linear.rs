//! Ordinary least squares

use ndarray::{Array1, Array2, Axis};
use tracing::debug;

use super::traits::{check_predict_input, check_training_input, ModelFactory, Regressor};
use crate::config::ModelParams;
use crate::error::{KitError, Result};

/// Relative ridge terms tried, in order, when the Gram matrix is not positive definite.
const JITTER_SCALES: [f64; 5] = [1e-10, 1e-8, 1e-6, 1e-4, 1e-2];

/// Solves `a x = b` for symmetric positive-definite `a`; `None` if `a` is not PD.
fn cholesky_solve(a: &Array2<f64>, b: &Array1<f64>) -> Option<Array1<f64>> {
    let n = a.nrows();
    let mut l = Array2::<f64>::zeros((n, n));

    for i in 0..n {
        for j in 0..=i {
            let mut sum = 0.0;
            for k in 0..j {
                sum += l[[i, k]] * l[[j, k]];
            }
            if i == j {
                let diag = a[[i, i]] - sum;
                if diag <= 0.0 || !diag.is_finite() {
                    return None;
                }
                l[[i, j]] = diag.sqrt();
            } else {
                l[[i, j]] = (a[[i, j]] - sum) / l[[j, j]];
            }
        }
    }

    // L y = b
    let mut y = Array1::<f64>::zeros(n);
    for i in 0..n {
        let mut sum = 0.0;
        for j in 0..i {
            sum += l[[i, j]] * y[j];
        }
        y[i] = (b[i] - sum) / l[[i, i]];
    }

    // L^T x = y
    let mut x = Array1::<f64>::zeros(n);
    for i in (0..n).rev() {
        let mut sum = 0.0;
        for j in (i + 1)..n {
            sum += l[[j, i]] * x[j];
        }
        x[i] = (y[i] - sum) / l[[i, i]];
    }

    Some(x)
}

/// Normal equations with a vanishing ridge for rank-deficient designs,
/// e.g. one-hot blocks whose columns sum to a constant.
fn solve_least_squares(x: &Array2<f64>, y: &Array1<f64>) -> Option<Array1<f64>> {
    let xtx = x.t().dot(x);
    let xty = x.t().dot(y);

    if let Some(coef) = cholesky_solve(&xtx, &xty) {
        return Some(coef);
    }

    let n = xtx.nrows().max(1);
    let mean_diag = xtx.diag().sum() / n as f64;
    let base = if mean_diag > 0.0 { mean_diag } else { 1.0 };
    JITTER_SCALES.iter().find_map(|scale| {
        let mut regularized = xtx.clone();
        regularized.diag_mut().mapv_inplace(|d| d + scale * base);
        let coef = cholesky_solve(&regularized, &xty)?;
        debug!(ridge = scale * base, "Gram matrix singular, solved with jitter");
        Some(coef)
    })
}

#[derive(Debug, Clone, Default)]
pub struct LinearRegression {
    coefficients: Option<Array1<f64>>,
    intercept: f64,
}

impl LinearRegression {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn coefficients(&self) -> Option<&Array1<f64>> {
        self.coefficients.as_ref()
    }

    pub fn intercept(&self) -> f64 {
        self.intercept
    }
}

impl ModelFactory for LinearRegression {
    fn create(_params: &ModelParams) -> Self {
        Self::new()
    }
}

impl Regressor for LinearRegression {
    fn fit(&mut self, features: &Array2<f64>, target: &Array1<f64>) -> Result<()> {
        check_training_input(features, target)?;

        let x_mean = features
            .mean_axis(Axis(0))
            .ok_or_else(|| KitError::InvalidInput("cannot fit on zero rows".to_string()))?;
        let y_mean = target.mean().unwrap_or(0.0);
        let x_centered = features - &x_mean.view().insert_axis(Axis(0));
        let y_centered = target - y_mean;

        let coefficients = solve_least_squares(&x_centered, &y_centered)
            .ok_or_else(|| KitError::Training("least squares system is singular".to_string()))?;

        self.intercept = y_mean - coefficients.dot(&x_mean);
        self.coefficients = Some(coefficients);
        Ok(())
    }

    fn predict(&self, features: &Array2<f64>) -> Result<Array1<f64>> {
        let coefficients = self
            .coefficients
            .as_ref()
            .ok_or(KitError::NotFitted("LinearRegression"))?;
        check_predict_input(coefficients.len(), features)?;
        Ok(features.dot(coefficients) + self.intercept)
    }

    fn name(&self) -> &'static str {
        "linear"
    }
}
