//! Quadratic Discriminant Analysis
//!
//! One full-covariance Gaussian per class. Covariances are factored with Cholesky at
//! fit time; a covariance that is not positive definite fails the fit unless
//! `reg_param` shrinks it towards the identity.

use std::f64::consts::PI;

use ndarray::{Array1, Array2, ArrayView1, Axis};
use serde::{Deserialize, Serialize};

use super::{check_fit_input, check_predict_input, Classifier};
use crate::error::{DetectError, DetectResult};

const PIVOT_TOLERANCE: f64 = 1e-12;

/// Quadratic discriminant classifier
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuadraticDiscriminant {
    /// Shrinkage towards the identity, in `[0, 1]`
    pub reg_param: f64,
    means: Array2<f64>,
    /// Lower Cholesky factor of each class covariance
    factors: Vec<Array2<f64>>,
    log_dets: Vec<f64>,
    priors: Array1<f64>,
    fitted: bool,
}

impl Default for QuadraticDiscriminant {
    fn default() -> Self {
        Self::new()
    }
}

impl QuadraticDiscriminant {
    pub fn new() -> Self {
        Self {
            reg_param: 0.0,
            means: Array2::zeros((0, 0)),
            factors: Vec::new(),
            log_dets: Vec::new(),
            priors: Array1::zeros(0),
            fitted: false,
        }
    }

    /// Set covariance regularization
    pub fn with_reg_param(mut self, reg_param: f64) -> Self {
        self.reg_param = reg_param.clamp(0.0, 1.0);
        self
    }

    fn class_score(&self, class: usize, row: ArrayView1<f64>) -> f64 {
        let prior = self.priors[class];
        if prior <= 0.0 {
            return f64::NEG_INFINITY;
        }
        let diff = &row - &self.means.row(class);
        let z = forward_substitute(&self.factors[class], &diff);
        let mahalanobis = z.dot(&z);
        let d = row.len() as f64;
        -0.5 * (mahalanobis + self.log_dets[class] + d * (2.0 * PI).ln()) + prior.ln()
    }
}

impl Classifier for QuadraticDiscriminant {
    fn fit(&mut self, x: &Array2<f64>, y: &[usize], n_classes: usize) -> DetectResult<()> {
        check_fit_input(x, y, n_classes)?;

        let n_samples = x.nrows();
        let n_features = x.ncols();

        let mut means = Array2::<f64>::zeros((n_classes, n_features));
        let mut factors = Vec::with_capacity(n_classes);
        let mut log_dets = Vec::with_capacity(n_classes);
        let mut priors = Array1::<f64>::zeros(n_classes);

        for class in 0..n_classes {
            let rows: Vec<usize> = (0..n_samples).filter(|&i| y[i] == class).collect();
            if rows.is_empty() {
                factors.push(Array2::eye(n_features));
                log_dets.push(0.0);
                continue;
            }
            if rows.len() < 2 {
                return Err(DetectError::Model(format!(
                    "class {} has a single sample; covariance is undefined",
                    class
                )));
            }

            let subset = x.select(Axis(0), &rows);
            let mean = subset
                .mean_axis(Axis(0))
                .ok_or_else(|| DetectError::Model("empty class subset".to_string()))?;
            let centered = &subset - &mean;
            let mut cov = centered.t().dot(&centered) / (rows.len() - 1) as f64;

            if self.reg_param > 0.0 {
                cov *= 1.0 - self.reg_param;
                cov.diag_mut().mapv_inplace(|v| v + self.reg_param);
            }

            let factor = cholesky(&cov).map_err(|_| {
                DetectError::Model(format!(
                    "covariance of class {} is singular; variables are collinear",
                    class
                ))
            })?;

            let log_det = 2.0 * factor.diag().iter().map(|v| v.ln()).sum::<f64>();

            means.row_mut(class).assign(&mean);
            factors.push(factor);
            log_dets.push(log_det);
            priors[class] = rows.len() as f64 / n_samples as f64;
        }

        self.means = means;
        self.factors = factors;
        self.log_dets = log_dets;
        self.priors = priors;
        self.fitted = true;
        Ok(())
    }

    fn predict_proba(&self, x: &Array2<f64>) -> DetectResult<Array2<f64>> {
        if !self.fitted {
            return Err(DetectError::NotFitted);
        }
        check_predict_input(x, self.means.ncols())?;

        let n_classes = self.priors.len();
        let mut proba = Array2::<f64>::zeros((x.nrows(), n_classes));

        for (i, row) in x.rows().into_iter().enumerate() {
            let scores = Array1::from_iter((0..n_classes).map(|c| self.class_score(c, row)));
            let max = scores.iter().cloned().fold(f64::NEG_INFINITY, f64::max);
            let exp = scores.mapv(|s| (s - max).exp());
            let sum = exp.sum();
            proba.row_mut(i).assign(&(exp / sum));
        }

        Ok(proba)
    }
}

// ============================================================================
// LINEAR ALGEBRA
// ============================================================================

struct NotPositiveDefinite;

/// Lower-triangular `L` with `L Lᵀ = a`
fn cholesky(a: &Array2<f64>) -> Result<Array2<f64>, NotPositiveDefinite> {
    let n = a.nrows();
    let mut l = Array2::<f64>::zeros((n, n));

    for j in 0..n {
        let mut pivot = a[[j, j]];
        for k in 0..j {
            pivot -= l[[j, k]] * l[[j, k]];
        }
        if !(pivot > PIVOT_TOLERANCE) {
            return Err(NotPositiveDefinite);
        }
        let diag = pivot.sqrt();
        l[[j, j]] = diag;

        for i in (j + 1)..n {
            let mut v = a[[i, j]];
            for k in 0..j {
                v -= l[[i, k]] * l[[j, k]];
            }
            l[[i, j]] = v / diag;
        }
    }

    Ok(l)
}

/// Solve `L z = b` for lower-triangular `L`
fn forward_substitute(l: &Array2<f64>, b: &Array1<f64>) -> Array1<f64> {
    let n = b.len();
    let mut z = Array1::<f64>::zeros(n);
    for i in 0..n {
        let mut v = b[i];
        for k in 0..i {
            v -= l[[i, k]] * z[k];
        }
        z[i] = v / l[[i, i]];
    }
    z
}
