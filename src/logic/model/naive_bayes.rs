//! Gaussian Naive Bayes
//!
//! Per-class feature means and variances. Variances are smoothed by
//! `var_smoothing * max feature variance` so constant features stay finite.

use std::f64::consts::PI;

use ndarray::{Array1, Array2, ArrayView1, Axis};
use serde::{Deserialize, Serialize};

use super::{check_fit_input, check_predict_input, Classifier};
use crate::error::{DetectError, DetectResult};

/// Gaussian Naive Bayes classifier
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GaussianNaiveBayes {
    /// Per-class feature means, shape `(n_classes, n_features)`
    means: Array2<f64>,
    /// Per-class feature variances, same shape as `means`
    variances: Array2<f64>,
    /// Prior per class; zero for classes absent from training
    priors: Array1<f64>,
    /// Smoothing parameter for variance
    pub var_smoothing: f64,
    fitted: bool,
}

impl Default for GaussianNaiveBayes {
    fn default() -> Self {
        Self::new()
    }
}

impl GaussianNaiveBayes {
    pub fn new() -> Self {
        Self {
            means: Array2::zeros((0, 0)),
            variances: Array2::zeros((0, 0)),
            priors: Array1::zeros(0),
            var_smoothing: 1e-9,
            fitted: false,
        }
    }

    /// Joint log likelihood of one row for every class
    fn joint_log_likelihood(&self, row: ArrayView1<f64>) -> Array1<f64> {
        let log_2pi = (2.0 * PI).ln();
        Array1::from_iter(self.priors.iter().enumerate().map(|(c, &prior)| {
            if prior <= 0.0 {
                return f64::NEG_INFINITY;
            }
            let ll: f64 = row
                .iter()
                .zip(self.means.row(c))
                .zip(self.variances.row(c))
                .map(|((&xi, &mean), &var)| -0.5 * ((xi - mean).powi(2) / var + var.ln() + log_2pi))
                .sum();
            prior.ln() + ll
        }))
    }
}

impl Classifier for GaussianNaiveBayes {
    fn fit(&mut self, x: &Array2<f64>, y: &[usize], n_classes: usize) -> DetectResult<()> {
        check_fit_input(x, y, n_classes)?;

        let n_samples = x.nrows();
        let n_features = x.ncols();

        let max_var = x.var_axis(Axis(0), 0.0).iter().cloned().fold(0.0_f64, f64::max);
        let epsilon = self.var_smoothing * if max_var > 0.0 { max_var } else { 1.0 };

        let mut means = Array2::<f64>::zeros((n_classes, n_features));
        let mut variances = Array2::<f64>::from_elem((n_classes, n_features), 1.0);
        let mut priors = Array1::<f64>::zeros(n_classes);

        for class in 0..n_classes {
            let rows: Vec<usize> = (0..n_samples).filter(|&i| y[i] == class).collect();
            if rows.is_empty() {
                continue;
            }

            let subset = x.select(Axis(0), &rows);
            let mean = subset
                .mean_axis(Axis(0))
                .ok_or_else(|| DetectError::Model("empty class subset".to_string()))?;
            let var = subset.var_axis(Axis(0), 0.0) + epsilon;

            means.row_mut(class).assign(&mean);
            variances.row_mut(class).assign(&var);
            priors[class] = rows.len() as f64 / n_samples as f64;
        }

        self.means = means;
        self.variances = variances;
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
            let jll = self.joint_log_likelihood(row);
            let max = jll.iter().cloned().fold(f64::NEG_INFINITY, f64::max);
            let exp = jll.mapv(|v| (v - max).exp());
            let sum = exp.sum();
            proba.row_mut(i).assign(&(exp / sum));
        }

        Ok(proba)
    }
}
