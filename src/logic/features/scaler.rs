//! Standardization: (x - mean) / std per column

use ndarray::{Array1, Array2, Axis};
use serde::{Deserialize, Serialize};

use crate::error::{DetectError, DetectResult};

/// Feature-wise standard scaler over the encoded feature matrix
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StandardScaler {
    mean: Array1<f64>,
    /// Population std; zero-variance columns keep 1.0
    scale: Array1<f64>,
}

impl StandardScaler {
    pub fn fit(x: &Array2<f64>) -> DetectResult<Self> {
        if let Some((j, _)) = x
            .columns()
            .into_iter()
            .enumerate()
            .find(|(_, col)| col.iter().any(|v| !v.is_finite()))
        {
            return Err(DetectError::Model(format!(
                "cannot fit scaler: column {} contains missing or non-finite values",
                j
            )));
        }

        let mean = x.mean_axis(Axis(0)).ok_or_else(|| {
            DetectError::Model("cannot fit scaler on an empty matrix".to_string())
        })?;
        let scale = x
            .var_axis(Axis(0), 0.0)
            .mapv(|v| if v == 0.0 { 1.0 } else { v.sqrt() });

        Ok(Self { mean, scale })
    }

    pub fn transform(&self, x: &Array2<f64>) -> DetectResult<Array2<f64>> {
        if x.ncols() != self.n_features() {
            return Err(DetectError::ShapeMismatch {
                expected: format!("{} features", self.n_features()),
                actual: format!("{} features", x.ncols()),
            });
        }

        Ok((x - &self.mean) / &self.scale)
    }

    pub fn fit_transform(x: &Array2<f64>) -> DetectResult<(Self, Array2<f64>)> {
        let scaler = Self::fit(x)?;
        let scaled = scaler.transform(x)?;
        Ok((scaler, scaled))
    }

    pub fn n_features(&self) -> usize {
        self.mean.len()
    }

    pub fn mean(&self) -> &Array1<f64> {
        &self.mean
    }

    pub fn scale(&self) -> &Array1<f64> {
        &self.scale
    }
}
