use crate::error::{AppError, Result};
use ndarray::{Array1, Array2, Axis};
use serde::{Deserialize, Serialize};

/// Per-feature standardization to zero mean and unit variance
///
/// Uses the population variance. Features whose variance is (numerically) zero
/// keep a scale of 1.0 so they are only centred.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StandardScaler {
    mean: Array1<f64>,
    scale: Array1<f64>,
    n_samples_seen: usize,
}

impl StandardScaler {
    /// Learn mean and scale from `x` (rows = samples)
    pub fn fit(x: &Array2<f64>) -> Result<Self> {
        if x.nrows() == 0 {
            return Err(AppError::Internal(
                "Cannot fit a scaler on zero samples".to_string(),
            ));
        }

        let mean = x
            .mean_axis(Axis(0))
            .ok_or_else(|| AppError::Internal("Failed to compute feature means".to_string()))?;

        let scale = x.var_axis(Axis(0), 0.0).mapv(|var| {
            let std = var.sqrt();
            if std < 10.0 * f64::EPSILON {
                1.0
            } else {
                std
            }
        });

        Ok(Self {
            mean,
            scale,
            n_samples_seen: x.nrows(),
        })
    }

    /// Standardize `x` with the learned parameters
    pub fn transform(&self, x: &Array2<f64>) -> Result<Array2<f64>> {
        if x.ncols() != self.n_features() {
            return Err(AppError::Internal(format!(
                "Scaler was fitted on {} features, got {}",
                self.n_features(),
                x.ncols()
            )));
        }

        let centered = x - &self.mean;
        Ok(centered / &self.scale)
    }

    pub fn n_features(&self) -> usize {
        self.mean.len()
    }

    pub fn n_samples_seen(&self) -> usize {
        self.n_samples_seen
    }

    pub fn mean(&self) -> &Array1<f64> {
        &self.mean
    }

    pub fn scale(&self) -> &Array1<f64> {
        &self.scale
    }
}
