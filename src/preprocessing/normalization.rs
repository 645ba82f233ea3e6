//! Стандартизация признаков по параметрам из артефакта модели

#![allow(non_snake_case)]

use ndarray::{Array1, Array2};

use crate::error::{DemandError, Result};

/// Уже обученный StandardScaler: (X - mean) / scale
#[derive(Debug, Clone)]
pub struct DataNormalizer {
    mean: Array1<f64>,
    scale: Array1<f64>,
}

impl DataNormalizer {
    pub fn from_params(mean: Vec<f64>, scale: Vec<f64>) -> Result<Self> {
        if mean.len() != scale.len() {
            return Err(DemandError::ModelUnavailable(format!(
                "scaler has {} means but {} scales",
                mean.len(),
                scale.len()
            )));
        }
        if mean.iter().chain(scale.iter()).any(|v| !v.is_finite()) {
            return Err(DemandError::ModelUnavailable(
                "scaler parameters must be finite".to_string(),
            ));
        }

        // Постоянные признаки при обучении дают scale = 0, их не масштабируем
        let scale = scale
            .into_iter()
            .map(|s| if s.abs() < 1e-10 { 1.0 } else { s })
            .collect();

        Ok(Self {
            mean: Array1::from(mean),
            scale,
        })
    }

    pub fn n_features(&self) -> usize {
        self.mean.len()
    }

    pub fn transform(&self, X: &Array2<f64>) -> Result<Array2<f64>> {
        if X.ncols() != self.n_features() {
            return Err(DemandError::InvalidInput(format!(
                "scaler expects {} columns, got {}",
                self.n_features(),
                X.ncols()
            )));
        }

        let mut normalized = X.clone();
        for mut row in normalized.rows_mut() {
            for (i, val) in row.iter_mut().enumerate() {
                *val = (*val - self.mean[i]) / self.scale[i];
            }
        }

        Ok(normalized)
    }
}
