//! Загрузка артефакта модели: StandardScaler + линейная регрессия в JSON

#![allow(non_snake_case)]

use std::fs;
use std::path::Path;

use ndarray::{Array1, Array2};
use serde::{Deserialize, Serialize};

use crate::error::{DemandError, Result};
use crate::models::adapter::RegressionModel;
use crate::preprocessing::{DataNormalizer, FEATURE_SCHEMA, FEATURE_SCHEMA_VERSION};

pub const ARTIFACT_FORMAT_VERSION: u32 = 1;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScalerParams {
    pub mean: Vec<f64>,
    pub scale: Vec<f64>,
}

/// Содержимое файла артефакта
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineArtifact {
    pub format_version: u32,
    pub schema_version: u32,
    pub feature_names: Vec<String>,
    #[serde(default)]
    pub scaler: Option<ScalerParams>,
    pub coefficients: Vec<f64>,
    pub intercept: f64,
}

#[derive(Debug, Clone)]
pub struct LinearPipelineModel {
    feature_names: Vec<String>,
    normalizer: Option<DataNormalizer>,
    coefficients: Array1<f64>,
    intercept: f64,
}

impl LinearPipelineModel {
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let text = fs::read_to_string(path).map_err(|e| {
            DemandError::ModelUnavailable(format!("cannot read {}: {}", path.display(), e))
        })?;

        let model = Self::from_json(&text)?;
        tracing::info!(
            "Loaded model artifact from {} ({} features, scaler: {})",
            path.display(),
            model.feature_names.len(),
            model.normalizer.is_some()
        );
        Ok(model)
    }

    pub fn from_json(text: &str) -> Result<Self> {
        let artifact: PipelineArtifact = serde_json::from_str(text)
            .map_err(|e| DemandError::ModelUnavailable(format!("malformed artifact: {}", e)))?;
        Self::from_artifact(artifact)
    }

    pub fn from_artifact(artifact: PipelineArtifact) -> Result<Self> {
        if artifact.format_version != ARTIFACT_FORMAT_VERSION {
            return Err(DemandError::ModelUnavailable(format!(
                "unsupported artifact format {}",
                artifact.format_version
            )));
        }
        if artifact.schema_version != FEATURE_SCHEMA_VERSION {
            return Err(DemandError::ModelUnavailable(format!(
                "artifact was fit against feature schema v{}, this build derives v{}",
                artifact.schema_version, FEATURE_SCHEMA_VERSION
            )));
        }

        let mut sorted_names: Vec<&str> = artifact.feature_names.iter().map(String::as_str).collect();
        sorted_names.sort_unstable();
        let mut schema = FEATURE_SCHEMA.to_vec();
        schema.sort_unstable();
        if sorted_names != schema {
            return Err(DemandError::ModelUnavailable(format!(
                "artifact features {:?} do not match the derived feature set",
                artifact.feature_names
            )));
        }

        let n_features = artifact.feature_names.len();
        if artifact.coefficients.len() != n_features {
            return Err(DemandError::ModelUnavailable(format!(
                "{} coefficients for {} features",
                artifact.coefficients.len(),
                n_features
            )));
        }
        if artifact.coefficients.iter().any(|c| !c.is_finite()) || !artifact.intercept.is_finite() {
            return Err(DemandError::ModelUnavailable(
                "coefficients must be finite".to_string(),
            ));
        }

        let normalizer = match artifact.scaler {
            Some(params) => {
                let normalizer = DataNormalizer::from_params(params.mean, params.scale)?;
                if normalizer.n_features() != n_features {
                    return Err(DemandError::ModelUnavailable(format!(
                        "scaler has {} features, model has {}",
                        normalizer.n_features(),
                        n_features
                    )));
                }
                Some(normalizer)
            }
            None => None,
        };

        Ok(Self {
            feature_names: artifact.feature_names,
            normalizer,
            coefficients: Array1::from(artifact.coefficients),
            intercept: artifact.intercept,
        })
    }
}

impl RegressionModel for LinearPipelineModel {
    fn feature_names(&self) -> &[String] {
        &self.feature_names
    }

    fn predict(&self, X: &Array2<f64>) -> Result<Array1<f64>> {
        if X.ncols() != self.coefficients.len() {
            return Err(DemandError::InvalidInput(format!(
                "model expects {} columns, got {}",
                self.coefficients.len(),
                X.ncols()
            )));
        }

        let predictions = match &self.normalizer {
            Some(normalizer) => normalizer.transform(X)?.dot(&self.coefficients),
            None => X.dot(&self.coefficients),
        };

        Ok(predictions + self.intercept)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn artifact() -> PipelineArtifact {
        let mut coefficients = vec![0.0; 16];
        coefficients[7] = 1000.0; // temp
        coefficients[13] = 2.0; // year
        PipelineArtifact {
            format_version: 1,
            schema_version: 1,
            feature_names: FEATURE_SCHEMA.iter().map(|s| s.to_string()).collect(),
            scaler: None,
            coefficients,
            intercept: -4000.0,
        }
    }

    #[test]
    fn predicts_linear_combination() {
        let model = LinearPipelineModel::from_artifact(artifact()).unwrap();
        let mut X = Array2::zeros((1, 16));
        X[[0, 7]] = 0.5;
        X[[0, 13]] = 2012.0;

        let predictions = model.predict(&X).unwrap();
        assert_relative_eq!(predictions[0], 500.0 + 4024.0 - 4000.0);
    }

    #[test]
    fn applies_scaler_before_coefficients() {
        let mut art = artifact();
        art.scaler = Some(ScalerParams {
            mean: vec![0.5; 16],
            scale: vec![0.25; 16],
        });
        let model = LinearPipelineModel::from_artifact(art).unwrap();

        let mut X = Array2::from_elem((1, 16), 0.5);
        X[[0, 7]] = 0.75;
        // temp -> (0.75 - 0.5) / 0.25 = 1.0, остальные признаки обнуляются
        let predictions = model.predict(&X).unwrap();
        assert_relative_eq!(predictions[0], 1000.0 - 4000.0);
    }

    #[test]
    fn loads_from_json_file() {
        let mut file = NamedTempFile::new().unwrap();
        write!(file, "{}", serde_json::to_string(&artifact()).unwrap()).unwrap();

        let model = LinearPipelineModel::load(file.path()).unwrap();
        assert_eq!(model.feature_names().len(), 16);
    }

    #[test]
    fn broken_artifacts_are_model_unavailable() {
        assert!(matches!(
            LinearPipelineModel::load("/nonexistent/model.json"),
            Err(DemandError::ModelUnavailable(_))
        ));
        assert!(matches!(
            LinearPipelineModel::from_json("{not json"),
            Err(DemandError::ModelUnavailable(_))
        ));

        let mut wrong_version = artifact();
        wrong_version.schema_version = 2;
        let mut short = artifact();
        short.coefficients.pop();
        let mut renamed = artifact();
        renamed.feature_names[13] = "calendar_year".to_string();
        let mut bad_scaler = artifact();
        bad_scaler.scaler = Some(ScalerParams {
            mean: vec![0.0; 3],
            scale: vec![1.0; 3],
        });

        for art in [wrong_version, short, renamed, bad_scaler] {
            assert!(matches!(
                LinearPipelineModel::from_artifact(art),
                Err(DemandError::ModelUnavailable(_))
            ));
        }
    }

    #[test]
    fn feature_order_may_differ_from_schema() {
        let mut art = artifact();
        art.feature_names.reverse();
        art.coefficients.reverse();
        let model = LinearPipelineModel::from_artifact(art).unwrap();
        assert_eq!(model.feature_names()[0], "temp_hum_interaction");
    }
}
