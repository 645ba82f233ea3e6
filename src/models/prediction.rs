//! Интерактивное предсказание спроса для одного набора входных данных

use std::sync::Arc;

use crate::error::{DemandError, Result};
use crate::models::adapter::ModelAdapter;
use crate::preprocessing::{FeatureEngineer, FeatureFrame};
use crate::types::{DemandTier, PredictionResult, RawInputs};

/// Ниже этого значения спрос низкий
pub const LOW_DEMAND_CEILING: f64 = 2000.0;
/// Начиная с этого значения спрос высокий
pub const HIGH_DEMAND_FLOOR: f64 = 5000.0;

impl DemandTier {
    pub fn classify(prediction: f64) -> Self {
        if prediction < LOW_DEMAND_CEILING {
            DemandTier::Low
        } else if prediction < HIGH_DEMAND_FLOOR {
            DemandTier::Medium
        } else {
            DemandTier::High
        }
    }
}

pub struct PredictionPipeline {
    model: Arc<ModelAdapter>,
    historical_mean: f64,
}

impl PredictionPipeline {
    pub fn new(model: Arc<ModelAdapter>, historical_mean: f64) -> Self {
        Self {
            model,
            historical_mean,
        }
    }

    pub fn historical_mean(&self) -> f64 {
        self.historical_mean
    }

    pub fn predict(&self, raw: &RawInputs) -> Result<PredictionResult> {
        let raw_prediction = self.predict_raw(raw).map_err(DemandError::prediction_failed)?;

        // Регрессор без ограничений может уйти в минус
        let prediction = raw_prediction.max(0.0);
        let tier = DemandTier::classify(prediction);

        tracing::debug!(
            "Prediction: raw={:.2}, clamped={:.2}, tier={}",
            raw_prediction,
            prediction,
            tier.label()
        );

        Ok(PredictionResult {
            prediction,
            tier,
            historical_mean: self.historical_mean,
            delta: prediction - self.historical_mean,
        })
    }

    fn predict_raw(&self, raw: &RawInputs) -> Result<f64> {
        raw.validate().map_err(DemandError::InvalidInput)?;

        let row = FeatureEngineer::derive(raw);
        let predictions = self.model.predict(&FeatureFrame::from_rows(&[row]))?;

        predictions.first().copied().ok_or(DemandError::EmptyInput)
    }
}
