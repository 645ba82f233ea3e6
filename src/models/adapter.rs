//! Адаптер над готовым (обученным вне сервиса) регрессором
//!
//! Сервис не заглядывает внутрь артефакта: всё, что ему известно, это схема
//! признаков и операция `predict`. Столбцы таблицы сверяются со схемой
//! артефакта по именам (порядок не важен) и переставляются в его порядок.

#![allow(non_snake_case)]

use ndarray::{Array1, Array2};

use crate::error::{DemandError, Result};
use crate::preprocessing::FeatureFrame;

/// Обученная регрессионная модель с фиксированной схемой признаков
pub trait RegressionModel: Send + Sync {
    /// Имена признаков в порядке столбцов, который ожидает `predict`
    fn feature_names(&self) -> &[String];

    fn predict(&self, X: &Array2<f64>) -> Result<Array1<f64>>;
}

pub struct ModelAdapter {
    model: Box<dyn RegressionModel>,
}

impl ModelAdapter {
    pub fn new<M: RegressionModel + 'static>(model: M) -> Self {
        Self {
            model: Box::new(model),
        }
    }

    pub fn feature_names(&self) -> &[String] {
        self.model.feature_names()
    }

    /// Предсказание для каждой строки, в том же порядке
    pub fn predict(&self, frame: &FeatureFrame) -> Result<Vec<f64>> {
        let X = self.align(frame)?;
        let predictions = self.model.predict(&X)?;

        if predictions.len() != frame.nrows() {
            return Err(DemandError::InvalidModelOutput(format!(
                "{} predictions for {} rows",
                predictions.len(),
                frame.nrows()
            )));
        }
        if let Some(row) = predictions.iter().position(|p| !p.is_finite()) {
            return Err(DemandError::InvalidModelOutput(format!(
                "non-finite prediction {} in row {}",
                predictions[row], row
            )));
        }

        Ok(predictions.to_vec())
    }

    /// Коэффициент детерминации R² на размеченных данных
    pub fn score(&self, frame: &FeatureFrame, targets: &[f64]) -> Result<f64> {
        if frame.is_empty() {
            return Err(DemandError::EmptyInput);
        }
        if frame.nrows() != targets.len() {
            return Err(DemandError::TargetLengthMismatch {
                rows: frame.nrows(),
                targets: targets.len(),
            });
        }

        let predictions = self.predict(frame)?;
        Ok(r2_score(targets, &predictions))
    }

    /// Переставляет столбцы таблицы в порядок схемы модели
    fn align(&self, frame: &FeatureFrame) -> Result<Array2<f64>> {
        let expected = self.model.feature_names();
        let columns = frame.columns();

        let missing: Vec<String> = expected
            .iter()
            .filter(|name| !columns.contains(name))
            .cloned()
            .collect();

        // Лишние и повторяющиеся столбцы одинаково недопустимы
        let mut unexpected = Vec::new();
        for (j, name) in columns.iter().enumerate() {
            if !expected.contains(name) || columns[..j].contains(name) {
                unexpected.push(name.clone());
            }
        }

        if !missing.is_empty() || !unexpected.is_empty() {
            return Err(DemandError::SchemaMismatch {
                missing,
                unexpected,
            });
        }

        let source = frame.values();
        let mut X = Array2::zeros((frame.nrows(), expected.len()));
        for (j, name) in expected.iter().enumerate() {
            // после проверок выше позиция всегда найдена
            if let Some(src) = columns.iter().position(|c| c == name) {
                X.column_mut(j).assign(&source.column(src));
            }
        }

        Ok(X)
    }
}

/// R² = 1 - SS_res / SS_tot.
///
/// Для целевой переменной без разброса возвращает 1.0 при точном совпадении
/// и 0.0 иначе, чтобы не получать NaN или бесконечность.
pub fn r2_score(y_true: &[f64], y_pred: &[f64]) -> f64 {
    let n = y_true.len() as f64;
    let y_mean = y_true.iter().sum::<f64>() / n;

    let ss_res: f64 = y_true
        .iter()
        .zip(y_pred.iter())
        .map(|(t, p)| (t - p).powi(2))
        .sum();
    let ss_tot: f64 = y_true.iter().map(|t| (t - y_mean).powi(2)).sum();

    if ss_tot == 0.0 {
        return if ss_res == 0.0 { 1.0 } else { 0.0 };
    }

    1.0 - ss_res / ss_tot
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::preprocessing::{FeatureEngineer, FEATURE_SCHEMA};
    use crate::types::RawInputs;
    use approx::assert_relative_eq;

    /// Фейковая модель: значение одного признака, умноженное на коэффициент
    pub(crate) struct ScriptedModel {
        names: Vec<String>,
        column: usize,
        factor: f64,
        offset: f64,
    }

    impl ScriptedModel {
        pub(crate) fn constant(value: f64) -> Self {
            Self::linear_in("season", 0.0, value)
        }

        pub(crate) fn linear_in(feature: &str, factor: f64, offset: f64) -> Self {
            let names: Vec<String> = FEATURE_SCHEMA.iter().rev().map(|s| s.to_string()).collect();
            let column = names.iter().position(|n| n == feature).unwrap();
            Self {
                names,
                column,
                factor,
                offset,
            }
        }
    }

    impl RegressionModel for ScriptedModel {
        fn feature_names(&self) -> &[String] {
            &self.names
        }

        fn predict(&self, X: &Array2<f64>) -> Result<Array1<f64>> {
            Ok(X.column(self.column).mapv(|v| v * self.factor + self.offset))
        }
    }

    fn frame_for(inputs: &[RawInputs]) -> FeatureFrame {
        let rows: Vec<_> = inputs.iter().map(FeatureEngineer::derive).collect();
        FeatureFrame::from_rows(&rows)
    }

    #[test]
    fn predict_reorders_columns_by_name() {
        // Модель хранит схему в обратном порядке и читает temp_hum_interaction
        let adapter = ModelAdapter::new(ScriptedModel::linear_in("temp_hum_interaction", 1000.0, 0.0));
        let inputs = [
            RawInputs::default(),
            RawInputs {
                temp: 0.8,
                hum: 0.5,
                ..RawInputs::default()
            },
        ];

        let predictions = adapter.predict(&frame_for(&inputs)).unwrap();
        assert_eq!(predictions.len(), 2);
        assert_relative_eq!(predictions[0], 250.0);
        assert_relative_eq!(predictions[1], 400.0);
    }

    #[test]
    fn predict_rejects_missing_column() {
        let adapter = ModelAdapter::new(ScriptedModel::constant(100.0));
        let frame = frame_for(&[RawInputs::default()]).without_column("is_weekend");

        match adapter.predict(&frame) {
            Err(DemandError::SchemaMismatch { missing, unexpected }) => {
                assert_eq!(missing, vec!["is_weekend".to_string()]);
                assert!(unexpected.is_empty());
            }
            other => panic!("unexpected result: {other:?}"),
        }
    }

    #[test]
    fn predict_rejects_unexpected_and_duplicate_columns() {
        let adapter = ModelAdapter::new(ScriptedModel::constant(100.0));

        let mut columns: Vec<String> = FEATURE_SCHEMA.iter().map(|s| s.to_string()).collect();
        columns.push("cnt".to_string());
        let frame = FeatureFrame::new(columns, Array2::zeros((1, 17))).unwrap();
        assert!(matches!(
            adapter.predict(&frame),
            Err(DemandError::SchemaMismatch { ref unexpected, .. }) if unexpected == &vec!["cnt".to_string()]
        ));

        let mut columns: Vec<String> = FEATURE_SCHEMA.iter().map(|s| s.to_string()).collect();
        columns.push("temp".to_string());
        let frame = FeatureFrame::new(columns, Array2::zeros((1, 17))).unwrap();
        assert!(matches!(
            adapter.predict(&frame),
            Err(DemandError::SchemaMismatch { .. })
        ));
    }

    #[test]
    fn score_on_empty_rows_is_empty_input() {
        let adapter = ModelAdapter::new(ScriptedModel::constant(100.0));
        let result = adapter.score(&FeatureFrame::from_rows(&[]), &[]);
        assert!(matches!(result, Err(DemandError::EmptyInput)));
    }

    #[test]
    fn score_checks_target_length() {
        let adapter = ModelAdapter::new(ScriptedModel::constant(100.0));
        let result = adapter.score(&frame_for(&[RawInputs::default()]), &[1.0, 2.0]);
        assert!(matches!(
            result,
            Err(DemandError::TargetLengthMismatch { rows: 1, targets: 2 })
        ));
    }

    #[test]
    fn non_finite_predictions_are_rejected() {
        let adapter = ModelAdapter::new(ScriptedModel::linear_in("mnth", f64::INFINITY, 0.0));
        let frame = frame_for(&[RawInputs::default(), RawInputs::default()]);

        assert!(matches!(
            adapter.predict(&frame),
            Err(DemandError::InvalidModelOutput(_))
        ));
        // R² не должен превращаться в NaN
        assert!(matches!(
            adapter.score(&frame, &[1.0, 2.0]),
            Err(DemandError::InvalidModelOutput(_))
        ));
    }

    #[test]
    fn score_of_exact_model_is_one() {
        let adapter = ModelAdapter::new(ScriptedModel::linear_in("mnth", 100.0, 0.0));
        let inputs: Vec<RawInputs> = (1..=12)
            .map(|mnth| RawInputs {
                mnth,
                ..RawInputs::default()
            })
            .collect();
        let targets: Vec<f64> = (1..=12).map(|m| m as f64 * 100.0).collect();

        let score = adapter.score(&frame_for(&inputs), &targets).unwrap();
        assert_relative_eq!(score, 1.0);
    }

    #[test]
    fn r2_matches_reference_values() {
        let y_true = [3.0, -0.5, 2.0, 7.0];
        let y_pred = [2.5, 0.0, 2.0, 8.0];
        assert_relative_eq!(r2_score(&y_true, &y_pred), 0.948_608_137_044_967_9, epsilon = 1e-12);

        // предсказание средним даёт ноль, хуже среднего — отрицательное значение
        assert_relative_eq!(r2_score(&[1.0, 2.0, 3.0], &[2.0, 2.0, 2.0]), 0.0);
        assert!(r2_score(&[1.0, 2.0, 3.0], &[3.0, 2.0, 1.0]) < 0.0);
    }

    #[test]
    fn r2_without_variance_is_finite() {
        assert_eq!(r2_score(&[5.0, 5.0], &[5.0, 5.0]), 1.0);
        assert_eq!(r2_score(&[5.0, 5.0], &[4.0, 6.0]), 0.0);
    }
}
