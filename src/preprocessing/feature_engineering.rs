//! Feature engineering для модели спроса
//!
//! Правила вывода признаков ниже являются внешним контрактом: артефакт модели
//! был обучен ровно на них, и любое расхождение молча портит предсказания.
//! Изменение правил или схемы требует повторной проверки артефакта и
//! увеличения `FEATURE_SCHEMA_VERSION`.

use ndarray::{Array1, Array2};
use serde::Serialize;

use crate::error::{DemandError, Result};
use crate::types::{HistoricalRecord, RawInputs, BASE_YEAR};

pub const FEATURE_SCHEMA_VERSION: u32 = 1;

/// Имена признаков в порядке, в котором модель их ожидает
pub const FEATURE_SCHEMA: [&str; 16] = [
    "season",
    "yr",
    "mnth",
    "holiday",
    "weekday",
    "workingday",
    "weathersit",
    "temp",
    "atemp",
    "hum",
    "windspeed",
    "month",
    "day_of_week",
    "year",
    "is_weekend",
    "temp_hum_interaction",
];

/// Строка признаков для одного предсказания
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct FeatureRow {
    pub season: f64,
    pub yr: f64,
    pub mnth: f64,
    pub holiday: f64,
    pub weekday: f64,
    pub workingday: f64,
    pub weathersit: f64,
    pub temp: f64,
    pub atemp: f64,
    pub hum: f64,
    pub windspeed: f64,
    pub month: f64,
    pub day_of_week: f64,
    pub year: f64,
    pub is_weekend: f64,
    pub temp_hum_interaction: f64,
}

impl FeatureRow {
    /// Значения в порядке `FEATURE_SCHEMA`
    pub fn values(&self) -> [f64; 16] {
        [
            self.season,
            self.yr,
            self.mnth,
            self.holiday,
            self.weekday,
            self.workingday,
            self.weathersit,
            self.temp,
            self.atemp,
            self.hum,
            self.windspeed,
            self.month,
            self.day_of_week,
            self.year,
            self.is_weekend,
            self.temp_hum_interaction,
        ]
    }
}

/// Таблица признаков с именованными столбцами
#[derive(Debug, Clone, PartialEq)]
pub struct FeatureFrame {
    columns: Vec<String>,
    values: Array2<f64>,
}

impl FeatureFrame {
    pub fn new(columns: Vec<String>, values: Array2<f64>) -> Result<Self> {
        if columns.len() != values.ncols() {
            return Err(DemandError::InvalidInput(format!(
                "{} column names for {} columns",
                columns.len(),
                values.ncols()
            )));
        }
        Ok(Self { columns, values })
    }

    pub fn from_rows(rows: &[FeatureRow]) -> Self {
        let mut values = Array2::zeros((rows.len(), FEATURE_SCHEMA.len()));
        for (i, row) in rows.iter().enumerate() {
            for (j, value) in row.values().into_iter().enumerate() {
                values[[i, j]] = value;
            }
        }

        Self {
            columns: FEATURE_SCHEMA.iter().map(|s| s.to_string()).collect(),
            values,
        }
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn values(&self) -> &Array2<f64> {
        &self.values
    }

    pub fn nrows(&self) -> usize {
        self.values.nrows()
    }

    pub fn is_empty(&self) -> bool {
        self.values.nrows() == 0
    }

    /// Копия таблицы без одного столбца
    pub fn without_column(&self, name: &str) -> Self {
        let keep: Vec<usize> = (0..self.columns.len())
            .filter(|&j| self.columns[j] != name)
            .collect();

        let mut values = Array2::zeros((self.nrows(), keep.len()));
        for (new_j, &old_j) in keep.iter().enumerate() {
            values.column_mut(new_j).assign(&self.values.column(old_j));
        }

        Self {
            columns: keep.iter().map(|&j| self.columns[j].clone()).collect(),
            values,
        }
    }
}

impl From<&[FeatureRow]> for FeatureFrame {
    fn from(rows: &[FeatureRow]) -> Self {
        Self::from_rows(rows)
    }
}

pub struct FeatureEngineer;

impl FeatureEngineer {
    /// Вывод строки признаков из базовых полей
    pub fn derive(raw: &RawInputs) -> FeatureRow {
        let weekday = u8::from(raw.weekday) as f64;
        let mnth = raw.mnth as f64;

        FeatureRow {
            season: u8::from(raw.season) as f64,
            yr: raw.yr as f64,
            mnth,
            holiday: flag(raw.holiday),
            weekday,
            workingday: flag(raw.workingday),
            weathersit: u8::from(raw.weathersit) as f64,
            temp: raw.temp,
            atemp: raw.atemp,
            hum: raw.hum,
            windspeed: raw.windspeed,
            month: mnth,
            day_of_week: weekday,
            year: (BASE_YEAR + raw.yr as i32) as f64,
            is_weekend: flag(raw.weekday.is_weekend()),
            temp_hum_interaction: raw.temp * raw.hum,
        }
    }

    pub fn derive_batch(records: &[HistoricalRecord]) -> Vec<FeatureRow> {
        records
            .iter()
            .map(|record| Self::derive(&record.raw_inputs()))
            .collect()
    }

    /// Матрица признаков и целевая переменная (cnt) для оценки модели
    pub fn design_matrix(records: &[HistoricalRecord]) -> (FeatureFrame, Array1<f64>) {
        let rows = Self::derive_batch(records);
        let targets = records.iter().map(|r| r.cnt as f64).collect();
        (FeatureFrame::from_rows(&rows), targets)
    }
}

fn flag(value: bool) -> f64 {
    if value {
        1.0
    } else {
        0.0
    }
}
