//! Загрузка исторического датасета (day.csv)

use std::collections::HashSet;
use std::fs::File;
use std::io::Read;
use std::path::Path;

use chrono::NaiveDate;
use serde::Deserialize;

use crate::error::{DemandError, Result};
use crate::types::{is_normalized, HistoricalRecord, Season, WeatherSituation, Weekday};

/// Строка CSV до проверки инвариантов
#[derive(Debug, Deserialize)]
struct DayRow {
    #[serde(default)]
    instant: Option<u32>,
    dteday: NaiveDate,
    season: u8,
    yr: u8,
    mnth: u8,
    holiday: u8,
    weekday: u8,
    workingday: u8,
    weathersit: u8,
    temp: f64,
    atemp: f64,
    hum: f64,
    windspeed: f64,
    #[serde(default)]
    casual: Option<u32>,
    #[serde(default)]
    registered: Option<u32>,
    cnt: u32,
}

impl TryFrom<DayRow> for HistoricalRecord {
    type Error = String;

    fn try_from(row: DayRow) -> std::result::Result<Self, Self::Error> {
        if row.yr > 1 {
            return Err(format!("yr must be 0 or 1, got {}", row.yr));
        }
        if !(1..=12).contains(&row.mnth) {
            return Err(format!("mnth must be 1-12, got {}", row.mnth));
        }
        for (name, value) in [
            ("temp", row.temp),
            ("atemp", row.atemp),
            ("hum", row.hum),
            ("windspeed", row.windspeed),
        ] {
            if !is_normalized(value) {
                return Err(format!("{} must be within [0, 1], got {}", name, value));
            }
        }

        Ok(HistoricalRecord {
            instant: row.instant,
            date: row.dteday,
            season: Season::try_from(row.season)?,
            yr: row.yr,
            mnth: row.mnth,
            holiday: parse_flag("holiday", row.holiday)?,
            weekday: Weekday::try_from(row.weekday)?,
            workingday: parse_flag("workingday", row.workingday)?,
            weathersit: WeatherSituation::try_from(row.weathersit)?,
            temp: row.temp,
            atemp: row.atemp,
            hum: row.hum,
            windspeed: row.windspeed,
            casual: row.casual,
            registered: row.registered,
            cnt: row.cnt,
        })
    }
}

fn parse_flag(name: &str, value: u8) -> std::result::Result<bool, String> {
    match value {
        0 => Ok(false),
        1 => Ok(true),
        other => Err(format!("{} must be 0 or 1, got {}", name, other)),
    }
}

/// Неизменяемый набор исторических записей
#[derive(Debug, Clone)]
pub struct Dataset {
    records: Vec<HistoricalRecord>,
}

impl Dataset {
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let file = File::open(path).map_err(|e| {
            DemandError::DataUnavailable(format!("cannot open {}: {}", path.display(), e))
        })?;

        let dataset = Self::from_reader(file)?;
        tracing::info!(
            "Loaded {} daily records from {}",
            dataset.records().len(),
            path.display()
        );
        Ok(dataset)
    }

    pub fn from_reader<R: Read>(reader: R) -> Result<Self> {
        let mut reader = csv::Reader::from_reader(reader);
        let mut records = Vec::new();

        for (i, result) in reader.deserialize::<DayRow>().enumerate() {
            // строка 1 занята заголовком
            let line = i + 2;
            let row = result
                .map_err(|e| DemandError::DataUnavailable(format!("line {}: {}", line, e)))?;
            let record = HistoricalRecord::try_from(row)
                .map_err(|e| DemandError::DataUnavailable(format!("line {}: {}", line, e)))?;
            records.push(record);
        }

        Self::from_records(records)
    }

    pub fn from_records(records: Vec<HistoricalRecord>) -> Result<Self> {
        if records.is_empty() {
            return Err(DemandError::DataUnavailable(
                "dataset has no records".to_string(),
            ));
        }

        let mut seen = HashSet::with_capacity(records.len());
        for record in &records {
            if !seen.insert(record.date) {
                return Err(DemandError::DataUnavailable(format!(
                    "duplicate record for {}",
                    record.date
                )));
            }
        }

        Ok(Self { records })
    }

    pub fn records(&self) -> &[HistoricalRecord] {
        &self.records
    }

    /// Первые `limit` записей в порядке файла
    pub fn head(&self, limit: usize) -> &[HistoricalRecord] {
        &self.records[..limit.min(self.records.len())]
    }
}
