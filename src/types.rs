/// Типы данных для модуля прогнозирования спроса

use chrono::NaiveDate;
use serde::{Deserialize, Deserializer, Serialize};

/// Первый календарный год датасета (yr = 0)
pub const BASE_YEAR: i32 = 2011;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub enum Season {
    Spring = 1,
    Summer = 2,
    Fall = 3,
    Winter = 4,
}

impl Season {
    pub const ALL: [Season; 4] = [Season::Spring, Season::Summer, Season::Fall, Season::Winter];

    pub fn label(self) -> &'static str {
        match self {
            Season::Spring => "Spring",
            Season::Summer => "Summer",
            Season::Fall => "Fall",
            Season::Winter => "Winter",
        }
    }
}

impl TryFrom<u8> for Season {
    type Error = String;

    fn try_from(code: u8) -> Result<Self, Self::Error> {
        match code {
            1 => Ok(Season::Spring),
            2 => Ok(Season::Summer),
            3 => Ok(Season::Fall),
            4 => Ok(Season::Winter),
            other => Err(format!("season must be 1-4, got {}", other)),
        }
    }
}

impl From<Season> for u8 {
    fn from(season: Season) -> u8 {
        season as u8
    }
}

/// Погодная ситуация, упорядочена по тяжести
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub enum WeatherSituation {
    Clear = 1,
    Mist = 2,
    LightPrecipitation = 3,
    HeavyPrecipitation = 4,
}

impl WeatherSituation {
    pub const ALL: [WeatherSituation; 4] = [
        WeatherSituation::Clear,
        WeatherSituation::Mist,
        WeatherSituation::LightPrecipitation,
        WeatherSituation::HeavyPrecipitation,
    ];

    pub fn label(self) -> &'static str {
        match self {
            WeatherSituation::Clear => "Clear",
            WeatherSituation::Mist => "Mist/Cloudy",
            WeatherSituation::LightPrecipitation => "Light Rain/Snow",
            WeatherSituation::HeavyPrecipitation => "Heavy Rain/Storm",
        }
    }
}

impl TryFrom<u8> for WeatherSituation {
    type Error = String;

    fn try_from(code: u8) -> Result<Self, Self::Error> {
        match code {
            1 => Ok(WeatherSituation::Clear),
            2 => Ok(WeatherSituation::Mist),
            3 => Ok(WeatherSituation::LightPrecipitation),
            4 => Ok(WeatherSituation::HeavyPrecipitation),
            other => Err(format!("weathersit must be 1-4, got {}", other)),
        }
    }
}

impl From<WeatherSituation> for u8 {
    fn from(weather: WeatherSituation) -> u8 {
        weather as u8
    }
}

/// День недели, 0 = воскресенье
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub enum Weekday {
    Sunday = 0,
    Monday = 1,
    Tuesday = 2,
    Wednesday = 3,
    Thursday = 4,
    Friday = 5,
    Saturday = 6,
}

impl Weekday {
    pub const ALL: [Weekday; 7] = [
        Weekday::Sunday,
        Weekday::Monday,
        Weekday::Tuesday,
        Weekday::Wednesday,
        Weekday::Thursday,
        Weekday::Friday,
        Weekday::Saturday,
    ];

    pub fn label(self) -> &'static str {
        match self {
            Weekday::Sunday => "Sun",
            Weekday::Monday => "Mon",
            Weekday::Tuesday => "Tue",
            Weekday::Wednesday => "Wed",
            Weekday::Thursday => "Thu",
            Weekday::Friday => "Fri",
            Weekday::Saturday => "Sat",
        }
    }

    pub fn is_weekend(self) -> bool {
        matches!(self, Weekday::Sunday | Weekday::Saturday)
    }
}

impl TryFrom<u8> for Weekday {
    type Error = String;

    fn try_from(code: u8) -> Result<Self, Self::Error> {
        match code {
            0 => Ok(Weekday::Sunday),
            1 => Ok(Weekday::Monday),
            2 => Ok(Weekday::Tuesday),
            3 => Ok(Weekday::Wednesday),
            4 => Ok(Weekday::Thursday),
            5 => Ok(Weekday::Friday),
            6 => Ok(Weekday::Saturday),
            other => Err(format!("weekday must be 0-6, got {}", other)),
        }
    }
}

impl From<Weekday> for u8 {
    fn from(day: Weekday) -> u8 {
        day as u8
    }
}

/// Одна строка исторического датасета (один календарный день)
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HistoricalRecord {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub instant: Option<u32>,
    pub date: NaiveDate,
    pub season: Season,
    pub yr: u8, // 0 = 2011, 1 = 2012
    pub mnth: u8,
    pub holiday: bool,
    pub weekday: Weekday,
    pub workingday: bool,
    pub weathersit: WeatherSituation,
    pub temp: f64,
    pub atemp: f64,
    pub hum: f64,
    pub windspeed: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub casual: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub registered: Option<u32>,
    pub cnt: u32,
}

impl HistoricalRecord {
    /// Базовые поля записи в том виде, в каком их задаёт пользователь
    pub fn raw_inputs(&self) -> RawInputs {
        RawInputs {
            season: self.season,
            yr: self.yr,
            mnth: self.mnth,
            holiday: self.holiday,
            weekday: self.weekday,
            workingday: self.workingday,
            weathersit: self.weathersit,
            temp: self.temp,
            atemp: self.atemp,
            hum: self.hum,
            windspeed: self.windspeed,
        }
    }
}

/// 11 базовых полей, из которых строится строка признаков
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RawInputs {
    pub season: Season,
    pub yr: u8,
    pub mnth: u8,
    #[serde(deserialize_with = "deserialize_flag")]
    pub holiday: bool,
    pub weekday: Weekday,
    #[serde(deserialize_with = "deserialize_flag")]
    pub workingday: bool,
    pub weathersit: WeatherSituation,
    pub temp: f64,
    pub atemp: f64,
    pub hum: f64,
    pub windspeed: f64,
}

impl Default for RawInputs {
    // Значения по умолчанию интерактивной формы
    fn default() -> Self {
        Self {
            season: Season::Summer,
            yr: 1,
            mnth: 6,
            holiday: false,
            weekday: Weekday::Monday,
            workingday: true,
            weathersit: WeatherSituation::Clear,
            temp: 0.5,
            atemp: 0.5,
            hum: 0.5,
            windspeed: 0.2,
        }
    }
}

impl RawInputs {
    /// Проверка диапазонов, которые не выражены типами
    pub fn validate(&self) -> Result<(), String> {
        if self.yr > 1 {
            return Err(format!("yr must be 0 or 1, got {}", self.yr));
        }
        if !(1..=12).contains(&self.mnth) {
            return Err(format!("mnth must be 1-12, got {}", self.mnth));
        }
        for (name, value) in [
            ("temp", self.temp),
            ("atemp", self.atemp),
            ("hum", self.hum),
            ("windspeed", self.windspeed),
        ] {
            if !is_normalized(value) {
                return Err(format!("{} must be within [0, 1], got {}", name, value));
            }
        }
        Ok(())
    }
}

pub(crate) fn is_normalized(value: f64) -> bool {
    value.is_finite() && (0.0..=1.0).contains(&value)
}

/// Флаг принимается и как bool, и как 0/1
fn deserialize_flag<'de, D>(deserializer: D) -> Result<bool, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Flag {
        Bool(bool),
        Int(u8),
    }

    match Flag::deserialize(deserializer)? {
        Flag::Bool(value) => Ok(value),
        Flag::Int(0) => Ok(false),
        Flag::Int(1) => Ok(true),
        Flag::Int(other) => Err(serde::de::Error::custom(format!(
            "flag must be 0 or 1, got {}",
            other
        ))),
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DemandTier {
    Low,
    Medium,
    High,
}

impl DemandTier {
    pub fn label(self) -> &'static str {
        match self {
            DemandTier::Low => "Low",
            DemandTier::Medium => "Medium",
            DemandTier::High => "High",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PredictionResult {
    pub prediction: f64,
    pub tier: DemandTier,
    pub historical_mean: f64,
    pub delta: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatasetSummary {
    pub days: usize,
    pub total_count: u64,
    pub mean_count: f64,
    pub min_count: u32,
    pub max_count: u32,
    pub first_date: NaiveDate,
    pub last_date: NaiveDate,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GroupStat {
    pub key: u8,
    pub label: String,
    pub days: usize,
    pub mean_count: f64,
    #[serde(rename = "box")]
    pub box_summary: BoxSummary,
}

/// Пятичисловая сводка для box plot
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoxSummary {
    pub min: f64,
    pub q1: f64,
    pub median: f64,
    pub q3: f64,
    pub max: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HistogramBin {
    pub lower: f64,
    pub upper: f64,
    pub days: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DailyCount {
    pub date: NaiveDate,
    pub count: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CorrelationMatrix {
    pub columns: Vec<String>,
    /// None для пар с постоянным столбцом
    pub values: Vec<Vec<Option<f64>>>,
}

impl CorrelationMatrix {
    pub fn get(&self, a: &str, b: &str) -> Option<f64> {
        let i = self.columns.iter().position(|c| c == a)?;
        let j = self.columns.iter().position(|c| c == b)?;
        self.values[i][j]
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DashboardOutput {
    pub summary: DatasetSummary,
    pub by_season: Vec<GroupStat>,
    pub histogram: Vec<HistogramBin>,
    pub time_series: Vec<DailyCount>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisOutput {
    pub correlation: CorrelationMatrix,
    pub by_weather: Vec<GroupStat>,
    pub by_weekday: Vec<GroupStat>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelInfo {
    /// R² на полном датасете (без отложенной выборки)
    pub r2_score: f64,
    pub schema_version: u32,
    pub feature_names: Vec<String>,
    pub days: usize,
    pub first_date: NaiveDate,
    pub last_date: NaiveDate,
    pub min_count: u32,
    pub max_count: u32,
}
