/// Описательная статистика по историческому датасету

use std::collections::BTreeMap;

use ndarray::{Array2, Axis};

use crate::dataset::Dataset;
use crate::types::{
    AnalysisOutput, BoxSummary, CorrelationMatrix, DailyCount, DashboardOutput, DatasetSummary,
    GroupStat, HistogramBin, HistoricalRecord,
};

pub const DEFAULT_HISTOGRAM_BINS: usize = 30;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GroupKey {
    Season,
    Weekday,
    Weather,
}

impl GroupKey {
    fn of(self, record: &HistoricalRecord) -> (u8, &'static str) {
        match self {
            GroupKey::Season => (record.season.into(), record.season.label()),
            GroupKey::Weekday => (record.weekday.into(), record.weekday.label()),
            GroupKey::Weather => (record.weathersit.into(), record.weathersit.label()),
        }
    }
}

/// Только чтение; датасет не изменяется
pub struct DescriptiveAggregator<'a> {
    dataset: &'a Dataset,
}

impl<'a> DescriptiveAggregator<'a> {
    pub fn new(dataset: &'a Dataset) -> Self {
        Self { dataset }
    }

    fn records(&self) -> &'a [HistoricalRecord] {
        self.dataset.records()
    }

    pub fn summary(&self) -> DatasetSummary {
        let records = self.records();

        let total_count: u64 = records.iter().map(|r| r.cnt as u64).sum();
        let min_count = records.iter().map(|r| r.cnt).min().unwrap_or(0);
        let max_count = records.iter().map(|r| r.cnt).max().unwrap_or(0);
        // Dataset гарантирует хотя бы одну запись
        let first_date = records.iter().map(|r| r.date).fold(records[0].date, std::cmp::min);
        let last_date = records.iter().map(|r| r.date).fold(records[0].date, std::cmp::max);

        DatasetSummary {
            days: records.len(),
            total_count,
            mean_count: total_count as f64 / records.len() as f64,
            min_count,
            max_count,
            first_date,
            last_date,
        }
    }

    /// Группы в порядке кода (для дней недели 0 = воскресенье)
    pub fn group_by(&self, key: GroupKey) -> Vec<GroupStat> {
        let mut groups: BTreeMap<u8, (&'static str, Vec<f64>)> = BTreeMap::new();
        for record in self.records() {
            let (code, label) = key.of(record);
            groups
                .entry(code)
                .or_insert_with(|| (label, Vec::new()))
                .1
                .push(record.cnt as f64);
        }

        groups
            .into_iter()
            .map(|(code, (label, mut counts))| {
                counts.sort_by(|a, b| a.total_cmp(b));
                GroupStat {
                    key: code,
                    label: label.to_string(),
                    days: counts.len(),
                    mean_count: counts.iter().sum::<f64>() / counts.len() as f64,
                    box_summary: box_summary(&counts),
                }
            })
            .collect()
    }

    /// Ряд (дата, количество), упорядоченный по дате
    pub fn time_series(&self) -> Vec<DailyCount> {
        let mut series: Vec<DailyCount> = self
            .records()
            .iter()
            .map(|r| DailyCount {
                date: r.date,
                count: r.cnt,
            })
            .collect();
        series.sort_by_key(|point| point.date);
        series
    }

    /// Гистограмма cnt с равными интервалами; последний интервал закрыт справа
    pub fn histogram(&self, bins: usize) -> Vec<HistogramBin> {
        let bins = bins.max(1);
        let summary = self.summary();
        let (mut lower, mut upper) = (summary.min_count as f64, summary.max_count as f64);
        if lower == upper {
            lower -= 0.5;
            upper += 0.5;
        }
        let width = (upper - lower) / bins as f64;

        let mut days = vec![0usize; bins];
        for record in self.records() {
            let idx = ((record.cnt as f64 - lower) / width) as usize;
            days[idx.min(bins - 1)] += 1;
        }

        days.into_iter()
            .enumerate()
            .map(|(i, days)| HistogramBin {
                lower: lower + width * i as f64,
                upper: if i + 1 == bins { upper } else { lower + width * (i + 1) as f64 },
                days,
            })
            .collect()
    }

    /// Попарная корреляция Пирсона по всем числовым столбцам
    pub fn correlation_matrix(&self) -> CorrelationMatrix {
        let records = self.records();
        let columns = numeric_columns(records);

        let mut data = Array2::zeros((records.len(), columns.len()));
        for (i, record) in records.iter().enumerate() {
            for (j, column) in columns.iter().enumerate() {
                data[[i, j]] = column.value(record);
            }
        }

        // Постоянство проверяется до центрирования: среднее неточно на ulp,
        // и дисперсия постоянного столбца получается ~1e-32 вместо нуля
        let varies: Vec<bool> = data
            .columns()
            .into_iter()
            .map(|column| column.iter().any(|&v| v != column[0]))
            .collect();

        if let Some(means) = data.mean_axis(Axis(0)) {
            data -= &means;
        }
        let cov = data.t().dot(&data);

        let k = columns.len();
        let mut values = vec![vec![None; k]; k];
        for i in 0..k {
            for j in 0..k {
                if !(varies[i] && varies[j]) {
                    continue;
                }
                let denom = (cov[[i, i]] * cov[[j, j]]).sqrt();
                if denom > 0.0 {
                    values[i][j] = Some(if i == j {
                        1.0
                    } else {
                        (cov[[i, j]] / denom).clamp(-1.0, 1.0)
                    });
                }
            }
        }

        CorrelationMatrix {
            columns: columns.iter().map(|c| c.name().to_string()).collect(),
            values,
        }
    }

    pub fn dashboard(&self) -> DashboardOutput {
        DashboardOutput {
            summary: self.summary(),
            by_season: self.group_by(GroupKey::Season),
            histogram: self.histogram(DEFAULT_HISTOGRAM_BINS),
            time_series: self.time_series(),
        }
    }

    pub fn analysis(&self) -> AnalysisOutput {
        AnalysisOutput {
            correlation: self.correlation_matrix(),
            by_weather: self.group_by(GroupKey::Weather),
            by_weekday: self.group_by(GroupKey::Weekday),
        }
    }
}

/// Квантиль с линейной интерполяцией; `sorted` не пуст
fn quantile(sorted: &[f64], q: f64) -> f64 {
    let pos = q * (sorted.len() - 1) as f64;
    let lo = pos.floor() as usize;
    let hi = pos.ceil() as usize;
    sorted[lo] + (sorted[hi] - sorted[lo]) * (pos - lo as f64)
}

fn box_summary(sorted: &[f64]) -> BoxSummary {
    BoxSummary {
        min: sorted[0],
        q1: quantile(sorted, 0.25),
        median: quantile(sorted, 0.5),
        q3: quantile(sorted, 0.75),
        max: sorted[sorted.len() - 1],
    }
}

#[derive(Debug, Clone, Copy)]
enum NumericColumn {
    Instant,
    Season,
    Yr,
    Mnth,
    Holiday,
    Weekday,
    Workingday,
    Weathersit,
    Temp,
    Atemp,
    Hum,
    Windspeed,
    Casual,
    Registered,
    Cnt,
}

impl NumericColumn {
    fn name(self) -> &'static str {
        match self {
            NumericColumn::Instant => "instant",
            NumericColumn::Season => "season",
            NumericColumn::Yr => "yr",
            NumericColumn::Mnth => "mnth",
            NumericColumn::Holiday => "holiday",
            NumericColumn::Weekday => "weekday",
            NumericColumn::Workingday => "workingday",
            NumericColumn::Weathersit => "weathersit",
            NumericColumn::Temp => "temp",
            NumericColumn::Atemp => "atemp",
            NumericColumn::Hum => "hum",
            NumericColumn::Windspeed => "windspeed",
            NumericColumn::Casual => "casual",
            NumericColumn::Registered => "registered",
            NumericColumn::Cnt => "cnt",
        }
    }

    fn value(self, r: &HistoricalRecord) -> f64 {
        let flag = |b: bool| if b { 1.0 } else { 0.0 };
        match self {
            NumericColumn::Instant => r.instant.unwrap_or_default() as f64,
            NumericColumn::Season => u8::from(r.season) as f64,
            NumericColumn::Yr => r.yr as f64,
            NumericColumn::Mnth => r.mnth as f64,
            NumericColumn::Holiday => flag(r.holiday),
            NumericColumn::Weekday => u8::from(r.weekday) as f64,
            NumericColumn::Workingday => flag(r.workingday),
            NumericColumn::Weathersit => u8::from(r.weathersit) as f64,
            NumericColumn::Temp => r.temp,
            NumericColumn::Atemp => r.atemp,
            NumericColumn::Hum => r.hum,
            NumericColumn::Windspeed => r.windspeed,
            NumericColumn::Casual => r.casual.unwrap_or_default() as f64,
            NumericColumn::Registered => r.registered.unwrap_or_default() as f64,
            NumericColumn::Cnt => r.cnt as f64,
        }
    }
}

/// Необязательные столбцы участвуют, только если есть во всех записях
fn numeric_columns(records: &[HistoricalRecord]) -> Vec<NumericColumn> {
    let all = |present: fn(&HistoricalRecord) -> bool| records.iter().all(present);

    let mut columns = Vec::with_capacity(15);
    if all(|r| r.instant.is_some()) {
        columns.push(NumericColumn::Instant);
    }
    columns.extend([
        NumericColumn::Season,
        NumericColumn::Yr,
        NumericColumn::Mnth,
        NumericColumn::Holiday,
        NumericColumn::Weekday,
        NumericColumn::Workingday,
        NumericColumn::Weathersit,
        NumericColumn::Temp,
        NumericColumn::Atemp,
        NumericColumn::Hum,
        NumericColumn::Windspeed,
    ]);
    if all(|r| r.casual.is_some()) {
        columns.push(NumericColumn::Casual);
    }
    if all(|r| r.registered.is_some()) {
        columns.push(NumericColumn::Registered);
    }
    columns.push(NumericColumn::Cnt);
    columns
}
