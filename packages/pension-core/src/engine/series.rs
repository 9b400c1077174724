//! Chart-ready series derived from a filtered record set.

use super::filter::FilteredSet;
use super::stats::{cumulative_path, cumulative_return, max_drawdown};
use crate::format::quarter_label;
use crate::types::{CompareMode, DataType};
use serde::{Deserialize, Serialize};

/// One point of a time series.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SeriesPoint {
    pub date: String,
    /// Quarter label used on the x axis
    pub label: String,
    pub value: f64,
}

impl SeriesPoint {
    pub(crate) fn new(date: &str, value: f64) -> Self {
        Self {
            date: date.to_string(),
            label: quarter_label(date),
            value,
        }
    }
}

/// Time series of one manager.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ManagerSeries {
    pub manager: String,
    pub points: Vec<SeriesPoint>,
}

/// One bar of the cross-sectional comparison.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct BarPoint {
    pub manager: String,
    pub value: f64,
}

/// Risk/return point of one manager.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ScatterPoint {
    pub manager: String,
    /// x axis
    pub max_drawdown_pct: f64,
    /// y axis
    pub cumulative_return_pct: f64,
}

/// Prepared data for the chart collaborator.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "shape", rename_all = "snake_case")]
pub enum ChartData {
    /// Cumulative return per manager, starting from a zero point at the start date
    ReturnTrend {
        labels: Vec<String>,
        series: Vec<ManagerSeries>,
    },
    /// Raw values per manager over the active dates
    LevelTrend {
        labels: Vec<String>,
        series: Vec<ManagerSeries>,
    },
    /// All managers at the end date, plus risk points in return mode
    CrossSection {
        end_date: Option<String>,
        bars: Vec<BarPoint>,
        scatter: Vec<ScatterPoint>,
    },
}

impl ChartData {
    pub fn is_empty(&self) -> bool {
        match self {
            ChartData::ReturnTrend { series, .. } | ChartData::LevelTrend { series, .. } => {
                series.is_empty()
            }
            ChartData::CrossSection { bars, .. } => bars.is_empty(),
        }
    }
}

/// Build the chart shape selected by data type and compare mode.
pub fn chart_data(
    filtered: &FilteredSet<'_>,
    data_type: DataType,
    mode: CompareMode,
    managers: &[String],
) -> ChartData {
    match (mode, data_type.is_return()) {
        (CompareMode::Trend, true) => {
            let mut labels: Vec<String> = filtered
                .start_date()
                .map(quarter_label)
                .into_iter()
                .collect();
            labels.extend(filtered.active_dates.iter().map(|d| quarter_label(d)));
            ChartData::ReturnTrend {
                labels,
                series: cumulative_return_series(filtered, managers),
            }
        }
        (CompareMode::Trend, false) => ChartData::LevelTrend {
            labels: filtered.active_dates.iter().map(|d| quarter_label(d)).collect(),
            series: level_series(filtered, managers),
        },
        (CompareMode::CrossSection, is_return) => ChartData::CrossSection {
            end_date: filtered.end_date().map(str::to_string),
            bars: cross_section_bars(filtered, managers),
            scatter: if is_return {
                risk_scatter(filtered, managers)
            } else {
                Vec::new()
            },
        },
    }
}

/// Cumulative return over time per manager.
///
/// Each series opens with a `0` point labeled at the start date, followed by
/// the compounded return after every record.
pub fn cumulative_return_series(
    filtered: &FilteredSet<'_>,
    managers: &[String],
) -> Vec<ManagerSeries> {
    let Some(start_date) = filtered.start_date() else {
        return Vec::new();
    };

    managers
        .iter()
        .filter_map(|manager| {
            let records = filtered.manager_records(manager);
            if records.is_empty() {
                return None;
            }
            let returns: Vec<f64> = records.iter().map(|r| r.value).collect();

            let mut points = Vec::with_capacity(records.len() + 1);
            points.push(SeriesPoint::new(start_date, 0.0));
            points.extend(
                records
                    .iter()
                    .zip(cumulative_path(&returns))
                    .map(|(record, value)| SeriesPoint::new(&record.date, value)),
            );

            Some(ManagerSeries {
                manager: manager.clone(),
                points,
            })
        })
        .collect()
}

/// Raw values over time per manager.
pub fn level_series(filtered: &FilteredSet<'_>, managers: &[String]) -> Vec<ManagerSeries> {
    managers
        .iter()
        .filter_map(|manager| {
            let records = filtered.manager_records(manager);
            if records.is_empty() {
                return None;
            }
            Some(ManagerSeries {
                manager: manager.clone(),
                points: records
                    .iter()
                    .map(|r| SeriesPoint::new(&r.date, r.value))
                    .collect(),
            })
        })
        .collect()
}

/// Value per manager at the end date, `0` when absent, largest first.
pub fn cross_section_bars(filtered: &FilteredSet<'_>, managers: &[String]) -> Vec<BarPoint> {
    let Some(end_date) = filtered.end_date() else {
        return Vec::new();
    };

    let mut bars: Vec<BarPoint> = managers
        .iter()
        .map(|manager| {
            let value = filtered
                .records
                .iter()
                .find(|r| &r.manager == manager && r.date == end_date)
                .map_or(0.0, |r| r.value);
            BarPoint {
                manager: manager.clone(),
                value,
            }
        })
        .collect();

    bars.sort_by(|a, b| b.value.total_cmp(&a.value));
    bars
}

/// `(max drawdown, cumulative return)` per manager with records.
pub fn risk_scatter(filtered: &FilteredSet<'_>, managers: &[String]) -> Vec<ScatterPoint> {
    managers
        .iter()
        .filter_map(|manager| {
            let returns: Vec<f64> = filtered
                .manager_records(manager)
                .iter()
                .map(|r| r.value)
                .collect();
            if returns.is_empty() {
                return None;
            }
            Some(ScatterPoint {
                manager: manager.clone(),
                max_drawdown_pct: max_drawdown(&returns),
                cumulative_return_pct: cumulative_return(&returns),
            })
        })
        .collect()
}
