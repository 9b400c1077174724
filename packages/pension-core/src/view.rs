//! Selection state and the view derived from it.
//!
//! `derive_view` is a pure function of the dataset and the selection; nothing
//! derived is cached between calls.

use crate::config::DashboardConfig;
use crate::dataset::Dataset;
use crate::engine::{
    chart_data, filter, interval_stats, sort_rows, ChartData, DetailColumn, FilterQuery,
    SortState, StatsColumn,
};
use crate::format::{data_type_label, format_value, quarter_label};
use crate::i18n::I18n;
use crate::types::{AssetClass, CompareMode, DataType, DetailRow, Record, StatRow};
use crate::Result;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Everything the user has selected.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ViewState {
    /// Selected managers, in selection order
    pub selected_managers: Vec<String>,
    /// Older boundary into the newest-first date list
    pub start_index: usize,
    /// Newer boundary into the newest-first date list
    pub end_index: usize,
    pub data_type: DataType,
    pub asset_class: AssetClass,
    pub compare_mode: CompareMode,
    pub stats_sort: SortState<StatsColumn>,
    pub detail_sort: SortState<DetailColumn>,
}

impl Default for ViewState {
    fn default() -> Self {
        Self {
            selected_managers: Vec::new(),
            start_index: 0,
            end_index: 0,
            data_type: DataType::default(),
            asset_class: AssetClass::default(),
            compare_mode: CompareMode::default(),
            stats_sort: SortState::new(StatsColumn::Manager),
            detail_sort: SortState::new(DetailColumn::Date),
        }
    }
}

impl ViewState {
    /// Default selection for a freshly loaded dataset: every manager, the
    /// newest date as end and `lookback` periods earlier as start.
    pub fn for_dataset(dataset: &Dataset, config: &DashboardConfig) -> Self {
        let last_index = dataset.dates().len().saturating_sub(1);
        Self {
            selected_managers: dataset.managers().to_vec(),
            start_index: config.lookback().min(last_index),
            end_index: 0,
            data_type: config.data_type,
            asset_class: config.asset_class,
            compare_mode: config.compare_mode,
            ..Self::default()
        }
    }

    pub fn query(&self) -> FilterQuery<'_> {
        FilterQuery {
            start_index: self.start_index,
            end_index: self.end_index,
            data_type: self.data_type,
            asset_class: self.asset_class,
            managers: &self.selected_managers,
        }
    }

    /// Add or remove one manager. Removal keeps the order of the rest,
    /// addition appends. Returns false for names not in the dataset.
    pub fn toggle_manager(&mut self, dataset: &Dataset, manager: &str) -> bool {
        if let Some(pos) = self.selected_managers.iter().position(|m| m == manager) {
            self.selected_managers.remove(pos);
            return true;
        }
        if dataset.managers().iter().any(|m| m == manager) {
            self.selected_managers.push(manager.to_string());
            return true;
        }
        false
    }

    pub fn select_all_managers(&mut self, dataset: &Dataset) {
        self.selected_managers = dataset.managers().to_vec();
    }

    pub fn clear_managers(&mut self) {
        self.selected_managers.clear();
    }
}

/// Tables and chart data for one selection.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DerivedView {
    /// Active dates, oldest first
    pub active_dates: Vec<String>,
    /// Filtered records, in dataset order
    pub records: Vec<Record>,
    /// Statistics rows ranked by sort key, descending
    pub stats: Vec<StatRow>,
    /// Detail rows, newest first
    pub detail: Vec<DetailRow>,
    pub chart: ChartData,
    /// Selected managers with no records for the selection
    pub missing_managers: Vec<String>,
    /// Label of the selected data type
    pub data_type_label: String,
}

/// Compute the view for a selection.
pub fn derive_view(dataset: &Dataset, view: &ViewState, i18n: &I18n) -> Result<DerivedView> {
    let filtered = filter(dataset, &view.query())?;
    let stats = interval_stats(&filtered, view.data_type, &view.selected_managers);

    let mut detail: Vec<DetailRow> = filtered
        .records
        .iter()
        .map(|r| DetailRow {
            date: r.date.clone(),
            period: quarter_label(&r.date),
            manager: r.manager.clone(),
            value: r.value,
            display: format_value(r.value, view.data_type, i18n),
        })
        .collect();
    sort_rows(&mut detail, &SortState::new(DetailColumn::Date));

    let chart = chart_data(
        &filtered,
        view.data_type,
        view.compare_mode,
        &view.selected_managers,
    );

    debug!(
        records = filtered.records.len(),
        stats = stats.rows.len(),
        missing = stats.missing.len(),
        "derived view"
    );

    Ok(DerivedView {
        active_dates: filtered.active_dates.clone(),
        records: filtered.records.iter().map(|r| (*r).clone()).collect(),
        stats: stats.rows,
        detail,
        chart,
        missing_managers: stats.missing,
        data_type_label: data_type_label(view.data_type, view.asset_class, i18n),
    })
}
