//! Date-range, manager and metric filtering.

use crate::dataset::{calendar_cmp, Dataset};
use crate::types::{AssetClass, Category, DataType, MetricType, Record};
use crate::{Error, Result};
use std::cmp::Ordering;
use std::collections::{HashMap, HashSet};

/// Filter inputs. Indices point into the newest-first date list.
#[derive(Debug, Clone, Copy)]
pub struct FilterQuery<'a> {
    /// Older boundary (larger index)
    pub start_index: usize,
    /// Newer boundary (smaller index)
    pub end_index: usize,
    pub data_type: DataType,
    /// Consulted only when `data_type` is `Return`
    pub asset_class: AssetClass,
    pub managers: &'a [String],
}

/// Records matching a query together with the resolved active dates.
#[derive(Debug, Clone)]
pub struct FilteredSet<'a> {
    /// Matching records, in dataset order
    pub records: Vec<&'a Record>,
    /// Active dates, oldest first
    pub active_dates: Vec<String>,
    /// True when start and end select the same date
    pub single_period: bool,
    /// Previous-period values per manager, resolved for single-period level queries
    pub previous_values: HashMap<String, f64>,
    /// Matching records grouped per manager, oldest first
    by_manager: HashMap<&'a str, Vec<&'a Record>>,
}

impl<'a> FilteredSet<'a> {
    pub fn start_date(&self) -> Option<&str> {
        self.active_dates.first().map(String::as_str)
    }

    pub fn end_date(&self) -> Option<&str> {
        self.active_dates.last().map(String::as_str)
    }

    /// Records of one manager, oldest first.
    pub fn manager_records(&self, manager: &str) -> &[&'a Record] {
        self.by_manager
            .get(manager)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }
}

/// Check a `(start, end)` index pair against the number of known dates.
///
/// Bounds are checked before order, so `RangeOrder` always names two valid
/// indices.
pub fn validate_range(start_index: usize, end_index: usize, len: usize) -> Result<()> {
    for index in [end_index, start_index] {
        if index >= len {
            return Err(Error::IndexOutOfRange { index, len });
        }
    }
    if start_index < end_index {
        return Err(Error::RangeOrder {
            start: start_index,
            end: end_index,
        });
    }
    Ok(())
}

/// Select the records matching a query.
pub fn filter<'a>(dataset: &'a Dataset, query: &FilterQuery<'_>) -> Result<FilteredSet<'a>> {
    if dataset.is_empty() {
        return Err(Error::EmptyDataset);
    }
    validate_range(query.start_index, query.end_index, dataset.dates().len())?;

    let single_period = query.start_index == query.end_index;
    let active_dates: Vec<String> = dataset.dates()[query.end_index..=query.start_index]
        .iter()
        .rev()
        .cloned()
        .collect();

    let date_set: HashSet<&str> = active_dates.iter().map(String::as_str).collect();
    let manager_set: HashSet<&str> = query.managers.iter().map(String::as_str).collect();
    let metric = query.data_type.metric();
    let category = query
        .data_type
        .is_return()
        .then(|| query.asset_class.category());

    let records: Vec<&'a Record> = dataset
        .records()
        .iter()
        .filter(|r| date_set.contains(r.date.as_str()))
        .filter(|r| manager_set.contains(r.manager.as_str()))
        .filter(|r| r.metric == metric)
        .filter(|r| category.as_ref().map_or(true, |c| &r.category == c))
        .collect();

    let mut by_manager: HashMap<&'a str, Vec<&'a Record>> = HashMap::new();
    for &record in &records {
        by_manager
            .entry(record.manager.as_str())
            .or_default()
            .push(record);
    }
    for group in by_manager.values_mut() {
        group.sort_by(|a, b| calendar_cmp(&a.date, &b.date));
    }

    let mut previous_values = HashMap::new();
    if single_period && !query.data_type.is_return() {
        let date = &active_dates[0];
        for manager in query.managers {
            if let Some(value) = previous_value(dataset, manager, date, &metric) {
                previous_values.insert(manager.clone(), value);
            }
        }
    }

    Ok(FilteredSet {
        records,
        active_dates,
        single_period,
        previous_values,
        by_manager,
    })
}

/// Value of the most recent `Overall` record of a manager strictly before `date`.
pub fn previous_value(
    dataset: &Dataset,
    manager: &str,
    date: &str,
    metric: &MetricType,
) -> Option<f64> {
    dataset
        .manager_records(manager)
        .filter(|r| &r.metric == metric && r.category == Category::Overall)
        .filter(|r| calendar_cmp(&r.date, date) == Ordering::Less)
        .max_by(|a, b| calendar_cmp(&a.date, &b.date))
        .map(|r| r.value)
}
