//! Record collection and its derived dimensions.
//!
//! A `Dataset` is built once per successful load and replaced wholesale on the
//! next one; the manager and date dimensions are always recomputed in full.

mod dimensions;
mod flatten;

pub use dimensions::{
    calendar_cmp, compare_names, distinct_dates, distinct_managers, parse_date,
};
pub use flatten::{flatten, parse_value, MetricKey};

use crate::types::Record;
use crate::{Error, Result};
use serde_json::Value;
use std::collections::HashMap;

/// Flattened records plus the manager/date dimensions derived from them.
#[derive(Debug, Clone, Default)]
pub struct Dataset {
    records: Vec<Record>,
    /// Distinct managers, ascending
    managers: Vec<String>,
    /// Distinct dates, newest first
    dates: Vec<String>,
    /// Record positions per manager, in record order
    by_manager: HashMap<String, Vec<usize>>,
}

impl Dataset {
    /// Build a dataset from flattened records.
    pub fn new(records: Vec<Record>) -> Self {
        let managers = distinct_managers(&records);
        let dates = distinct_dates(&records);

        let mut by_manager: HashMap<String, Vec<usize>> = HashMap::new();
        for (idx, record) in records.iter().enumerate() {
            by_manager
                .entry(record.manager.clone())
                .or_default()
                .push(idx);
        }

        Self {
            records,
            managers,
            dates,
            by_manager,
        }
    }

    /// Flatten a nested source document into a dataset.
    pub fn from_document(document: &Value) -> Result<Self> {
        Ok(Self::new(flatten(document)?))
    }

    pub fn records(&self) -> &[Record] {
        &self.records
    }

    pub fn managers(&self) -> &[String] {
        &self.managers
    }

    pub fn dates(&self) -> &[String] {
        &self.dates
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Date at an index of the newest-first date list.
    pub fn date(&self, index: usize) -> Result<&str> {
        self.dates
            .get(index)
            .map(String::as_str)
            .ok_or(Error::IndexOutOfRange {
                index,
                len: self.dates.len(),
            })
    }

    /// Position of a date in the newest-first date list.
    pub fn date_index(&self, date: &str) -> Option<usize> {
        self.dates.iter().position(|d| d == date)
    }

    /// All records of one manager, in record order.
    pub fn manager_records<'a>(&'a self, manager: &str) -> impl Iterator<Item = &'a Record> + 'a {
        self.by_manager
            .get(manager)
            .into_iter()
            .flatten()
            .map(move |&idx| &self.records[idx])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Category, MetricType};
    use serde_json::json;

    #[test]
    fn test_from_document() {
        let document = json!({
            "南方": { "组合数_整体_整体": { "2024-12-31": 313, "2025-03-31": 320 } },
            "华夏": { "组合数_整体_整体": { "2025-03-31": 139 } }
        });
        let dataset = Dataset::from_document(&document).unwrap();

        assert_eq!(dataset.records().len(), 3);
        assert_eq!(dataset.dates(), &["2025-03-31", "2024-12-31"]);
        assert_eq!(dataset.date(0).unwrap(), "2025-03-31");
        assert_eq!(dataset.date_index("2024-12-31"), Some(1));
        assert_eq!(dataset.managers().len(), 2);
    }

    #[test]
    fn test_date_out_of_range() {
        let dataset = Dataset::default();
        assert!(dataset.is_empty());
        assert!(matches!(
            dataset.date(0),
            Err(Error::IndexOutOfRange { index: 0, len: 0 })
        ));
    }

    #[test]
    fn test_manager_records() {
        let records = vec![
            Record::new("2024-12-31", "A", MetricType::PortfolioCount, Category::Overall, 1.0),
            Record::new("2024-12-31", "B", MetricType::PortfolioCount, Category::Overall, 2.0),
            Record::new("2025-03-31", "A", MetricType::PortfolioCount, Category::Overall, 3.0),
        ];
        let dataset = Dataset::new(records);

        let values: Vec<f64> = dataset.manager_records("A").map(|r| r.value).collect();
        assert_eq!(values, vec![1.0, 3.0]);
        assert_eq!(dataset.manager_records("Z").count(), 0);
    }
}
