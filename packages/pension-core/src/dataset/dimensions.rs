//! Dimension extraction: distinct managers and dates of a record collection.

use crate::types::Record;
use chrono::NaiveDate;
use std::cmp::Ordering;
use std::collections::HashSet;

/// Date layouts accepted in source documents.
const DATE_FORMATS: [&str; 3] = ["%Y-%m-%d", "%Y/%m/%d", "%Y%m%d"];

/// Parse a source date string.
pub fn parse_date(value: &str) -> Option<NaiveDate> {
    let value = value.trim();
    DATE_FORMATS
        .iter()
        .find_map(|format| NaiveDate::parse_from_str(value, format).ok())
}

/// Chronological order of two date strings.
///
/// Unparseable dates sort before every calendar date and among themselves by
/// plain string order, which keeps the ordering total.
pub fn calendar_cmp(a: &str, b: &str) -> Ordering {
    (parse_date(a), a).cmp(&(parse_date(b), b))
}

/// Name order used for managers: case-insensitive, raw string as tie-break.
///
/// Comparison is by code point after lowercasing, so CJK names follow
/// Unicode order rather than pinyin collation.
pub fn compare_names(a: &str, b: &str) -> Ordering {
    a.to_lowercase()
        .cmp(&b.to_lowercase())
        .then_with(|| a.cmp(b))
}

/// Distinct manager names, ascending.
pub fn distinct_managers(records: &[Record]) -> Vec<String> {
    let mut seen = HashSet::new();
    let mut managers: Vec<String> = records
        .iter()
        .filter(|r| seen.insert(r.manager.as_str()))
        .map(|r| r.manager.clone())
        .collect();
    managers.sort_by(|a, b| compare_names(a, b));
    managers
}

/// Distinct date strings, newest first.
pub fn distinct_dates(records: &[Record]) -> Vec<String> {
    let mut seen = HashSet::new();
    let mut dates: Vec<String> = records
        .iter()
        .filter(|r| seen.insert(r.date.as_str()))
        .map(|r| r.date.clone())
        .collect();
    dates.sort_by(|a, b| calendar_cmp(b, a));
    dates
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Category, MetricType};

    fn record(date: &str, manager: &str) -> Record {
        Record::new(date, manager, MetricType::PortfolioCount, Category::Overall, 1.0)
    }

    #[test]
    fn test_parse_date_formats() {
        let expected = NaiveDate::from_ymd_opt(2024, 12, 31);
        assert_eq!(parse_date("2024-12-31"), expected);
        assert_eq!(parse_date("2024/12/31"), expected);
        assert_eq!(parse_date("20241231"), expected);
        assert_eq!(parse_date("Q4 2024"), None);
    }

    #[test]
    fn test_calendar_cmp_uses_date_value() {
        // String order would put "2024/9/30" after "2024/12/31"
        assert_eq!(calendar_cmp("2024/9/30", "2024/12/31"), Ordering::Less);
        assert_eq!(calendar_cmp("2025-03-31", "2024-12-31"), Ordering::Greater);
        assert_eq!(calendar_cmp("bogus", "2024-12-31"), Ordering::Less);
    }

    #[test]
    fn test_dimensions_sorted_and_distinct() {
        let records = vec![
            record("2024-06-30", "南方"),
            record("2025-03-31", "华夏"),
            record("2024-12-31", "南方"),
            record("2025-03-31", "Beta"),
            record("2024-06-30", "alpha"),
        ];

        let dates = distinct_dates(&records);
        assert_eq!(dates, vec!["2025-03-31", "2024-12-31", "2024-06-30"]);
        assert!(dates.windows(2).all(|w| calendar_cmp(&w[0], &w[1]) == Ordering::Greater));

        let managers = distinct_managers(&records);
        assert_eq!(managers.len(), 4);
        assert_eq!(&managers[..2], &["alpha".to_string(), "Beta".to_string()]);
        assert!(managers.windows(2).all(|w| compare_names(&w[0], &w[1]) == Ordering::Less));

        // every dimension value is realised by at least one record
        assert!(dates.iter().all(|d| records.iter().any(|r| &r.date == d)));
        assert!(managers.iter().all(|m| records.iter().any(|r| &r.manager == m)));
    }

    #[test]
    fn test_dimensions_empty() {
        assert!(distinct_dates(&[]).is_empty());
        assert!(distinct_managers(&[]).is_empty());
    }
}
