//! Column-driven sorting shared by the statistics and detail tables.
//!
//! Rows are sorted on their typed values, never on formatted cell text. Each
//! table keeps its own `(column, direction)` state; clicking the active column
//! flips the direction, clicking another column selects it descending.

use crate::dataset::{calendar_cmp, compare_names};
use crate::types::{DataType, DetailRow, StatRow};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

/// Sort direction of a table.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
    Ascending,
    #[default]
    Descending,
}

impl SortDirection {
    pub fn flipped(self) -> Self {
        match self {
            SortDirection::Ascending => SortDirection::Descending,
            SortDirection::Descending => SortDirection::Ascending,
        }
    }
}

/// Active sort column and direction of one table.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct SortState<C> {
    pub column: C,
    pub direction: SortDirection,
}

impl<C: Copy + PartialEq> SortState<C> {
    pub fn new(column: C) -> Self {
        Self {
            column,
            direction: SortDirection::Descending,
        }
    }

    /// State after a click on `column`.
    pub fn toggled(self, column: C) -> Self {
        if column == self.column {
            Self {
                column,
                direction: self.direction.flipped(),
            }
        } else {
            Self::new(column)
        }
    }
}

/// Comparable value of one cell.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SortKey<'a> {
    /// Manager names, compared by name order
    Name(&'a str),
    /// Source date strings, compared chronologically
    Date(&'a str),
    Number(f64),
}

fn rank(key: &SortKey<'_>) -> u8 {
    match key {
        SortKey::Name(_) => 0,
        SortKey::Date(_) => 1,
        SortKey::Number(_) => 2,
    }
}

/// Total order over sort keys. Keys of different kinds order by kind.
pub fn compare_keys(a: &SortKey<'_>, b: &SortKey<'_>) -> Ordering {
    match (a, b) {
        (SortKey::Name(a), SortKey::Name(b)) => compare_names(a, b),
        (SortKey::Date(a), SortKey::Date(b)) => calendar_cmp(a, b),
        (SortKey::Number(a), SortKey::Number(b)) => a.total_cmp(b),
        _ => rank(a).cmp(&rank(b)),
    }
}

/// A row that can be sorted by column.
pub trait TableRow {
    type Column: Copy + PartialEq;

    /// Key of a cell, `None` when the column does not apply to this row.
    fn sort_key(&self, column: Self::Column) -> Option<SortKey<'_>>;

    /// Called with the 1-based position after each sort.
    fn renumber(&mut self, _position: usize) {}
}

/// Sort rows by the state's column and direction, then renumber them.
///
/// The sort is stable, so equal keys keep their current relative order.
pub fn sort_rows<R: TableRow>(rows: &mut [R], state: &SortState<R::Column>) {
    rows.sort_by(|a, b| {
        let ordering = match (a.sort_key(state.column), b.sort_key(state.column)) {
            (Some(a), Some(b)) => compare_keys(&a, &b),
            (a, b) => a.is_some().cmp(&b.is_some()),
        };
        match state.direction {
            SortDirection::Ascending => ordering,
            SortDirection::Descending => ordering.reverse(),
        }
    });
    for (idx, row) in rows.iter_mut().enumerate() {
        row.renumber(idx + 1);
    }
}

/// Sortable columns of the statistics table.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum StatsColumn {
    #[default]
    Manager,
    CumulativeReturn,
    MaxDrawdown,
    StartValue,
    EndValue,
    IntervalChange,
}

impl StatsColumn {
    /// Whether the column is shown for a data type.
    pub fn applies_to(self, data_type: DataType) -> bool {
        match self {
            StatsColumn::Manager => true,
            StatsColumn::CumulativeReturn | StatsColumn::MaxDrawdown => data_type.is_return(),
            StatsColumn::StartValue | StatsColumn::EndValue | StatsColumn::IntervalChange => {
                !data_type.is_return()
            }
        }
    }

    /// Columns shown for a data type, in display order.
    pub fn for_data_type(data_type: DataType) -> &'static [StatsColumn] {
        if data_type.is_return() {
            &[
                StatsColumn::Manager,
                StatsColumn::CumulativeReturn,
                StatsColumn::MaxDrawdown,
            ]
        } else {
            &[
                StatsColumn::Manager,
                StatsColumn::StartValue,
                StatsColumn::EndValue,
                StatsColumn::IntervalChange,
            ]
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_lowercase().replace('-', "_").as_str() {
            "manager" => Some(StatsColumn::Manager),
            "cumulative_return" | "return" => Some(StatsColumn::CumulativeReturn),
            "max_drawdown" | "drawdown" => Some(StatsColumn::MaxDrawdown),
            "start_value" | "start" => Some(StatsColumn::StartValue),
            "end_value" | "end" => Some(StatsColumn::EndValue),
            "interval_change" | "change" => Some(StatsColumn::IntervalChange),
            _ => None,
        }
    }

    /// Message key of the column header.
    pub fn header_key(self) -> &'static str {
        match self {
            StatsColumn::Manager => "column.manager",
            StatsColumn::CumulativeReturn => "column.cumulative_return",
            StatsColumn::MaxDrawdown => "column.max_drawdown",
            StatsColumn::StartValue => "column.start_value",
            StatsColumn::EndValue => "column.end_value",
            StatsColumn::IntervalChange => "column.interval_change",
        }
    }
}

/// Sortable columns of the detail table.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum DetailColumn {
    #[default]
    Date,
    Manager,
    Value,
}

impl DetailColumn {
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_lowercase().as_str() {
            "date" => Some(DetailColumn::Date),
            "manager" => Some(DetailColumn::Manager),
            "value" => Some(DetailColumn::Value),
            _ => None,
        }
    }

    pub fn header_key(self) -> &'static str {
        match self {
            DetailColumn::Date => "column.date",
            DetailColumn::Manager => "column.manager",
            DetailColumn::Value => "column.value",
        }
    }
}

impl TableRow for StatRow {
    type Column = StatsColumn;

    fn sort_key(&self, column: StatsColumn) -> Option<SortKey<'_>> {
        match (self, column) {
            (_, StatsColumn::Manager) => Some(SortKey::Name(self.manager())),
            (StatRow::Return(row), StatsColumn::CumulativeReturn) => {
                Some(SortKey::Number(row.cumulative_return_pct))
            }
            (StatRow::Return(row), StatsColumn::MaxDrawdown) => {
                Some(SortKey::Number(row.max_drawdown_pct))
            }
            (StatRow::Level(row), StatsColumn::StartValue) => {
                Some(SortKey::Number(row.start_value))
            }
            (StatRow::Level(row), StatsColumn::EndValue) => Some(SortKey::Number(row.end_value)),
            (StatRow::Level(row), StatsColumn::IntervalChange) => {
                Some(SortKey::Number(row.interval_change))
            }
            _ => None,
        }
    }

    fn renumber(&mut self, position: usize) {
        self.set_rank(position);
    }
}

impl TableRow for DetailRow {
    type Column = DetailColumn;

    fn sort_key(&self, column: DetailColumn) -> Option<SortKey<'_>> {
        Some(match column {
            DetailColumn::Date => SortKey::Date(&self.date),
            DetailColumn::Manager => SortKey::Name(&self.manager),
            DetailColumn::Value => SortKey::Number(self.value),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{LevelStat, ReturnStat};

    fn return_row(manager: &str, cumulative: f64, drawdown: f64) -> StatRow {
        StatRow::Return(ReturnStat {
            rank: 0,
            manager: manager.to_string(),
            cumulative_return_pct: cumulative,
            max_drawdown_pct: drawdown,
        })
    }

    fn detail_row(date: &str, manager: &str, value: f64) -> DetailRow {
        DetailRow {
            date: date.to_string(),
            period: String::new(),
            manager: manager.to_string(),
            value,
            display: String::new(),
        }
    }

    fn managers(rows: &[StatRow]) -> Vec<&str> {
        rows.iter().map(|r| r.manager()).collect()
    }

    #[test]
    fn test_toggle_state() {
        let state = SortState::new(StatsColumn::Manager);
        assert_eq!(state.direction, SortDirection::Descending);

        let state = state.toggled(StatsColumn::Manager);
        assert_eq!(state.direction, SortDirection::Ascending);

        let state = state.toggled(StatsColumn::MaxDrawdown);
        assert_eq!(state.column, StatsColumn::MaxDrawdown);
        assert_eq!(state.direction, SortDirection::Descending);
    }

    #[test]
    fn test_numeric_column_and_renumbering() {
        let mut rows = vec![
            return_row("A", 1.0, 9.0),
            return_row("B", 3.0, 2.0),
            return_row("C", -2.0, 5.0),
        ];
        let state = SortState::new(StatsColumn::MaxDrawdown);
        sort_rows(&mut rows, &state);

        assert_eq!(managers(&rows), vec!["A", "C", "B"]);
        let ranks: Vec<usize> = rows.iter().map(|r| r.rank()).collect();
        assert_eq!(ranks, vec![1, 2, 3]);
    }

    #[test]
    fn test_second_click_reverses_order() {
        let mut rows = vec![
            return_row("A", 1.0, 9.0),
            return_row("B", 3.0, 2.0),
            return_row("C", -2.0, 5.0),
            return_row("D", 0.5, 1.0),
        ];
        let first = SortState::new(StatsColumn::CumulativeReturn);
        sort_rows(&mut rows, &first);
        let descending: Vec<String> = rows.iter().map(|r| r.manager().to_string()).collect();

        let second = first.toggled(StatsColumn::CumulativeReturn);
        sort_rows(&mut rows, &second);
        let mut ascending: Vec<String> = rows.iter().map(|r| r.manager().to_string()).collect();

        ascending.reverse();
        assert_eq!(ascending, descending);
    }

    #[test]
    fn test_manager_column_uses_name_order() {
        let mut rows = vec![
            return_row("beta", 1.0, 0.0),
            return_row("Alpha", 2.0, 0.0),
            return_row("gamma", 3.0, 0.0),
        ];
        let state = SortState::new(StatsColumn::Manager).toggled(StatsColumn::Manager);
        sort_rows(&mut rows, &state);
        assert_eq!(managers(&rows), vec!["Alpha", "beta", "gamma"]);
    }

    #[test]
    fn test_level_columns() {
        let mut rows = vec![
            StatRow::Level(LevelStat {
                rank: 1,
                manager: "A".to_string(),
                start_value: 10.0,
                end_value: 12.0,
                interval_change: 2.0,
                percent_change: 20.0,
            }),
            StatRow::Level(LevelStat {
                rank: 2,
                manager: "B".to_string(),
                start_value: 100.0,
                end_value: 105.0,
                interval_change: 5.0,
                percent_change: 5.0,
            }),
        ];
        sort_rows(&mut rows, &SortState::new(StatsColumn::IntervalChange));
        assert_eq!(managers(&rows), vec!["B", "A"]);
        assert!(rows[0].sort_key(StatsColumn::CumulativeReturn).is_none());
    }

    #[test]
    fn test_detail_date_column_is_chronological() {
        let mut rows = vec![
            detail_row("2024/9/30", "A", 1.0),
            detail_row("2024/12/31", "B", 2.0),
            detail_row("2024/6/30", "C", 3.0),
        ];
        let state = SortState::new(DetailColumn::Date);
        sort_rows(&mut rows, &state);
        let dates: Vec<&str> = rows.iter().map(|r| r.date.as_str()).collect();
        assert_eq!(dates, vec!["2024/12/31", "2024/9/30", "2024/6/30"]);
    }

    #[test]
    fn test_applies_to() {
        assert!(StatsColumn::Manager.applies_to(DataType::Scale));
        assert!(StatsColumn::MaxDrawdown.applies_to(DataType::Return));
        assert!(!StatsColumn::MaxDrawdown.applies_to(DataType::Asset));
        assert!(!StatsColumn::StartValue.applies_to(DataType::Return));
        assert_eq!(StatsColumn::parse("max-drawdown"), Some(StatsColumn::MaxDrawdown));
        assert_eq!(DetailColumn::parse("VALUE"), Some(DetailColumn::Value));
    }
}
