//! Query engine: filtering, interval statistics, table sorting and chart series.

pub mod filter;
pub mod series;
pub mod sort;
pub mod stats;

pub use filter::{filter, previous_value, validate_range, FilterQuery, FilteredSet};
pub use series::{
    chart_data, BarPoint, ChartData, ManagerSeries, ScatterPoint, SeriesPoint,
};
pub use sort::{
    compare_keys, sort_rows, DetailColumn, SortDirection, SortKey, SortState, StatsColumn,
    TableRow,
};
pub use stats::{
    cumulative_path, cumulative_return, interval_stats, max_drawdown, percent_change,
    IntervalStats,
};
