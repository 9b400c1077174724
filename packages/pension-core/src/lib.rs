//! Pension Core - Performance analytics engine for pension-fund managers.
//!
//! This crate turns a nested manager → metric key → date → value document into
//! ranked statistics and chart-ready series:
//!
//! - **Dataset**: Flattening of the nested document and dimension extraction
//! - **Engine**: Date-range filtering, compounded returns, max drawdown, interval deltas
//! - **Tables**: Column-driven sorting shared by the statistics and detail tables
//! - **Session**: Dashboard state, persistence, offline cache, CSV/SVG export
//!
//! # Example
//!
//! ```rust,no_run
//! use pension_core::{session::Dashboard, store::MemoryStore, DashboardConfig};
//!
//! let mut store = MemoryStore::new();
//! let mut dashboard = Dashboard::new(DashboardConfig::default());
//!
//! let upload = r#"{"华夏": {"收益率（单季）_整体_固定收益类": {"2025-06-30": 1.1, "2025-09-30": 0.9}}}"#;
//! dashboard.upload(upload, &mut store).expect("valid upload");
//!
//! let view = dashboard.recompute().expect("valid range");
//! for row in &view.stats {
//!     println!("{} {:.2}", row.manager(), row.rank_value());
//! }
//! ```

pub mod config;
pub mod dataset;
pub mod engine;
pub mod export;
pub mod format;
pub mod i18n;
pub mod offline;
pub mod session;
pub mod store;
pub mod types;
pub mod view;

// Re-export commonly used types
pub use types::{
    ApiResponse, AssetClass, Category, CompareMode, DataType, DetailRow, LevelStat, MetricType,
    Record, ReturnStat, StatRow,
};

// Re-export main functionality
pub use config::DashboardConfig;
pub use dataset::{flatten, Dataset};
pub use engine::{
    cumulative_return, filter, interval_stats, max_drawdown, percent_change, ChartData,
    DetailColumn, FilterQuery, FilteredSet, SortDirection, SortState, StatsColumn,
};
pub use i18n::I18n;
pub use session::{Dashboard, LoadOutcome};
pub use view::{derive_view, DerivedView, ViewState};

/// Error types for pension-core operations.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Parse error: {0}")]
    Parse(String),

    #[error("Start index {start} is chronologically after end index {end}")]
    RangeOrder { start: usize, end: usize },

    #[error("Date index {index} out of range ({len} dates)")]
    IndexOutOfRange { index: usize, len: usize },

    #[error("No records loaded")]
    EmptyDataset,

    #[error("Persistence error: {0}")]
    Persistence(String),

    #[error("Unknown column: {0}")]
    UnknownColumn(String),

    #[error("Config error: {0}")]
    Config(String),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("Fetch error: {0}")]
    Fetch(String),
}

/// Result type for pension-core operations.
pub type Result<T> = std::result::Result<T, Error>;
