//! Core data types for the pension performance engine.

use serde::{Deserialize, Serialize};

/// Source label fragment identifying period return metrics.
pub const RETURN_RATE_LABEL: &str = "收益率";
/// Source label fragment identifying portfolio count metrics.
pub const PORTFOLIO_COUNT_LABEL: &str = "组合数";
/// Source label fragment identifying asset scale metrics.
pub const ASSET_SCALE_LABEL: &str = "资产规模";

/// Source asset label for the whole book.
pub const OVERALL_LABEL: &str = "整体";
/// Source asset label for fixed income portfolios.
pub const FIXED_INCOME_LABEL: &str = "固定收益类";
/// Source asset label for portfolios that include equities.
pub const EQUITY_INCLUDED_LABEL: &str = "含权益类";

/// Normalized metric type of a record.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum MetricType {
    ReturnRate,
    PortfolioCount,
    AssetScale,
    /// Label that matched none of the known fragments, kept verbatim.
    Other(String),
}

impl MetricType {
    /// Classify a raw metric label by substring match. First match wins.
    pub fn classify(raw_label: &str) -> Self {
        if raw_label.contains(RETURN_RATE_LABEL) {
            MetricType::ReturnRate
        } else if raw_label.contains(PORTFOLIO_COUNT_LABEL) {
            MetricType::PortfolioCount
        } else if raw_label.contains(ASSET_SCALE_LABEL) {
            MetricType::AssetScale
        } else {
            MetricType::Other(raw_label.to_string())
        }
    }

    pub fn is_return(&self) -> bool {
        matches!(self, MetricType::ReturnRate)
    }
}

/// Asset category of a record. Only meaningful for return metrics.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    Overall,
    FixedIncome,
    EquityIncluded,
    Other(String),
}

impl Category {
    /// Map a literal asset label onto a category.
    pub fn from_label(label: &str) -> Self {
        match label.trim() {
            OVERALL_LABEL => Category::Overall,
            FIXED_INCOME_LABEL => Category::FixedIncome,
            EQUITY_INCLUDED_LABEL => Category::EquityIncluded,
            other => Category::Other(other.to_string()),
        }
    }
}

/// A single (date, manager, metric type, category, value) observation.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Record {
    /// Calendar date as it appeared in the source document
    pub date: String,
    /// Manager name
    pub manager: String,
    /// Normalized metric type
    #[serde(rename = "type")]
    pub metric: MetricType,
    /// Asset category (`Overall` for every non-return metric)
    pub category: Category,
    /// Observed value
    pub value: f64,
}

impl Record {
    pub fn new(
        date: impl Into<String>,
        manager: impl Into<String>,
        metric: MetricType,
        category: Category,
        value: f64,
    ) -> Self {
        Self {
            date: date.into(),
            manager: manager.into(),
            metric,
            category,
            value,
        }
    }
}

/// Data type selector of a query.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum DataType {
    /// Period return rates, compounded over the interval
    #[default]
    Return,
    /// Portfolio count, a level-type metric
    Scale,
    /// Asset scale, a level-type metric
    Asset,
}

impl DataType {
    /// The record metric type this selector matches.
    pub fn metric(self) -> MetricType {
        match self {
            DataType::Return => MetricType::ReturnRate,
            DataType::Scale => MetricType::PortfolioCount,
            DataType::Asset => MetricType::AssetScale,
        }
    }

    pub fn is_return(self) -> bool {
        self == DataType::Return
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_lowercase().as_str() {
            "return" => Some(DataType::Return),
            "scale" => Some(DataType::Scale),
            "asset" => Some(DataType::Asset),
            _ => None,
        }
    }
}

/// Asset class selector, consulted only for return queries.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum AssetClass {
    #[default]
    Fixed,
    Other,
}

impl AssetClass {
    pub fn category(self) -> Category {
        match self {
            AssetClass::Fixed => Category::FixedIncome,
            AssetClass::Other => Category::EquityIncluded,
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_lowercase().as_str() {
            "fixed" => Some(AssetClass::Fixed),
            "other" => Some(AssetClass::Other),
            _ => None,
        }
    }
}

/// Chart comparison mode.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "kebab-case")]
pub enum CompareMode {
    /// Time-series comparison across the active dates
    #[default]
    Trend,
    /// All managers at the end date
    CrossSection,
}

impl CompareMode {
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_lowercase().as_str() {
            "trend" | "compare" => Some(CompareMode::Trend),
            "cross-section" | "cross_section" | "cross" => Some(CompareMode::CrossSection),
            _ => None,
        }
    }
}

/// Statistics row for a return-type query.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ReturnStat {
    /// Display position, renumbered after every sort
    pub rank: usize,
    pub manager: String,
    /// Compounded return over the interval, in percent
    pub cumulative_return_pct: f64,
    /// Maximum drawdown of the cumulative return index, in percent
    pub max_drawdown_pct: f64,
}

/// Statistics row for a level-type query (portfolio count, asset scale).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LevelStat {
    /// Display position, renumbered after every sort
    pub rank: usize,
    pub manager: String,
    pub start_value: f64,
    pub end_value: f64,
    /// `end_value - start_value`
    pub interval_change: f64,
    /// Interval change relative to the start value; zero when the start is zero
    pub percent_change: f64,
}

/// One ranked row of the statistics table.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum StatRow {
    Return(ReturnStat),
    Level(LevelStat),
}

impl StatRow {
    pub fn manager(&self) -> &str {
        match self {
            StatRow::Return(row) => &row.manager,
            StatRow::Level(row) => &row.manager,
        }
    }

    pub fn rank(&self) -> usize {
        match self {
            StatRow::Return(row) => row.rank,
            StatRow::Level(row) => row.rank,
        }
    }

    /// Default ranking key: cumulative return or percent change.
    pub fn rank_value(&self) -> f64 {
        match self {
            StatRow::Return(row) => row.cumulative_return_pct,
            StatRow::Level(row) => row.percent_change,
        }
    }

    pub(crate) fn set_rank(&mut self, rank: usize) {
        match self {
            StatRow::Return(row) => row.rank = rank,
            StatRow::Level(row) => row.rank = rank,
        }
    }
}

/// One row of the detail (raw data) table.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DetailRow {
    pub date: String,
    /// Quarter label of `date`, e.g. `2024Q4`
    pub period: String,
    pub manager: String,
    pub value: f64,
    /// `value` rendered by the table formatter
    pub display: String,
}

/// API response wrapper for success cases.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiResponse<T> {
    pub ok: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl<T> ApiResponse<T> {
    /// Create a successful response.
    pub fn ok(data: T) -> Self {
        Self {
            ok: true,
            data: Some(data),
            error: None,
        }
    }

    /// Create an error response.
    pub fn err(error: impl Into<String>) -> Self {
        Self {
            ok: false,
            data: None,
            error: Some(error.into()),
        }
    }
}
