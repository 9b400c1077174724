//! Display formatting: quarter labels, grouped numbers and type-aware values.
//!
//! Two registers exist. The table register is used by the detail and
//! statistics tables; the chart register by tooltips, axes and SVG export.

use crate::dataset::parse_date;
use crate::i18n::I18n;
use crate::types::{AssetClass, DataType, StatRow};
use chrono::Datelike;

/// Source asset values are in units of 10,000 CNY; displays use 100 million.
const ASSET_DIVISOR: f64 = 10_000.0;

/// Quarter label `YYYYQn` of a date, or the input unchanged if it does not parse.
pub fn quarter_label(date: &str) -> String {
    match parse_date(date) {
        Some(parsed) => format!("{}Q{}", parsed.year(), parsed.month0() / 3 + 1),
        None => date.to_string(),
    }
}

/// Format with a fixed number of decimals and `,` thousands separators.
pub fn group_thousands(value: f64, decimals: usize) -> String {
    let formatted = format!("{:.*}", decimals, value.abs());
    let (int_part, frac_part) = match formatted.split_once('.') {
        Some((int_part, frac_part)) => (int_part, Some(frac_part)),
        None => (formatted.as_str(), None),
    };

    let mut grouped = String::with_capacity(formatted.len() + int_part.len() / 3 + 1);
    for (idx, ch) in int_part.chars().enumerate() {
        if idx > 0 && (int_part.len() - idx) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }
    if let Some(frac_part) = frac_part {
        grouped.push('.');
        grouped.push_str(frac_part);
    }

    let is_zero = formatted.chars().all(|c| c == '0' || c == '.');
    if value.is_sign_negative() && !is_zero {
        grouped.insert(0, '-');
    }
    grouped
}

/// Percentage with a fixed number of decimals.
pub fn format_percent(value: f64, decimals: usize) -> String {
    if !value.is_finite() {
        return "-".to_string();
    }
    format!("{:.*}%", decimals, value)
}

/// Table register.
///
/// Returns get 4 decimals, asset values are shown in 100 million with the
/// short unit suffix, counts are grouped integers.
pub fn format_value(value: f64, data_type: DataType, i18n: &I18n) -> String {
    if !value.is_finite() {
        return "-".to_string();
    }
    match data_type {
        DataType::Return => format_percent(value, 4),
        DataType::Asset => format!(
            "{}{}",
            group_thousands(value / ASSET_DIVISOR, 2),
            i18n.t("unit.asset_short")
        ),
        DataType::Scale => group_thousands(value, 0),
    }
}

/// Chart register used by tooltips and axes.
pub fn format_chart_value(value: f64, data_type: DataType, i18n: &I18n) -> String {
    if !value.is_finite() {
        return "-".to_string();
    }
    match data_type {
        DataType::Return => format_percent(value, 2),
        DataType::Asset => format!(
            "¥{}{}",
            group_thousands(value / ASSET_DIVISOR, 2),
            i18n.t("unit.asset_long")
        ),
        DataType::Scale => group_thousands(value, 2),
    }
}

/// Human label of the current data type, e.g. `收益率(固定收益类%)`.
pub fn data_type_label(data_type: DataType, asset_class: AssetClass, i18n: &I18n) -> String {
    match data_type {
        DataType::Scale => i18n.t("label.scale"),
        DataType::Asset => i18n.t("label.asset"),
        DataType::Return => {
            let category = match asset_class {
                AssetClass::Fixed => i18n.t("category.fixed"),
                AssetClass::Other => i18n.t("category.other"),
            };
            i18n.format("label.return", &[("category", &category)])
        }
    }
}

/// Display cells of a statistics row: rank, manager, then the metric columns.
pub fn stat_cells(row: &StatRow, data_type: DataType, i18n: &I18n) -> Vec<String> {
    let mut cells = vec![row.rank().to_string(), row.manager().to_string()];
    match row {
        StatRow::Return(stat) => {
            cells.push(format_percent(stat.cumulative_return_pct, 2));
            cells.push(format_percent(stat.max_drawdown_pct, 2));
        }
        StatRow::Level(stat) => {
            cells.push(format_value(stat.start_value, data_type, i18n));
            cells.push(format_value(stat.end_value, data_type, i18n));
            cells.push(format_value(stat.interval_change, data_type, i18n));
        }
    }
    cells
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{LevelStat, ReturnStat};

    #[test]
    fn test_quarter_label() {
        assert_eq!(quarter_label("2024/12/31"), "2024Q4");
        assert_eq!(quarter_label("2025-03-31"), "2025Q1");
        assert_eq!(quarter_label("20240630"), "2024Q2");
        assert_eq!(quarter_label("Q3 2024"), "Q3 2024");
    }

    #[test]
    fn test_group_thousands() {
        assert_eq!(group_thousands(1234567.891, 2), "1,234,567.89");
        assert_eq!(group_thousands(999.0, 0), "999");
        assert_eq!(group_thousands(1000.0, 0), "1,000");
        assert_eq!(group_thousands(-12345.6, 0), "-12,346");
        assert_eq!(group_thousands(-0.001, 2), "0.00");
    }

    #[test]
    fn test_table_register() {
        let i18n = I18n::new("zh");
        assert_eq!(format_value(1.33266, DataType::Return, &i18n), "1.3327%");
        assert_eq!(format_value(7727028.18, DataType::Asset, &i18n), "772.70亿");
        assert_eq!(format_value(1313.0, DataType::Scale, &i18n), "1,313");
        assert_eq!(format_value(f64::NAN, DataType::Scale, &i18n), "-");
    }

    #[test]
    fn test_chart_register() {
        let i18n = I18n::new("zh");
        assert_eq!(format_chart_value(-0.456, DataType::Return, &i18n), "-0.46%");
        assert_eq!(
            format_chart_value(12345678.0, DataType::Asset, &i18n),
            "¥1,234.57亿元"
        );
        assert_eq!(format_chart_value(1313.0, DataType::Scale, &i18n), "1,313.00");
        assert_eq!(format_chart_value(f64::INFINITY, DataType::Return, &i18n), "-");
    }

    #[test]
    fn test_data_type_label() {
        let zh = I18n::new("zh");
        assert_eq!(data_type_label(DataType::Scale, AssetClass::Fixed, &zh), "组合数");
        assert_eq!(data_type_label(DataType::Asset, AssetClass::Fixed, &zh), "资产规模(亿元)");
        assert_eq!(
            data_type_label(DataType::Return, AssetClass::Other, &zh),
            "收益率(含权益类%)"
        );
        let en = I18n::new("en");
        assert_eq!(
            data_type_label(DataType::Return, AssetClass::Fixed, &en),
            "Return rate (Fixed income %)"
        );
    }

    #[test]
    fn test_stat_cells() {
        let i18n = I18n::new("zh");
        let row = StatRow::Return(ReturnStat {
            rank: 1,
            manager: "华夏".to_string(),
            cumulative_return_pct: 3.14159,
            max_drawdown_pct: 0.5,
        });
        assert_eq!(stat_cells(&row, DataType::Return, &i18n), vec!["1", "华夏", "3.14%", "0.50%"]);

        let row = StatRow::Level(LevelStat {
            rank: 2,
            manager: "南方".to_string(),
            start_value: 1000.0,
            end_value: 1250.0,
            interval_change: 250.0,
            percent_change: 25.0,
        });
        assert_eq!(
            stat_cells(&row, DataType::Scale, &i18n),
            vec!["2", "南方", "1,000", "1,250", "250"]
        );
    }
}
