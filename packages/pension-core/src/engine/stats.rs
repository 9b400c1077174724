//! Interval statistics: compounded return, maximum drawdown, start/end deltas.

use super::filter::FilteredSet;
use crate::types::{DataType, LevelStat, ReturnStat, StatRow};
use tracing::debug;

/// Cumulative return after each period, in percent.
///
/// Each input is a period return in percent; growth factors `1 + r/100` are
/// compounded in order.
pub fn cumulative_path(returns_pct: &[f64]) -> Vec<f64> {
    let mut factor = 1.0;
    returns_pct
        .iter()
        .map(|r| {
            factor *= 1.0 + r / 100.0;
            (factor - 1.0) * 100.0
        })
        .collect()
}

/// Compounded return over a sequence of period returns, in percent.
pub fn cumulative_return(returns_pct: &[f64]) -> f64 {
    let factor = returns_pct
        .iter()
        .fold(1.0, |acc, r| acc * (1.0 + r / 100.0));
    (factor - 1.0) * 100.0
}

/// Maximum drawdown of the cumulative growth factor, in percent.
///
/// The running peak starts at zero and only increases. After each period the
/// drawdown is `(peak - factor) / (1 + peak)`; the largest one is reported.
pub fn max_drawdown(returns_pct: &[f64]) -> f64 {
    let mut factor = 1.0;
    let mut peak: f64 = 0.0;
    let mut max_drawdown: f64 = 0.0;

    for r in returns_pct {
        factor *= 1.0 + r / 100.0;
        peak = peak.max(factor);
        let drawdown = (peak - factor) / (1.0 + peak);
        max_drawdown = max_drawdown.max(drawdown);
    }

    max_drawdown * 100.0
}

/// Percent change from `start` to `end`. Zero when `start` is zero.
pub fn percent_change(start: f64, end: f64) -> f64 {
    if start != 0.0 {
        (end - start) / start * 100.0
    } else {
        0.0
    }
}

/// Ranked statistics rows and the managers left out for lack of data.
#[derive(Debug, Clone, Default)]
pub struct IntervalStats {
    /// Rows ranked by sort key, descending
    pub rows: Vec<StatRow>,
    /// Selected managers with no matching records
    pub missing: Vec<String>,
}

/// Compute per-manager interval statistics and rank them.
///
/// Managers without records are excluded from the rows.
pub fn interval_stats(
    filtered: &FilteredSet<'_>,
    data_type: DataType,
    managers: &[String],
) -> IntervalStats {
    let mut rows = Vec::with_capacity(managers.len());
    let mut missing = Vec::new();

    for manager in managers {
        let records = filtered.manager_records(manager);
        let (Some(first), Some(last)) = (records.first(), records.last()) else {
            debug!(%manager, "no records for the active filter, excluded from statistics");
            missing.push(manager.clone());
            continue;
        };

        if data_type.is_return() {
            let returns: Vec<f64> = records.iter().map(|r| r.value).collect();
            rows.push(StatRow::Return(ReturnStat {
                rank: 0,
                manager: manager.clone(),
                cumulative_return_pct: cumulative_return(&returns),
                max_drawdown_pct: max_drawdown(&returns),
            }));
        } else {
            let end_value = last.value;
            let start_value = if filtered.single_period {
                filtered
                    .previous_values
                    .get(manager)
                    .copied()
                    .unwrap_or(first.value)
            } else {
                first.value
            };
            rows.push(StatRow::Level(LevelStat {
                rank: 0,
                manager: manager.clone(),
                start_value,
                end_value,
                interval_change: end_value - start_value,
                percent_change: percent_change(start_value, end_value),
            }));
        }
    }

    rows.sort_by(|a, b| b.rank_value().total_cmp(&a.rank_value()));
    for (idx, row) in rows.iter_mut().enumerate() {
        row.set_rank(idx + 1);
    }

    IntervalStats { rows, missing }
}
