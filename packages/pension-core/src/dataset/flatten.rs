//! Flattening of the nested manager → metric key → date → value document.

use crate::types::{Category, MetricType, Record};
use crate::{Error, Result};
use serde_json::Value;
use tracing::{debug, warn};

/// Composite metric key `rawMetricLabel_scopeLabel_assetLabel`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MetricKey<'a> {
    pub raw_metric: &'a str,
    pub scope: &'a str,
    pub asset: &'a str,
}

impl<'a> MetricKey<'a> {
    /// Split a key into its three underscore-delimited parts.
    pub fn parse(key: &'a str) -> Option<Self> {
        let mut parts = key.split('_');
        let raw_metric = parts.next()?;
        let scope = parts.next()?;
        let asset = parts.next()?;
        if parts.next().is_some() {
            return None;
        }
        Some(Self {
            raw_metric,
            scope,
            asset,
        })
    }

    pub fn metric(&self) -> MetricType {
        MetricType::classify(self.raw_metric)
    }

    /// Asset label for return metrics, `Overall` for everything else.
    pub fn category(&self, metric: &MetricType) -> Category {
        if metric.is_return() {
            Category::from_label(self.asset)
        } else {
            Category::Overall
        }
    }
}

/// Interpret a leaf as a finite number. Numeric strings are accepted.
pub fn parse_value(raw: &Value) -> Option<f64> {
    let value = match raw {
        Value::Number(n) => n.as_f64()?,
        Value::String(s) => s.trim().parse::<f64>().ok()?,
        _ => return None,
    };
    value.is_finite().then_some(value)
}

/// Flatten a nested document into records.
///
/// Output order follows the document: manager, then metric key, then date.
/// Non-numeric leaves are dropped without error.
pub fn flatten(document: &Value) -> Result<Vec<Record>> {
    let managers = document
        .as_object()
        .ok_or_else(|| Error::Parse("expected an object keyed by manager name".to_string()))?;

    let mut records = Vec::new();
    let mut dropped = 0usize;

    for (manager, metrics) in managers {
        let Some(metrics) = metrics.as_object() else {
            warn!(%manager, "skipping manager entry that is not an object");
            continue;
        };

        for (key, series) in metrics {
            let Some(metric_key) = MetricKey::parse(key) else {
                warn!(%manager, %key, "skipping metric key without exactly three parts");
                continue;
            };
            let Some(series) = series.as_object() else {
                warn!(%manager, %key, "skipping metric series that is not an object");
                continue;
            };

            let metric = metric_key.metric();
            if let MetricType::Other(label) = &metric {
                debug!(%label, "keeping unrecognised metric label verbatim");
            }
            let category = metric_key.category(&metric);

            for (date, raw) in series {
                match parse_value(raw) {
                    Some(value) => records.push(Record {
                        date: date.clone(),
                        manager: manager.clone(),
                        metric: metric.clone(),
                        category: category.clone(),
                        value,
                    }),
                    None => dropped += 1,
                }
            }
        }
    }

    debug!(records = records.len(), dropped, "flattened document");
    Ok(records)
}
