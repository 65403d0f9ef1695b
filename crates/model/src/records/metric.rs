use crate::{
    core::{dimension::Dimension, value::Value},
    error::ModelError,
};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Date format used for API keys and for date cells in every sink.
pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// Metric columns appended after the dimension columns, in order.
pub const METRIC_COLUMNS: [&str; 4] = ["clicks", "impressions", "ctr", "position"];

/// One fetched analytics row for a single day.
///
/// `dimension_values` holds the keys of the non-date dimensions of the target
/// that requested it, in the target's dimension order. The date key lives in
/// `date`.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct MetricRow {
    pub date: NaiveDate,
    pub dimension_values: Vec<String>,
    pub clicks: u64,
    pub impressions: u64,
    pub ctr: f64,
    pub position: f64,
}

impl MetricRow {
    /// Builds a row from API keys aligned to `dimensions`.
    pub fn from_keys(
        dimensions: &[Dimension],
        keys: Vec<String>,
        clicks: u64,
        impressions: u64,
        ctr: f64,
        position: f64,
    ) -> Result<Self, ModelError> {
        if keys.len() != dimensions.len() {
            return Err(ModelError::KeyMismatch {
                expected: dimensions.len(),
                actual: keys.len(),
            });
        }

        let mut date = None;
        let mut dimension_values = Vec::with_capacity(keys.len().saturating_sub(1));
        for (dim, key) in dimensions.iter().zip(keys) {
            if *dim == Dimension::Date {
                date = Some(parse_date(&key)?);
            } else {
                dimension_values.push(key);
            }
        }

        let date = date.ok_or(ModelError::MissingDate)?;

        Ok(MetricRow {
            date,
            dimension_values,
            clicks,
            impressions,
            ctr,
            position,
        })
    }

    /// Renders the row as cells in `dimensions` order followed by the metrics.
    pub fn to_values(&self, dimensions: &[Dimension]) -> Vec<Value> {
        let mut values = Vec::with_capacity(dimensions.len() + METRIC_COLUMNS.len());
        let mut keys = self.dimension_values.iter();
        for dim in dimensions {
            match dim {
                Dimension::Date => values.push(Value::String(format_date(self.date))),
                _ => values.push(Value::String(keys.next().cloned().unwrap_or_default())),
            }
        }
        values.push(Value::Uint(self.clicks));
        values.push(Value::Uint(self.impressions));
        values.push(Value::Float(self.ctr));
        values.push(Value::Float(self.position));
        values
    }
}

pub fn parse_date(raw: &str) -> Result<NaiveDate, ModelError> {
    NaiveDate::parse_from_str(raw.trim(), DATE_FORMAT)
        .map_err(|_| ModelError::InvalidDate(raw.to_string()))
}

pub fn format_date(date: NaiveDate) -> String {
    date.format(DATE_FORMAT).to_string()
}
