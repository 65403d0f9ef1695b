use crate::{
    core::dimension::Dimension,
    error::ModelError,
    records::metric::METRIC_COLUMNS,
};
use serde::Serialize;
use std::collections::HashSet;

/// A named destination table together with the breakdown it stores.
#[derive(Serialize, Debug, Clone, PartialEq, Eq)]
pub struct SyncTarget {
    name: String,
    dimensions: Vec<Dimension>,
    header: Vec<String>,
}

impl SyncTarget {
    /// Creates a target, deriving the header from the dimensions when `header`
    /// is `None`.
    pub fn new(
        name: impl Into<String>,
        dimensions: Vec<Dimension>,
        header: Option<Vec<String>>,
    ) -> Result<Self, ModelError> {
        let name = name.into();
        let invalid = |reason: &str| ModelError::InvalidTarget {
            name: name.clone(),
            reason: reason.to_string(),
        };

        if name.trim().is_empty() {
            return Err(invalid("name is empty"));
        }
        if dimensions.is_empty() {
            return Err(invalid("dimension set is empty"));
        }
        let mut seen = HashSet::new();
        if !dimensions.iter().all(|d| seen.insert(*d)) {
            return Err(invalid("dimension set contains duplicates"));
        }
        if !dimensions.contains(&Dimension::Date) {
            return Err(invalid("dimension set must contain 'date'"));
        }

        let header = header.unwrap_or_else(|| default_header(&dimensions));
        if header.len() != dimensions.len() + METRIC_COLUMNS.len() {
            return Err(invalid(&format!(
                "header has {} columns, expected {}",
                header.len(),
                dimensions.len() + METRIC_COLUMNS.len()
            )));
        }

        Ok(SyncTarget {
            name,
            dimensions,
            header,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn dimensions(&self) -> &[Dimension] {
        &self.dimensions
    }

    pub fn header(&self) -> &[String] {
        &self.header
    }
}

/// Dimension names followed by the metric columns.
pub fn default_header(dimensions: &[Dimension]) -> Vec<String> {
    dimensions
        .iter()
        .map(|d| d.as_str())
        .chain(METRIC_COLUMNS)
        .map(str::to_string)
        .collect()
}
