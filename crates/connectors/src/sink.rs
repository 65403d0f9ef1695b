use crate::error::SinkError;
use async_trait::async_trait;
use chrono::NaiveDate;
use model::{
    core::{dimension::Dimension, value::Value},
    records::metric::parse_date,
};
use tracing::warn;

/// One row of cells, in header order.
pub type Row = Vec<Value>;

/// A provisioned table, as returned by [`TabularSink::ensure`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableHandle {
    pub name: String,
    /// Header as stored in the sink, which may predate the configured one.
    pub header: Vec<String>,
    /// Index of the column the watermark is read from.
    pub date_column: usize,
}

impl TableHandle {
    pub fn new(name: impl Into<String>, header: Vec<String>) -> Self {
        let date_column = header
            .iter()
            .position(|h| h.trim().eq_ignore_ascii_case(Dimension::Date.as_str()))
            .unwrap_or(0);
        TableHandle {
            name: name.into(),
            header,
            date_column,
        }
    }

    pub fn date_column_name(&self) -> &str {
        self.header
            .get(self.date_column)
            .map(String::as_str)
            .unwrap_or(Dimension::Date.as_str())
    }
}

/// Uniform access to a named tabular target, whatever stores it.
///
/// Implementations never retry and never deduplicate.
#[async_trait]
pub trait TabularSink: Send + Sync {
    /// Creates the target if needed and writes `header` when it is empty.
    /// A non-empty header is left untouched.
    async fn ensure(&self, name: &str, header: &[String]) -> Result<TableHandle, SinkError>;

    /// Maximum date in the date column, `None` when there are no data rows.
    async fn last_date(&self, handle: &TableHandle) -> Result<Option<NaiveDate>, SinkError>;

    /// Appends `rows` in order and returns how many were written.
    async fn append_rows(&self, handle: &TableHandle, rows: &[Row]) -> Result<usize, SinkError>;

    /// Short name of the backing store, for logs.
    fn kind(&self) -> &'static str;
}

/// Maximum parsable date among `cells`, skipping blanks and logging garbage.
pub(crate) fn max_date<I, S>(table: &str, cells: I) -> Option<NaiveDate>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut latest = None;
    for cell in cells {
        let raw = cell.as_ref().trim();
        if raw.is_empty() {
            continue;
        }
        match parse_date(raw) {
            Ok(date) => latest = latest.max(Some(date)),
            Err(_) => warn!(table, cell = raw, "Ignoring non-date value in date column"),
        }
    }
    latest
}
