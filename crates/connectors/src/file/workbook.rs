use crate::{
    error::SinkError,
    sink::{Row, TableHandle, TabularSink, max_date},
};
use async_trait::async_trait;
use chrono::NaiveDate;
use std::{
    fs::{self, File, OpenOptions},
    path::{Path, PathBuf},
};
use tracing::{debug, info};

/// A directory of CSV files, one per named tab.
///
/// File work runs on the blocking pool.
pub struct WorkbookSink {
    dir: PathBuf,
}

impl WorkbookSink {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        WorkbookSink { dir: dir.into() }
    }

    pub fn tab_path(&self, name: &str) -> PathBuf {
        self.dir.join(format!("{}.csv", file_stem(name)))
    }

    fn read_header(path: &Path) -> Result<Option<Vec<String>>, SinkError> {
        let mut reader = csv::ReaderBuilder::new()
            .has_headers(false)
            .flexible(true)
            .from_path(path)?;

        match reader.records().next() {
            Some(record) => Ok(Some(record?.iter().map(str::to_string).collect())),
            None => Ok(None),
        }
    }

    fn open_append(path: &Path) -> Result<csv::Writer<File>, SinkError> {
        let file = OpenOptions::new().append(true).open(path)?;
        Ok(csv::WriterBuilder::new()
            .has_headers(false)
            .flexible(true)
            .from_writer(file))
    }

    fn ensure_tab(
        dir: &Path,
        path: &Path,
        name: &str,
        header: &[String],
    ) -> Result<Vec<String>, SinkError> {
        fs::create_dir_all(dir)
            .map_err(|e| SinkError::Unavailable(format!("cannot create {}: {e}", dir.display())))?;

        OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .map_err(|e| SinkError::Unavailable(format!("cannot open {}: {e}", path.display())))?;

        match Self::read_header(path)? {
            Some(existing) => {
                debug!(tab = name, "Header already present");
                Ok(existing)
            }
            None => {
                info!(tab = name, path = %path.display(), "Writing header to empty tab");
                let mut writer = Self::open_append(path)?;
                writer.write_record(header)?;
                writer.flush()?;
                Ok(header.to_vec())
            }
        }
    }

    fn read_dates(
        path: &Path,
        table: &str,
        column: usize,
    ) -> Result<Option<NaiveDate>, SinkError> {
        if !path.exists() {
            return Ok(None);
        }

        let mut reader = csv::ReaderBuilder::new()
            .has_headers(true)
            .flexible(true)
            .from_path(path)?;

        let mut cells = Vec::new();
        for record in reader.records() {
            let record = record?;
            if let Some(cell) = record.get(column) {
                cells.push(cell.to_string());
            }
        }

        Ok(max_date(table, cells))
    }

    fn write_rows(path: &Path, rows: &[Vec<String>]) -> Result<usize, SinkError> {
        let mut writer = Self::open_append(path)?;
        for row in rows {
            writer.write_record(row)?;
        }
        writer.flush()?;
        Ok(rows.len())
    }
}

#[async_trait]
impl TabularSink for WorkbookSink {
    async fn ensure(&self, name: &str, header: &[String]) -> Result<TableHandle, SinkError> {
        let dir = self.dir.clone();
        let path = self.tab_path(name);
        let name = name.to_string();
        let header = header.to_vec();

        tokio::task::spawn_blocking(move || {
            let stored = Self::ensure_tab(&dir, &path, &name, &header)?;
            Ok(TableHandle::new(name, stored))
        })
        .await?
    }

    async fn last_date(&self, handle: &TableHandle) -> Result<Option<NaiveDate>, SinkError> {
        let path = self.tab_path(&handle.name);
        let table = handle.name.clone();
        let column = handle.date_column;

        tokio::task::spawn_blocking(move || Self::read_dates(&path, &table, column)).await?
    }

    async fn append_rows(&self, handle: &TableHandle, rows: &[Row]) -> Result<usize, SinkError> {
        if rows.is_empty() {
            return Ok(0);
        }

        let path = self.tab_path(&handle.name);
        let records: Vec<Vec<String>> = rows
            .iter()
            .map(|row| row.iter().map(|v| v.to_string()).collect())
            .collect();

        tokio::task::spawn_blocking(move || Self::write_rows(&path, &records)).await?
    }

    fn kind(&self) -> &'static str {
        "csv"
    }
}

/// Maps a tab name to a portable file stem.
fn file_stem(name: &str) -> String {
    let stem: String = name
        .trim()
        .chars()
        .map(|c| {
            if c.is_alphanumeric() || c == '-' || c == '_' {
                c
            } else {
                '_'
            }
        })
        .collect();
    if stem.is_empty() { "_".to_string() } else { stem }
}

#[cfg(test)]
mod tests {
    use super::*;
    use model::core::value::Value;
    use tempfile::tempdir;

    fn header() -> Vec<String> {
        ["date", "clicks", "impressions", "ctr", "position"]
            .into_iter()
            .map(String::from)
            .collect()
    }

    fn row(date: &str, clicks: u64) -> Row {
        vec![
            Value::String(date.into()),
            Value::Uint(clicks),
            Value::Uint(clicks * 10),
            Value::Float(0.1),
            Value::Float(4.5),
        ]
    }

    #[tokio::test]
    async fn ensure_creates_tab_with_header_once() {
        let dir = tempdir().unwrap();
        let sink = WorkbookSink::new(dir.path().join("book"));

        let handle = sink.ensure("daily totals", &header()).await.unwrap();
        assert_eq!(handle.header, header());
        sink.ensure("daily totals", &header()).await.unwrap();

        let content = fs::read_to_string(sink.tab_path("daily totals")).unwrap();
        assert_eq!(content, "date,clicks,impressions,ctr,position\n");
    }

    #[tokio::test]
    async fn ensure_keeps_existing_header() {
        let dir = tempdir().unwrap();
        let sink = WorkbookSink::new(dir.path());
        fs::write(sink.tab_path("daily"), "day,date,clicks\n").unwrap();

        let handle = sink.ensure("daily", &header()).await.unwrap();
        assert_eq!(handle.header, vec!["day", "date", "clicks"]);
        assert_eq!(handle.date_column, 1);
        assert_eq!(
            fs::read_to_string(sink.tab_path("daily")).unwrap(),
            "day,date,clicks\n"
        );
    }

    #[tokio::test]
    async fn last_date_is_none_for_header_only_tab() {
        let dir = tempdir().unwrap();
        let sink = WorkbookSink::new(dir.path());
        let handle = sink.ensure("daily", &header()).await.unwrap();

        assert_eq!(sink.last_date(&handle).await.unwrap(), None);
    }

    #[tokio::test]
    async fn last_date_reads_freshly_appended_rows() {
        let dir = tempdir().unwrap();
        let sink = WorkbookSink::new(dir.path());
        let handle = sink.ensure("daily", &header()).await.unwrap();

        let rows = vec![row("2024-06-02", 1), row("2024-06-04", 3), row("2024-06-03", 2)];
        assert_eq!(sink.append_rows(&handle, &rows).await.unwrap(), 3);

        assert_eq!(
            sink.last_date(&handle).await.unwrap(),
            NaiveDate::from_ymd_opt(2024, 6, 4)
        );
    }

    #[tokio::test]
    async fn append_preserves_order() {
        let dir = tempdir().unwrap();
        let sink = WorkbookSink::new(dir.path());
        let handle = sink.ensure("daily", &header()).await.unwrap();

        sink.append_rows(&handle, &[row("2024-06-05", 5)]).await.unwrap();
        sink.append_rows(&handle, &[row("2024-06-01", 1)]).await.unwrap();

        let content = fs::read_to_string(sink.tab_path("daily")).unwrap();
        let lines: Vec<&str> = content.lines().collect();
        assert_eq!(lines.len(), 3);
        assert!(lines[1].starts_with("2024-06-05,5,50"));
        assert!(lines[2].starts_with("2024-06-01,1,10"));
    }

    #[test]
    fn sanitizes_tab_names() {
        assert_eq!(file_stem("query/breakdown 2"), "query_breakdown_2");
        assert_eq!(file_stem("   "), "_");
    }
}
