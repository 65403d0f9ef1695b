use crate::settings::{SyncSettings, validated::ValidatedSettings};
use async_trait::async_trait;
use chrono::NaiveDate;
use connectors::{
    error::{ApiError, AuthError, SinkError},
    search::{ApiRow, QueryRequest, ReportingApi},
    sink::{Row, TableHandle, TabularSink},
};
use model::{
    core::{dimension::Dimension, value::Value},
    records::metric::parse_date,
};
use std::{
    collections::{HashMap, HashSet},
    sync::Mutex,
};
use tokio_util::sync::CancellationToken;

pub fn d(y: i32, m: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, day).unwrap()
}

/// Default targets, anchor `daily_totals`, with `overrides` merged on top.
pub fn settings(overrides: serde_json::Value) -> ValidatedSettings {
    let mut doc = serde_json::json!({
        "site_url": "sc-domain:example.com",
        "sink": {"type": "csv", "dir": "unused"}
    });
    if let (Some(base), Some(extra)) = (doc.as_object_mut(), overrides.as_object()) {
        for (k, v) in extra {
            base.insert(k.clone(), v.clone());
        }
    }
    SyncSettings::from_json(&doc.to_string(), &HashMap::new())
        .unwrap()
        .validate()
        .unwrap()
}

pub fn api_row(keys: &[&str], clicks: f64) -> ApiRow {
    ApiRow {
        keys: keys.iter().map(|k| k.to_string()).collect(),
        clicks,
        impressions: clicks * 10.0,
        ctr: 0.1,
        position: 3.5,
    }
}

#[derive(Default)]
pub struct MemorySink {
    pub tables: Mutex<HashMap<String, (Vec<String>, Vec<Row>)>>,
    pub fail_ensure: HashSet<String>,
    pub fail_append: HashSet<String>,
    pub append_calls: Mutex<Vec<String>>,
}

impl MemorySink {
    pub fn failing_append(table: &str) -> Self {
        MemorySink {
            fail_append: HashSet::from([table.to_string()]),
            ..Default::default()
        }
    }

    pub fn failing_ensure(table: &str) -> Self {
        MemorySink {
            fail_ensure: HashSet::from([table.to_string()]),
            ..Default::default()
        }
    }

    /// Pre-populates `table` with one row dated `date`.
    pub fn seed(&self, table: &str, header: &[&str], date: NaiveDate) {
        let mut row: Row = vec![Value::String(date.to_string())];
        row.resize(header.len(), Value::Uint(0));
        self.tables.lock().unwrap().insert(
            table.to_string(),
            (header.iter().map(|h| h.to_string()).collect(), vec![row]),
        );
    }

    pub fn rows(&self, table: &str) -> Vec<Row> {
        self.tables
            .lock()
            .unwrap()
            .get(table)
            .map(|(_, rows)| rows.clone())
            .unwrap_or_default()
    }

    pub fn has_table(&self, table: &str) -> bool {
        self.tables.lock().unwrap().contains_key(table)
    }
}

#[async_trait]
impl TabularSink for MemorySink {
    async fn ensure(&self, name: &str, header: &[String]) -> Result<TableHandle, SinkError> {
        if self.fail_ensure.contains(name) {
            return Err(SinkError::Unavailable(format!("{name} is offline")));
        }
        let mut tables = self.tables.lock().unwrap();
        let (stored, _) = tables
            .entry(name.to_string())
            .or_insert_with(|| (header.to_vec(), Vec::new()));
        Ok(TableHandle::new(name, stored.clone()))
    }

    async fn last_date(&self, handle: &TableHandle) -> Result<Option<NaiveDate>, SinkError> {
        Ok(self
            .rows(&handle.name)
            .iter()
            .filter_map(|row| row.get(handle.date_column)?.as_str().map(parse_date))
            .filter_map(Result::ok)
            .max())
    }

    async fn append_rows(&self, handle: &TableHandle, rows: &[Row]) -> Result<usize, SinkError> {
        self.append_calls.lock().unwrap().push(handle.name.clone());
        if self.fail_append.contains(&handle.name) {
            return Err(SinkError::InvalidData("quota exceeded".into()));
        }
        let mut tables = self.tables.lock().unwrap();
        let (_, stored) = tables
            .get_mut(&handle.name)
            .ok_or_else(|| SinkError::Unavailable(handle.name.clone()))?;
        stored.extend_from_slice(rows);
        Ok(rows.len())
    }

    fn kind(&self) -> &'static str {
        "memory"
    }
}

/// Answers queries by dimension set.
#[derive(Default)]
pub struct MockApi {
    pub rows: HashMap<Vec<Dimension>, Vec<ApiRow>>,
    pub failing: HashSet<Vec<Dimension>>,
    pub reject_credentials: bool,
    /// Cancelled after the first query is answered.
    pub cancel_after_first: Option<CancellationToken>,
    pub requests: Mutex<Vec<QueryRequest>>,
}

impl MockApi {
    pub fn with_rows(mut self, dims: &[Dimension], rows: Vec<ApiRow>) -> Self {
        self.rows.insert(dims.to_vec(), rows);
        self
    }

    pub fn failing_for(mut self, dims: &[Dimension]) -> Self {
        self.failing.insert(dims.to_vec());
        self
    }

    pub fn request_count(&self) -> usize {
        self.requests.lock().unwrap().len()
    }

    pub fn requested_dimensions(&self) -> Vec<Vec<Dimension>> {
        self.requests
            .lock()
            .unwrap()
            .iter()
            .map(|r| r.dimensions.clone())
            .collect()
    }
}

#[async_trait]
impl ReportingApi for MockApi {
    async fn verify_credentials(&self) -> Result<(), ApiError> {
        if self.reject_credentials {
            return Err(ApiError::Auth(AuthError::Rejected(401)));
        }
        Ok(())
    }

    async fn query(&self, request: &QueryRequest) -> Result<Vec<ApiRow>, ApiError> {
        self.requests.lock().unwrap().push(request.clone());
        if let Some(token) = &self.cancel_after_first {
            token.cancel();
        }
        if self.failing.contains(&request.dimensions) {
            return Err(ApiError::Status {
                status: 500,
                body: "backend error".into(),
            });
        }
        Ok(self
            .rows
            .get(&request.dimensions)
            .cloned()
            .unwrap_or_default())
    }
}
