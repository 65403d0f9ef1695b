use crate::{bounded::bounded, error::FetchFailure, metrics::Metrics};
use connectors::{
    error::ApiError,
    search::{ApiRow, QueryRequest, ReportingApi},
};
use model::{
    core::dimension::Dimension, records::metric::MetricRow, sync::window::SyncWindow,
};
use std::{sync::Arc, time::Duration};
use tracing::{debug, warn};

/// Rows returned for one target plus whether the row limit was hit.
#[derive(Debug, Clone, PartialEq)]
pub struct FetchOutcome {
    pub rows: Vec<MetricRow>,
    pub truncated: bool,
}

/// Issues one dimensioned query per call against a fixed site.
#[derive(Clone)]
pub struct ReportFetcher {
    api: Arc<dyn ReportingApi>,
    site_url: String,
    row_limit: usize,
    call_timeout: Duration,
    metrics: Metrics,
}

impl ReportFetcher {
    pub fn new(
        api: Arc<dyn ReportingApi>,
        site_url: impl Into<String>,
        row_limit: usize,
        call_timeout: Duration,
        metrics: Metrics,
    ) -> Self {
        ReportFetcher {
            api,
            site_url: site_url.into(),
            row_limit,
            call_timeout,
            metrics,
        }
    }

    pub async fn verify_credentials(&self) -> Result<(), ApiError> {
        bounded(
            self.call_timeout,
            self.api.verify_credentials(),
            ApiError::Timeout,
        )
        .await
    }

    /// Fetches `window` broken down by `dimensions`.
    ///
    /// Zero rows is a normal outcome. Reaching the row limit is logged and
    /// flagged but not paginated.
    pub async fn fetch(
        &self,
        target: &str,
        window: &SyncWindow,
        dimensions: &[Dimension],
    ) -> Result<FetchOutcome, FetchFailure> {
        let request = QueryRequest {
            site_url: self.site_url.clone(),
            start_date: window.start_date,
            end_date: window.end_date,
            dimensions: dimensions.to_vec(),
            row_limit: self.row_limit,
        };

        let api_rows = bounded(self.call_timeout, self.api.query(&request), ApiError::Timeout).await?;
        self.metrics.increment_fetches(1);

        let truncated = api_rows.len() >= self.row_limit;
        if truncated {
            self.metrics.increment_truncations(1);
            warn!(
                table = target,
                row_limit = self.row_limit,
                %window,
                "Result reached the row limit; rows beyond it were not fetched"
            );
        }

        let rows = api_rows
            .into_iter()
            .map(|row| to_metric_row(dimensions, row))
            .collect::<Result<Vec<_>, _>>()?;

        self.metrics.increment_rows_fetched(rows.len() as u64);
        debug!(table = target, rows = rows.len(), "Fetched rows");

        Ok(FetchOutcome { rows, truncated })
    }
}

fn to_metric_row(dimensions: &[Dimension], row: ApiRow) -> Result<MetricRow, FetchFailure> {
    Ok(MetricRow::from_keys(
        dimensions,
        row.keys,
        count(row.clicks),
        count(row.impressions),
        row.ctr.clamp(0.0, 1.0),
        row.position.max(0.0),
    )?)
}

/// The API reports counts as JSON numbers; negative or NaN becomes zero.
fn count(raw: f64) -> u64 {
    if raw.is_finite() && raw > 0.0 {
        raw.round() as u64
    } else {
        0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use chrono::NaiveDate;
    use std::sync::Mutex;
    use tracing_test::traced_test;

    struct CannedApi {
        rows: Vec<ApiRow>,
        requests: Mutex<Vec<QueryRequest>>,
    }

    #[async_trait]
    impl ReportingApi for CannedApi {
        async fn verify_credentials(&self) -> Result<(), ApiError> {
            Ok(())
        }

        async fn query(&self, request: &QueryRequest) -> Result<Vec<ApiRow>, ApiError> {
            self.requests.lock().unwrap().push(request.clone());
            Ok(self.rows.clone())
        }
    }

    fn api_row(keys: &[&str], clicks: f64) -> ApiRow {
        ApiRow {
            keys: keys.iter().map(|k| k.to_string()).collect(),
            clicks,
            impressions: 100.0,
            ctr: clicks / 100.0,
            position: 4.2,
        }
    }

    fn window() -> SyncWindow {
        SyncWindow::new(
            NaiveDate::from_ymd_opt(2024, 6, 2).unwrap(),
            NaiveDate::from_ymd_opt(2024, 6, 7).unwrap(),
        )
    }

    fn fetcher(rows: Vec<ApiRow>, row_limit: usize) -> (Arc<CannedApi>, ReportFetcher) {
        let api = Arc::new(CannedApi {
            rows,
            requests: Mutex::new(Vec::new()),
        });
        let fetcher = ReportFetcher::new(
            api.clone(),
            "https://example.com/",
            row_limit,
            Duration::from_secs(5),
            Metrics::new(),
        );
        (api, fetcher)
    }

    #[tokio::test]
    async fn sends_window_and_dimensions() {
        let (api, fetcher) = fetcher(vec![], 25_000);
        let dims = [Dimension::Date, Dimension::Device];
        fetcher.fetch("devices", &window(), &dims).await.unwrap();

        let requests = api.requests.lock().unwrap();
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].site_url, "https://example.com/");
        assert_eq!(requests[0].start_date, window().start_date);
        assert_eq!(requests[0].end_date, window().end_date);
        assert_eq!(requests[0].dimensions, dims);
        assert_eq!(requests[0].row_limit, 25_000);
    }

    #[tokio::test]
    async fn converts_rows() {
        let (_, fetcher) = fetcher(vec![api_row(&["2024-06-02", "DESKTOP"], 3.0)], 25_000);
        let outcome = fetcher
            .fetch("devices", &window(), &[Dimension::Date, Dimension::Device])
            .await
            .unwrap();

        assert!(!outcome.truncated);
        assert_eq!(outcome.rows.len(), 1);
        assert_eq!(outcome.rows[0].dimension_values, vec!["DESKTOP"]);
        assert_eq!(outcome.rows[0].clicks, 3);
    }

    #[tokio::test]
    async fn zero_rows_is_not_an_error() {
        let (_, fetcher) = fetcher(vec![], 25_000);
        let outcome = fetcher
            .fetch("queries", &window(), &[Dimension::Date, Dimension::Query])
            .await
            .unwrap();
        assert!(outcome.rows.is_empty());
    }

    #[tokio::test]
    #[traced_test]
    async fn flags_and_logs_truncation() {
        let rows = vec![api_row(&["2024-06-02"], 1.0), api_row(&["2024-06-03"], 2.0)];
        let (_, fetcher) = fetcher(rows, 2);
        let outcome = fetcher.fetch("daily", &window(), &[Dimension::Date]).await.unwrap();

        assert!(outcome.truncated);
        assert!(logs_contain("row limit"));
        assert_eq!(fetcher.metrics.snapshot().truncated_fetches, 1);
    }

    #[tokio::test]
    async fn misaligned_keys_are_a_fetch_failure() {
        let (_, fetcher) = fetcher(vec![api_row(&["2024-06-02"], 1.0)], 25_000);
        let result = fetcher
            .fetch("raw", &window(), &[Dimension::Date, Dimension::Query])
            .await;
        assert!(matches!(result, Err(FetchFailure::Shape(_))));
    }

    #[test]
    fn rounds_counts() {
        assert_eq!(count(3.0), 3);
        assert_eq!(count(2.6), 3);
        assert_eq!(count(-1.0), 0);
        assert_eq!(count(f64::NAN), 0);
    }
}
