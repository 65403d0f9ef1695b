use crate::{bounded::bounded, error::SyncError};
use chrono::NaiveDate;
use connectors::{
    error::SinkError,
    sink::{Row, TableHandle, TabularSink},
};
use model::sync::target::SyncTarget;
use std::{sync::Arc, time::Duration};

/// Sink calls bounded by a timeout and classified into [`SyncError`].
///
/// Provisioning and reads map to `SinkUnavailable`, appends to `SinkWrite`.
#[derive(Clone)]
pub struct SinkGateway {
    sink: Arc<dyn TabularSink>,
    call_timeout: Duration,
}

impl SinkGateway {
    pub fn new(sink: Arc<dyn TabularSink>, call_timeout: Duration) -> Self {
        SinkGateway { sink, call_timeout }
    }

    pub fn kind(&self) -> &'static str {
        self.sink.kind()
    }

    pub async fn ensure(&self, target: &SyncTarget) -> Result<TableHandle, SyncError> {
        bounded(
            self.call_timeout,
            self.sink.ensure(target.name(), target.header()),
            SinkError::Timeout,
        )
        .await
        .map_err(|source| SyncError::SinkUnavailable {
            target: target.name().to_string(),
            source,
        })
    }

    pub async fn last_date(&self, handle: &TableHandle) -> Result<Option<NaiveDate>, SyncError> {
        bounded(
            self.call_timeout,
            self.sink.last_date(handle),
            SinkError::Timeout,
        )
        .await
        .map_err(|source| SyncError::SinkUnavailable {
            target: handle.name.clone(),
            source,
        })
    }

    pub async fn append(&self, handle: &TableHandle, rows: &[Row]) -> Result<usize, SyncError> {
        bounded(
            self.call_timeout,
            self.sink.append_rows(handle, rows),
            SinkError::Timeout,
        )
        .await
        .map_err(|source| SyncError::SinkWrite {
            target: handle.name.clone(),
            source,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use model::core::dimension::Dimension;

    /// Does its store work on the blocking pool, like the file and SQLite sinks.
    struct SlowSink {
        delay: Duration,
    }

    #[async_trait]
    impl TabularSink for SlowSink {
        async fn ensure(&self, name: &str, header: &[String]) -> Result<TableHandle, SinkError> {
            let delay = self.delay;
            tokio::task::spawn_blocking(move || std::thread::sleep(delay)).await?;
            Ok(TableHandle::new(name, header.to_vec()))
        }

        async fn last_date(&self, _: &TableHandle) -> Result<Option<NaiveDate>, SinkError> {
            Ok(None)
        }

        async fn append_rows(&self, _: &TableHandle, rows: &[Row]) -> Result<usize, SinkError> {
            let delay = self.delay;
            tokio::task::spawn_blocking(move || std::thread::sleep(delay)).await?;
            Ok(rows.len())
        }

        fn kind(&self) -> &'static str {
            "slow"
        }
    }

    fn gateway(delay: Duration) -> SinkGateway {
        SinkGateway::new(Arc::new(SlowSink { delay }), Duration::from_millis(50))
    }

    fn daily() -> SyncTarget {
        SyncTarget::new("daily_totals", vec![Dimension::Date], None).unwrap()
    }

    #[tokio::test]
    async fn blocking_ensure_is_bounded() {
        let err = gateway(Duration::from_millis(500))
            .ensure(&daily())
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            SyncError::SinkUnavailable {
                source: SinkError::Timeout(_),
                ..
            }
        ));
    }

    #[tokio::test]
    async fn blocking_append_times_out_as_write_error() {
        let handle = TableHandle::new("daily_totals", vec!["date".into()]);
        let err = gateway(Duration::from_millis(500))
            .append(&handle, &[Vec::new()])
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            SyncError::SinkWrite {
                source: SinkError::Timeout(_),
                ..
            }
        ));
    }

    #[tokio::test]
    async fn fast_calls_pass_through() {
        let handle = gateway(Duration::ZERO).ensure(&daily()).await.unwrap();
        assert_eq!(handle.name, "daily_totals");
    }
}
