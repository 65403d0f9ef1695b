use crate::{error::SyncError, gateway::SinkGateway};
use chrono::NaiveDate;
use connectors::sink::TableHandle;
use model::sync::target::SyncTarget;
use tracing::info;

/// Reads a target's watermark: the latest date already stored in it.
///
/// The watermark is never persisted on its own, it is recomputed from the
/// sink on every run.
pub struct WatermarkTracker<'a> {
    gateway: &'a SinkGateway,
}

impl<'a> WatermarkTracker<'a> {
    pub fn new(gateway: &'a SinkGateway) -> Self {
        WatermarkTracker { gateway }
    }

    /// Provisions `target` and returns its handle with its last synced date.
    pub async fn last_synced_date(
        &self,
        target: &SyncTarget,
    ) -> Result<(TableHandle, Option<NaiveDate>), SyncError> {
        let handle = self.gateway.ensure(target).await?;
        let watermark = self.gateway.last_date(&handle).await?;

        match watermark {
            Some(date) => info!(table = target.name(), %date, "Watermark found"),
            None => info!(table = target.name(), "No synced rows yet"),
        }

        Ok((handle, watermark))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use async_trait::async_trait;
    use connectors::{
        error::SinkError,
        sink::{Row, TabularSink},
    };
    use model::core::dimension::Dimension;
    use std::{sync::Arc, time::Duration};

    struct FixedSink {
        latest: Option<NaiveDate>,
        reachable: bool,
    }

    #[async_trait]
    impl TabularSink for FixedSink {
        async fn ensure(&self, name: &str, header: &[String]) -> Result<TableHandle, SinkError> {
            if !self.reachable {
                return Err(SinkError::Unavailable("offline".into()));
            }
            Ok(TableHandle::new(name, header.to_vec()))
        }

        async fn last_date(&self, _: &TableHandle) -> Result<Option<NaiveDate>, SinkError> {
            Ok(self.latest)
        }

        async fn append_rows(&self, _: &TableHandle, rows: &[Row]) -> Result<usize, SinkError> {
            Ok(rows.len())
        }

        fn kind(&self) -> &'static str {
            "fixed"
        }
    }

    fn daily() -> SyncTarget {
        SyncTarget::new("daily_totals", vec![Dimension::Date], None).unwrap()
    }

    fn gateway(latest: Option<NaiveDate>, reachable: bool) -> SinkGateway {
        SinkGateway::new(Arc::new(FixedSink { latest, reachable }), Duration::from_secs(5))
    }

    #[tokio::test]
    async fn returns_stored_watermark() {
        let date = NaiveDate::from_ymd_opt(2024, 6, 1);
        let gateway = gateway(date, true);
        let (handle, watermark) = WatermarkTracker::new(&gateway)
            .last_synced_date(&daily())
            .await
            .unwrap();

        assert_eq!(handle.name, "daily_totals");
        assert_eq!(watermark, date);
    }

    #[tokio::test]
    async fn empty_target_has_no_watermark() {
        let gateway = gateway(None, true);
        let (_, watermark) = WatermarkTracker::new(&gateway)
            .last_synced_date(&daily())
            .await
            .unwrap();
        assert_eq!(watermark, None);
    }

    #[tokio::test]
    async fn unreachable_sink_is_sink_unavailable() {
        let gateway = gateway(None, false);
        let err = WatermarkTracker::new(&gateway)
            .last_synced_date(&daily())
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::SinkUnavailable);
    }
}
