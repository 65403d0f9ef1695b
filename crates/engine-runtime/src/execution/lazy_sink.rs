use crate::{execution::factory, settings::SinkSettings};
use async_trait::async_trait;
use chrono::NaiveDate;
use connectors::{
    auth::CredentialProvider,
    error::SinkError,
    sink::{Row, TableHandle, TabularSink},
};
use reqwest::Client;
use std::sync::Arc;
use tokio::sync::OnceCell;

/// A sink that is opened on the first call and cached afterwards.
///
/// A failed open is not cached; the next call tries again.
pub struct LazySink {
    settings: SinkSettings,
    http: Client,
    credentials: Arc<dyn CredentialProvider>,
    inner: OnceCell<Arc<dyn TabularSink>>,
}

impl LazySink {
    pub fn new(
        settings: SinkSettings,
        http: Client,
        credentials: Arc<dyn CredentialProvider>,
    ) -> Self {
        Self {
            settings,
            http,
            credentials,
            inner: OnceCell::new(),
        }
    }

    async fn get(&self) -> Result<&Arc<dyn TabularSink>, SinkError> {
        self.inner
            .get_or_try_init(|| {
                factory::open_sink(&self.settings, &self.http, Arc::clone(&self.credentials))
            })
            .await
    }
}

#[async_trait]
impl TabularSink for LazySink {
    async fn ensure(&self, name: &str, header: &[String]) -> Result<TableHandle, SinkError> {
        self.get().await?.ensure(name, header).await
    }

    async fn last_date(&self, handle: &TableHandle) -> Result<Option<NaiveDate>, SinkError> {
        self.get().await?.last_date(handle).await
    }

    async fn append_rows(&self, handle: &TableHandle, rows: &[Row]) -> Result<usize, SinkError> {
        self.get().await?.append_rows(handle, rows).await
    }

    fn kind(&self) -> &'static str {
        self.settings.kind()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use connectors::auth::StaticTokenProvider;

    fn lazy(settings: SinkSettings) -> LazySink {
        LazySink::new(
            settings,
            Client::new(),
            Arc::new(StaticTokenProvider::new(Some("t".into()), "test")),
        )
    }

    fn header() -> Vec<String> {
        ["date", "clicks"].into_iter().map(String::from).collect()
    }

    #[tokio::test]
    async fn opens_on_first_use() {
        let dir = tempfile::tempdir().unwrap();
        let db = dir.path().join("gsc.db");
        let sink = lazy(SinkSettings::Sqlite {
            path: db.display().to_string(),
        });
        assert!(!db.exists());

        let handle = sink.ensure("daily_totals", &header()).await.unwrap();
        assert!(db.exists());
        assert_eq!(sink.last_date(&handle).await.unwrap(), None);
    }

    #[tokio::test]
    async fn open_failure_is_reported_on_every_call() {
        let dir = tempfile::tempdir().unwrap();
        let sink = lazy(SinkSettings::Sqlite {
            path: dir.path().display().to_string(),
        });

        for _ in 0..2 {
            assert!(matches!(
                sink.ensure("daily_totals", &header()).await,
                Err(SinkError::Unavailable(_))
            ));
        }
    }
}
