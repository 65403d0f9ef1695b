use crate::{
    error::RunError,
    execution::lazy_sink::LazySink,
    settings::{CredentialSettings, SinkSettings, validated::ValidatedSettings},
};
use connectors::{
    auth::{CredentialProvider, StaticTokenProvider},
    error::{ApiError, SinkError},
    file::workbook::WorkbookSink,
    search::{ReportingApi, client::SearchConsoleClient},
    sheets::adapter::SheetsSink,
    sink::TabularSink,
    sql::{postgres::adapter::PgSink, sqlite::adapter::SqliteSink},
};
use reqwest::Client;
use std::{collections::HashMap, path::PathBuf, sync::Arc};
use tracing::info;

/// Resolves the configured token source. An unset variable is not an error
/// here; it surfaces as `AuthUnavailable` when credentials are verified.
pub fn create_credentials(
    settings: &CredentialSettings,
    env: &HashMap<String, String>,
) -> Arc<dyn CredentialProvider> {
    match settings {
        CredentialSettings::Env(var) => Arc::new(StaticTokenProvider::new(
            env.get(var).cloned(),
            format!("environment variable {var}"),
        )),
        CredentialSettings::Token(token) => {
            Arc::new(StaticTokenProvider::new(Some(token.clone()), "config token"))
        }
    }
}

pub fn create_http_client(settings: &ValidatedSettings) -> Result<Client, RunError> {
    Ok(Client::builder()
        .timeout(settings.call_timeout)
        .user_agent(concat!("gsc-sync/", env!("CARGO_PKG_VERSION")))
        .build()?)
}

pub fn create_api(
    settings: &ValidatedSettings,
    http: &Client,
    credentials: Arc<dyn CredentialProvider>,
) -> Result<Arc<dyn ReportingApi>, RunError> {
    let client = SearchConsoleClient::new(http.clone(), &settings.api_base_url, credentials)
        .map_err(RunError::ApiInit)?;
    Ok(Arc::new(client))
}

/// Wraps the configured sink so that it is opened on first use.
///
/// Opening failures then surface as `SinkUnavailable` on the anchor target
/// and never precede the credential check.
pub fn create_sink(
    settings: &ValidatedSettings,
    http: &Client,
    credentials: Arc<dyn CredentialProvider>,
) -> Arc<dyn TabularSink> {
    Arc::new(LazySink::new(settings.sink.clone(), http.clone(), credentials))
}

/// Opens or connects to the sink described by `settings`.
pub async fn open_sink(
    settings: &SinkSettings,
    http: &Client,
    credentials: Arc<dyn CredentialProvider>,
) -> Result<Arc<dyn TabularSink>, SinkError> {
    let sink: Arc<dyn TabularSink> = match settings {
        SinkSettings::Csv { dir } => Arc::new(WorkbookSink::new(dir)),
        SinkSettings::Sqlite { path } => {
            let path = PathBuf::from(path);
            Arc::new(tokio::task::spawn_blocking(move || SqliteSink::open(&path)).await??)
        }
        SinkSettings::Postgres { url } => Arc::new(PgSink::connect(url).await?),
        SinkSettings::Sheets {
            spreadsheet_id,
            base_url,
        } => Arc::new(SheetsSink::new(
            http.clone(),
            base_url,
            spreadsheet_id.clone(),
            credentials,
        )?),
    };

    info!(sink = settings.kind(), "Sink ready");
    Ok(sink)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::settings::SyncSettings;
    use connectors::error::AuthError;

    #[tokio::test]
    async fn env_credentials_read_the_loaded_variables() {
        let env = HashMap::from([("TOKEN_VAR".to_string(), "secret".to_string())]);
        let creds = create_credentials(&CredentialSettings::Env("TOKEN_VAR".into()), &env);
        assert_eq!(creds.access_token().await.unwrap(), "secret");
    }

    #[tokio::test]
    async fn missing_env_credentials_fail_on_use() {
        let creds = create_credentials(&CredentialSettings::Env("ABSENT".into()), &HashMap::new());
        assert!(matches!(
            creds.access_token().await,
            Err(AuthError::Missing(source)) if source.contains("ABSENT")
        ));
    }

    fn settings(sink: serde_json::Value) -> ValidatedSettings {
        let doc = serde_json::json!({"site_url": "sc-domain:example.com", "sink": sink});
        SyncSettings::from_json(&doc.to_string(), &HashMap::new())
            .unwrap()
            .validate()
            .unwrap()
    }

    #[tokio::test]
    async fn opens_file_backed_sinks() {
        let dir = tempfile::tempdir().unwrap();
        let creds = create_credentials(&CredentialSettings::Token("t".into()), &HashMap::new());

        let csv = settings(serde_json::json!({"type": "csv", "dir": dir.path().join("book")}));
        let http = create_http_client(&csv).unwrap();
        let sink = open_sink(&csv.sink, &http, creds.clone()).await.unwrap();
        assert_eq!(sink.kind(), "csv");

        let sqlite = settings(serde_json::json!({"type": "sqlite", "path": dir.path().join("gsc.db")}));
        let sink = open_sink(&sqlite.sink, &http, creds).await.unwrap();
        assert_eq!(sink.kind(), "sqlite");
    }

    #[tokio::test]
    async fn unopenable_sqlite_path_is_unavailable() {
        let dir = tempfile::tempdir().unwrap();
        let s = settings(serde_json::json!({"type": "sqlite", "path": dir.path()}));
        let http = create_http_client(&s).unwrap();
        let creds = create_credentials(&s.credentials, &HashMap::new());

        assert!(matches!(
            open_sink(&s.sink, &http, creds).await,
            Err(SinkError::Unavailable(msg)) if msg.contains("cannot open")
        ));
    }

    #[tokio::test]
    async fn create_sink_does_not_touch_the_store() {
        let dir = tempfile::tempdir().unwrap();
        let db = dir.path().join("gsc.db");
        let s = settings(serde_json::json!({"type": "sqlite", "path": db}));
        let http = create_http_client(&s).unwrap();
        let creds = create_credentials(&s.credentials, &HashMap::new());

        let sink = create_sink(&s, &http, creds);
        assert_eq!(sink.kind(), "sqlite");
        assert!(!db.exists());
    }

    #[test]
    fn invalid_api_url_is_an_init_error() {
        let mut s = settings(serde_json::json!({"type": "csv", "dir": "out"}));
        s.api_base_url = "not a url".into();
        let http = create_http_client(&s).unwrap();
        let creds = create_credentials(&s.credentials, &HashMap::new());
        assert!(matches!(
            create_api(&s, &http, creds),
            Err(RunError::ApiInit(ApiError::InvalidRequest(_)))
        ));
    }
}
