use crate::settings::error::SettingsError;
use connectors::error::ApiError;
use engine_core::error::SyncError;
use thiserror::Error;

/// Errors that prevent a run from producing a report.
#[derive(Debug, Error)]
pub enum RunError {
    #[error("Settings error: {0}")]
    Settings(#[from] SettingsError),

    #[error("Failed to create the reporting API client: {0}")]
    ApiInit(#[source] ApiError),

    #[error("Failed to build HTTP client: {0}")]
    Http(#[from] reqwest::Error),

    #[error(transparent)]
    Sync(#[from] SyncError),
}
