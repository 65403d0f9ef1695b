use connectors::error::{ApiError, SinkError};
use model::error::ModelError;
use serde::Serialize;
use std::fmt;
use thiserror::Error;

/// Error categories surfaced in the run report.
#[derive(Serialize, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    AuthUnavailable,
    SinkUnavailable,
    SinkWriteError,
    FetchError,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ErrorKind::AuthUnavailable => "AuthUnavailable",
            ErrorKind::SinkUnavailable => "SinkUnavailable",
            ErrorKind::SinkWriteError => "SinkWriteError",
            ErrorKind::FetchError => "FetchError",
        };
        f.write_str(name)
    }
}

/// Why a report fetch did not produce rows.
#[derive(Debug, Error)]
pub enum FetchFailure {
    #[error(transparent)]
    Api(#[from] ApiError),

    /// The API answered with rows that do not fit the requested dimensions.
    #[error("Unexpected row shape: {0}")]
    Shape(#[from] ModelError),
}

/// Failures of the sync engine, one variant per category.
#[derive(Debug, Error)]
pub enum SyncError {
    #[error("Credentials unavailable: {0}")]
    AuthUnavailable(#[source] ApiError),

    #[error("Sink unavailable for '{target}': {source}")]
    SinkUnavailable {
        target: String,
        #[source]
        source: SinkError,
    },

    #[error("Writing to '{target}' failed: {source}")]
    SinkWrite {
        target: String,
        #[source]
        source: SinkError,
    },

    #[error("Fetching '{target}' failed: {source}")]
    Fetch {
        target: String,
        #[source]
        source: FetchFailure,
    },
}

impl SyncError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            SyncError::AuthUnavailable(_) => ErrorKind::AuthUnavailable,
            SyncError::SinkUnavailable { .. } => ErrorKind::SinkUnavailable,
            SyncError::SinkWrite { .. } => ErrorKind::SinkWriteError,
            SyncError::Fetch { .. } => ErrorKind::FetchError,
        }
    }
}
