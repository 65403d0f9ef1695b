use thiserror::Error;

/// Failures of a credential provider.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AuthError {
    /// No token is configured for the given source.
    #[error("No access token available from {0}")]
    Missing(String),

    /// The remote service rejected the token.
    #[error("Access token rejected (HTTP {0})")]
    Rejected(u16),
}

/// Errors coming from a tabular sink.
#[derive(Debug, Error)]
pub enum SinkError {
    /// The backing store could not be reached or created.
    #[error("Sink unavailable: {0}")]
    Unavailable(String),

    /// Stored data could not be interpreted.
    #[error("Invalid stored data: {0}")]
    InvalidData(String),

    /// Low-level I/O failure.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// CSV encoding or decoding failure.
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// SQLite driver error.
    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    /// PostgreSQL driver error.
    #[error("PostgreSQL error: {0}")]
    Postgres(#[from] tokio_postgres::Error),

    /// HTTP transport failure.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Non-success response from a remote store.
    #[error("Remote store returned HTTP {status}: {body}")]
    Status { status: u16, body: String },

    #[error("Authorization error: {0}")]
    Auth(#[from] AuthError),

    /// The store's mutex was poisoned by a panicking writer.
    #[error("Lock error: {0}")]
    Lock(String),

    #[error("Timed out after {0:?}")]
    Timeout(std::time::Duration),

    /// The blocking worker running the store call panicked or was cancelled.
    #[error("Sink task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
}

/// Errors coming from the reporting API client.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Authorization error: {0}")]
    Auth(#[from] AuthError),

    /// HTTP transport failure.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Non-success response, quota errors included.
    #[error("Reporting API returned HTTP {status}: {body}")]
    Status { status: u16, body: String },

    /// The request could not be built.
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("Timed out after {0:?}")]
    Timeout(std::time::Duration),
}

/// Keeps error bodies short enough for a log line.
pub(crate) fn excerpt(body: &str) -> String {
    const MAX: usize = 512;
    if body.len() <= MAX {
        return body.to_string();
    }
    let mut end = MAX;
    while !body.is_char_boundary(end) {
        end -= 1;
    }
    format!("{}...", &body[..end])
}
