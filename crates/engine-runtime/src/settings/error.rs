use model::error::ModelError;
use std::path::PathBuf;
use thiserror::Error;

/// Errors raised while loading or validating the sync configuration.
#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("Failed to read config file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config: {0}")]
    Parse(#[from] serde_json::Error),

    /// A `${VAR}` placeholder names a variable that is not set.
    #[error("Unresolved variable '${{{0}}}' in config")]
    UnresolvedVariable(String),

    #[error("Unterminated variable placeholder in '{0}'")]
    UnterminatedPlaceholder(String),

    #[error("Invalid target: {0}")]
    Target(#[from] ModelError),

    #[error("Settings validation failed: {}", .0.join("; "))]
    ValidationFailed(Vec<String>),
}
