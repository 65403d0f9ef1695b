use crate::settings::{error::SettingsError, validated::ValidatedSettings};
use connectors::{
    search::client::DEFAULT_SEARCH_CONSOLE_URL, sheets::adapter::DEFAULT_SHEETS_URL,
};
use engine_core::planner::{DEFAULT_FRESHNESS_LAG_DAYS, DEFAULT_INITIAL_BACKFILL_DAYS};
use model::core::dimension::Dimension;
use serde::Deserialize;
use std::{collections::HashMap, fmt, path::Path};

pub mod error;
pub mod validated;
pub mod validator;
pub mod vars;

pub const DEFAULT_ROW_LIMIT: usize = 25_000;
pub const DEFAULT_CALL_TIMEOUT_SECS: u64 = 120;
pub const DEFAULT_ANCHOR: &str = "daily_totals";
pub const DEFAULT_TOKEN_VAR: &str = "GSC_ACCESS_TOKEN";

/// Configuration file contents, before validation.
#[derive(Deserialize, Debug, Clone)]
#[serde(deny_unknown_fields)]
pub struct SyncSettings {
    /// Search Console property, e.g. `https://example.com/` or `sc-domain:example.com`.
    pub site_url: String,

    #[serde(default = "default_freshness_lag_days")]
    pub freshness_lag_days: u32,

    #[serde(default = "default_initial_backfill_days")]
    pub initial_backfill_days: u32,

    #[serde(default = "default_row_limit")]
    pub row_limit: usize,

    #[serde(default = "default_call_timeout_secs")]
    pub call_timeout_secs: u64,

    /// Non-anchor targets processed at once after the anchor has finished.
    #[serde(default = "default_max_concurrency")]
    pub max_concurrency: usize,

    /// IANA zone used to evaluate "today". The host's local zone when unset.
    #[serde(default)]
    pub timezone: Option<String>,

    #[serde(default = "default_anchor")]
    pub anchor: String,

    #[serde(default)]
    pub api: ApiSettings,

    #[serde(default)]
    pub credentials: CredentialSettings,

    pub sink: SinkSettings,

    #[serde(default = "default_targets")]
    pub targets: Vec<TargetSettings>,
}

#[derive(Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct ApiSettings {
    #[serde(default = "default_api_url")]
    pub base_url: String,
}

impl Default for ApiSettings {
    fn default() -> Self {
        ApiSettings {
            base_url: default_api_url(),
        }
    }
}

/// Where the bearer token comes from: `{"env": "VAR"}` or `{"token": "..."}`.
#[derive(Deserialize, Clone, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum CredentialSettings {
    Env(String),
    Token(String),
}

impl fmt::Debug for CredentialSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CredentialSettings::Env(var) => f.debug_tuple("Env").field(var).finish(),
            CredentialSettings::Token(_) => f.write_str("Token(<redacted>)"),
        }
    }
}

impl Default for CredentialSettings {
    fn default() -> Self {
        CredentialSettings::Env(DEFAULT_TOKEN_VAR.to_string())
    }
}

#[derive(Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum SinkSettings {
    Csv {
        dir: String,
    },
    Sqlite {
        path: String,
    },
    Postgres {
        url: String,
    },
    Sheets {
        spreadsheet_id: String,
        #[serde(default = "default_sheets_url")]
        base_url: String,
    },
}

impl SinkSettings {
    pub fn kind(&self) -> &'static str {
        match self {
            SinkSettings::Csv { .. } => "csv",
            SinkSettings::Sqlite { .. } => "sqlite",
            SinkSettings::Postgres { .. } => "postgres",
            SinkSettings::Sheets { .. } => "sheets",
        }
    }
}

#[derive(Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct TargetSettings {
    pub name: String,
    pub dimensions: Vec<Dimension>,
    #[serde(default)]
    pub header: Option<Vec<String>>,
}

impl TargetSettings {
    fn new(name: &str, dimensions: &[Dimension]) -> Self {
        TargetSettings {
            name: name.to_string(),
            dimensions: dimensions.to_vec(),
            header: None,
        }
    }
}

impl SyncSettings {
    /// Reads `path`, substitutes `${VAR}` placeholders from `vars` and parses
    /// the result.
    pub async fn load(
        path: impl AsRef<Path>,
        vars: &HashMap<String, String>,
    ) -> Result<Self, SettingsError> {
        let path = path.as_ref();
        let content =
            tokio::fs::read_to_string(path)
                .await
                .map_err(|source| SettingsError::Read {
                    path: path.to_path_buf(),
                    source,
                })?;
        Self::from_json(&content, vars)
    }

    pub fn from_json(content: &str, vars: &HashMap<String, String>) -> Result<Self, SettingsError> {
        let mut doc: serde_json::Value = serde_json::from_str(content)?;
        vars::substitute(&mut doc, vars)?;
        Ok(serde_json::from_value(doc)?)
    }

    pub fn validate(self) -> Result<ValidatedSettings, SettingsError> {
        validator::SettingsValidator::new(&self).validate()
    }
}

fn default_freshness_lag_days() -> u32 {
    DEFAULT_FRESHNESS_LAG_DAYS
}

fn default_initial_backfill_days() -> u32 {
    DEFAULT_INITIAL_BACKFILL_DAYS
}

fn default_row_limit() -> usize {
    DEFAULT_ROW_LIMIT
}

fn default_call_timeout_secs() -> u64 {
    DEFAULT_CALL_TIMEOUT_SECS
}

fn default_max_concurrency() -> usize {
    1
}

fn default_anchor() -> String {
    DEFAULT_ANCHOR.to_string()
}

fn default_api_url() -> String {
    DEFAULT_SEARCH_CONSOLE_URL.to_string()
}

fn default_sheets_url() -> String {
    DEFAULT_SHEETS_URL.to_string()
}

/// Full detail, daily totals, per-device and per-query breakdowns.
pub fn default_targets() -> Vec<TargetSettings> {
    use Dimension::*;
    vec![
        TargetSettings::new("raw_data", &[Date, Query, Page]),
        TargetSettings::new(DEFAULT_ANCHOR, &[Date]),
        TargetSettings::new("device_breakdown", &[Date, Device]),
        TargetSettings::new("query_breakdown", &[Date, Query]),
    ]
}
