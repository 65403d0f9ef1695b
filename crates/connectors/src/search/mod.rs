use crate::error::ApiError;
use async_trait::async_trait;
use chrono::NaiveDate;
use model::core::dimension::Dimension;
use serde::{Deserialize, Serialize};

pub mod client;

/// Hard ceiling on `rowLimit` accepted by the search analytics endpoint.
pub const MAX_ROW_LIMIT: usize = 25_000;

/// Body of one search analytics query.
#[derive(Serialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct QueryRequest {
    #[serde(skip)]
    pub site_url: String,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub dimensions: Vec<Dimension>,
    pub row_limit: usize,
}

/// One response row; `keys` is aligned with the requested dimensions.
#[derive(Deserialize, Debug, Clone, PartialEq)]
pub struct ApiRow {
    #[serde(default)]
    pub keys: Vec<String>,
    #[serde(default)]
    pub clicks: f64,
    #[serde(default)]
    pub impressions: f64,
    #[serde(default)]
    pub ctr: f64,
    #[serde(default)]
    pub position: f64,
}

#[derive(Deserialize, Debug, Default)]
pub struct QueryResponse {
    #[serde(default)]
    pub rows: Vec<ApiRow>,
}

/// The reporting API as seen by the sync engine.
#[async_trait]
pub trait ReportingApi: Send + Sync {
    /// Fails with [`ApiError::Auth`] when no usable credentials exist.
    async fn verify_credentials(&self) -> Result<(), ApiError>;

    async fn query(&self, request: &QueryRequest) -> Result<Vec<ApiRow>, ApiError>;
}
