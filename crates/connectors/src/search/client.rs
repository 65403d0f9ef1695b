use crate::{
    auth::CredentialProvider,
    error::{ApiError, AuthError, excerpt},
    search::{ApiRow, QueryRequest, QueryResponse, ReportingApi},
};
use async_trait::async_trait;
use reqwest::{Client, Url};
use std::sync::Arc;
use tracing::debug;

pub const DEFAULT_SEARCH_CONSOLE_URL: &str = "https://www.googleapis.com/webmasters/v3/";

/// Search Console search analytics client.
pub struct SearchConsoleClient {
    http: Client,
    base_url: Url,
    credentials: Arc<dyn CredentialProvider>,
}

impl SearchConsoleClient {
    pub fn new(
        http: Client,
        base_url: &str,
        credentials: Arc<dyn CredentialProvider>,
    ) -> Result<Self, ApiError> {
        let base_url = Url::parse(base_url)
            .map_err(|e| ApiError::InvalidRequest(format!("invalid API URL '{base_url}': {e}")))?;
        Ok(SearchConsoleClient {
            http,
            base_url,
            credentials,
        })
    }

    /// `sites/{site}/searchAnalytics/query`, with the site URL as one
    /// percent-encoded segment.
    fn query_url(&self, site_url: &str) -> Result<Url, ApiError> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| ApiError::InvalidRequest("API URL cannot be a base".into()))?
            .pop_if_empty()
            .extend(["sites", site_url, "searchAnalytics", "query"]);
        Ok(url)
    }
}

#[async_trait]
impl ReportingApi for SearchConsoleClient {
    async fn verify_credentials(&self) -> Result<(), ApiError> {
        self.credentials.access_token().await?;
        Ok(())
    }

    async fn query(&self, request: &QueryRequest) -> Result<Vec<ApiRow>, ApiError> {
        let url = self.query_url(&request.site_url)?;
        let token = self.credentials.access_token().await?;

        debug!(
            site = %request.site_url,
            start = %request.start_date,
            end = %request.end_date,
            dimensions = ?request.dimensions,
            "Querying search analytics"
        );

        let response = self
            .http
            .post(url)
            .bearer_auth(token)
            .json(request)
            .send()
            .await?;

        let status = response.status();
        if status.as_u16() == 401 || status.as_u16() == 403 {
            return Err(AuthError::Rejected(status.as_u16()).into());
        }
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ApiError::Status {
                status: status.as_u16(),
                body: excerpt(&body),
            });
        }

        let body: QueryResponse = response.json().await?;
        Ok(body.rows)
    }
}
