use crate::{
    auth::CredentialProvider,
    error::{AuthError, SinkError, excerpt},
    sheets::models::{
        BatchUpdateRequest, SheetProperties, Spreadsheet, UpdateRequest, ValueRange, cell_text,
    },
    sink::{Row, TableHandle, TabularSink, max_date},
};
use async_trait::async_trait;
use chrono::NaiveDate;
use model::core::value::Value;
use reqwest::{Client, RequestBuilder, Response, Url};
use std::sync::Arc;
use tracing::{debug, info};

pub const DEFAULT_SHEETS_URL: &str = "https://sheets.googleapis.com/v4/";

/// Tabs of one Google spreadsheet, accessed over the Sheets REST API.
pub struct SheetsSink {
    http: Client,
    base_url: Url,
    spreadsheet_id: String,
    credentials: Arc<dyn CredentialProvider>,
}

impl SheetsSink {
    pub fn new(
        http: Client,
        base_url: &str,
        spreadsheet_id: impl Into<String>,
        credentials: Arc<dyn CredentialProvider>,
    ) -> Result<Self, SinkError> {
        let base_url = Url::parse(base_url)
            .map_err(|e| SinkError::Unavailable(format!("invalid Sheets URL '{base_url}': {e}")))?;
        Ok(SheetsSink {
            http,
            base_url,
            spreadsheet_id: spreadsheet_id.into(),
            credentials,
        })
    }

    /// `spreadsheets/{id}{id_suffix}` followed by `segments`, each
    /// percent-encoded.
    fn url(&self, id_suffix: &str, segments: &[&str]) -> Result<Url, SinkError> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| SinkError::Unavailable("Sheets URL cannot be a base".into()))?
            .pop_if_empty()
            .push("spreadsheets")
            .push(&format!("{}{id_suffix}", self.spreadsheet_id))
            .extend(segments);
        Ok(url)
    }

    async fn send(&self, request: RequestBuilder) -> Result<Response, SinkError> {
        let token = self.credentials.access_token().await?;
        let response = request.bearer_auth(token).send().await?;
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        if status.as_u16() == 401 || status.as_u16() == 403 {
            return Err(AuthError::Rejected(status.as_u16()).into());
        }
        let body = response.text().await.unwrap_or_default();
        Err(SinkError::Status {
            status: status.as_u16(),
            body: excerpt(&body),
        })
    }

    async fn tab_titles(&self) -> Result<Vec<String>, SinkError> {
        let mut url = self.url("", &[])?;
        url.query_pairs_mut()
            .append_pair("fields", "sheets.properties.title");
        let spreadsheet: Spreadsheet = self.send(self.http.get(url)).await?.json().await?;
        Ok(spreadsheet
            .sheets
            .into_iter()
            .map(|s| s.properties.title)
            .collect())
    }

    async fn add_tab(&self, title: &str) -> Result<(), SinkError> {
        let body = BatchUpdateRequest {
            requests: vec![UpdateRequest::AddSheet {
                properties: SheetProperties {
                    title: title.to_string(),
                },
            }],
        };
        let url = self.url(":batchUpdate", &[])?;
        self.send(self.http.post(url).json(&body)).await?;
        Ok(())
    }

    async fn read_range(&self, range: &str) -> Result<ValueRange, SinkError> {
        let url = self.url("", &["values", range])?;
        Ok(self.send(self.http.get(url)).await?.json().await?)
    }

    async fn append_values(
        &self,
        tab: &str,
        values: Vec<Vec<serde_json::Value>>,
    ) -> Result<(), SinkError> {
        let range = format!("{}!A1", quote_tab(tab));
        let mut url = self.url("", &["values", &format!("{range}:append")])?;
        url.query_pairs_mut()
            .append_pair("valueInputOption", "RAW")
            .append_pair("insertDataOption", "INSERT_ROWS");
        self.send(self.http.post(url).json(&ValueRange { values }))
            .await?;
        Ok(())
    }
}

#[async_trait]
impl TabularSink for SheetsSink {
    async fn ensure(&self, name: &str, header: &[String]) -> Result<TableHandle, SinkError> {
        let titles = self
            .tab_titles()
            .await
            .map_err(|e| SinkError::Unavailable(format!("cannot open spreadsheet: {e}")))?;

        if !titles.iter().any(|t| t == name) {
            info!(tab = name, "Adding missing sheet tab");
            self.add_tab(name)
                .await
                .map_err(|e| SinkError::Unavailable(format!("cannot add tab '{name}': {e}")))?;
        }

        let first_row = self
            .read_range(&format!("{}!1:1", quote_tab(name)))
            .await?
            .values
            .into_iter()
            .next()
            .unwrap_or_default();

        if !first_row.is_empty() {
            debug!(tab = name, "Header already present");
            return Ok(TableHandle::new(
                name,
                first_row.iter().map(cell_text).collect(),
            ));
        }

        info!(tab = name, "Writing header to empty tab");
        let cells = header
            .iter()
            .map(|h| serde_json::Value::String(h.clone()))
            .collect();
        self.append_values(name, vec![cells]).await?;
        Ok(TableHandle::new(name, header.to_vec()))
    }

    async fn last_date(&self, handle: &TableHandle) -> Result<Option<NaiveDate>, SinkError> {
        let column = column_letter(handle.date_column);
        let range = format!("{}!{column}2:{column}", quote_tab(&handle.name));
        let cells = self.read_range(&range).await?.values;
        Ok(max_date(
            &handle.name,
            cells.iter().filter_map(|row| row.first()).map(cell_text),
        ))
    }

    async fn append_rows(&self, handle: &TableHandle, rows: &[Row]) -> Result<usize, SinkError> {
        if rows.is_empty() {
            return Ok(0);
        }
        let values = rows
            .iter()
            .map(|row| row.iter().map(to_json).collect())
            .collect();
        self.append_values(&handle.name, values).await?;
        Ok(rows.len())
    }

    fn kind(&self) -> &'static str {
        "sheets"
    }
}

fn to_json(value: &Value) -> serde_json::Value {
    match value {
        Value::String(s) => serde_json::Value::String(s.clone()),
        Value::Uint(u) => serde_json::Value::from(*u),
        Value::Float(f) => serde_json::Value::from(*f),
    }
}

/// A1-notation tab reference: `'name'` with embedded quotes doubled.
fn quote_tab(name: &str) -> String {
    format!("'{}'", name.replace('\'', "''"))
}

/// Zero-based column index to its A1 letters (`0 -> A`, `26 -> AA`).
fn column_letter(index: usize) -> String {
    let mut n = index + 1;
    let mut letters = Vec::new();
    while n > 0 {
        let rem = (n - 1) % 26;
        letters.push((b'A' + rem as u8) as char);
        n = (n - 1) / 26;
    }
    letters.iter().rev().collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::StaticTokenProvider;

    fn sink() -> SheetsSink {
        SheetsSink::new(
            Client::new(),
            DEFAULT_SHEETS_URL,
            "sheet-123",
            Arc::new(StaticTokenProvider::new(Some("t".into()), "test")),
        )
        .unwrap()
    }

    #[test]
    fn converts_column_indexes() {
        assert_eq!(column_letter(0), "A");
        assert_eq!(column_letter(25), "Z");
        assert_eq!(column_letter(26), "AA");
        assert_eq!(column_letter(27), "AB");
    }

    #[test]
    fn quotes_tab_names() {
        assert_eq!(quote_tab("raw data"), "'raw data'");
        assert_eq!(quote_tab("bob's"), "'bob''s'");
    }

    #[test]
    fn builds_values_url() {
        let url = sink().url("", &["values", "'daily'!1:1"]).unwrap();
        assert_eq!(
            url.as_str(),
            "https://sheets.googleapis.com/v4/spreadsheets/sheet-123/values/'daily'!1:1"
        );
    }

    #[test]
    fn builds_batch_update_url() {
        let url = sink().url(":batchUpdate", &[]).unwrap();
        assert_eq!(
            url.as_str(),
            "https://sheets.googleapis.com/v4/spreadsheets/sheet-123:batchUpdate"
        );
    }

    #[test]
    fn encodes_numbers_as_json_numbers() {
        assert_eq!(to_json(&Value::Uint(7)), serde_json::json!(7));
        assert_eq!(to_json(&Value::Float(0.5)), serde_json::json!(0.5));
    }
}
