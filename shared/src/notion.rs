//! Notion API client implementing [`RecordStore`].

use async_trait::async_trait;
use reqwest::StatusCode;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::info;

use crate::store::{QueryTarget, RawRecord, RecordStore};
use crate::{Config, Error, Result};

const NOTION_VERSION: &str = "2025-09-03";
const PAGE_SIZE: u32 = 100;

/// Database metadata; only its data sources matter here.
#[derive(Debug, Deserialize)]
struct DatabaseResponse {
    #[serde(default)]
    data_sources: Vec<DataSourceRef>,
}

#[derive(Debug, Deserialize)]
struct DataSourceRef {
    id: String,
}

#[derive(Debug, Deserialize)]
struct QueryResponse {
    #[serde(default)]
    results: Vec<RawRecord>,
    #[serde(default)]
    has_more: bool,
    next_cursor: Option<String>,
}

/// Client for the hosted Notion API.
#[derive(Debug, Clone)]
pub struct NotionClient {
    http_client: reqwest::Client,
    base_url: String,
    token: String,
}

impl NotionClient {
    pub fn new(http_client: reqwest::Client, base_url: impl Into<String>, token: impl Into<String>) -> Self {
        Self {
            http_client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            token: token.into(),
        }
    }

    /// Client for the configured API base URL.
    pub fn from_config(config: &Config, token: impl Into<String>) -> Self {
        Self::new(reqwest::Client::new(), config.notion_api_url.clone(), token)
    }

    fn request(&self, method: reqwest::Method, path: &str) -> reqwest::RequestBuilder {
        self.http_client
            .request(method, format!("{}{}", self.base_url, path))
            .bearer_auth(&self.token)
            .header("Notion-Version", NOTION_VERSION)
    }

    /// Send a request and decode a JSON body, mapping API failures to store errors.
    async fn send<T: DeserializeOwned>(
        &self,
        builder: reqwest::RequestBuilder,
        what: &str,
    ) -> Result<T> {
        let response = builder
            .send()
            .await
            .map_err(|e| Error::Store(format!("{} request failed: {}", what, e)))?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            return Err(match status {
                StatusCode::NOT_FOUND => Error::NotFound(format!("{}: {}", what, error_text)),
                StatusCode::BAD_REQUEST => Error::Validation(format!("{}: {}", what, error_text)),
                _ => Error::Store(format!("{} failed with {}: {}", what, status, error_text)),
            });
        }

        response
            .json()
            .await
            .map_err(|e| Error::Store(format!("Failed to parse {} response: {}", what, e)))
    }
}

#[async_trait]
impl RecordStore for NotionClient {
    async fn resolve_query_target(&self, database_id: &str) -> Result<QueryTarget> {
        let database: DatabaseResponse = self
            .send(
                self.request(reqwest::Method::GET, &format!("/databases/{}", database_id)),
                "Retrieve database",
            )
            .await?;

        let data_source = database
            .data_sources
            .into_iter()
            .next()
            .ok_or_else(|| Error::NotFound(format!("database {} has no data source", database_id)))?;

        Ok(QueryTarget {
            data_source_id: data_source.id,
        })
    }

    async fn create_record(&self, target: &QueryTarget, properties: Value) -> Result<RawRecord> {
        let body = json!({
            "parent": { "type": "data_source_id", "data_source_id": target.data_source_id },
            "properties": properties
        });

        self.send(
            self.request(reqwest::Method::POST, "/pages").json(&body),
            "Create page",
        )
        .await
    }

    async fn query_records(
        &self,
        target: &QueryTarget,
        filter: Option<Value>,
        sorts: Vec<Value>,
    ) -> Result<Vec<RawRecord>> {
        let path = format!("/data_sources/{}/query", target.data_source_id);
        let mut records = Vec::new();
        let mut cursor: Option<String> = None;

        loop {
            let mut body = json!({ "page_size": PAGE_SIZE });
            if let Some(filter) = &filter {
                body["filter"] = filter.clone();
            }
            if !sorts.is_empty() {
                body["sorts"] = Value::Array(sorts.clone());
            }
            if let Some(cursor) = &cursor {
                body["start_cursor"] = Value::String(cursor.clone());
            }

            let page: QueryResponse = self
                .send(
                    self.request(reqwest::Method::POST, &path).json(&body),
                    "Query data source",
                )
                .await?;
            records.extend(page.results);

            cursor = page.next_cursor.filter(|_| page.has_more);
            if cursor.is_none() {
                break;
            }
        }

        info!("Fetched {} records from {}", records.len(), target.data_source_id);
        Ok(records)
    }

    async fn update_record(&self, id: &str, properties: Value) -> Result<RawRecord> {
        self.send(
            self.request(reqwest::Method::PATCH, &format!("/pages/{}", id))
                .json(&json!({ "properties": properties })),
            "Update page",
        )
        .await
    }
}

/// Builders and readers for Notion property values and date filters.
pub mod properties {
    use chrono::NaiveDate;
    use serde_json::{json, Value};

    fn iso(date: NaiveDate) -> String {
        date.format("%Y-%m-%d").to_string()
    }

    pub fn title(text: &str) -> Value {
        json!({ "title": [{ "type": "text", "text": { "content": text } }] })
    }

    pub fn rich_text(text: &str) -> Value {
        json!({ "rich_text": [{ "type": "text", "text": { "content": text } }] })
    }

    pub fn number(value: f64) -> Value {
        json!({ "number": value })
    }

    pub fn date(value: NaiveDate) -> Value {
        json!({ "date": { "start": iso(value) } })
    }

    /// Date of a date property; datetimes keep only their calendar day.
    pub fn read_date(props: &Value, name: &str) -> Option<NaiveDate> {
        let start = props.get(name)?.get("date")?.get("start")?.as_str()?;
        let day = start.get(..10)?;
        NaiveDate::parse_from_str(day, "%Y-%m-%d").ok()
    }

    pub fn read_number(props: &Value, name: &str) -> Option<f64> {
        props.get(name)?.get("number")?.as_f64()
    }

    /// Concatenated plain text of a title or rich-text property.
    pub fn read_text(props: &Value, name: &str) -> Option<String> {
        let property = props.get(name)?;
        let fragments = property
            .get("title")
            .or_else(|| property.get("rich_text"))?
            .as_array()?;

        Some(
            fragments
                .iter()
                .filter_map(|fragment| {
                    fragment
                        .get("plain_text")
                        .or_else(|| fragment.get("text").and_then(|t| t.get("content")))
                        .and_then(Value::as_str)
                })
                .collect(),
        )
    }

    pub fn date_equals_filter(property: &str, date: NaiveDate) -> Value {
        json!({ "property": property, "date": { "equals": iso(date) } })
    }

    /// Inclusive range `start..=end`.
    pub fn date_range_filter(property: &str, start: NaiveDate, end: NaiveDate) -> Value {
        json!({
            "and": [
                { "property": property, "date": { "on_or_after": iso(start) } },
                { "property": property, "date": { "on_or_before": iso(end) } }
            ]
        })
    }

    pub fn date_in_filter(property: &str, dates: &[NaiveDate]) -> Value {
        let any: Vec<Value> = dates
            .iter()
            .map(|date| date_equals_filter(property, *date))
            .collect();
        json!({ "or": any })
    }

    pub fn ascending(property: &str) -> Value {
        json!({ "property": property, "direction": "ascending" })
    }
}
