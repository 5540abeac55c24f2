//! Time entries API Lambda - record and list worked hours.
//!
//! Endpoints:
//! - POST /time-entries - Record the hours for one day
//! - GET /time-entries?month=YYYY-MM - List a reporting month's entries
//! - PATCH /time-entries/{id} - Update an entry

use chrono::NaiveDate;
use lambda_http::{run, service_fn, Body, Error, Request, Response};
use serde::{Deserialize, Serialize};
use shared::http::{error_from, error_response, month_param, result_response, route_path};
use shared::{
    get_notion_token, parse_body, resolve_reporting_month, CivilDateTime, Config, NewTimeEntry,
    NotionClient, ReportingMonth, TimeEntry, TimeEntryStore, TimeEntryUpdate,
};
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::EnvFilter;
use uuid::Uuid;
use validator::Validate;

/// Create time entry request
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
struct CreateTimeEntryRequest {
    date: NaiveDate,
    #[validate(range(min = 0.0, max = 24.0, message = "hours must be between 0 and 24"))]
    hours: f64,
    #[validate(length(min = 1, message = "description is required"))]
    description: String,
    notes: Option<String>,
}

impl From<CreateTimeEntryRequest> for NewTimeEntry {
    fn from(request: CreateTimeEntryRequest) -> Self {
        Self {
            date: request.date,
            hours: request.hours,
            description: request.description.trim().to_string(),
            notes: request.notes,
        }
    }
}

/// Update time entry request
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
struct UpdateTimeEntryRequest {
    date: Option<NaiveDate>,
    #[validate(range(min = 0.0, max = 24.0, message = "hours must be between 0 and 24"))]
    hours: Option<f64>,
    #[validate(length(min = 1, message = "description cannot be empty"))]
    description: Option<String>,
    notes: Option<String>,
}

impl From<UpdateTimeEntryRequest> for TimeEntryUpdate {
    fn from(request: UpdateTimeEntryRequest) -> Self {
        Self {
            date: request.date,
            hours: request.hours,
            description: request.description.map(|d| d.trim().to_string()),
            notes: request.notes,
        }
    }
}

/// Month listing response
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct MonthEntriesResponse {
    month: ReportingMonth,
    label: String,
    entries: Vec<TimeEntry>,
    total_hours: f64,
}

/// Application state
struct AppState {
    config: Config,
    entries: TimeEntryStore<NotionClient>,
}

impl AppState {
    async fn new() -> Result<Self, Error> {
        let config = Config::from_env()?;
        let aws_config = aws_config::load_defaults(aws_config::BehaviorVersion::latest()).await;
        let secrets_client = aws_sdk_secretsmanager::Client::new(&aws_config);

        let token = get_notion_token(&secrets_client, &config).await?;
        let client = NotionClient::from_config(&config, token);
        let entries = TimeEntryStore::connect(client, &config.time_entries_database_id).await?;

        Ok(Self { config, entries })
    }
}

/// Page ids arrive dashless or hyphenated; the store returns them hyphenated.
fn canonical_entry_id(raw: &str) -> Option<String> {
    Uuid::parse_str(raw).ok().map(|id| id.hyphenated().to_string())
}

/// Collapse `validator` failures into one message.
fn validation_message(errors: &validator::ValidationErrors) -> String {
    let mut messages: Vec<String> = errors
        .field_errors()
        .into_iter()
        .flat_map(|(field, errs)| {
            errs.iter().map(move |e| match &e.message {
                Some(message) => message.to_string(),
                None => format!("{} is invalid", field),
            })
        })
        .collect();
    messages.sort();
    messages.join("; ")
}

async fn list_month(state: &AppState, month: ReportingMonth) -> shared::Result<MonthEntriesResponse> {
    let entries = state.entries.entries_in_month(month).await?;
    let total_hours = entries.iter().map(|e| e.hours).sum();

    Ok(MonthEntriesResponse {
        month,
        label: month.label(),
        entries,
        total_hours,
    })
}

async fn handler(state: Arc<AppState>, event: Request) -> Result<Response<Body>, Error> {
    let method = event.method().as_str();
    let path = route_path(&event);

    info!("Time entries request: {} {}", method, path);

    match (method, path.as_str()) {
        // Record a day
        ("POST", "/time-entries") => {
            let request: CreateTimeEntryRequest = parse_body!(event.body());
            if let Err(errors) = request.validate() {
                return error_response(400, validation_message(&errors));
            }

            let result = state.entries.create_entry(request.into()).await;
            result_response(201, result)
        }

        // List a reporting month
        ("GET", "/time-entries") => {
            let month = match month_param(&event) {
                Ok(Some(month)) => month,
                Ok(None) => resolve_reporting_month(&CivilDateTime::now(state.config.timezone)),
                Err(e) => return error_from(&e),
            };

            result_response(200, list_month(&state, month).await)
        }

        // Update an entry
        _ if path.starts_with("/time-entries/") && method == "PATCH" => {
            let entry_id = match canonical_entry_id(path.trim_start_matches("/time-entries/")) {
                Some(id) => id,
                None => return error_response(400, "Invalid time entry ID"),
            };

            let request: UpdateTimeEntryRequest = parse_body!(event.body());
            if let Err(errors) = request.validate() {
                return error_response(400, validation_message(&errors));
            }

            let result = state.entries.update_entry(&entry_id, request.into()).await;
            result_response(200, result)
        }

        _ => error_response(404, "Not found"),
    }
}

#[tokio::main]
async fn main() -> Result<(), Error> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .json()
        .init();

    let state = Arc::new(AppState::new().await?);
    let state_clone = state.clone();

    run(service_fn(move |event| {
        let state = state_clone.clone();
        async move { handler(state, event).await }
    }))
    .await
}

#[cfg(test)]
mod tests {
    use super::*;

    fn create_request(json: &str) -> CreateTimeEntryRequest {
        serde_json::from_str(json).unwrap()
    }

    #[test]
    fn test_create_request_validation() {
        let ok = create_request(r#"{"date":"2024-03-04","hours":2.5,"description":"Laundry"}"#);
        assert!(ok.validate().is_ok());

        let too_long = create_request(r#"{"date":"2024-03-04","hours":25,"description":"Laundry"}"#);
        let errors = too_long.validate().unwrap_err();
        assert_eq!(validation_message(&errors), "hours must be between 0 and 24");

        let blank = create_request(r#"{"date":"2024-03-04","hours":1,"description":""}"#);
        assert_eq!(
            validation_message(&blank.validate().unwrap_err()),
            "description is required"
        );
    }

    #[test]
    fn test_create_request_rejects_bad_dates() {
        let parsed: Result<CreateTimeEntryRequest, _> =
            serde_json::from_str(r#"{"date":"2024-02-30","hours":1,"description":"x"}"#);
        assert!(parsed.is_err());
    }

    #[test]
    fn test_canonical_entry_id() {
        assert_eq!(
            canonical_entry_id("2F1B6C9E8D7A4A529C1E0A1B2C3D4E5F").as_deref(),
            Some("2f1b6c9e-8d7a-4a52-9c1e-0a1b2c3d4e5f")
        );
        assert_eq!(
            canonical_entry_id("2f1b6c9e-8d7a-4a52-9c1e-0a1b2c3d4e5f").as_deref(),
            Some("2f1b6c9e-8d7a-4a52-9c1e-0a1b2c3d4e5f")
        );
        assert_eq!(canonical_entry_id("not-an-id"), None);
    }

    #[test]
    fn test_update_request_conversion() {
        let request: UpdateTimeEntryRequest =
            serde_json::from_str(r#"{"hours":3,"description":"  Errands "}"#).unwrap();
        assert!(request.validate().is_ok());

        let update: TimeEntryUpdate = request.into();
        assert_eq!(update.hours, Some(3.0));
        assert_eq!(update.description.as_deref(), Some("Errands"));
        assert_eq!(update.date, None);
    }
}
