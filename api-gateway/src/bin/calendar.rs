//! Calendar API Lambda - weekly widget backed by the calendar database.
//!
//! Endpoints:
//! - GET /calendar/week?days=1,3,5 - Events on those weekdays of this week, or of
//!   next week once every requested day has passed
//! - POST /calendar - Add an event on a weekday of the current week

use chrono::{Datelike, NaiveDate};
use lambda_http::{run, service_fn, Body, Error, Request, RequestExt, Response};
use serde::{Deserialize, Serialize};
use shared::http::{error_from, error_response, result_response, route_path};
use shared::{
    get_notion_token, parse_body, resolve_weekday, resolve_weekday_group, CalendarEvent,
    CalendarStore, CivilDateTime, Config, NewCalendarEvent, NotionClient,
};
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::EnvFilter;
use validator::Validate;

/// Weekdays shown when the widget does not ask for specific days.
const DEFAULT_DAYS: [u32; 5] = [1, 2, 3, 4, 5];

/// Create event request
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
struct CreateEventRequest {
    /// ISO weekday, 1 = Monday
    #[validate(range(min = 1, max = 7, message = "weekday must be between 1 and 7"))]
    weekday: u32,
    #[validate(length(min = 1, message = "title is required"))]
    title: String,
    notes: Option<String>,
}

/// Events for one resolved date
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct DayEvents {
    date: NaiveDate,
    weekday: u32,
    events: Vec<CalendarEvent>,
}

/// Application state
struct AppState {
    config: Config,
    calendar: CalendarStore<NotionClient>,
}

impl AppState {
    async fn new() -> Result<Self, Error> {
        let config = Config::from_env()?;
        let calendar_database_id = config
            .calendar_database_id
            .clone()
            .ok_or("CALENDAR_DATABASE_ID not set")?;

        let aws_config = aws_config::load_defaults(aws_config::BehaviorVersion::latest()).await;
        let secrets_client = aws_sdk_secretsmanager::Client::new(&aws_config);

        let token = get_notion_token(&secrets_client, &config).await?;
        let client = NotionClient::from_config(&config, token);
        let calendar = CalendarStore::connect(client, &calendar_database_id).await?;

        Ok(Self { config, calendar })
    }
}

/// Parse a `days=1,3,5` list of ISO weekdays.
fn parse_weekdays(raw: &str) -> shared::Result<Vec<u32>> {
    raw.split(',')
        .map(str::trim)
        .filter(|part| !part.is_empty())
        .map(|part| {
            part.parse::<u32>().map_err(|_| {
                shared::Error::InvalidArgument(format!("weekday must be a number, got {:?}", part))
            })
        })
        .collect()
}

/// Group events under each resolved date, keeping empty days.
fn group_by_date(dates: &[NaiveDate], events: Vec<CalendarEvent>) -> Vec<DayEvents> {
    let mut days: Vec<DayEvents> = dates
        .iter()
        .map(|date| DayEvents {
            date: *date,
            weekday: date.weekday().number_from_monday(),
            events: Vec::new(),
        })
        .collect();

    for event in events {
        if let Some(day) = days.iter_mut().find(|day| day.date == event.date) {
            day.events.push(event);
        }
    }
    days
}

async fn week_events(state: &AppState, weekdays: &[u32]) -> shared::Result<Vec<DayEvents>> {
    let now = CivilDateTime::now(state.config.timezone);
    let dates = resolve_weekday_group(&now, weekdays)?;
    let events = state.calendar.events_on(&dates).await?;
    Ok(group_by_date(&dates, events))
}

async fn create_event(state: &AppState, request: CreateEventRequest) -> shared::Result<CalendarEvent> {
    let now = CivilDateTime::now(state.config.timezone);
    let date = resolve_weekday(&now, request.weekday)?;

    state
        .calendar
        .create_event(NewCalendarEvent {
            title: request.title.trim().to_string(),
            date,
            notes: request.notes,
        })
        .await
}

async fn handler(state: Arc<AppState>, event: Request) -> Result<Response<Body>, Error> {
    let method = event.method().as_str();
    let path = route_path(&event);

    info!("Calendar request: {} {}", method, path);

    match (method, path.as_str()) {
        // Weekly widget
        ("GET", "/calendar/week") => {
            let weekdays = match event
                .query_string_parameters_ref()
                .and_then(|params| params.first("days"))
            {
                Some(raw) => match parse_weekdays(raw) {
                    Ok(days) => days,
                    Err(e) => return error_from(&e),
                },
                None => DEFAULT_DAYS.to_vec(),
            };

            result_response(200, week_events(&state, &weekdays).await)
        }

        // Add an event
        ("POST", "/calendar") => {
            let request: CreateEventRequest = parse_body!(event.body());
            if let Err(errors) = request.validate() {
                return error_response(400, errors.to_string());
            }

            result_response(201, create_event(&state, request).await)
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
