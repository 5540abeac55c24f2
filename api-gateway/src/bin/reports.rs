//! Reports API Lambda - billing documents for a reporting month.
//!
//! Endpoints:
//! - GET /reports/summary?month=YYYY-MM - Week-by-week billing summary (JSON)
//! - GET /reports/csv?month=YYYY-MM - Hours export as CSV
//! - GET /reports/invoice?month=YYYY-MM - Invoice PDF
//! - GET /reports/hours-log?month=YYYY-MM - Hours log PDF
//!
//! Without `month` the current reporting month is used.

use chrono::NaiveDate;
use lambda_http::{run, service_fn, Body, Error, Request, Response};
use shared::http::{
    error_from, error_response, file_response, month_param, result_response, route_path,
    text_file_response,
};
use shared::report::{
    build_billing_summary, build_hours_log_instructions, build_invoice_instructions,
    BillingSummary, StandardFonts,
};
use shared::{
    bucket_entries_by_week, bucketed_entry_count, csv_filename, export_csv, get_notion_token,
    render_pdf, resolve_invoice_date, resolve_payment_due_date, resolve_reporting_month,
    CivilDateTime, Config, NotionClient, PageGeometry, ReportingMonth, TimeEntryStore,
};
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::EnvFilter;

/// A rendered download.
struct Document {
    content_type: &'static str,
    filename: String,
    bytes: Vec<u8>,
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

    fn now(&self) -> CivilDateTime {
        CivilDateTime::now(self.config.timezone)
    }
}

/// Requested month, or the reporting month at `now`.
fn month_or_current(requested: Option<ReportingMonth>, now: &CivilDateTime) -> ReportingMonth {
    requested.unwrap_or_else(|| resolve_reporting_month(now))
}

/// Invoices are dated on the last day of the month they bill.
fn invoice_date_for(requested: Option<ReportingMonth>, now: &CivilDateTime) -> NaiveDate {
    match requested {
        Some(month) => month.last_day(),
        None => resolve_invoice_date(now),
    }
}

async fn billing_summary(state: &AppState, month: ReportingMonth) -> shared::Result<BillingSummary> {
    let entries = state.entries.entries_in_month(month).await?;
    let buckets = bucket_entries_by_week(&entries, month);
    info!(
        "Billing {} entries across {} weeks for {}",
        bucketed_entry_count(&buckets),
        buckets.len(),
        month
    );
    build_billing_summary(&buckets, month, state.config.billing.hourly_rate)
}

async fn csv_document(state: &AppState, month: ReportingMonth) -> shared::Result<Document> {
    let entries = state.entries.entries_in_month(month).await?;
    let csv = export_csv(&entries, month)?;

    Ok(Document {
        content_type: "text/csv; charset=utf-8",
        filename: csv_filename(month),
        bytes: csv.into_bytes(),
    })
}

async fn invoice_document(
    state: &AppState,
    month: ReportingMonth,
    invoice_date: NaiveDate,
) -> shared::Result<Document> {
    let summary = billing_summary(state, month).await?;
    let geometry = PageGeometry::default();
    let instructions = build_invoice_instructions(
        &summary,
        invoice_date,
        resolve_payment_due_date(invoice_date),
        &state.config.billing,
        &geometry,
        &StandardFonts,
    );

    Ok(Document {
        content_type: "application/pdf",
        filename: format!("invoice-{}.pdf", month),
        bytes: render_pdf(&format!("Invoice {}", month.label()), &instructions, &geometry)?,
    })
}

async fn hours_log_document(state: &AppState, month: ReportingMonth) -> shared::Result<Document> {
    let entries = state.entries.entries_in_month(month).await?;
    let buckets = bucket_entries_by_week(&entries, month);
    let geometry = PageGeometry::default();
    let instructions = build_hours_log_instructions(
        &buckets,
        month,
        &state.config.billing,
        &geometry,
        &StandardFonts,
    )?;

    Ok(Document {
        content_type: "application/pdf",
        filename: format!("hours-log-{}.pdf", month),
        bytes: render_pdf(&format!("Hours Log {}", month.label()), &instructions, &geometry)?,
    })
}

fn document_response(result: shared::Result<Document>) -> Result<Response<Body>, Error> {
    match result {
        Ok(doc) if doc.content_type.starts_with("text/") => {
            let text = String::from_utf8(doc.bytes)?;
            text_file_response(doc.content_type, &doc.filename, text)
        }
        Ok(doc) => file_response(doc.content_type, &doc.filename, doc.bytes),
        Err(e) => error_from(&e),
    }
}

async fn handler(state: Arc<AppState>, event: Request) -> Result<Response<Body>, Error> {
    let method = event.method().as_str();
    let path = route_path(&event);

    info!("Reports request: {} {}", method, path);

    if method != "GET" {
        return error_response(404, "Not found");
    }

    let requested = match month_param(&event) {
        Ok(month) => month,
        Err(e) => return error_from(&e),
    };
    let now = state.now();
    let month = month_or_current(requested, &now);

    match path.as_str() {
        "/reports/summary" => result_response(200, billing_summary(&state, month).await),
        "/reports/csv" => document_response(csv_document(&state, month).await),
        "/reports/invoice" => {
            let invoice_date = invoice_date_for(requested, &now);
            document_response(invoice_document(&state, month, invoice_date).await)
        }
        "/reports/hours-log" => document_response(hours_log_document(&state, month).await),
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
    use chrono::{NaiveDateTime, NaiveTime};

    fn at(y: i32, m: u32, d: u32) -> CivilDateTime {
        let local = NaiveDateTime::new(
            NaiveDate::from_ymd_opt(y, m, d).unwrap(),
            NaiveTime::from_hms_opt(9, 0, 0).unwrap(),
        );
        let zone = shared::config::parse_timezone("America/Denver").unwrap();
        CivilDateTime::from_local(local, zone)
    }

    #[test]
    fn test_month_defaults_to_reporting_month() {
        let march = ReportingMonth::new(2024, 3).unwrap();
        assert_eq!(month_or_current(Some(march), &at(2024, 6, 20)), march);
        assert_eq!(month_or_current(None, &at(2024, 4, 10)), march);
        assert_eq!(
            month_or_current(None, &at(2024, 4, 16)),
            ReportingMonth::new(2024, 4).unwrap()
        );
    }

    #[test]
    fn test_invoice_date() {
        let feb = ReportingMonth::new(2024, 2).unwrap();
        assert_eq!(
            invoice_date_for(Some(feb), &at(2024, 6, 20)),
            NaiveDate::from_ymd_opt(2024, 2, 29).unwrap()
        );
        assert_eq!(
            invoice_date_for(None, &at(2024, 3, 5)),
            NaiveDate::from_ymd_opt(2024, 2, 29).unwrap()
        );
    }

    #[test]
    fn test_no_data_is_not_found() {
        let response = document_response(Err(shared::Error::NoData("March 2024".into()))).unwrap();
        assert_eq!(response.status(), 404);
    }

    #[test]
    fn test_csv_document_is_text() {
        let response = document_response(Ok(Document {
            content_type: "text/csv; charset=utf-8",
            filename: "hours-2024-03.csv".to_string(),
            bytes: b"Date,Week\n".to_vec(),
        }))
        .unwrap();
        assert!(matches!(response.body(), Body::Text(_)));
        assert_eq!(
            response.headers()["content-disposition"],
            "attachment; filename=\"hours-2024-03.csv\""
        );
    }
}
