//! Shared library for the timesheet Lambda functions.
//!
//! Holds the billing-period and week logic, the report layouts and their
//! renderers, and the clients used to reach the hosted record store.

pub mod config;
pub mod error;
pub mod export;
pub mod http;
pub mod models;
pub mod notion;
pub mod pdf;
pub mod period;
pub mod report;
pub mod secrets;
pub mod store;
pub mod weeks;

pub use config::{BillingProfile, Config, PageGeometry};
pub use error::{Error, Result};
pub use export::{csv_filename, export_csv};
pub use models::{CalendarEvent, NewCalendarEvent, NewTimeEntry, TimeEntry, TimeEntryUpdate};
pub use notion::NotionClient;
pub use pdf::render_pdf;
pub use period::{
    resolve_invoice_date, resolve_payment_due_date, resolve_reporting_month, resolve_weekday,
    resolve_weekday_group, CivilDateTime, ReportingMonth,
};
pub use secrets::{get_notion_token, get_secret};
pub use store::{CalendarStore, QueryTarget, RawRecord, RecordStore, TimeEntryStore};
pub use weeks::{
    bucket_entries_by_week, bucketed_entry_count, week_number_of_month, WeekBuckets,
};
