//! Configuration management for Lambda functions.

use chrono_tz::Tz;
use std::env;

use crate::{Error, Result};

const DEFAULT_API_URL: &str = "https://api.notion.com/v1";
const DEFAULT_TIMEZONE: &str = "America/Denver";

/// Application configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct Config {
    /// ARN of the secret holding the store API token
    pub notion_secret_arn: Option<String>,
    /// Store API token given directly (local runs)
    pub notion_token: Option<String>,
    /// Base URL of the store API
    pub notion_api_url: String,
    /// Database holding one time entry per day
    pub time_entries_database_id: String,
    /// Database holding calendar events
    pub calendar_database_id: Option<String>,
    /// Civil timezone every date is interpreted in
    pub timezone: Tz,
    pub billing: BillingProfile,
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self> {
        let notion_secret_arn = env::var("NOTION_SECRET_ARN").ok();
        let notion_token = env::var("NOTION_TOKEN").ok();
        if notion_secret_arn.is_none() && notion_token.is_none() {
            return Err(Error::Config(
                "one of NOTION_SECRET_ARN or NOTION_TOKEN must be set".to_string(),
            ));
        }

        let timezone = env::var("REPORT_TIMEZONE").unwrap_or_else(|_| DEFAULT_TIMEZONE.to_string());

        Ok(Self {
            notion_secret_arn,
            notion_token,
            notion_api_url: env::var("NOTION_API_URL").unwrap_or_else(|_| DEFAULT_API_URL.to_string()),
            time_entries_database_id: env::var("TIME_ENTRIES_DATABASE_ID")
                .map_err(|_| Error::Config("TIME_ENTRIES_DATABASE_ID not set".to_string()))?,
            calendar_database_id: env::var("CALENDAR_DATABASE_ID").ok(),
            timezone: parse_timezone(&timezone)?,
            billing: BillingProfile::from_env()?,
        })
    }
}

/// Parse an IANA timezone name.
pub fn parse_timezone(name: &str) -> Result<Tz> {
    name.parse::<Tz>()
        .map_err(|_| Error::Config(format!("Unknown timezone: {}", name)))
}

/// Fixed business details printed on the invoice and the hours log.
#[derive(Debug, Clone, PartialEq)]
pub struct BillingProfile {
    pub hourly_rate: f64,
    pub client_name: String,
    pub contact_line: String,
    pub payee: String,
    pub invoice_title: String,
}

impl Default for BillingProfile {
    fn default() -> Self {
        Self {
            hourly_rate: 25.0,
            client_name: "Household Client".to_string(),
            contact_line: "Questions? Contact billing@example.com".to_string(),
            payee: "Household Services".to_string(),
            invoice_title: "INVOICE".to_string(),
        }
    }
}

impl BillingProfile {
    /// Defaults, overridden by `HOURLY_RATE`, `CLIENT_NAME`, `CONTACT_LINE` and `PAYEE_NAME`.
    pub fn from_env() -> Result<Self> {
        let defaults = Self::default();

        let hourly_rate = match env::var("HOURLY_RATE") {
            Ok(raw) => raw
                .trim()
                .parse::<f64>()
                .ok()
                .filter(|rate| rate.is_finite() && *rate >= 0.0)
                .ok_or_else(|| Error::Config(format!("Invalid HOURLY_RATE: {}", raw)))?,
            Err(_) => defaults.hourly_rate,
        };

        Ok(Self {
            hourly_rate,
            client_name: env::var("CLIENT_NAME").unwrap_or(defaults.client_name),
            contact_line: env::var("CONTACT_LINE").unwrap_or(defaults.contact_line),
            payee: env::var("PAYEE_NAME").unwrap_or(defaults.payee),
            invoice_title: defaults.invoice_title,
        })
    }
}

/// Page size and spacing used by both PDF layouts, in points.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PageGeometry {
    pub width: f64,
    pub height: f64,
    pub margin: f64,
    pub line_height: f64,
    /// A new page starts once the cursor drops below this y
    pub bottom_threshold: f64,
}

impl Default for PageGeometry {
    fn default() -> Self {
        Self {
            width: 612.0,
            height: 792.0,
            margin: 50.0,
            line_height: 14.0,
            bottom_threshold: 100.0,
        }
    }
}

impl PageGeometry {
    /// Y coordinate of the first line on a fresh page.
    pub fn top(&self) -> f64 {
        self.height - self.margin
    }

    /// Horizontal space between the margins.
    pub fn content_width(&self) -> f64 {
        self.width - 2.0 * self.margin
    }
}
