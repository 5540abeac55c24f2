//! Shared data models.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// One recorded day of work.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TimeEntry {
    /// Store record id, absent for entries not yet persisted
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub date: NaiveDate,
    pub hours: f64,
    pub description: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

impl TimeEntry {
    pub fn new(date: NaiveDate, hours: f64, description: impl Into<String>) -> Self {
        Self {
            id: None,
            date,
            hours,
            description: description.into(),
            notes: None,
        }
    }
}

/// Fields for a time entry about to be created.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewTimeEntry {
    pub date: NaiveDate,
    pub hours: f64,
    pub description: String,
    pub notes: Option<String>,
}

/// Partial update of a time entry; `None` leaves the field unchanged.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TimeEntryUpdate {
    pub date: Option<NaiveDate>,
    pub hours: Option<f64>,
    pub description: Option<String>,
    pub notes: Option<String>,
}

impl TimeEntryUpdate {
    pub fn is_empty(&self) -> bool {
        self.date.is_none()
            && self.hours.is_none()
            && self.description.is_none()
            && self.notes.is_none()
    }
}

/// A calendar record shown in the weekly widget.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CalendarEvent {
    pub id: String,
    pub title: String,
    pub date: NaiveDate,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

/// Fields for a calendar record about to be created.
#[derive(Debug, Clone, PartialEq)]
pub struct NewCalendarEvent {
    pub title: String,
    pub date: NaiveDate,
    pub notes: Option<String>,
}
