//! Repositories for time entries and calendar events over a [`RecordStore`].

use async_trait::async_trait;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::{info, warn};
use uuid::Uuid;

use crate::models::{CalendarEvent, NewCalendarEvent, NewTimeEntry, TimeEntry, TimeEntryUpdate};
use crate::notion::properties;
use crate::period::ReportingMonth;
use crate::{Error, Result};

/// A record as returned by the remote store: an id and its typed properties.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawRecord {
    pub id: String,
    #[serde(default)]
    pub properties: Value,
}

/// Where queries and creates for one database are sent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueryTarget {
    pub data_source_id: String,
}

/// The narrow contract the handlers need from the hosted database.
#[async_trait]
pub trait RecordStore: Send + Sync {
    /// Resolve the query target behind a database handle.
    async fn resolve_query_target(&self, database_id: &str) -> Result<QueryTarget>;

    async fn create_record(&self, target: &QueryTarget, properties: Value) -> Result<RawRecord>;

    /// All records matching `filter`, following pagination to the end.
    async fn query_records(
        &self,
        target: &QueryTarget,
        filter: Option<Value>,
        sorts: Vec<Value>,
    ) -> Result<Vec<RawRecord>>;

    async fn update_record(&self, id: &str, properties: Value) -> Result<RawRecord>;
}

/// Time entry property names.
pub mod entry_fields {
    pub const DESCRIPTION: &str = "Description";
    pub const DATE: &str = "Date";
    pub const HOURS: &str = "Hours";
    pub const NOTES: &str = "Notes";
}

/// Calendar event property names.
pub mod event_fields {
    pub const NAME: &str = "Name";
    pub const DATE: &str = "Date";
    pub const NOTES: &str = "Notes";
}

/// Whether two record ids name the same page; UUIDs match in any textual form.
fn same_record_id(a: &str, b: &str) -> bool {
    match (Uuid::parse_str(a), Uuid::parse_str(b)) {
        (Ok(a), Ok(b)) => a == b,
        _ => a == b,
    }
}

/// Map a store record to a time entry.
///
/// Missing hours become 0 and a missing description becomes empty; a record
/// without a readable date cannot be placed on the calendar and yields `None`.
pub fn time_entry_from_record(record: &RawRecord) -> Option<TimeEntry> {
    let props = &record.properties;
    let date = properties::read_date(props, entry_fields::DATE)?;

    Some(TimeEntry {
        id: Some(record.id.clone()),
        date,
        hours: properties::read_number(props, entry_fields::HOURS)
            .filter(|hours| hours.is_finite() && *hours >= 0.0)
            .unwrap_or(0.0),
        description: properties::read_text(props, entry_fields::DESCRIPTION).unwrap_or_default(),
        notes: properties::read_text(props, entry_fields::NOTES).filter(|notes| !notes.is_empty()),
    })
}

/// Map a batch of records, skipping the ones with no usable date.
pub fn time_entries_from_records(records: &[RawRecord]) -> Vec<TimeEntry> {
    records
        .iter()
        .filter_map(|record| {
            let entry = time_entry_from_record(record);
            if entry.is_none() {
                warn!("Skipping time entry {} with no readable date", record.id);
            }
            entry
        })
        .collect()
}

pub fn calendar_event_from_record(record: &RawRecord) -> Option<CalendarEvent> {
    let props = &record.properties;
    let date = properties::read_date(props, event_fields::DATE)?;

    Some(CalendarEvent {
        id: record.id.clone(),
        title: properties::read_text(props, event_fields::NAME).unwrap_or_default(),
        date,
        notes: properties::read_text(props, event_fields::NOTES).filter(|notes| !notes.is_empty()),
    })
}

fn new_entry_properties(entry: &NewTimeEntry) -> Value {
    let mut props = Map::new();
    props.insert(
        entry_fields::DESCRIPTION.to_string(),
        properties::title(&entry.description),
    );
    props.insert(entry_fields::DATE.to_string(), properties::date(entry.date));
    props.insert(entry_fields::HOURS.to_string(), properties::number(entry.hours));
    if let Some(notes) = &entry.notes {
        props.insert(entry_fields::NOTES.to_string(), properties::rich_text(notes));
    }
    Value::Object(props)
}

fn update_properties(update: &TimeEntryUpdate) -> Value {
    let mut props = Map::new();
    if let Some(description) = &update.description {
        props.insert(entry_fields::DESCRIPTION.to_string(), properties::title(description));
    }
    if let Some(date) = update.date {
        props.insert(entry_fields::DATE.to_string(), properties::date(date));
    }
    if let Some(hours) = update.hours {
        props.insert(entry_fields::HOURS.to_string(), properties::number(hours));
    }
    if let Some(notes) = &update.notes {
        props.insert(entry_fields::NOTES.to_string(), properties::rich_text(notes));
    }
    Value::Object(props)
}

/// Time entries, one per calendar date.
pub struct TimeEntryStore<S> {
    store: S,
    target: QueryTarget,
}

impl<S: RecordStore> TimeEntryStore<S> {
    pub fn new(store: S, target: QueryTarget) -> Self {
        Self { store, target }
    }

    /// Resolve the database's query target and wrap the store.
    pub async fn connect(store: S, database_id: &str) -> Result<Self> {
        let target = store.resolve_query_target(database_id).await?;
        Ok(Self::new(store, target))
    }

    /// Entries dated `start..=end`, oldest first.
    pub async fn entries_between(&self, start: NaiveDate, end: NaiveDate) -> Result<Vec<TimeEntry>> {
        let records = self
            .store
            .query_records(
                &self.target,
                Some(properties::date_range_filter(entry_fields::DATE, start, end)),
                vec![properties::ascending(entry_fields::DATE)],
            )
            .await?;

        let mut entries = time_entries_from_records(&records);
        entries.sort_by_key(|entry| entry.date);
        Ok(entries)
    }

    pub async fn entries_in_month(&self, month: ReportingMonth) -> Result<Vec<TimeEntry>> {
        self.entries_between(month.first_day(), month.last_day()).await
    }

    pub async fn entry_on(&self, date: NaiveDate) -> Result<Option<TimeEntry>> {
        let records = self
            .store
            .query_records(
                &self.target,
                Some(properties::date_equals_filter(entry_fields::DATE, date)),
                Vec::new(),
            )
            .await?;

        Ok(time_entries_from_records(&records)
            .into_iter()
            .find(|entry| entry.date == date))
    }

    /// Create an entry, refusing a second entry for the same date.
    pub async fn create_entry(&self, entry: NewTimeEntry) -> Result<TimeEntry> {
        if let Some(existing) = self.entry_on(entry.date).await? {
            return Err(Error::Conflict(format!(
                "a time entry already exists for {} ({})",
                entry.date,
                existing.id.unwrap_or_default()
            )));
        }

        let record = self
            .store
            .create_record(&self.target, new_entry_properties(&entry))
            .await?;
        info!("Created time entry {} for {}", record.id, entry.date);

        Ok(TimeEntry {
            id: Some(record.id),
            date: entry.date,
            hours: entry.hours,
            description: entry.description,
            notes: entry.notes,
        })
    }

    /// Update an entry; moving it onto a date that already has another entry is refused.
    pub async fn update_entry(&self, id: &str, update: TimeEntryUpdate) -> Result<TimeEntry> {
        if update.is_empty() {
            return Err(Error::Validation("No fields to update".to_string()));
        }

        if let Some(date) = update.date {
            if let Some(existing) = self.entry_on(date).await? {
                let is_self = existing
                    .id
                    .as_deref()
                    .is_some_and(|existing_id| same_record_id(existing_id, id));
                if !is_self {
                    return Err(Error::Conflict(format!(
                        "a time entry already exists for {}",
                        date
                    )));
                }
            }
        }

        let record = self.store.update_record(id, update_properties(&update)).await?;
        info!("Updated time entry {}", record.id);

        time_entry_from_record(&record)
            .ok_or_else(|| Error::Store(format!("updated record {} has no date", record.id)))
    }
}

/// Calendar events shown in the weekly widget.
pub struct CalendarStore<S> {
    store: S,
    target: QueryTarget,
}

impl<S: RecordStore> CalendarStore<S> {
    pub fn new(store: S, target: QueryTarget) -> Self {
        Self { store, target }
    }

    pub async fn connect(store: S, database_id: &str) -> Result<Self> {
        let target = store.resolve_query_target(database_id).await?;
        Ok(Self::new(store, target))
    }

    /// Events falling on any of `dates`, ordered by date.
    pub async fn events_on(&self, dates: &[NaiveDate]) -> Result<Vec<CalendarEvent>> {
        if dates.is_empty() {
            return Ok(Vec::new());
        }

        let records = self
            .store
            .query_records(
                &self.target,
                Some(properties::date_in_filter(event_fields::DATE, dates)),
                vec![properties::ascending(event_fields::DATE)],
            )
            .await?;

        let mut events: Vec<CalendarEvent> = records
            .iter()
            .filter_map(calendar_event_from_record)
            .filter(|event| dates.contains(&event.date))
            .collect();
        events.sort_by_key(|event| event.date);
        Ok(events)
    }

    pub async fn create_event(&self, event: NewCalendarEvent) -> Result<CalendarEvent> {
        let mut props = Map::new();
        props.insert(event_fields::NAME.to_string(), properties::title(&event.title));
        props.insert(event_fields::DATE.to_string(), properties::date(event.date));
        if let Some(notes) = &event.notes {
            props.insert(event_fields::NOTES.to_string(), properties::rich_text(notes));
        }

        let record = self
            .store
            .create_record(&self.target, Value::Object(props))
            .await?;
        info!("Created calendar event {} on {}", record.id, event.date);

        Ok(CalendarEvent {
            id: record.id,
            title: event.title,
            date: event.date,
            notes: event.notes,
        })
    }
}
