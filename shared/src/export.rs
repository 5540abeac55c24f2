//! CSV export of a month's time entries.

use crate::models::TimeEntry;
use crate::period::ReportingMonth;
use crate::weeks::week_number_of_month;
use crate::{Error, Result};

const HEADER: [&str; 5] = ["Date", "Week", "Hours", "Description", "Notes"];

/// Render the entries dated in `month` as CSV, oldest first, with a total row.
pub fn export_csv(entries: &[TimeEntry], month: ReportingMonth) -> Result<String> {
    let mut rows: Vec<&TimeEntry> = entries
        .iter()
        .filter(|entry| month.contains(entry.date))
        .collect();
    if rows.is_empty() {
        return Err(Error::NoData(format!("no time entries for {}", month.label())));
    }
    rows.sort_by_key(|entry| entry.date);

    let mut writer = csv::Writer::from_writer(Vec::new());
    writer.write_record(HEADER)?;

    let mut total_hours = 0.0;
    for entry in rows {
        total_hours += entry.hours;
        writer.write_record([
            entry.date.format("%Y-%m-%d").to_string(),
            week_number_of_month(entry.date).to_string(),
            format!("{:.2}", entry.hours),
            entry.description.clone(),
            entry.notes.clone().unwrap_or_default(),
        ])?;
    }
    writer.write_record([
        "Total".to_string(),
        String::new(),
        format!("{:.2}", total_hours),
        String::new(),
        String::new(),
    ])?;

    let bytes = writer
        .into_inner()
        .map_err(|e| Error::Internal(format!("Failed to flush CSV: {}", e)))?;
    String::from_utf8(bytes).map_err(|e| Error::Internal(format!("CSV is not UTF-8: {}", e)))
}

/// Download name for a month's export, e.g. `hours-2024-03.csv`.
pub fn csv_filename(month: ReportingMonth) -> String {
    format!("hours-{}.csv", month)
}
