//! Week-by-week billing lines for the invoice.

use chrono::NaiveDate;
use serde::Serialize;

use crate::period::ReportingMonth;
use crate::weeks::WeekBuckets;
use crate::{Error, Result};

/// One invoice row: a week's hours billed at the hourly rate.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BillingLineItem {
    pub week: u32,
    pub period_label: String,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub hours: f64,
    pub amount: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BillingSummary {
    pub month: ReportingMonth,
    pub hourly_rate: f64,
    pub line_items: Vec<BillingLineItem>,
    pub total_hours: f64,
    pub total: f64,
}

/// Build one line per non-empty week, in week order.
///
/// Returns [`Error::NoData`] when no week has any entry.
pub fn build_billing_summary(
    buckets: &WeekBuckets,
    month: ReportingMonth,
    hourly_rate: f64,
) -> Result<BillingSummary> {
    let mut line_items = Vec::with_capacity(buckets.len());
    let mut total_hours = 0.0;
    let mut total = 0.0;

    for (&week, entries) in buckets {
        let dates = entries.iter().map(|entry| entry.date);
        let (Some(start_date), Some(end_date)) = (dates.clone().min(), dates.max()) else {
            continue;
        };

        let hours: f64 = entries.iter().map(|entry| entry.hours).sum();
        let amount = hours * hourly_rate;
        total_hours += hours;
        total += amount;

        line_items.push(BillingLineItem {
            week,
            period_label: format!(
                "{} Week {} ({} - {})",
                month.name(),
                week,
                start_date.format("%-m/%-d"),
                end_date.format("%-m/%-d")
            ),
            start_date,
            end_date,
            hours,
            amount,
        });
    }

    if line_items.is_empty() {
        return Err(Error::NoData(format!("no time entries for {}", month.label())));
    }

    Ok(BillingSummary {
        month,
        hourly_rate,
        line_items,
        total_hours,
        total,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::TimeEntry;
    use crate::weeks::bucket_entries_by_week;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn march_entries() -> Vec<TimeEntry> {
        vec![
            TimeEntry::new(date(2024, 3, 6), 1.5, "c"),
            TimeEntry::new(date(2024, 3, 1), 2.0, "a"),
            TimeEntry::new(date(2024, 3, 4), 3.25, "b"),
            TimeEntry::new(date(2024, 3, 28), 5.0, "d"),
        ]
    }

    #[test]
    fn test_line_items_per_week() {
        let march = ReportingMonth::new(2024, 3).unwrap();
        let buckets = bucket_entries_by_week(&march_entries(), march);

        let summary = build_billing_summary(&buckets, march, 20.0).unwrap();

        let weeks: Vec<u32> = summary.line_items.iter().map(|item| item.week).collect();
        assert_eq!(weeks, vec![1, 2, 5]);

        let second = &summary.line_items[1];
        assert_eq!(second.start_date, date(2024, 3, 4));
        assert_eq!(second.end_date, date(2024, 3, 6));
        assert_eq!(second.hours, 4.75);
        assert_eq!(second.amount, 95.0);
        assert_eq!(second.period_label, "March Week 2 (3/4 - 3/6)");
    }

    #[test]
    fn test_total_matches_line_items_and_hours() {
        let march = ReportingMonth::new(2024, 3).unwrap();
        let entries = march_entries();
        let buckets = bucket_entries_by_week(&entries, march);

        let summary = build_billing_summary(&buckets, march, 22.5).unwrap();

        let line_sum: f64 = summary.line_items.iter().map(|item| item.amount).sum();
        let hour_sum: f64 = entries.iter().map(|e| e.hours).sum();
        assert!((summary.total - line_sum).abs() < 1e-9);
        assert!((summary.total - hour_sum * 22.5).abs() < 1e-9);
        assert!((summary.total_hours - hour_sum).abs() < 1e-9);
    }

    #[test]
    fn test_empty_buckets_are_no_data() {
        let march = ReportingMonth::new(2024, 3).unwrap();
        let mut buckets = WeekBuckets::new();
        assert!(matches!(build_billing_summary(&buckets, march, 20.0), Err(Error::NoData(_))));

        buckets.insert(2, Vec::new());
        assert!(matches!(build_billing_summary(&buckets, march, 20.0), Err(Error::NoData(_))));
    }

    #[test]
    fn test_summary_is_deterministic() {
        let march = ReportingMonth::new(2024, 3).unwrap();
        let buckets = bucket_entries_by_week(&march_entries(), march);
        assert_eq!(
            build_billing_summary(&buckets, march, 20.0).unwrap(),
            build_billing_summary(&buckets, march, 20.0).unwrap()
        );
    }
}
