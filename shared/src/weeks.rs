//! Week-of-month bucketing for time entries.
//!
//! Weeks start on Sunday. Days before the first Sunday of a month form a
//! partial week 1; each Sunday after that opens the next week.

use chrono::{Datelike, Days, NaiveDate};
use std::collections::BTreeMap;

use crate::models::TimeEntry;
use crate::period::ReportingMonth;

/// Entries of one month keyed by 1-indexed week number, ascending.
pub type WeekBuckets = BTreeMap<u32, Vec<TimeEntry>>;

/// 1-indexed week of `date` within its own month.
pub fn week_number_of_month(date: NaiveDate) -> u32 {
    let first_day = ReportingMonth::of(date).first_day();
    let until_sunday = (7 - first_day.weekday().num_days_from_sunday()) % 7;
    let first_sunday = first_day
        .checked_add_days(Days::new(u64::from(until_sunday)))
        .unwrap_or(first_day);

    if date < first_sunday {
        return 1;
    }

    let base = if first_sunday == first_day { 1 } else { 2 };
    let full_weeks = (date - first_sunday).num_days() / 7;
    full_weeks as u32 + base
}

/// Group the entries dated inside `month` by week number.
///
/// Entries from other months are dropped. Order inside a bucket follows the
/// input order.
pub fn bucket_entries_by_week(entries: &[TimeEntry], month: ReportingMonth) -> WeekBuckets {
    entries
        .iter()
        .filter(|entry| month.contains(entry.date))
        .fold(WeekBuckets::new(), |mut buckets, entry| {
            buckets
                .entry(week_number_of_month(entry.date))
                .or_default()
                .push(entry.clone());
            buckets
        })
}

/// Number of entries across all buckets.
pub fn bucketed_entry_count(buckets: &WeekBuckets) -> usize {
    buckets.values().map(Vec::len).sum()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Weekday;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_month_starting_midweek() {
        // March 2024 starts on a Friday; the 3rd is the first Sunday
        assert_eq!(week_number_of_month(date(2024, 3, 1)), 1);
        assert_eq!(week_number_of_month(date(2024, 3, 2)), 1);
        assert_eq!(week_number_of_month(date(2024, 3, 3)), 2);
        assert_eq!(week_number_of_month(date(2024, 3, 9)), 2);
        assert_eq!(week_number_of_month(date(2024, 3, 10)), 3);
        assert_eq!(week_number_of_month(date(2024, 3, 31)), 6);
    }

    #[test]
    fn test_month_starting_on_sunday() {
        // September 2024 starts on a Sunday
        assert_eq!(week_number_of_month(date(2024, 9, 1)), 1);
        assert_eq!(week_number_of_month(date(2024, 9, 7)), 1);
        assert_eq!(week_number_of_month(date(2024, 9, 8)), 2);
        assert_eq!(week_number_of_month(date(2024, 9, 30)), 5);
    }

    #[test]
    fn test_month_starting_on_saturday() {
        // June 2024 starts on a Saturday: a one-day week 1
        assert_eq!(week_number_of_month(date(2024, 6, 1)), 1);
        assert_eq!(week_number_of_month(date(2024, 6, 2)), 2);
    }

    #[test]
    fn test_week_numbers_over_several_years() {
        let mut day = date(2023, 1, 1);
        let end = date(2026, 12, 31);
        while day <= end {
            let week = week_number_of_month(day);
            assert!(week >= 1, "{} got week {}", day, week);
            assert!(week <= 6, "{} got week {}", day, week);

            if day.weekday() == Weekday::Sun {
                let next_sunday = day + Days::new(7);
                if next_sunday.month() == day.month() {
                    assert_eq!(week_number_of_month(next_sunday), week + 1, "after {}", day);
                }
            } else if let Some(next) = day.succ_opt().filter(|d| d.month() == day.month()) {
                if next.weekday() != Weekday::Sun {
                    assert_eq!(week_number_of_month(next), week, "after {}", day);
                }
            }
            day = day.succ_opt().unwrap();
        }
    }

    #[test]
    fn test_bucketing_partitions_month() {
        let march = ReportingMonth::new(2024, 3).unwrap();
        let entries = vec![
            TimeEntry::new(date(2024, 2, 29), 4.0, "outside"),
            TimeEntry::new(date(2024, 3, 1), 2.0, "a"),
            TimeEntry::new(date(2024, 3, 4), 3.0, "b"),
            TimeEntry::new(date(2024, 3, 6), 1.5, "c"),
            TimeEntry::new(date(2024, 3, 31), 5.0, "d"),
            TimeEntry::new(date(2024, 4, 1), 6.0, "outside"),
        ];

        let buckets = bucket_entries_by_week(&entries, march);

        assert_eq!(bucketed_entry_count(&buckets), 4);
        assert_eq!(buckets.keys().copied().collect::<Vec<_>>(), vec![1, 2, 6]);
        assert_eq!(buckets[&2].len(), 2);
        assert!(buckets.values().flatten().all(|e| march.contains(e.date)));
        for entry in entries.iter().filter(|e| march.contains(e.date)) {
            let holders = buckets.values().filter(|b| b.contains(entry)).count();
            assert_eq!(holders, 1);
        }
    }

    #[test]
    fn test_bucketing_empty_month() {
        let april = ReportingMonth::new(2024, 4).unwrap();
        let entries = vec![TimeEntry::new(date(2024, 3, 4), 3.0, "b")];
        assert!(bucket_entries_by_week(&entries, april).is_empty());
    }
}
