//! Billing period and weekday resolution in a fixed civil timezone.
//!
//! All arithmetic here is calendar arithmetic on local dates. Instants are
//! converted into the configured zone once, when a [`CivilDateTime`] is built,
//! so DST transitions never shift a date.

use chrono::{DateTime, Datelike, Days, NaiveDate, NaiveDateTime, Utc};
use chrono_tz::Tz;
use serde::{Serialize, Serializer};
use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

use crate::{Error, Result};

/// Through this day of the month, reports still cover the previous month.
pub const CUTOVER_DAY: u32 = 15;

/// Days between the invoice date and the payment due month.
pub const PAYMENT_TERM_DAYS: u64 = 45;

/// Payments are always due on this day of the month.
pub const PAYMENT_DUE_DAY: u32 = 15;

/// A wall-clock date-time with the timezone it was read in.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CivilDateTime {
    local: NaiveDateTime,
    zone: Tz,
}

impl CivilDateTime {
    /// Convert an instant into wall-clock time in `zone`.
    pub fn from_utc(instant: DateTime<Utc>, zone: Tz) -> Self {
        Self {
            local: instant.with_timezone(&zone).naive_local(),
            zone,
        }
    }

    /// Wrap an already-local date-time.
    pub fn from_local(local: NaiveDateTime, zone: Tz) -> Self {
        Self { local, zone }
    }

    /// Current wall-clock time in `zone`.
    pub fn now(zone: Tz) -> Self {
        Self::from_utc(Utc::now(), zone)
    }

    pub fn date(&self) -> NaiveDate {
        self.local.date()
    }

    pub fn local(&self) -> NaiveDateTime {
        self.local
    }

    pub fn zone(&self) -> Tz {
        self.zone
    }

    /// ISO weekday of the local date (Monday = 1 .. Sunday = 7).
    pub fn iso_weekday(&self) -> u32 {
        self.local.weekday().number_from_monday()
    }
}

/// A calendar month (year + month) with no day attached.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ReportingMonth {
    first: NaiveDate,
}

impl ReportingMonth {
    /// Build a month, rejecting months outside 1..=12 and years outside 1..=9999.
    pub fn new(year: i32, month: u32) -> Result<Self> {
        if !(1..=12).contains(&month) {
            return Err(Error::InvalidArgument(format!(
                "month must be between 1 and 12, got {}",
                month
            )));
        }
        if !(1..=9999).contains(&year) {
            return Err(Error::InvalidArgument(format!(
                "year must be between 1 and 9999, got {}",
                year
            )));
        }

        let first = NaiveDate::from_ymd_opt(year, month, 1)
            .ok_or_else(|| Error::InvalidArgument(format!("invalid month {}-{}", year, month)))?;
        Ok(Self { first })
    }

    /// The month containing `date`.
    pub fn of(date: NaiveDate) -> Self {
        Self {
            first: date.with_day(1).unwrap_or(date),
        }
    }

    pub fn year(&self) -> i32 {
        self.first.year()
    }

    pub fn month(&self) -> u32 {
        self.first.month()
    }

    pub fn first_day(&self) -> NaiveDate {
        self.first
    }

    pub fn last_day(&self) -> NaiveDate {
        let length = u64::from(days_in_month(self.year(), self.month()));
        self.first
            .checked_add_days(Days::new(length - 1))
            .unwrap_or(self.first)
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        date.year() == self.year() && date.month() == self.month()
    }

    pub fn previous(&self) -> Self {
        Self::of(self.first.pred_opt().unwrap_or(self.first))
    }

    pub fn next(&self) -> Self {
        let last = self.last_day();
        Self::of(last.succ_opt().unwrap_or(last))
    }

    /// Human label, e.g. `March 2024`.
    pub fn label(&self) -> String {
        self.first.format("%B %Y").to_string()
    }

    /// Month name alone, e.g. `March`.
    pub fn name(&self) -> String {
        self.first.format("%B").to_string()
    }
}

impl fmt::Display for ReportingMonth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04}-{:02}", self.year(), self.month())
    }
}

impl FromStr for ReportingMonth {
    type Err = Error;

    /// Parse `YYYY-MM`.
    fn from_str(s: &str) -> Result<Self> {
        let invalid = || Error::InvalidArgument(format!("expected YYYY-MM, got {:?}", s));
        let (year, month) = s.trim().split_once('-').ok_or_else(invalid)?;
        let year = year.parse::<i32>().map_err(|_| invalid())?;
        let month = month.parse::<u32>().map_err(|_| invalid())?;
        Self::new(year, month)
    }
}

impl Serialize for ReportingMonth {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

fn days_in_month(year: i32, month: u32) -> u32 {
    match month {
        4 | 6 | 9 | 11 => 30,
        2 if NaiveDate::from_ymd_opt(year, 2, 29).is_some() => 29,
        2 => 28,
        _ => 31,
    }
}

/// The month reports and exports cover at `now`.
///
/// While the day-of-month is at or before [`CUTOVER_DAY`] this is the
/// previous month, otherwise the current one.
pub fn resolve_reporting_month(now: &CivilDateTime) -> ReportingMonth {
    let today = now.date();
    let current = ReportingMonth::of(today);
    if today.day() <= CUTOVER_DAY {
        current.previous()
    } else {
        current
    }
}

/// Last day of the reporting month.
pub fn resolve_invoice_date(now: &CivilDateTime) -> NaiveDate {
    resolve_reporting_month(now).last_day()
}

/// The 15th of the month that `invoice_date + 45 days` falls in.
pub fn resolve_payment_due_date(invoice_date: NaiveDate) -> NaiveDate {
    let later = invoice_date
        .checked_add_days(Days::new(PAYMENT_TERM_DAYS))
        .unwrap_or(invoice_date);
    later.with_day(PAYMENT_DUE_DAY).unwrap_or(later)
}

fn check_iso_weekday(weekday: u32) -> Result<u32> {
    if (1..=7).contains(&weekday) {
        Ok(weekday)
    } else {
        Err(Error::InvalidArgument(format!(
            "weekday must be between 1 (Monday) and 7 (Sunday), got {}",
            weekday
        )))
    }
}

fn monday_of(date: NaiveDate) -> NaiveDate {
    let back = u64::from(date.weekday().num_days_from_monday());
    date.checked_sub_days(Days::new(back)).unwrap_or(date)
}

fn date_in_week(monday: NaiveDate, weekday: u32) -> NaiveDate {
    monday
        .checked_add_days(Days::new(u64::from(weekday - 1)))
        .unwrap_or(monday)
}

/// The date of `weekday` (1 = Monday .. 7 = Sunday) in the current ISO week.
pub fn resolve_weekday(now: &CivilDateTime, weekday: u32) -> Result<NaiveDate> {
    let weekday = check_iso_weekday(weekday)?;
    Ok(date_in_week(monday_of(now.date()), weekday))
}

/// Dates for a group of weekdays requested together, ascending.
///
/// The group moves to next week only when every requested weekday is
/// already behind today; otherwise every date stays in the current week.
pub fn resolve_weekday_group(now: &CivilDateTime, weekdays: &[u32]) -> Result<Vec<NaiveDate>> {
    let requested = weekdays
        .iter()
        .map(|&day| check_iso_weekday(day))
        .collect::<Result<BTreeSet<u32>>>()?;
    if requested.is_empty() {
        return Ok(Vec::new());
    }

    let today = now.iso_weekday();
    let mut monday = monday_of(now.date());
    if requested.iter().all(|&day| day < today) {
        monday = monday.checked_add_days(Days::new(7)).unwrap_or(monday);
    }

    Ok(requested
        .into_iter()
        .map(|day| date_in_week(monday, day))
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn at(y: i32, m: u32, d: u32) -> CivilDateTime {
        CivilDateTime::from_local(date(y, m, d).and_hms_opt(9, 30, 0).unwrap(), chrono_tz::America::Denver)
    }

    #[test]
    fn test_reporting_month_cutover() {
        assert_eq!(resolve_reporting_month(&at(2024, 3, 10)), ReportingMonth::new(2024, 2).unwrap());
        assert_eq!(resolve_reporting_month(&at(2024, 3, 15)), ReportingMonth::new(2024, 2).unwrap());
        assert_eq!(resolve_reporting_month(&at(2024, 3, 16)), ReportingMonth::new(2024, 3).unwrap());
        assert_eq!(resolve_reporting_month(&at(2024, 3, 20)), ReportingMonth::new(2024, 3).unwrap());
    }

    #[test]
    fn test_reporting_month_crosses_year() {
        assert_eq!(resolve_reporting_month(&at(2024, 1, 5)), ReportingMonth::new(2023, 12).unwrap());
    }

    #[test]
    fn test_utc_instant_read_in_zone() {
        // 03:00 UTC on the 16th is still the evening of the 15th in Denver
        let instant = Utc.with_ymd_and_hms(2024, 3, 16, 3, 0, 0).unwrap();
        let now = CivilDateTime::from_utc(instant, chrono_tz::America::Denver);
        assert_eq!(now.date(), date(2024, 3, 15));
        assert_eq!(resolve_reporting_month(&now), ReportingMonth::new(2024, 2).unwrap());
    }

    #[test]
    fn test_invoice_date_is_last_day_of_month() {
        assert_eq!(resolve_invoice_date(&at(2024, 3, 10)), date(2024, 2, 29));
        assert_eq!(resolve_invoice_date(&at(2023, 3, 10)), date(2023, 2, 28));
        assert_eq!(resolve_invoice_date(&at(2024, 5, 20)), date(2024, 5, 31));
    }

    #[test]
    fn test_payment_due_date() {
        assert_eq!(resolve_payment_due_date(date(2024, 1, 31)), date(2024, 3, 15));
        assert_eq!(resolve_payment_due_date(date(2023, 1, 31)), date(2023, 3, 15));
        assert_eq!(resolve_payment_due_date(date(2024, 4, 30)), date(2024, 6, 15));
        assert_eq!(resolve_payment_due_date(date(2024, 11, 30)), date(2025, 1, 15));
    }

    #[test]
    fn test_month_bounds() {
        let feb = ReportingMonth::new(2024, 2).unwrap();
        assert_eq!(feb.first_day(), date(2024, 2, 1));
        assert_eq!(feb.last_day(), date(2024, 2, 29));
        assert!(feb.contains(date(2024, 2, 29)));
        assert!(!feb.contains(date(2024, 3, 1)));
        assert_eq!(feb.previous(), ReportingMonth::new(2024, 1).unwrap());
        assert_eq!(ReportingMonth::new(2024, 12).unwrap().next(), ReportingMonth::new(2025, 1).unwrap());
        assert_eq!(feb.label(), "February 2024");
    }

    #[test]
    fn test_month_parse() {
        let month: ReportingMonth = "2024-03".parse().unwrap();
        assert_eq!(month, ReportingMonth::new(2024, 3).unwrap());
        assert_eq!(month.to_string(), "2024-03");
        assert!(matches!("2024-13".parse::<ReportingMonth>(), Err(Error::InvalidArgument(_))));
        assert!(matches!("March".parse::<ReportingMonth>(), Err(Error::InvalidArgument(_))));
        assert!(matches!(ReportingMonth::new(2024, 0), Err(Error::InvalidArgument(_))));
    }

    #[test]
    fn test_resolve_weekday_current_week() {
        // 2024-03-13 is a Wednesday
        let now = at(2024, 3, 13);
        assert_eq!(resolve_weekday(&now, 1).unwrap(), date(2024, 3, 11));
        assert_eq!(resolve_weekday(&now, 3).unwrap(), date(2024, 3, 13));
        assert_eq!(resolve_weekday(&now, 7).unwrap(), date(2024, 3, 17));
    }

    #[test]
    fn test_resolve_weekday_rejects_out_of_range() {
        let now = at(2024, 3, 13);
        assert!(matches!(resolve_weekday(&now, 0), Err(Error::InvalidArgument(_))));
        assert!(matches!(resolve_weekday(&now, 8), Err(Error::InvalidArgument(_))));
        assert!(matches!(resolve_weekday_group(&now, &[1, 9]), Err(Error::InvalidArgument(_))));
    }

    #[test]
    fn test_weekday_group_rolls_when_all_passed() {
        let now = at(2024, 3, 13);
        assert_eq!(
            resolve_weekday_group(&now, &[1, 2]).unwrap(),
            vec![date(2024, 3, 18), date(2024, 3, 19)]
        );
    }

    #[test]
    fn test_weekday_group_stays_when_any_pending() {
        let now = at(2024, 3, 13);
        assert_eq!(
            resolve_weekday_group(&now, &[5, 1]).unwrap(),
            vec![date(2024, 3, 11), date(2024, 3, 15)]
        );
        // today itself has not passed
        assert_eq!(
            resolve_weekday_group(&now, &[1, 3]).unwrap(),
            vec![date(2024, 3, 11), date(2024, 3, 13)]
        );
    }

    #[test]
    fn test_weekday_group_on_sunday() {
        let now = at(2024, 3, 17);
        assert_eq!(
            resolve_weekday_group(&now, &[1, 6]).unwrap(),
            vec![date(2024, 3, 18), date(2024, 3, 23)]
        );
        assert_eq!(resolve_weekday_group(&now, &[7]).unwrap(), vec![date(2024, 3, 17)]);
        assert!(resolve_weekday_group(&now, &[]).unwrap().is_empty());
    }

    #[test]
    fn test_resolvers_are_deterministic() {
        let now = at(2024, 3, 13);
        assert_eq!(resolve_weekday_group(&now, &[2, 4]).unwrap(), resolve_weekday_group(&now, &[2, 4]).unwrap());
        assert_eq!(resolve_invoice_date(&now), resolve_invoice_date(&now));
    }
}
