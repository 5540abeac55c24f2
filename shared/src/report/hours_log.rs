//! Chronological hours log, grouped by week.

use crate::config::{BillingProfile, PageGeometry};
use crate::models::TimeEntry;
use crate::period::ReportingMonth;
use crate::report::layout::{wrap_text, Canvas, DrawInstruction, Font, TextMeasurer};
use crate::weeks::WeekBuckets;
use crate::{Error, Result};

const TITLE_SIZE: f64 = 18.0;
const WEEK_HEADER_SIZE: f64 = 13.0;
const BODY_SIZE: f64 = 11.0;
const DESCRIPTION_LABEL: &str = "Description: ";

/// Lay out every entry of `month`, week by week, with a running hours total.
///
/// Before each week header and each entry block a new page is started if
/// the cursor is below the page's bottom threshold. Description lines wrap
/// against `content width - label width`; the first line sits after the
/// label and the rest start flush left.
pub fn build_hours_log_instructions<M: TextMeasurer + ?Sized>(
    buckets: &WeekBuckets,
    month: ReportingMonth,
    profile: &BillingProfile,
    geometry: &PageGeometry,
    measurer: &M,
) -> Result<Vec<DrawInstruction>> {
    if buckets.values().all(Vec::is_empty) {
        return Err(Error::NoData(format!("no time entries for {}", month.label())));
    }

    let mut canvas = Canvas::new(*geometry, measurer);
    let left = geometry.margin;

    canvas.text(left, format!("Hours Log - {}", month.label()), Font::Bold, TITLE_SIZE);
    canvas.advance(geometry.line_height * 1.5);
    canvas.text(left, format!("Prepared for {}", profile.client_name), Font::Regular, BODY_SIZE);
    canvas.advance(geometry.line_height * 2.0);

    let mut total_hours = 0.0;

    for (week, entries) in buckets.iter().filter(|(_, entries)| !entries.is_empty()) {
        canvas.ensure_space();
        canvas.underlined_text(left, format!("Week {}", week), Font::Bold, WEEK_HEADER_SIZE);
        canvas.advance(geometry.line_height * 1.5);

        let mut ordered: Vec<&TimeEntry> = entries.iter().collect();
        ordered.sort_by_key(|entry| entry.date);

        for entry in ordered {
            canvas.ensure_space();
            draw_entry(&mut canvas, entry);
            total_hours += entry.hours;
        }
    }

    canvas.ensure_space();
    canvas.advance(geometry.line_height * 0.5);
    canvas.text(left, format!("Total Hours: {:.2}", total_hours), Font::Bold, WEEK_HEADER_SIZE);

    Ok(canvas.finish())
}

fn draw_entry<M: TextMeasurer + ?Sized>(canvas: &mut Canvas<'_, M>, entry: &TimeEntry) {
    let geometry = canvas.geometry;
    let left = geometry.margin;

    let header = entry.date.format("%A, %B %-d, %Y").to_string();
    canvas.underlined_text(left, header, Font::Bold, BODY_SIZE);
    canvas.next_line();

    canvas.text(left, format!("Hours: {:.2}", entry.hours), Font::Regular, BODY_SIZE);
    canvas.next_line();

    let label_width = canvas.width_of(DESCRIPTION_LABEL, Font::Bold, BODY_SIZE);
    let max_width = geometry.content_width() - label_width;
    let lines = wrap_text(&entry.description, max_width, canvas.measurer(), Font::Regular, BODY_SIZE);

    canvas.text(left, DESCRIPTION_LABEL, Font::Bold, BODY_SIZE);
    for (i, line) in lines.into_iter().enumerate() {
        if i == 0 {
            canvas.text(left + label_width, line, Font::Regular, BODY_SIZE);
        } else {
            // very long descriptions keep flowing onto the next page
            if canvas.cursor < geometry.margin {
                canvas.new_page();
            }
            canvas.text(left, line, Font::Regular, BODY_SIZE);
        }
        canvas.next_line();
    }
    if entry.description.split_whitespace().next().is_none() {
        canvas.next_line();
    }

    canvas.advance(geometry.line_height * 0.5);
}
