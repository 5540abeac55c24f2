//! Invoice layout: header, bordered line-item table, total and payment notes.

use chrono::NaiveDate;

use crate::config::{BillingProfile, PageGeometry};
use crate::report::billing::BillingSummary;
use crate::report::layout::{format_money, Canvas, DrawInstruction, Font, TextMeasurer};

const TITLE_SIZE: f64 = 24.0;
const BODY_SIZE: f64 = 11.0;
const TOTAL_SIZE: f64 = 12.0;

const ROW_HEIGHT: f64 = 20.0;
const CELL_PADDING: f64 = 5.0;
/// Column offsets from the left margin.
const DATE_COLUMN: f64 = 0.0;
const DESCRIPTION_COLUMN: f64 = 90.0;
const AMOUNT_COLUMN: f64 = 400.0;

/// Lay out the invoice for `summary`.
///
/// Rows that would cross the bottom threshold continue on a new page under a
/// repeated column header.
pub fn build_invoice_instructions<M: TextMeasurer + ?Sized>(
    summary: &BillingSummary,
    invoice_date: NaiveDate,
    due_date: NaiveDate,
    profile: &BillingProfile,
    geometry: &PageGeometry,
    measurer: &M,
) -> Vec<DrawInstruction> {
    let mut canvas = Canvas::new(*geometry, measurer);
    let left = geometry.margin;

    canvas.text(left, profile.invoice_title.clone(), Font::Bold, TITLE_SIZE);
    canvas.advance(TITLE_SIZE + geometry.line_height);
    canvas.text(
        left,
        format!("Invoice Date: {}", invoice_date.format("%B %-d, %Y")),
        Font::Regular,
        BODY_SIZE,
    );
    canvas.next_line();
    canvas.text(left, format!("Bill To: {}", profile.client_name), Font::Regular, BODY_SIZE);
    canvas.next_line();
    canvas.text(left, profile.contact_line.clone(), Font::Regular, BODY_SIZE);
    canvas.advance(geometry.line_height * 2.0);

    table_row(&mut canvas, ["Date", "Description", "Amount"], Font::Bold);
    for item in &summary.line_items {
        if canvas.cursor - ROW_HEIGHT < geometry.bottom_threshold {
            canvas.new_page();
            table_row(&mut canvas, ["Date", "Description", "Amount"], Font::Bold);
        }
        let date = item.end_date.format("%m/%d/%Y").to_string();
        let amount = format_money(item.amount);
        table_row(&mut canvas, [&date, &item.period_label, &amount], Font::Regular);
    }

    canvas.advance(geometry.line_height * 1.5);
    canvas.ensure_space();
    canvas.right_aligned_text(format!("Total: {}", format_money(summary.total)), Font::Bold, TOTAL_SIZE);
    canvas.advance(geometry.line_height * 2.5);

    canvas.text(
        left,
        format!("Payment is due by {}.", due_date.format("%B %-d, %Y")),
        Font::Regular,
        BODY_SIZE,
    );
    canvas.next_line();
    canvas.text(
        left,
        format!("Please make payment to {}. Thank you!", profile.payee),
        Font::Regular,
        BODY_SIZE,
    );

    canvas.finish()
}

/// One bordered row whose top edge is the cursor; moves the cursor below it.
fn table_row<M: TextMeasurer + ?Sized>(canvas: &mut Canvas<'_, M>, cells: [&str; 3], font: Font) {
    let left = canvas.geometry.margin;
    let width = canvas.geometry.content_width();
    let top = canvas.cursor;
    let bottom = top - ROW_HEIGHT;

    canvas.rect(left, bottom, width, ROW_HEIGHT, 1.0);
    for column in [DESCRIPTION_COLUMN, AMOUNT_COLUMN] {
        canvas.line((left + column, bottom), (left + column, top), 1.0);
    }

    canvas.cursor = bottom + CELL_PADDING + 2.0;
    for (column, text) in [DATE_COLUMN, DESCRIPTION_COLUMN, AMOUNT_COLUMN]
        .into_iter()
        .zip(cells)
    {
        canvas.text(left + column + CELL_PADDING, text, font, BODY_SIZE);
    }
    canvas.cursor = bottom;
}
