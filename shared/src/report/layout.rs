//! Drawing instructions, text measurement and the page cursor shared by the
//! invoice and hours-log layouts.
//!
//! Coordinates are PDF points with the origin at the bottom-left corner of
//! the page. A document starts on its first page; [`DrawInstruction::NewPage`]
//! opens each following one.

use crate::config::PageGeometry;

/// The two base fonts the layouts use.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Font {
    Regular,
    Bold,
}

#[derive(Debug, Clone, PartialEq)]
pub enum DrawInstruction {
    NewPage,
    Text {
        x: f64,
        y: f64,
        text: String,
        font: Font,
        size: f64,
    },
    Line {
        from: (f64, f64),
        to: (f64, f64),
        thickness: f64,
    },
    /// Stroked rectangle anchored at its bottom-left corner.
    Rect {
        x: f64,
        y: f64,
        width: f64,
        height: f64,
        thickness: f64,
    },
}

/// Width of a run of text when set in `font` at `size` points.
pub trait TextMeasurer {
    fn text_width(&self, text: &str, font: Font, size: f64) -> f64;
}

/// Advance widths of the standard Helvetica faces.
#[derive(Debug, Clone, Copy, Default)]
pub struct StandardFonts;

// Widths per 1000 units of em for ASCII 0x20..=0x7E.
const HELVETICA_WIDTHS: [u16; 95] = [
    278, 278, 355, 556, 556, 889, 667, 191, 333, 333, 389, 584, 278, 333, 278, 278, // ' '../
    556, 556, 556, 556, 556, 556, 556, 556, 556, 556, 278, 278, 584, 584, 584, 556, // 0..?
    1015, 667, 667, 722, 722, 667, 611, 778, 722, 278, 500, 667, 556, 833, 722, 778, // @..O
    667, 778, 722, 667, 611, 722, 667, 944, 667, 667, 611, 278, 278, 278, 469, 556, // P.._
    333, 556, 556, 500, 556, 556, 278, 556, 556, 222, 222, 500, 222, 833, 556, 556, // `..o
    556, 556, 333, 500, 278, 556, 500, 722, 500, 500, 500, 334, 260, 334, 584, // p..~
];

const HELVETICA_BOLD_WIDTHS: [u16; 95] = [
    278, 333, 474, 556, 556, 889, 722, 238, 333, 333, 389, 584, 278, 333, 278, 278,
    556, 556, 556, 556, 556, 556, 556, 556, 556, 556, 333, 333, 584, 584, 584, 611,
    975, 722, 722, 722, 722, 667, 611, 778, 722, 278, 556, 722, 611, 833, 722, 778,
    667, 778, 722, 667, 611, 722, 667, 944, 667, 667, 611, 333, 278, 333, 584, 556,
    333, 556, 611, 556, 611, 556, 333, 611, 611, 278, 278, 556, 278, 889, 611, 611,
    611, 611, 389, 556, 333, 611, 556, 778, 556, 556, 500, 389, 280, 389, 584,
];

/// The character drawn in place of one the base fonts cannot encode.
pub fn drawable_char(ch: char) -> char {
    if (' '..='~').contains(&ch) {
        ch
    } else {
        '?'
    }
}

impl TextMeasurer for StandardFonts {
    fn text_width(&self, text: &str, font: Font, size: f64) -> f64 {
        let table = match font {
            Font::Regular => &HELVETICA_WIDTHS,
            Font::Bold => &HELVETICA_BOLD_WIDTHS,
        };
        let units: u32 = text
            .chars()
            .map(|ch| u32::from(table[drawable_char(ch) as usize - 0x20]))
            .sum();
        f64::from(units) * size / 1000.0
    }
}

/// Greedily pack whitespace-separated words into lines no wider than `max_width`.
///
/// A single word wider than `max_width` still gets a line of its own.
pub fn wrap_text<M: TextMeasurer + ?Sized>(
    text: &str,
    max_width: f64,
    measurer: &M,
    font: Font,
    size: f64,
) -> Vec<String> {
    let mut lines = Vec::new();
    let mut current = String::new();

    for word in text.split_whitespace() {
        if current.is_empty() {
            current.push_str(word);
            continue;
        }

        let candidate = format!("{} {}", current, word);
        if measurer.text_width(&candidate, font, size) > max_width {
            lines.push(std::mem::replace(&mut current, word.to_string()));
        } else {
            current = candidate;
        }
    }

    if !current.is_empty() {
        lines.push(current);
    }
    lines
}

/// Format an amount as dollars with thousands separators: 9600.0 → "$9,600.00".
pub fn format_money(amount: f64) -> String {
    let cents = (amount.abs() * 100.0).round() as u64;
    let dollars = (cents / 100).to_string();

    let mut grouped = String::with_capacity(dollars.len() + dollars.len() / 3);
    for (i, digit) in dollars.chars().enumerate() {
        if i > 0 && (dollars.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(digit);
    }

    let sign = if amount < 0.0 && cents > 0 { "-" } else { "" };
    format!("{}${}.{:02}", sign, grouped, cents % 100)
}

/// Vertical cursor over a growing list of instructions.
pub(crate) struct Canvas<'a, M: TextMeasurer + ?Sized> {
    pub geometry: PageGeometry,
    measurer: &'a M,
    pub cursor: f64,
    instructions: Vec<DrawInstruction>,
}

impl<'a, M: TextMeasurer + ?Sized> Canvas<'a, M> {
    pub fn new(geometry: PageGeometry, measurer: &'a M) -> Self {
        Self {
            geometry,
            measurer,
            cursor: geometry.top(),
            instructions: Vec::new(),
        }
    }

    pub fn new_page(&mut self) {
        self.instructions.push(DrawInstruction::NewPage);
        self.cursor = self.geometry.top();
    }

    /// Start a new page when the cursor has dropped below the bottom threshold.
    pub fn ensure_space(&mut self) {
        if self.cursor < self.geometry.bottom_threshold {
            self.new_page();
        }
    }

    pub fn measurer(&self) -> &'a M {
        self.measurer
    }

    pub fn width_of(&self, text: &str, font: Font, size: f64) -> f64 {
        self.measurer.text_width(text, font, size)
    }

    /// Text at the current line.
    pub fn text(&mut self, x: f64, text: impl Into<String>, font: Font, size: f64) {
        self.instructions.push(DrawInstruction::Text {
            x,
            y: self.cursor,
            text: text.into(),
            font,
            size,
        });
    }

    /// Text with a rule drawn just under its baseline.
    pub fn underlined_text(&mut self, x: f64, text: impl Into<String>, font: Font, size: f64) {
        let text = text.into();
        let width = self.width_of(&text, font, size);
        let y = self.cursor - 2.0;
        self.text(x, text, font, size);
        self.line((x, y), (x + width, y), 0.75);
    }

    /// Text whose right edge sits on the right margin.
    pub fn right_aligned_text(&mut self, text: impl Into<String>, font: Font, size: f64) {
        let text = text.into();
        let x = self.geometry.width - self.geometry.margin - self.width_of(&text, font, size);
        self.text(x, text, font, size);
    }

    pub fn line(&mut self, from: (f64, f64), to: (f64, f64), thickness: f64) {
        self.instructions
            .push(DrawInstruction::Line { from, to, thickness });
    }

    pub fn rect(&mut self, x: f64, y: f64, width: f64, height: f64, thickness: f64) {
        self.instructions.push(DrawInstruction::Rect {
            x,
            y,
            width,
            height,
            thickness,
        });
    }

    pub fn advance(&mut self, amount: f64) {
        self.cursor -= amount;
    }

    pub fn next_line(&mut self) {
        self.advance(self.geometry.line_height);
    }

    pub fn finish(self) -> Vec<DrawInstruction> {
        self.instructions
    }
}
