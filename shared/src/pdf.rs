//! PDF rendering of layout instructions via `printpdf`.
//!
//! Text is set in the built-in Helvetica faces, so characters those fonts
//! cannot encode are drawn as `?`, the same substitute the measurer uses.

use printpdf::{
    BuiltinFont, IndirectFontRef, Line, Mm, PdfDocument, PdfDocumentReference, PdfLayerReference,
    Point, Pt,
};
use std::io::BufWriter;

use crate::config::PageGeometry;
use crate::report::layout::{drawable_char, DrawInstruction, Font};
use crate::{Error, Result};

const LAYER_NAME: &str = "Layer 1";

fn mm(points: f64) -> Mm {
    Mm::from(Pt(points as f32))
}

fn point((x, y): (f64, f64)) -> (Point, bool) {
    (Point::new(mm(x), mm(y)), false)
}

fn pdf_error(e: printpdf::Error) -> Error {
    Error::Internal(format!("PDF rendering failed: {}", e))
}

/// Number of pages `instructions` lay out.
pub fn page_count(instructions: &[DrawInstruction]) -> usize {
    1 + instructions
        .iter()
        .filter(|i| matches!(i, DrawInstruction::NewPage))
        .count()
}

/// The current page's layer plus the two fonts.
struct Pages {
    doc: PdfDocumentReference,
    layer: PdfLayerReference,
    regular: IndirectFontRef,
    bold: IndirectFontRef,
    width: Mm,
    height: Mm,
}

impl Pages {
    fn new(title: &str, geometry: &PageGeometry) -> Result<Self> {
        let (width, height) = (mm(geometry.width), mm(geometry.height));
        let (doc, page, layer) = PdfDocument::new(title, width, height, LAYER_NAME);
        let layer = doc.get_page(page).get_layer(layer);
        let regular = doc.add_builtin_font(BuiltinFont::Helvetica).map_err(pdf_error)?;
        let bold = doc.add_builtin_font(BuiltinFont::HelveticaBold).map_err(pdf_error)?;

        Ok(Self {
            doc,
            layer,
            regular,
            bold,
            width,
            height,
        })
    }

    fn draw(&mut self, instruction: &DrawInstruction) {
        match instruction {
            DrawInstruction::NewPage => {
                let (page, layer) = self.doc.add_page(self.width, self.height, LAYER_NAME);
                self.layer = self.doc.get_page(page).get_layer(layer);
            }
            DrawInstruction::Text { x, y, text, font, size } => {
                let font = match font {
                    Font::Regular => &self.regular,
                    Font::Bold => &self.bold,
                };
                let text: String = text.chars().map(drawable_char).collect();
                self.layer.use_text(text, *size as f32, mm(*x), mm(*y), font);
            }
            DrawInstruction::Line { from, to, thickness } => {
                self.layer.set_outline_thickness(*thickness as f32);
                self.layer.add_line(Line {
                    points: vec![point(*from), point(*to)],
                    is_closed: false,
                });
            }
            DrawInstruction::Rect { x, y, width, height, thickness } => {
                self.layer.set_outline_thickness(*thickness as f32);
                self.layer.add_line(Line {
                    points: vec![
                        point((*x, *y)),
                        point((*x + *width, *y)),
                        point((*x + *width, *y + *height)),
                        point((*x, *y + *height)),
                    ],
                    is_closed: true,
                });
            }
        }
    }

    fn save(self) -> Result<Vec<u8>> {
        let mut writer = BufWriter::new(Vec::<u8>::new());
        self.doc.save(&mut writer).map_err(pdf_error)?;
        writer
            .into_inner()
            .map_err(|e| Error::Internal(format!("Failed to flush PDF: {}", e)))
    }
}

/// Render `instructions` into a PDF document titled `title`.
pub fn render_pdf(
    title: &str,
    instructions: &[DrawInstruction],
    geometry: &PageGeometry,
) -> Result<Vec<u8>> {
    let mut pages = Pages::new(title, geometry)?;
    for instruction in instructions {
        pages.draw(instruction);
    }
    pages.save()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn text(x: f64, y: f64, text: &str) -> DrawInstruction {
        DrawInstruction::Text {
            x,
            y,
            text: text.to_string(),
            font: Font::Regular,
            size: 11.0,
        }
    }

    #[test]
    fn test_renders_pdf_document() {
        let pdf = render_pdf("Invoice", &[text(50.0, 742.0, "Hello")], &PageGeometry::default()).unwrap();
        assert!(pdf.starts_with(b"%PDF-"));
        assert!(String::from_utf8_lossy(&pdf).trim_end().ends_with("%%EOF"));
    }

    #[test]
    fn test_new_page_instructions_add_pages() {
        let instructions = vec![
            text(50.0, 742.0, "one"),
            DrawInstruction::NewPage,
            text(50.0, 742.0, "two (café)"),
            DrawInstruction::NewPage,
            DrawInstruction::Line { from: (50.0, 700.0), to: (562.0, 700.0), thickness: 0.75 },
            DrawInstruction::Rect { x: 50.0, y: 600.0, width: 512.0, height: 20.0, thickness: 1.0 },
        ];
        assert_eq!(page_count(&instructions), 3);

        let three_pages = render_pdf("Log", &instructions, &PageGeometry::default()).unwrap();
        let one_page = render_pdf("Log", &instructions[..1], &PageGeometry::default()).unwrap();
        assert!(three_pages.starts_with(b"%PDF-"));
        assert!(three_pages.len() > one_page.len());
    }

    #[test]
    fn test_points_convert_to_millimetres() {
        let Mm(letter_width) = mm(612.0);
        assert!((letter_width - 215.9).abs() < 0.01);
    }

    #[test]
    fn test_empty_instruction_list_is_one_blank_page() {
        assert_eq!(page_count(&[]), 1);
        assert!(render_pdf("Blank", &[], &PageGeometry::default()).is_ok());
    }
}
