//! Document layout and rendering.
//!
//! Geometry here is f32 millimetres for printpdf, not money; monetary
//! values are formatted from `Decimal` as strings and never converted
//! to floats.
#![allow(clippy::float_arithmetic)]
#![allow(clippy::cast_precision_loss)]

use printpdf::path::PaintMode;
use printpdf::{
    Color, IndirectFontRef, Line, Mm, PdfDocument, PdfDocumentReference,
    PdfLayerReference, Point, Rect, Rgb,
};
use rust_decimal::Decimal;

use super::error::PdfError;
use super::template::{TemplatePreset, TemplateStyle};
use super::{DocumentRender, RenderLine};

const PAGE_WIDTH: f32 = 210.0;
const PAGE_HEIGHT: f32 = 297.0;
const MARGIN: f32 = 20.0;
const RIGHT_EDGE: f32 = PAGE_WIDTH - MARGIN;

// Column x positions of the item table.
const COL_QTY: f32 = 120.0;
const COL_UNIT_PRICE: f32 = 150.0;
const COL_AMOUNT: f32 = RIGHT_EDGE;

/// Approximate rendered width of a string in millimetres.
///
/// The base-14 fonts ship without metrics in printpdf, so right
/// alignment uses an average glyph width. Good enough for numeric
/// columns.
fn text_width_mm(text: &str, font_size: f32) -> f32 {
    let avg_glyph_em = 0.5;
    let pt_to_mm = 0.352_778;
    text.chars().count() as f32 * font_size * avg_glyph_em * pt_to_mm
}

fn rgb(c: (f32, f32, f32)) -> Color {
    Color::Rgb(Rgb::new(c.0, c.1, c.2, None))
}

fn format_amount(value: Decimal) -> String {
    format!("{:.2}", value.round_dp(2))
}

fn format_quantity(value: Decimal) -> String {
    value.normalize().to_string()
}

struct Fonts {
    body: IndirectFontRef,
    bold: IndirectFontRef,
}

struct PageCursor {
    layer: PdfLayerReference,
    y: f32,
}

struct Renderer<'a> {
    doc: &'a DocumentRender,
    style: TemplateStyle,
    fonts: Fonts,
}

impl Renderer<'_> {
    fn text(&self, cursor: &PageCursor, text: &str, size: f32, x: f32, bold: bool) {
        let font = if bold { &self.fonts.bold } else { &self.fonts.body };
        cursor
            .layer
            .use_text(text, size, Mm(x), Mm(cursor.y), font);
    }

    fn text_right(&self, cursor: &PageCursor, text: &str, size: f32, right_x: f32, bold: bool) {
        let x = right_x - text_width_mm(text, size);
        self.text(cursor, text, size, x, bold);
    }

    fn set_color(&self, cursor: &PageCursor, color: (f32, f32, f32)) {
        cursor.layer.set_fill_color(rgb(color));
    }

    fn rule(&self, cursor: &PageCursor, y: f32, thickness: f32) {
        cursor.layer.set_outline_color(rgb(self.style.accent));
        cursor.layer.set_outline_thickness(thickness);
        cursor.layer.add_line(Line {
            points: vec![
                (Point::new(Mm(MARGIN), Mm(y)), false),
                (Point::new(Mm(RIGHT_EDGE), Mm(y)), false),
            ],
            is_closed: false,
        });
    }

    fn table_header(&self, cursor: &mut PageCursor) {
        self.set_color(cursor, self.style.muted);
        self.text(cursor, "Description", self.style.small_size, MARGIN, true);
        self.text_right(cursor, "Qty", self.style.small_size, COL_QTY, true);
        self.text_right(
            cursor,
            "Unit price",
            self.style.small_size,
            COL_UNIT_PRICE,
            true,
        );
        self.text_right(cursor, "Amount", self.style.small_size, COL_AMOUNT, true);
        self.rule(cursor, cursor.y - 1.5, 0.4);
        cursor.y -= self.style.row_height;
        self.set_color(cursor, self.style.text);
    }

    fn table_row(&self, cursor: &mut PageCursor, line: &RenderLine) {
        let mut description = line.description.clone();
        // Keep long descriptions inside the column.
        if description.chars().count() > 52 {
            description = description.chars().take(49).collect::<String>() + "...";
        }

        self.text(cursor, &description, self.style.body_size, MARGIN, false);
        self.text_right(
            cursor,
            &format_quantity(line.quantity),
            self.style.body_size,
            COL_QTY,
            false,
        );
        self.text_right(
            cursor,
            &format_amount(line.unit_price),
            self.style.body_size,
            COL_UNIT_PRICE,
            false,
        );
        self.text_right(
            cursor,
            &format_amount(line.line_total),
            self.style.body_size,
            COL_AMOUNT,
            false,
        );
        cursor.y -= self.style.row_height;
    }

    fn totals_row(
        &self,
        cursor: &mut PageCursor,
        label: &str,
        value: &str,
        bold: bool,
        color: (f32, f32, f32),
    ) {
        self.set_color(cursor, color);
        self.text_right(cursor, label, self.style.body_size, COL_UNIT_PRICE, bold);
        self.text_right(cursor, value, self.style.body_size, COL_AMOUNT, bold);
        cursor.y -= self.style.row_height;
    }

    fn totals_block(&self, cursor: &mut PageCursor) {
        self.totals_row(
            cursor,
            "Subtotal",
            &format!("{} {}", self.doc.currency, format_amount(self.doc.subtotal)),
            false,
            self.style.text,
        );

        if !self.doc.discount_amount.is_zero() {
            self.totals_row(
                cursor,
                "Discount",
                &format!(
                    "-{} {}",
                    self.doc.currency,
                    format_amount(self.doc.discount_amount)
                ),
                false,
                self.style.text,
            );
        }

        if !self.doc.tax_rate.is_zero() {
            self.totals_row(
                cursor,
                &format!("Tax ({}%)", self.doc.tax_rate.normalize()),
                &format!(
                    "{} {}",
                    self.doc.currency,
                    format_amount(self.doc.tax_amount)
                ),
                false,
                self.style.text,
            );
        }

        cursor.y -= 1.0;
        self.rule(cursor, cursor.y + self.style.row_height - 2.0, 0.6);
        self.totals_row(
            cursor,
            "Total",
            &format!("{} {}", self.doc.currency, format_amount(self.doc.total)),
            true,
            self.style.accent,
        );

        if self.doc.paid {
            self.set_color(cursor, self.style.accent);
            self.text_right(cursor, "PAID", self.style.title_size * 0.6, COL_AMOUNT, true);
            cursor.y -= self.style.row_height;
        }

        self.set_color(cursor, self.style.text);
    }
}

/// Renders a quote or invoice to PDF bytes using the given preset.
///
/// Line items paginate automatically; the table header repeats on
/// continuation pages.
///
/// # Errors
///
/// Returns an error if font registration or PDF serialization fails.
pub fn render_document(
    document: &DocumentRender,
    preset: TemplatePreset,
) -> Result<Vec<u8>, PdfError> {
    let style = preset.style();
    let title = format!("{} {}", document.title(), document.number);

    let (pdf, page, layer) = PdfDocument::new(&title, Mm(PAGE_WIDTH), Mm(PAGE_HEIGHT), "Page 1");
    let fonts = Fonts {
        body: pdf
            .add_builtin_font(style.body_font)
            .map_err(|e| PdfError::Font(e.to_string()))?,
        bold: pdf
            .add_builtin_font(style.bold_font)
            .map_err(|e| PdfError::Font(e.to_string()))?,
    };

    let renderer = Renderer {
        doc: document,
        style,
        fonts,
    };

    let mut cursor = PageCursor {
        layer: pdf.get_page(page).get_layer(layer),
        y: PAGE_HEIGHT - MARGIN,
    };

    render_header(&renderer, &mut cursor);
    render_parties(&renderer, &mut cursor);

    renderer.table_header(&mut cursor);
    let mut page_count = 1;
    for line in &renderer.doc.lines {
        if cursor.y < MARGIN + 35.0 {
            page_count += 1;
            cursor = new_page(&pdf, &renderer, page_count);
            renderer.table_header(&mut cursor);
        }
        renderer.table_row(&mut cursor, line);
    }

    cursor.y -= renderer.style.row_height;
    if cursor.y < MARGIN + 40.0 {
        page_count += 1;
        cursor = new_page(&pdf, &renderer, page_count);
    }
    renderer.totals_block(&mut cursor);

    if let Some(notes) = renderer
        .doc
        .notes
        .as_deref()
        .filter(|n| !n.trim().is_empty())
    {
        cursor.y -= renderer.style.row_height;
        renderer.set_color(&cursor, renderer.style.muted);
        renderer.text(&cursor, "Notes", renderer.style.small_size, MARGIN, true);
        cursor.y -= renderer.style.row_height * 0.8;
        renderer.set_color(&cursor, renderer.style.text);
        for chunk in notes.lines().take(6) {
            renderer.text(&cursor, chunk, renderer.style.small_size, MARGIN, false);
            cursor.y -= renderer.style.row_height * 0.8;
        }
    }

    pdf.save_to_bytes().map_err(|e| PdfError::Write(e.to_string()))
}

fn new_page(pdf: &PdfDocumentReference, renderer: &Renderer<'_>, number: usize) -> PageCursor {
    let (page, layer) = pdf.add_page(Mm(PAGE_WIDTH), Mm(PAGE_HEIGHT), format!("Page {number}"));
    let cursor = PageCursor {
        layer: pdf.get_page(page).get_layer(layer),
        y: PAGE_HEIGHT - MARGIN,
    };
    renderer.set_color(&cursor, renderer.style.text);
    cursor
}

fn render_header(renderer: &Renderer<'_>, cursor: &mut PageCursor) {
    let style = &renderer.style;

    if style.header_band {
        cursor.layer.set_fill_color(rgb(style.accent));
        cursor.layer.add_rect(
            Rect::new(
                Mm(0.0),
                Mm(PAGE_HEIGHT - 14.0),
                Mm(PAGE_WIDTH),
                Mm(PAGE_HEIGHT),
            )
            .with_mode(PaintMode::Fill),
        );
        cursor.y -= 6.0;
    }

    renderer.set_color(cursor, style.accent);
    renderer.text(cursor, renderer.doc.title(), style.title_size, MARGIN, true);

    renderer.set_color(cursor, style.text);
    renderer.text_right(
        cursor,
        &renderer.doc.company.name,
        style.body_size,
        RIGHT_EDGE,
        true,
    );
    cursor.y -= style.row_height * 0.8;

    for line in &renderer.doc.company.address_lines {
        renderer.set_color(cursor, style.muted);
        renderer.text_right(cursor, line, style.small_size, RIGHT_EDGE, false);
        cursor.y -= style.row_height * 0.7;
    }
    if let Some(tax_id) = renderer.doc.company.tax_id.as_deref() {
        renderer.text_right(
            cursor,
            &format!("Tax ID {tax_id}"),
            style.small_size,
            RIGHT_EDGE,
            false,
        );
        cursor.y -= style.row_height * 0.7;
    }

    renderer.set_color(cursor, style.muted);
    renderer.text(cursor, &renderer.doc.number, style.body_size, MARGIN, false);
    cursor.y -= style.row_height * 1.5;
    renderer.set_color(cursor, style.text);
}

fn render_parties(renderer: &Renderer<'_>, cursor: &mut PageCursor) {
    let style = &renderer.style;
    let top = cursor.y;

    renderer.set_color(cursor, style.muted);
    renderer.text(cursor, "Bill to", style.small_size, MARGIN, true);
    cursor.y -= style.row_height * 0.9;

    renderer.set_color(cursor, style.text);
    renderer.text(cursor, &renderer.doc.customer.name, style.body_size, MARGIN, true);
    cursor.y -= style.row_height * 0.8;
    for line in &renderer.doc.customer.address_lines {
        renderer.text(cursor, line, style.small_size, MARGIN, false);
        cursor.y -= style.row_height * 0.7;
    }
    if let Some(email) = renderer.doc.customer.email.as_deref() {
        renderer.text(cursor, email, style.small_size, MARGIN, false);
        cursor.y -= style.row_height * 0.7;
    }
    let after_customer = cursor.y;

    // Date block on the right, aligned with the top of the customer block.
    cursor.y = top;
    renderer.set_color(cursor, style.muted);
    renderer.text_right(
        cursor,
        &format!("Issued {}", renderer.doc.issue_date),
        style.small_size,
        RIGHT_EDGE,
        false,
    );
    cursor.y -= style.row_height * 0.8;
    if let Some(date) = renderer.doc.secondary_date {
        renderer.text_right(
            cursor,
            &format!("{} {date}", renderer.doc.secondary_date_label()),
            style.small_size,
            RIGHT_EDGE,
            false,
        );
        cursor.y -= style.row_height * 0.8;
    }

    cursor.y = after_customer.min(cursor.y) - style.row_height;
    renderer.set_color(cursor, style.text);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::DocumentKind;
    use crate::pdf::{CompanyInfo, CustomerInfo};
    use chrono::NaiveDate;
    use rust_decimal_macros::dec;

    fn sample(lines: usize) -> DocumentRender {
        DocumentRender {
            kind: DocumentKind::Invoice,
            number: "INV-2026-0001".to_string(),
            issue_date: NaiveDate::from_ymd_opt(2026, 1, 10).unwrap(),
            secondary_date: NaiveDate::from_ymd_opt(2026, 1, 24),
            company: CompanyInfo {
                name: "Fakturo GmbH".to_string(),
                address_lines: vec!["Musterstr. 1".to_string(), "10115 Berlin".to_string()],
                tax_id: Some("DE123456789".to_string()),
                email: None,
            },
            customer: CustomerInfo {
                name: "Acme Corp".to_string(),
                address_lines: vec!["1 Main St".to_string()],
                email: Some("billing@acme.test".to_string()),
            },
            currency: "EUR".to_string(),
            lines: (0..lines)
                .map(|i| RenderLine {
                    description: format!("Service line {i}"),
                    quantity: dec!(2),
                    unit_price: dec!(50.00),
                    line_total: dec!(100.00),
                })
                .collect(),
            subtotal: dec!(100.00),
            discount_amount: dec!(0),
            tax_rate: dec!(19),
            tax_amount: dec!(19.00),
            total: dec!(119.00),
            notes: Some("Payment within 14 days.".to_string()),
            paid: false,
        }
    }

    #[test]
    fn test_render_produces_pdf_bytes() {
        let bytes = render_document(&sample(3), TemplatePreset::Classic).unwrap();
        assert!(bytes.starts_with(b"%PDF"));
        assert!(bytes.len() > 500);
    }

    #[test]
    fn test_all_presets_render() {
        for preset in TemplatePreset::ALL {
            let bytes = render_document(&sample(5), preset).unwrap();
            assert!(bytes.starts_with(b"%PDF"), "preset {preset} failed");
        }
    }

    #[test]
    fn test_long_documents_paginate() {
        let short = render_document(&sample(3), TemplatePreset::Compact).unwrap();
        let long = render_document(&sample(120), TemplatePreset::Compact).unwrap();
        assert!(long.len() > short.len());
    }

    #[test]
    fn test_paid_stamp_renders() {
        let mut doc = sample(2);
        doc.paid = true;
        let bytes = render_document(&doc, TemplatePreset::Modern).unwrap();
        assert!(bytes.starts_with(b"%PDF"));
    }

    #[test]
    fn test_quote_renders_with_valid_until() {
        let mut doc = sample(2);
        doc.kind = DocumentKind::Quote;
        doc.number = "Q-2026-0001".to_string();
        let bytes = render_document(&doc, TemplatePreset::Classic).unwrap();
        assert!(bytes.starts_with(b"%PDF"));
    }

    #[test]
    fn test_text_width_monotonic() {
        assert!(text_width_mm("longer text", 10.0) > text_width_mm("short", 10.0));
    }
}
