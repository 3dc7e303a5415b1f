//! PDF rendering for quotes and invoices.
//!
//! Documents are laid out directly with `printpdf` using the PDF base-14
//! fonts, so no font files ship with the binary. The visual appearance is
//! selected by a named [`TemplatePreset`] stored in the user's settings.

mod error;
mod render;
mod template;

pub use error::PdfError;
pub use render::render_document;
pub use template::TemplatePreset;

use chrono::NaiveDate;
use rust_decimal::Decimal;

use crate::document::DocumentKind;

/// Company block printed in the document header.
#[derive(Debug, Clone, Default)]
pub struct CompanyInfo {
    /// Company display name.
    pub name: String,
    /// Address lines, printed in order.
    pub address_lines: Vec<String>,
    /// Tax or VAT identifier.
    pub tax_id: Option<String>,
    /// Contact email.
    pub email: Option<String>,
}

/// Customer block printed under "Bill to".
#[derive(Debug, Clone, Default)]
pub struct CustomerInfo {
    /// Customer display name.
    pub name: String,
    /// Address lines, printed in order.
    pub address_lines: Vec<String>,
    /// Contact email.
    pub email: Option<String>,
}

/// One rendered table row.
#[derive(Debug, Clone)]
pub struct RenderLine {
    /// Line description.
    pub description: String,
    /// Quantity.
    pub quantity: Decimal,
    /// Unit price.
    pub unit_price: Decimal,
    /// Line total.
    pub line_total: Decimal,
}

/// Everything needed to render one document.
#[derive(Debug, Clone)]
pub struct DocumentRender {
    /// Quote or invoice.
    pub kind: DocumentKind,
    /// Document number, e.g. `INV-2026-0042`.
    pub number: String,
    /// Issue date.
    pub issue_date: NaiveDate,
    /// Due date (invoices) or valid-until date (quotes).
    pub secondary_date: Option<NaiveDate>,
    /// Issuing company.
    pub company: CompanyInfo,
    /// Billed customer.
    pub customer: CustomerInfo,
    /// ISO 4217 currency code.
    pub currency: String,
    /// Table rows.
    pub lines: Vec<RenderLine>,
    /// Subtotal before discount and tax.
    pub subtotal: Decimal,
    /// Flat discount.
    pub discount_amount: Decimal,
    /// Tax rate percentage.
    pub tax_rate: Decimal,
    /// Tax amount.
    pub tax_amount: Decimal,
    /// Grand total.
    pub total: Decimal,
    /// Free-form notes printed under the table.
    pub notes: Option<String>,
    /// Paid flag; paid invoices get a stamp next to the total.
    pub paid: bool,
}

impl DocumentRender {
    /// Returns the heading printed at the top of the page.
    #[must_use]
    pub fn title(&self) -> &'static str {
        match self.kind {
            DocumentKind::Quote => "QUOTE",
            DocumentKind::Invoice => "INVOICE",
        }
    }

    /// Returns the label for the secondary date.
    #[must_use]
    pub fn secondary_date_label(&self) -> &'static str {
        match self.kind {
            DocumentKind::Quote => "Valid until",
            DocumentKind::Invoice => "Due date",
        }
    }
}
