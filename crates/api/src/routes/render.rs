//! Shared glue between database models and the PDF renderer.

use std::str::FromStr;

use fakturo_core::document::DocumentKind;
use fakturo_core::pdf::{
    self, CompanyInfo, CustomerInfo, DocumentRender, PdfError, RenderLine, TemplatePreset,
};
use fakturo_db::entities::{customers, user_settings};
use fakturo_db::repositories::invoice::InvoiceWithItems;
use fakturo_db::repositories::quote::QuoteWithItems;
use fakturo_db::entities::sea_orm_active_enums::InvoiceStatus;

fn address_lines(
    line1: Option<&str>,
    line2: Option<&str>,
    city: Option<&str>,
    postal_code: Option<&str>,
    country: Option<&str>,
) -> Vec<String> {
    let mut lines = Vec::new();
    if let Some(l) = line1.filter(|l| !l.is_empty()) {
        lines.push(l.to_string());
    }
    if let Some(l) = line2.filter(|l| !l.is_empty()) {
        lines.push(l.to_string());
    }
    let city_line = [postal_code, city]
        .into_iter()
        .flatten()
        .filter(|p| !p.is_empty())
        .collect::<Vec<_>>()
        .join(" ");
    if !city_line.is_empty() {
        lines.push(city_line);
    }
    if let Some(c) = country.filter(|c| !c.is_empty()) {
        lines.push(c.to_string());
    }
    lines
}

pub(crate) fn company_info(settings: Option<&user_settings::Model>) -> CompanyInfo {
    settings.map_or_else(CompanyInfo::default, |s| CompanyInfo {
        name: s.company_name.clone(),
        address_lines: address_lines(
            s.company_address_line1.as_deref(),
            s.company_address_line2.as_deref(),
            s.company_city.as_deref(),
            s.company_postal_code.as_deref(),
            s.company_country.as_deref(),
        ),
        tax_id: s.tax_id.clone(),
        email: s.company_email.clone(),
    })
}

pub(crate) fn customer_info(customer: &customers::Model) -> CustomerInfo {
    CustomerInfo {
        name: customer.name.clone(),
        address_lines: address_lines(
            customer.address_line1.as_deref(),
            customer.address_line2.as_deref(),
            customer.city.as_deref(),
            customer.postal_code.as_deref(),
            customer.country.as_deref(),
        ),
        email: customer.email.clone(),
    }
}

pub(crate) fn template_for(settings: Option<&user_settings::Model>) -> TemplatePreset {
    settings
        .and_then(|s| TemplatePreset::from_str(&s.pdf_template).ok())
        .unwrap_or_default()
}

pub(crate) fn render_invoice_pdf(
    invoice: &InvoiceWithItems,
    customer: &customers::Model,
    settings: Option<&user_settings::Model>,
) -> Result<Vec<u8>, PdfError> {
    let doc = DocumentRender {
        kind: DocumentKind::Invoice,
        number: invoice.invoice.invoice_number.clone(),
        issue_date: invoice.invoice.issue_date,
        secondary_date: Some(invoice.invoice.due_date),
        company: company_info(settings),
        customer: customer_info(customer),
        currency: invoice.invoice.currency.clone(),
        lines: invoice
            .items
            .iter()
            .map(|i| RenderLine {
                description: i.description.clone(),
                quantity: i.quantity,
                unit_price: i.unit_price,
                line_total: i.line_total,
            })
            .collect(),
        subtotal: invoice.invoice.subtotal,
        discount_amount: invoice.invoice.discount_amount,
        tax_rate: invoice.invoice.tax_rate,
        tax_amount: invoice.invoice.tax_amount,
        total: invoice.invoice.total,
        notes: invoice.invoice.notes.clone(),
        paid: invoice.invoice.status == InvoiceStatus::Paid,
    };

    pdf::render_document(&doc, template_for(settings))
}

pub(crate) fn render_quote_pdf(
    quote: &QuoteWithItems,
    customer: &customers::Model,
    settings: Option<&user_settings::Model>,
) -> Result<Vec<u8>, PdfError> {
    let doc = DocumentRender {
        kind: DocumentKind::Quote,
        number: quote.quote.quote_number.clone(),
        issue_date: quote.quote.issue_date,
        secondary_date: quote.quote.valid_until,
        company: company_info(settings),
        customer: customer_info(customer),
        currency: quote.quote.currency.clone(),
        lines: quote
            .items
            .iter()
            .map(|i| RenderLine {
                description: i.description.clone(),
                quantity: i.quantity,
                unit_price: i.unit_price,
                line_total: i.line_total,
            })
            .collect(),
        subtotal: quote.quote.subtotal,
        discount_amount: quote.quote.discount_amount,
        tax_rate: quote.quote.tax_rate,
        tax_amount: quote.quote.tax_amount,
        total: quote.quote.total,
        notes: quote.quote.notes.clone(),
        paid: false,
    };

    pdf::render_document(&doc, template_for(settings))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_address_lines_skips_empty_parts() {
        let lines = address_lines(Some("1 Main St"), None, Some("Springfield"), Some("12345"), None);
        assert_eq!(lines, vec!["1 Main St".to_string(), "12345 Springfield".to_string()]);
    }

    #[test]
    fn test_template_defaults_to_classic() {
        assert_eq!(template_for(None), TemplatePreset::Classic);
    }
}
