//! CSV row schemas and import report types.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors raised by CSV parsing or writing as a whole.
///
/// Per-row problems never surface here; they are collected in the
/// [`ImportReport`] instead.
#[derive(Debug, Error)]
pub enum ImportExportError {
    /// The file could not be read as CSV at all.
    #[error("invalid CSV file: {0}")]
    InvalidFile(String),

    /// Writing CSV output failed.
    #[error("failed to write CSV: {0}")]
    Write(String),
}

/// Customer row schema for import and export.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CustomerRow {
    /// Customer display name.
    pub name: String,
    /// Contact email, the duplicate-detection key.
    pub email: String,
    /// Phone number.
    #[serde(default)]
    pub phone: Option<String>,
    /// Street address.
    #[serde(default)]
    pub address_line1: Option<String>,
    /// Address supplement.
    #[serde(default)]
    pub address_line2: Option<String>,
    /// City.
    #[serde(default)]
    pub city: Option<String>,
    /// Postal code.
    #[serde(default)]
    pub postal_code: Option<String>,
    /// Country.
    #[serde(default)]
    pub country: Option<String>,
    /// Free-form notes.
    #[serde(default)]
    pub notes: Option<String>,
}

/// Catalog item row schema for import and export.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ItemRow {
    /// Item name.
    pub name: String,
    /// Item description.
    #[serde(default)]
    pub description: Option<String>,
    /// Unit of sale (e.g. "hour", "piece").
    #[serde(default)]
    pub unit: Option<String>,
    /// Price per unit.
    pub unit_price: Decimal,
    /// ISO 4217 currency code.
    pub currency: String,
    /// Stock keeping unit, the duplicate-detection key when present.
    #[serde(default)]
    pub sku: Option<String>,
}

/// Invoice export row (export only; invoices are never imported).
#[derive(Debug, Clone, Serialize)]
pub struct InvoiceExportRow {
    /// Invoice number.
    pub invoice_number: String,
    /// Customer display name.
    pub customer_name: String,
    /// Invoice status.
    pub status: String,
    /// Issue date.
    pub issue_date: NaiveDate,
    /// Due date.
    pub due_date: NaiveDate,
    /// Currency code.
    pub currency: String,
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
    /// Payment date, empty while unpaid.
    pub payment_date: Option<NaiveDate>,
}

/// A problem with a single CSV row.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct RowError {
    /// 1-indexed data row number (the header is row 0).
    pub row: usize,
    /// Human-readable description.
    pub message: String,
}

/// Counters accumulated over an import run.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ImportReport {
    /// Rows accepted for insertion.
    pub accepted: usize,
    /// Rows skipped as duplicates.
    pub skipped: usize,
    /// Rows rejected with an error.
    pub errors: Vec<RowError>,
}

/// Parsed rows plus the accompanying report.
#[derive(Debug, Clone)]
pub struct ImportOutcome<T> {
    /// Valid, deduplicated rows in file order.
    pub rows: Vec<T>,
    /// Skip/error accounting for the response payload.
    pub report: ImportReport,
}
