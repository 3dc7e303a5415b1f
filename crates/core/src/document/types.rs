//! Document value types.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// One line of a quote or invoice as submitted by the client.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LineItemInput {
    /// Free-text description (defaults to the catalog item name).
    pub description: String,
    /// Quantity, strictly positive.
    pub quantity: Decimal,
    /// Unit price, non-negative.
    pub unit_price: Decimal,
}

/// Computed totals for a quote or invoice.
///
/// `total = subtotal - discount_amount + tax_amount` where
/// `tax_amount = (subtotal - discount_amount) * tax_rate / 100`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentTotals {
    /// Sum of all line totals.
    pub subtotal: Decimal,
    /// Flat discount subtracted from the subtotal.
    pub discount_amount: Decimal,
    /// Tax rate as a percentage.
    pub tax_rate: Decimal,
    /// Tax applied to the discounted subtotal.
    pub tax_amount: Decimal,
    /// Grand total.
    pub total: Decimal,
    /// Per-line totals in input order.
    pub line_totals: Vec<Decimal>,
}
