//! Document error types.

use rust_decimal::Decimal;
use thiserror::Error;

/// Errors raised while validating document line items and totals.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DocumentError {
    /// Line quantity must be strictly positive.
    #[error("Line {0}: quantity must be greater than zero, got {1}")]
    InvalidQuantity(usize, Decimal),

    /// Line unit price must not be negative.
    #[error("Line {0}: unit price must not be negative, got {1}")]
    NegativeUnitPrice(usize, Decimal),

    /// Line description must not be empty.
    #[error("Line {0}: description must not be empty")]
    EmptyDescription(usize),

    /// Discount must be between zero and the subtotal.
    #[error("Discount {discount} is outside the valid range [0, {subtotal}]")]
    DiscountOutOfRange {
        /// Requested discount amount.
        discount: Decimal,
        /// Document subtotal the discount applies to.
        subtotal: Decimal,
    },

    /// Tax rate must be a percentage between 0 and 100.
    #[error("Tax rate must be between 0 and 100, got {0}")]
    TaxRateOutOfRange(Decimal),
}
