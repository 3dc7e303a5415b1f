//! Total calculation for quotes and invoices.
//!
//! Totals are always recomputed server-side from the line items; totals
//! submitted by clients are ignored.

use rust_decimal::Decimal;

use super::error::DocumentError;
use super::types::{DocumentTotals, LineItemInput};

/// Calculates a single line total: `quantity * unit_price`, rounded to
/// two decimal places with banker's rounding.
#[must_use]
pub fn line_total(quantity: Decimal, unit_price: Decimal) -> Decimal {
    (quantity * unit_price).round_dp(2)
}

/// Calculates document totals from line items, a flat discount, and a
/// percentage tax rate.
///
/// An empty line list is valid (drafts may be created before items are
/// added) and yields all-zero totals, though the discount must then also
/// be zero.
///
/// # Errors
///
/// Returns a `DocumentError` when a quantity is not positive, a unit price
/// is negative, a description is empty, the discount exceeds the subtotal,
/// or the tax rate is outside `[0, 100]`.
pub fn calculate_totals(
    lines: &[LineItemInput],
    discount_amount: Decimal,
    tax_rate: Decimal,
) -> Result<DocumentTotals, DocumentError> {
    if tax_rate < Decimal::ZERO || tax_rate > Decimal::ONE_HUNDRED {
        return Err(DocumentError::TaxRateOutOfRange(tax_rate));
    }

    let mut line_totals = Vec::with_capacity(lines.len());
    let mut subtotal = Decimal::ZERO;

    for (index, line) in lines.iter().enumerate() {
        if line.description.trim().is_empty() {
            return Err(DocumentError::EmptyDescription(index + 1));
        }
        if line.quantity <= Decimal::ZERO {
            return Err(DocumentError::InvalidQuantity(index + 1, line.quantity));
        }
        if line.unit_price < Decimal::ZERO {
            return Err(DocumentError::NegativeUnitPrice(index + 1, line.unit_price));
        }

        let total = line_total(line.quantity, line.unit_price);
        subtotal += total;
        line_totals.push(total);
    }

    if discount_amount < Decimal::ZERO || discount_amount > subtotal {
        return Err(DocumentError::DiscountOutOfRange {
            discount: discount_amount,
            subtotal,
        });
    }

    let taxable = subtotal - discount_amount;
    let tax_amount = (taxable * tax_rate / Decimal::ONE_HUNDRED).round_dp(2);
    let total = taxable + tax_amount;

    Ok(DocumentTotals {
        subtotal,
        discount_amount,
        tax_rate,
        tax_amount,
        total,
        line_totals,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn line(description: &str, quantity: Decimal, unit_price: Decimal) -> LineItemInput {
        LineItemInput {
            description: description.to_string(),
            quantity,
            unit_price,
        }
    }

    #[test]
    fn test_line_total_rounds_to_cents() {
        assert_eq!(line_total(dec!(3), dec!(19.99)), dec!(59.97));
        assert_eq!(line_total(dec!(0.5), dec!(99.99)), dec!(50.00));
        assert_eq!(line_total(dec!(1.5), dec!(0.333)), dec!(0.50));
    }

    #[test]
    fn test_totals_simple() {
        let lines = vec![
            line("Design work", dec!(10), dec!(85.00)),
            line("Hosting", dec!(1), dec!(25.00)),
        ];

        let totals = calculate_totals(&lines, dec!(0), dec!(0)).unwrap();

        assert_eq!(totals.subtotal, dec!(875.00));
        assert_eq!(totals.tax_amount, dec!(0));
        assert_eq!(totals.total, dec!(875.00));
        assert_eq!(totals.line_totals, vec![dec!(850.00), dec!(25.00)]);
    }

    #[test]
    fn test_totals_with_discount_and_tax() {
        let lines = vec![line("Consulting", dec!(8), dec!(120.00))];

        let totals = calculate_totals(&lines, dec!(60.00), dec!(19)).unwrap();

        // (960 - 60) * 19% = 171.00
        assert_eq!(totals.subtotal, dec!(960.00));
        assert_eq!(totals.discount_amount, dec!(60.00));
        assert_eq!(totals.tax_amount, dec!(171.00));
        assert_eq!(totals.total, dec!(1071.00));
    }

    #[test]
    fn test_totals_tax_rounding() {
        let lines = vec![line("Widget", dec!(1), dec!(9.99))];

        let totals = calculate_totals(&lines, dec!(0), dec!(7.7)).unwrap();

        // 9.99 * 7.7% = 0.76923 -> 0.77
        assert_eq!(totals.tax_amount, dec!(0.77));
        assert_eq!(totals.total, dec!(10.76));
    }

    #[test]
    fn test_totals_empty_lines() {
        let totals = calculate_totals(&[], dec!(0), dec!(19)).unwrap();

        assert_eq!(totals.subtotal, dec!(0));
        assert_eq!(totals.total, dec!(0));
        assert!(totals.line_totals.is_empty());
    }

    #[test]
    fn test_zero_quantity_rejected() {
        let lines = vec![line("Widget", dec!(0), dec!(10.00))];

        assert_eq!(
            calculate_totals(&lines, dec!(0), dec!(0)),
            Err(DocumentError::InvalidQuantity(1, dec!(0)))
        );
    }

    #[test]
    fn test_negative_unit_price_rejected() {
        let lines = vec![line("Widget", dec!(1), dec!(-5.00))];

        assert_eq!(
            calculate_totals(&lines, dec!(0), dec!(0)),
            Err(DocumentError::NegativeUnitPrice(1, dec!(-5.00)))
        );
    }

    #[test]
    fn test_empty_description_rejected() {
        let lines = vec![line("   ", dec!(1), dec!(5.00))];

        assert_eq!(
            calculate_totals(&lines, dec!(0), dec!(0)),
            Err(DocumentError::EmptyDescription(1))
        );
    }

    #[test]
    fn test_discount_larger_than_subtotal_rejected() {
        let lines = vec![line("Widget", dec!(1), dec!(50.00))];

        assert!(matches!(
            calculate_totals(&lines, dec!(60.00), dec!(0)),
            Err(DocumentError::DiscountOutOfRange { .. })
        ));
    }

    #[test]
    fn test_discount_on_empty_document_rejected() {
        assert!(matches!(
            calculate_totals(&[], dec!(1.00), dec!(0)),
            Err(DocumentError::DiscountOutOfRange { .. })
        ));
    }

    #[test]
    fn test_tax_rate_bounds() {
        let lines = vec![line("Widget", dec!(1), dec!(10.00))];

        assert!(calculate_totals(&lines, dec!(0), dec!(100)).is_ok());
        assert_eq!(
            calculate_totals(&lines, dec!(0), dec!(100.01)),
            Err(DocumentError::TaxRateOutOfRange(dec!(100.01)))
        );
        assert_eq!(
            calculate_totals(&lines, dec!(0), dec!(-1)),
            Err(DocumentError::TaxRateOutOfRange(dec!(-1)))
        );
    }
}
