//! Property-based tests for document total calculation.

use proptest::prelude::*;
use rust_decimal::Decimal;

use super::totals::calculate_totals;
use super::types::LineItemInput;

/// Strategy to generate positive quantities (0.01 to 10,000.00).
fn quantity() -> impl Strategy<Value = Decimal> {
    (1i64..1_000_000i64).prop_map(|v| Decimal::new(v, 2))
}

/// Strategy to generate non-negative unit prices (0.00 to 100,000.00).
fn unit_price() -> impl Strategy<Value = Decimal> {
    (0i64..10_000_000i64).prop_map(|v| Decimal::new(v, 2))
}

/// Strategy to generate tax rates (0.00 to 100.00).
fn tax_rate() -> impl Strategy<Value = Decimal> {
    (0i64..=10_000i64).prop_map(|v| Decimal::new(v, 2))
}

fn lines() -> impl Strategy<Value = Vec<LineItemInput>> {
    prop::collection::vec((quantity(), unit_price()), 1..20).prop_map(|pairs| {
        pairs
            .into_iter()
            .enumerate()
            .map(|(i, (quantity, unit_price))| LineItemInput {
                description: format!("line {i}"),
                quantity,
                unit_price,
            })
            .collect()
    })
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(200))]

    /// Subtotal equals the sum of the reported line totals.
    #[test]
    fn prop_subtotal_is_sum_of_line_totals(lines in lines(), rate in tax_rate()) {
        let totals = calculate_totals(&lines, Decimal::ZERO, rate).unwrap();
        let sum: Decimal = totals.line_totals.iter().copied().sum();
        prop_assert_eq!(totals.subtotal, sum);
    }

    /// Grand total always equals subtotal - discount + tax.
    #[test]
    fn prop_total_identity(lines in lines(), rate in tax_rate()) {
        let totals = calculate_totals(&lines, Decimal::ZERO, rate).unwrap();
        prop_assert_eq!(
            totals.total,
            totals.subtotal - totals.discount_amount + totals.tax_amount
        );
    }

    /// Valid inputs never produce negative totals.
    #[test]
    fn prop_totals_non_negative(lines in lines(), rate in tax_rate()) {
        let totals = calculate_totals(&lines, Decimal::ZERO, rate).unwrap();
        prop_assert!(totals.subtotal >= Decimal::ZERO);
        prop_assert!(totals.tax_amount >= Decimal::ZERO);
        prop_assert!(totals.total >= Decimal::ZERO);
    }

    /// Tax amount is rounded to at most two decimal places.
    #[test]
    fn prop_tax_rounded_to_cents(lines in lines(), rate in tax_rate()) {
        let totals = calculate_totals(&lines, Decimal::ZERO, rate).unwrap();
        prop_assert!(totals.tax_amount.scale() <= 2);
    }
}
