//! CSV export with fixed column schemas.

use csv::Writer;
use serde::Serialize;

use super::types::{CustomerRow, ImportExportError, InvoiceExportRow, ItemRow};

fn write_rows<T: Serialize>(rows: &[T]) -> Result<Vec<u8>, ImportExportError> {
    let mut writer = Writer::from_writer(Vec::new());

    for row in rows {
        writer
            .serialize(row)
            .map_err(|e| ImportExportError::Write(e.to_string()))?;
    }

    writer
        .into_inner()
        .map_err(|e| ImportExportError::Write(e.to_string()))
}

/// Serializes customers into CSV bytes (with header row).
///
/// # Errors
///
/// Returns an error if serialization fails.
pub fn customers_to_csv(rows: &[CustomerRow]) -> Result<Vec<u8>, ImportExportError> {
    write_rows(rows)
}

/// Serializes catalog items into CSV bytes (with header row).
///
/// # Errors
///
/// Returns an error if serialization fails.
pub fn items_to_csv(rows: &[ItemRow]) -> Result<Vec<u8>, ImportExportError> {
    write_rows(rows)
}

/// Serializes invoices into CSV bytes (with header row).
///
/// # Errors
///
/// Returns an error if serialization fails.
pub fn invoices_to_csv(rows: &[InvoiceExportRow]) -> Result<Vec<u8>, ImportExportError> {
    write_rows(rows)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::import_export::parse_customers_csv;
    use chrono::NaiveDate;
    use rust_decimal_macros::dec;
    use std::collections::HashSet;

    #[test]
    fn test_customer_export_round_trips_through_import() {
        let rows = vec![CustomerRow {
            name: "Acme Corp".to_string(),
            email: "billing@acme.test".to_string(),
            phone: Some("+1 555 0100".to_string()),
            address_line1: Some("1 Main St".to_string()),
            address_line2: None,
            city: Some("Springfield".to_string()),
            postal_code: Some("12345".to_string()),
            country: Some("US".to_string()),
            notes: None,
        }];

        let bytes = customers_to_csv(&rows).unwrap();
        let outcome = parse_customers_csv(&bytes, &HashSet::new()).unwrap();

        assert_eq!(outcome.rows.len(), 1);
        assert_eq!(outcome.rows[0].email, "billing@acme.test");
        assert_eq!(outcome.rows[0].city.as_deref(), Some("Springfield"));
    }

    #[test]
    fn test_invoice_export_headers() {
        let rows = vec![InvoiceExportRow {
            invoice_number: "INV-2026-0001".to_string(),
            customer_name: "Acme Corp".to_string(),
            status: "paid".to_string(),
            issue_date: NaiveDate::from_ymd_opt(2026, 1, 10).unwrap(),
            due_date: NaiveDate::from_ymd_opt(2026, 1, 24).unwrap(),
            currency: "EUR".to_string(),
            subtotal: dec!(960.00),
            discount_amount: dec!(60.00),
            tax_rate: dec!(19),
            tax_amount: dec!(171.00),
            total: dec!(1071.00),
            payment_date: Some(NaiveDate::from_ymd_opt(2026, 1, 20).unwrap()),
        }];

        let bytes = invoices_to_csv(&rows).unwrap();
        let text = String::from_utf8(bytes).unwrap();
        let mut lines = text.lines();

        assert_eq!(
            lines.next().unwrap(),
            "invoice_number,customer_name,status,issue_date,due_date,currency,subtotal,discount_amount,tax_rate,tax_amount,total,payment_date"
        );
        assert!(lines.next().unwrap().starts_with("INV-2026-0001,Acme Corp,paid,2026-01-10"));
    }

    #[test]
    fn test_empty_export_has_no_rows() {
        let bytes = items_to_csv(&[]).unwrap();
        // csv::Writer only emits the header once a record is written.
        assert!(bytes.is_empty());
    }
}
