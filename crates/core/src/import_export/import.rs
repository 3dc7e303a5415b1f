//! CSV import parsing with per-row validation and duplicate detection.

use std::collections::HashSet;
use std::str::FromStr;

use csv::{ReaderBuilder, Trim};
use fakturo_shared::Currency;
use rust_decimal::Decimal;

use super::types::{CustomerRow, ImportExportError, ImportOutcome, ImportReport, ItemRow, RowError};

/// Parses a customer CSV file.
///
/// Duplicate detection is by email, case-insensitively, against both the
/// caller-supplied set of existing emails and earlier rows in the same
/// file. Invalid rows are recorded in the report and skipped.
///
/// # Errors
///
/// Returns an error only when the input is not parseable as CSV at all.
pub fn parse_customers_csv(
    data: &[u8],
    existing_emails: &HashSet<String>,
) -> Result<ImportOutcome<CustomerRow>, ImportExportError> {
    let mut reader = ReaderBuilder::new().trim(Trim::All).from_reader(data);

    let mut rows = Vec::new();
    let mut report = ImportReport::default();
    let mut seen: HashSet<String> = existing_emails
        .iter()
        .map(|e| e.to_lowercase())
        .collect();

    for (index, record) in reader.deserialize::<CustomerRow>().enumerate() {
        let row_number = index + 1;

        let row = match record {
            Ok(row) => row,
            Err(e) => {
                report.errors.push(RowError {
                    row: row_number,
                    message: format!("malformed row: {e}"),
                });
                continue;
            }
        };

        if let Err(message) = validate_customer_row(&row) {
            report.errors.push(RowError {
                row: row_number,
                message,
            });
            continue;
        }

        let key = row.email.to_lowercase();
        if !seen.insert(key) {
            report.skipped += 1;
            continue;
        }

        rows.push(row);
    }

    report.accepted = rows.len();
    Ok(ImportOutcome { rows, report })
}

/// Parses a catalog item CSV file.
///
/// Duplicate detection is by SKU, case-insensitively; rows without a SKU
/// are never treated as duplicates.
///
/// # Errors
///
/// Returns an error only when the input is not parseable as CSV at all.
pub fn parse_items_csv(
    data: &[u8],
    existing_skus: &HashSet<String>,
) -> Result<ImportOutcome<ItemRow>, ImportExportError> {
    let mut reader = ReaderBuilder::new().trim(Trim::All).from_reader(data);

    let mut rows = Vec::new();
    let mut report = ImportReport::default();
    let mut seen: HashSet<String> = existing_skus.iter().map(|s| s.to_lowercase()).collect();

    for (index, record) in reader.deserialize::<ItemRow>().enumerate() {
        let row_number = index + 1;

        let row = match record {
            Ok(row) => row,
            Err(e) => {
                report.errors.push(RowError {
                    row: row_number,
                    message: format!("malformed row: {e}"),
                });
                continue;
            }
        };

        if let Err(message) = validate_item_row(&row) {
            report.errors.push(RowError {
                row: row_number,
                message,
            });
            continue;
        }

        if let Some(sku) = row.sku.as_deref().filter(|s| !s.is_empty()) {
            if !seen.insert(sku.to_lowercase()) {
                report.skipped += 1;
                continue;
            }
        }

        rows.push(row);
    }

    report.accepted = rows.len();
    Ok(ImportOutcome { rows, report })
}

fn validate_customer_row(row: &CustomerRow) -> Result<(), String> {
    if row.name.is_empty() {
        return Err("name must not be empty".to_string());
    }
    if row.email.is_empty() || !row.email.contains('@') {
        return Err(format!("invalid email: {:?}", row.email));
    }
    Ok(())
}

fn validate_item_row(row: &ItemRow) -> Result<(), String> {
    if row.name.is_empty() {
        return Err("name must not be empty".to_string());
    }
    if row.unit_price < Decimal::ZERO {
        return Err(format!("unit price must not be negative: {}", row.unit_price));
    }
    if Currency::from_str(&row.currency).is_err() {
        return Err(format!("unknown currency: {:?}", row.currency));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    const CUSTOMERS_CSV: &str = "\
name,email,phone,address_line1,address_line2,city,postal_code,country,notes
Acme Corp,billing@acme.test,+1 555 0100,1 Main St,,Springfield,12345,US,
Beta LLC,accounts@beta.test,,,,,,,
No Email,,,,,,,,\n";

    #[test]
    fn test_parse_customers_happy_path() {
        let outcome = parse_customers_csv(CUSTOMERS_CSV.as_bytes(), &HashSet::new()).unwrap();

        assert_eq!(outcome.rows.len(), 2);
        assert_eq!(outcome.report.accepted, 2);
        assert_eq!(outcome.report.skipped, 0);
        assert_eq!(outcome.report.errors.len(), 1);
        assert_eq!(outcome.report.errors[0].row, 3);
        assert_eq!(outcome.rows[0].name, "Acme Corp");
        assert_eq!(outcome.rows[0].city.as_deref(), Some("Springfield"));
    }

    #[test]
    fn test_parse_customers_skips_existing_emails() {
        let existing: HashSet<String> = ["BILLING@acme.test".to_string()].into();
        let outcome = parse_customers_csv(CUSTOMERS_CSV.as_bytes(), &existing).unwrap();

        assert_eq!(outcome.rows.len(), 1);
        assert_eq!(outcome.report.skipped, 1);
        assert_eq!(outcome.rows[0].name, "Beta LLC");
    }

    #[test]
    fn test_parse_customers_skips_in_file_duplicates() {
        let csv = "\
name,email
First,dup@example.test
Second,DUP@example.test\n";
        let outcome = parse_customers_csv(csv.as_bytes(), &HashSet::new()).unwrap();

        assert_eq!(outcome.rows.len(), 1);
        assert_eq!(outcome.report.skipped, 1);
        assert_eq!(outcome.rows[0].name, "First");
    }

    #[test]
    fn test_parse_items_validates_price_and_currency() {
        let csv = "\
name,description,unit,unit_price,currency,sku
Consulting,Hourly work,hour,120.00,EUR,CONS-1
Broken,,piece,-5,EUR,BAD-1
Mystery,,piece,10,ZZZ,BAD-2\n";
        let outcome = parse_items_csv(csv.as_bytes(), &HashSet::new()).unwrap();

        assert_eq!(outcome.rows.len(), 1);
        assert_eq!(outcome.report.errors.len(), 2);
        assert_eq!(outcome.report.errors[0].row, 2);
        assert_eq!(outcome.report.errors[1].row, 3);
    }

    #[test]
    fn test_parse_items_dedupes_by_sku_only() {
        let csv = "\
name,description,unit,unit_price,currency,sku
One,,piece,10,EUR,SKU-1
Two,,piece,10,EUR,sku-1
Three,,piece,10,EUR,
Four,,piece,10,EUR,\n";
        let outcome = parse_items_csv(csv.as_bytes(), &HashSet::new()).unwrap();

        // SKU collision skipped; rows without SKU always pass.
        assert_eq!(outcome.rows.len(), 3);
        assert_eq!(outcome.report.skipped, 1);
    }

    #[test]
    fn test_malformed_row_is_an_error_not_a_failure() {
        let csv = "\
name,email
\"unterminated,oops@example.test\n";
        let outcome = parse_customers_csv(csv.as_bytes(), &HashSet::new()).unwrap();

        assert!(outcome.rows.is_empty());
        assert_eq!(outcome.report.errors.len(), 1);
    }
}
