//! CSV import and export.
//!
//! Imports run row by row: invalid rows and duplicates are skipped and
//! counted, valid rows are collected for insertion. There is no partial
//! commit beyond skip-and-continue. Exports write a fixed column schema
//! per entity.

mod export;
mod import;
mod types;

pub use export::{customers_to_csv, invoices_to_csv, items_to_csv};
pub use import::{parse_customers_csv, parse_items_csv};
pub use types::{
    CustomerRow, ImportExportError, ImportOutcome, ImportReport, InvoiceExportRow, ItemRow,
    RowError,
};
