//! Quote and invoice document logic.
//!
//! Totals, numbering, and due-date rules shared by quotes and invoices.
//! Status transitions themselves carry no guard logic (any status may follow
//! any other); what matters is that every transition is recorded, which the
//! database layer enforces.

mod error;
mod totals;
mod types;

#[cfg(test)]
mod totals_props;

pub use error::DocumentError;
pub use totals::{calculate_totals, line_total};
pub use types::{DocumentTotals, LineItemInput};

use chrono::{Datelike, NaiveDate};

/// The two document kinds Fakturo issues.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentKind {
    /// Pre-sale price proposal.
    Quote,
    /// Billing document with a due date.
    Invoice,
}

impl DocumentKind {
    /// Returns the number prefix for this document kind.
    #[must_use]
    pub const fn number_prefix(self) -> &'static str {
        match self {
            Self::Quote => "Q",
            Self::Invoice => "INV",
        }
    }
}

/// Formats a sequential document number, e.g. `INV-2026-0042`.
///
/// Sequences are per user and per calendar year; the counter lives in the
/// user's settings row and is allocated inside the creating transaction.
#[must_use]
pub fn format_document_number(kind: DocumentKind, year: i32, sequence: u32) -> String {
    format!("{}-{year}-{sequence:04}", kind.number_prefix())
}

/// Returns the counter year for a given issue date.
#[must_use]
pub fn counter_year(issue_date: NaiveDate) -> i32 {
    issue_date.year()
}

/// Returns true if an invoice due on `due_date` is past due on `today`.
///
/// The due date itself is not past due; the invoice becomes overdue the
/// day after.
#[must_use]
pub fn is_past_due(due_date: NaiveDate, today: NaiveDate) -> bool {
    today > due_date
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_document_number() {
        assert_eq!(
            format_document_number(DocumentKind::Invoice, 2026, 42),
            "INV-2026-0042"
        );
        assert_eq!(
            format_document_number(DocumentKind::Quote, 2026, 7),
            "Q-2026-0007"
        );
    }

    #[test]
    fn test_number_sequence_width_overflows_gracefully() {
        assert_eq!(
            format_document_number(DocumentKind::Invoice, 2026, 12345),
            "INV-2026-12345"
        );
    }

    #[test]
    fn test_is_past_due() {
        let due = NaiveDate::from_ymd_opt(2026, 3, 15).unwrap();

        assert!(!is_past_due(due, NaiveDate::from_ymd_opt(2026, 3, 14).unwrap()));
        assert!(!is_past_due(due, due));
        assert!(is_past_due(due, NaiveDate::from_ymd_opt(2026, 3, 16).unwrap()));
    }

    #[test]
    fn test_counter_year() {
        let date = NaiveDate::from_ymd_opt(2026, 12, 31).unwrap();
        assert_eq!(counter_year(date), 2026);
    }
}
