//! Report response types.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::Serialize;
use uuid::Uuid;

/// Invoice count and value grouped by status.
#[derive(Debug, Clone, Serialize)]
pub struct StatusCount {
    /// Invoice status name.
    pub status: String,
    /// Number of invoices in this status.
    pub count: u64,
    /// Sum of invoice totals in this status.
    pub total: Decimal,
}

/// Dashboard summary: headline revenue figures plus quote conversion.
#[derive(Debug, Clone, Serialize)]
pub struct SummaryReport {
    /// Sum of paid invoice totals.
    pub revenue_paid: Decimal,
    /// Sum of sent and overdue invoice totals (awaiting payment).
    pub outstanding: Decimal,
    /// Sum of overdue invoice totals.
    pub overdue: Decimal,
    /// Invoice counts and values per status.
    pub invoices_by_status: Vec<StatusCount>,
    /// Total number of quotes.
    pub quote_count: u64,
    /// Number of quotes converted to invoices.
    pub quotes_converted: u64,
    /// Conversion rate as a percentage, two decimals.
    pub conversion_rate: Decimal,
}

/// One month of paid revenue.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MonthlyRevenue {
    /// Calendar year.
    pub year: i32,
    /// Calendar month (1-12).
    pub month: u32,
    /// Paid total for the month.
    pub total: Decimal,
    /// Number of invoices paid in the month.
    pub invoice_count: u64,
}

/// Revenue report over a date range.
#[derive(Debug, Clone, Serialize)]
pub struct RevenueReport {
    /// Range start.
    pub from: NaiveDate,
    /// Range end (inclusive).
    pub to: NaiveDate,
    /// Monthly buckets, empty months included.
    pub months: Vec<MonthlyRevenue>,
    /// Sum over the whole range.
    pub total: Decimal,
}

/// One customer ranked by billed volume.
#[derive(Debug, Clone, Serialize)]
pub struct TopCustomer {
    /// Customer ID.
    pub customer_id: Uuid,
    /// Customer display name.
    pub name: String,
    /// Number of invoices issued to this customer.
    pub invoice_count: u64,
    /// Sum of all invoice totals.
    pub total_billed: Decimal,
    /// Sum of paid invoice totals.
    pub total_paid: Decimal,
}

/// Status breakdown response.
#[derive(Debug, Clone, Serialize)]
pub struct StatusBreakdown {
    /// Invoice counts and values per status.
    pub statuses: Vec<StatusCount>,
}
