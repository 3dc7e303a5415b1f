//! Report aggregation and caching.
//!
//! Repositories feed pre-aggregated rows in; this module assembles the
//! response shapes and owns the per-user result cache.

mod cache;
mod service;
mod types;

pub use cache::ReportCache;
pub use service::ReportService;
pub use types::{
    MonthlyRevenue, RevenueReport, StatusBreakdown, StatusCount, SummaryReport, TopCustomer,
};
