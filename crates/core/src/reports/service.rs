//! Report assembly from pre-aggregated rows.

use chrono::{Datelike, NaiveDate};
use rust_decimal::Decimal;

use super::types::{MonthlyRevenue, RevenueReport, StatusCount, SummaryReport};

/// Service for assembling reports.
pub struct ReportService;

impl ReportService {
    /// Computes a quote conversion rate as a percentage with two decimals.
    ///
    /// Zero quotes yields a rate of zero rather than a division error.
    #[must_use]
    pub fn conversion_rate(quote_count: u64, converted: u64) -> Decimal {
        if quote_count == 0 {
            return Decimal::ZERO;
        }

        (Decimal::from(converted) / Decimal::from(quote_count) * Decimal::ONE_HUNDRED).round_dp(2)
    }

    /// Assembles the dashboard summary from per-status invoice rows.
    #[must_use]
    pub fn build_summary(
        invoices_by_status: Vec<StatusCount>,
        quote_count: u64,
        quotes_converted: u64,
    ) -> SummaryReport {
        let total_for = |status: &str| {
            invoices_by_status
                .iter()
                .filter(|s| s.status == status)
                .map(|s| s.total)
                .sum::<Decimal>()
        };

        let revenue_paid = total_for("paid");
        let overdue = total_for("overdue");
        let outstanding = total_for("sent") + overdue;

        SummaryReport {
            revenue_paid,
            outstanding,
            overdue,
            invoices_by_status,
            quote_count,
            quotes_converted,
            conversion_rate: Self::conversion_rate(quote_count, quotes_converted),
        }
    }

    /// Buckets paid invoices into calendar months over `[from, to]`.
    ///
    /// Months without revenue appear with zero totals so charts have a
    /// continuous axis. Rows outside the range are ignored.
    #[must_use]
    pub fn revenue_by_month(
        paid_invoices: &[(NaiveDate, Decimal)],
        from: NaiveDate,
        to: NaiveDate,
    ) -> RevenueReport {
        let mut months: Vec<MonthlyRevenue> = Vec::new();
        let (mut year, mut month) = (from.year(), from.month());

        while (year, month) <= (to.year(), to.month()) {
            months.push(MonthlyRevenue {
                year,
                month,
                total: Decimal::ZERO,
                invoice_count: 0,
            });
            month += 1;
            if month > 12 {
                month = 1;
                year += 1;
            }
        }

        let mut total = Decimal::ZERO;
        for (date, amount) in paid_invoices {
            if *date < from || *date > to {
                continue;
            }
            if let Some(bucket) = months
                .iter_mut()
                .find(|m| m.year == date.year() && m.month == date.month())
            {
                bucket.total += *amount;
                bucket.invoice_count += 1;
                total += *amount;
            }
        }

        RevenueReport {
            from,
            to,
            months,
            total,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_conversion_rate() {
        assert_eq!(ReportService::conversion_rate(0, 0), dec!(0));
        assert_eq!(ReportService::conversion_rate(4, 1), dec!(25.00));
        assert_eq!(ReportService::conversion_rate(3, 2), dec!(66.67));
        assert_eq!(ReportService::conversion_rate(10, 10), dec!(100.00));
    }

    #[test]
    fn test_build_summary_headline_figures() {
        let rows = vec![
            StatusCount {
                status: "paid".to_string(),
                count: 3,
                total: dec!(3000),
            },
            StatusCount {
                status: "sent".to_string(),
                count: 2,
                total: dec!(1200),
            },
            StatusCount {
                status: "overdue".to_string(),
                count: 1,
                total: dec!(500),
            },
            StatusCount {
                status: "draft".to_string(),
                count: 5,
                total: dec!(9999),
            },
        ];

        let summary = ReportService::build_summary(rows, 8, 2);

        assert_eq!(summary.revenue_paid, dec!(3000));
        assert_eq!(summary.outstanding, dec!(1700));
        assert_eq!(summary.overdue, dec!(500));
        assert_eq!(summary.conversion_rate, dec!(25.00));
    }

    #[test]
    fn test_revenue_by_month_fills_empty_months() {
        let rows = vec![
            (date(2026, 1, 15), dec!(100)),
            (date(2026, 1, 20), dec!(50)),
            (date(2026, 3, 2), dec!(200)),
        ];

        let report =
            ReportService::revenue_by_month(&rows, date(2026, 1, 1), date(2026, 3, 31));

        assert_eq!(report.months.len(), 3);
        assert_eq!(report.months[0].total, dec!(150));
        assert_eq!(report.months[0].invoice_count, 2);
        assert_eq!(report.months[1].total, dec!(0));
        assert_eq!(report.months[2].total, dec!(200));
        assert_eq!(report.total, dec!(350));
    }

    #[test]
    fn test_revenue_by_month_spans_year_boundary() {
        let rows = vec![
            (date(2025, 12, 31), dec!(10)),
            (date(2026, 1, 1), dec!(20)),
        ];

        let report =
            ReportService::revenue_by_month(&rows, date(2025, 11, 1), date(2026, 2, 28));

        assert_eq!(report.months.len(), 4);
        assert_eq!(report.months[1].total, dec!(10));
        assert_eq!(report.months[2].total, dec!(20));
    }

    #[test]
    fn test_revenue_by_month_ignores_out_of_range_rows() {
        let rows = vec![(date(2026, 6, 1), dec!(999))];

        let report =
            ReportService::revenue_by_month(&rows, date(2026, 1, 1), date(2026, 3, 31));

        assert_eq!(report.total, dec!(0));
    }
}
