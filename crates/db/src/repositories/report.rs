//! Report repository: raw aggregates for the reports module.
//!
//! Rows are fetched per user and reduced in Rust; the user's document
//! sets are small enough that this beats maintaining SQL aggregates,
//! and the assembled payloads are cached upstream.

use std::collections::HashMap;

use chrono::NaiveDate;
use rust_decimal::Decimal;
use sea_orm::{
    ColumnTrait, DatabaseConnection, DbErr, EntityTrait, PaginatorTrait, QueryFilter,
};
use uuid::Uuid;

use fakturo_core::reports::{StatusCount, TopCustomer};

use crate::entities::{
    customers, invoices,
    sea_orm_active_enums::{InvoiceStatus, QuoteStatus},
    quotes,
};

/// Report repository.
#[derive(Debug, Clone)]
pub struct ReportRepository {
    db: DatabaseConnection,
}

impl ReportRepository {
    /// Creates a new report repository.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Invoice count and total per status, in a fixed status order.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn invoice_status_counts(&self, user_id: Uuid) -> Result<Vec<StatusCount>, DbErr> {
        let rows = invoices::Entity::find()
            .filter(invoices::Column::UserId.eq(user_id))
            .all(&self.db)
            .await?;

        let order = [
            InvoiceStatus::Draft,
            InvoiceStatus::Sent,
            InvoiceStatus::Paid,
            InvoiceStatus::Overdue,
            InvoiceStatus::Cancelled,
        ];

        Ok(order
            .into_iter()
            .map(|status| {
                let matching = rows.iter().filter(|i| i.status == status);
                StatusCount {
                    status: status.as_str().to_string(),
                    count: matching.clone().count() as u64,
                    total: matching.map(|i| i.total).sum(),
                }
            })
            .collect())
    }

    /// Total and converted quote counts.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn quote_counts(&self, user_id: Uuid) -> Result<(u64, u64), DbErr> {
        let total = quotes::Entity::find()
            .filter(quotes::Column::UserId.eq(user_id))
            .count(&self.db)
            .await?;
        let converted = quotes::Entity::find()
            .filter(quotes::Column::UserId.eq(user_id))
            .filter(quotes::Column::Status.eq(QuoteStatus::Converted))
            .count(&self.db)
            .await?;

        Ok((total, converted))
    }

    /// Payment date and total of every paid invoice in the range.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn paid_invoices_between(
        &self,
        user_id: Uuid,
        from: NaiveDate,
        to: NaiveDate,
    ) -> Result<Vec<(NaiveDate, Decimal)>, DbErr> {
        let rows = invoices::Entity::find()
            .filter(invoices::Column::UserId.eq(user_id))
            .filter(invoices::Column::Status.eq(InvoiceStatus::Paid))
            .filter(invoices::Column::PaymentDate.gte(from))
            .filter(invoices::Column::PaymentDate.lte(to))
            .all(&self.db)
            .await?;

        Ok(rows
            .into_iter()
            .filter_map(|i| i.payment_date.map(|d| (d, i.total)))
            .collect())
    }

    /// Customers ranked by billed volume, descending.
    ///
    /// Cancelled invoices are excluded from the figures.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn top_customers(
        &self,
        user_id: Uuid,
        limit: usize,
    ) -> Result<Vec<TopCustomer>, DbErr> {
        let invoices = invoices::Entity::find()
            .filter(invoices::Column::UserId.eq(user_id))
            .filter(invoices::Column::Status.ne(InvoiceStatus::Cancelled))
            .all(&self.db)
            .await?;

        let customers = customers::Entity::find()
            .filter(customers::Column::UserId.eq(user_id))
            .all(&self.db)
            .await?;
        let names: HashMap<Uuid, String> =
            customers.into_iter().map(|c| (c.id, c.name)).collect();

        let mut by_customer: HashMap<Uuid, TopCustomer> = HashMap::new();
        for invoice in invoices {
            let entry = by_customer
                .entry(invoice.customer_id)
                .or_insert_with(|| TopCustomer {
                    customer_id: invoice.customer_id,
                    name: names
                        .get(&invoice.customer_id)
                        .cloned()
                        .unwrap_or_default(),
                    invoice_count: 0,
                    total_billed: Decimal::ZERO,
                    total_paid: Decimal::ZERO,
                });

            entry.invoice_count += 1;
            entry.total_billed += invoice.total;
            if invoice.status == InvoiceStatus::Paid {
                entry.total_paid += invoice.total;
            }
        }

        let mut ranked: Vec<TopCustomer> = by_customer.into_values().collect();
        ranked.sort_by(|a, b| b.total_billed.cmp(&a.total_billed));
        ranked.truncate(limit);

        Ok(ranked)
    }
}
