//! Invoice repository for database operations.
//!
//! Every status change writes an `invoice_status_history` row in the same
//! database transaction as the invoice update. Transitions are recorded,
//! never rejected: any status may follow any other.

use chrono::{NaiveDate, Utc};
use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, DatabaseTransaction, DbErr, EntityTrait,
    PaginatorTrait, QueryFilter, QueryOrder, QuerySelect, Set, TransactionTrait,
};
use uuid::Uuid;

use fakturo_core::document::{
    self, DocumentError, DocumentKind, DocumentTotals, LineItemInput,
};

use crate::entities::{
    customers, invoice_items, invoice_status_history, invoices,
    sea_orm_active_enums::InvoiceStatus,
};
use crate::repositories::settings::SettingsRepository;
use fakturo_shared::PageRequest;

/// Error types for invoice operations.
#[derive(Debug, thiserror::Error)]
pub enum InvoiceError {
    /// Invoice not found (or owned by another user).
    #[error("Invoice not found: {0}")]
    NotFound(Uuid),

    /// Customer not found (or owned by another user).
    #[error("Customer not found: {0}")]
    CustomerNotFound(Uuid),

    /// Paid and cancelled invoices cannot be edited.
    #[error("Invoice in status {0} cannot be edited")]
    NotEditable(String),

    /// Line item or totals validation failed.
    #[error(transparent)]
    Validation(#[from] DocumentError),

    /// Database error.
    #[error("Database error: {0}")]
    Database(#[from] DbErr),
}

/// One document line as submitted by the client.
#[derive(Debug, Clone)]
pub struct DocumentLineInput {
    /// Optional catalog item reference.
    pub item_id: Option<Uuid>,
    /// Line description.
    pub description: String,
    /// Quantity.
    pub quantity: Decimal,
    /// Unit price.
    pub unit_price: Decimal,
}

impl DocumentLineInput {
    pub(crate) fn to_core(&self) -> LineItemInput {
        LineItemInput {
            description: self.description.clone(),
            quantity: self.quantity,
            unit_price: self.unit_price,
        }
    }
}

/// Input for creating an invoice.
#[derive(Debug, Clone)]
pub struct CreateInvoiceInput {
    /// Billed customer.
    pub customer_id: Uuid,
    /// Issue date; defaults to today.
    pub issue_date: Option<NaiveDate>,
    /// Due date; defaults to issue date plus the user's payment terms.
    pub due_date: Option<NaiveDate>,
    /// Currency; defaults to the user's default currency.
    pub currency: Option<String>,
    /// Flat discount.
    pub discount_amount: Decimal,
    /// Tax rate; defaults to the user's default rate.
    pub tax_rate: Option<Decimal>,
    /// Free-form notes.
    pub notes: Option<String>,
    /// Line items.
    pub lines: Vec<DocumentLineInput>,
}

/// Input for updating an invoice; `None` leaves a field untouched.
#[derive(Debug, Clone, Default)]
pub struct UpdateInvoiceInput {
    /// New customer.
    pub customer_id: Option<Uuid>,
    /// New issue date.
    pub issue_date: Option<NaiveDate>,
    /// New due date.
    pub due_date: Option<NaiveDate>,
    /// New currency.
    pub currency: Option<String>,
    /// New discount.
    pub discount_amount: Option<Decimal>,
    /// New tax rate.
    pub tax_rate: Option<Decimal>,
    /// New notes (`Some(None)` clears).
    pub notes: Option<Option<String>>,
    /// Replacement line items (replace-all semantics).
    pub lines: Option<Vec<DocumentLineInput>>,
}

/// Filter options for listing invoices.
#[derive(Debug, Clone, Default)]
pub struct InvoiceFilter {
    /// Filter by status.
    pub status: Option<InvoiceStatus>,
    /// Filter by customer.
    pub customer_id: Option<Uuid>,
    /// Issue date range start.
    pub date_from: Option<NaiveDate>,
    /// Issue date range end.
    pub date_to: Option<NaiveDate>,
}

/// Invoice with its line items.
#[derive(Debug, Clone)]
pub struct InvoiceWithItems {
    /// Invoice header.
    pub invoice: invoices::Model,
    /// Line items ordered by position.
    pub items: Vec<invoice_items::Model>,
}

/// Parameters for inserting an invoice inside an open transaction.
pub(crate) struct InsertInvoiceParams {
    pub user_id: Uuid,
    pub customer_id: Uuid,
    pub invoice_number: String,
    pub issue_date: NaiveDate,
    pub due_date: NaiveDate,
    pub currency: String,
    pub totals: DocumentTotals,
    pub notes: Option<String>,
    pub quote_id: Option<Uuid>,
    pub creation_note: Option<String>,
}

/// Invoice repository for CRUD operations.
#[derive(Debug, Clone)]
pub struct InvoiceRepository {
    db: DatabaseConnection,
}

impl InvoiceRepository {
    /// Creates a new invoice repository.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Inserts an invoice, its items, and the creation history row.
    ///
    /// Shared between `create` and quote conversion; must run inside an
    /// open transaction.
    pub(crate) async fn insert_with_items(
        txn: &DatabaseTransaction,
        params: InsertInvoiceParams,
        lines: &[DocumentLineInput],
    ) -> Result<InvoiceWithItems, DbErr> {
        let now = Utc::now();
        let invoice_id = Uuid::new_v4();

        let invoice = invoices::ActiveModel {
            id: Set(invoice_id),
            user_id: Set(params.user_id),
            customer_id: Set(params.customer_id),
            invoice_number: Set(params.invoice_number),
            status: Set(InvoiceStatus::Draft),
            issue_date: Set(params.issue_date),
            due_date: Set(params.due_date),
            payment_date: Set(None),
            currency: Set(params.currency),
            subtotal: Set(params.totals.subtotal),
            discount_amount: Set(params.totals.discount_amount),
            tax_rate: Set(params.totals.tax_rate),
            tax_amount: Set(params.totals.tax_amount),
            total: Set(params.totals.total),
            notes: Set(params.notes),
            quote_id: Set(params.quote_id),
            sent_at: Set(None),
            created_at: Set(now.into()),
            updated_at: Set(now.into()),
        }
        .insert(txn)
        .await?;

        let items =
            Self::insert_items(txn, invoice_id, lines, &params.totals.line_totals).await?;

        invoice_status_history::ActiveModel {
            id: Set(Uuid::new_v4()),
            invoice_id: Set(invoice_id),
            from_status: Set(None),
            to_status: Set(InvoiceStatus::Draft),
            changed_by: Set(params.user_id),
            note: Set(params.creation_note),
            created_at: Set(now.into()),
        }
        .insert(txn)
        .await?;

        Ok(InvoiceWithItems { invoice, items })
    }

    async fn insert_items(
        txn: &DatabaseTransaction,
        invoice_id: Uuid,
        lines: &[DocumentLineInput],
        line_totals: &[Decimal],
    ) -> Result<Vec<invoice_items::Model>, DbErr> {
        let mut items = Vec::with_capacity(lines.len());

        for (position, (line, total)) in lines.iter().zip(line_totals).enumerate() {
            let item = invoice_items::ActiveModel {
                id: Set(Uuid::new_v4()),
                invoice_id: Set(invoice_id),
                item_id: Set(line.item_id),
                description: Set(line.description.clone()),
                quantity: Set(line.quantity),
                unit_price: Set(line.unit_price),
                line_total: Set(*total),
                position: Set(i32::try_from(position).unwrap_or(i32::MAX)),
            }
            .insert(txn)
            .await?;
            items.push(item);
        }

        Ok(items)
    }

    async fn verify_customer(
        &self,
        user_id: Uuid,
        customer_id: Uuid,
    ) -> Result<(), InvoiceError> {
        let count = customers::Entity::find_by_id(customer_id)
            .filter(customers::Column::UserId.eq(user_id))
            .count(&self.db)
            .await?;

        if count == 0 {
            return Err(InvoiceError::CustomerNotFound(customer_id));
        }
        Ok(())
    }

    /// Creates an invoice with items, allocating the next invoice number.
    ///
    /// # Errors
    ///
    /// Returns an error if the customer is missing, validation fails, or
    /// a database operation fails.
    pub async fn create(
        &self,
        user_id: Uuid,
        input: CreateInvoiceInput,
    ) -> Result<InvoiceWithItems, InvoiceError> {
        self.verify_customer(user_id, input.customer_id).await?;

        let settings = SettingsRepository::get_in(&self.db, user_id).await?;
        let issue_date = input.issue_date.unwrap_or_else(|| Utc::now().date_naive());
        let due_date = input.due_date.unwrap_or_else(|| {
            let terms = settings
                .as_ref()
                .map_or(14, |s| i64::from(s.default_payment_terms_days));
            issue_date + chrono::Duration::days(terms)
        });
        let currency = input.currency.unwrap_or_else(|| {
            settings
                .as_ref()
                .map_or_else(|| "EUR".to_string(), |s| s.default_currency.clone())
        });
        let tax_rate = input
            .tax_rate
            .unwrap_or_else(|| settings.as_ref().map_or(Decimal::ZERO, |s| s.default_tax_rate));

        let core_lines: Vec<LineItemInput> = input.lines.iter().map(DocumentLineInput::to_core).collect();
        let totals = document::calculate_totals(&core_lines, input.discount_amount, tax_rate)?;

        let txn = self.db.begin().await?;

        let number = SettingsRepository::allocate_number(
            &txn,
            user_id,
            DocumentKind::Invoice,
            document::counter_year(issue_date),
        )
        .await?;

        let created = Self::insert_with_items(
            &txn,
            InsertInvoiceParams {
                user_id,
                customer_id: input.customer_id,
                invoice_number: number,
                issue_date,
                due_date,
                currency: currency.to_uppercase(),
                totals,
                notes: input.notes,
                quote_id: None,
                creation_note: None,
            },
            &input.lines,
        )
        .await?;

        txn.commit().await?;

        Ok(created)
    }

    /// Finds an invoice with its items, scoped to the owning user.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn find_with_items(
        &self,
        user_id: Uuid,
        id: Uuid,
    ) -> Result<Option<InvoiceWithItems>, DbErr> {
        let invoice = invoices::Entity::find_by_id(id)
            .filter(invoices::Column::UserId.eq(user_id))
            .one(&self.db)
            .await?;

        let Some(invoice) = invoice else {
            return Ok(None);
        };

        let items = invoice_items::Entity::find()
            .filter(invoice_items::Column::InvoiceId.eq(invoice.id))
            .order_by_asc(invoice_items::Column::Position)
            .all(&self.db)
            .await?;

        Ok(Some(InvoiceWithItems { invoice, items }))
    }

    /// Lists invoices with filters, newest first.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn list(
        &self,
        user_id: Uuid,
        filter: &InvoiceFilter,
        page: &PageRequest,
    ) -> Result<(Vec<invoices::Model>, u64), DbErr> {
        let mut query = invoices::Entity::find().filter(invoices::Column::UserId.eq(user_id));

        if let Some(ref status) = filter.status {
            query = query.filter(invoices::Column::Status.eq(status.clone()));
        }
        if let Some(customer_id) = filter.customer_id {
            query = query.filter(invoices::Column::CustomerId.eq(customer_id));
        }
        if let Some(from) = filter.date_from {
            query = query.filter(invoices::Column::IssueDate.gte(from));
        }
        if let Some(to) = filter.date_to {
            query = query.filter(invoices::Column::IssueDate.lte(to));
        }

        let total = query.clone().count(&self.db).await?;
        let rows = query
            .order_by_desc(invoices::Column::CreatedAt)
            .offset(page.offset())
            .limit(page.limit())
            .all(&self.db)
            .await?;

        Ok((rows, total))
    }

    /// Applies a partial update, recomputing totals when anything that
    /// feeds them changes. Paid and cancelled invoices are immutable.
    ///
    /// # Errors
    ///
    /// Returns `InvoiceError::NotEditable` for paid/cancelled invoices.
    pub async fn update(
        &self,
        user_id: Uuid,
        id: Uuid,
        input: UpdateInvoiceInput,
    ) -> Result<InvoiceWithItems, InvoiceError> {
        let existing = self
            .find_with_items(user_id, id)
            .await?
            .ok_or(InvoiceError::NotFound(id))?;

        if matches!(
            existing.invoice.status,
            InvoiceStatus::Paid | InvoiceStatus::Cancelled
        ) {
            return Err(InvoiceError::NotEditable(
                existing.invoice.status.as_str().to_string(),
            ));
        }

        if let Some(customer_id) = input.customer_id {
            self.verify_customer(user_id, customer_id).await?;
        }

        // Effective line set after the update.
        let lines: Vec<DocumentLineInput> = input.lines.clone().unwrap_or_else(|| {
            existing
                .items
                .iter()
                .map(|i| DocumentLineInput {
                    item_id: i.item_id,
                    description: i.description.clone(),
                    quantity: i.quantity,
                    unit_price: i.unit_price,
                })
                .collect()
        });

        let discount = input
            .discount_amount
            .unwrap_or(existing.invoice.discount_amount);
        let tax_rate = input.tax_rate.unwrap_or(existing.invoice.tax_rate);

        let core_lines: Vec<LineItemInput> = lines.iter().map(DocumentLineInput::to_core).collect();
        let totals = document::calculate_totals(&core_lines, discount, tax_rate)?;

        let txn = self.db.begin().await?;

        if input.lines.is_some() {
            invoice_items::Entity::delete_many()
                .filter(invoice_items::Column::InvoiceId.eq(id))
                .exec(&txn)
                .await?;
            Self::insert_items(&txn, id, &lines, &totals.line_totals).await?;
        }

        let mut model: invoices::ActiveModel = existing.invoice.into();
        if let Some(customer_id) = input.customer_id {
            model.customer_id = Set(customer_id);
        }
        if let Some(issue_date) = input.issue_date {
            model.issue_date = Set(issue_date);
        }
        if let Some(due_date) = input.due_date {
            model.due_date = Set(due_date);
        }
        if let Some(currency) = input.currency {
            model.currency = Set(currency.to_uppercase());
        }
        if let Some(notes) = input.notes {
            model.notes = Set(notes);
        }
        model.subtotal = Set(totals.subtotal);
        model.discount_amount = Set(totals.discount_amount);
        model.tax_rate = Set(totals.tax_rate);
        model.tax_amount = Set(totals.tax_amount);
        model.total = Set(totals.total);
        model.update(&txn).await?;

        txn.commit().await?;

        self.find_with_items(user_id, id)
            .await?
            .ok_or(InvoiceError::NotFound(id))
    }

    /// Deletes an invoice; items and history cascade.
    ///
    /// # Errors
    ///
    /// Returns `InvoiceError::NotFound` if the invoice does not exist for
    /// this user.
    pub async fn delete(&self, user_id: Uuid, id: Uuid) -> Result<(), InvoiceError> {
        let existing = invoices::Entity::find_by_id(id)
            .filter(invoices::Column::UserId.eq(user_id))
            .one(&self.db)
            .await?
            .ok_or(InvoiceError::NotFound(id))?;

        invoices::Entity::delete_by_id(existing.id)
            .exec(&self.db)
            .await?;

        Ok(())
    }

    /// Sets the invoice status, recording the transition.
    ///
    /// No transition is rejected; the history row is what matters.
    /// Moving to `paid` stamps `payment_date`; moving to `sent` stamps
    /// `sent_at` on first send.
    ///
    /// # Errors
    ///
    /// Returns `InvoiceError::NotFound` if the invoice does not exist for
    /// this user.
    pub async fn set_status(
        &self,
        user_id: Uuid,
        id: Uuid,
        new_status: InvoiceStatus,
        payment_date: Option<NaiveDate>,
        note: Option<String>,
    ) -> Result<invoices::Model, InvoiceError> {
        let existing = invoices::Entity::find_by_id(id)
            .filter(invoices::Column::UserId.eq(user_id))
            .one(&self.db)
            .await?
            .ok_or(InvoiceError::NotFound(id))?;

        let from_status = existing.status.clone();
        let now = Utc::now();

        let txn = self.db.begin().await?;

        let mut model: invoices::ActiveModel = existing.clone().into();
        model.status = Set(new_status.clone());
        match new_status {
            InvoiceStatus::Paid => {
                model.payment_date =
                    Set(Some(payment_date.unwrap_or_else(|| now.date_naive())));
            }
            InvoiceStatus::Sent => {
                if existing.sent_at.is_none() {
                    model.sent_at = Set(Some(now.into()));
                }
            }
            _ => {}
        }
        let updated = model.update(&txn).await?;

        invoice_status_history::ActiveModel {
            id: Set(Uuid::new_v4()),
            invoice_id: Set(id),
            from_status: Set(Some(from_status)),
            to_status: Set(new_status),
            changed_by: Set(user_id),
            note: Set(note),
            created_at: Set(now.into()),
        }
        .insert(&txn)
        .await?;

        txn.commit().await?;

        Ok(updated)
    }

    /// Moves all of the user's sent invoices past their due date to
    /// `overdue`, one recorded transition each.
    ///
    /// Returns the updated invoices.
    ///
    /// # Errors
    ///
    /// Returns an error if a database operation fails.
    pub async fn mark_overdue_sweep(
        &self,
        user_id: Uuid,
        today: NaiveDate,
    ) -> Result<Vec<invoices::Model>, InvoiceError> {
        let candidates = invoices::Entity::find()
            .filter(invoices::Column::UserId.eq(user_id))
            .filter(invoices::Column::Status.eq(InvoiceStatus::Sent))
            .filter(invoices::Column::DueDate.lt(today))
            .all(&self.db)
            .await?;

        let mut updated = Vec::with_capacity(candidates.len());
        for invoice in candidates {
            let model = self
                .set_status(
                    user_id,
                    invoice.id,
                    InvoiceStatus::Overdue,
                    None,
                    Some("past due date".to_string()),
                )
                .await?;
            updated.push(model);
        }

        Ok(updated)
    }

    /// Returns the status history for an invoice, oldest first.
    ///
    /// # Errors
    ///
    /// Returns `InvoiceError::NotFound` if the invoice does not exist for
    /// this user.
    pub async fn history(
        &self,
        user_id: Uuid,
        id: Uuid,
    ) -> Result<Vec<invoice_status_history::Model>, InvoiceError> {
        let exists = invoices::Entity::find_by_id(id)
            .filter(invoices::Column::UserId.eq(user_id))
            .count(&self.db)
            .await?;

        if exists == 0 {
            return Err(InvoiceError::NotFound(id));
        }

        Ok(invoice_status_history::Entity::find()
            .filter(invoice_status_history::Column::InvoiceId.eq(id))
            .order_by_asc(invoice_status_history::Column::CreatedAt)
            .all(&self.db)
            .await?)
    }
}
