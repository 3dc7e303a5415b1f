//! Quote repository for database operations.
//!
//! Quotes move draft → sent → seen → converted. Conversion creates a
//! draft invoice (copying the line items) and links both documents in
//! one transaction; a quote converts at most once.

use chrono::{NaiveDate, Utc};
use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, DatabaseTransaction, DbErr, EntityTrait,
    PaginatorTrait, QueryFilter, QueryOrder, QuerySelect, Set, TransactionTrait,
};
use uuid::Uuid;

use fakturo_core::document::{self, DocumentError, DocumentKind, DocumentTotals, LineItemInput};
use fakturo_shared::PageRequest;

use crate::entities::{
    customers, quote_items, quotes,
    sea_orm_active_enums::QuoteStatus,
};
use crate::repositories::invoice::{
    DocumentLineInput, InsertInvoiceParams, InvoiceRepository, InvoiceWithItems,
};
use crate::repositories::settings::SettingsRepository;

/// Error types for quote operations.
#[derive(Debug, thiserror::Error)]
pub enum QuoteError {
    /// Quote not found (or owned by another user).
    #[error("Quote not found: {0}")]
    NotFound(Uuid),

    /// Customer not found (or owned by another user).
    #[error("Customer not found: {0}")]
    CustomerNotFound(Uuid),

    /// Quote was already converted to an invoice.
    #[error("Quote has already been converted")]
    AlreadyConverted,

    /// Converted quotes cannot be edited or deleted.
    #[error("Converted quotes cannot be modified")]
    Converted,

    /// A quote must be sent before it can be marked seen.
    #[error("Quote in status {0} cannot be marked seen")]
    NotSent(String),

    /// Line item or totals validation failed.
    #[error(transparent)]
    Validation(#[from] DocumentError),

    /// Database error.
    #[error("Database error: {0}")]
    Database(#[from] DbErr),
}

/// Input for creating a quote.
#[derive(Debug, Clone)]
pub struct CreateQuoteInput {
    /// Prospective customer.
    pub customer_id: Uuid,
    /// Issue date; defaults to today.
    pub issue_date: Option<NaiveDate>,
    /// Validity end date.
    pub valid_until: Option<NaiveDate>,
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

/// Input for updating a quote; `None` leaves a field untouched.
#[derive(Debug, Clone, Default)]
pub struct UpdateQuoteInput {
    /// New customer.
    pub customer_id: Option<Uuid>,
    /// New issue date.
    pub issue_date: Option<NaiveDate>,
    /// New validity end (`Some(None)` clears).
    pub valid_until: Option<Option<NaiveDate>>,
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

/// Filter options for listing quotes.
#[derive(Debug, Clone, Default)]
pub struct QuoteFilter {
    /// Filter by status.
    pub status: Option<QuoteStatus>,
    /// Filter by customer.
    pub customer_id: Option<Uuid>,
}

/// Quote with its line items.
#[derive(Debug, Clone)]
pub struct QuoteWithItems {
    /// Quote header.
    pub quote: quotes::Model,
    /// Line items ordered by position.
    pub items: Vec<quote_items::Model>,
}

/// Quote repository for CRUD operations.
#[derive(Debug, Clone)]
pub struct QuoteRepository {
    db: DatabaseConnection,
}

impl QuoteRepository {
    /// Creates a new quote repository.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    async fn verify_customer(&self, user_id: Uuid, customer_id: Uuid) -> Result<(), QuoteError> {
        let count = customers::Entity::find_by_id(customer_id)
            .filter(customers::Column::UserId.eq(user_id))
            .count(&self.db)
            .await?;

        if count == 0 {
            return Err(QuoteError::CustomerNotFound(customer_id));
        }
        Ok(())
    }

    async fn insert_items(
        txn: &DatabaseTransaction,
        quote_id: Uuid,
        lines: &[DocumentLineInput],
        line_totals: &[Decimal],
    ) -> Result<Vec<quote_items::Model>, DbErr> {
        let mut items = Vec::with_capacity(lines.len());

        for (position, (line, total)) in lines.iter().zip(line_totals).enumerate() {
            let item = quote_items::ActiveModel {
                id: Set(Uuid::new_v4()),
                quote_id: Set(quote_id),
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

    /// Creates a quote with items, allocating the next quote number.
    ///
    /// # Errors
    ///
    /// Returns an error if the customer is missing, validation fails, or
    /// a database operation fails.
    pub async fn create(
        &self,
        user_id: Uuid,
        input: CreateQuoteInput,
    ) -> Result<QuoteWithItems, QuoteError> {
        self.verify_customer(user_id, input.customer_id).await?;

        let settings = SettingsRepository::get_in(&self.db, user_id).await?;
        let issue_date = input.issue_date.unwrap_or_else(|| Utc::now().date_naive());
        let currency = input.currency.unwrap_or_else(|| {
            settings
                .as_ref()
                .map_or_else(|| "EUR".to_string(), |s| s.default_currency.clone())
        });
        let tax_rate = input
            .tax_rate
            .unwrap_or_else(|| settings.as_ref().map_or(Decimal::ZERO, |s| s.default_tax_rate));

        let core_lines: Vec<LineItemInput> =
            input.lines.iter().map(DocumentLineInput::to_core).collect();
        let totals = document::calculate_totals(&core_lines, input.discount_amount, tax_rate)?;

        let txn = self.db.begin().await?;

        let number = SettingsRepository::allocate_number(
            &txn,
            user_id,
            DocumentKind::Quote,
            document::counter_year(issue_date),
        )
        .await?;

        let now = Utc::now();
        let quote_id = Uuid::new_v4();

        let quote = quotes::ActiveModel {
            id: Set(quote_id),
            user_id: Set(user_id),
            customer_id: Set(input.customer_id),
            quote_number: Set(number),
            status: Set(QuoteStatus::Draft),
            issue_date: Set(issue_date),
            valid_until: Set(input.valid_until),
            currency: Set(currency.to_uppercase()),
            subtotal: Set(totals.subtotal),
            discount_amount: Set(totals.discount_amount),
            tax_rate: Set(totals.tax_rate),
            tax_amount: Set(totals.tax_amount),
            total: Set(totals.total),
            notes: Set(input.notes),
            sent_at: Set(None),
            seen_at: Set(None),
            converted_invoice_id: Set(None),
            created_at: Set(now.into()),
            updated_at: Set(now.into()),
        }
        .insert(&txn)
        .await?;

        let items = Self::insert_items(&txn, quote_id, &input.lines, &totals.line_totals).await?;

        txn.commit().await?;

        Ok(QuoteWithItems { quote, items })
    }

    /// Finds a quote with its items, scoped to the owning user.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn find_with_items(
        &self,
        user_id: Uuid,
        id: Uuid,
    ) -> Result<Option<QuoteWithItems>, DbErr> {
        let quote = quotes::Entity::find_by_id(id)
            .filter(quotes::Column::UserId.eq(user_id))
            .one(&self.db)
            .await?;

        let Some(quote) = quote else {
            return Ok(None);
        };

        let items = quote_items::Entity::find()
            .filter(quote_items::Column::QuoteId.eq(quote.id))
            .order_by_asc(quote_items::Column::Position)
            .all(&self.db)
            .await?;

        Ok(Some(QuoteWithItems { quote, items }))
    }

    /// Lists quotes with filters, newest first.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn list(
        &self,
        user_id: Uuid,
        filter: &QuoteFilter,
        page: &PageRequest,
    ) -> Result<(Vec<quotes::Model>, u64), DbErr> {
        let mut query = quotes::Entity::find().filter(quotes::Column::UserId.eq(user_id));

        if let Some(ref status) = filter.status {
            query = query.filter(quotes::Column::Status.eq(status.clone()));
        }
        if let Some(customer_id) = filter.customer_id {
            query = query.filter(quotes::Column::CustomerId.eq(customer_id));
        }

        let total = query.clone().count(&self.db).await?;
        let rows = query
            .order_by_desc(quotes::Column::CreatedAt)
            .offset(page.offset())
            .limit(page.limit())
            .all(&self.db)
            .await?;

        Ok((rows, total))
    }

    /// Applies a partial update, recomputing totals when anything that
    /// feeds them changes. Converted quotes are immutable.
    ///
    /// # Errors
    ///
    /// Returns `QuoteError::Converted` for converted quotes.
    pub async fn update(
        &self,
        user_id: Uuid,
        id: Uuid,
        input: UpdateQuoteInput,
    ) -> Result<QuoteWithItems, QuoteError> {
        let existing = self
            .find_with_items(user_id, id)
            .await?
            .ok_or(QuoteError::NotFound(id))?;

        if existing.quote.status == QuoteStatus::Converted {
            return Err(QuoteError::Converted);
        }

        if let Some(customer_id) = input.customer_id {
            self.verify_customer(user_id, customer_id).await?;
        }

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
            .unwrap_or(existing.quote.discount_amount);
        let tax_rate = input.tax_rate.unwrap_or(existing.quote.tax_rate);

        let core_lines: Vec<LineItemInput> = lines.iter().map(DocumentLineInput::to_core).collect();
        let totals = document::calculate_totals(&core_lines, discount, tax_rate)?;

        let txn = self.db.begin().await?;

        if input.lines.is_some() {
            quote_items::Entity::delete_many()
                .filter(quote_items::Column::QuoteId.eq(id))
                .exec(&txn)
                .await?;
            Self::insert_items(&txn, id, &lines, &totals.line_totals).await?;
        }

        let mut model: quotes::ActiveModel = existing.quote.into();
        if let Some(customer_id) = input.customer_id {
            model.customer_id = Set(customer_id);
        }
        if let Some(issue_date) = input.issue_date {
            model.issue_date = Set(issue_date);
        }
        if let Some(valid_until) = input.valid_until {
            model.valid_until = Set(valid_until);
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
            .ok_or(QuoteError::NotFound(id))
    }

    /// Deletes a quote; blocked once converted.
    ///
    /// # Errors
    ///
    /// Returns `QuoteError::Converted` for converted quotes.
    pub async fn delete(&self, user_id: Uuid, id: Uuid) -> Result<(), QuoteError> {
        let existing = quotes::Entity::find_by_id(id)
            .filter(quotes::Column::UserId.eq(user_id))
            .one(&self.db)
            .await?
            .ok_or(QuoteError::NotFound(id))?;

        if existing.status == QuoteStatus::Converted {
            return Err(QuoteError::Converted);
        }

        quotes::Entity::delete_by_id(existing.id)
            .exec(&self.db)
            .await?;

        Ok(())
    }

    /// Marks a quote sent, stamping `sent_at` on first send.
    ///
    /// # Errors
    ///
    /// Returns `QuoteError::Converted` for converted quotes.
    pub async fn mark_sent(&self, user_id: Uuid, id: Uuid) -> Result<quotes::Model, QuoteError> {
        let existing = quotes::Entity::find_by_id(id)
            .filter(quotes::Column::UserId.eq(user_id))
            .one(&self.db)
            .await?
            .ok_or(QuoteError::NotFound(id))?;

        if existing.status == QuoteStatus::Converted {
            return Err(QuoteError::Converted);
        }

        let first_send = existing.sent_at.is_none();
        let keep_seen = existing.status == QuoteStatus::Seen;

        let mut model: quotes::ActiveModel = existing.into();
        if !keep_seen {
            model.status = Set(QuoteStatus::Sent);
        }
        if first_send {
            model.sent_at = Set(Some(Utc::now().into()));
        }

        Ok(model.update(&self.db).await?)
    }

    /// Marks a sent quote as seen by the customer. Idempotent once seen.
    ///
    /// # Errors
    ///
    /// Returns `QuoteError::NotSent` for drafts and `QuoteError::Converted`
    /// for converted quotes.
    pub async fn mark_seen(&self, user_id: Uuid, id: Uuid) -> Result<quotes::Model, QuoteError> {
        let existing = quotes::Entity::find_by_id(id)
            .filter(quotes::Column::UserId.eq(user_id))
            .one(&self.db)
            .await?
            .ok_or(QuoteError::NotFound(id))?;

        match existing.status {
            QuoteStatus::Seen => return Ok(existing),
            QuoteStatus::Sent => {}
            QuoteStatus::Converted => return Err(QuoteError::Converted),
            QuoteStatus::Draft => {
                return Err(QuoteError::NotSent(existing.status.as_str().to_string()));
            }
        }

        let mut model: quotes::ActiveModel = existing.into();
        model.status = Set(QuoteStatus::Seen);
        model.seen_at = Set(Some(Utc::now().into()));

        Ok(model.update(&self.db).await?)
    }

    /// Converts a quote into a draft invoice.
    ///
    /// Copies the line items and totals, allocates an invoice number,
    /// links both documents, and records the invoice creation in the
    /// status history. A quote converts at most once.
    ///
    /// # Errors
    ///
    /// Returns `QuoteError::AlreadyConverted` on a second conversion.
    pub async fn convert_to_invoice(
        &self,
        user_id: Uuid,
        id: Uuid,
    ) -> Result<InvoiceWithItems, QuoteError> {
        let existing = self
            .find_with_items(user_id, id)
            .await?
            .ok_or(QuoteError::NotFound(id))?;

        if existing.quote.status == QuoteStatus::Converted
            || existing.quote.converted_invoice_id.is_some()
        {
            return Err(QuoteError::AlreadyConverted);
        }

        let settings = SettingsRepository::get_in(&self.db, user_id).await?;
        let terms = settings
            .as_ref()
            .map_or(14, |s| i64::from(s.default_payment_terms_days));

        let issue_date = Utc::now().date_naive();
        let due_date = issue_date + chrono::Duration::days(terms);

        let lines: Vec<DocumentLineInput> = existing
            .items
            .iter()
            .map(|i| DocumentLineInput {
                item_id: i.item_id,
                description: i.description.clone(),
                quantity: i.quantity,
                unit_price: i.unit_price,
            })
            .collect();

        let totals = DocumentTotals {
            subtotal: existing.quote.subtotal,
            discount_amount: existing.quote.discount_amount,
            tax_rate: existing.quote.tax_rate,
            tax_amount: existing.quote.tax_amount,
            total: existing.quote.total,
            line_totals: existing.items.iter().map(|i| i.line_total).collect(),
        };

        let txn = self.db.begin().await?;

        let number = SettingsRepository::allocate_number(
            &txn,
            user_id,
            DocumentKind::Invoice,
            document::counter_year(issue_date),
        )
        .await?;

        let created = InvoiceRepository::insert_with_items(
            &txn,
            InsertInvoiceParams {
                user_id,
                customer_id: existing.quote.customer_id,
                invoice_number: number,
                issue_date,
                due_date,
                currency: existing.quote.currency.clone(),
                totals,
                notes: existing.quote.notes.clone(),
                quote_id: Some(existing.quote.id),
                creation_note: Some(format!(
                    "converted from quote {}",
                    existing.quote.quote_number
                )),
            },
            &lines,
        )
        .await?;

        let mut quote_model: quotes::ActiveModel = existing.quote.into();
        quote_model.status = Set(QuoteStatus::Converted);
        quote_model.converted_invoice_id = Set(Some(created.invoice.id));
        quote_model.update(&txn).await?;

        txn.commit().await?;

        Ok(created)
    }
}
