//! Customer repository for database operations.

use std::collections::HashSet;

use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, DatabaseConnection, DbErr, EntityTrait,
    PaginatorTrait, QueryFilter, QueryOrder, QuerySelect, Set,
};
use uuid::Uuid;

use fakturo_core::import_export::CustomerRow;
use fakturo_shared::PageRequest;

use crate::entities::{customers, invoices, quotes};

/// Error types for customer operations.
#[derive(Debug, thiserror::Error)]
pub enum CustomerError {
    /// Customer not found (or owned by another user).
    #[error("Customer not found: {0}")]
    NotFound(Uuid),

    /// Customer has quotes or invoices and cannot be deleted.
    #[error("Customer has existing documents and cannot be deleted")]
    HasDocuments,

    /// Name must not be empty.
    #[error("Customer name must not be empty")]
    EmptyName,

    /// Database error.
    #[error("Database error: {0}")]
    Database(#[from] DbErr),
}

/// Input for creating or updating a customer.
#[derive(Debug, Clone, Default)]
pub struct UpsertCustomerInput {
    /// Display name.
    pub name: String,
    /// Contact email.
    pub email: Option<String>,
    /// Phone number.
    pub phone: Option<String>,
    /// Street address.
    pub address_line1: Option<String>,
    /// Address supplement.
    pub address_line2: Option<String>,
    /// City.
    pub city: Option<String>,
    /// Postal code.
    pub postal_code: Option<String>,
    /// Country.
    pub country: Option<String>,
    /// Avatar image URL.
    pub avatar_url: Option<String>,
    /// Free-form notes.
    pub notes: Option<String>,
}

/// Filter options for listing customers.
#[derive(Debug, Clone, Default)]
pub struct CustomerFilter {
    /// Case-insensitive substring match on name or email.
    pub search: Option<String>,
}

/// Customer repository for CRUD operations.
#[derive(Debug, Clone)]
pub struct CustomerRepository {
    db: DatabaseConnection,
}

impl CustomerRepository {
    /// Creates a new customer repository.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Creates a customer for a user.
    ///
    /// # Errors
    ///
    /// Returns an error if validation or the database insert fails.
    pub async fn create(
        &self,
        user_id: Uuid,
        input: UpsertCustomerInput,
    ) -> Result<customers::Model, CustomerError> {
        if input.name.trim().is_empty() {
            return Err(CustomerError::EmptyName);
        }

        let now = chrono::Utc::now().into();
        let customer = customers::ActiveModel {
            id: Set(Uuid::new_v4()),
            user_id: Set(user_id),
            name: Set(input.name),
            email: Set(input.email),
            phone: Set(input.phone),
            address_line1: Set(input.address_line1),
            address_line2: Set(input.address_line2),
            city: Set(input.city),
            postal_code: Set(input.postal_code),
            country: Set(input.country),
            avatar_url: Set(input.avatar_url),
            notes: Set(input.notes),
            created_at: Set(now),
            updated_at: Set(now),
        };

        Ok(customer.insert(&self.db).await?)
    }

    /// Finds a customer by ID, scoped to the owning user.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn find_by_id(
        &self,
        user_id: Uuid,
        id: Uuid,
    ) -> Result<Option<customers::Model>, DbErr> {
        customers::Entity::find_by_id(id)
            .filter(customers::Column::UserId.eq(user_id))
            .one(&self.db)
            .await
    }

    /// Lists customers with optional search, newest first.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn list(
        &self,
        user_id: Uuid,
        filter: &CustomerFilter,
        page: &PageRequest,
    ) -> Result<(Vec<customers::Model>, u64), DbErr> {
        let mut query = customers::Entity::find().filter(customers::Column::UserId.eq(user_id));

        if let Some(term) = filter.search.as_deref().filter(|t| !t.is_empty()) {
            query = query.filter(
                Condition::any()
                    .add(customers::Column::Name.contains(term))
                    .add(customers::Column::Email.contains(term)),
            );
        }

        let total = query.clone().count(&self.db).await?;
        let rows = query
            .order_by_desc(customers::Column::CreatedAt)
            .offset(page.offset())
            .limit(page.limit())
            .all(&self.db)
            .await?;

        Ok((rows, total))
    }

    /// Applies a full update to a customer.
    ///
    /// # Errors
    ///
    /// Returns `CustomerError::NotFound` if the customer does not exist
    /// for this user.
    pub async fn update(
        &self,
        user_id: Uuid,
        id: Uuid,
        input: UpsertCustomerInput,
    ) -> Result<customers::Model, CustomerError> {
        if input.name.trim().is_empty() {
            return Err(CustomerError::EmptyName);
        }

        let existing = self
            .find_by_id(user_id, id)
            .await?
            .ok_or(CustomerError::NotFound(id))?;

        let mut model: customers::ActiveModel = existing.into();
        model.name = Set(input.name);
        model.email = Set(input.email);
        model.phone = Set(input.phone);
        model.address_line1 = Set(input.address_line1);
        model.address_line2 = Set(input.address_line2);
        model.city = Set(input.city);
        model.postal_code = Set(input.postal_code);
        model.country = Set(input.country);
        model.avatar_url = Set(input.avatar_url);
        model.notes = Set(input.notes);

        Ok(model.update(&self.db).await?)
    }

    /// Deletes a customer, blocked while quotes or invoices reference it.
    ///
    /// # Errors
    ///
    /// Returns `CustomerError::HasDocuments` when the customer is still
    /// referenced.
    pub async fn delete(&self, user_id: Uuid, id: Uuid) -> Result<(), CustomerError> {
        let customer = self
            .find_by_id(user_id, id)
            .await?
            .ok_or(CustomerError::NotFound(id))?;

        let quote_count = quotes::Entity::find()
            .filter(quotes::Column::CustomerId.eq(id))
            .count(&self.db)
            .await?;
        let invoice_count = invoices::Entity::find()
            .filter(invoices::Column::CustomerId.eq(id))
            .count(&self.db)
            .await?;

        if quote_count > 0 || invoice_count > 0 {
            return Err(CustomerError::HasDocuments);
        }

        customers::Entity::delete_by_id(customer.id)
            .exec(&self.db)
            .await?;

        Ok(())
    }

    /// Returns all customer emails for a user, lowercased, for import
    /// duplicate detection.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn emails_for_user(&self, user_id: Uuid) -> Result<HashSet<String>, DbErr> {
        let rows: Vec<Option<String>> = customers::Entity::find()
            .filter(customers::Column::UserId.eq(user_id))
            .select_only()
            .column(customers::Column::Email)
            .into_tuple()
            .all(&self.db)
            .await?;

        Ok(rows
            .into_iter()
            .flatten()
            .map(|e| e.to_lowercase())
            .collect())
    }

    /// Inserts customers parsed from a CSV import.
    ///
    /// Returns the number of inserted rows.
    ///
    /// # Errors
    ///
    /// Returns an error if the database insert fails.
    pub async fn insert_import_rows(
        &self,
        user_id: Uuid,
        rows: Vec<CustomerRow>,
    ) -> Result<usize, DbErr> {
        if rows.is_empty() {
            return Ok(0);
        }

        let now: chrono::DateTime<chrono::FixedOffset> = chrono::Utc::now().into();
        let count = rows.len();

        let models: Vec<customers::ActiveModel> = rows
            .into_iter()
            .map(|row| customers::ActiveModel {
                id: Set(Uuid::new_v4()),
                user_id: Set(user_id),
                name: Set(row.name),
                email: Set(Some(row.email)),
                phone: Set(row.phone),
                address_line1: Set(row.address_line1),
                address_line2: Set(row.address_line2),
                city: Set(row.city),
                postal_code: Set(row.postal_code),
                country: Set(row.country),
                avatar_url: Set(None),
                notes: Set(row.notes),
                created_at: Set(now),
                updated_at: Set(now),
            })
            .collect();

        customers::Entity::insert_many(models).exec(&self.db).await?;

        Ok(count)
    }

    /// Exports all of a user's customers as CSV rows.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn export_rows(&self, user_id: Uuid) -> Result<Vec<CustomerRow>, DbErr> {
        let rows = customers::Entity::find()
            .filter(customers::Column::UserId.eq(user_id))
            .order_by_asc(customers::Column::Name)
            .all(&self.db)
            .await?;

        Ok(rows
            .into_iter()
            .map(|c| CustomerRow {
                name: c.name,
                email: c.email.unwrap_or_default(),
                phone: c.phone,
                address_line1: c.address_line1,
                address_line2: c.address_line2,
                city: c.city,
                postal_code: c.postal_code,
                country: c.country,
                notes: c.notes,
            })
            .collect())
    }
}
