//! Catalog item repository for database operations.

use std::collections::HashSet;
use std::str::FromStr;

use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, DatabaseConnection, DbErr, EntityTrait,
    PaginatorTrait, QueryFilter, QueryOrder, QuerySelect, Set,
};
use uuid::Uuid;

use fakturo_core::import_export::ItemRow;
use fakturo_shared::{Currency, PageRequest};

use crate::entities::items;

/// Error types for catalog item operations.
#[derive(Debug, thiserror::Error)]
pub enum ItemError {
    /// Item not found (or owned by another user).
    #[error("Item not found: {0}")]
    NotFound(Uuid),

    /// An item with this SKU already exists for the user.
    #[error("An item with SKU {0} already exists")]
    DuplicateSku(String),

    /// Name must not be empty.
    #[error("Item name must not be empty")]
    EmptyName,

    /// Unit price must not be negative.
    #[error("Unit price must not be negative")]
    NegativePrice,

    /// Unknown currency code.
    #[error("Invalid currency code: {0}")]
    InvalidCurrency(String),

    /// Database error.
    #[error("Database error: {0}")]
    Database(#[from] DbErr),
}

/// Input for creating or updating a catalog item.
#[derive(Debug, Clone)]
pub struct UpsertItemInput {
    /// Item name.
    pub name: String,
    /// Description.
    pub description: Option<String>,
    /// Unit of sale.
    pub unit: Option<String>,
    /// Price per unit.
    pub unit_price: Decimal,
    /// ISO 4217 currency code.
    pub currency: String,
    /// SKU, unique per user when present.
    pub sku: Option<String>,
}

/// Filter options for listing items.
#[derive(Debug, Clone, Default)]
pub struct ItemFilter {
    /// Case-insensitive substring match on name or SKU.
    pub search: Option<String>,
    /// Include archived items.
    pub include_archived: bool,
}

/// Catalog item repository for CRUD operations.
#[derive(Debug, Clone)]
pub struct ItemRepository {
    db: DatabaseConnection,
}

impl ItemRepository {
    /// Creates a new item repository.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    fn validate(input: &UpsertItemInput) -> Result<(), ItemError> {
        if input.name.trim().is_empty() {
            return Err(ItemError::EmptyName);
        }
        if input.unit_price < Decimal::ZERO {
            return Err(ItemError::NegativePrice);
        }
        if Currency::from_str(&input.currency).is_err() {
            return Err(ItemError::InvalidCurrency(input.currency.clone()));
        }
        Ok(())
    }

    async fn sku_taken(
        &self,
        user_id: Uuid,
        sku: &str,
        exclude: Option<Uuid>,
    ) -> Result<bool, DbErr> {
        let mut query = items::Entity::find()
            .filter(items::Column::UserId.eq(user_id))
            .filter(items::Column::Sku.eq(sku));

        if let Some(id) = exclude {
            query = query.filter(items::Column::Id.ne(id));
        }

        Ok(query.count(&self.db).await? > 0)
    }

    /// Creates a catalog item.
    ///
    /// # Errors
    ///
    /// Returns an error if validation fails or the SKU is taken.
    pub async fn create(
        &self,
        user_id: Uuid,
        input: UpsertItemInput,
    ) -> Result<items::Model, ItemError> {
        Self::validate(&input)?;

        if let Some(sku) = input.sku.as_deref().filter(|s| !s.is_empty()) {
            if self.sku_taken(user_id, sku, None).await? {
                return Err(ItemError::DuplicateSku(sku.to_string()));
            }
        }

        let now = chrono::Utc::now().into();
        let item = items::ActiveModel {
            id: Set(Uuid::new_v4()),
            user_id: Set(user_id),
            name: Set(input.name),
            description: Set(input.description),
            unit: Set(input.unit),
            unit_price: Set(input.unit_price),
            currency: Set(input.currency.to_uppercase()),
            sku: Set(input.sku.filter(|s| !s.is_empty())),
            archived_at: Set(None),
            created_at: Set(now),
            updated_at: Set(now),
        };

        Ok(item.insert(&self.db).await?)
    }

    /// Finds an item by ID, scoped to the owning user.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn find_by_id(&self, user_id: Uuid, id: Uuid) -> Result<Option<items::Model>, DbErr> {
        items::Entity::find_by_id(id)
            .filter(items::Column::UserId.eq(user_id))
            .one(&self.db)
            .await
    }

    /// Lists items with optional search, active items first.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn list(
        &self,
        user_id: Uuid,
        filter: &ItemFilter,
        page: &PageRequest,
    ) -> Result<(Vec<items::Model>, u64), DbErr> {
        let mut query = items::Entity::find().filter(items::Column::UserId.eq(user_id));

        if !filter.include_archived {
            query = query.filter(items::Column::ArchivedAt.is_null());
        }

        if let Some(term) = filter.search.as_deref().filter(|t| !t.is_empty()) {
            query = query.filter(
                Condition::any()
                    .add(items::Column::Name.contains(term))
                    .add(items::Column::Sku.contains(term)),
            );
        }

        let total = query.clone().count(&self.db).await?;
        let rows = query
            .order_by_asc(items::Column::Name)
            .offset(page.offset())
            .limit(page.limit())
            .all(&self.db)
            .await?;

        Ok((rows, total))
    }

    /// Applies a full update to an item.
    ///
    /// # Errors
    ///
    /// Returns `ItemError::NotFound` if the item does not exist for this
    /// user, or `ItemError::DuplicateSku` on a SKU collision.
    pub async fn update(
        &self,
        user_id: Uuid,
        id: Uuid,
        input: UpsertItemInput,
    ) -> Result<items::Model, ItemError> {
        Self::validate(&input)?;

        let existing = self
            .find_by_id(user_id, id)
            .await?
            .ok_or(ItemError::NotFound(id))?;

        if let Some(sku) = input.sku.as_deref().filter(|s| !s.is_empty()) {
            if self.sku_taken(user_id, sku, Some(id)).await? {
                return Err(ItemError::DuplicateSku(sku.to_string()));
            }
        }

        let mut model: items::ActiveModel = existing.into();
        model.name = Set(input.name);
        model.description = Set(input.description);
        model.unit = Set(input.unit);
        model.unit_price = Set(input.unit_price);
        model.currency = Set(input.currency.to_uppercase());
        model.sku = Set(input.sku.filter(|s| !s.is_empty()));

        Ok(model.update(&self.db).await?)
    }

    /// Sets or clears the archived flag.
    ///
    /// # Errors
    ///
    /// Returns `ItemError::NotFound` if the item does not exist for this
    /// user.
    pub async fn set_archived(
        &self,
        user_id: Uuid,
        id: Uuid,
        archived: bool,
    ) -> Result<items::Model, ItemError> {
        let existing = self
            .find_by_id(user_id, id)
            .await?
            .ok_or(ItemError::NotFound(id))?;

        let mut model: items::ActiveModel = existing.into();
        model.archived_at = Set(archived.then(|| chrono::Utc::now().into()));

        Ok(model.update(&self.db).await?)
    }

    /// Deletes an item. Existing document lines keep their snapshot of
    /// the description and price; their item reference is nulled.
    ///
    /// # Errors
    ///
    /// Returns `ItemError::NotFound` if the item does not exist for this
    /// user.
    pub async fn delete(&self, user_id: Uuid, id: Uuid) -> Result<(), ItemError> {
        let item = self
            .find_by_id(user_id, id)
            .await?
            .ok_or(ItemError::NotFound(id))?;

        items::Entity::delete_by_id(item.id).exec(&self.db).await?;

        Ok(())
    }

    /// Returns all SKUs for a user, lowercased, for import duplicate
    /// detection.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn skus_for_user(&self, user_id: Uuid) -> Result<HashSet<String>, DbErr> {
        let rows: Vec<Option<String>> = items::Entity::find()
            .filter(items::Column::UserId.eq(user_id))
            .select_only()
            .column(items::Column::Sku)
            .into_tuple()
            .all(&self.db)
            .await?;

        Ok(rows
            .into_iter()
            .flatten()
            .map(|s| s.to_lowercase())
            .collect())
    }

    /// Inserts items parsed from a CSV import.
    ///
    /// Returns the number of inserted rows.
    ///
    /// # Errors
    ///
    /// Returns an error if the database insert fails.
    pub async fn insert_import_rows(
        &self,
        user_id: Uuid,
        rows: Vec<ItemRow>,
    ) -> Result<usize, DbErr> {
        if rows.is_empty() {
            return Ok(0);
        }

        let now: chrono::DateTime<chrono::FixedOffset> = chrono::Utc::now().into();
        let count = rows.len();

        let models: Vec<items::ActiveModel> = rows
            .into_iter()
            .map(|row| items::ActiveModel {
                id: Set(Uuid::new_v4()),
                user_id: Set(user_id),
                name: Set(row.name),
                description: Set(row.description),
                unit: Set(row.unit),
                unit_price: Set(row.unit_price),
                currency: Set(row.currency.to_uppercase()),
                sku: Set(row.sku.filter(|s| !s.is_empty())),
                archived_at: Set(None),
                created_at: Set(now),
                updated_at: Set(now),
            })
            .collect();

        items::Entity::insert_many(models).exec(&self.db).await?;

        Ok(count)
    }

    /// Exports all of a user's items as CSV rows.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn export_rows(&self, user_id: Uuid) -> Result<Vec<ItemRow>, DbErr> {
        let rows = items::Entity::find()
            .filter(items::Column::UserId.eq(user_id))
            .order_by_asc(items::Column::Name)
            .all(&self.db)
            .await?;

        Ok(rows
            .into_iter()
            .map(|i| ItemRow {
                name: i.name,
                description: i.description,
                unit: i.unit,
                unit_price: i.unit_price,
                currency: i.currency,
                sku: i.sku,
            })
            .collect())
    }
}
