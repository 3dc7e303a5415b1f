//! Notification repository for user-facing event records.
//!
//! Notifications are append-only side effects of document events; the
//! only mutation is marking them read, the only deletion is explicit
//! cleanup.

use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, DbErr, EntityTrait, PaginatorTrait,
    QueryFilter, QueryOrder, QuerySelect, Set,
};
use uuid::Uuid;

use fakturo_shared::PageRequest;

use crate::entities::notifications;

/// Notification repository.
#[derive(Debug, Clone)]
pub struct NotificationRepository {
    db: DatabaseConnection,
}

impl NotificationRepository {
    /// Creates a new notification repository.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Records a notification for a user.
    ///
    /// # Errors
    ///
    /// Returns an error if the database insert fails.
    pub async fn create(
        &self,
        user_id: Uuid,
        kind: &str,
        title: &str,
        body: &str,
        entity_type: Option<&str>,
        entity_id: Option<Uuid>,
    ) -> Result<notifications::Model, DbErr> {
        let notification = notifications::ActiveModel {
            id: Set(Uuid::new_v4()),
            user_id: Set(user_id),
            kind: Set(kind.to_string()),
            title: Set(title.to_string()),
            body: Set(body.to_string()),
            entity_type: Set(entity_type.map(String::from)),
            entity_id: Set(entity_id),
            read_at: Set(None),
            created_at: Set(chrono::Utc::now().into()),
        };

        notification.insert(&self.db).await
    }

    /// Lists notifications, newest first.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn list(
        &self,
        user_id: Uuid,
        unread_only: bool,
        page: &PageRequest,
    ) -> Result<(Vec<notifications::Model>, u64), DbErr> {
        let mut query =
            notifications::Entity::find().filter(notifications::Column::UserId.eq(user_id));

        if unread_only {
            query = query.filter(notifications::Column::ReadAt.is_null());
        }

        let total = query.clone().count(&self.db).await?;
        let rows = query
            .order_by_desc(notifications::Column::CreatedAt)
            .offset(page.offset())
            .limit(page.limit())
            .all(&self.db)
            .await?;

        Ok((rows, total))
    }

    /// Counts unread notifications for the badge.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn unread_count(&self, user_id: Uuid) -> Result<u64, DbErr> {
        notifications::Entity::find()
            .filter(notifications::Column::UserId.eq(user_id))
            .filter(notifications::Column::ReadAt.is_null())
            .count(&self.db)
            .await
    }

    /// Marks one notification read. Returns `false` if it does not exist
    /// for this user.
    ///
    /// # Errors
    ///
    /// Returns an error if a database operation fails.
    pub async fn mark_read(&self, user_id: Uuid, id: Uuid) -> Result<bool, DbErr> {
        let existing = notifications::Entity::find_by_id(id)
            .filter(notifications::Column::UserId.eq(user_id))
            .one(&self.db)
            .await?;

        let Some(existing) = existing else {
            return Ok(false);
        };

        if existing.read_at.is_none() {
            let mut model: notifications::ActiveModel = existing.into();
            model.read_at = Set(Some(chrono::Utc::now().into()));
            model.update(&self.db).await?;
        }

        Ok(true)
    }

    /// Marks all of a user's notifications read; returns how many.
    ///
    /// # Errors
    ///
    /// Returns an error if the database update fails.
    pub async fn mark_all_read(&self, user_id: Uuid) -> Result<u64, DbErr> {
        let now: chrono::DateTime<chrono::FixedOffset> = chrono::Utc::now().into();

        let result = notifications::Entity::update_many()
            .col_expr(
                notifications::Column::ReadAt,
                sea_orm::sea_query::Expr::value(Some(now)),
            )
            .filter(notifications::Column::UserId.eq(user_id))
            .filter(notifications::Column::ReadAt.is_null())
            .exec(&self.db)
            .await?;

        Ok(result.rows_affected)
    }

    /// Deletes one notification. Returns `false` if it does not exist for
    /// this user.
    ///
    /// # Errors
    ///
    /// Returns an error if the database delete fails.
    pub async fn delete(&self, user_id: Uuid, id: Uuid) -> Result<bool, DbErr> {
        let result = notifications::Entity::delete_many()
            .filter(notifications::Column::Id.eq(id))
            .filter(notifications::Column::UserId.eq(user_id))
            .exec(&self.db)
            .await?;

        Ok(result.rows_affected > 0)
    }

    /// Deletes read notifications older than `days` days; the cleanup
    /// maintenance action.
    ///
    /// # Errors
    ///
    /// Returns an error if the database delete fails.
    pub async fn delete_read_older_than(&self, user_id: Uuid, days: i64) -> Result<u64, DbErr> {
        let cutoff = chrono::Utc::now() - chrono::Duration::days(days);

        let result = notifications::Entity::delete_many()
            .filter(notifications::Column::UserId.eq(user_id))
            .filter(notifications::Column::ReadAt.is_not_null())
            .filter(notifications::Column::CreatedAt.lt(cutoff))
            .exec(&self.db)
            .await?;

        Ok(result.rows_affected)
    }
}
