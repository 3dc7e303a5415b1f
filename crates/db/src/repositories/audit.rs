//! Audit log repository.
//!
//! Append-only. Failures to write an audit row are logged and swallowed
//! by callers; auditing must never take down the main operation.

use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, DbErr, EntityTrait, PaginatorTrait,
    QueryFilter, QueryOrder, QuerySelect, Set,
};
use uuid::Uuid;

use fakturo_shared::PageRequest;

use crate::entities::audit_logs;

/// Audit log repository.
#[derive(Debug, Clone)]
pub struct AuditRepository {
    db: DatabaseConnection,
}

impl AuditRepository {
    /// Creates a new audit repository.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Records an audit event.
    ///
    /// # Errors
    ///
    /// Returns an error if the database insert fails.
    pub async fn record(
        &self,
        user_id: Option<Uuid>,
        action: &str,
        entity_type: Option<&str>,
        entity_id: Option<Uuid>,
        detail: serde_json::Value,
        ip_address: Option<&str>,
    ) -> Result<audit_logs::Model, DbErr> {
        let entry = audit_logs::ActiveModel {
            id: Set(Uuid::new_v4()),
            user_id: Set(user_id),
            action: Set(action.to_string()),
            entity_type: Set(entity_type.map(String::from)),
            entity_id: Set(entity_id),
            detail: Set(detail),
            ip_address: Set(ip_address.map(String::from)),
            created_at: Set(chrono::Utc::now().into()),
        };

        entry.insert(&self.db).await
    }

    /// Lists a user's audit events, newest first, optionally filtered by
    /// action.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn list(
        &self,
        user_id: Uuid,
        action: Option<&str>,
        page: &PageRequest,
    ) -> Result<(Vec<audit_logs::Model>, u64), DbErr> {
        let mut query = audit_logs::Entity::find().filter(audit_logs::Column::UserId.eq(user_id));

        if let Some(action) = action.filter(|a| !a.is_empty()) {
            query = query.filter(audit_logs::Column::Action.eq(action));
        }

        let total = query.clone().count(&self.db).await?;
        let rows = query
            .order_by_desc(audit_logs::Column::CreatedAt)
            .offset(page.offset())
            .limit(page.limit())
            .all(&self.db)
            .await?;

        Ok((rows, total))
    }
}
