//! User repository for database operations.

use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, DbErr, EntityTrait, PaginatorTrait,
    QueryFilter, Set,
};
use uuid::Uuid;

use crate::entities::{recovery_codes, users};

/// User repository for CRUD operations.
#[derive(Debug, Clone)]
pub struct UserRepository {
    db: DatabaseConnection,
}

impl UserRepository {
    /// Creates a new user repository.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Finds a user by email.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn find_by_email(&self, email: &str) -> Result<Option<users::Model>, DbErr> {
        users::Entity::find()
            .filter(users::Column::Email.eq(email))
            .one(&self.db)
            .await
    }

    /// Finds a user by ID.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn find_by_id(&self, id: Uuid) -> Result<Option<users::Model>, DbErr> {
        users::Entity::find_by_id(id).one(&self.db).await
    }

    /// Creates a new user.
    ///
    /// # Errors
    ///
    /// Returns an error if the database insert fails.
    pub async fn create(
        &self,
        email: &str,
        password_hash: &str,
        full_name: &str,
    ) -> Result<users::Model, DbErr> {
        let now = chrono::Utc::now().into();
        let user = users::ActiveModel {
            id: Set(Uuid::new_v4()),
            email: Set(email.to_lowercase()),
            password_hash: Set(password_hash.to_string()),
            full_name: Set(full_name.to_string()),
            is_active: Set(true),
            totp_secret: Set(None),
            totp_enabled_at: Set(None),
            email_verified_at: Set(None),
            created_at: Set(now),
            updated_at: Set(now),
        };

        user.insert(&self.db).await
    }

    /// Checks if an email is already registered.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn email_exists(&self, email: &str) -> Result<bool, DbErr> {
        let count = users::Entity::find()
            .filter(users::Column::Email.eq(email))
            .count(&self.db)
            .await?;

        Ok(count > 0)
    }

    /// Stores a pending TOTP secret (setup step, not yet enabled).
    ///
    /// # Errors
    ///
    /// Returns an error if the database update fails.
    pub async fn set_totp_secret(
        &self,
        user_id: Uuid,
        secret: Option<String>,
    ) -> Result<(), DbErr> {
        users::ActiveModel {
            id: Set(user_id),
            totp_secret: Set(secret),
            ..Default::default()
        }
        .update(&self.db)
        .await?;

        Ok(())
    }

    /// Marks two-factor as enabled and replaces the user's recovery codes.
    ///
    /// # Errors
    ///
    /// Returns an error if a database operation fails.
    pub async fn enable_totp(&self, user_id: Uuid, code_hashes: &[String]) -> Result<(), DbErr> {
        let now: chrono::DateTime<chrono::Utc> = chrono::Utc::now();

        users::ActiveModel {
            id: Set(user_id),
            totp_enabled_at: Set(Some(now.into())),
            ..Default::default()
        }
        .update(&self.db)
        .await?;

        self.replace_recovery_codes(user_id, code_hashes).await
    }

    /// Disables two-factor: clears the secret and deletes recovery codes.
    ///
    /// # Errors
    ///
    /// Returns an error if a database operation fails.
    pub async fn disable_totp(&self, user_id: Uuid) -> Result<(), DbErr> {
        users::ActiveModel {
            id: Set(user_id),
            totp_secret: Set(None),
            totp_enabled_at: Set(None),
            ..Default::default()
        }
        .update(&self.db)
        .await?;

        recovery_codes::Entity::delete_many()
            .filter(recovery_codes::Column::UserId.eq(user_id))
            .exec(&self.db)
            .await?;

        Ok(())
    }

    /// Deletes all existing recovery codes and inserts the new hashes.
    ///
    /// # Errors
    ///
    /// Returns an error if a database operation fails.
    pub async fn replace_recovery_codes(
        &self,
        user_id: Uuid,
        code_hashes: &[String],
    ) -> Result<(), DbErr> {
        recovery_codes::Entity::delete_many()
            .filter(recovery_codes::Column::UserId.eq(user_id))
            .exec(&self.db)
            .await?;

        let now = chrono::Utc::now();
        let models: Vec<recovery_codes::ActiveModel> = code_hashes
            .iter()
            .map(|hash| recovery_codes::ActiveModel {
                id: Set(Uuid::new_v4()),
                user_id: Set(user_id),
                code_hash: Set(hash.clone()),
                used_at: Set(None),
                created_at: Set(now.into()),
            })
            .collect();

        if !models.is_empty() {
            recovery_codes::Entity::insert_many(models)
                .exec(&self.db)
                .await?;
        }

        Ok(())
    }

    /// Consumes an unused recovery code matching the hash.
    ///
    /// Returns `true` if a code was found and marked used.
    ///
    /// # Errors
    ///
    /// Returns an error if a database operation fails.
    pub async fn consume_recovery_code(
        &self,
        user_id: Uuid,
        code_hash: &str,
    ) -> Result<bool, DbErr> {
        let code = recovery_codes::Entity::find()
            .filter(recovery_codes::Column::UserId.eq(user_id))
            .filter(recovery_codes::Column::CodeHash.eq(code_hash))
            .filter(recovery_codes::Column::UsedAt.is_null())
            .one(&self.db)
            .await?;

        let Some(code) = code else {
            return Ok(false);
        };

        recovery_codes::ActiveModel {
            id: Set(code.id),
            used_at: Set(Some(chrono::Utc::now().into())),
            ..Default::default()
        }
        .update(&self.db)
        .await?;

        Ok(true)
    }

    /// Counts the user's unused recovery codes.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn unused_recovery_code_count(&self, user_id: Uuid) -> Result<u64, DbErr> {
        recovery_codes::Entity::find()
            .filter(recovery_codes::Column::UserId.eq(user_id))
            .filter(recovery_codes::Column::UsedAt.is_null())
            .count(&self.db)
            .await
    }
}
