//! User settings repository.
//!
//! Holds company info, document defaults, the PDF template choice, and
//! the per-year document number counters. Number allocation locks the
//! settings row so concurrent document creation never yields duplicates.

use std::str::FromStr;

use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ConnectionTrait, DatabaseConnection, DatabaseTransaction, DbErr,
    EntityTrait, QuerySelect, Set,
};
use uuid::Uuid;

use fakturo_core::document::{DocumentKind, format_document_number};
use fakturo_core::pdf::TemplatePreset;
use fakturo_shared::Currency;

use crate::entities::user_settings;

/// Error types for settings operations.
#[derive(Debug, thiserror::Error)]
pub enum SettingsError {
    /// Unknown currency code.
    #[error("Invalid currency code: {0}")]
    InvalidCurrency(String),

    /// Unknown PDF template preset.
    #[error("Invalid PDF template: {0}")]
    InvalidTemplate(String),

    /// Tax rate outside [0, 100].
    #[error("Default tax rate must be between 0 and 100")]
    InvalidTaxRate,

    /// Payment terms must be positive.
    #[error("Default payment terms must be at least 1 day")]
    InvalidPaymentTerms,

    /// Database error.
    #[error("Database error: {0}")]
    Database(#[from] DbErr),
}

/// Input for updating settings; `None` leaves a field untouched,
/// `Some(None)` clears a nullable field.
#[derive(Debug, Clone, Default)]
pub struct UpdateSettingsInput {
    /// Company display name.
    pub company_name: Option<String>,
    /// Street address.
    pub company_address_line1: Option<Option<String>>,
    /// Address supplement.
    pub company_address_line2: Option<Option<String>>,
    /// City.
    pub company_city: Option<Option<String>>,
    /// Postal code.
    pub company_postal_code: Option<Option<String>>,
    /// Country.
    pub company_country: Option<Option<String>>,
    /// Company contact email.
    pub company_email: Option<Option<String>>,
    /// Tax or VAT identifier.
    pub tax_id: Option<Option<String>>,
    /// Logo URL.
    pub logo_url: Option<Option<String>>,
    /// Default currency for new documents.
    pub default_currency: Option<String>,
    /// Default tax rate for new documents.
    pub default_tax_rate: Option<Decimal>,
    /// Default payment terms in days.
    pub default_payment_terms_days: Option<i32>,
    /// PDF template preset name.
    pub pdf_template: Option<String>,
}

/// Settings repository.
#[derive(Debug, Clone)]
pub struct SettingsRepository {
    db: DatabaseConnection,
}

impl SettingsRepository {
    /// Creates a new settings repository.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    fn default_model(user_id: Uuid) -> user_settings::ActiveModel {
        let now = chrono::Utc::now().into();
        user_settings::ActiveModel {
            user_id: Set(user_id),
            company_name: Set(String::new()),
            company_address_line1: Set(None),
            company_address_line2: Set(None),
            company_city: Set(None),
            company_postal_code: Set(None),
            company_country: Set(None),
            company_email: Set(None),
            tax_id: Set(None),
            logo_url: Set(None),
            default_currency: Set("EUR".to_string()),
            default_tax_rate: Set(Decimal::ZERO),
            default_payment_terms_days: Set(14),
            pdf_template: Set(TemplatePreset::default().as_str().to_string()),
            quote_counter: Set(0),
            invoice_counter: Set(0),
            counter_year: Set(0),
            created_at: Set(now),
            updated_at: Set(now),
        }
    }

    /// Returns the user's settings, creating the default row on first use.
    ///
    /// # Errors
    ///
    /// Returns an error if a database operation fails.
    pub async fn get_or_create(&self, user_id: Uuid) -> Result<user_settings::Model, DbErr> {
        if let Some(settings) = user_settings::Entity::find_by_id(user_id).one(&self.db).await? {
            return Ok(settings);
        }

        Self::default_model(user_id).insert(&self.db).await
    }

    /// Applies a partial settings update.
    ///
    /// # Errors
    ///
    /// Returns a validation error for unknown currencies/templates or
    /// out-of-range defaults, or a database error.
    pub async fn update(
        &self,
        user_id: Uuid,
        input: UpdateSettingsInput,
    ) -> Result<user_settings::Model, SettingsError> {
        if let Some(ref currency) = input.default_currency {
            if Currency::from_str(currency).is_err() {
                return Err(SettingsError::InvalidCurrency(currency.clone()));
            }
        }
        if let Some(ref template) = input.pdf_template {
            if TemplatePreset::from_str(template).is_err() {
                return Err(SettingsError::InvalidTemplate(template.clone()));
            }
        }
        if let Some(rate) = input.default_tax_rate {
            if rate < Decimal::ZERO || rate > Decimal::ONE_HUNDRED {
                return Err(SettingsError::InvalidTaxRate);
            }
        }
        if let Some(days) = input.default_payment_terms_days {
            if days < 1 {
                return Err(SettingsError::InvalidPaymentTerms);
            }
        }

        // Ensure the row exists before updating.
        self.get_or_create(user_id).await?;

        let mut model = user_settings::ActiveModel {
            user_id: Set(user_id),
            ..Default::default()
        };

        if let Some(v) = input.company_name {
            model.company_name = Set(v);
        }
        if let Some(v) = input.company_address_line1 {
            model.company_address_line1 = Set(v);
        }
        if let Some(v) = input.company_address_line2 {
            model.company_address_line2 = Set(v);
        }
        if let Some(v) = input.company_city {
            model.company_city = Set(v);
        }
        if let Some(v) = input.company_postal_code {
            model.company_postal_code = Set(v);
        }
        if let Some(v) = input.company_country {
            model.company_country = Set(v);
        }
        if let Some(v) = input.company_email {
            model.company_email = Set(v);
        }
        if let Some(v) = input.tax_id {
            model.tax_id = Set(v);
        }
        if let Some(v) = input.logo_url {
            model.logo_url = Set(v);
        }
        if let Some(v) = input.default_currency {
            model.default_currency = Set(v.to_uppercase());
        }
        if let Some(v) = input.default_tax_rate {
            model.default_tax_rate = Set(v);
        }
        if let Some(v) = input.default_payment_terms_days {
            model.default_payment_terms_days = Set(v);
        }
        if let Some(v) = input.pdf_template {
            model.pdf_template = Set(v.to_lowercase());
        }

        Ok(model.update(&self.db).await?)
    }

    /// Allocates the next document number inside an open transaction.
    ///
    /// The settings row is locked `FOR UPDATE` so concurrent creations
    /// serialize on the counter. Counters reset when the issue year
    /// changes.
    ///
    /// # Errors
    ///
    /// Returns an error if a database operation fails.
    pub async fn allocate_number(
        txn: &DatabaseTransaction,
        user_id: Uuid,
        kind: DocumentKind,
        year: i32,
    ) -> Result<String, DbErr> {
        let settings = user_settings::Entity::find_by_id(user_id)
            .lock_exclusive()
            .one(txn)
            .await?;

        let settings = match settings {
            Some(s) => s,
            None => Self::default_model(user_id).insert(txn).await?,
        };

        let (mut quote_counter, mut invoice_counter) = if settings.counter_year == year {
            (settings.quote_counter, settings.invoice_counter)
        } else {
            (0, 0)
        };

        let sequence = match kind {
            DocumentKind::Quote => {
                quote_counter += 1;
                quote_counter
            }
            DocumentKind::Invoice => {
                invoice_counter += 1;
                invoice_counter
            }
        };

        user_settings::ActiveModel {
            user_id: Set(user_id),
            quote_counter: Set(quote_counter),
            invoice_counter: Set(invoice_counter),
            counter_year: Set(year),
            ..Default::default()
        }
        .update(txn)
        .await?;

        Ok(format_document_number(kind, year, sequence.unsigned_abs()))
    }

    /// Fetches settings inside an open transaction (no row lock).
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn get_in<C: ConnectionTrait>(
        conn: &C,
        user_id: Uuid,
    ) -> Result<Option<user_settings::Model>, DbErr> {
        user_settings::Entity::find_by_id(user_id).one(conn).await
    }
}
