//! User settings routes.

use axum::{
    Json, Router,
    extract::State,
    http::StatusCode,
    response::IntoResponse,
    routing::{get, patch},
};
use rust_decimal::Decimal;
use serde::Deserialize;
use serde_json::json;
use tracing::{error, info};

use crate::{AppState, middleware::AuthUser};
use fakturo_core::pdf::TemplatePreset;
use fakturo_db::SettingsRepository;
use fakturo_db::entities::user_settings;
use fakturo_db::repositories::settings::{SettingsError, UpdateSettingsInput};

/// Creates the settings router (requires auth middleware).
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/settings", get(get_settings))
        .route("/settings", patch(update_settings))
}

/// Settings update payload; absent fields stay unchanged, explicit
/// nulls clear nullable fields.
#[derive(Debug, Default, Deserialize)]
struct SettingsPayload {
    company_name: Option<String>,
    #[serde(default, with = "double_option")]
    company_address_line1: Option<Option<String>>,
    #[serde(default, with = "double_option")]
    company_address_line2: Option<Option<String>>,
    #[serde(default, with = "double_option")]
    company_city: Option<Option<String>>,
    #[serde(default, with = "double_option")]
    company_postal_code: Option<Option<String>>,
    #[serde(default, with = "double_option")]
    company_country: Option<Option<String>>,
    #[serde(default, with = "double_option")]
    company_email: Option<Option<String>>,
    #[serde(default, with = "double_option")]
    tax_id: Option<Option<String>>,
    #[serde(default, with = "double_option")]
    logo_url: Option<Option<String>>,
    default_currency: Option<String>,
    default_tax_rate: Option<Decimal>,
    default_payment_terms_days: Option<i32>,
    pdf_template: Option<String>,
}

/// Serde helper distinguishing "absent" from "null".
mod double_option {
    use serde::{Deserialize, Deserializer};

    pub fn deserialize<'de, T, D>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
    where
        T: Deserialize<'de>,
        D: Deserializer<'de>,
    {
        Option::<T>::deserialize(deserializer).map(Some)
    }
}

fn settings_json(s: &user_settings::Model) -> serde_json::Value {
    json!({
        "company_name": s.company_name,
        "company_address_line1": s.company_address_line1,
        "company_address_line2": s.company_address_line2,
        "company_city": s.company_city,
        "company_postal_code": s.company_postal_code,
        "company_country": s.company_country,
        "company_email": s.company_email,
        "tax_id": s.tax_id,
        "logo_url": s.logo_url,
        "default_currency": s.default_currency,
        "default_tax_rate": s.default_tax_rate,
        "default_payment_terms_days": s.default_payment_terms_days,
        "pdf_template": s.pdf_template,
        "available_templates": TemplatePreset::ALL
            .iter()
            .map(|t| t.as_str())
            .collect::<Vec<_>>(),
        "updated_at": s.updated_at
    })
}

/// GET /settings - Fetch settings, creating defaults on first access.
async fn get_settings(State(state): State<AppState>, auth: AuthUser) -> impl IntoResponse {
    let repo = SettingsRepository::new((*state.db).clone());

    match repo.get_or_create(auth.user_id()).await {
        Ok(settings) => (StatusCode::OK, Json(settings_json(&settings))).into_response(),
        Err(e) => {
            error!(error = %e, "Database error fetching settings");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({
                    "error": "internal_error",
                    "message": "An error occurred"
                })),
            )
                .into_response()
        }
    }
}

/// PATCH /settings - Apply a partial settings update.
async fn update_settings(
    State(state): State<AppState>,
    auth: AuthUser,
    Json(payload): Json<SettingsPayload>,
) -> impl IntoResponse {
    let repo = SettingsRepository::new((*state.db).clone());

    let input = UpdateSettingsInput {
        company_name: payload.company_name,
        company_address_line1: payload.company_address_line1,
        company_address_line2: payload.company_address_line2,
        company_city: payload.company_city,
        company_postal_code: payload.company_postal_code,
        company_country: payload.company_country,
        company_email: payload.company_email,
        tax_id: payload.tax_id,
        logo_url: payload.logo_url,
        default_currency: payload.default_currency,
        default_tax_rate: payload.default_tax_rate,
        default_payment_terms_days: payload.default_payment_terms_days,
        pdf_template: payload.pdf_template,
    };

    match repo.update(auth.user_id(), input).await {
        Ok(settings) => {
            info!(user_id = %auth.user_id(), "Settings updated");
            (StatusCode::OK, Json(settings_json(&settings))).into_response()
        }
        Err(SettingsError::InvalidCurrency(code)) => (
            StatusCode::BAD_REQUEST,
            Json(json!({
                "error": "invalid_currency",
                "message": format!("Invalid currency code: {code}")
            })),
        )
            .into_response(),
        Err(SettingsError::InvalidTemplate(name)) => (
            StatusCode::BAD_REQUEST,
            Json(json!({
                "error": "invalid_template",
                "message": format!("Invalid PDF template: {name}")
            })),
        )
            .into_response(),
        Err(e @ (SettingsError::InvalidTaxRate | SettingsError::InvalidPaymentTerms)) => (
            StatusCode::BAD_REQUEST,
            Json(json!({
                "error": "invalid_value",
                "message": e.to_string()
            })),
        )
            .into_response(),
        Err(SettingsError::Database(e)) => {
            error!(error = %e, "Database error updating settings");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({
                    "error": "internal_error",
                    "message": "An error occurred"
                })),
            )
                .into_response()
        }
    }
}
