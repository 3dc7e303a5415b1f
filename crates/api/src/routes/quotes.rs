//! Quote management routes.

use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::{StatusCode, header},
    response::IntoResponse,
    routing::{delete, get, patch, post},
};
use rust_decimal::Decimal;
use serde::Deserialize;
use serde_json::json;
use tracing::{error, info};

use crate::routes::render::render_quote_pdf;
use crate::{AppState, middleware::AuthUser};
use fakturo_db::entities::sea_orm_active_enums::QuoteStatus;
use fakturo_db::entities::{quote_items, quotes};
use fakturo_db::repositories::invoice::DocumentLineInput;
use fakturo_db::repositories::quote::{
    CreateQuoteInput, QuoteError, QuoteFilter, QuoteWithItems, UpdateQuoteInput,
};
use fakturo_db::{
    AuditRepository, CustomerRepository, NotificationRepository, QuoteRepository,
    SettingsRepository,
};
use fakturo_shared::{Money, PageRequest, PageResponse};

/// Creates the quotes router (requires auth middleware).
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/quotes", get(list_quotes))
        .route("/quotes", post(create_quote))
        .route("/quotes/{id}", get(get_quote))
        .route("/quotes/{id}", patch(update_quote))
        .route("/quotes/{id}", delete(delete_quote))
        .route("/quotes/{id}/send", post(send_quote))
        .route("/quotes/{id}/mark-seen", post(mark_seen))
        .route("/quotes/{id}/convert", post(convert_quote))
        .route("/quotes/{id}/pdf", get(quote_pdf))
}

/// One line item in a document payload.
#[derive(Debug, Deserialize)]
struct LinePayload {
    item_id: Option<uuid::Uuid>,
    description: String,
    quantity: Decimal,
    unit_price: Decimal,
}

impl LinePayload {
    fn into_input(self) -> DocumentLineInput {
        DocumentLineInput {
            item_id: self.item_id,
            description: self.description.trim().to_string(),
            quantity: self.quantity,
            unit_price: self.unit_price,
        }
    }
}

/// Quote creation payload.
#[derive(Debug, Deserialize)]
struct CreateQuotePayload {
    customer_id: uuid::Uuid,
    issue_date: Option<chrono::NaiveDate>,
    valid_until: Option<chrono::NaiveDate>,
    currency: Option<String>,
    #[serde(default)]
    discount_amount: Decimal,
    tax_rate: Option<Decimal>,
    notes: Option<String>,
    #[serde(default)]
    lines: Vec<LinePayload>,
}

/// Quote update payload; absent fields stay unchanged.
#[derive(Debug, Deserialize)]
struct UpdateQuotePayload {
    customer_id: Option<uuid::Uuid>,
    issue_date: Option<chrono::NaiveDate>,
    #[serde(default, with = "double_option")]
    valid_until: Option<Option<chrono::NaiveDate>>,
    currency: Option<String>,
    discount_amount: Option<Decimal>,
    tax_rate: Option<Decimal>,
    #[serde(default, with = "double_option")]
    notes: Option<Option<String>>,
    lines: Option<Vec<LinePayload>>,
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

/// List query parameters.
#[derive(Debug, Deserialize)]
struct ListQuery {
    #[serde(default = "default_page")]
    page: u32,
    #[serde(default = "default_per_page")]
    per_page: u32,
    status: Option<String>,
    customer_id: Option<uuid::Uuid>,
}

fn default_page() -> u32 {
    1
}

fn default_per_page() -> u32 {
    20
}

fn quote_json(q: &quotes::Model) -> serde_json::Value {
    json!({
        "id": q.id,
        "quote_number": q.quote_number,
        "customer_id": q.customer_id,
        "status": q.status.as_str(),
        "issue_date": q.issue_date,
        "valid_until": q.valid_until,
        "currency": q.currency,
        "subtotal": q.subtotal,
        "discount_amount": q.discount_amount,
        "tax_rate": q.tax_rate,
        "tax_amount": q.tax_amount,
        "total": q.total,
        "notes": q.notes,
        "sent_at": q.sent_at,
        "seen_at": q.seen_at,
        "converted_invoice_id": q.converted_invoice_id,
        "created_at": q.created_at,
        "updated_at": q.updated_at
    })
}

fn line_json(i: &quote_items::Model) -> serde_json::Value {
    json!({
        "id": i.id,
        "item_id": i.item_id,
        "description": i.description,
        "quantity": i.quantity,
        "unit_price": i.unit_price,
        "line_total": i.line_total,
        "position": i.position
    })
}

fn quote_with_items_json(q: &QuoteWithItems) -> serde_json::Value {
    let mut value = quote_json(&q.quote);
    value["items"] = serde_json::Value::Array(q.items.iter().map(line_json).collect());
    value
}

fn error_response(e: &QuoteError) -> (StatusCode, Json<serde_json::Value>) {
    let (status, code) = match e {
        QuoteError::NotFound(_) => (StatusCode::NOT_FOUND, "not_found"),
        QuoteError::CustomerNotFound(_) => (StatusCode::NOT_FOUND, "customer_not_found"),
        QuoteError::AlreadyConverted => (StatusCode::CONFLICT, "already_converted"),
        QuoteError::Converted => (StatusCode::CONFLICT, "quote_converted"),
        QuoteError::NotSent(_) => (StatusCode::UNPROCESSABLE_ENTITY, "not_sent"),
        QuoteError::Validation(_) => (StatusCode::UNPROCESSABLE_ENTITY, "validation_error"),
        QuoteError::Database(_) => (StatusCode::INTERNAL_SERVER_ERROR, "internal_error"),
    };

    let message = if status == StatusCode::INTERNAL_SERVER_ERROR {
        "An error occurred".to_string()
    } else {
        e.to_string()
    };

    (status, Json(json!({ "error": code, "message": message })))
}

fn parse_status(s: &str) -> Option<QuoteStatus> {
    match s.to_lowercase().as_str() {
        "draft" => Some(QuoteStatus::Draft),
        "sent" => Some(QuoteStatus::Sent),
        "seen" => Some(QuoteStatus::Seen),
        "converted" => Some(QuoteStatus::Converted),
        _ => None,
    }
}

async fn notify(
    state: &AppState,
    user_id: uuid::Uuid,
    kind: &str,
    title: &str,
    body: &str,
    quote_id: uuid::Uuid,
) {
    let repo = NotificationRepository::new((*state.db).clone());
    if let Err(e) = repo
        .create(user_id, kind, title, body, Some("quote"), Some(quote_id))
        .await
    {
        error!(error = %e, kind, "Failed to create notification");
    }
}

/// GET /quotes - List quotes with filters.
async fn list_quotes(
    State(state): State<AppState>,
    auth: AuthUser,
    Query(query): Query<ListQuery>,
) -> impl IntoResponse {
    let status = match query.status.as_deref() {
        None | Some("") => None,
        Some(s) => match parse_status(s) {
            Some(parsed) => Some(parsed),
            None => {
                return (
                    StatusCode::BAD_REQUEST,
                    Json(json!({
                        "error": "invalid_status",
                        "message": "Status must be one of: draft, sent, seen, converted"
                    })),
                )
                    .into_response();
            }
        },
    };

    let repo = QuoteRepository::new((*state.db).clone());
    let page = PageRequest {
        page: query.page.max(1),
        per_page: query.per_page.clamp(1, 100),
    };
    let filter = QuoteFilter {
        status,
        customer_id: query.customer_id,
    };

    match repo.list(auth.user_id(), &filter, &page).await {
        Ok((rows, total)) => {
            let data: Vec<_> = rows.iter().map(quote_json).collect();
            (
                StatusCode::OK,
                Json(
                    serde_json::to_value(PageResponse::new(data, page.page, page.per_page, total))
                        .unwrap_or_default(),
                ),
            )
                .into_response()
        }
        Err(e) => {
            error!(error = %e, "Database error listing quotes");
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

/// POST /quotes - Create a quote.
async fn create_quote(
    State(state): State<AppState>,
    auth: AuthUser,
    Json(payload): Json<CreateQuotePayload>,
) -> impl IntoResponse {
    let repo = QuoteRepository::new((*state.db).clone());

    let input = CreateQuoteInput {
        customer_id: payload.customer_id,
        issue_date: payload.issue_date,
        valid_until: payload.valid_until,
        currency: payload.currency,
        discount_amount: payload.discount_amount,
        tax_rate: payload.tax_rate,
        notes: payload.notes,
        lines: payload.lines.into_iter().map(LinePayload::into_input).collect(),
    };

    match repo.create(auth.user_id(), input).await {
        Ok(created) => {
            info!(quote_id = %created.quote.id, number = %created.quote.quote_number, "Quote created");
            state.report_cache.invalidate_user(auth.user_id());
            (StatusCode::CREATED, Json(quote_with_items_json(&created))).into_response()
        }
        Err(e) => {
            if matches!(e, QuoteError::Database(_)) {
                error!(error = %e, "Failed to create quote");
            }
            error_response(&e).into_response()
        }
    }
}

/// GET `/quotes/{id}` - Fetch a quote with items.
async fn get_quote(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<uuid::Uuid>,
) -> impl IntoResponse {
    let repo = QuoteRepository::new((*state.db).clone());

    match repo.find_with_items(auth.user_id(), id).await {
        Ok(Some(quote)) => (StatusCode::OK, Json(quote_with_items_json(&quote))).into_response(),
        Ok(None) => (
            StatusCode::NOT_FOUND,
            Json(json!({
                "error": "not_found",
                "message": "Quote not found"
            })),
        )
            .into_response(),
        Err(e) => {
            error!(error = %e, "Database error fetching quote");
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

/// PATCH `/quotes/{id}` - Update a quote, recomputing totals.
async fn update_quote(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<uuid::Uuid>,
    Json(payload): Json<UpdateQuotePayload>,
) -> impl IntoResponse {
    let repo = QuoteRepository::new((*state.db).clone());

    let input = UpdateQuoteInput {
        customer_id: payload.customer_id,
        issue_date: payload.issue_date,
        valid_until: payload.valid_until,
        currency: payload.currency,
        discount_amount: payload.discount_amount,
        tax_rate: payload.tax_rate,
        notes: payload.notes,
        lines: payload
            .lines
            .map(|lines| lines.into_iter().map(LinePayload::into_input).collect()),
    };

    match repo.update(auth.user_id(), id, input).await {
        Ok(updated) => {
            info!(quote_id = %id, "Quote updated");
            state.report_cache.invalidate_user(auth.user_id());
            (StatusCode::OK, Json(quote_with_items_json(&updated))).into_response()
        }
        Err(e) => {
            if matches!(e, QuoteError::Database(_)) {
                error!(error = %e, "Failed to update quote");
            }
            error_response(&e).into_response()
        }
    }
}

/// DELETE `/quotes/{id}` - Delete an unconverted quote.
async fn delete_quote(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<uuid::Uuid>,
) -> impl IntoResponse {
    let repo = QuoteRepository::new((*state.db).clone());

    match repo.delete(auth.user_id(), id).await {
        Ok(()) => {
            info!(quote_id = %id, "Quote deleted");
            state.report_cache.invalidate_user(auth.user_id());
            StatusCode::NO_CONTENT.into_response()
        }
        Err(e) => error_response(&e).into_response(),
    }
}

/// POST `/quotes/{id}/send` - Email the quote PDF to the customer.
async fn send_quote(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<uuid::Uuid>,
) -> impl IntoResponse {
    let repo = QuoteRepository::new((*state.db).clone());
    let user_id = auth.user_id();

    let quote = match repo.find_with_items(user_id, id).await {
        Ok(Some(q)) => q,
        Ok(None) => {
            return (
                StatusCode::NOT_FOUND,
                Json(json!({
                    "error": "not_found",
                    "message": "Quote not found"
                })),
            )
                .into_response();
        }
        Err(e) => {
            error!(error = %e, "Database error fetching quote");
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({
                    "error": "internal_error",
                    "message": "An error occurred"
                })),
            )
                .into_response();
        }
    };

    let customer_repo = CustomerRepository::new((*state.db).clone());
    let customer = match customer_repo.find_by_id(user_id, quote.quote.customer_id).await {
        Ok(Some(c)) => c,
        _ => {
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({
                    "error": "internal_error",
                    "message": "An error occurred"
                })),
            )
                .into_response();
        }
    };

    let Some(customer_email) = customer.email.clone() else {
        return (
            StatusCode::UNPROCESSABLE_ENTITY,
            Json(json!({
                "error": "no_customer_email",
                "message": "The customer has no email address"
            })),
        )
            .into_response();
    };

    let settings_repo = SettingsRepository::new((*state.db).clone());
    let settings = settings_repo.get_or_create(user_id).await.ok();

    let pdf = match render_quote_pdf(&quote, &customer, settings.as_ref()) {
        Ok(bytes) => bytes,
        Err(e) => {
            error!(error = %e, "Failed to render quote PDF");
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({
                    "error": "pdf_error",
                    "message": "Failed to render the quote PDF"
                })),
            )
                .into_response();
        }
    };

    let total = quote
        .quote
        .currency
        .parse()
        .map_or_else(
            |_| format!("{} {}", quote.quote.currency, quote.quote.total),
            |currency| Money::new(quote.quote.total, currency).format(),
        );
    let valid_until = quote
        .quote
        .valid_until
        .map_or_else(|| "further notice".to_string(), |d| d.to_string());
    let company_name = settings
        .as_ref()
        .map(|s| s.company_name.clone())
        .filter(|n| !n.is_empty())
        .unwrap_or_else(|| "Fakturo".to_string());

    if let Err(e) = state
        .email_service
        .send_quote_email(
            &customer_email,
            &customer.name,
            &quote.quote.quote_number,
            &total,
            &valid_until,
            &company_name,
            pdf,
        )
        .await
    {
        error!(error = %e, "Failed to send quote email");
        return (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({
                "error": "email_error",
                "message": "Failed to send the quote email"
            })),
        )
            .into_response();
    }

    let updated = match repo.mark_sent(user_id, id).await {
        Ok(q) => q,
        Err(e) => return error_response(&e).into_response(),
    };

    notify(
        &state,
        user_id,
        "quote_sent",
        "Quote sent",
        &format!(
            "Quote {} was emailed to {}",
            updated.quote_number, customer.name
        ),
        id,
    )
    .await;

    let audit_repo = AuditRepository::new((*state.db).clone());
    if let Err(e) = audit_repo
        .record(
            Some(user_id),
            "quote_sent",
            Some("quote"),
            Some(id),
            json!({ "to": customer_email }),
            None,
        )
        .await
    {
        error!(error = %e, "Failed to write audit log");
    }

    info!(quote_id = %id, "Quote sent");
    state.report_cache.invalidate_user(user_id);

    (StatusCode::OK, Json(quote_json(&updated))).into_response()
}

/// POST `/quotes/{id}/mark-seen` - Record that the customer opened the
/// quote.
async fn mark_seen(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<uuid::Uuid>,
) -> impl IntoResponse {
    let repo = QuoteRepository::new((*state.db).clone());

    match repo.mark_seen(auth.user_id(), id).await {
        Ok(updated) => {
            notify(
                &state,
                auth.user_id(),
                "quote_seen",
                "Quote seen",
                &format!("Quote {} was opened by the customer", updated.quote_number),
                id,
            )
            .await;
            state.report_cache.invalidate_user(auth.user_id());
            (StatusCode::OK, Json(quote_json(&updated))).into_response()
        }
        Err(e) => error_response(&e).into_response(),
    }
}

/// POST `/quotes/{id}/convert` - Convert into a draft invoice.
async fn convert_quote(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<uuid::Uuid>,
) -> impl IntoResponse {
    let repo = QuoteRepository::new((*state.db).clone());
    let user_id = auth.user_id();

    match repo.convert_to_invoice(user_id, id).await {
        Ok(invoice) => {
            info!(
                quote_id = %id,
                invoice_id = %invoice.invoice.id,
                number = %invoice.invoice.invoice_number,
                "Quote converted to invoice"
            );

            notify(
                &state,
                user_id,
                "quote_converted",
                "Quote converted",
                &format!(
                    "Quote was converted to invoice {}",
                    invoice.invoice.invoice_number
                ),
                id,
            )
            .await;

            let audit_repo = AuditRepository::new((*state.db).clone());
            if let Err(e) = audit_repo
                .record(
                    Some(user_id),
                    "quote_converted",
                    Some("quote"),
                    Some(id),
                    json!({ "invoice_id": invoice.invoice.id }),
                    None,
                )
                .await
            {
                error!(error = %e, "Failed to write audit log");
            }

            state.report_cache.invalidate_user(user_id);

            (
                StatusCode::CREATED,
                Json(json!({
                    "invoice_id": invoice.invoice.id,
                    "invoice_number": invoice.invoice.invoice_number,
                    "status": invoice.invoice.status.as_str(),
                    "total": invoice.invoice.total
                })),
            )
                .into_response()
        }
        Err(e) => {
            if matches!(e, QuoteError::Database(_)) {
                error!(error = %e, "Failed to convert quote");
            }
            error_response(&e).into_response()
        }
    }
}

/// GET `/quotes/{id}/pdf` - Download the quote PDF.
async fn quote_pdf(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<uuid::Uuid>,
) -> impl IntoResponse {
    let repo = QuoteRepository::new((*state.db).clone());
    let user_id = auth.user_id();

    let quote = match repo.find_with_items(user_id, id).await {
        Ok(Some(q)) => q,
        Ok(None) => {
            return (
                StatusCode::NOT_FOUND,
                Json(json!({
                    "error": "not_found",
                    "message": "Quote not found"
                })),
            )
                .into_response();
        }
        Err(e) => {
            error!(error = %e, "Database error fetching quote");
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({
                    "error": "internal_error",
                    "message": "An error occurred"
                })),
            )
                .into_response();
        }
    };

    let customer_repo = CustomerRepository::new((*state.db).clone());
    let customer = match customer_repo.find_by_id(user_id, quote.quote.customer_id).await {
        Ok(Some(c)) => c,
        _ => {
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({
                    "error": "internal_error",
                    "message": "An error occurred"
                })),
            )
                .into_response();
        }
    };

    let settings_repo = SettingsRepository::new((*state.db).clone());
    let settings = settings_repo.get_or_create(user_id).await.ok();

    match render_quote_pdf(&quote, &customer, settings.as_ref()) {
        Ok(bytes) => (
            StatusCode::OK,
            [
                (header::CONTENT_TYPE, "application/pdf".to_string()),
                (
                    header::CONTENT_DISPOSITION,
                    format!(
                        "attachment; filename=\"{}.pdf\"",
                        quote.quote.quote_number
                    ),
                ),
            ],
            bytes,
        )
            .into_response(),
        Err(e) => {
            error!(error = %e, "Failed to render quote PDF");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({
                    "error": "pdf_error",
                    "message": "Failed to render the quote PDF"
                })),
            )
                .into_response()
        }
    }
}
