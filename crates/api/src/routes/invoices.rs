//! Invoice management routes.
//!
//! Status transitions are never rejected; each one appends a history
//! row. Marking paid stamps the payment date, sending emails the PDF,
//! and the overdue sweep moves sent invoices past their due date.

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

use crate::routes::render::render_invoice_pdf;
use crate::{AppState, middleware::AuthUser};
use fakturo_db::entities::sea_orm_active_enums::InvoiceStatus;
use fakturo_db::entities::{invoice_items, invoice_status_history, invoices};
use fakturo_db::repositories::invoice::{
    CreateInvoiceInput, DocumentLineInput, InvoiceError, InvoiceFilter, InvoiceWithItems,
    UpdateInvoiceInput,
};
use fakturo_db::{
    AuditRepository, CustomerRepository, InvoiceRepository, NotificationRepository,
    SettingsRepository,
};
use fakturo_shared::{Money, PageRequest, PageResponse};

/// Creates the invoices router (requires auth middleware).
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/invoices", get(list_invoices))
        .route("/invoices", post(create_invoice))
        .route("/invoices/mark-overdue", post(mark_overdue))
        .route("/invoices/{id}", get(get_invoice))
        .route("/invoices/{id}", patch(update_invoice))
        .route("/invoices/{id}", delete(delete_invoice))
        .route("/invoices/{id}/status", post(set_status))
        .route("/invoices/{id}/pay", post(mark_paid))
        .route("/invoices/{id}/send", post(send_invoice))
        .route("/invoices/{id}/history", get(get_history))
        .route("/invoices/{id}/pdf", get(invoice_pdf))
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

/// Invoice creation payload.
#[derive(Debug, Deserialize)]
struct CreateInvoicePayload {
    customer_id: uuid::Uuid,
    issue_date: Option<chrono::NaiveDate>,
    due_date: Option<chrono::NaiveDate>,
    currency: Option<String>,
    #[serde(default)]
    discount_amount: Decimal,
    tax_rate: Option<Decimal>,
    notes: Option<String>,
    #[serde(default)]
    lines: Vec<LinePayload>,
}

/// Invoice update payload; absent fields stay unchanged.
#[derive(Debug, Deserialize)]
struct UpdateInvoicePayload {
    customer_id: Option<uuid::Uuid>,
    issue_date: Option<chrono::NaiveDate>,
    due_date: Option<chrono::NaiveDate>,
    currency: Option<String>,
    discount_amount: Option<Decimal>,
    tax_rate: Option<Decimal>,
    #[serde(default, with = "double_option")]
    notes: Option<Option<String>>,
    lines: Option<Vec<LinePayload>>,
}

/// Status change payload.
#[derive(Debug, Deserialize)]
struct StatusPayload {
    status: String,
    note: Option<String>,
    payment_date: Option<chrono::NaiveDate>,
}

/// Payment payload.
#[derive(Debug, Deserialize)]
struct PayPayload {
    payment_date: Option<chrono::NaiveDate>,
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
    date_from: Option<chrono::NaiveDate>,
    date_to: Option<chrono::NaiveDate>,
}

fn default_page() -> u32 {
    1
}

fn default_per_page() -> u32 {
    20
}

fn invoice_json(i: &invoices::Model) -> serde_json::Value {
    json!({
        "id": i.id,
        "invoice_number": i.invoice_number,
        "customer_id": i.customer_id,
        "status": i.status.as_str(),
        "issue_date": i.issue_date,
        "due_date": i.due_date,
        "payment_date": i.payment_date,
        "currency": i.currency,
        "subtotal": i.subtotal,
        "discount_amount": i.discount_amount,
        "tax_rate": i.tax_rate,
        "tax_amount": i.tax_amount,
        "total": i.total,
        "notes": i.notes,
        "quote_id": i.quote_id,
        "sent_at": i.sent_at,
        "created_at": i.created_at,
        "updated_at": i.updated_at
    })
}

fn line_json(i: &invoice_items::Model) -> serde_json::Value {
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

fn history_json(h: &invoice_status_history::Model) -> serde_json::Value {
    json!({
        "id": h.id,
        "from_status": h.from_status.as_ref().map(InvoiceStatus::as_str),
        "to_status": h.to_status.as_str(),
        "changed_by": h.changed_by,
        "note": h.note,
        "created_at": h.created_at
    })
}

fn invoice_with_items_json(i: &InvoiceWithItems) -> serde_json::Value {
    let mut value = invoice_json(&i.invoice);
    value["items"] = serde_json::Value::Array(i.items.iter().map(line_json).collect());
    value
}

fn error_response(e: &InvoiceError) -> (StatusCode, Json<serde_json::Value>) {
    let (status, code) = match e {
        InvoiceError::NotFound(_) => (StatusCode::NOT_FOUND, "not_found"),
        InvoiceError::CustomerNotFound(_) => (StatusCode::NOT_FOUND, "customer_not_found"),
        InvoiceError::NotEditable(_) => (StatusCode::CONFLICT, "not_editable"),
        InvoiceError::Validation(_) => (StatusCode::UNPROCESSABLE_ENTITY, "validation_error"),
        InvoiceError::Database(_) => (StatusCode::INTERNAL_SERVER_ERROR, "internal_error"),
    };

    let message = if status == StatusCode::INTERNAL_SERVER_ERROR {
        "An error occurred".to_string()
    } else {
        e.to_string()
    };

    (status, Json(json!({ "error": code, "message": message })))
}

async fn notify(
    state: &AppState,
    user_id: uuid::Uuid,
    kind: &str,
    title: &str,
    body: &str,
    invoice_id: uuid::Uuid,
) {
    let repo = NotificationRepository::new((*state.db).clone());
    if let Err(e) = repo
        .create(user_id, kind, title, body, Some("invoice"), Some(invoice_id))
        .await
    {
        error!(error = %e, kind, "Failed to create notification");
    }
}

async fn audit(
    state: &AppState,
    user_id: uuid::Uuid,
    action: &str,
    invoice_id: uuid::Uuid,
    detail: serde_json::Value,
) {
    let repo = AuditRepository::new((*state.db).clone());
    if let Err(e) = repo
        .record(
            Some(user_id),
            action,
            Some("invoice"),
            Some(invoice_id),
            detail,
            None,
        )
        .await
    {
        error!(error = %e, action, "Failed to write audit log");
    }
}

/// GET /invoices - List invoices with filters.
async fn list_invoices(
    State(state): State<AppState>,
    auth: AuthUser,
    Query(query): Query<ListQuery>,
) -> impl IntoResponse {
    let status = match query.status.as_deref() {
        None | Some("") => None,
        Some(s) => match InvoiceStatus::parse(s) {
            Some(parsed) => Some(parsed),
            None => {
                return (
                    StatusCode::BAD_REQUEST,
                    Json(json!({
                        "error": "invalid_status",
                        "message": "Status must be one of: draft, sent, paid, overdue, cancelled"
                    })),
                )
                    .into_response();
            }
        },
    };

    let repo = InvoiceRepository::new((*state.db).clone());
    let page = PageRequest {
        page: query.page.max(1),
        per_page: query.per_page.clamp(1, 100),
    };
    let filter = InvoiceFilter {
        status,
        customer_id: query.customer_id,
        date_from: query.date_from,
        date_to: query.date_to,
    };

    match repo.list(auth.user_id(), &filter, &page).await {
        Ok((rows, total)) => {
            let data: Vec<_> = rows.iter().map(invoice_json).collect();
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
            error!(error = %e, "Database error listing invoices");
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

/// POST /invoices - Create an invoice.
async fn create_invoice(
    State(state): State<AppState>,
    auth: AuthUser,
    Json(payload): Json<CreateInvoicePayload>,
) -> impl IntoResponse {
    let repo = InvoiceRepository::new((*state.db).clone());

    let input = CreateInvoiceInput {
        customer_id: payload.customer_id,
        issue_date: payload.issue_date,
        due_date: payload.due_date,
        currency: payload.currency,
        discount_amount: payload.discount_amount,
        tax_rate: payload.tax_rate,
        notes: payload.notes,
        lines: payload.lines.into_iter().map(LinePayload::into_input).collect(),
    };

    match repo.create(auth.user_id(), input).await {
        Ok(created) => {
            info!(
                invoice_id = %created.invoice.id,
                number = %created.invoice.invoice_number,
                "Invoice created"
            );
            state.report_cache.invalidate_user(auth.user_id());
            (StatusCode::CREATED, Json(invoice_with_items_json(&created))).into_response()
        }
        Err(e) => {
            if matches!(e, InvoiceError::Database(_)) {
                error!(error = %e, "Failed to create invoice");
            }
            error_response(&e).into_response()
        }
    }
}

/// GET `/invoices/{id}` - Fetch an invoice with items.
async fn get_invoice(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<uuid::Uuid>,
) -> impl IntoResponse {
    let repo = InvoiceRepository::new((*state.db).clone());

    match repo.find_with_items(auth.user_id(), id).await {
        Ok(Some(invoice)) => {
            (StatusCode::OK, Json(invoice_with_items_json(&invoice))).into_response()
        }
        Ok(None) => (
            StatusCode::NOT_FOUND,
            Json(json!({
                "error": "not_found",
                "message": "Invoice not found"
            })),
        )
            .into_response(),
        Err(e) => {
            error!(error = %e, "Database error fetching invoice");
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

/// PATCH `/invoices/{id}` - Update an invoice, recomputing totals.
async fn update_invoice(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<uuid::Uuid>,
    Json(payload): Json<UpdateInvoicePayload>,
) -> impl IntoResponse {
    let repo = InvoiceRepository::new((*state.db).clone());

    let input = UpdateInvoiceInput {
        customer_id: payload.customer_id,
        issue_date: payload.issue_date,
        due_date: payload.due_date,
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
            info!(invoice_id = %id, "Invoice updated");
            state.report_cache.invalidate_user(auth.user_id());
            (StatusCode::OK, Json(invoice_with_items_json(&updated))).into_response()
        }
        Err(e) => {
            if matches!(e, InvoiceError::Database(_)) {
                error!(error = %e, "Failed to update invoice");
            }
            error_response(&e).into_response()
        }
    }
}

/// DELETE `/invoices/{id}` - Delete an invoice (items and history
/// cascade).
async fn delete_invoice(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<uuid::Uuid>,
) -> impl IntoResponse {
    let repo = InvoiceRepository::new((*state.db).clone());
    let user_id = auth.user_id();

    match repo.delete(user_id, id).await {
        Ok(()) => {
            info!(invoice_id = %id, "Invoice deleted");
            audit(&state, user_id, "invoice_deleted", id, json!({})).await;
            state.report_cache.invalidate_user(user_id);
            StatusCode::NO_CONTENT.into_response()
        }
        Err(e) => error_response(&e).into_response(),
    }
}

/// POST `/invoices/{id}/status` - Free-form status transition.
async fn set_status(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<uuid::Uuid>,
    Json(payload): Json<StatusPayload>,
) -> impl IntoResponse {
    let Some(new_status) = InvoiceStatus::parse(&payload.status) else {
        return (
            StatusCode::BAD_REQUEST,
            Json(json!({
                "error": "invalid_status",
                "message": "Status must be one of: draft, sent, paid, overdue, cancelled"
            })),
        )
            .into_response();
    };

    let repo = InvoiceRepository::new((*state.db).clone());
    let user_id = auth.user_id();

    match repo
        .set_status(
            user_id,
            id,
            new_status.clone(),
            payload.payment_date,
            payload.note,
        )
        .await
    {
        Ok(updated) => {
            info!(invoice_id = %id, status = new_status.as_str(), "Invoice status changed");

            notify(
                &state,
                user_id,
                &format!("invoice_{}", new_status.as_str()),
                "Invoice status changed",
                &format!(
                    "Invoice {} is now {}",
                    updated.invoice_number,
                    new_status.as_str()
                ),
                id,
            )
            .await;
            state.report_cache.invalidate_user(user_id);

            (StatusCode::OK, Json(invoice_json(&updated))).into_response()
        }
        Err(e) => {
            if matches!(e, InvoiceError::Database(_)) {
                error!(error = %e, "Failed to change invoice status");
            }
            error_response(&e).into_response()
        }
    }
}

/// POST `/invoices/{id}/pay` - Mark paid, stamping the payment date.
async fn mark_paid(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<uuid::Uuid>,
    Json(payload): Json<PayPayload>,
) -> impl IntoResponse {
    let repo = InvoiceRepository::new((*state.db).clone());
    let user_id = auth.user_id();

    match repo
        .set_status(user_id, id, InvoiceStatus::Paid, payload.payment_date, None)
        .await
    {
        Ok(updated) => {
            info!(invoice_id = %id, "Invoice marked paid");

            notify(
                &state,
                user_id,
                "invoice_paid",
                "Invoice paid",
                &format!("Invoice {} was marked paid", updated.invoice_number),
                id,
            )
            .await;
            audit(&state, user_id, "invoice_paid", id, json!({})).await;
            state.report_cache.invalidate_user(user_id);

            (StatusCode::OK, Json(invoice_json(&updated))).into_response()
        }
        Err(e) => error_response(&e).into_response(),
    }
}

/// POST `/invoices/{id}/send` - Email the invoice PDF to the customer.
#[allow(clippy::too_many_lines)]
async fn send_invoice(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<uuid::Uuid>,
) -> impl IntoResponse {
    let repo = InvoiceRepository::new((*state.db).clone());
    let user_id = auth.user_id();

    let invoice = match repo.find_with_items(user_id, id).await {
        Ok(Some(i)) => i,
        Ok(None) => {
            return (
                StatusCode::NOT_FOUND,
                Json(json!({
                    "error": "not_found",
                    "message": "Invoice not found"
                })),
            )
                .into_response();
        }
        Err(e) => {
            error!(error = %e, "Database error fetching invoice");
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
    let customer = match customer_repo
        .find_by_id(user_id, invoice.invoice.customer_id)
        .await
    {
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

    let pdf = match render_invoice_pdf(&invoice, &customer, settings.as_ref()) {
        Ok(bytes) => bytes,
        Err(e) => {
            error!(error = %e, "Failed to render invoice PDF");
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({
                    "error": "pdf_error",
                    "message": "Failed to render the invoice PDF"
                })),
            )
                .into_response();
        }
    };

    let total = invoice
        .invoice
        .currency
        .parse()
        .map_or_else(
            |_| format!("{} {}", invoice.invoice.currency, invoice.invoice.total),
            |currency| Money::new(invoice.invoice.total, currency).format(),
        );
    let company_name = settings
        .as_ref()
        .map(|s| s.company_name.clone())
        .filter(|n| !n.is_empty())
        .unwrap_or_else(|| "Fakturo".to_string());

    if let Err(e) = state
        .email_service
        .send_invoice_email(
            &customer_email,
            &customer.name,
            &invoice.invoice.invoice_number,
            &total,
            &invoice.invoice.due_date.to_string(),
            &company_name,
            pdf,
        )
        .await
    {
        error!(error = %e, "Failed to send invoice email");
        return (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({
                "error": "email_error",
                "message": "Failed to send the invoice email"
            })),
        )
            .into_response();
    }

    let updated = match repo
        .set_status(user_id, id, InvoiceStatus::Sent, None, None)
        .await
    {
        Ok(i) => i,
        Err(e) => return error_response(&e).into_response(),
    };

    notify(
        &state,
        user_id,
        "invoice_sent",
        "Invoice sent",
        &format!(
            "Invoice {} was emailed to {}",
            updated.invoice_number, customer.name
        ),
        id,
    )
    .await;
    audit(
        &state,
        user_id,
        "invoice_sent",
        id,
        json!({ "to": customer_email }),
    )
    .await;

    info!(invoice_id = %id, "Invoice sent");
    state.report_cache.invalidate_user(user_id);

    (StatusCode::OK, Json(invoice_json(&updated))).into_response()
}

/// POST /invoices/mark-overdue - Sweep sent invoices past their due
/// date.
async fn mark_overdue(State(state): State<AppState>, auth: AuthUser) -> impl IntoResponse {
    let repo = InvoiceRepository::new((*state.db).clone());
    let user_id = auth.user_id();
    let today = chrono::Utc::now().date_naive();

    match repo.mark_overdue_sweep(user_id, today).await {
        Ok(updated) => {
            for invoice in &updated {
                notify(
                    &state,
                    user_id,
                    "invoice_overdue",
                    "Invoice overdue",
                    &format!(
                        "Invoice {} is overdue since {}",
                        invoice.invoice_number, invoice.due_date
                    ),
                    invoice.id,
                )
                .await;
            }

            if !updated.is_empty() {
                state.report_cache.invalidate_user(user_id);
            }
            info!(count = updated.len(), "Overdue sweep finished");

            (
                StatusCode::OK,
                Json(json!({
                    "marked_overdue": updated.len(),
                    "invoices": updated.iter().map(invoice_json).collect::<Vec<_>>()
                })),
            )
                .into_response()
        }
        Err(e) => {
            error!(error = %e, "Overdue sweep failed");
            error_response(&e).into_response()
        }
    }
}

/// GET `/invoices/{id}/history` - Status transition log.
async fn get_history(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<uuid::Uuid>,
) -> impl IntoResponse {
    let repo = InvoiceRepository::new((*state.db).clone());

    match repo.history(auth.user_id(), id).await {
        Ok(rows) => (
            StatusCode::OK,
            Json(json!({
                "history": rows.iter().map(history_json).collect::<Vec<_>>()
            })),
        )
            .into_response(),
        Err(e) => error_response(&e).into_response(),
    }
}

/// GET `/invoices/{id}/pdf` - Download the invoice PDF.
async fn invoice_pdf(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<uuid::Uuid>,
) -> impl IntoResponse {
    let repo = InvoiceRepository::new((*state.db).clone());
    let user_id = auth.user_id();

    let invoice = match repo.find_with_items(user_id, id).await {
        Ok(Some(i)) => i,
        Ok(None) => {
            return (
                StatusCode::NOT_FOUND,
                Json(json!({
                    "error": "not_found",
                    "message": "Invoice not found"
                })),
            )
                .into_response();
        }
        Err(e) => {
            error!(error = %e, "Database error fetching invoice");
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
    let customer = match customer_repo
        .find_by_id(user_id, invoice.invoice.customer_id)
        .await
    {
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

    match render_invoice_pdf(&invoice, &customer, settings.as_ref()) {
        Ok(bytes) => (
            StatusCode::OK,
            [
                (header::CONTENT_TYPE, "application/pdf".to_string()),
                (
                    header::CONTENT_DISPOSITION,
                    format!(
                        "attachment; filename=\"{}.pdf\"",
                        invoice.invoice.invoice_number
                    ),
                ),
            ],
            bytes,
        )
            .into_response(),
        Err(e) => {
            error!(error = %e, "Failed to render invoice PDF");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({
                    "error": "pdf_error",
                    "message": "Failed to render the invoice PDF"
                })),
            )
                .into_response()
        }
    }
}
