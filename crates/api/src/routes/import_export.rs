//! CSV import and export routes.
//!
//! Imports accept a multipart upload with a `file` field, validate row
//! by row, skip duplicates, and report per-row errors. Exports stream
//! the fixed column schema for each entity.

use axum::{
    Json, Router,
    extract::{Multipart, State},
    http::{StatusCode, header},
    response::IntoResponse,
    routing::{get, post},
};
use serde_json::json;
use tracing::{error, info};

use crate::{AppState, middleware::AuthUser};
use fakturo_core::import_export::{
    self, InvoiceExportRow, parse_customers_csv, parse_items_csv,
};
use fakturo_db::repositories::invoice::InvoiceFilter;
use fakturo_db::{
    AuditRepository, CustomerRepository, InvoiceRepository, ItemRepository,
    NotificationRepository,
};
use fakturo_shared::PageRequest;

/// Creates the import/export router (requires auth middleware).
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/import/customers", post(import_customers))
        .route("/import/items", post(import_items))
        .route("/export/customers.csv", get(export_customers))
        .route("/export/items.csv", get(export_items))
        .route("/export/invoices.csv", get(export_invoices))
}

fn internal_error() -> (StatusCode, Json<serde_json::Value>) {
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(json!({
            "error": "internal_error",
            "message": "An error occurred"
        })),
    )
}

/// Reads the `file` field from a multipart upload.
async fn read_upload(multipart: &mut Multipart) -> Result<Vec<u8>, (StatusCode, Json<serde_json::Value>)> {
    while let Ok(Some(field)) = multipart.next_field().await {
        if field.name() == Some("file") {
            return field.bytes().await.map(|b| b.to_vec()).map_err(|e| {
                (
                    StatusCode::BAD_REQUEST,
                    Json(json!({
                        "error": "upload_error",
                        "message": format!("Failed to read upload: {e}")
                    })),
                )
            });
        }
    }

    Err((
        StatusCode::BAD_REQUEST,
        Json(json!({
            "error": "missing_file",
            "message": "Multipart field 'file' is required"
        })),
    ))
}

async fn record_import(state: &AppState, user_id: uuid::Uuid, entity: &str, imported: usize, skipped: usize, errors: usize) {
    let notifications = NotificationRepository::new((*state.db).clone());
    if let Err(e) = notifications
        .create(
            user_id,
            "import_finished",
            "Import finished",
            &format!("{entity} import: {imported} imported, {skipped} skipped, {errors} errors"),
            None,
            None,
        )
        .await
    {
        error!(error = %e, "Failed to create import notification");
    }

    let audits = AuditRepository::new((*state.db).clone());
    if let Err(e) = audits
        .record(
            Some(user_id),
            "import",
            Some(entity),
            None,
            json!({ "imported": imported, "skipped": skipped, "errors": errors }),
            None,
        )
        .await
    {
        error!(error = %e, "Failed to write audit log");
    }
}

/// POST /import/customers - Import customers from CSV.
async fn import_customers(
    State(state): State<AppState>,
    auth: AuthUser,
    mut multipart: Multipart,
) -> impl IntoResponse {
    let data = match read_upload(&mut multipart).await {
        Ok(d) => d,
        Err(resp) => return resp.into_response(),
    };

    let user_id = auth.user_id();
    let repo = CustomerRepository::new((*state.db).clone());

    let existing = match repo.emails_for_user(user_id).await {
        Ok(e) => e,
        Err(e) => {
            error!(error = %e, "Database error loading existing emails");
            return internal_error().into_response();
        }
    };

    let outcome = match parse_customers_csv(&data, &existing) {
        Ok(o) => o,
        Err(e) => {
            return (
                StatusCode::BAD_REQUEST,
                Json(json!({
                    "error": "invalid_file",
                    "message": e.to_string()
                })),
            )
                .into_response();
        }
    };

    let imported = match repo.insert_import_rows(user_id, outcome.rows).await {
        Ok(count) => count,
        Err(e) => {
            error!(error = %e, "Database error inserting imported customers");
            return internal_error().into_response();
        }
    };

    info!(
        imported,
        skipped = outcome.report.skipped,
        errors = outcome.report.errors.len(),
        "Customer import finished"
    );
    record_import(
        &state,
        user_id,
        "customers",
        imported,
        outcome.report.skipped,
        outcome.report.errors.len(),
    )
    .await;

    (
        StatusCode::OK,
        Json(json!({
            "imported": imported,
            "skipped": outcome.report.skipped,
            "errors": outcome.report.errors
        })),
    )
        .into_response()
}

/// POST /import/items - Import catalog items from CSV.
async fn import_items(
    State(state): State<AppState>,
    auth: AuthUser,
    mut multipart: Multipart,
) -> impl IntoResponse {
    let data = match read_upload(&mut multipart).await {
        Ok(d) => d,
        Err(resp) => return resp.into_response(),
    };

    let user_id = auth.user_id();
    let repo = ItemRepository::new((*state.db).clone());

    let existing = match repo.skus_for_user(user_id).await {
        Ok(e) => e,
        Err(e) => {
            error!(error = %e, "Database error loading existing SKUs");
            return internal_error().into_response();
        }
    };

    let outcome = match parse_items_csv(&data, &existing) {
        Ok(o) => o,
        Err(e) => {
            return (
                StatusCode::BAD_REQUEST,
                Json(json!({
                    "error": "invalid_file",
                    "message": e.to_string()
                })),
            )
                .into_response();
        }
    };

    let imported = match repo.insert_import_rows(user_id, outcome.rows).await {
        Ok(count) => count,
        Err(e) => {
            error!(error = %e, "Database error inserting imported items");
            return internal_error().into_response();
        }
    };

    info!(
        imported,
        skipped = outcome.report.skipped,
        errors = outcome.report.errors.len(),
        "Item import finished"
    );
    record_import(
        &state,
        user_id,
        "items",
        imported,
        outcome.report.skipped,
        outcome.report.errors.len(),
    )
    .await;

    (
        StatusCode::OK,
        Json(json!({
            "imported": imported,
            "skipped": outcome.report.skipped,
            "errors": outcome.report.errors
        })),
    )
        .into_response()
}

fn csv_response(filename: &str, bytes: Vec<u8>) -> axum::response::Response {
    (
        StatusCode::OK,
        [
            (header::CONTENT_TYPE, "text/csv".to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{filename}\""),
            ),
        ],
        bytes,
    )
        .into_response()
}

/// GET /export/customers.csv - Download all customers.
async fn export_customers(State(state): State<AppState>, auth: AuthUser) -> impl IntoResponse {
    let repo = CustomerRepository::new((*state.db).clone());

    let rows = match repo.export_rows(auth.user_id()).await {
        Ok(r) => r,
        Err(e) => {
            error!(error = %e, "Database error exporting customers");
            return internal_error().into_response();
        }
    };

    match import_export::customers_to_csv(&rows) {
        Ok(bytes) => csv_response("customers.csv", bytes),
        Err(e) => {
            error!(error = %e, "Failed to serialize customers CSV");
            internal_error().into_response()
        }
    }
}

/// GET /export/items.csv - Download all catalog items.
async fn export_items(State(state): State<AppState>, auth: AuthUser) -> impl IntoResponse {
    let repo = ItemRepository::new((*state.db).clone());

    let rows = match repo.export_rows(auth.user_id()).await {
        Ok(r) => r,
        Err(e) => {
            error!(error = %e, "Database error exporting items");
            return internal_error().into_response();
        }
    };

    match import_export::items_to_csv(&rows) {
        Ok(bytes) => csv_response("items.csv", bytes),
        Err(e) => {
            error!(error = %e, "Failed to serialize items CSV");
            internal_error().into_response()
        }
    }
}

/// GET /export/invoices.csv - Download all invoices with customer names.
async fn export_invoices(State(state): State<AppState>, auth: AuthUser) -> impl IntoResponse {
    let user_id = auth.user_id();
    let invoices = InvoiceRepository::new((*state.db).clone());
    let customers = CustomerRepository::new((*state.db).clone());

    // Export everything; a page large enough for any realistic tenant.
    let page = PageRequest {
        page: 1,
        per_page: u32::MAX,
    };

    let (rows, _) = match invoices
        .list(user_id, &InvoiceFilter::default(), &page)
        .await
    {
        Ok(r) => r,
        Err(e) => {
            error!(error = %e, "Database error exporting invoices");
            return internal_error().into_response();
        }
    };

    let mut export = Vec::with_capacity(rows.len());
    for invoice in rows {
        let customer_name = match customers.find_by_id(user_id, invoice.customer_id).await {
            Ok(Some(c)) => c.name,
            Ok(None) => String::new(),
            Err(e) => {
                error!(error = %e, "Database error exporting invoices");
                return internal_error().into_response();
            }
        };

        export.push(InvoiceExportRow {
            invoice_number: invoice.invoice_number,
            customer_name,
            status: invoice.status.as_str().to_string(),
            issue_date: invoice.issue_date,
            due_date: invoice.due_date,
            currency: invoice.currency,
            subtotal: invoice.subtotal,
            discount_amount: invoice.discount_amount,
            tax_rate: invoice.tax_rate,
            tax_amount: invoice.tax_amount,
            total: invoice.total,
            payment_date: invoice.payment_date,
        });
    }

    match import_export::invoices_to_csv(&export) {
        Ok(bytes) => csv_response("invoices.csv", bytes),
        Err(e) => {
            error!(error = %e, "Failed to serialize invoices CSV");
            internal_error().into_response()
        }
    }
}
