//! Report routes.
//!
//! Assembled payloads are cached per user with a short TTL; every
//! document mutation elsewhere in the API invalidates the cache.

use axum::{
    Json, Router,
    extract::{Query, State},
    http::StatusCode,
    response::IntoResponse,
    routing::get,
};
use chrono::{Datelike, NaiveDate, Utc};
use serde::Deserialize;
use serde_json::json;
use tracing::error;

use crate::{AppState, middleware::AuthUser};
use fakturo_core::reports::{ReportService, StatusBreakdown};
use fakturo_db::ReportRepository;

/// Creates the reports router (requires auth middleware).
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/reports/summary", get(summary))
        .route("/reports/revenue", get(revenue))
        .route("/reports/top-customers", get(top_customers))
        .route("/reports/status-breakdown", get(status_breakdown))
}

/// Revenue report query parameters.
#[derive(Debug, Deserialize)]
struct RevenueQuery {
    from: Option<NaiveDate>,
    to: Option<NaiveDate>,
}

/// Top customers query parameters.
#[derive(Debug, Deserialize)]
struct TopQuery {
    #[serde(default = "default_limit")]
    limit: usize,
}

fn default_limit() -> usize {
    5
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

/// GET /reports/summary - Headline figures and conversion rate.
async fn summary(State(state): State<AppState>, auth: AuthUser) -> impl IntoResponse {
    let user_id = auth.user_id();

    if let Some(cached) = state.report_cache.get(user_id, "summary", "") {
        return (StatusCode::OK, Json((*cached).clone())).into_response();
    }

    let repo = ReportRepository::new((*state.db).clone());

    let statuses = match repo.invoice_status_counts(user_id).await {
        Ok(s) => s,
        Err(e) => {
            error!(error = %e, "Database error building summary");
            return internal_error().into_response();
        }
    };
    let (quote_count, converted) = match repo.quote_counts(user_id).await {
        Ok(c) => c,
        Err(e) => {
            error!(error = %e, "Database error building summary");
            return internal_error().into_response();
        }
    };

    let report = ReportService::build_summary(statuses, quote_count, converted);
    let body = serde_json::to_value(report).unwrap_or_default();
    state.report_cache.insert(user_id, "summary", "", body.clone());

    (StatusCode::OK, Json(body)).into_response()
}

/// GET /reports/revenue?from&to - Monthly paid revenue buckets.
async fn revenue(
    State(state): State<AppState>,
    auth: AuthUser,
    Query(query): Query<RevenueQuery>,
) -> impl IntoResponse {
    let user_id = auth.user_id();
    let today = Utc::now().date_naive();

    // Default to the trailing twelve months.
    let from = query.from.unwrap_or_else(|| {
        let start = today - chrono::Months::new(11);
        NaiveDate::from_ymd_opt(start.year(), start.month(), 1).unwrap_or(start)
    });
    let to = query.to.unwrap_or(today);

    if from > to {
        return (
            StatusCode::BAD_REQUEST,
            Json(json!({
                "error": "invalid_range",
                "message": "from must not be after to"
            })),
        )
            .into_response();
    }

    let variant = format!("{from}:{to}");
    if let Some(cached) = state.report_cache.get(user_id, "revenue", &variant) {
        return (StatusCode::OK, Json((*cached).clone())).into_response();
    }

    let repo = ReportRepository::new((*state.db).clone());
    let rows = match repo.paid_invoices_between(user_id, from, to).await {
        Ok(r) => r,
        Err(e) => {
            error!(error = %e, "Database error building revenue report");
            return internal_error().into_response();
        }
    };

    let report = ReportService::revenue_by_month(&rows, from, to);
    let body = serde_json::to_value(report).unwrap_or_default();
    state
        .report_cache
        .insert(user_id, "revenue", &variant, body.clone());

    (StatusCode::OK, Json(body)).into_response()
}

/// GET /reports/top-customers?limit - Customers ranked by billed volume.
async fn top_customers(
    State(state): State<AppState>,
    auth: AuthUser,
    Query(query): Query<TopQuery>,
) -> impl IntoResponse {
    let user_id = auth.user_id();
    let limit = query.limit.clamp(1, 50);

    let variant = limit.to_string();
    if let Some(cached) = state.report_cache.get(user_id, "top_customers", &variant) {
        return (StatusCode::OK, Json((*cached).clone())).into_response();
    }

    let repo = ReportRepository::new((*state.db).clone());
    match repo.top_customers(user_id, limit).await {
        Ok(customers) => {
            let body = json!({ "customers": customers });
            state
                .report_cache
                .insert(user_id, "top_customers", &variant, body.clone());
            (StatusCode::OK, Json(body)).into_response()
        }
        Err(e) => {
            error!(error = %e, "Database error building top customers");
            internal_error().into_response()
        }
    }
}

/// GET /reports/status-breakdown - Invoice counts and totals per status.
async fn status_breakdown(State(state): State<AppState>, auth: AuthUser) -> impl IntoResponse {
    let user_id = auth.user_id();

    if let Some(cached) = state.report_cache.get(user_id, "status_breakdown", "") {
        return (StatusCode::OK, Json((*cached).clone())).into_response();
    }

    let repo = ReportRepository::new((*state.db).clone());
    match repo.invoice_status_counts(user_id).await {
        Ok(statuses) => {
            let body =
                serde_json::to_value(StatusBreakdown { statuses }).unwrap_or_default();
            state
                .report_cache
                .insert(user_id, "status_breakdown", "", body.clone());
            (StatusCode::OK, Json(body)).into_response()
        }
        Err(e) => {
            error!(error = %e, "Database error building status breakdown");
            internal_error().into_response()
        }
    }
}
