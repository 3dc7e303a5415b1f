//! Notification routes.

use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{delete, get, post},
};
use serde::Deserialize;
use serde_json::json;
use tracing::{error, info};

use crate::{AppState, middleware::AuthUser};
use fakturo_db::NotificationRepository;
use fakturo_db::entities::notifications;
use fakturo_shared::{PageRequest, PageResponse};

/// Creates the notifications router (requires auth middleware).
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/notifications", get(list_notifications))
        .route("/notifications/read-all", post(mark_all_read))
        .route("/notifications/cleanup", delete(cleanup))
        .route("/notifications/{id}/read", post(mark_read))
        .route("/notifications/{id}", delete(delete_notification))
}

/// List query parameters.
#[derive(Debug, Deserialize)]
struct ListQuery {
    #[serde(default = "default_page")]
    page: u32,
    #[serde(default = "default_per_page")]
    per_page: u32,
    #[serde(default)]
    unread_only: bool,
}

fn default_page() -> u32 {
    1
}

fn default_per_page() -> u32 {
    20
}

/// Cleanup query parameters.
#[derive(Debug, Deserialize)]
struct CleanupQuery {
    #[serde(default = "default_cleanup_days")]
    days: i64,
}

fn default_cleanup_days() -> i64 {
    30
}

fn notification_json(n: &notifications::Model) -> serde_json::Value {
    json!({
        "id": n.id,
        "kind": n.kind,
        "title": n.title,
        "body": n.body,
        "entity_type": n.entity_type,
        "entity_id": n.entity_id,
        "read": n.read_at.is_some(),
        "read_at": n.read_at,
        "created_at": n.created_at
    })
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

/// GET /notifications - List notifications with unread badge count.
async fn list_notifications(
    State(state): State<AppState>,
    auth: AuthUser,
    Query(query): Query<ListQuery>,
) -> impl IntoResponse {
    let repo = NotificationRepository::new((*state.db).clone());
    let page = PageRequest {
        page: query.page.max(1),
        per_page: query.per_page.clamp(1, 100),
    };

    let unread = match repo.unread_count(auth.user_id()).await {
        Ok(c) => c,
        Err(e) => {
            error!(error = %e, "Database error counting notifications");
            return internal_error().into_response();
        }
    };

    match repo.list(auth.user_id(), query.unread_only, &page).await {
        Ok((rows, total)) => {
            let data: Vec<_> = rows.iter().map(notification_json).collect();
            let mut body = serde_json::to_value(PageResponse::new(
                data,
                page.page,
                page.per_page,
                total,
            ))
            .unwrap_or_default();
            body["unread_count"] = json!(unread);
            (StatusCode::OK, Json(body)).into_response()
        }
        Err(e) => {
            error!(error = %e, "Database error listing notifications");
            internal_error().into_response()
        }
    }
}

/// POST `/notifications/{id}/read` - Mark one notification read.
async fn mark_read(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<uuid::Uuid>,
) -> impl IntoResponse {
    let repo = NotificationRepository::new((*state.db).clone());

    match repo.mark_read(auth.user_id(), id).await {
        Ok(true) => StatusCode::NO_CONTENT.into_response(),
        Ok(false) => (
            StatusCode::NOT_FOUND,
            Json(json!({
                "error": "not_found",
                "message": "Notification not found"
            })),
        )
            .into_response(),
        Err(e) => {
            error!(error = %e, "Database error marking notification read");
            internal_error().into_response()
        }
    }
}

/// POST /notifications/read-all - Mark everything read.
async fn mark_all_read(State(state): State<AppState>, auth: AuthUser) -> impl IntoResponse {
    let repo = NotificationRepository::new((*state.db).clone());

    match repo.mark_all_read(auth.user_id()).await {
        Ok(count) => (StatusCode::OK, Json(json!({ "marked_read": count }))).into_response(),
        Err(e) => {
            error!(error = %e, "Database error marking notifications read");
            internal_error().into_response()
        }
    }
}

/// DELETE `/notifications/{id}` - Delete one notification.
async fn delete_notification(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<uuid::Uuid>,
) -> impl IntoResponse {
    let repo = NotificationRepository::new((*state.db).clone());

    match repo.delete(auth.user_id(), id).await {
        Ok(true) => StatusCode::NO_CONTENT.into_response(),
        Ok(false) => (
            StatusCode::NOT_FOUND,
            Json(json!({
                "error": "not_found",
                "message": "Notification not found"
            })),
        )
            .into_response(),
        Err(e) => {
            error!(error = %e, "Database error deleting notification");
            internal_error().into_response()
        }
    }
}

/// DELETE /notifications/cleanup?days=N - Delete read notifications
/// older than N days.
async fn cleanup(
    State(state): State<AppState>,
    auth: AuthUser,
    Query(query): Query<CleanupQuery>,
) -> impl IntoResponse {
    if query.days < 1 {
        return (
            StatusCode::BAD_REQUEST,
            Json(json!({
                "error": "invalid_days",
                "message": "days must be at least 1"
            })),
        )
            .into_response();
    }

    let repo = NotificationRepository::new((*state.db).clone());

    match repo.delete_read_older_than(auth.user_id(), query.days).await {
        Ok(count) => {
            info!(count, days = query.days, "Notification cleanup finished");
            (StatusCode::OK, Json(json!({ "deleted": count }))).into_response()
        }
        Err(e) => {
            error!(error = %e, "Database error cleaning up notifications");
            internal_error().into_response()
        }
    }
}
