//! Audit log routes.

use axum::{
    Json, Router,
    extract::{Query, State},
    http::StatusCode,
    response::IntoResponse,
    routing::get,
};
use serde::Deserialize;
use serde_json::json;
use tracing::error;

use crate::{AppState, middleware::AuthUser};
use fakturo_db::AuditRepository;
use fakturo_db::entities::audit_logs;
use fakturo_shared::{PageRequest, PageResponse};

/// Creates the audit router (requires auth middleware).
pub fn routes() -> Router<AppState> {
    Router::new().route("/audit-logs", get(list_audit_logs))
}

/// List query parameters.
#[derive(Debug, Deserialize)]
struct ListQuery {
    #[serde(default = "default_page")]
    page: u32,
    #[serde(default = "default_per_page")]
    per_page: u32,
    action: Option<String>,
}

fn default_page() -> u32 {
    1
}

fn default_per_page() -> u32 {
    20
}

fn audit_json(a: &audit_logs::Model) -> serde_json::Value {
    json!({
        "id": a.id,
        "action": a.action,
        "entity_type": a.entity_type,
        "entity_id": a.entity_id,
        "detail": a.detail,
        "ip_address": a.ip_address,
        "created_at": a.created_at
    })
}

/// GET /audit-logs - List the user's audit trail.
async fn list_audit_logs(
    State(state): State<AppState>,
    auth: AuthUser,
    Query(query): Query<ListQuery>,
) -> impl IntoResponse {
    let repo = AuditRepository::new((*state.db).clone());
    let page = PageRequest {
        page: query.page.max(1),
        per_page: query.per_page.clamp(1, 100),
    };

    match repo
        .list(auth.user_id(), query.action.as_deref(), &page)
        .await
    {
        Ok((rows, total)) => {
            let data: Vec<_> = rows.iter().map(audit_json).collect();
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
            error!(error = %e, "Database error listing audit logs");
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
