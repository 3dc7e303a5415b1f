//! Catalog item routes.

use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{delete, get, patch, post},
};
use rust_decimal::Decimal;
use serde::Deserialize;
use serde_json::json;
use tracing::{error, info};

use crate::{AppState, middleware::AuthUser};
use fakturo_db::ItemRepository;
use fakturo_db::entities::items;
use fakturo_db::repositories::item::{ItemError, ItemFilter, UpsertItemInput};
use fakturo_shared::{PageRequest, PageResponse};

/// Creates the items router (requires auth middleware).
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/items", get(list_items))
        .route("/items", post(create_item))
        .route("/items/{id}", get(get_item))
        .route("/items/{id}", patch(update_item))
        .route("/items/{id}", delete(delete_item))
        .route("/items/{id}/archive", post(archive_item))
        .route("/items/{id}/unarchive", post(unarchive_item))
}

/// Item create/update payload.
#[derive(Debug, Deserialize)]
struct ItemPayload {
    name: String,
    description: Option<String>,
    unit: Option<String>,
    unit_price: Decimal,
    currency: String,
    sku: Option<String>,
}

impl ItemPayload {
    fn into_input(self) -> UpsertItemInput {
        UpsertItemInput {
            name: self.name.trim().to_string(),
            description: self.description.filter(|v| !v.is_empty()),
            unit: self.unit.filter(|v| !v.is_empty()),
            unit_price: self.unit_price,
            currency: self.currency,
            sku: self.sku.map(|s| s.trim().to_string()),
        }
    }
}

/// List query parameters.
#[derive(Debug, Deserialize)]
struct ListQuery {
    #[serde(default = "default_page")]
    page: u32,
    #[serde(default = "default_per_page")]
    per_page: u32,
    search: Option<String>,
    #[serde(default)]
    include_archived: bool,
}

fn default_page() -> u32 {
    1
}

fn default_per_page() -> u32 {
    20
}

fn item_json(i: &items::Model) -> serde_json::Value {
    json!({
        "id": i.id,
        "name": i.name,
        "description": i.description,
        "unit": i.unit,
        "unit_price": i.unit_price,
        "currency": i.currency,
        "sku": i.sku,
        "archived": i.archived_at.is_some(),
        "created_at": i.created_at,
        "updated_at": i.updated_at
    })
}

fn error_response(e: &ItemError) -> (StatusCode, Json<serde_json::Value>) {
    let (status, code) = match e {
        ItemError::NotFound(_) => (StatusCode::NOT_FOUND, "not_found"),
        ItemError::DuplicateSku(_) => (StatusCode::CONFLICT, "duplicate_sku"),
        ItemError::EmptyName => (StatusCode::BAD_REQUEST, "invalid_name"),
        ItemError::NegativePrice => (StatusCode::BAD_REQUEST, "invalid_price"),
        ItemError::InvalidCurrency(_) => (StatusCode::BAD_REQUEST, "invalid_currency"),
        ItemError::Database(_) => (StatusCode::INTERNAL_SERVER_ERROR, "internal_error"),
    };

    let message = if status == StatusCode::INTERNAL_SERVER_ERROR {
        "An error occurred".to_string()
    } else {
        e.to_string()
    };

    (status, Json(json!({ "error": code, "message": message })))
}

/// GET /items - List catalog items.
async fn list_items(
    State(state): State<AppState>,
    auth: AuthUser,
    Query(query): Query<ListQuery>,
) -> impl IntoResponse {
    let repo = ItemRepository::new((*state.db).clone());
    let page = PageRequest {
        page: query.page.max(1),
        per_page: query.per_page.clamp(1, 100),
    };
    let filter = ItemFilter {
        search: query.search,
        include_archived: query.include_archived,
    };

    match repo.list(auth.user_id(), &filter, &page).await {
        Ok((rows, total)) => {
            let data: Vec<_> = rows.iter().map(item_json).collect();
            (
                StatusCode::OK,
                Json(
                    serde_json::to_value(PageResponse::new(
                        data,
                        page.page,
                        page.per_page,
                        total,
                    ))
                    .unwrap_or_default(),
                ),
            )
                .into_response()
        }
        Err(e) => {
            error!(error = %e, "Database error listing items");
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

/// POST /items - Create a catalog item.
async fn create_item(
    State(state): State<AppState>,
    auth: AuthUser,
    Json(payload): Json<ItemPayload>,
) -> impl IntoResponse {
    let repo = ItemRepository::new((*state.db).clone());

    match repo.create(auth.user_id(), payload.into_input()).await {
        Ok(item) => {
            info!(item_id = %item.id, "Item created");
            (StatusCode::CREATED, Json(item_json(&item))).into_response()
        }
        Err(e) => error_response(&e).into_response(),
    }
}

/// GET `/items/{id}` - Fetch one item.
async fn get_item(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<uuid::Uuid>,
) -> impl IntoResponse {
    let repo = ItemRepository::new((*state.db).clone());

    match repo.find_by_id(auth.user_id(), id).await {
        Ok(Some(item)) => (StatusCode::OK, Json(item_json(&item))).into_response(),
        Ok(None) => (
            StatusCode::NOT_FOUND,
            Json(json!({
                "error": "not_found",
                "message": "Item not found"
            })),
        )
            .into_response(),
        Err(e) => {
            error!(error = %e, "Database error fetching item");
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

/// PATCH `/items/{id}` - Update an item.
async fn update_item(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<uuid::Uuid>,
    Json(payload): Json<ItemPayload>,
) -> impl IntoResponse {
    let repo = ItemRepository::new((*state.db).clone());

    match repo.update(auth.user_id(), id, payload.into_input()).await {
        Ok(item) => {
            info!(item_id = %item.id, "Item updated");
            (StatusCode::OK, Json(item_json(&item))).into_response()
        }
        Err(e) => error_response(&e).into_response(),
    }
}

/// DELETE `/items/{id}` - Delete an item; document lines keep their
/// snapshots.
async fn delete_item(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<uuid::Uuid>,
) -> impl IntoResponse {
    let repo = ItemRepository::new((*state.db).clone());

    match repo.delete(auth.user_id(), id).await {
        Ok(()) => {
            info!(item_id = %id, "Item deleted");
            StatusCode::NO_CONTENT.into_response()
        }
        Err(e) => error_response(&e).into_response(),
    }
}

/// POST `/items/{id}/archive` - Hide an item from pickers.
async fn archive_item(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<uuid::Uuid>,
) -> impl IntoResponse {
    set_archived(state, auth, id, true).await
}

/// POST `/items/{id}/unarchive` - Restore an archived item.
async fn unarchive_item(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<uuid::Uuid>,
) -> impl IntoResponse {
    set_archived(state, auth, id, false).await
}

async fn set_archived(
    state: AppState,
    auth: AuthUser,
    id: uuid::Uuid,
    archived: bool,
) -> axum::response::Response {
    let repo = ItemRepository::new((*state.db).clone());

    match repo.set_archived(auth.user_id(), id, archived).await {
        Ok(item) => (StatusCode::OK, Json(item_json(&item))).into_response(),
        Err(e) => error_response(&e).into_response(),
    }
}
