//! Customer management routes.

use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{delete, get, patch, post},
};
use serde::Deserialize;
use serde_json::json;
use tracing::{error, info};

use crate::{AppState, middleware::AuthUser};
use fakturo_db::entities::customers;
use fakturo_db::repositories::customer::{CustomerError, CustomerFilter, UpsertCustomerInput};
use fakturo_db::CustomerRepository;
use fakturo_shared::{PageRequest, PageResponse};

/// Creates the customers router (requires auth middleware).
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/customers", get(list_customers))
        .route("/customers", post(create_customer))
        .route("/customers/{id}", get(get_customer))
        .route("/customers/{id}", patch(update_customer))
        .route("/customers/{id}", delete(delete_customer))
}

/// Customer create/update payload.
#[derive(Debug, Deserialize)]
struct CustomerPayload {
    name: String,
    email: Option<String>,
    phone: Option<String>,
    address_line1: Option<String>,
    address_line2: Option<String>,
    city: Option<String>,
    postal_code: Option<String>,
    country: Option<String>,
    avatar_url: Option<String>,
    notes: Option<String>,
}

impl CustomerPayload {
    fn into_input(self) -> UpsertCustomerInput {
        UpsertCustomerInput {
            name: self.name.trim().to_string(),
            email: self.email.filter(|e| !e.is_empty()),
            phone: self.phone.filter(|v| !v.is_empty()),
            address_line1: self.address_line1.filter(|v| !v.is_empty()),
            address_line2: self.address_line2.filter(|v| !v.is_empty()),
            city: self.city.filter(|v| !v.is_empty()),
            postal_code: self.postal_code.filter(|v| !v.is_empty()),
            country: self.country.filter(|v| !v.is_empty()),
            avatar_url: self.avatar_url.filter(|v| !v.is_empty()),
            notes: self.notes.filter(|v| !v.is_empty()),
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
}

fn default_page() -> u32 {
    1
}

fn default_per_page() -> u32 {
    20
}

fn page_request(page: u32, per_page: u32) -> PageRequest {
    PageRequest {
        page: page.max(1),
        per_page: per_page.clamp(1, 100),
    }
}

fn customer_json(c: &customers::Model) -> serde_json::Value {
    json!({
        "id": c.id,
        "name": c.name,
        "email": c.email,
        "phone": c.phone,
        "address_line1": c.address_line1,
        "address_line2": c.address_line2,
        "city": c.city,
        "postal_code": c.postal_code,
        "country": c.country,
        "avatar_url": c.avatar_url,
        "notes": c.notes,
        "created_at": c.created_at,
        "updated_at": c.updated_at
    })
}

fn error_response(e: &CustomerError) -> (StatusCode, Json<serde_json::Value>) {
    let (status, code) = match e {
        CustomerError::NotFound(_) => (StatusCode::NOT_FOUND, "not_found"),
        CustomerError::HasDocuments => (StatusCode::CONFLICT, "has_documents"),
        CustomerError::EmptyName => (StatusCode::BAD_REQUEST, "invalid_name"),
        CustomerError::Database(_) => (StatusCode::INTERNAL_SERVER_ERROR, "internal_error"),
    };

    let message = if status == StatusCode::INTERNAL_SERVER_ERROR {
        "An error occurred".to_string()
    } else {
        e.to_string()
    };

    (status, Json(json!({ "error": code, "message": message })))
}

/// GET /customers - List customers with search and pagination.
async fn list_customers(
    State(state): State<AppState>,
    auth: AuthUser,
    Query(query): Query<ListQuery>,
) -> impl IntoResponse {
    let repo = CustomerRepository::new((*state.db).clone());
    let page = page_request(query.page, query.per_page);
    let filter = CustomerFilter {
        search: query.search,
    };

    match repo.list(auth.user_id(), &filter, &page).await {
        Ok((rows, total)) => {
            let data: Vec<_> = rows.iter().map(customer_json).collect();
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
            error!(error = %e, "Database error listing customers");
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

/// POST /customers - Create a customer.
async fn create_customer(
    State(state): State<AppState>,
    auth: AuthUser,
    Json(payload): Json<CustomerPayload>,
) -> impl IntoResponse {
    let repo = CustomerRepository::new((*state.db).clone());

    match repo.create(auth.user_id(), payload.into_input()).await {
        Ok(customer) => {
            info!(customer_id = %customer.id, "Customer created");
            (StatusCode::CREATED, Json(customer_json(&customer))).into_response()
        }
        Err(e) => error_response(&e).into_response(),
    }
}

/// GET `/customers/{id}` - Fetch one customer.
async fn get_customer(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<uuid::Uuid>,
) -> impl IntoResponse {
    let repo = CustomerRepository::new((*state.db).clone());

    match repo.find_by_id(auth.user_id(), id).await {
        Ok(Some(customer)) => (StatusCode::OK, Json(customer_json(&customer))).into_response(),
        Ok(None) => (
            StatusCode::NOT_FOUND,
            Json(json!({
                "error": "not_found",
                "message": "Customer not found"
            })),
        )
            .into_response(),
        Err(e) => {
            error!(error = %e, "Database error fetching customer");
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

/// PATCH `/customers/{id}` - Update a customer.
async fn update_customer(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<uuid::Uuid>,
    Json(payload): Json<CustomerPayload>,
) -> impl IntoResponse {
    let repo = CustomerRepository::new((*state.db).clone());

    match repo.update(auth.user_id(), id, payload.into_input()).await {
        Ok(customer) => {
            info!(customer_id = %customer.id, "Customer updated");
            (StatusCode::OK, Json(customer_json(&customer))).into_response()
        }
        Err(e) => error_response(&e).into_response(),
    }
}

/// DELETE `/customers/{id}` - Delete a customer without documents.
async fn delete_customer(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<uuid::Uuid>,
) -> impl IntoResponse {
    let repo = CustomerRepository::new((*state.db).clone());

    match repo.delete(auth.user_id(), id).await {
        Ok(()) => {
            info!(customer_id = %id, "Customer deleted");
            StatusCode::NO_CONTENT.into_response()
        }
        Err(e) => {
            if matches!(e, CustomerError::Database(_)) {
                error!(error = %e, "Database error deleting customer");
            }
            error_response(&e).into_response()
        }
    }
}
