//! API route definitions.

use axum::{Router, middleware};

use crate::{AppState, middleware::auth::auth_middleware};

pub mod audit;
pub mod auth;
pub mod customers;
pub mod health;
pub mod import_export;
pub mod invoices;
pub mod items;
pub mod notifications;
mod render;
pub mod reports;
pub mod settings;
pub mod two_factor;
pub mod quotes;

/// Creates the API router with protected routes that need state for middleware.
#[allow(clippy::needless_pass_by_value)]
pub fn api_routes_with_state(state: AppState) -> Router<AppState> {
    // Protected routes that require authentication
    let protected_routes = Router::new()
        .merge(customers::routes())
        .merge(items::routes())
        .merge(quotes::routes())
        .merge(invoices::routes())
        .merge(notifications::routes())
        .merge(settings::routes())
        .merge(two_factor::routes())
        .merge(reports::routes())
        .merge(import_export::routes())
        .merge(audit::routes())
        .layer(middleware::from_fn_with_state(
            state.clone(),
            auth_middleware,
        ));

    // Combine public and protected routes
    Router::new()
        .merge(health::routes())
        .merge(auth::routes())
        .merge(protected_routes)
}
