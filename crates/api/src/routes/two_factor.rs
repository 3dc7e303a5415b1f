//! Two-factor authentication management routes.
//!
//! Setup stores a pending secret; enable verifies the first code and
//! issues recovery codes; disable requires the password plus a valid
//! code. Every change is audited.

use axum::{
    Json, Router, extract::State, http::StatusCode, response::IntoResponse, routing::post,
};
use serde::Deserialize;
use serde_json::json;
use tracing::{error, info};

use crate::{AppState, middleware::AuthUser};
use fakturo_core::auth::verify_password;
use fakturo_core::twofactor;
use fakturo_db::{AuditRepository, SessionRepository, UserRepository};

/// Creates the two-factor router (requires auth middleware).
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/two-factor/setup", post(setup))
        .route("/two-factor/enable", post(enable))
        .route("/two-factor/disable", post(disable))
        .route("/two-factor/recovery-codes", post(regenerate_recovery_codes))
}

/// Request carrying a TOTP code.
#[derive(Debug, Deserialize)]
struct CodeRequest {
    /// Six digit TOTP code.
    code: String,
}

/// Request to disable two-factor authentication.
#[derive(Debug, Deserialize)]
struct DisableRequest {
    /// Account password.
    password: String,
    /// TOTP code or recovery code.
    code: String,
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

async fn audit(state: &AppState, user_id: uuid::Uuid, action: &str) {
    let repo = AuditRepository::new((*state.db).clone());
    if let Err(e) = repo
        .record(Some(user_id), action, None, None, json!({}), None)
        .await
    {
        error!(error = %e, action, "Failed to write audit log");
    }
}

/// POST /two-factor/setup - Generate a pending secret.
async fn setup(State(state): State<AppState>, auth: AuthUser) -> impl IntoResponse {
    let user_repo = UserRepository::new((*state.db).clone());

    let user = match user_repo.find_by_id(auth.user_id()).await {
        Ok(Some(u)) => u,
        Ok(None) => return internal_error().into_response(),
        Err(e) => {
            error!(error = %e, "Database error during 2FA setup");
            return internal_error().into_response();
        }
    };

    if user.totp_enabled_at.is_some() {
        return (
            StatusCode::CONFLICT,
            Json(json!({
                "error": "already_enabled",
                "message": "Two-factor authentication is already enabled"
            })),
        )
            .into_response();
    }

    let secret = twofactor::generate_secret();
    let url = match twofactor::otpauth_url(&secret, &user.email) {
        Ok(u) => u,
        Err(e) => {
            error!(error = %e, "Failed to build otpauth URL");
            return internal_error().into_response();
        }
    };

    if let Err(e) = user_repo
        .set_totp_secret(user.id, Some(secret.clone()))
        .await
    {
        error!(error = %e, "Failed to store pending TOTP secret");
        return internal_error().into_response();
    }

    (
        StatusCode::OK,
        Json(json!({
            "secret": secret,
            "otpauth_url": url
        })),
    )
        .into_response()
}

/// POST /two-factor/enable - Verify the first code, enable, return
/// recovery codes.
async fn enable(
    State(state): State<AppState>,
    auth: AuthUser,
    Json(payload): Json<CodeRequest>,
) -> impl IntoResponse {
    let user_repo = UserRepository::new((*state.db).clone());

    let user = match user_repo.find_by_id(auth.user_id()).await {
        Ok(Some(u)) => u,
        Ok(None) => return internal_error().into_response(),
        Err(e) => {
            error!(error = %e, "Database error during 2FA enable");
            return internal_error().into_response();
        }
    };

    if user.totp_enabled_at.is_some() {
        return (
            StatusCode::CONFLICT,
            Json(json!({
                "error": "already_enabled",
                "message": "Two-factor authentication is already enabled"
            })),
        )
            .into_response();
    }

    let Some(secret) = user.totp_secret.clone() else {
        return (
            StatusCode::BAD_REQUEST,
            Json(json!({
                "error": "setup_required",
                "message": "Run two-factor setup first"
            })),
        )
            .into_response();
    };

    match twofactor::verify_code(&secret, &user.email, &payload.code) {
        Ok(true) => {}
        Ok(false) => {
            return (
                StatusCode::BAD_REQUEST,
                Json(json!({
                    "error": "invalid_code",
                    "message": "The code does not match; check your authenticator app"
                })),
            )
                .into_response();
        }
        Err(e) => {
            error!(error = %e, "TOTP verification error");
            return internal_error().into_response();
        }
    }

    let codes = twofactor::generate_recovery_codes();
    let mut hashes = Vec::with_capacity(codes.len());
    for code in &codes {
        match twofactor::hash_recovery_code(code) {
            Ok(h) => hashes.push(h),
            Err(e) => {
                error!(error = %e, "Failed to hash recovery code");
                return internal_error().into_response();
            }
        }
    }

    if let Err(e) = user_repo.enable_totp(user.id, &hashes).await {
        error!(error = %e, "Failed to enable TOTP");
        return internal_error().into_response();
    }

    audit(&state, user.id, "two_factor_enabled").await;
    info!(user_id = %user.id, "Two-factor authentication enabled");

    (
        StatusCode::OK,
        Json(json!({
            "enabled": true,
            "recovery_codes": codes
        })),
    )
        .into_response()
}

/// POST /two-factor/disable - Turn off 2FA with password + code.
async fn disable(
    State(state): State<AppState>,
    auth: AuthUser,
    Json(payload): Json<DisableRequest>,
) -> impl IntoResponse {
    let user_repo = UserRepository::new((*state.db).clone());

    let user = match user_repo.find_by_id(auth.user_id()).await {
        Ok(Some(u)) => u,
        Ok(None) => return internal_error().into_response(),
        Err(e) => {
            error!(error = %e, "Database error during 2FA disable");
            return internal_error().into_response();
        }
    };

    if user.totp_enabled_at.is_none() {
        return (
            StatusCode::BAD_REQUEST,
            Json(json!({
                "error": "not_enabled",
                "message": "Two-factor authentication is not enabled"
            })),
        )
            .into_response();
    }

    match verify_password(&payload.password, &user.password_hash) {
        Ok(true) => {}
        Ok(false) => {
            return (
                StatusCode::UNAUTHORIZED,
                Json(json!({
                    "error": "invalid_credentials",
                    "message": "Password is incorrect"
                })),
            )
                .into_response();
        }
        Err(e) => {
            error!(error = %e, "Password verification error");
            return internal_error().into_response();
        }
    }

    let secret = user.totp_secret.clone().unwrap_or_default();
    let mut verified = matches!(
        twofactor::verify_code(&secret, &user.email, &payload.code),
        Ok(true)
    );

    if !verified {
        if let Ok(hash) = twofactor::hash_recovery_code(&payload.code) {
            verified = user_repo
                .consume_recovery_code(user.id, &hash)
                .await
                .unwrap_or(false);
        }
    }

    if !verified {
        return (
            StatusCode::BAD_REQUEST,
            Json(json!({
                "error": "invalid_code",
                "message": "Invalid authentication code"
            })),
        )
            .into_response();
    }

    if let Err(e) = user_repo.disable_totp(user.id).await {
        error!(error = %e, "Failed to disable TOTP");
        return internal_error().into_response();
    }

    // Other sessions were established under the stronger policy.
    let session_repo = SessionRepository::new((*state.db).clone());
    if let Err(e) = session_repo.revoke_all_for_user(user.id).await {
        error!(error = %e, "Failed to revoke sessions after 2FA disable");
    }

    audit(&state, user.id, "two_factor_disabled").await;
    info!(user_id = %user.id, "Two-factor authentication disabled");

    (StatusCode::OK, Json(json!({ "enabled": false }))).into_response()
}

/// POST /two-factor/recovery-codes - Regenerate recovery codes.
async fn regenerate_recovery_codes(
    State(state): State<AppState>,
    auth: AuthUser,
    Json(payload): Json<CodeRequest>,
) -> impl IntoResponse {
    let user_repo = UserRepository::new((*state.db).clone());

    let user = match user_repo.find_by_id(auth.user_id()).await {
        Ok(Some(u)) => u,
        Ok(None) => return internal_error().into_response(),
        Err(e) => {
            error!(error = %e, "Database error regenerating recovery codes");
            return internal_error().into_response();
        }
    };

    let Some(secret) = user.totp_secret.clone().filter(|_| user.totp_enabled_at.is_some())
    else {
        return (
            StatusCode::BAD_REQUEST,
            Json(json!({
                "error": "not_enabled",
                "message": "Two-factor authentication is not enabled"
            })),
        )
            .into_response();
    };

    match twofactor::verify_code(&secret, &user.email, &payload.code) {
        Ok(true) => {}
        Ok(false) => {
            return (
                StatusCode::BAD_REQUEST,
                Json(json!({
                    "error": "invalid_code",
                    "message": "The code does not match; check your authenticator app"
                })),
            )
                .into_response();
        }
        Err(e) => {
            error!(error = %e, "TOTP verification error");
            return internal_error().into_response();
        }
    }

    let codes = twofactor::generate_recovery_codes();
    let mut hashes = Vec::with_capacity(codes.len());
    for code in &codes {
        match twofactor::hash_recovery_code(code) {
            Ok(h) => hashes.push(h),
            Err(e) => {
                error!(error = %e, "Failed to hash recovery code");
                return internal_error().into_response();
            }
        }
    }

    if let Err(e) = user_repo.replace_recovery_codes(user.id, &hashes).await {
        error!(error = %e, "Failed to replace recovery codes");
        return internal_error().into_response();
    }

    audit(&state, user.id, "recovery_codes_regenerated").await;

    (StatusCode::OK, Json(json!({ "recovery_codes": codes }))).into_response()
}
