//! Authentication routes for register, login, token refresh, and logout.
//!
//! Login is two-step for users with TOTP enabled: the first step returns
//! a short-lived challenge token, the second exchanges it together with
//! a TOTP or recovery code for the real token pair.

use axum::{
    Json, Router,
    extract::State,
    http::{HeaderMap, StatusCode, header::USER_AGENT},
    response::IntoResponse,
    routing::post,
};
use serde_json::json;
use tracing::{error, info, warn};

use crate::AppState;
use fakturo_core::auth::{hash_password, validate_password_strength, verify_password};
use fakturo_core::twofactor;
use fakturo_db::entities::users;
use fakturo_db::{AuditRepository, SessionRepository, SettingsRepository, UserRepository};
use fakturo_shared::auth::{
    LoginRequest, LogoutRequest, RefreshRequest, RegisterRequest, TwoFactorChallengeResponse,
    TwoFactorLoginRequest, UserInfo,
};

/// Creates the auth router.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/auth/register", post(register))
        .route("/auth/login", post(login))
        .route("/auth/login/verify", post(login_verify))
        .route("/auth/refresh", post(refresh))
        .route("/auth/logout", post(logout))
}

fn user_agent(headers: &HeaderMap) -> Option<&str> {
    headers.get(USER_AGENT).and_then(|v| v.to_str().ok())
}

fn internal_error(message: &str) -> (StatusCode, Json<serde_json::Value>) {
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(json!({
            "error": "internal_error",
            "message": message
        })),
    )
}

/// Records an audit event, logging but swallowing failures.
async fn audit(
    state: &AppState,
    user_id: Option<uuid::Uuid>,
    action: &str,
    detail: serde_json::Value,
) {
    let repo = AuditRepository::new((*state.db).clone());
    if let Err(e) = repo.record(user_id, action, None, None, detail, None).await {
        error!(error = %e, action, "Failed to write audit log");
    }
}

/// Issues a token pair and records the session.
async fn issue_tokens(
    state: &AppState,
    user: &users::Model,
    headers: &HeaderMap,
) -> Result<(String, String, i64), (StatusCode, Json<serde_json::Value>)> {
    let access_token = state
        .jwt_service
        .generate_access_token(user.id, &user.email)
        .map_err(|e| {
            error!(error = %e, "Failed to generate access token");
            internal_error("An error occurred during login")
        })?;
    let refresh_token = state
        .jwt_service
        .generate_refresh_token(user.id, &user.email)
        .map_err(|e| {
            error!(error = %e, "Failed to generate refresh token");
            internal_error("An error occurred during login")
        })?;

    let expires_at = chrono::Utc::now()
        + chrono::Duration::days(state.jwt_service.refresh_token_expires_days());

    let session_repo = SessionRepository::new((*state.db).clone());
    session_repo
        .create(user.id, &refresh_token, expires_at, user_agent(headers), None)
        .await
        .map_err(|e| {
            error!(error = %e, "Failed to create session");
            internal_error("An error occurred during login")
        })?;

    Ok((
        access_token,
        refresh_token,
        state.jwt_service.access_token_expires_in(),
    ))
}

fn user_info(user: &users::Model) -> UserInfo {
    UserInfo {
        id: user.id,
        email: user.email.clone(),
        full_name: user.full_name.clone(),
        two_factor_enabled: user.totp_enabled_at.is_some(),
    }
}

/// POST /auth/register - Create an account and log in.
async fn register(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(payload): Json<RegisterRequest>,
) -> impl IntoResponse {
    let user_repo = UserRepository::new((*state.db).clone());

    let email = payload.email.trim().to_lowercase();
    if email.is_empty() || !email.contains('@') {
        return (
            StatusCode::BAD_REQUEST,
            Json(json!({
                "error": "invalid_email",
                "message": "A valid email address is required"
            })),
        )
            .into_response();
    }

    if payload.full_name.trim().is_empty() {
        return (
            StatusCode::BAD_REQUEST,
            Json(json!({
                "error": "invalid_name",
                "message": "Full name is required"
            })),
        )
            .into_response();
    }

    if let Err(e) = validate_password_strength(&payload.password) {
        return (
            StatusCode::BAD_REQUEST,
            Json(json!({
                "error": "weak_password",
                "message": e.to_string()
            })),
        )
            .into_response();
    }

    match user_repo.email_exists(&email).await {
        Ok(true) => {
            return (
                StatusCode::CONFLICT,
                Json(json!({
                    "error": "email_exists",
                    "message": "An account with this email already exists"
                })),
            )
                .into_response();
        }
        Ok(false) => {}
        Err(e) => {
            error!(error = %e, "Database error checking email");
            return internal_error("An error occurred during registration").into_response();
        }
    }

    let password_hash = match hash_password(&payload.password) {
        Ok(h) => h,
        Err(e) => {
            error!(error = %e, "Password hashing failed");
            return internal_error("An error occurred during registration").into_response();
        }
    };

    let user = match user_repo
        .create(&email, &password_hash, payload.full_name.trim())
        .await
    {
        Ok(u) => u,
        Err(e) => {
            error!(error = %e, "Failed to create user");
            return internal_error("An error occurred during registration").into_response();
        }
    };

    // Provision the default settings row up front.
    let settings_repo = SettingsRepository::new((*state.db).clone());
    if let Err(e) = settings_repo.get_or_create(user.id).await {
        error!(error = %e, "Failed to create default settings");
    }

    audit(&state, Some(user.id), "user_registered", json!({})).await;
    info!(user_id = %user.id, "User registered");

    let (access_token, refresh_token, expires_in) =
        match issue_tokens(&state, &user, &headers).await {
            Ok(t) => t,
            Err(resp) => return resp.into_response(),
        };

    (
        StatusCode::CREATED,
        Json(json!({
            "user": user_info(&user),
            "access_token": access_token,
            "refresh_token": refresh_token,
            "expires_in": expires_in
        })),
    )
        .into_response()
}

/// POST /auth/login - Authenticate; returns tokens or a 2FA challenge.
async fn login(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(payload): Json<LoginRequest>,
) -> impl IntoResponse {
    let user_repo = UserRepository::new((*state.db).clone());

    let user = match user_repo.find_by_email(&payload.email.to_lowercase()).await {
        Ok(Some(u)) => u,
        Ok(None) => {
            info!(email = %payload.email, "Login attempt for non-existent user");
            return (
                StatusCode::UNAUTHORIZED,
                Json(json!({
                    "error": "invalid_credentials",
                    "message": "Invalid email or password"
                })),
            )
                .into_response();
        }
        Err(e) => {
            error!(error = %e, "Database error during login");
            return internal_error("An error occurred during login").into_response();
        }
    };

    if !user.is_active {
        return (
            StatusCode::UNAUTHORIZED,
            Json(json!({
                "error": "account_disabled",
                "message": "This account has been disabled"
            })),
        )
            .into_response();
    }

    match verify_password(&payload.password, &user.password_hash) {
        Ok(true) => {}
        Ok(false) => {
            warn!(user_id = %user.id, "Failed login attempt - invalid password");
            audit(&state, Some(user.id), "login_failed", json!({})).await;
            return (
                StatusCode::UNAUTHORIZED,
                Json(json!({
                    "error": "invalid_credentials",
                    "message": "Invalid email or password"
                })),
            )
                .into_response();
        }
        Err(e) => {
            error!(error = %e, "Password verification error");
            return internal_error("An error occurred during login").into_response();
        }
    }

    // Users with TOTP enabled get a challenge instead of tokens.
    if user.totp_enabled_at.is_some() {
        let challenge = match state.jwt_service.generate_challenge_token(user.id) {
            Ok(c) => c,
            Err(e) => {
                error!(error = %e, "Failed to generate challenge token");
                return internal_error("An error occurred during login").into_response();
            }
        };

        return (
            StatusCode::OK,
            Json(
                serde_json::to_value(TwoFactorChallengeResponse {
                    two_factor_required: true,
                    challenge,
                    expires_in: 300,
                })
                .unwrap_or_default(),
            ),
        )
            .into_response();
    }

    let (access_token, refresh_token, expires_in) =
        match issue_tokens(&state, &user, &headers).await {
            Ok(t) => t,
            Err(resp) => return resp.into_response(),
        };

    audit(&state, Some(user.id), "login", json!({})).await;
    info!(user_id = %user.id, "User logged in");

    (
        StatusCode::OK,
        Json(json!({
            "user": user_info(&user),
            "access_token": access_token,
            "refresh_token": refresh_token,
            "expires_in": expires_in
        })),
    )
        .into_response()
}

/// POST /auth/login/verify - Complete a two-factor login.
async fn login_verify(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(payload): Json<TwoFactorLoginRequest>,
) -> impl IntoResponse {
    let user_id = match state.jwt_service.validate_challenge_token(&payload.challenge) {
        Ok(id) => id,
        Err(_) => {
            return (
                StatusCode::UNAUTHORIZED,
                Json(json!({
                    "error": "invalid_challenge",
                    "message": "Challenge is invalid or expired; log in again"
                })),
            )
                .into_response();
        }
    };

    let user_repo = UserRepository::new((*state.db).clone());
    let user = match user_repo.find_by_id(user_id).await {
        Ok(Some(u)) if u.is_active => u,
        Ok(_) => {
            return (
                StatusCode::UNAUTHORIZED,
                Json(json!({
                    "error": "invalid_challenge",
                    "message": "Challenge is invalid or expired; log in again"
                })),
            )
                .into_response();
        }
        Err(e) => {
            error!(error = %e, "Database error during 2FA login");
            return internal_error("An error occurred during login").into_response();
        }
    };

    let Some(secret) = user.totp_secret.clone() else {
        return (
            StatusCode::UNAUTHORIZED,
            Json(json!({
                "error": "two_factor_not_enabled",
                "message": "Two-factor authentication is not enabled"
            })),
        )
            .into_response();
    };

    // Try a TOTP code first, then fall back to a recovery code.
    let mut verified = matches!(
        twofactor::verify_code(&secret, &user.email, &payload.code),
        Ok(true)
    );
    let mut used_recovery = false;

    if !verified {
        if let Ok(hash) = twofactor::hash_recovery_code(&payload.code) {
            match user_repo.consume_recovery_code(user.id, &hash).await {
                Ok(true) => {
                    verified = true;
                    used_recovery = true;
                }
                Ok(false) => {}
                Err(e) => {
                    error!(error = %e, "Database error checking recovery code");
                    return internal_error("An error occurred during login").into_response();
                }
            }
        }
    }

    if !verified {
        warn!(user_id = %user.id, "Failed two-factor attempt");
        audit(&state, Some(user.id), "two_factor_failed", json!({})).await;
        return (
            StatusCode::UNAUTHORIZED,
            Json(json!({
                "error": "invalid_code",
                "message": "Invalid authentication code"
            })),
        )
            .into_response();
    }

    let (access_token, refresh_token, expires_in) =
        match issue_tokens(&state, &user, &headers).await {
            Ok(t) => t,
            Err(resp) => return resp.into_response(),
        };

    audit(
        &state,
        Some(user.id),
        "login",
        json!({ "two_factor": true, "recovery_code": used_recovery }),
    )
    .await;
    info!(user_id = %user.id, "User logged in with second factor");

    (
        StatusCode::OK,
        Json(json!({
            "user": user_info(&user),
            "access_token": access_token,
            "refresh_token": refresh_token,
            "expires_in": expires_in,
            "recovery_code_used": used_recovery
        })),
    )
        .into_response()
}

/// POST /auth/refresh - Rotate a refresh token.
async fn refresh(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(payload): Json<RefreshRequest>,
) -> impl IntoResponse {
    // The refresh token must both be a valid JWT and match a live session.
    let claims = match state.jwt_service.validate_token(&payload.refresh_token) {
        Ok(c) => c,
        Err(_) => {
            return (
                StatusCode::UNAUTHORIZED,
                Json(json!({
                    "error": "invalid_token",
                    "message": "Refresh token is invalid or expired"
                })),
            )
                .into_response();
        }
    };

    let session_repo = SessionRepository::new((*state.db).clone());
    let session = match session_repo.find_by_token(&payload.refresh_token).await {
        Ok(Some(s)) => s,
        Ok(None) => {
            return (
                StatusCode::UNAUTHORIZED,
                Json(json!({
                    "error": "invalid_token",
                    "message": "Refresh token is invalid or expired"
                })),
            )
                .into_response();
        }
        Err(e) => {
            error!(error = %e, "Database error during refresh");
            return internal_error("An error occurred during refresh").into_response();
        }
    };

    let user_repo = UserRepository::new((*state.db).clone());
    let user = match user_repo.find_by_id(claims.user_id()).await {
        Ok(Some(u)) if u.is_active => u,
        Ok(_) => {
            return (
                StatusCode::UNAUTHORIZED,
                Json(json!({
                    "error": "account_disabled",
                    "message": "This account has been disabled"
                })),
            )
                .into_response();
        }
        Err(e) => {
            error!(error = %e, "Database error during refresh");
            return internal_error("An error occurred during refresh").into_response();
        }
    };

    // Rotate: revoke the old session, issue a fresh pair.
    if let Err(e) = session_repo.revoke(session.id).await {
        error!(error = %e, "Failed to revoke session during rotation");
        return internal_error("An error occurred during refresh").into_response();
    }

    let (access_token, refresh_token, expires_in) =
        match issue_tokens(&state, &user, &headers).await {
            Ok(t) => t,
            Err(resp) => return resp.into_response(),
        };

    (
        StatusCode::OK,
        Json(json!({
            "access_token": access_token,
            "refresh_token": refresh_token,
            "expires_in": expires_in
        })),
    )
        .into_response()
}

/// POST /auth/logout - Revoke the presented refresh token.
async fn logout(
    State(state): State<AppState>,
    Json(payload): Json<LogoutRequest>,
) -> impl IntoResponse {
    let session_repo = SessionRepository::new((*state.db).clone());

    match session_repo.revoke_by_token(&payload.refresh_token).await {
        Ok(_) => StatusCode::NO_CONTENT.into_response(),
        Err(e) => {
            error!(error = %e, "Database error during logout");
            internal_error("An error occurred during logout").into_response()
        }
    }
}
