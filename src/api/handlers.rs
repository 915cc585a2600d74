//! API request handlers.

use axum::{
    Json,
    extract::{Query, State},
    http::{StatusCode, header::SET_COOKIE},
    response::{AppendHeaders, IntoResponse},
};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{info, instrument};

use crate::auth::CurrentUser;
use crate::chat::StoredMessage;

use super::error::{ApiError, ApiResult};
use super::state::AppState;

/// Health check response.
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
}

/// Health check endpoint.
pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

// ============================================================================
// Chat Handlers
// ============================================================================

/// Send-message request body.
///
/// Fields are kept as raw JSON so a wrong-typed value gets the same
/// 400 response as a missing one instead of an extractor rejection.
#[derive(Debug, Deserialize)]
pub struct SendMessageRequest {
    #[serde(default)]
    pub user_id: Option<Value>,
    #[serde(default)]
    pub message: Option<Value>,
}

/// Send-message response.
#[derive(Debug, Serialize)]
pub struct SendMessageResponse {
    pub reply: String,
}

/// Handle one user chat turn and return the assistant reply.
#[instrument(skip(state, request, user), fields(user = %user.id()))]
pub async fn send_message(
    State(state): State<AppState>,
    user: CurrentUser,
    Json(request): Json<SendMessageRequest>,
) -> ApiResult<Json<SendMessageResponse>> {
    let user_id = request
        .user_id
        .as_ref()
        .and_then(Value::as_str)
        .unwrap_or_default();
    let message = request
        .message
        .as_ref()
        .and_then(Value::as_str)
        .ok_or_else(|| ApiError::bad_request("No message provided"))?;

    if !user_id.is_empty() && user_id != user.id() {
        return Err(ApiError::unauthorized(
            "user_id does not match the authenticated user",
        ));
    }

    let reply = state.gateway.send_message(user_id, message).await?;
    Ok(Json(SendMessageResponse { reply }))
}

/// History query parameters.
#[derive(Debug, Deserialize)]
pub struct HistoryQuery {
    #[serde(default)]
    pub user_id: Option<String>,
}

/// History response: all stored turns for a user, oldest first.
#[derive(Debug, Serialize)]
pub struct HistoryResponse {
    pub history: Vec<StoredMessage>,
}

/// Read the stored conversation for a user in chronological order.
#[instrument(skip(state, user), fields(user = %user.id()))]
pub async fn get_history(
    State(state): State<AppState>,
    user: CurrentUser,
    Query(query): Query<HistoryQuery>,
) -> ApiResult<Json<HistoryResponse>> {
    let user_id = query
        .user_id
        .as_deref()
        .filter(|id| !id.trim().is_empty())
        .ok_or_else(|| ApiError::bad_request("Missing user_id"))?;

    if user_id != user.id() {
        return Err(ApiError::unauthorized(
            "user_id does not match the authenticated user",
        ));
    }

    let history = state
        .messages
        .list_for_user(user_id)
        .await
        .map_err(|e| ApiError::internal(format!("Failed to load history: {}", e)))?;

    Ok(Json(HistoryResponse { history }))
}

// ============================================================================
// Authentication Handlers
// ============================================================================

/// Login request.
#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// Login response.
#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub token: String,
    pub user: UserInfo,
}

/// User info in auth responses.
#[derive(Debug, Serialize)]
pub struct UserInfo {
    pub id: String,
    pub email: Option<String>,
    pub anonymous: bool,
}

/// Registration request.
#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    pub email: String,
    pub password: String,
}

fn auth_cookie(state: &AppState, token: &str) -> String {
    // In dev mode, omit the Secure flag to allow http://localhost.
    let secure_flag = if state.auth.is_dev_mode() {
        ""
    } else {
        " Secure;"
    };
    format!(
        "auth_token={}; Path=/; HttpOnly; SameSite=Lax;{} Max-Age={}",
        token,
        secure_flag,
        60 * 60 * 24 // 24 hours
    )
}

/// Register a new user with email and password.
#[instrument(skip(state, request), fields(email = %request.email))]
pub async fn register(
    State(state): State<AppState>,
    Json(request): Json<RegisterRequest>,
) -> ApiResult<impl IntoResponse> {
    let user = state
        .users
        .register(&request.email, &request.password)
        .await?;

    let token = state
        .auth
        .generate_token(&user.id, user.email.as_deref(), false)?;
    let cookie = auth_cookie(&state, &token);

    info!(user_id = %user.id, "User registered successfully");

    Ok((
        StatusCode::CREATED,
        AppendHeaders([(SET_COOKIE, cookie)]),
        Json(LoginResponse {
            token,
            user: UserInfo {
                id: user.id,
                email: user.email,
                anonymous: false,
            },
        }),
    ))
}

/// Login endpoint (works with database users, dev credentials as fallback).
#[instrument(skip(state, request), fields(email = %request.email))]
pub async fn login(
    State(state): State<AppState>,
    Json(request): Json<LoginRequest>,
) -> ApiResult<impl IntoResponse> {
    let user = state
        .users
        .verify_credentials(&request.email, &request.password)
        .await?;

    let (token, user_info) = match user {
        Some(db_user) => {
            let token = state
                .auth
                .generate_token(&db_user.id, db_user.email.as_deref(), false)?;
            let user_info = UserInfo {
                id: db_user.id,
                email: db_user.email,
                anonymous: false,
            };
            (token, user_info)
        }
        None => {
            // Fall back to dev mode credentials if enabled
            if state.auth.is_dev_mode() {
                let dev_user = state
                    .auth
                    .validate_dev_credentials(&request.email, &request.password)
                    .ok_or_else(|| ApiError::unauthorized("Invalid email or password"))?;

                let token = state.auth.generate_dev_token(dev_user)?;
                let user_info = UserInfo {
                    id: dev_user.id.clone(),
                    email: Some(dev_user.email.clone()),
                    anonymous: false,
                };
                (token, user_info)
            } else {
                return Err(ApiError::unauthorized("Invalid email or password"));
            }
        }
    };

    let cookie = auth_cookie(&state, &token);

    info!(user_id = %user_info.id, "User logged in successfully");

    Ok((
        AppendHeaders([(SET_COOKIE, cookie)]),
        Json(LoginResponse {
            token,
            user: user_info,
        }),
    ))
}

/// Anonymous sign-in: creates a throwaway user and returns a session token.
#[instrument(skip(state))]
pub async fn login_anonymous(State(state): State<AppState>) -> ApiResult<impl IntoResponse> {
    let user = state.users.create_anonymous().await?;

    let token = state.auth.generate_token(&user.id, None, true)?;
    let cookie = auth_cookie(&state, &token);

    info!(user_id = %user.id, "Anonymous user created");

    Ok((
        StatusCode::CREATED,
        AppendHeaders([(SET_COOKIE, cookie)]),
        Json(LoginResponse {
            token,
            user: UserInfo {
                id: user.id,
                email: None,
                anonymous: true,
            },
        }),
    ))
}

/// Logout endpoint (clears auth cookie).
pub async fn logout() -> impl IntoResponse {
    // Clear the auth cookie by setting it to empty with immediate expiry
    let cookie = "auth_token=; Path=/; HttpOnly; SameSite=Lax; Max-Age=0";

    (
        AppendHeaders([(SET_COOKIE, cookie.to_string())]),
        StatusCode::NO_CONTENT,
    )
}

/// Get current user info.
pub async fn get_me(user: CurrentUser) -> Json<UserInfo> {
    Json(UserInfo {
        id: user.id().to_string(),
        email: user.claims.email.clone(),
        anonymous: user.claims.anonymous,
    })
}
