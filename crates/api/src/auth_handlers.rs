use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::AppState;
use crate::error::ApiError;
use crate::extract::{AuthUser, ClientMeta};
use atelier_auth::{AuthError, NewAccount, TokenPair, UserProfile};

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RegisterRequest {
    pub email: String,
    pub password: String,
    pub name: String,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RefreshRequest {
    pub refresh_token: String,
}

#[derive(Debug, Serialize)]
pub struct AuthResponse {
    pub user: UserProfile,
    pub tokens: TokenPair,
}

#[derive(Debug, Serialize)]
pub struct RefreshResponse {
    pub access_token: String,
}

#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: String,
}

const MIN_PASSWORD_LENGTH: usize = 8;

fn validate_email(email: &str) -> Result<(), ApiError> {
    let email = email.trim();
    let valid = email.split_once('@').is_some_and(|(local, domain)| {
        !local.is_empty() && !domain.is_empty() && !email.contains(char::is_whitespace)
    });

    if valid {
        Ok(())
    } else {
        Err(ApiError::Validation("email is not valid".to_string()))
    }
}

fn validate_register(payload: &RegisterRequest) -> Result<(), ApiError> {
    validate_email(&payload.email)?;
    if payload.password.len() < MIN_PASSWORD_LENGTH {
        return Err(ApiError::Validation(format!(
            "password must be at least {MIN_PASSWORD_LENGTH} characters"
        )));
    }
    if payload.name.trim().is_empty() {
        return Err(ApiError::Validation("name must not be empty".to_string()));
    }
    Ok(())
}

/// POST /auth/register
pub async fn register(
    State(state): State<Arc<AppState>>,
    ClientMeta(meta): ClientMeta,
    Json(payload): Json<RegisterRequest>,
) -> Result<impl IntoResponse, ApiError> {
    validate_register(&payload)?;

    let (user, tokens) = state
        .auth
        .register(
            NewAccount {
                email: payload.email.trim().to_string(),
                password: payload.password,
                display_name: payload.name.trim().to_string(),
            },
            &meta,
        )
        .await?;

    Ok((StatusCode::CREATED, Json(AuthResponse { user, tokens })))
}

/// POST /auth/login
pub async fn login(
    State(state): State<Arc<AppState>>,
    ClientMeta(meta): ClientMeta,
    Json(payload): Json<LoginRequest>,
) -> Result<impl IntoResponse, ApiError> {
    if payload.email.trim().is_empty() || payload.password.is_empty() {
        return Err(ApiError::Validation(
            "email and password are required".to_string(),
        ));
    }

    let (user, tokens) = state
        .auth
        .login(payload.email.trim(), &payload.password, &meta)
        .await?;

    Ok(Json(AuthResponse { user, tokens }))
}

/// POST /auth/refresh
pub async fn refresh(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<RefreshRequest>,
) -> Result<impl IntoResponse, ApiError> {
    if payload.refresh_token.is_empty() {
        return Err(ApiError::Validation("refresh_token is required".to_string()));
    }

    let access_token = state
        .auth
        .refresh(&payload.refresh_token)
        .await
        .map_err(|err| match err {
            // The account backing this token is gone; to the client that is
            // just a token that no longer works.
            AuthError::UserNotFound => {
                ApiError::Unauthorized("account no longer exists".to_string())
            }
            other => ApiError::from(other),
        })?;

    Ok(Json(RefreshResponse { access_token }))
}

/// GET /auth/profile
pub async fn profile(
    State(state): State<Arc<AppState>>,
    AuthUser(claims): AuthUser,
) -> Result<impl IntoResponse, ApiError> {
    let user = state.auth.profile(claims.user_id()?).await?;
    Ok(Json(user))
}

/// POST /auth/logout
pub async fn logout(
    State(state): State<Arc<AppState>>,
    AuthUser(claims): AuthUser,
    ClientMeta(meta): ClientMeta,
) -> Result<impl IntoResponse, ApiError> {
    state.auth.logout(claims.user_id()?, &meta).await?;
    Ok(Json(MessageResponse {
        message: "logged out".to_string(),
    }))
}
