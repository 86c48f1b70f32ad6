//! Axum route handlers for the Auth API. Thin proxies to the auth platform.

use axum::{extract::State, http::StatusCode, Json};
use tracing::info;

use crate::auth::extractor::BearerToken;
use crate::auth::{AuthSession, SignInRequest, SignUpOutcome, SignUpRequest};
use crate::errors::AppError;
use crate::state::AppState;

/// POST /api/v1/auth/signup
pub async fn handle_sign_up(
    State(state): State<AppState>,
    Json(request): Json<SignUpRequest>,
) -> Result<(StatusCode, Json<SignUpOutcome>), AppError> {
    validate_credentials(&request.email, &request.password)?;
    let outcome = state.auth.sign_up(&request).await?;
    info!(
        "Signed up {} (confirmation required: {})",
        outcome.email,
        outcome.session.is_none()
    );
    Ok((StatusCode::CREATED, Json(outcome)))
}

/// POST /api/v1/auth/login
pub async fn handle_sign_in(
    State(state): State<AppState>,
    Json(request): Json<SignInRequest>,
) -> Result<Json<AuthSession>, AppError> {
    validate_credentials(&request.email, &request.password)?;
    Ok(Json(state.auth.sign_in(&request).await?))
}

/// POST /api/v1/auth/logout
pub async fn handle_sign_out(
    State(state): State<AppState>,
    BearerToken(token): BearerToken,
) -> Result<StatusCode, AppError> {
    state.auth.sign_out(&token).await?;
    Ok(StatusCode::NO_CONTENT)
}

fn validate_credentials(email: &str, password: &str) -> Result<(), AppError> {
    if !email.contains('@') {
        return Err(AppError::Validation("A valid email is required".to_string()));
    }
    if password.is_empty() {
        return Err(AppError::Validation("Password cannot be empty".to_string()));
    }
    Ok(())
}
