//! Axum route handlers for answering requests and listing pending ones.

use axum::{
    extract::{Path, State},
    Json,
};
use uuid::Uuid;

use crate::auth::extractor::CurrentUser;
use crate::errors::AppError;
use crate::models::request::RequestRow;
use crate::requests::lifecycle::{accept_request, reject_request, AcceptOutcome};
use crate::requests::repository::{pending_invitations, pending_join_requests, PendingRequestView};
use crate::state::AppState;

/// POST /api/v1/requests/:id/accept
pub async fn handle_accept(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(request_id): Path<Uuid>,
) -> Result<Json<AcceptOutcome>, AppError> {
    let outcome = accept_request(
        &state.db,
        request_id,
        &user,
        &state.config.default_event_name,
    )
    .await?;
    Ok(Json(outcome))
}

/// POST /api/v1/requests/:id/reject
pub async fn handle_reject(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(request_id): Path<Uuid>,
) -> Result<Json<RequestRow>, AppError> {
    Ok(Json(reject_request(&state.db, request_id, &user).await?))
}

/// GET /api/v1/notifications/join-requests
pub async fn handle_list_join_requests(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
) -> Result<Json<Vec<PendingRequestView>>, AppError> {
    Ok(Json(pending_join_requests(&state.db, user.user_id).await?))
}

/// GET /api/v1/notifications/invitations
pub async fn handle_list_invitations(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
) -> Result<Json<Vec<PendingRequestView>>, AppError> {
    Ok(Json(pending_invitations(&state.db, user.user_id).await?))
}
