use axum::{extract::State, Json};

use crate::errors::AppError;
use crate::events::repository::find_active_event;
use crate::models::event::Event;
use crate::state::AppState;

/// GET /api/v1/events/active
pub async fn handle_active_event(State(state): State<AppState>) -> Result<Json<Event>, AppError> {
    find_active_event(&state.db)
        .await?
        .map(Json)
        .ok_or_else(|| AppError::NotFound("No active event found".to_string()))
}
