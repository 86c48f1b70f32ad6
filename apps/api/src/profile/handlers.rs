use axum::{extract::State, Json};
use serde::{Deserialize, Serialize};

use crate::auth::extractor::CurrentUser;
use crate::errors::AppError;
use crate::models::skill::Skill;
use crate::models::user::User;
use crate::profile::repository::{
    get_skills, replace_skills, update_profile, validate_skills, ProfileUpdate,
};
use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct ProfileResponse {
    pub user: User,
    pub skills: Vec<Skill>,
}

#[derive(Debug, Deserialize)]
pub struct UpdateProfileRequest {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub academic_level: Option<String>,
    pub description: Option<String>,
    /// When present, replaces the whole skill set.
    pub skills: Option<Vec<Skill>>,
}

/// GET /api/v1/profile
pub async fn handle_get_profile(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
) -> Result<Json<ProfileResponse>, AppError> {
    let skills = get_skills(&state.db, user.user_id).await?;
    Ok(Json(ProfileResponse { user, skills }))
}

/// PUT /api/v1/profile
pub async fn handle_update_profile(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Json(request): Json<UpdateProfileRequest>,
) -> Result<Json<ProfileResponse>, AppError> {
    // Validate before the first write so a bad skill list leaves the profile untouched.
    if let Some(skills) = &request.skills {
        validate_skills(skills)?;
    }

    let update = ProfileUpdate {
        first_name: request.first_name.as_deref().map(str::trim),
        last_name: request.last_name.as_deref().map(str::trim),
        academic_level: request.academic_level.as_deref().map(str::trim),
        description: request.description.as_deref(),
    };
    let user = update_profile(&state.db, user.user_id, &update).await?;

    let skills = match &request.skills {
        Some(skills) => replace_skills(&state.db, user.user_id, skills).await?,
        None => get_skills(&state.db, user.user_id).await?,
    };

    Ok(Json(ProfileResponse { user, skills }))
}
