//! Axum route handlers for the Teams API.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::auth::extractor::CurrentUser;
use crate::errors::AppError;
use crate::models::request::RequestRow;
use crate::models::skill::Skill;
use crate::models::team::Team;
use crate::profile::repository::skills_for_users;
use crate::requests::lifecycle::{open_join_request, send_invitation};
use crate::state::AppState;
use crate::teams::candidates::{invite_candidates, CandidatesResponse};
use crate::teams::repository::{
    create_team, get_team, list_teams, team_members, CreatedTeam, NewTeam,
};

#[derive(Debug, Deserialize)]
pub struct CreateTeamRequest {
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub max_members: i32,
    #[serde(default)]
    pub is_private: bool,
}

#[derive(Debug, Deserialize)]
pub struct ListTeamsQuery {
    pub q: Option<String>,
    #[serde(default)]
    pub open_only: bool,
}

#[derive(Debug, Deserialize)]
pub struct CandidatesQuery {
    pub q: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct InviteRequest {
    pub user_id: Uuid,
}

#[derive(Debug, Serialize)]
pub struct TeamMemberView {
    pub user_id: Uuid,
    pub full_name: String,
    pub email: String,
    pub academic_level: Option<String>,
    pub skills: Vec<Skill>,
}

#[derive(Debug, Serialize)]
pub struct TeamDetail {
    pub team: Team,
    pub members: Vec<TeamMemberView>,
}

/// POST /api/v1/teams
pub async fn handle_create_team(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Json(request): Json<CreateTeamRequest>,
) -> Result<(StatusCode, Json<CreatedTeam>), AppError> {
    let name = request.name.trim();
    if name.is_empty() {
        return Err(AppError::Validation("Team name cannot be empty".to_string()));
    }
    if request.max_members < 1 {
        return Err(AppError::Validation(
            "max_members must be at least 1".to_string(),
        ));
    }

    let new = NewTeam {
        name,
        description: request.description.trim(),
        max_members: request.max_members,
        is_private: request.is_private,
    };
    let created = create_team(&state.db, &user, &new, &state.config.default_event_name).await?;
    Ok((StatusCode::CREATED, Json(created)))
}

/// GET /api/v1/teams?q=&open_only=
pub async fn handle_list_teams(
    State(state): State<AppState>,
    Query(query): Query<ListTeamsQuery>,
) -> Result<Json<Vec<Team>>, AppError> {
    let q = query.q.as_deref().map(str::trim).filter(|q| !q.is_empty());
    Ok(Json(list_teams(&state.db, q, query.open_only).await?))
}

/// GET /api/v1/teams/:id
pub async fn handle_get_team(
    State(state): State<AppState>,
    Path(team_id): Path<Uuid>,
) -> Result<Json<TeamDetail>, AppError> {
    let team = get_team(&state.db, team_id).await?;
    let users = team_members(&state.db, team_id).await?;

    let ids: Vec<Uuid> = users.iter().map(|u| u.user_id).collect();
    let mut skills = skills_for_users(&state.db, &ids).await?;

    let members = users
        .into_iter()
        .map(|u| TeamMemberView {
            skills: skills.remove(&u.user_id).unwrap_or_default(),
            full_name: u.full_name(),
            user_id: u.user_id,
            email: u.email,
            academic_level: u.academic_level,
        })
        .collect();

    Ok(Json(TeamDetail { team, members }))
}

/// POST /api/v1/teams/:id/join-requests
pub async fn handle_join_request(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(team_id): Path<Uuid>,
) -> Result<(StatusCode, Json<RequestRow>), AppError> {
    let (request, created) = open_join_request(&state.db, team_id, &user).await?;
    Ok((created_or_ok(created), Json(request)))
}

/// GET /api/v1/teams/:id/candidates?q=
pub async fn handle_candidates(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(team_id): Path<Uuid>,
    Query(query): Query<CandidatesQuery>,
) -> Result<Json<CandidatesResponse>, AppError> {
    let team = get_team(&state.db, team_id).await?;
    let response = invite_candidates(&state, &team, &user, query.q.as_deref()).await?;
    Ok(Json(response))
}

/// POST /api/v1/teams/:id/invitations
pub async fn handle_invite(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(team_id): Path<Uuid>,
    Json(request): Json<InviteRequest>,
) -> Result<(StatusCode, Json<RequestRow>), AppError> {
    let (invitation, created) = send_invitation(&state.db, team_id, &user, request.user_id).await?;
    Ok((created_or_ok(created), Json(invitation)))
}

fn created_or_ok(created: bool) -> StatusCode {
    if created {
        StatusCode::CREATED
    } else {
        StatusCode::OK
    }
}
