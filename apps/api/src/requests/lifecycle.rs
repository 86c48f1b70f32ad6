//! Join requests and invitations from creation to a terminal state.
//!
//! Accept runs as one transaction: the request row and then the team row are
//! locked `FOR UPDATE`, so two concurrent accepts for the same team serialize
//! on the capacity check and the counter increment.

use serde::Serialize;
use sqlx::PgPool;
use tracing::info;
use uuid::Uuid;

use crate::errors::AppError;
use crate::events::repository::get_or_create_active_event;
use crate::models::member::Member;
use crate::models::request::{RequestAction, RequestKind, RequestRow, RequestStatus};
use crate::models::team::Team;
use crate::models::user::User;
use crate::profile::repository::get_user;
use crate::requests::repository::{
    find_pending_for_pair, insert_request, lock_request, set_status, NewRequest,
};
use crate::teams::repository::{
    get_team, increment_member_count, insert_member, is_member, lock_team,
};

#[derive(Debug, Serialize)]
pub struct AcceptOutcome {
    pub request: RequestRow,
    pub member: Member,
    pub team: Team,
}

/// Opens a join request from `user` to the team. Returns the request and whether
/// it was newly created; an existing pending request for the pair is returned as-is.
pub async fn open_join_request(
    pool: &PgPool,
    team_id: Uuid,
    user: &User,
) -> Result<(RequestRow, bool), AppError> {
    let team = get_team(pool, team_id).await?;
    let member = is_member(pool, team_id, user.user_id).await?;
    let existing = find_pending_for_pair(pool, team_id, user.user_id).await?;

    if let Some(existing) = join_decision(&team, user.user_id, member, existing)? {
        return Ok((existing, false));
    }

    let request = insert_request(
        pool,
        &NewRequest {
            team_id,
            requester_id: user.user_id,
            owner_id: team.owner,
            kind: RequestKind::Join,
        },
    )
    .await?;

    info!(
        "Join request {} from {} to team {}",
        request.request_id, user.email, team.team_id
    );
    Ok((request, true))
}

/// Invites `invitee_id` to a team owned by `owner`.
pub async fn send_invitation(
    pool: &PgPool,
    team_id: Uuid,
    owner: &User,
    invitee_id: Uuid,
) -> Result<(RequestRow, bool), AppError> {
    let team = get_team(pool, team_id).await?;
    let member = is_member(pool, team_id, invitee_id).await?;
    let existing = find_pending_for_pair(pool, team_id, invitee_id).await?;

    if let Some(existing) = invite_decision(&team, owner.user_id, invitee_id, member, existing)? {
        return Ok((existing, false));
    }

    let invitee = get_user(pool, invitee_id).await?;

    let request = insert_request(
        pool,
        &NewRequest {
            team_id,
            requester_id: invitee.user_id,
            owner_id: team.owner,
            kind: RequestKind::Invite,
        },
    )
    .await?;

    info!(
        "Invitation {} from {} to {} for team {}",
        request.request_id, owner.email, invitee.email, team.team_id
    );
    Ok((request, true))
}

pub async fn accept_request(
    pool: &PgPool,
    request_id: Uuid,
    actor: &User,
    default_event_name: &str,
) -> Result<AcceptOutcome, AppError> {
    let mut tx = pool.begin().await?;

    let request = lock_request(&mut tx, request_id).await?;
    let next = authorize_transition(&request, actor.user_id, RequestAction::Accept)?;

    let team = lock_team(&mut tx, request.team_id).await?;
    if team.is_full() {
        return Err(AppError::Conflict(format!("Team '{}' is full", team.name)));
    }

    let request = set_status(&mut tx, request_id, next).await?;
    let event = get_or_create_active_event(&mut tx, default_event_name).await?;
    let member = insert_member(&mut tx, request.requester_id, team.team_id, event.event_id).await?;
    let team = increment_member_count(&mut tx, team.team_id).await?;

    tx.commit().await?;

    info!(
        "Request {} accepted by {}; team {} now has {}/{} members",
        request_id, actor.email, team.team_id, team.current_member_count, team.max_members
    );
    Ok(AcceptOutcome {
        request,
        member,
        team,
    })
}

pub async fn reject_request(
    pool: &PgPool,
    request_id: Uuid,
    actor: &User,
) -> Result<RequestRow, AppError> {
    let mut tx = pool.begin().await?;

    let request = lock_request(&mut tx, request_id).await?;
    let next = authorize_transition(&request, actor.user_id, RequestAction::Reject)?;
    let request = set_status(&mut tx, request_id, next).await?;

    tx.commit().await?;

    info!("Request {} rejected by {}", request_id, actor.email);
    Ok(request)
}

/// Guards on a join request. `Ok(Some(_))` hands back the pending request to reuse,
/// `Ok(None)` means a new one may be created.
fn join_decision(
    team: &Team,
    user_id: Uuid,
    is_member: bool,
    existing: Option<RequestRow>,
) -> Result<Option<RequestRow>, AppError> {
    if team.is_private {
        return Err(AppError::Forbidden(
            "This team only accepts members by invitation".to_string(),
        ));
    }
    if team.is_owned_by(user_id) {
        return Err(AppError::Conflict("You already own this team".to_string()));
    }
    if is_member {
        return Err(AppError::Conflict(
            "You are already a member of this team".to_string(),
        ));
    }
    if existing.is_some() {
        return Ok(existing);
    }
    if team.is_full() {
        return Err(AppError::Conflict(format!("Team '{}' is full", team.name)));
    }
    Ok(None)
}

/// Guards on an invitation, same contract as [`join_decision`].
fn invite_decision(
    team: &Team,
    inviter_id: Uuid,
    invitee_id: Uuid,
    invitee_is_member: bool,
    existing: Option<RequestRow>,
) -> Result<Option<RequestRow>, AppError> {
    if !team.is_owned_by(inviter_id) {
        return Err(AppError::Forbidden(
            "Only the team owner can send invitations".to_string(),
        ));
    }
    if invitee_id == inviter_id {
        return Err(AppError::Validation("You cannot invite yourself".to_string()));
    }
    if invitee_is_member {
        return Err(AppError::Conflict(
            "That user is already a member of this team".to_string(),
        ));
    }
    Ok(existing)
}

/// Checks that `actor_id` may answer the request and returns the state it moves to.
fn authorize_transition(
    request: &RequestRow,
    actor_id: Uuid,
    action: RequestAction,
) -> Result<RequestStatus, AppError> {
    let kind = request.kind().map_err(|e| AppError::Internal(e.into()))?;
    let status = request.status().map_err(|e| AppError::Internal(e.into()))?;

    if kind.responder(request) != actor_id {
        let message = match kind {
            RequestKind::Join => "Only the team owner can answer a join request",
            RequestKind::Invite => "Only the invited user can answer an invitation",
        };
        return Err(AppError::Forbidden(message.to_string()));
    }

    status
        .apply(action)
        .map_err(|e| AppError::Conflict(format!("Request {}: {e}", request.request_id)))
}
