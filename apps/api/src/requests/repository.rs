use std::collections::HashSet;

use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::{FromRow, PgConnection, PgPool};
use uuid::Uuid;

use crate::errors::AppError;
use crate::models::request::{RequestKind, RequestRow, RequestStatus};

/// A pending request as shown to the user who has to answer it.
/// `counterpart_*` is the requester for join requests and the inviter for invitations.
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct PendingRequestView {
    pub request_id: Uuid,
    pub team_id: Uuid,
    pub team_name: String,
    pub kind: String,
    pub counterpart_id: Uuid,
    pub counterpart_first_name: String,
    pub counterpart_last_name: String,
    pub counterpart_email: String,
    pub created_at: DateTime<Utc>,
}

pub struct NewRequest {
    pub team_id: Uuid,
    pub requester_id: Uuid,
    pub owner_id: Uuid,
    pub kind: RequestKind,
}

/// Any pending request for this (team, future member) pair, whichever side opened it.
pub async fn find_pending_for_pair(
    pool: &PgPool,
    team_id: Uuid,
    requester_id: Uuid,
) -> Result<Option<RequestRow>, AppError> {
    let row = sqlx::query_as::<_, RequestRow>(
        r#"
        SELECT * FROM requests
        WHERE team_id = $1 AND requester_id = $2 AND status = 'pending'
        ORDER BY created_at
        LIMIT 1
        "#,
    )
    .bind(team_id)
    .bind(requester_id)
    .fetch_optional(pool)
    .await?;
    Ok(row)
}

pub async fn insert_request(pool: &PgPool, new: &NewRequest) -> Result<RequestRow, AppError> {
    let row = sqlx::query_as::<_, RequestRow>(
        r#"
        INSERT INTO requests (team_id, requester_id, owner_id, kind, status)
        VALUES ($1, $2, $3, $4, 'pending')
        RETURNING *
        "#,
    )
    .bind(new.team_id)
    .bind(new.requester_id)
    .bind(new.owner_id)
    .bind(new.kind.as_str())
    .fetch_one(pool)
    .await?;
    Ok(row)
}

/// Locks the request row for the rest of the transaction.
pub async fn lock_request(
    conn: &mut PgConnection,
    request_id: Uuid,
) -> Result<RequestRow, AppError> {
    sqlx::query_as::<_, RequestRow>("SELECT * FROM requests WHERE request_id = $1 FOR UPDATE")
        .bind(request_id)
        .fetch_optional(conn)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Request {request_id} not found")))
}

pub async fn set_status(
    conn: &mut PgConnection,
    request_id: Uuid,
    status: RequestStatus,
) -> Result<RequestRow, AppError> {
    let row = sqlx::query_as::<_, RequestRow>(
        "UPDATE requests SET status = $2, updated_at = now() WHERE request_id = $1 RETURNING *",
    )
    .bind(request_id)
    .bind(status.as_str())
    .fetch_one(conn)
    .await?;
    Ok(row)
}

/// Pending join requests for teams the user owns.
pub async fn pending_join_requests(
    pool: &PgPool,
    owner_id: Uuid,
) -> Result<Vec<PendingRequestView>, AppError> {
    let rows = sqlx::query_as::<_, PendingRequestView>(
        r#"
        SELECT r.request_id, r.team_id, t.name AS team_name, r.kind,
               u.user_id AS counterpart_id,
               u.first_name AS counterpart_first_name,
               u.last_name AS counterpart_last_name,
               u.email AS counterpart_email,
               r.created_at
        FROM requests r
        JOIN teams t ON t.team_id = r.team_id
        JOIN users u ON u.user_id = r.requester_id
        WHERE r.owner_id = $1 AND r.kind = 'join' AND r.status = 'pending'
        ORDER BY r.created_at DESC
        "#,
    )
    .bind(owner_id)
    .fetch_all(pool)
    .await?;
    Ok(rows)
}

/// Pending invitations addressed to the user.
pub async fn pending_invitations(
    pool: &PgPool,
    user_id: Uuid,
) -> Result<Vec<PendingRequestView>, AppError> {
    let rows = sqlx::query_as::<_, PendingRequestView>(
        r#"
        SELECT r.request_id, r.team_id, t.name AS team_name, r.kind,
               u.user_id AS counterpart_id,
               u.first_name AS counterpart_first_name,
               u.last_name AS counterpart_last_name,
               u.email AS counterpart_email,
               r.created_at
        FROM requests r
        JOIN teams t ON t.team_id = r.team_id
        JOIN users u ON u.user_id = r.owner_id
        WHERE r.requester_id = $1 AND r.kind = 'invite' AND r.status = 'pending'
        ORDER BY r.created_at DESC
        "#,
    )
    .bind(user_id)
    .fetch_all(pool)
    .await?;
    Ok(rows)
}

/// Users with any pending request for the team.
pub async fn pending_requester_ids(pool: &PgPool, team_id: Uuid) -> Result<HashSet<Uuid>, AppError> {
    let ids: Vec<Uuid> = sqlx::query_scalar(
        "SELECT requester_id FROM requests WHERE team_id = $1 AND status = 'pending'",
    )
    .bind(team_id)
    .fetch_all(pool)
    .await?;
    Ok(ids.into_iter().collect())
}
