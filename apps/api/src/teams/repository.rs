use serde::Serialize;
use sqlx::{PgConnection, PgPool};
use tracing::info;
use uuid::Uuid;

use crate::errors::AppError;
use crate::events::repository::get_or_create_active_event;
use crate::models::member::Member;
use crate::models::team::Team;
use crate::models::user::User;

pub struct NewTeam<'a> {
    pub name: &'a str,
    pub description: &'a str,
    pub max_members: i32,
    pub is_private: bool,
}

#[derive(Debug, Serialize)]
pub struct CreatedTeam {
    pub team: Team,
    pub membership: Member,
}

/// Creates the team with its owner as the first member, in one transaction.
pub async fn create_team(
    pool: &PgPool,
    owner: &User,
    new: &NewTeam<'_>,
    default_event_name: &str,
) -> Result<CreatedTeam, AppError> {
    let mut tx = pool.begin().await?;

    let event = get_or_create_active_event(&mut tx, default_event_name).await?;

    let team = sqlx::query_as::<_, Team>(
        r#"
        INSERT INTO teams (name, description, max_members, current_member_count, is_private, owner)
        VALUES ($1, $2, $3, 1, $4, $5)
        RETURNING *
        "#,
    )
    .bind(new.name)
    .bind(new.description)
    .bind(new.max_members)
    .bind(new.is_private)
    .bind(owner.user_id)
    .fetch_one(&mut *tx)
    .await?;

    let membership = insert_member(&mut tx, owner.user_id, team.team_id, event.event_id).await?;

    tx.commit().await?;

    info!(
        "Team '{}' ({}) created by {}",
        team.name, team.team_id, owner.email
    );
    Ok(CreatedTeam { team, membership })
}

/// Public teams, newest first. `query` matches name or description case-insensitively.
pub async fn list_teams(
    pool: &PgPool,
    query: Option<&str>,
    open_only: bool,
) -> Result<Vec<Team>, AppError> {
    let teams = sqlx::query_as::<_, Team>(
        r#"
        SELECT * FROM teams
        WHERE NOT is_private
          AND ($1::text IS NULL
               OR name ILIKE $1 ESCAPE '\'
               OR description ILIKE $1 ESCAPE '\')
          AND (NOT $2 OR current_member_count < max_members)
        ORDER BY created_at DESC
        "#,
    )
    .bind(query.map(contains_pattern))
    .bind(open_only)
    .fetch_all(pool)
    .await?;
    Ok(teams)
}

/// `%query%` for `ILIKE`, with the user's `%`, `_` and `\` matched literally.
fn contains_pattern(query: &str) -> String {
    let mut pattern = String::with_capacity(query.len() + 2);
    pattern.push('%');
    for c in query.chars() {
        if matches!(c, '%' | '_' | '\\') {
            pattern.push('\\');
        }
        pattern.push(c);
    }
    pattern.push('%');
    pattern
}

pub async fn get_team(pool: &PgPool, team_id: Uuid) -> Result<Team, AppError> {
    sqlx::query_as::<_, Team>("SELECT * FROM teams WHERE team_id = $1")
        .bind(team_id)
        .fetch_optional(pool)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Team {team_id} not found")))
}

/// Locks the team row for the rest of the transaction.
pub async fn lock_team(conn: &mut PgConnection, team_id: Uuid) -> Result<Team, AppError> {
    sqlx::query_as::<_, Team>("SELECT * FROM teams WHERE team_id = $1 FOR UPDATE")
        .bind(team_id)
        .fetch_optional(conn)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Team {team_id} not found")))
}

/// Users who are members of the team, in join order.
pub async fn team_members(pool: &PgPool, team_id: Uuid) -> Result<Vec<User>, AppError> {
    let users = sqlx::query_as::<_, User>(
        r#"
        SELECT u.* FROM members m
        JOIN users u ON u.user_id = m.user_id
        WHERE m.team_id = $1
        ORDER BY m.joined_at, m.member_id
        "#,
    )
    .bind(team_id)
    .fetch_all(pool)
    .await?;
    Ok(users)
}

pub async fn is_member(pool: &PgPool, team_id: Uuid, user_id: Uuid) -> Result<bool, AppError> {
    let exists: bool = sqlx::query_scalar(
        "SELECT EXISTS (SELECT 1 FROM members WHERE team_id = $1 AND user_id = $2)",
    )
    .bind(team_id)
    .bind(user_id)
    .fetch_one(pool)
    .await?;
    Ok(exists)
}

/// Every user, alphabetical by first name. The invite screen filters from here.
pub async fn all_users(pool: &PgPool) -> Result<Vec<User>, AppError> {
    let users = sqlx::query_as::<_, User>("SELECT * FROM users ORDER BY first_name, last_name")
        .fetch_all(pool)
        .await?;
    Ok(users)
}

pub async fn insert_member(
    conn: &mut PgConnection,
    user_id: Uuid,
    team_id: Uuid,
    event_id: Uuid,
) -> Result<Member, AppError> {
    let member = sqlx::query_as::<_, Member>(
        r#"
        INSERT INTO members (user_id, team_id, event_id, wants_team)
        VALUES ($1, $2, $3, FALSE)
        RETURNING *
        "#,
    )
    .bind(user_id)
    .bind(team_id)
    .bind(event_id)
    .fetch_one(conn)
    .await?;
    Ok(member)
}

/// Bumps the stored member counter in SQL rather than read-modify-write.
pub async fn increment_member_count(
    conn: &mut PgConnection,
    team_id: Uuid,
) -> Result<Team, AppError> {
    let team = sqlx::query_as::<_, Team>(
        r#"
        UPDATE teams SET current_member_count = current_member_count + 1
        WHERE team_id = $1
        RETURNING *
        "#,
    )
    .bind(team_id)
    .fetch_one(conn)
    .await?;
    Ok(team)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_contains_pattern_wraps_query() {
        assert_eq!(contains_pattern("rust"), "%rust%");
    }

    #[test]
    fn test_contains_pattern_escapes_wildcards() {
        assert_eq!(contains_pattern("100%"), "%100\\%%");
        assert_eq!(contains_pattern("a_b"), "%a\\_b%");
        assert_eq!(contains_pattern(r"c:\x"), r"%c:\\x%");
    }
}
