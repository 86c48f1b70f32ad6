use std::collections::HashMap;

use sqlx::PgPool;
use tracing::info;
use uuid::Uuid;

use crate::auth::SessionIdentity;
use crate::errors::AppError;
use crate::models::skill::{Skill, SkillRow, MAX_SKILL_LEVEL, MIN_SKILL_LEVEL};
use crate::models::user::User;

/// Editable profile fields. `None` leaves the column unchanged.
#[derive(Debug, Default)]
pub struct ProfileUpdate<'a> {
    pub first_name: Option<&'a str>,
    pub last_name: Option<&'a str>,
    pub academic_level: Option<&'a str>,
    pub description: Option<&'a str>,
}

pub async fn find_user_by_email(pool: &PgPool, email: &str) -> Result<Option<User>, AppError> {
    let user = sqlx::query_as::<_, User>("SELECT * FROM users WHERE email = $1")
        .bind(email)
        .fetch_optional(pool)
        .await?;
    Ok(user)
}

pub async fn get_user(pool: &PgPool, user_id: Uuid) -> Result<User, AppError> {
    sqlx::query_as::<_, User>("SELECT * FROM users WHERE user_id = $1")
        .bind(user_id)
        .fetch_optional(pool)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("User {user_id} not found")))
}

/// Loads the user row for a verified session, creating it from the session
/// metadata when this is the first time the email is seen.
pub async fn ensure_user(pool: &PgPool, identity: &SessionIdentity) -> Result<User, AppError> {
    if let Some(user) = find_user_by_email(pool, &identity.email).await? {
        return Ok(user);
    }

    // A concurrent first request may insert the same email; fall through to SELECT.
    sqlx::query(
        r#"
        INSERT INTO users (email, first_name, last_name)
        VALUES ($1, $2, $3)
        ON CONFLICT (email) DO NOTHING
        "#,
    )
    .bind(&identity.email)
    .bind(identity.first_name.as_deref().unwrap_or_default())
    .bind(identity.last_name.as_deref().unwrap_or_default())
    .execute(pool)
    .await?;

    info!("Created user record for {}", identity.email);

    find_user_by_email(pool, &identity.email)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("User {} not found", identity.email)))
}

pub async fn update_profile(
    pool: &PgPool,
    user_id: Uuid,
    update: &ProfileUpdate<'_>,
) -> Result<User, AppError> {
    let user = sqlx::query_as::<_, User>(
        r#"
        UPDATE users SET
            first_name     = COALESCE($2, first_name),
            last_name      = COALESCE($3, last_name),
            academic_level = COALESCE($4, academic_level),
            description    = COALESCE($5, description)
        WHERE user_id = $1
        RETURNING *
        "#,
    )
    .bind(user_id)
    .bind(update.first_name)
    .bind(update.last_name)
    .bind(update.academic_level)
    .bind(update.description)
    .fetch_optional(pool)
    .await?
    .ok_or_else(|| AppError::NotFound(format!("User {user_id} not found")))?;
    Ok(user)
}

pub async fn get_skills(pool: &PgPool, user_id: Uuid) -> Result<Vec<Skill>, AppError> {
    let rows = sqlx::query_as::<_, SkillRow>(
        "SELECT * FROM skills WHERE user_id = $1 ORDER BY skill_level DESC, skill_name",
    )
    .bind(user_id)
    .fetch_all(pool)
    .await?;
    Ok(rows.into_iter().map(Skill::from).collect())
}

/// Skills for many users at once, grouped by user. Every requested id gets an entry.
pub async fn skills_for_users(
    pool: &PgPool,
    user_ids: &[Uuid],
) -> Result<HashMap<Uuid, Vec<Skill>>, AppError> {
    let mut grouped: HashMap<Uuid, Vec<Skill>> =
        user_ids.iter().map(|id| (*id, Vec::new())).collect();
    if user_ids.is_empty() {
        return Ok(grouped);
    }

    let rows = sqlx::query_as::<_, SkillRow>(
        "SELECT * FROM skills WHERE user_id = ANY($1) ORDER BY skill_level DESC, skill_name",
    )
    .bind(user_ids)
    .fetch_all(pool)
    .await?;

    for row in rows {
        grouped.entry(row.user_id).or_default().push(Skill::from(row));
    }
    Ok(grouped)
}

/// Replaces the user's skill set (delete then insert) inside one transaction.
pub async fn replace_skills(
    pool: &PgPool,
    user_id: Uuid,
    skills: &[Skill],
) -> Result<Vec<Skill>, AppError> {
    validate_skills(skills)?;

    let mut tx = pool.begin().await?;

    sqlx::query("DELETE FROM skills WHERE user_id = $1")
        .bind(user_id)
        .execute(&mut *tx)
        .await?;

    for skill in skills {
        sqlx::query("INSERT INTO skills (user_id, skill_name, skill_level) VALUES ($1, $2, $3)")
            .bind(user_id)
            .bind(skill.name.trim())
            .bind(skill.level)
            .execute(&mut *tx)
            .await?;
    }

    tx.commit().await?;

    info!("Replaced skills for user {user_id} ({} skills)", skills.len());
    get_skills(pool, user_id).await
}

pub fn validate_skills(skills: &[Skill]) -> Result<(), AppError> {
    for skill in skills {
        if skill.name.trim().is_empty() {
            return Err(AppError::Validation("Skill names cannot be empty".to_string()));
        }
        if !(MIN_SKILL_LEVEL..=MAX_SKILL_LEVEL).contains(&skill.level) {
            return Err(AppError::Validation(format!(
                "Skill '{}' has level {}; levels must be between {MIN_SKILL_LEVEL} and {MAX_SKILL_LEVEL}",
                skill.name, skill.level
            )));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn skill(name: &str, level: i32) -> Skill {
        Skill {
            name: name.to_string(),
            level,
        }
    }

    #[test]
    fn test_valid_skills_pass() {
        assert!(validate_skills(&[skill("Rust", 1), skill("SQL", 10)]).is_ok());
        assert!(validate_skills(&[]).is_ok());
    }

    #[test]
    fn test_out_of_range_level_rejected() {
        let err = validate_skills(&[skill("Rust", 11)]).unwrap_err();
        assert!(matches!(err, AppError::Validation(msg) if msg.contains("Rust")));
        assert!(validate_skills(&[skill("Rust", 0)]).is_err());
    }

    #[test]
    fn test_blank_name_rejected() {
        assert!(validate_skills(&[skill("   ", 5)]).is_err());
    }
}
