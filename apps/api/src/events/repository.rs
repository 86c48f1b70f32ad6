use chrono::{Duration, Utc};
use sqlx::{PgConnection, PgPool};
use tracing::info;

use crate::errors::AppError;
use crate::models::event::Event;

const DEFAULT_EVENT_LENGTH_HOURS: i64 = 24;

pub async fn find_active_event(pool: &PgPool) -> Result<Option<Event>, AppError> {
    let event = sqlx::query_as::<_, Event>(
        "SELECT * FROM events WHERE can_have_teams ORDER BY start_time LIMIT 1",
    )
    .fetch_optional(pool)
    .await?;
    Ok(event)
}

/// The first team-enabled event, created with `default_name` if none exists.
/// Runs on the caller's connection so it can join an open transaction.
pub async fn get_or_create_active_event(
    conn: &mut PgConnection,
    default_name: &str,
) -> Result<Event, AppError> {
    let existing = sqlx::query_as::<_, Event>(
        "SELECT * FROM events WHERE can_have_teams ORDER BY start_time LIMIT 1",
    )
    .fetch_optional(&mut *conn)
    .await?;

    if let Some(event) = existing {
        return Ok(event);
    }

    let start = Utc::now();
    let event = sqlx::query_as::<_, Event>(
        r#"
        INSERT INTO events (name, can_have_teams, start_time, end_time)
        VALUES ($1, TRUE, $2, $3)
        RETURNING *
        "#,
    )
    .bind(default_name)
    .bind(start)
    .bind(start + Duration::hours(DEFAULT_EVENT_LENGTH_HOURS))
    .fetch_one(&mut *conn)
    .await?;

    info!("No team-enabled event found, created '{}'", event.name);
    Ok(event)
}
