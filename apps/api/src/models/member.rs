use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Member {
    pub member_id: Uuid,
    pub user_id: Uuid,
    pub team_id: Uuid,
    pub event_id: Uuid,
    pub wants_team: bool,
    pub joined_at: DateTime<Utc>,
}
