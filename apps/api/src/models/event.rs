use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Event {
    pub event_id: Uuid,
    pub name: String,
    pub can_have_teams: bool,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
}
