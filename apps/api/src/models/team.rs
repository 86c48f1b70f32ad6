use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Team {
    pub team_id: Uuid,
    pub name: String,
    pub description: String,
    pub max_members: i32,
    /// Maintained by increment on acceptance, not derived from `members`.
    pub current_member_count: i32,
    pub is_private: bool,
    pub owner: Uuid,
    pub created_at: DateTime<Utc>,
}

impl Team {
    pub fn is_full(&self) -> bool {
        self.current_member_count >= self.max_members
    }

    pub fn is_owned_by(&self, user_id: Uuid) -> bool {
        self.owner == user_id
    }
}
