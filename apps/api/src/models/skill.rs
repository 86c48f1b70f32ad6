use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

pub const MIN_SKILL_LEVEL: i32 = 1;
pub const MAX_SKILL_LEVEL: i32 = 10;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct SkillRow {
    pub skill_id: Uuid,
    pub user_id: Uuid,
    pub skill_name: String,
    pub skill_level: i32,
}

/// A named skill with a 1–10 level, as exchanged with clients and the resume rater.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Skill {
    pub name: String,
    pub level: i32,
}

impl From<SkillRow> for Skill {
    fn from(row: SkillRow) -> Self {
        Skill {
            name: row.skill_name,
            level: row.skill_level,
        }
    }
}
