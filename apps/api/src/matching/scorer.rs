//! Compatibility scoring: rates how well a candidate fits a team.
//!
//! Default: `HeuristicScorer` (skill overlap, complementary skills, academic-level
//! proximity, skill count). `AppState` holds an `Arc<dyn CompatibilityScorer>`.
//!
//! Scores are not normalized: a candidate with many skills can exceed 100.

use std::collections::{HashMap, HashSet};

use uuid::Uuid;

use crate::matching::profile::{skill_key, TeamProfile};
use crate::models::skill::Skill;
use crate::models::user::User;

/// Ordered academic scale used for partial level matches.
pub const ACADEMIC_LEVELS: [&str; 5] = ["Freshman", "Sophomore", "Junior", "Senior", "Graduate"];

const OVERLAP_POINTS_PER_LEVEL: f64 = 0.5;
const OVERLAP_LEVEL_CAP: i32 = 10;
const COMPLEMENTARY_POINTS: f64 = 2.0;
const ACADEMIC_MATCH_POINTS: f64 = 30.0;
const ACADEMIC_STEP_PENALTY: f64 = 10.0;
const SKILL_COUNT_POINTS: f64 = 4.0;
const SKILL_COUNT_CAP: f64 = 20.0;

// ────────────────────────────────────────────────────────────────────────────
// Trait definition
// ────────────────────────────────────────────────────────────────────────────

/// Swappable scoring backend. Carried in `AppState` as `Arc<dyn CompatibilityScorer>`.
pub trait CompatibilityScorer: Send + Sync {
    fn score(&self, skills: &[Skill], academic_level: Option<&str>, team: &TeamProfile) -> u32;
}

/// Weighted heuristic:
/// 1. overlap: `min(level, 10) * 0.5` per team skill the candidate holds
/// 2. complementary: 2 per candidate skill the team lacks
/// 3. academic: 30 on exact match, else `30 - 10 * |Δ|` on the ordered scale, floored at 0
/// 4. skill count: `min(count * 4, 20)`
pub struct HeuristicScorer;

impl CompatibilityScorer for HeuristicScorer {
    fn score(&self, skills: &[Skill], academic_level: Option<&str>, team: &TeamProfile) -> u32 {
        let total = skill_overlap_points(skills, team)
            + complementary_points(skills, team)
            + academic_points(academic_level, team.academic_level.as_deref())
            + skill_count_points(skills);
        total.round() as u32
    }
}

/// Scores every candidate; users without skills score on academic level alone.
pub fn score_candidates(
    scorer: &dyn CompatibilityScorer,
    candidates: &[User],
    skills_by_user: &HashMap<Uuid, Vec<Skill>>,
    team: &TeamProfile,
) -> HashMap<Uuid, u32> {
    candidates
        .iter()
        .map(|user| {
            let skills = skills_by_user
                .get(&user.user_id)
                .map(Vec::as_slice)
                .unwrap_or_default();
            let score = scorer.score(skills, user.academic_level.as_deref(), team);
            (user.user_id, score)
        })
        .collect()
}

// ────────────────────────────────────────────────────────────────────────────
// Components
// ────────────────────────────────────────────────────────────────────────────

fn skill_overlap_points(skills: &[Skill], team: &TeamProfile) -> f64 {
    team.skills
        .iter()
        .filter_map(|team_skill| {
            let key = skill_key(&team_skill.name);
            skills.iter().find(|s| skill_key(&s.name) == key)
        })
        .map(|s| f64::from(s.level.min(OVERLAP_LEVEL_CAP)) * OVERLAP_POINTS_PER_LEVEL)
        .sum()
}

fn complementary_points(skills: &[Skill], team: &TeamProfile) -> f64 {
    let team_names: HashSet<String> = team.skills.iter().map(|s| skill_key(&s.name)).collect();
    let complementary = skills
        .iter()
        .map(|s| skill_key(&s.name))
        .collect::<HashSet<_>>()
        .into_iter()
        .filter(|name| !team_names.contains(name))
        .count();
    complementary as f64 * COMPLEMENTARY_POINTS
}

fn academic_points(candidate: Option<&str>, team: Option<&str>) -> f64 {
    let (Some(candidate), Some(team)) = (non_empty(candidate), non_empty(team)) else {
        return 0.0;
    };
    if candidate == team {
        return ACADEMIC_MATCH_POINTS;
    }
    match (academic_rank(candidate), academic_rank(team)) {
        (Some(a), Some(b)) => {
            let diff = a.abs_diff(b) as f64;
            (ACADEMIC_MATCH_POINTS - diff * ACADEMIC_STEP_PENALTY).max(0.0)
        }
        _ => 0.0,
    }
}

fn skill_count_points(skills: &[Skill]) -> f64 {
    (skills.len() as f64 * SKILL_COUNT_POINTS).min(SKILL_COUNT_CAP)
}

fn academic_rank(level: &str) -> Option<usize> {
    ACADEMIC_LEVELS.iter().position(|l| *l == level)
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.filter(|v| !v.is_empty())
}

// ────────────────────────────────────────────────────────────────────────────
// Tests
// ────────────────────────────────────────────────────────────────────────────
