//! Team profile aggregation: the team's skill profile and its modal academic level.

use std::cmp::Ordering;
use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::models::skill::Skill;

/// One aggregated skill across all current members.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TeamSkill {
    pub name: String,
    /// Number of members holding the skill.
    pub count: u32,
    pub avg_level: f64,
}

/// Everything the scorer needs to know about a team.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TeamProfile {
    pub skills: Vec<TeamSkill>,
    pub academic_level: Option<String>,
}

impl TeamProfile {
    pub fn build<'a, I>(member_skills: &[Skill], member_levels: I) -> Self
    where
        I: IntoIterator<Item = Option<&'a str>>,
    {
        TeamProfile {
            skills: team_skill_profile(member_skills),
            academic_level: modal_academic_level(member_levels),
        }
    }

    pub fn has_skill(&self, name: &str) -> bool {
        let key = skill_key(name);
        self.skills.iter().any(|s| skill_key(&s.name) == key)
    }
}

/// Case-folded skill name. Every skill name comparison goes through this.
pub fn skill_key(name: &str) -> String {
    name.to_lowercase()
}

/// Groups member skills by name and sorts by (count desc, average level desc).
/// Ties on both keys fall back to the name so the result never depends on input order.
pub fn team_skill_profile(member_skills: &[Skill]) -> Vec<TeamSkill> {
    let mut totals: HashMap<&str, (u32, i64)> = HashMap::new();
    for skill in member_skills {
        let entry = totals.entry(skill.name.as_str()).or_insert((0, 0));
        entry.0 += 1;
        entry.1 += i64::from(skill.level);
    }

    let mut profile: Vec<TeamSkill> = totals
        .into_iter()
        .map(|(name, (count, total))| TeamSkill {
            name: name.to_string(),
            count,
            avg_level: total as f64 / f64::from(count),
        })
        .collect();

    profile.sort_by(|a, b| {
        b.count
            .cmp(&a.count)
            .then_with(|| {
                b.avg_level
                    .partial_cmp(&a.avg_level)
                    .unwrap_or(Ordering::Equal)
            })
            .then_with(|| a.name.cmp(&b.name))
    });
    profile
}

/// Most common non-empty academic level. On a tie, the level that reached the
/// winning count first wins.
pub fn modal_academic_level<'a, I>(levels: I) -> Option<String>
where
    I: IntoIterator<Item = Option<&'a str>>,
{
    let mut counts: HashMap<&str, u32> = HashMap::new();
    let mut best: Option<(&str, u32)> = None;

    for level in levels.into_iter().flatten() {
        if level.is_empty() {
            continue;
        }
        let count = counts.entry(level).or_insert(0);
        *count += 1;
        if best.map_or(true, |(_, max)| *count > max) {
            best = Some((level, *count));
        }
    }

    best.map(|(level, _)| level.to_string())
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
    fn test_has_skill_folds_non_ascii_case() {
        let profile = TeamProfile::build(&[skill("ÉLIXIR", 6)], [None]);
        assert!(profile.has_skill("élixir"));
        assert!(!profile.has_skill("elixir"));
    }

    #[test]
    fn test_profile_counts_and_averages() {
        let skills = vec![skill("Rust", 8), skill("Rust", 6), skill("React", 9)];
        let profile = team_skill_profile(&skills);

        assert_eq!(profile.len(), 2);
        assert_eq!(profile[0].name, "Rust");
        assert_eq!(profile[0].count, 2);
        assert!((profile[0].avg_level - 7.0).abs() < f64::EPSILON);
        assert_eq!(profile[1].name, "React");
    }

    #[test]
    fn test_profile_sorts_by_count_then_average() {
        let skills = vec![
            skill("Go", 3),
            skill("Python", 5),
            skill("Python", 5),
            skill("SQL", 9),
            skill("Go", 3),
        ];
        let names: Vec<_> = team_skill_profile(&skills)
            .into_iter()
            .map(|s| s.name)
            .collect();
        // Python and Go both appear twice; Python's average is higher.
        assert_eq!(names, vec!["Python", "Go", "SQL"]);
    }

    #[test]
    fn test_profile_independent_of_input_order() {
        let skills = vec![
            skill("Docker", 4),
            skill("Figma", 4),
            skill("Rust", 7),
            skill("Docker", 6),
            skill("Kotlin", 4),
        ];
        let mut reversed = skills.clone();
        reversed.reverse();
        let mut rotated = skills.clone();
        rotated.rotate_left(2);

        let expected = team_skill_profile(&skills);
        assert_eq!(team_skill_profile(&reversed), expected);
        assert_eq!(team_skill_profile(&rotated), expected);
    }

    #[test]
    fn test_profile_of_no_skills_is_empty() {
        assert!(team_skill_profile(&[]).is_empty());
    }

    #[test]
    fn test_modal_level_picks_most_common() {
        let levels = vec![Some("Junior"), Some("Senior"), Some("Senior"), None];
        assert_eq!(modal_academic_level(levels), Some("Senior".to_string()));
    }

    #[test]
    fn test_modal_level_tie_keeps_first_to_reach_count() {
        let levels = vec![Some("Junior"), Some("Senior"), Some("Senior"), Some("Junior")];
        assert_eq!(modal_academic_level(levels), Some("Senior".to_string()));
    }

    #[test]
    fn test_modal_level_ignores_missing_and_empty() {
        assert_eq!(modal_academic_level(vec![None, Some("")]), None);
    }

    #[test]
    fn test_has_skill_is_case_insensitive() {
        let profile = TeamProfile::build(&[skill("TypeScript", 7)], vec![Some("Junior")]);
        assert!(profile.has_skill("typescript"));
        assert!(!profile.has_skill("java"));
        assert_eq!(profile.academic_level.as_deref(), Some("Junior"));
    }
}
