//! Invite candidates: every user who could be invited to a team, scored against it.

use std::collections::{HashMap, HashSet};

use serde::Serialize;
use tracing::debug;
use uuid::Uuid;

use crate::errors::AppError;
use crate::matching::profile::TeamProfile;
use crate::matching::scorer::{score_candidates, CompatibilityScorer};
use crate::models::skill::Skill;
use crate::models::team::Team;
use crate::models::user::User;
use crate::profile::repository::skills_for_users;
use crate::requests::repository::pending_requester_ids;
use crate::state::AppState;
use crate::teams::repository::{all_users, team_members};

const TOP_SKILLS_SHOWN: usize = 3;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CandidateSkill {
    pub name: String,
    pub level: i32,
    /// True when the team already has this skill; false marks it complementary.
    pub matches_team: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct CandidateView {
    pub user_id: Uuid,
    pub full_name: String,
    pub email: String,
    pub academic_level: Option<String>,
    pub compatibility: u32,
    pub top_skills: Vec<CandidateSkill>,
    pub invited: bool,
}

#[derive(Debug, Serialize)]
pub struct CandidatesResponse {
    pub team_id: Uuid,
    pub team_profile: TeamProfile,
    pub candidates: Vec<CandidateView>,
}

/// Loads members, users, skills and pending requests, then ranks the candidates.
/// The caller must own the team.
pub async fn invite_candidates(
    state: &AppState,
    team: &Team,
    caller: &User,
    query: Option<&str>,
) -> Result<CandidatesResponse, AppError> {
    if !team.is_owned_by(caller.user_id) {
        return Err(AppError::Forbidden(
            "Only the team owner can browse invite candidates".to_string(),
        ));
    }

    let members = team_members(&state.db, team.team_id).await?;
    let member_ids: HashSet<Uuid> = members.iter().map(|m| m.user_id).collect();

    let candidates: Vec<User> = all_users(&state.db)
        .await?
        .into_iter()
        .filter(|u| u.user_id != caller.user_id && !member_ids.contains(&u.user_id))
        .collect();

    let mut ids: Vec<Uuid> = members.iter().map(|m| m.user_id).collect();
    ids.extend(candidates.iter().map(|c| c.user_id));
    let skills_by_user = skills_for_users(&state.db, &ids).await?;

    let member_skills: Vec<Skill> = members
        .iter()
        .filter_map(|m| skills_by_user.get(&m.user_id))
        .flatten()
        .cloned()
        .collect();
    let team_profile = TeamProfile::build(
        &member_skills,
        members.iter().map(|m| m.academic_level.as_deref()),
    );

    let invited = pending_requester_ids(&state.db, team.team_id).await?;

    let ranked = rank_candidates(
        state.scorer.as_ref(),
        &candidates,
        &skills_by_user,
        &team_profile,
        &invited,
        query,
    );
    debug!(
        "Ranked {} candidates for team {} (query: {:?})",
        ranked.len(),
        team.team_id,
        query
    );

    Ok(CandidatesResponse {
        team_id: team.team_id,
        team_profile,
        candidates: ranked,
    })
}

/// Filters by `query`, scores, and sorts by compatibility (highest first).
/// Candidates with equal scores keep their incoming order.
pub fn rank_candidates(
    scorer: &dyn CompatibilityScorer,
    candidates: &[User],
    skills_by_user: &HashMap<Uuid, Vec<Skill>>,
    team: &TeamProfile,
    invited: &HashSet<Uuid>,
    query: Option<&str>,
) -> Vec<CandidateView> {
    let needle = query
        .map(|q| q.trim().to_lowercase())
        .filter(|q| !q.is_empty());

    let matching: Vec<User> = candidates
        .iter()
        .filter(|u| match &needle {
            Some(needle) => matches_query(u, needle),
            None => true,
        })
        .cloned()
        .collect();

    let scores = score_candidates(scorer, &matching, skills_by_user, team);

    let mut views: Vec<CandidateView> = matching
        .into_iter()
        .map(|user| {
            let skills = skills_by_user
                .get(&user.user_id)
                .map(Vec::as_slice)
                .unwrap_or_default();
            CandidateView {
                compatibility: scores.get(&user.user_id).copied().unwrap_or_default(),
                top_skills: top_skills(skills, team),
                invited: invited.contains(&user.user_id),
                full_name: user.full_name(),
                user_id: user.user_id,
                email: user.email,
                academic_level: user.academic_level,
            }
        })
        .collect();

    views.sort_by(|a, b| b.compatibility.cmp(&a.compatibility));
    views
}

fn matches_query(user: &User, needle: &str) -> bool {
    user.full_name().to_lowercase().contains(needle)
        || user.email.to_lowercase().contains(needle)
        || user
            .academic_level
            .as_deref()
            .is_some_and(|level| level.to_lowercase().contains(needle))
}

fn top_skills(skills: &[Skill], team: &TeamProfile) -> Vec<CandidateSkill> {
    let mut sorted: Vec<&Skill> = skills.iter().collect();
    sorted.sort_by(|a, b| b.level.cmp(&a.level));
    sorted
        .into_iter()
        .take(TOP_SKILLS_SHOWN)
        .map(|s| CandidateSkill {
            name: s.name.clone(),
            level: s.level,
            matches_team: team.has_skill(&s.name),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::matching::scorer::HeuristicScorer;
    use chrono::Utc;

    fn user(first: &str, last: &str, level: Option<&str>) -> User {
        User {
            user_id: Uuid::new_v4(),
            email: format!("{}@psu.edu", first.to_lowercase()),
            first_name: first.to_string(),
            last_name: last.to_string(),
            academic_level: level.map(str::to_string),
            description: None,
            created_at: Utc::now(),
        }
    }

    fn skill(name: &str, level: i32) -> Skill {
        Skill {
            name: name.to_string(),
            level,
        }
    }

    fn team_profile() -> TeamProfile {
        TeamProfile::build(&[skill("Rust", 7), skill("SQL", 5)], [Some("Junior")])
    }

    #[test]
    fn test_sorted_by_compatibility() {
        let weak = user("Ada", "Low", None);
        let strong = user("Grace", "High", Some("Junior"));
        let mut skills = HashMap::new();
        skills.insert(weak.user_id, vec![]);
        skills.insert(strong.user_id, vec![skill("Rust", 8), skill("React", 6)]);

        let ranked = rank_candidates(
            &HeuristicScorer,
            &[weak.clone(), strong.clone()],
            &skills,
            &team_profile(),
            &HashSet::new(),
            None,
        );

        assert_eq!(ranked.len(), 2);
        assert_eq!(ranked[0].user_id, strong.user_id);
        assert_eq!(ranked[1].compatibility, 0);
        // 4 overlap + 2 complementary + 30 academic + 8 count
        assert_eq!(ranked[0].compatibility, 44);
    }

    #[test]
    fn test_query_matches_name_email_and_level() {
        let ada = user("Ada", "Lovelace", Some("Senior"));
        let bob = user("Bob", "Builder", Some("Freshman"));
        let skills = HashMap::new();
        let candidates = [ada.clone(), bob.clone()];

        let by_name = rank_candidates(
            &HeuristicScorer,
            &candidates,
            &skills,
            &team_profile(),
            &HashSet::new(),
            Some("LOVE"),
        );
        assert_eq!(by_name.len(), 1);
        assert_eq!(by_name[0].user_id, ada.user_id);

        let by_level = rank_candidates(
            &HeuristicScorer,
            &candidates,
            &skills,
            &team_profile(),
            &HashSet::new(),
            Some("fresh"),
        );
        assert_eq!(by_level.len(), 1);
        assert_eq!(by_level[0].user_id, bob.user_id);

        let blank = rank_candidates(
            &HeuristicScorer,
            &candidates,
            &skills,
            &team_profile(),
            &HashSet::new(),
            Some("   "),
        );
        assert_eq!(blank.len(), 2);
    }

    #[test]
    fn test_top_skills_flag_team_matches() {
        let dev = user("Linus", "T", None);
        let mut skills = HashMap::new();
        skills.insert(
            dev.user_id,
            vec![
                skill("C", 9),
                skill("rust", 8),
                skill("Go", 2),
                skill("Python", 6),
            ],
        );

        let ranked = rank_candidates(
            &HeuristicScorer,
            &[dev],
            &skills,
            &team_profile(),
            &HashSet::new(),
            None,
        );
        let top = &ranked[0].top_skills;
        assert_eq!(top.len(), 3);
        assert_eq!(top[0].name, "C");
        assert!(!top[0].matches_team);
        assert_eq!(top[1].name, "rust");
        assert!(top[1].matches_team);
        assert_eq!(top[2].name, "Python");
    }

    #[test]
    fn test_invited_flag() {
        let pending = user("Pat", "Pending", None);
        let fresh = user("Fay", "Fresh", None);
        let invited: HashSet<Uuid> = [pending.user_id].into_iter().collect();

        let ranked = rank_candidates(
            &HeuristicScorer,
            &[pending.clone(), fresh.clone()],
            &HashMap::new(),
            &team_profile(),
            &invited,
            None,
        );
        let flag = |id: Uuid| ranked.iter().find(|c| c.user_id == id).unwrap().invited;
        assert!(flag(pending.user_id));
        assert!(!flag(fresh.user_id));
    }
}
