//! Resume analysis: turns the model's free text into `SkillRatings`.
//!
//! The model is asked for bare JSON but often wraps it in prose or fences, so the
//! payload is taken from the first `{` to the last `}`. Anything that does not parse
//! into a complete rating degrades to `SkillRatings::fallback()`; only transport
//! failures surface as errors.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;
use tracing::{debug, warn};

use crate::errors::AppError;
use crate::llm_client::prompts::JSON_ONLY_INSTRUCTION;
use crate::llm_client::{Attachment, LlmClient};
use crate::models::skill::Skill;
use crate::resume::prompts::RESUME_RATING_PROMPT;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SkillRatings {
    pub backend: i32,
    pub frontend: i32,
    pub fullstack: i32,
    pub skills: Vec<Skill>,
}

impl SkillRatings {
    /// Returned whenever the model's answer cannot be used.
    pub fn fallback() -> Self {
        SkillRatings {
            backend: 5,
            frontend: 5,
            fullstack: 5,
            skills: vec![
                Skill {
                    name: "JavaScript".to_string(),
                    level: 5,
                },
                Skill {
                    name: "HTML/CSS".to_string(),
                    level: 5,
                },
            ],
        }
    }
}

#[derive(Debug, Error)]
pub enum RatingParseError {
    #[error("no JSON object found in model response")]
    NoJsonBlock,

    #[error("invalid JSON: {0}")]
    InvalidJson(#[from] serde_json::Error),

    #[error("missing or zero rating for '{0}'")]
    MissingRating(&'static str),
}

/// Rates an uploaded resume. Model output problems never fail the call.
pub async fn analyze_resume(
    llm: &LlmClient,
    mime_type: &str,
    bytes: &[u8],
) -> Result<SkillRatings, AppError> {
    let prompt = format!("{RESUME_RATING_PROMPT}\n{JSON_ONLY_INSTRUCTION}");
    let text = llm
        .generate_text(Some(Attachment { mime_type, bytes }), &prompt)
        .await
        .map_err(|e| AppError::Llm(e.to_string()))?;

    debug!("Raw LLM response: {text}");
    Ok(interpret_response(&text))
}

/// Parses the model's reply, substituting the fallback on any failure.
pub fn interpret_response(text: &str) -> SkillRatings {
    match parse_ratings(text) {
        Ok(ratings) => ratings,
        Err(e) => {
            warn!("Using fallback skill ratings: {e}");
            SkillRatings::fallback()
        }
    }
}

pub fn parse_ratings(text: &str) -> Result<SkillRatings, RatingParseError> {
    let block = extract_json_block(text).ok_or(RatingParseError::NoJsonBlock)?;
    let value: Value = serde_json::from_str(block)?;

    Ok(SkillRatings {
        backend: required_rating(&value, "backend")?,
        frontend: required_rating(&value, "frontend")?,
        fullstack: required_rating(&value, "fullstack")?,
        skills: value
            .get("skills")
            .and_then(Value::as_array)
            .map(|arr| arr.iter().filter_map(parse_skill).collect())
            .unwrap_or_default(),
    })
}

/// Text from the first `{` through the last `}`, if both exist in that order.
pub fn extract_json_block(text: &str) -> Option<&str> {
    let start = text.find('{')?;
    let end = text.rfind('}')?;
    (end > start).then(|| &text[start..=end])
}

fn required_rating(value: &Value, field: &'static str) -> Result<i32, RatingParseError> {
    value
        .get(field)
        .and_then(as_int)
        .filter(|v| *v != 0)
        .ok_or(RatingParseError::MissingRating(field))
}

fn parse_skill(value: &Value) -> Option<Skill> {
    let name = value.get("name")?.as_str()?.trim();
    if name.is_empty() {
        return None;
    }
    Some(Skill {
        name: name.to_string(),
        level: value.get("level").and_then(as_int)?,
    })
}

/// Accepts JSON numbers and numeric strings; fractional values are rounded.
fn as_int(value: &Value) -> Option<i32> {
    match value {
        Value::Number(n) => n
            .as_i64()
            .or_else(|| n.as_f64().map(|f| f.round() as i64))
            .and_then(|v| i32::try_from(v).ok()),
        Value::String(s) => s.trim().parse::<f64>().ok().map(|f| f.round() as i32),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plain_json_is_parsed() {
        let text = r#"{"backend": 7, "frontend": 8, "fullstack": 6,
            "skills": [{"name": "Rust", "level": 9}, {"name": "React", "level": 7}]}"#;
        let ratings = interpret_response(text);
        assert_eq!(ratings.backend, 7);
        assert_eq!(ratings.frontend, 8);
        assert_eq!(ratings.fullstack, 6);
        assert_eq!(ratings.skills.len(), 2);
        assert_eq!(ratings.skills[0].name, "Rust");
    }

    #[test]
    fn test_json_wrapped_in_prose_and_fences() {
        let text = "Here is the rating:\n```json\n{\"backend\": 4, \"frontend\": 3, \"fullstack\": 3, \"skills\": []}\n```\nGood luck!";
        let ratings = parse_ratings(text).unwrap();
        assert_eq!(ratings.backend, 4);
        assert!(ratings.skills.is_empty());
    }

    #[test]
    fn test_no_json_block_yields_fallback() {
        assert!(matches!(
            parse_ratings("I cannot read this file."),
            Err(RatingParseError::NoJsonBlock)
        ));
        assert_eq!(
            interpret_response("I cannot read this file."),
            SkillRatings::fallback()
        );
    }

    #[test]
    fn test_reversed_braces_yield_fallback() {
        assert_eq!(interpret_response("} nope {"), SkillRatings::fallback());
    }

    #[test]
    fn test_invalid_json_yields_fallback() {
        let text = "{backend: seven}";
        assert!(matches!(
            parse_ratings(text),
            Err(RatingParseError::InvalidJson(_))
        ));
        assert_eq!(interpret_response(text), SkillRatings::fallback());
    }

    #[test]
    fn test_missing_area_rating_yields_fallback_even_with_valid_skills() {
        let text = r#"{"backend": 7, "frontend": 8, "skills": [{"name": "Go", "level": 6}]}"#;
        assert!(matches!(
            parse_ratings(text),
            Err(RatingParseError::MissingRating("fullstack"))
        ));
        assert_eq!(interpret_response(text), SkillRatings::fallback());
    }

    #[test]
    fn test_zero_rating_counts_as_missing() {
        let text = r#"{"backend": 0, "frontend": 8, "fullstack": 5}"#;
        assert!(matches!(
            parse_ratings(text),
            Err(RatingParseError::MissingRating("backend"))
        ));
    }

    #[test]
    fn test_missing_skills_becomes_empty_list() {
        let text = r#"{"backend": 2, "frontend": 3, "fullstack": 2, "skills": "none"}"#;
        let ratings = parse_ratings(text).unwrap();
        assert!(ratings.skills.is_empty());
    }

    #[test]
    fn test_malformed_skill_entries_are_dropped() {
        let text = r#"{"backend": 6, "frontend": 6, "fullstack": 6,
            "skills": [{"name": "SQL", "level": "8"}, {"name": ""}, {"level": 3}, {"name": "Go", "level": 6.6}]}"#;
        let ratings = parse_ratings(text).unwrap();
        assert_eq!(
            ratings.skills,
            vec![
                Skill {
                    name: "SQL".to_string(),
                    level: 8
                },
                Skill {
                    name: "Go".to_string(),
                    level: 7
                },
            ]
        );
    }

    #[test]
    fn test_fallback_shape() {
        let fallback = SkillRatings::fallback();
        assert_eq!(
            (fallback.backend, fallback.frontend, fallback.fullstack),
            (5, 5, 5)
        );
        let names: Vec<_> = fallback.skills.iter().map(|s| s.name.as_str()).collect();
        assert_eq!(names, vec!["JavaScript", "HTML/CSS"]);
    }
}
