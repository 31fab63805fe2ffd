use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

/// Assessment definition for a course. Authored externally; read-only here.
/// At most one active quiz per course is enforced by the authoring side.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize, Serialize, Validate)]
pub struct Quiz {
    pub id: String,
    pub course_id: String,
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[validate(range(min = 1))]
    pub time_limit_minutes: u32,
    #[validate(range(max = 100))]
    pub passing_score: u8, // minimum percentage to pass
    pub required_for_certificate: bool,
    pub active: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub modified_at: Option<DateTime<Utc>>,
}

impl Quiz {
    pub fn new(course_id: &str, title: &str, time_limit_minutes: u32, passing_score: u8) -> Self {
        Quiz {
            id: Uuid::new_v4().to_string(),
            course_id: course_id.to_string(),
            title: title.to_string(),
            description: None,
            time_limit_minutes,
            passing_score,
            required_for_certificate: false,
            active: true,
            created_at: Some(Utc::now()),
            modified_at: Some(Utc::now()),
        }
    }

    pub fn time_limit_seconds(&self) -> u64 {
        u64::from(self.time_limit_minutes) * 60
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_quiz_is_active_with_sane_defaults() {
        let quiz = Quiz::new("course-1", "Safety Basics", 30, 70);

        assert!(quiz.active);
        assert!(!quiz.required_for_certificate);
        assert_eq!(quiz.time_limit_seconds(), 1800);
        assert!(quiz.validate().is_ok());
    }

    #[test]
    fn validation_rejects_out_of_range_definitions() {
        let mut quiz = Quiz::new("course-1", "Safety Basics", 30, 70);
        quiz.time_limit_minutes = 0;
        assert!(quiz.validate().is_err());

        let mut quiz = Quiz::new("course-1", "Safety Basics", 30, 70);
        quiz.passing_score = 101;
        assert!(quiz.validate().is_err());
    }

    #[test]
    fn quiz_round_trip_serialization() {
        let quiz = Quiz::new("course-1", "Safety Basics", 30, 70);

        let json = serde_json::to_string(&quiz).expect("quiz should serialize");
        let parsed: Quiz = serde_json::from_str(&json).expect("quiz should deserialize");

        assert_eq!(quiz, parsed);
    }
}
