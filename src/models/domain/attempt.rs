use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// One timed instance of a learner taking a quiz. Opened when the session
/// starts, closed exactly once at grading, immutable afterwards. An attempt
/// abandoned mid-session stays open forever and never counts toward pass
/// history.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize, Serialize)]
pub struct Attempt {
    pub id: String,
    pub user_id: String,
    pub quiz_id: String,
    pub attempt_number: i16,
    pub started_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<DateTime<Utc>>,
    pub score: Option<u32>,
    pub total_points: Option<u32>,
    pub passed: Option<bool>,
    pub time_spent_seconds: Option<u64>,
    pub answers: Vec<AttemptAnswer>, // empty while open, written once at close
}

/// Per-question audit row, one per snapshot question at grading time.
/// `selected_option_id = None` records a question left unanswered.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize, Serialize)]
pub struct AttemptAnswer {
    pub question_id: String,
    pub selected_option_id: Option<String>,
    pub is_correct: bool,
    pub points_earned: u32,
}

/// Closing fields written together with the answer batch.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize, Serialize)]
pub struct AttemptOutcome {
    pub score: u32,
    pub total_points: u32,
    pub passed: bool,
    pub time_spent_seconds: u64,
}

impl Attempt {
    pub fn open(user_id: &str, quiz_id: &str, attempt_number: i16) -> Self {
        Attempt {
            id: Uuid::new_v4().to_string(),
            user_id: user_id.to_string(),
            quiz_id: quiz_id.to_string(),
            attempt_number,
            started_at: Utc::now(),
            completed_at: None,
            score: None,
            total_points: None,
            passed: None,
            time_spent_seconds: None,
            answers: Vec::new(),
        }
    }

    pub fn is_completed(&self) -> bool {
        self.completed_at.is_some()
    }
}
