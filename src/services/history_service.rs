use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{
    errors::EngineResult,
    models::domain::Attempt,
    repositories::AttemptLedger,
    services::grading_service::GradingService,
};

/// Read model over a learner's past attempts for one quiz. Only completed
/// attempts appear; an abandoned (still open) attempt is evidence of a
/// non-graded try and stays out of pass/fail history.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize, Serialize)]
pub struct AttemptSummary {
    pub attempt_id: String,
    pub attempt_number: i16,
    pub score: u32,
    pub total_points: u32,
    pub percentage: u8,
    pub passed: bool,
    pub time_spent_seconds: u64,
    pub completed_at: DateTime<Utc>,
}

pub struct AttemptHistoryService {
    ledger: Arc<dyn AttemptLedger>,
}

impl AttemptHistoryService {
    pub fn new(ledger: Arc<dyn AttemptLedger>) -> Self {
        Self { ledger }
    }

    /// Completed attempts for a (user, quiz) pair, most recent first.
    pub async fn attempts_for(
        &self,
        user_id: &str,
        quiz_id: &str,
    ) -> EngineResult<Vec<AttemptSummary>> {
        let attempts = self.ledger.list_for_user(user_id, quiz_id).await?;
        Ok(attempts.iter().filter_map(Self::summarize).collect())
    }

    /// The attempt with the highest percentage; ties go to the earlier one.
    pub async fn best_attempt(
        &self,
        user_id: &str,
        quiz_id: &str,
    ) -> EngineResult<Option<AttemptSummary>> {
        let mut summaries = self.attempts_for(user_id, quiz_id).await?;
        summaries.reverse(); // oldest first, so an equal later score never wins

        Ok(summaries.into_iter().fold(None, |best, candidate| match best {
            Some(current) if current.percentage >= candidate.percentage => Some(current),
            _ => Some(candidate),
        }))
    }

    /// Whether any attempt record exists at all, open ones included.
    pub async fn has_attempted(&self, user_id: &str, quiz_id: &str) -> EngineResult<bool> {
        let attempts = self.ledger.list_for_user(user_id, quiz_id).await?;
        Ok(!attempts.is_empty())
    }

    fn summarize(attempt: &Attempt) -> Option<AttemptSummary> {
        let completed_at = attempt.completed_at?;
        let score = attempt.score?;
        let total_points = attempt.total_points?;

        Some(AttemptSummary {
            attempt_id: attempt.id.clone(),
            attempt_number: attempt.attempt_number,
            score,
            total_points,
            percentage: GradingService::percentage(score, total_points),
            passed: attempt.passed.unwrap_or(false),
            time_spent_seconds: attempt.time_spent_seconds.unwrap_or(0),
            completed_at,
        })
    }
}
