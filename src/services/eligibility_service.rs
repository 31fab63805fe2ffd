use std::sync::Arc;

use crate::{
    errors::EngineResult,
    models::domain::{Attempt, Quiz},
    repositories::AttemptLedger,
};

/// Certificate-readiness derivation exposed to the certificate collaborator.
/// Nothing is stored; eligibility is recomputed from pass history on demand.
pub struct EligibilityService {
    ledger: Arc<dyn AttemptLedger>,
}

impl EligibilityService {
    pub fn new(ledger: Arc<dyn AttemptLedger>) -> Self {
        Self { ledger }
    }

    /// A quiz not required for the certificate never blocks it; otherwise
    /// one completed passing attempt suffices.
    pub fn is_eligible_for_certificate(quiz: &Quiz, attempts: &[Attempt]) -> bool {
        !quiz.required_for_certificate || attempts.iter().any(Self::is_passing)
    }

    pub async fn has_passed(&self, user_id: &str, quiz_id: &str) -> EngineResult<bool> {
        let attempts = self.ledger.list_for_user(user_id, quiz_id).await?;
        Ok(attempts.iter().any(Self::is_passing))
    }

    fn is_passing(attempt: &Attempt) -> bool {
        attempt.is_completed() && attempt.passed == Some(true)
    }
}
