pub mod eligibility_service;
pub mod grading_service;
pub mod history_service;
pub mod session;

pub use eligibility_service::EligibilityService;
pub use grading_service::{GradedAttempt, GradingService};
pub use history_service::{AttemptHistoryService, AttemptSummary};
pub use session::{IntroView, QuizSession, SessionState, SubmitOutcome};
