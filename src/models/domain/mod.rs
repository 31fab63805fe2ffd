pub mod attempt;
pub mod question;
pub mod quiz;

pub use attempt::{Attempt, AttemptAnswer, AttemptOutcome};
pub use question::{Question, QuestionOption, QuestionType};
pub use quiz::Quiz;
