pub mod attempt_ledger;
pub mod quiz_store;

pub use attempt_ledger::{AttemptLedger, MongoAttemptLedger};
pub use quiz_store::{MongoQuizStore, QuizStore};
