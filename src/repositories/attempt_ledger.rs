use async_trait::async_trait;
use chrono::Utc;
use futures::TryStreamExt;
use mongodb::{
    bson::{doc, to_bson},
    options::{IndexOptions, ReturnDocument},
    Collection, IndexModel,
};

use crate::{
    config::Config,
    db::Database,
    errors::{EngineError, EngineResult},
    models::domain::{Attempt, AttemptAnswer, AttemptOutcome},
};

/// Persistence contract for attempt records. Append-only during a session:
/// `open` writes the timestamps, `close` writes the answer batch together
/// with the closing fields exactly once. A closed attempt is never mutated
/// again, and no reader may observe a completed attempt without its answers.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait AttemptLedger: Send + Sync {
    async fn open(&self, user_id: &str, quiz_id: &str) -> EngineResult<Attempt>;
    async fn close(
        &self,
        attempt_id: &str,
        outcome: AttemptOutcome,
        answers: Vec<AttemptAnswer>,
    ) -> EngineResult<Attempt>;
    async fn find_by_id(&self, id: &str) -> EngineResult<Option<Attempt>>;
    /// Attempts for a (user, quiz) pair, most recent first. Includes open
    /// (abandoned) attempts; read models filter those out.
    async fn list_for_user(&self, user_id: &str, quiz_id: &str) -> EngineResult<Vec<Attempt>>;
    async fn list_for_user_paginated<'a>(
        &self,
        user_id: &str,
        quiz_id: Option<&'a str>,
        offset: i64,
        limit: i64,
    ) -> EngineResult<(Vec<Attempt>, i64)>;
}

pub struct MongoAttemptLedger {
    collection: Collection<Attempt>,
}

impl MongoAttemptLedger {
    pub fn new(db: &Database, config: &Config) -> Self {
        Self {
            collection: db.get_collection(&config.attempts_collection),
        }
    }

    pub async fn ensure_indexes(&self) -> EngineResult<()> {
        log::info!("Creating indexes for attempts collection");

        let id_index = IndexModel::builder()
            .keys(doc! { "id": 1 })
            .options(
                IndexOptions::builder()
                    .unique(true)
                    .name("id_unique".to_string())
                    .build(),
            )
            .build();

        let user_quiz_index = IndexModel::builder()
            .keys(doc! { "user_id": 1, "quiz_id": 1 })
            .options(
                IndexOptions::builder()
                    .name("user_quiz".to_string())
                    .build(),
            )
            .build();

        self.collection.create_index(id_index).await?;
        self.collection.create_index(user_quiz_index).await?;

        Ok(())
    }
}

#[async_trait]
impl AttemptLedger for MongoAttemptLedger {
    async fn open(&self, user_id: &str, quiz_id: &str) -> EngineResult<Attempt> {
        let prior = self
            .collection
            .count_documents(doc! { "user_id": user_id, "quiz_id": quiz_id })
            .await?;

        let attempt = Attempt::open(user_id, quiz_id, prior as i16 + 1);
        self.collection.insert_one(&attempt).await?;

        log::debug!(
            "opened attempt {} (#{}) for user {} on quiz {}",
            attempt.id,
            attempt.attempt_number,
            user_id,
            quiz_id
        );
        Ok(attempt)
    }

    async fn close(
        &self,
        attempt_id: &str,
        outcome: AttemptOutcome,
        answers: Vec<AttemptAnswer>,
    ) -> EngineResult<Attempt> {
        // Answers and closing fields land in one single-document update,
        // filtered on the attempt still being open, so a second close loses
        // the race and partial visibility cannot occur.
        let update = doc! {
            "$set": {
                "score": outcome.score as i64,
                "total_points": outcome.total_points as i64,
                "passed": outcome.passed,
                "time_spent_seconds": outcome.time_spent_seconds as i64,
                "completed_at": to_bson(&Utc::now())?,
                "answers": to_bson(&answers)?,
            }
        };

        let closed = self
            .collection
            .find_one_and_update(doc! { "id": attempt_id, "completed_at": null }, update)
            .return_document(ReturnDocument::After)
            .await?;

        match closed {
            Some(attempt) => Ok(attempt),
            None => {
                if self
                    .collection
                    .find_one(doc! { "id": attempt_id })
                    .await?
                    .is_some()
                {
                    Err(EngineError::AlreadyExists(format!(
                        "Attempt '{}' is already completed",
                        attempt_id
                    )))
                } else {
                    Err(EngineError::NotFound(format!(
                        "Attempt '{}' not found",
                        attempt_id
                    )))
                }
            }
        }
    }

    async fn find_by_id(&self, id: &str) -> EngineResult<Option<Attempt>> {
        let attempt = self.collection.find_one(doc! { "id": id }).await?;
        Ok(attempt)
    }

    async fn list_for_user(&self, user_id: &str, quiz_id: &str) -> EngineResult<Vec<Attempt>> {
        let attempts = self
            .collection
            .find(doc! { "user_id": user_id, "quiz_id": quiz_id })
            .sort(doc! { "started_at": -1 })
            .await?
            .try_collect()
            .await?;
        Ok(attempts)
    }

    async fn list_for_user_paginated<'a>(
        &self,
        user_id: &str,
        quiz_id: Option<&'a str>,
        offset: i64,
        limit: i64,
    ) -> EngineResult<(Vec<Attempt>, i64)> {
        let mut filter = doc! { "user_id": user_id };

        if let Some(qid) = quiz_id {
            filter.insert("quiz_id", qid);
        }

        let total = self.collection.count_documents(filter.clone()).await?;

        let attempts = self
            .collection
            .find(filter)
            .skip(offset as u64)
            .limit(limit)
            .sort(doc! { "started_at": -1 })
            .await?
            .try_collect()
            .await?;

        Ok((attempts, total as i64))
    }
}
