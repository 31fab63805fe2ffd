use async_trait::async_trait;
use futures::TryStreamExt;
use mongodb::{bson::doc, options::IndexOptions, Collection, IndexModel};

use crate::{
    config::Config,
    db::Database,
    errors::EngineResult,
    models::domain::{Question, Quiz},
};

/// Read-only view of the quiz definitions owned by the course/catalog side.
/// The session fetches a consistent snapshot once at start and never
/// observes live authoring edits mid-attempt.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait QuizStore: Send + Sync {
    async fn active_quiz_for_course(&self, course_id: &str) -> EngineResult<Option<Quiz>>;
    /// Questions sorted by `order_index`, each with its options in
    /// presentation order.
    async fn questions_for_quiz(&self, quiz_id: &str) -> EngineResult<Vec<Question>>;
}

pub struct MongoQuizStore {
    quizzes: Collection<Quiz>,
    questions: Collection<Question>,
}

impl MongoQuizStore {
    pub fn new(db: &Database, config: &Config) -> Self {
        Self {
            quizzes: db.get_collection(&config.quizzes_collection),
            questions: db.get_collection(&config.questions_collection),
        }
    }

    pub async fn ensure_indexes(&self) -> EngineResult<()> {
        log::info!("Creating indexes for quiz definition collections");

        let quiz_id_index = IndexModel::builder()
            .keys(doc! { "id": 1 })
            .options(
                IndexOptions::builder()
                    .unique(true)
                    .name("id_unique".to_string())
                    .build(),
            )
            .build();

        let course_active_index = IndexModel::builder()
            .keys(doc! { "course_id": 1, "active": 1 })
            .options(
                IndexOptions::builder()
                    .name("course_active".to_string())
                    .build(),
            )
            .build();

        let question_order_index = IndexModel::builder()
            .keys(doc! { "quiz_id": 1, "order_index": 1 })
            .options(
                IndexOptions::builder()
                    .unique(true)
                    .name("quiz_order".to_string())
                    .build(),
            )
            .build();

        self.quizzes.create_index(quiz_id_index).await?;
        self.quizzes.create_index(course_active_index).await?;
        self.questions.create_index(question_order_index).await?;

        Ok(())
    }
}

#[async_trait]
impl QuizStore for MongoQuizStore {
    async fn active_quiz_for_course(&self, course_id: &str) -> EngineResult<Option<Quiz>> {
        let quiz = self
            .quizzes
            .find_one(doc! { "course_id": course_id, "active": true })
            .await?;
        Ok(quiz)
    }

    async fn questions_for_quiz(&self, quiz_id: &str) -> EngineResult<Vec<Question>> {
        let mut questions: Vec<Question> = self
            .questions
            .find(doc! { "quiz_id": quiz_id })
            .sort(doc! { "order_index": 1 })
            .await?
            .try_collect()
            .await?;

        for question in &mut questions {
            question.options.sort_by_key(|o| o.order_index);
        }

        Ok(questions)
    }
}
