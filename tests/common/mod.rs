#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;

use assessment_engine::{
    errors::{EngineError, EngineResult},
    models::domain::{
        Attempt, AttemptAnswer, AttemptOutcome, Question, QuestionOption, QuestionType, Quiz,
    },
    repositories::{AttemptLedger, QuizStore},
};

pub fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

pub fn make_quiz(id: &str, course_id: &str, time_limit_minutes: u32, passing_score: u8) -> Quiz {
    let mut quiz = Quiz::new(course_id, "Workplace Safety", time_limit_minutes, passing_score);
    quiz.id = id.to_string();
    quiz
}

/// Multiple-choice question whose correct option is `{id}-right`.
pub fn make_question(quiz_id: &str, id: &str, points: u32, order_index: i16) -> Question {
    let option = |suffix: &str, is_correct: bool, order: i16| QuestionOption {
        id: format!("{}-{}", id, suffix),
        text: format!("{} {}", id, suffix),
        is_correct,
        order_index: order,
    };

    Question {
        id: id.to_string(),
        quiz_id: quiz_id.to_string(),
        text: format!("Question {}", id),
        question_type: QuestionType::MultipleChoice,
        points,
        order_index,
        options: vec![
            option("right", true, 1),
            option("wrong-1", false, 2),
            option("wrong-2", false, 3),
        ],
    }
}

pub struct InMemoryQuizStore {
    quizzes: RwLock<HashMap<String, Quiz>>,
    questions: RwLock<Vec<Question>>,
}

impl InMemoryQuizStore {
    pub fn new() -> Self {
        Self {
            quizzes: RwLock::new(HashMap::new()),
            questions: RwLock::new(Vec::new()),
        }
    }

    pub async fn insert_quiz(&self, quiz: Quiz) {
        self.quizzes.write().await.insert(quiz.id.clone(), quiz);
    }

    pub async fn insert_questions(&self, questions: Vec<Question>) {
        self.questions.write().await.extend(questions);
    }
}

#[async_trait]
impl QuizStore for InMemoryQuizStore {
    async fn active_quiz_for_course(&self, course_id: &str) -> EngineResult<Option<Quiz>> {
        let quizzes = self.quizzes.read().await;
        Ok(quizzes
            .values()
            .find(|q| q.course_id == course_id && q.active)
            .cloned())
    }

    async fn questions_for_quiz(&self, quiz_id: &str) -> EngineResult<Vec<Question>> {
        let questions = self.questions.read().await;
        let mut items: Vec<_> = questions
            .iter()
            .filter(|q| q.quiz_id == quiz_id)
            .cloned()
            .collect();
        items.sort_by_key(|q| q.order_index);
        for question in &mut items {
            question.options.sort_by_key(|o| o.order_index);
        }
        Ok(items)
    }
}

pub struct InMemoryAttemptLedger {
    attempts: RwLock<HashMap<String, Attempt>>,
    fail_opens: AtomicUsize,
    fail_closes: AtomicUsize,
}

impl InMemoryAttemptLedger {
    pub fn new() -> Self {
        Self {
            attempts: RwLock::new(HashMap::new()),
            fail_opens: AtomicUsize::new(0),
            fail_closes: AtomicUsize::new(0),
        }
    }

    /// Make the next `n` open calls fail with a database error.
    pub fn fail_next_opens(&self, n: usize) {
        self.fail_opens.store(n, Ordering::SeqCst);
    }

    /// Make the next `n` close calls fail with a database error.
    pub fn fail_next_closes(&self, n: usize) {
        self.fail_closes.store(n, Ordering::SeqCst);
    }

    pub async fn completed_count(&self) -> usize {
        self.attempts
            .read()
            .await
            .values()
            .filter(|a| a.is_completed())
            .count()
    }

    pub async fn total_count(&self) -> usize {
        self.attempts.read().await.len()
    }
}

#[async_trait]
impl AttemptLedger for InMemoryAttemptLedger {
    async fn open(&self, user_id: &str, quiz_id: &str) -> EngineResult<Attempt> {
        if self.fail_opens.load(Ordering::SeqCst) > 0 {
            self.fail_opens.fetch_sub(1, Ordering::SeqCst);
            return Err(EngineError::DatabaseError(
                "injected open failure".to_string(),
            ));
        }

        let mut attempts = self.attempts.write().await;
        let prior = attempts
            .values()
            .filter(|a| a.user_id == user_id && a.quiz_id == quiz_id)
            .count();

        let attempt = Attempt::open(user_id, quiz_id, prior as i16 + 1);
        if attempts.contains_key(&attempt.id) {
            return Err(EngineError::AlreadyExists(format!(
                "Attempt with id '{}' already exists",
                attempt.id
            )));
        }
        attempts.insert(attempt.id.clone(), attempt.clone());
        Ok(attempt)
    }

    async fn close(
        &self,
        attempt_id: &str,
        outcome: AttemptOutcome,
        answers: Vec<AttemptAnswer>,
    ) -> EngineResult<Attempt> {
        if self.fail_closes.load(Ordering::SeqCst) > 0 {
            self.fail_closes.fetch_sub(1, Ordering::SeqCst);
            return Err(EngineError::DatabaseError(
                "injected close failure".to_string(),
            ));
        }

        let mut attempts = self.attempts.write().await;
        let attempt = attempts
            .get_mut(attempt_id)
            .ok_or_else(|| EngineError::NotFound(format!("Attempt '{}' not found", attempt_id)))?;

        if attempt.is_completed() {
            return Err(EngineError::AlreadyExists(format!(
                "Attempt '{}' is already completed",
                attempt_id
            )));
        }

        attempt.completed_at = Some(Utc::now());
        attempt.score = Some(outcome.score);
        attempt.total_points = Some(outcome.total_points);
        attempt.passed = Some(outcome.passed);
        attempt.time_spent_seconds = Some(outcome.time_spent_seconds);
        attempt.answers = answers;

        Ok(attempt.clone())
    }

    async fn find_by_id(&self, id: &str) -> EngineResult<Option<Attempt>> {
        let attempts = self.attempts.read().await;
        Ok(attempts.get(id).cloned())
    }

    async fn list_for_user(&self, user_id: &str, quiz_id: &str) -> EngineResult<Vec<Attempt>> {
        let attempts = self.attempts.read().await;
        let mut items: Vec<_> = attempts
            .values()
            .filter(|a| a.user_id == user_id && a.quiz_id == quiz_id)
            .cloned()
            .collect();
        items.sort_by(|a, b| b.started_at.cmp(&a.started_at));
        Ok(items)
    }

    async fn list_for_user_paginated<'a>(
        &self,
        user_id: &str,
        quiz_id: Option<&'a str>,
        offset: i64,
        limit: i64,
    ) -> EngineResult<(Vec<Attempt>, i64)> {
        let attempts = self.attempts.read().await;
        let mut items: Vec<_> = attempts
            .values()
            .filter(|a| {
                a.user_id == user_id && quiz_id.map(|qid| a.quiz_id == qid).unwrap_or(true)
            })
            .cloned()
            .collect();

        items.sort_by(|a, b| b.started_at.cmp(&a.started_at));

        let total = items.len() as i64;
        let start = offset.max(0) as usize;
        let end = (start + limit.max(0) as usize).min(items.len());

        let page = if start >= items.len() {
            vec![]
        } else {
            items[start..end].to_vec()
        };

        Ok((page, total))
    }
}
