use std::collections::HashMap;
use std::sync::{Arc, Weak};

use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Duration, Instant, MissedTickBehavior};
use validator::Validate;

use crate::{
    errors::{EngineError, EngineResult},
    models::domain::{Attempt, AttemptOutcome, Question, Quiz},
    repositories::{AttemptLedger, QuizStore},
    services::grading_service::{GradedAttempt, GradingService},
    services::history_service::{AttemptHistoryService, AttemptSummary},
};

const TICK: Duration = Duration::from_secs(1);

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SessionState {
    Intro,
    Taking,
    Submitting,
    Result,
    Abandoned,
}

/// What a submit trigger produced. A trigger that arrives after the machine
/// has already left `Taking` (the manual-finish vs. timer-expiry race) is
/// ignored rather than closing a second time.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SubmitOutcome {
    Completed(GradedAttempt),
    Ignored,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum SubmitTrigger {
    Manual,
    Timeout,
}

/// Data for the intro screen: quiz metadata plus prior completed attempts,
/// so a host can show "already passed" without blocking a retake.
#[derive(Clone, Debug)]
pub struct IntroView {
    pub quiz: Quiz,
    pub prior_attempts: Vec<AttemptSummary>,
    pub already_passed: bool,
}

struct Inner {
    state: SessionState,
    questions: Vec<Question>, // snapshot taken at start, immune to authoring edits
    buffer: HashMap<String, String>, // question id -> selected option id, transient
    current_index: usize,
    attempt: Option<Attempt>,
    remaining_seconds: u64,
    started_instant: Option<Instant>,
    countdown: Option<JoinHandle<()>>,
    outcome: Option<GradedAttempt>,
}

impl Inner {
    fn expect_taking(&self, action: &str) -> EngineResult<()> {
        if self.state == SessionState::Taking {
            Ok(())
        } else {
            Err(EngineError::InvalidState(format!(
                "cannot {} in {:?}",
                action, self.state
            )))
        }
    }
}

/// Drives one attempt through `Intro -> Taking -> Submitting -> Result`,
/// owning the countdown and the in-memory answer buffer. Headless: no
/// rendering dependencies, usable directly from tests or any host.
///
/// Dropping the session mid-`Taking` is abandonment: the countdown holds
/// only a weak handle to the session state, so it stops ticking instead of
/// force-submitting, and the opened attempt stays open in the ledger.
pub struct QuizSession {
    inner: Arc<Mutex<Inner>>,
    store: Arc<dyn QuizStore>,
    ledger: Arc<dyn AttemptLedger>,
    history: AttemptHistoryService,
    user_id: String,
    quiz: Quiz,
}

impl QuizSession {
    /// Open a session on the course's active quiz, in `Intro`.
    pub async fn for_course(
        store: Arc<dyn QuizStore>,
        ledger: Arc<dyn AttemptLedger>,
        user_id: &str,
        course_id: &str,
    ) -> EngineResult<Self> {
        let quiz = store
            .active_quiz_for_course(course_id)
            .await?
            .ok_or_else(|| {
                EngineError::NotFound(format!("No active quiz for course '{}'", course_id))
            })?;

        Ok(Self {
            inner: Arc::new(Mutex::new(Inner {
                state: SessionState::Intro,
                questions: Vec::new(),
                buffer: HashMap::new(),
                current_index: 0,
                attempt: None,
                remaining_seconds: 0,
                started_instant: None,
                countdown: None,
                outcome: None,
            })),
            store,
            history: AttemptHistoryService::new(Arc::clone(&ledger)),
            ledger,
            user_id: user_id.to_string(),
            quiz,
        })
    }

    pub fn quiz(&self) -> &Quiz {
        &self.quiz
    }

    pub async fn intro(&self) -> EngineResult<IntroView> {
        let prior_attempts = self.history.attempts_for(&self.user_id, &self.quiz.id).await?;
        let already_passed = prior_attempts.iter().any(|a| a.passed);

        Ok(IntroView {
            quiz: self.quiz.clone(),
            prior_attempts,
            already_passed,
        })
    }

    /// Snapshot the questions, open the attempt record and arm the
    /// countdown. A ledger failure here leaves the session in `Intro` with
    /// nothing written, safe to retry.
    pub async fn start(&self) -> EngineResult<()> {
        let mut inner = self.inner.lock().await;
        if inner.state != SessionState::Intro {
            return Err(EngineError::InvalidState(format!(
                "cannot start in {:?}",
                inner.state
            )));
        }

        if let Err(err) = self.quiz.validate() {
            log::warn!("quiz {} has a malformed definition: {}", self.quiz.id, err);
        }

        let questions = self.store.questions_for_quiz(&self.quiz.id).await?;
        if questions.is_empty() {
            log::warn!(
                "quiz {} has no questions; the attempt will grade to zero",
                self.quiz.id
            );
        }

        let attempt = self.ledger.open(&self.user_id, &self.quiz.id).await?;
        log::info!(
            "attempt {} started for quiz {} with a {}s limit",
            attempt.id,
            self.quiz.id,
            self.quiz.time_limit_seconds()
        );

        inner.questions = questions;
        inner.buffer.clear();
        inner.current_index = 0;
        inner.attempt = Some(attempt);
        inner.remaining_seconds = self.quiz.time_limit_seconds();
        // elapsed time is measured from here, not derived from tick counts,
        // so timer drift cannot skew time_spent_seconds
        inner.started_instant = Some(Instant::now());
        inner.state = SessionState::Taking;
        inner.countdown = Some(spawn_countdown(
            Arc::downgrade(&self.inner),
            Arc::clone(&self.ledger),
            self.quiz.passing_score,
        ));

        Ok(())
    }

    /// Set or overwrite the buffered selection for one question.
    pub async fn select_answer(&self, question_id: &str, option_id: &str) -> EngineResult<()> {
        let mut inner = self.inner.lock().await;
        inner.expect_taking("answer")?;

        let option_belongs = inner
            .questions
            .iter()
            .find(|q| q.id == question_id)
            .map(|q| q.options.iter().any(|o| o.id == option_id));

        match option_belongs {
            None => Err(EngineError::NotFound(format!(
                "Question '{}' is not part of this quiz",
                question_id
            ))),
            Some(false) => Err(EngineError::ValidationError(format!(
                "Option '{}' does not belong to question '{}'",
                option_id, question_id
            ))),
            Some(true) => {
                inner
                    .buffer
                    .insert(question_id.to_string(), option_id.to_string());
                Ok(())
            }
        }
    }

    /// Jump to any question index; navigation is non-linear and revisitable.
    pub async fn navigate_to(&self, index: usize) -> EngineResult<()> {
        let mut inner = self.inner.lock().await;
        inner.expect_taking("navigate")?;

        if index >= inner.questions.len() {
            return Err(EngineError::ValidationError(format!(
                "Question index {} out of range",
                index
            )));
        }
        inner.current_index = index;
        Ok(())
    }

    pub async fn current_question(&self) -> EngineResult<Question> {
        let inner = self.inner.lock().await;
        inner.expect_taking("read the current question")?;
        inner
            .questions
            .get(inner.current_index)
            .cloned()
            .ok_or_else(|| EngineError::NotFound("This quiz has no questions".to_string()))
    }

    /// Grade the buffer and close the attempt. On a recoverable ledger
    /// failure the session returns to `Taking` with the buffer intact so
    /// submission can be retried without re-answering.
    pub async fn finish(&self) -> EngineResult<SubmitOutcome> {
        submit(
            &self.inner,
            &self.ledger,
            self.quiz.passing_score,
            SubmitTrigger::Manual,
        )
        .await
    }

    /// Walk away without grading. The opened attempt stays open forever as
    /// evidence of a non-graded try; it is never auto-completed later.
    pub async fn abandon(&self) -> EngineResult<()> {
        let mut inner = self.inner.lock().await;
        match inner.state {
            SessionState::Intro | SessionState::Taking => {
                if let Some(handle) = inner.countdown.take() {
                    handle.abort();
                }
                inner.state = SessionState::Abandoned;
                if let Some(attempt) = &inner.attempt {
                    log::info!("attempt {} abandoned; record stays open", attempt.id);
                }
                Ok(())
            }
            state => Err(EngineError::InvalidState(format!(
                "cannot abandon in {:?}",
                state
            ))),
        }
    }

    pub async fn state(&self) -> SessionState {
        self.inner.lock().await.state
    }

    pub async fn remaining_seconds(&self) -> u64 {
        self.inner.lock().await.remaining_seconds
    }

    /// The graded outcome, present once the session reaches `Result`.
    pub async fn result(&self) -> Option<GradedAttempt> {
        self.inner.lock().await.outcome.clone()
    }

    /// The attempt record as last seen by this session (open or closed).
    pub async fn attempt(&self) -> Option<Attempt> {
        self.inner.lock().await.attempt.clone()
    }
}

/// The single submit path shared by manual finish and countdown expiry.
/// The state check and the transition out of `Taking` happen under the one
/// session lock, so racing triggers resolve to exactly one close.
async fn submit(
    inner: &Arc<Mutex<Inner>>,
    ledger: &Arc<dyn AttemptLedger>,
    passing_score: u8,
    trigger: SubmitTrigger,
) -> EngineResult<SubmitOutcome> {
    let mut guard = inner.lock().await;
    match guard.state {
        SessionState::Taking => {}
        SessionState::Intro => {
            return Err(EngineError::InvalidState(
                "cannot submit a session that has not started".to_string(),
            ));
        }
        state => {
            log::debug!("{:?} submit trigger ignored in {:?}", trigger, state);
            return Ok(SubmitOutcome::Ignored);
        }
    }
    guard.state = SessionState::Submitting;

    let remaining = guard.remaining_seconds;
    if let Some(handle) = guard.countdown.take() {
        // the expired timer task is already past its loop; only a manual
        // trigger has a live countdown to stop
        if trigger == SubmitTrigger::Manual {
            handle.abort();
        }
    }

    let Some(attempt) = guard.attempt.as_ref() else {
        guard.state = SessionState::Taking;
        return Err(EngineError::InternalError(
            "session is taking but holds no open attempt".to_string(),
        ));
    };
    let attempt_id = attempt.id.clone();

    let time_spent_seconds = guard
        .started_instant
        .map(|started| started.elapsed().as_secs())
        .unwrap_or(0);

    let graded = GradingService::grade(&guard.questions, &guard.buffer, passing_score);
    let outcome = AttemptOutcome {
        score: graded.score,
        total_points: graded.total_points,
        passed: graded.passed,
        time_spent_seconds,
    };

    match ledger.close(&attempt_id, outcome, graded.answers.clone()).await {
        Ok(closed) => {
            log::info!(
                "attempt {} closed: {}/{} ({}%), passed={}",
                attempt_id,
                graded.score,
                graded.total_points,
                graded.percentage,
                graded.passed
            );
            guard.attempt = Some(closed);
            guard.outcome = Some(graded.clone());
            guard.state = SessionState::Result;
            Ok(SubmitOutcome::Completed(graded))
        }
        Err(err) => {
            log::warn!(
                "closing attempt {} failed, returning to taking: {}",
                attempt_id,
                err
            );
            guard.state = SessionState::Taking;
            if remaining > 0 {
                guard.countdown = Some(spawn_countdown(
                    Arc::downgrade(inner),
                    Arc::clone(ledger),
                    passing_score,
                ));
            }
            Err(err)
        }
    }
}

/// One cooperative tick per second. The task holds only a weak reference:
/// a dropped (abandoned) session stops the countdown instead of being
/// force-submitted, and a tick that finds the machine out of `Taking` is a
/// stale timer and exits.
fn spawn_countdown(
    session: Weak<Mutex<Inner>>,
    ledger: Arc<dyn AttemptLedger>,
    passing_score: u8,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticks = interval_at(Instant::now() + TICK, TICK);
        ticks.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            ticks.tick().await;

            let Some(inner) = session.upgrade() else {
                break;
            };
            let mut guard = inner.lock().await;
            if guard.state != SessionState::Taking {
                break;
            }

            guard.remaining_seconds = guard.remaining_seconds.saturating_sub(1);
            if guard.remaining_seconds > 0 {
                continue;
            }

            drop(guard);
            log::info!("countdown expired, forcing submission");
            let _ = submit(&inner, &ledger, passing_score, SubmitTrigger::Timeout).await;
            break;
        }
    })
}
