use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::models::domain::{AttemptAnswer, Question};

/// Result of grading one attempt. Deterministic for a given question set
/// and answer map, so any stored attempt can be re-derived for audit.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize, Serialize)]
pub struct GradedAttempt {
    pub score: u32,
    pub total_points: u32,
    pub percentage: u8,
    pub passed: bool,
    pub answers: Vec<AttemptAnswer>, // one per question, snapshot order
}

pub struct GradingService;

impl GradingService {
    /// Grade a buffered answer map against the authoritative question set.
    ///
    /// Every question counts toward the denominator whether answered or
    /// not; an unanswered question, an unknown option id, or an option not
    /// flagged correct all earn zero. Single-answer grading: the selected
    /// option's own `is_correct` flag decides.
    pub fn grade(
        questions: &[Question],
        selections: &HashMap<String, String>,
        passing_score: u8,
    ) -> GradedAttempt {
        let mut score: u32 = 0;
        let mut total_points: u32 = 0;
        let mut answers = Vec::with_capacity(questions.len());

        for question in questions {
            total_points += question.points;

            let selected = selections.get(&question.id);
            let is_correct = selected
                .map(|option_id| {
                    question
                        .options
                        .iter()
                        .any(|o| &o.id == option_id && o.is_correct)
                })
                .unwrap_or(false);
            let points_earned = if is_correct { question.points } else { 0 };
            score += points_earned;

            answers.push(AttemptAnswer {
                question_id: question.id.clone(),
                selected_option_id: selected.cloned(),
                is_correct,
                points_earned,
            });
        }

        let percentage = Self::percentage(score, total_points);

        GradedAttempt {
            score,
            total_points,
            percentage,
            passed: percentage >= passing_score,
            answers,
        }
    }

    /// Round-half-up integer percentage. A quiz with zero total points is a
    /// malformed definition and grades to 0 rather than dividing by zero.
    pub fn percentage(score: u32, total_points: u32) -> u8 {
        if total_points == 0 {
            return 0;
        }
        ((score as f64 / total_points as f64) * 100.0).round() as u8
    }
}
