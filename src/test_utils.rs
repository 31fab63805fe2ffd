pub mod fixtures {
    use crate::models::domain::{Question, QuestionOption, QuestionType, Quiz};

    /// A 30-minute quiz on course-1 with the given passing bar.
    pub fn quiz(passing_score: u8) -> Quiz {
        let mut quiz = Quiz::new("course-1", "Forklift Safety", 30, passing_score);
        quiz.id = "quiz-1".to_string();
        quiz
    }

    /// Multiple-choice question with one correct option (`{id}-right`) and
    /// two distractors.
    pub fn multiple_choice(id: &str, points: u32, order_index: i16) -> Question {
        Question {
            id: id.to_string(),
            quiz_id: "quiz-1".to_string(),
            text: format!("Question {}", id),
            question_type: QuestionType::MultipleChoice,
            points,
            order_index,
            options: vec![
                option(&format!("{}-right", id), true, 1),
                option(&format!("{}-wrong-1", id), false, 2),
                option(&format!("{}-wrong-2", id), false, 3),
            ],
        }
    }

    /// True/false question; `{id}-true` is the correct option.
    pub fn true_false(id: &str, points: u32, order_index: i16) -> Question {
        Question {
            id: id.to_string(),
            quiz_id: "quiz-1".to_string(),
            text: format!("Statement {}", id),
            question_type: QuestionType::TrueFalse,
            points,
            order_index,
            options: vec![
                option(&format!("{}-true", id), true, 1),
                option(&format!("{}-false", id), false, 2),
            ],
        }
    }

    fn option(id: &str, is_correct: bool, order_index: i16) -> QuestionOption {
        QuestionOption {
            id: id.to_string(),
            text: format!("option {}", id),
            is_correct,
            order_index,
        }
    }
}
