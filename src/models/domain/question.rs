use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, Deserialize, Serialize)]
pub struct Question {
    pub id: String,
    pub quiz_id: String,
    pub text: String,
    pub question_type: QuestionType,
    pub points: u32,
    pub order_index: i16, // unique within a quiz, presentation order
    pub options: Vec<QuestionOption>,
}

#[derive(Clone, Debug, PartialEq, Eq, Deserialize, Serialize)]
pub struct QuestionOption {
    pub id: String,
    pub text: String,
    pub is_correct: bool,
    pub order_index: i16,
}

#[derive(Clone, Debug, PartialEq, Eq, Deserialize, Serialize, Copy)]
pub enum QuestionType {
    MultipleChoice,
    TrueFalse, // exactly two options on the authoring side
}

impl Question {
    /// The single option flagged correct. Authoring is expected to flag
    /// exactly one; a malformed question simply yields `None` and grades
    /// to zero.
    pub fn correct_option(&self) -> Option<&QuestionOption> {
        self.options.iter().find(|o| o.is_correct)
    }
}
