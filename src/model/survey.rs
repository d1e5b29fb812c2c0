//! Survey types: questions and the answers given to them.

use jiff::Timestamp;
use serde::{Deserialize, Serialize};

/// A single question of the canonical questionnaire.
///
/// Loaded once at startup and never mutated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Question {
    /// 1-based position in the canonical list.
    pub id: u32,

    pub text: String,

    pub kind: QuestionKind,

    /// Choices offered to the user. Empty for non-choice kinds.
    pub options: Vec<String>,

    pub mandatory: bool,

    /// Hint shown in an empty input.
    pub placeholder: String,
}

/// What shape of answer a question expects.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum QuestionKind {
    FreeText,
    SingleChoice,
    MultipleChoice,
    /// Integer rating from 1 to 5.
    Scale,
    YesNo,
}

impl QuestionKind {
    /// Whether the question offers a fixed list of options.
    pub fn is_choice(self) -> bool {
        matches!(self, Self::SingleChoice | Self::MultipleChoice)
    }
}

/// The answer recorded for one question.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Answer {
    pub question_id: u32,
    pub value: AnswerValue,
    pub answered_at: Timestamp,
}

impl Answer {
    pub fn new(question_id: u32, value: AnswerValue) -> Self {
        Self {
            question_id,
            value,
            answered_at: Timestamp::now(),
        }
    }
}

/// Answer payload, one shape per [`QuestionKind`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "camelCase")]
pub enum AnswerValue {
    FreeText(String),
    SingleChoice(String),
    MultipleChoice(Vec<String>),
    Scale(i32),
    YesNo(bool),
}

impl AnswerValue {
    /// The question kind this payload answers.
    pub fn kind(&self) -> QuestionKind {
        match self {
            Self::FreeText(_) => QuestionKind::FreeText,
            Self::SingleChoice(_) => QuestionKind::SingleChoice,
            Self::MultipleChoice(_) => QuestionKind::MultipleChoice,
            Self::Scale(_) => QuestionKind::Scale,
            Self::YesNo(_) => QuestionKind::YesNo,
        }
    }
}
