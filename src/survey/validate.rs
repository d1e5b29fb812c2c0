//! Answer validation: one answer against its question, and a whole answer set
//! against the questionnaire.
//!
//! Every failure carries a single message: the most relevant problem, never
//! an aggregate.

use std::collections::BTreeMap;

use crate::model::{Answer, AnswerValue, Question, QuestionKind};

/// Why a single answer does not satisfy its question.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum AnswerError {
    #[error("Esta pregunta requiere una respuesta")]
    EmptyText,

    #[error("Debes seleccionar una opción")]
    NoOption,

    #[error("Debes seleccionar al menos una opción")]
    NoOptions,

    #[error("Debes elegir un valor entre 1 y 5")]
    ScaleOutOfRange,

    #[error("Debes responder sí o no")]
    NoYesNo,
}

impl AnswerError {
    /// The error reported when a question of `kind` has no usable payload.
    pub(crate) fn missing(kind: QuestionKind) -> Self {
        match kind {
            QuestionKind::FreeText => Self::EmptyText,
            QuestionKind::SingleChoice => Self::NoOption,
            QuestionKind::MultipleChoice => Self::NoOptions,
            QuestionKind::Scale => Self::ScaleOutOfRange,
            QuestionKind::YesNo => Self::NoYesNo,
        }
    }
}

/// Why an answer set does not complete the questionnaire.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SurveyError {
    #[error("Faltan {missing} preguntas obligatorias por responder")]
    MissingAnswers { missing: usize },

    #[error("Pregunta {question_id}: {source}")]
    InvalidAnswer {
        question_id: u32,
        source: AnswerError,
    },
}

/// Closed range accepted by scale questions.
pub const SCALE_RANGE: std::ops::RangeInclusive<i32> = 1..=5;

/// Validates one answer against its question.
///
/// Optional questions accept anything. A payload of the wrong kind counts as
/// no answer at all.
pub fn validate_answer(question: &Question, answer: &Answer) -> Result<(), AnswerError> {
    if !question.mandatory {
        return Ok(());
    }
    if answer.value.kind() != question.kind {
        return Err(AnswerError::missing(question.kind));
    }
    let valid = match &answer.value {
        AnswerValue::FreeText(text) | AnswerValue::SingleChoice(text) => !text.trim().is_empty(),
        AnswerValue::MultipleChoice(options) => !options.is_empty(),
        AnswerValue::Scale(value) => SCALE_RANGE.contains(value),
        AnswerValue::YesNo(_) => true,
    };
    if valid {
        Ok(())
    } else {
        Err(AnswerError::missing(question.kind))
    }
}

/// Validates a full answer set against the questionnaire.
///
/// Fails first on missing mandatory answers (reporting how many), then on the
/// first invalid mandatory answer in question order.
pub fn validate_survey(
    questions: &[Question],
    answers: &BTreeMap<u32, Answer>,
) -> Result<(), SurveyError> {
    let mandatory: Vec<&Question> = questions.iter().filter(|q| q.mandatory).collect();
    let answered = mandatory
        .iter()
        .filter(|q| answers.contains_key(&q.id))
        .count();
    if answered < mandatory.len() {
        return Err(SurveyError::MissingAnswers {
            missing: mandatory.len() - answered,
        });
    }

    for question in mandatory {
        if let Some(answer) = answers.get(&question.id) {
            validate_answer(question, answer).map_err(|source| SurveyError::InvalidAnswer {
                question_id: question.id,
                source,
            })?;
        }
    }
    Ok(())
}
