//! Questionnaire engine.
//!
//! A survey walks an ordered list of questions. Each answer is validated
//! before the position moves forward; the whole answer set is validated
//! again before the survey is submitted.

mod catalog;
mod progress;
mod validate;

use std::collections::BTreeMap;

use tracing::debug;

use crate::model::{Answer, AnswerValue, Question};

pub use catalog::{CatalogError, canonical_questions, check as check_catalog};
pub use progress::{ProgressError, SurveyProgress};
pub use validate::{AnswerError, SCALE_RANGE, SurveyError, validate_answer, validate_survey};

/// Why a survey step was refused.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StepError {
    #[error(transparent)]
    Invalid(#[from] AnswerError),

    #[error(transparent)]
    Progress(#[from] ProgressError),
}

/// One user's run through a questionnaire.
#[derive(Debug, Clone)]
pub struct Survey {
    questions: Vec<Question>,
    progress: SurveyProgress,
}

impl Survey {
    /// Starts a survey over `questions`, rejecting a malformed list.
    pub fn new(questions: Vec<Question>) -> Result<Self, CatalogError> {
        check_catalog(&questions)?;
        let progress = SurveyProgress::new(questions.len());
        Ok(Self {
            questions,
            progress,
        })
    }

    /// Starts a survey over the canonical questionnaire.
    pub fn canonical() -> Result<Self, CatalogError> {
        Self::new(canonical_questions())
    }

    pub fn progress(&self) -> &SurveyProgress {
        &self.progress
    }

    /// The question at the current position, or `None` once complete.
    pub fn current_question(&self) -> Option<&Question> {
        if self.progress.is_completed() {
            return None;
        }
        self.questions.get(self.progress.current())
    }

    /// Answers the current question and moves on if the answer is valid.
    ///
    /// An invalid answer is not recorded and the position stays put.
    pub fn answer_current(&mut self, value: AnswerValue) -> Result<(), StepError> {
        let question = self
            .current_question()
            .ok_or(StepError::Progress(ProgressError::Completed))?;
        let answer = Answer::new(question.id, value);
        validate_answer(question, &answer)?;
        self.progress.record(answer)?;
        self.progress.advance()?;
        debug!(
            question = self.progress.current(),
            percent = self.progress.percent(),
            "survey advanced"
        );
        Ok(())
    }

    /// Moves past the current question without answering it.
    ///
    /// Only optional questions can be skipped.
    pub fn skip(&mut self) -> Result<(), StepError> {
        let question = self
            .current_question()
            .ok_or(StepError::Progress(ProgressError::Completed))?;
        if question.mandatory {
            return Err(AnswerError::missing(question.kind).into());
        }
        self.progress.advance()?;
        Ok(())
    }

    /// Returns to the previous question.
    pub fn back(&mut self) -> Result<(), ProgressError> {
        self.progress.retreat()
    }

    /// Validates the full answer set, returning it when the survey can be
    /// submitted.
    pub fn finish(&self) -> Result<&BTreeMap<u32, Answer>, SurveyError> {
        validate_survey(&self.questions, self.progress.answers())?;
        Ok(self.progress.answers())
    }
}
