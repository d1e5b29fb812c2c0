//! Survey progress: position, recorded answers, and navigation.
//!
//! Positions run from 0 to `total`; position `total` means complete.
//! Whether the answer at the current position is good enough to move on is
//! the caller's decision; this type only tracks where the user is.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::model::Answer;

/// Navigation or recording not allowed from the current state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum ProgressError {
    #[error("survey is already complete")]
    Completed,

    #[error("already at the first question")]
    AtStart,
}

/// Completion percentage for a position: `round(index / total * 100)`.
///
/// Positions past the end count as complete. An empty questionnaire is
/// complete from the start.
pub fn progress_percent(index: usize, total: usize) -> u8 {
    if total == 0 {
        return 100;
    }
    let index = index.min(total);
    // Integer rounding of index * 100 / total, halves rounded up.
    let percent = (index * 200 + total) / (total * 2);
    u8::try_from(percent).unwrap_or(100)
}

/// Where one user stands in one run of the questionnaire.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SurveyProgress {
    current: usize,
    total: usize,
    answers: BTreeMap<u32, Answer>,
    completed: bool,
}

impl SurveyProgress {
    pub fn new(total: usize) -> Self {
        Self {
            current: 0,
            total,
            answers: BTreeMap::new(),
            completed: total == 0,
        }
    }

    /// Index of the question being shown.
    pub fn current(&self) -> usize {
        self.current
    }

    pub fn total(&self) -> usize {
        self.total
    }

    pub fn answers(&self) -> &BTreeMap<u32, Answer> {
        &self.answers
    }

    pub fn answer_for(&self, question_id: u32) -> Option<&Answer> {
        self.answers.get(&question_id)
    }

    pub fn is_completed(&self) -> bool {
        self.completed
    }

    pub fn can_go_forward(&self) -> bool {
        self.current < self.total
    }

    pub fn can_go_back(&self) -> bool {
        self.current > 0
    }

    pub fn percent(&self) -> u8 {
        progress_percent(self.current, self.total)
    }

    /// Stores an answer, replacing any earlier one for the same question.
    ///
    /// Does not move the position. Rejected once the survey is complete.
    pub fn record(&mut self, answer: Answer) -> Result<(), ProgressError> {
        if self.completed {
            return Err(ProgressError::Completed);
        }
        self.answers.insert(answer.question_id, answer);
        Ok(())
    }

    /// Moves to the next question, completing the survey past the last one.
    pub fn advance(&mut self) -> Result<(), ProgressError> {
        if !self.can_go_forward() {
            return Err(ProgressError::Completed);
        }
        self.current += 1;
        self.completed = self.current == self.total;
        Ok(())
    }

    /// Moves to the previous question. Leaves the completed state.
    pub fn retreat(&mut self) -> Result<(), ProgressError> {
        if !self.can_go_back() {
            return Err(ProgressError::AtStart);
        }
        self.current -= 1;
        self.completed = false;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use crate::model::AnswerValue;

    #[test]
    fn percent_bounds() {
        assert_eq!(progress_percent(0, 10), 0);
        assert_eq!(progress_percent(10, 10), 100);
        assert_eq!(progress_percent(0, 3), 0);
        assert_eq!(progress_percent(3, 3), 100);
    }

    #[test]
    fn percent_rounds_to_nearest() {
        assert_eq!(progress_percent(1, 3), 33);
        assert_eq!(progress_percent(2, 3), 67);
        assert_eq!(progress_percent(1, 8), 13); // 12.5 rounds up
        assert_eq!(progress_percent(5, 10), 50);
    }

    #[test]
    fn percent_is_monotonic_and_bounded() {
        let mut progress = SurveyProgress::new(7);
        let mut last = progress.percent();
        while progress.advance().is_ok() {
            let now = progress.percent();
            assert!(now >= last);
            assert!(now <= 100);
            last = now;
        }
        assert_eq!(last, 100);
        while progress.retreat().is_ok() {
            let now = progress.percent();
            assert!(now <= last);
            last = now;
        }
        assert_eq!(last, 0);
    }

    #[test]
    fn advancing_to_the_end_completes() {
        let mut progress = SurveyProgress::new(2);
        progress.advance().unwrap();
        assert!(!progress.is_completed());
        progress.advance().unwrap();
        assert!(progress.is_completed());
        assert!(!progress.can_go_forward());
        assert_eq!(progress.advance(), Err(ProgressError::Completed));
    }

    #[test]
    fn retreat_clears_completion() {
        let mut progress = SurveyProgress::new(1);
        progress.advance().unwrap();
        progress.retreat().unwrap();
        assert!(!progress.is_completed());
        assert_eq!(progress.current(), 0);
        assert_eq!(progress.retreat(), Err(ProgressError::AtStart));
    }

    #[test]
    fn re_recording_replaces_without_moving() {
        let mut progress = SurveyProgress::new(10);
        progress.record(Answer::new(3, AnswerValue::SingleChoice("Entre 1 y 5".into()))).unwrap();
        for _ in 0..4 {
            progress.advance().unwrap();
        }
        progress.record(Answer::new(3, AnswerValue::SingleChoice("Más de 10".into()))).unwrap();

        assert_eq!(progress.current(), 4);
        assert_eq!(progress.answers().len(), 1);
        assert_eq!(
            progress.answer_for(3).unwrap().value,
            AnswerValue::SingleChoice("Más de 10".into())
        );
    }

    #[test]
    fn recording_after_completion_is_rejected() {
        let mut progress = SurveyProgress::new(1);
        progress.advance().unwrap();
        let err = progress
            .record(Answer::new(1, AnswerValue::YesNo(true)))
            .unwrap_err();
        assert_eq!(err, ProgressError::Completed);
    }
}
