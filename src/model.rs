//! Core data model for Juka.
//!
//! Questionnaire questions and answers, trip reports and their catches,
//! chat transcripts, and collectible achievements.

mod achievement;
mod chat;
mod survey;
mod trip;

pub use achievement::{Achievement, UnlockedAchievement};
pub use chat::{ChatMessage, Sender, TripReportWithChat};
pub use survey::{Answer, AnswerValue, Question, QuestionKind};
pub use trip::{
    Catch, Location, MAX_CATCH_COUNT, STATUS_COMPLETED, TripError, TripReport, TripType,
    minutes_between,
};
