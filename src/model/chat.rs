//! Chat types: the transcript of a conversation with the assistant.

use jiff::Timestamp;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::trip::TripReport;

/// Who wrote a chat message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Sender {
    User,
    Assistant,
}

impl Sender {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::User => "user",
            Self::Assistant => "assistant",
        }
    }
}

/// A single chat line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatMessage {
    pub id: Uuid,
    pub sender: Sender,
    pub text: String,
    pub sent_at: Timestamp,
}

impl ChatMessage {
    pub fn user(text: impl Into<String>) -> Self {
        Self::new(Sender::User, text)
    }

    pub fn assistant(text: impl Into<String>) -> Self {
        Self::new(Sender::Assistant, text)
    }

    fn new(sender: Sender, text: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            sender,
            text: text.into(),
            sent_at: Timestamp::now(),
        }
    }
}

/// A report read back together with the conversation that produced it.
///
/// Derived on read; never stored on its own.
#[derive(Debug, Clone)]
pub struct TripReportWithChat {
    pub report: TripReport,
    pub messages: Vec<ChatMessage>,
}

impl TripReportWithChat {
    pub fn has_chat(&self) -> bool {
        !self.messages.is_empty()
    }
}
