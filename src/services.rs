//! Collaborators outside the conversation: speech recognition, entity
//! extraction, species identification, and the general-chat assistant.
//!
//! Each is a trait so the conversation can be driven by local stand-ins or
//! by real vendor services. Failures are converted into [`ServiceError`] at
//! this boundary and never leave conversation state half-updated.

mod assistant;
mod classifier;
mod entities;
mod speech;

use crate::storage::StorageError;

pub use assistant::{Assistant, OfflineAssistant};
pub use classifier::{FileNameClassifier, SpeciesClassifier};
pub use entities::{Entity, EntityExtractor, EntityKind, RuleExtractor};
pub use speech::{SpeechError, SpeechSettings, SpeechToText, TranscriptFileRecognizer};

/// A failed call to an external collaborator.
#[derive(Debug, thiserror::Error)]
pub enum ServiceError {
    #[error("store error: {0}")]
    Store(#[from] StorageError),

    #[error("speech recognition failed: {0}")]
    Speech(#[from] SpeechError),

    #[error("entity extraction failed: {0}")]
    Extraction(String),

    #[error("species classification failed: {0}")]
    Classifier(String),

    #[error("assistant unavailable: {0}")]
    Assistant(String),
}

impl ServiceError {
    /// Message shown to the angler. The action can be retried as is.
    pub fn user_message(&self) -> String {
        match self {
            Self::Store(_) => {
                "No he podido guardar los datos. Vuelve a intentarlo.".to_string()
            }
            Self::Speech(e) => e.user_message().to_string(),
            Self::Extraction(_) => {
                "No he podido analizar el mensaje; seguimos paso a paso.".to_string()
            }
            Self::Classifier(_) => "No he podido analizar la foto.".to_string(),
            Self::Assistant(_) => {
                "El asistente no está disponible ahora mismo.".to_string()
            }
        }
    }
}
