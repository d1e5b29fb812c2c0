//! The chat: general assistance, or assembling a trip report.
//!
//! A conversation is in one of two modes. In general mode every turn goes
//! to the [`Assistant`]; a message that talks about a fishing trip opens a
//! [`ReportSession`] and switches to report mode, where turns answer the
//! open field until the report is submitted or cancelled. Nothing is
//! persisted until a submit succeeds.

use std::fmt::Write as _;
use std::path::Path;

use jiff::civil::Date;
use jiff::{Timestamp, Zoned};
use tracing::{debug, info, warn};

use crate::achievements;
use crate::model::{Achievement, ChatMessage, TripReport};
use crate::report::parse::{normalize, parse_catches, tokens};
use crate::report::{ReportError, ReportField, ReportSession, Step};
use crate::services::{
    Assistant, Entity, EntityExtractor, ServiceError, SpeciesClassifier, SpeechSettings,
    SpeechToText,
};
use crate::storage::Store;

/// Phrases that open a report from general chat.
const REPORT_INTENTS: &[&str] = &[
    "nuevo parte",
    "parte de pesca",
    "registrar",
    "he pescado",
    "pesque",
    "capture",
    "he capturado",
    "he sacado",
];
const CANCEL: &[&str] = &["cancelar", "cancela", "descartar"];
const SUBMIT: &[&str] = &["enviar", "envialo", "guardar", "guardalo", "confirmar"];

/// The collaborators a conversation talks to.
#[derive(Clone, Copy)]
pub struct Services<'a> {
    pub store: &'a dyn Store,
    pub extractor: &'a dyn EntityExtractor,
    pub assistant: &'a dyn Assistant,
    pub speech: &'a dyn SpeechToText,
    pub classifier: &'a dyn SpeciesClassifier,
}

/// Tunables for a conversation.
#[derive(Debug, Clone, PartialEq)]
pub struct Settings {
    /// Entities below this confidence are not used to fill fields.
    pub min_confidence: f32,
    /// Photo guesses at or above this percentage seed the species.
    pub photo_confidence: u8,
    /// Messages of context handed to the assistant.
    pub history_limit: usize,
    pub speech: SpeechSettings,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            min_confidence: 0.5,
            photo_confidence: 60,
            history_limit: 20,
            speech: SpeechSettings::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Mode {
    General,
    Report(ReportSession),
}

/// Why a report could not be submitted.
#[derive(Debug, thiserror::Error)]
pub enum SubmitError {
    #[error("no report in progress")]
    NoReport,

    #[error(transparent)]
    Incomplete(#[from] ReportError),

    #[error(transparent)]
    Service(#[from] ServiceError),
}

impl SubmitError {
    pub fn user_message(&self) -> String {
        match self {
            Self::NoReport => "No hay ningún parte en curso.".to_string(),
            Self::Incomplete(e) => e.to_string(),
            Self::Service(e) => e.user_message(),
        }
    }
}

/// A stored report and the achievements it unlocked.
#[derive(Debug, Clone)]
pub struct Submitted {
    pub report: TripReport,
    pub unlocked: Vec<&'static Achievement>,
}

impl Submitted {
    /// Confirmation shown to the user.
    pub fn message(&self) -> String {
        let mut message = format!(
            "Parte guardado: {} capturas el {}.",
            self.report.total_count, self.report.date
        );
        for achievement in &self.unlocked {
            let _ = write!(message, "\n🏆 Logro desbloqueado: {}", achievement.title);
        }
        message
    }
}

pub struct Conversation<'a> {
    user_id: String,
    services: Services<'a>,
    settings: Settings,
    messages: Vec<ChatMessage>,
    /// Index of the message that opened the current report.
    report_start: usize,
    mode: Mode,
    today: Option<Date>,
}

impl<'a> Conversation<'a> {
    pub fn new(user_id: impl Into<String>, services: Services<'a>, settings: Settings) -> Self {
        Self {
            user_id: user_id.into(),
            services,
            settings,
            messages: Vec::new(),
            report_start: 0,
            mode: Mode::General,
            today: None,
        }
    }

    /// Pins the date relative dates are read against.
    #[cfg(test)]
    #[must_use]
    pub fn with_today(mut self, today: Date) -> Self {
        self.today = Some(today);
        self
    }

    #[cfg(test)]
    pub fn mode(&self) -> &Mode {
        &self.mode
    }

    #[cfg(test)]
    pub fn messages(&self) -> &[ChatMessage] {
        &self.messages
    }

    /// The report in progress, if any.
    pub fn session(&self) -> Option<&ReportSession> {
        match &self.mode {
            Mode::Report(session) => Some(session),
            Mode::General => None,
        }
    }

    /// Handles a typed message and returns the assistant's reply.
    pub fn send(&mut self, text: &str) -> String {
        let text = text.trim();
        self.messages.push(ChatMessage::user(text));
        let reply = match self.mode {
            Mode::General => self.general_turn(text),
            Mode::Report(_) => self.report_turn(text),
        };
        self.reply(reply)
    }

    /// Transcribes a voice note and handles it as if it had been typed.
    ///
    /// A failed transcription changes nothing but the reply.
    pub fn send_voice(&mut self, audio: &Path) -> String {
        match self.services.speech.transcribe(audio, &self.settings.speech) {
            Ok(transcript) => {
                debug!(chars = transcript.len(), "voice note transcribed");
                let reply = self.send(&transcript);
                if let Mode::Report(session) = &mut self.mode {
                    let full = match &session.draft().transcript {
                        Some(previous) => format!("{previous} {transcript}"),
                        None => transcript,
                    };
                    session.set_transcript(full);
                }
                reply
            }
            Err(e) => {
                warn!(error = %e, "voice note failed");
                self.reply(e.user_message().to_string())
            }
        }
    }

    /// Identifies the species in a photo. During a report the photo is
    /// attached and a confident guess fills in the species.
    pub fn attach_photo(&mut self, image: &Path) -> String {
        let guess = match self.services.classifier.classify(image) {
            Ok(guess) => guess,
            Err(e) => {
                warn!(error = %e, "photo classification failed");
                return self.reply(e.user_message());
            }
        };
        self.messages
            .push(ChatMessage::user(format!("[foto] {}", image.display())));

        let identified = if guess.is_known() {
            format!(
                "Parece {} (confianza {}%).",
                guess.species,
                guess.confidence()
            )
        } else {
            "No he podido identificar la especie.".to_string()
        };
        let confident = guess.is_known() && guess.confidence() >= self.settings.photo_confidence;

        let reply = match &mut self.mode {
            Mode::General => identified,
            Mode::Report(session) => {
                session.add_photo(image.display().to_string());
                let seeded = confident && session.suggest_species(&guess.species);
                let mut reply = format!("Foto añadida al parte. {identified}");
                if seeded {
                    reply.push_str(" La apunto como especie capturada.");
                }
                format!("{reply}\n{}", session.prompt())
            }
        };
        self.reply(reply)
    }

    /// Opens a field of the report for editing.
    pub fn select_field(&mut self, field: ReportField) -> String {
        let reply = match &mut self.mode {
            Mode::Report(session) => {
                session.select_field(field);
                session.prompt()
            }
            Mode::General => SubmitError::NoReport.user_message(),
        };
        self.reply(reply)
    }

    /// Drops the report in progress without storing anything.
    pub fn cancel_report(&mut self) -> bool {
        let cancelled = matches!(self.mode, Mode::Report(_));
        if cancelled {
            info!(user_id = %self.user_id, "report cancelled");
        }
        self.mode = Mode::General;
        cancelled
    }

    /// Stores the report in progress with its chat.
    ///
    /// On failure the session is kept so the submit can be retried.
    pub fn submit_report(&mut self) -> Result<Submitted, SubmitError> {
        let Mode::Report(session) = &self.mode else {
            return Err(SubmitError::NoReport);
        };
        let now = Timestamp::now();
        let report = session.complete(&self.user_id, now)?;
        let chat = &self.messages[self.report_start.min(self.messages.len())..];
        self.services
            .store
            .save_report(&report, chat)
            .map_err(ServiceError::from)?;

        info!(id = %report.id, total = report.total_count, "report submitted");
        self.mode = Mode::General;

        let unlocked = achievements::refresh(self.services.store, &self.user_id, now)
            .unwrap_or_else(|e| {
                warn!(error = %e, "achievements not refreshed");
                Vec::new()
            });
        Ok(Submitted { report, unlocked })
    }

    fn today(&self) -> Date {
        self.today.unwrap_or_else(|| Zoned::now().date())
    }

    fn reply(&mut self, text: String) -> String {
        self.messages.push(ChatMessage::assistant(text.clone()));
        text
    }

    fn extract(&self, text: &str) -> Result<Vec<Entity>, ServiceError> {
        self.services.extractor.extract(text, self.today())
    }

    fn general_turn(&mut self, text: &str) -> String {
        if !is_report_intent(text) {
            let start = self
                .messages
                .len()
                .saturating_sub(self.settings.history_limit);
            return match self.services.assistant.respond(&self.messages[start..]) {
                Ok(reply) => reply,
                Err(e) => {
                    warn!(error = %e, "assistant failed");
                    e.user_message()
                }
            };
        }

        let (entities, notice) = match self.extract(text) {
            Ok(entities) => (entities, None),
            Err(e) => {
                warn!(error = %e, "entity extraction failed");
                (Vec::new(), Some(e.user_message()))
            }
        };
        let session = ReportSession::start(&entities, self.today(), self.settings.min_confidence);
        let prompt = session.prompt();
        info!(user_id = %self.user_id, entities = entities.len(), "report started");

        self.report_start = self.messages.len() - 1;
        self.mode = Mode::Report(session);
        match notice {
            Some(notice) => format!("{notice}\n{prompt}"),
            None => format!("¡Vamos a registrar tu parte!\n{prompt}"),
        }
    }

    fn report_turn(&mut self, text: &str) -> String {
        let command = normalize(text.trim_end_matches(['.', '!']));
        if CANCEL.contains(&command.as_str()) {
            self.cancel_report();
            return "Parte cancelado. No se ha guardado nada.".to_string();
        }
        if SUBMIT.contains(&command.as_str()) {
            return match self.submit_report() {
                Ok(submitted) => submitted.message(),
                Err(SubmitError::Incomplete(e)) => match self.session() {
                    Some(session) => format!("{e}\n{}", session.prompt()),
                    None => e.to_string(),
                },
                Err(e) => e.user_message(),
            };
        }

        let hints = self.extract(text).unwrap_or_else(|e| {
            warn!(error = %e, "entity extraction failed");
            Vec::new()
        });
        let Mode::Report(session) = &mut self.mode else {
            return SubmitError::NoReport.user_message();
        };
        match session.answer(text, &hints) {
            Ok(Step::Next(_) | Step::Ready) => session.prompt(),
            Err(e) => {
                debug!(error = %e, field = ?e.field(), "answer rejected");
                format!("{e}\n{}", session.prompt())
            }
        }
    }
}

/// Whether a general-chat message talks about logging a trip. Intent
/// phrases must appear as whole words.
fn is_report_intent(text: &str) -> bool {
    let normalized = normalize(text);
    let words = tokens(&normalized);
    REPORT_INTENTS.iter().any(|phrase| {
        let phrase: Vec<&str> = phrase.split(' ').collect();
        words.windows(phrase.len()).any(|w| w == phrase.as_slice())
    }) || parse_catches(text).iter().any(|c| c.count.is_some())
}
