//! Speech-to-text: turning a dictated trip into a transcript.

use std::path::Path;
use std::{fs, io};

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

/// Recogniser settings: language and silence thresholds.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct SpeechSettings {
    pub locale: String,

    /// Silence after which the utterance is considered finished.
    pub complete_silence_ms: u32,

    /// Minimum length of speech to attempt recognition.
    pub minimum_length_ms: u32,
}

impl Default for SpeechSettings {
    fn default() -> Self {
        Self {
            locale: "es-ES".to_string(),
            complete_silence_ms: 2_000,
            minimum_length_ms: 1_500,
        }
    }
}

/// Categorised recognition failures.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SpeechError {
    #[error("audio error")]
    Audio,

    #[error("no speech matched")]
    NoMatch,

    #[error("network error")]
    Network,

    #[error("recognition timed out")]
    Timeout,

    #[error("recogniser busy")]
    Busy,

    #[error("server error")]
    Server,

    #[error("permission denied")]
    Permission,

    #[error("unknown error: {0}")]
    Unknown(String),
}

impl SpeechError {
    /// Message shown to the angler.
    pub fn user_message(&self) -> &'static str {
        match self {
            Self::Audio => "No he podido leer el audio. Inténtalo de nuevo.",
            Self::NoMatch => "No he entendido lo que has dicho. ¿Puedes repetirlo?",
            Self::Network => "No hay conexión para reconocer la voz.",
            Self::Timeout => "No he oído nada. Pulsa el micrófono y habla cuando quieras.",
            Self::Busy => "El reconocimiento de voz está ocupado. Prueba en unos segundos.",
            Self::Server => "El servicio de voz ha fallado. Prueba más tarde.",
            Self::Permission => "Necesito permiso para usar el micrófono.",
            Self::Unknown(_) => "Ha ocurrido un error con el reconocimiento de voz.",
        }
    }
}

impl From<io::Error> for SpeechError {
    fn from(e: io::Error) -> Self {
        use io::ErrorKind as K;
        match e.kind() {
            K::PermissionDenied => Self::Permission,
            K::NotFound | K::InvalidData | K::UnexpectedEof => Self::Audio,
            K::TimedOut => Self::Timeout,
            K::WouldBlock | K::ResourceBusy => Self::Busy,
            K::ConnectionRefused
            | K::ConnectionReset
            | K::ConnectionAborted
            | K::NotConnected
            | K::NetworkUnreachable
            | K::HostUnreachable
            | K::NetworkDown => Self::Network,
            K::StaleNetworkFileHandle | K::BrokenPipe => Self::Server,
            _ => Self::Unknown(e.to_string()),
        }
    }
}

/// Produces one best-effort transcript per recording.
pub trait SpeechToText {
    fn transcribe(&self, audio: &Path, settings: &SpeechSettings) -> Result<String, SpeechError>;
}

/// Stand-in recogniser that reads an already transcribed text file.
#[derive(Debug, Clone, Copy, Default)]
pub struct TranscriptFileRecognizer;

impl SpeechToText for TranscriptFileRecognizer {
    fn transcribe(&self, audio: &Path, settings: &SpeechSettings) -> Result<String, SpeechError> {
        debug!(path = %audio.display(), locale = %settings.locale, "transcribing");
        let text = fs::read_to_string(audio).map_err(|e| {
            warn!(path = %audio.display(), error = %e, "transcript unreadable");
            SpeechError::from(e)
        })?;
        let text = text.split_whitespace().collect::<Vec<_>>().join(" ");
        if text.is_empty() {
            return Err(SpeechError::NoMatch);
        }
        Ok(text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use tempfile::TempDir;

    #[test]
    fn reads_and_tidies_transcript() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nota.txt");
        fs::write(&path, "  hoy pesqué\n 3 lubinas  ").unwrap();

        let text = TranscriptFileRecognizer
            .transcribe(&path, &SpeechSettings::default())
            .unwrap();
        assert_eq!(text, "hoy pesqué 3 lubinas");
    }

    #[test]
    fn empty_recording_is_no_match() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("silencio.txt");
        fs::write(&path, "   \n").unwrap();

        let err = TranscriptFileRecognizer
            .transcribe(&path, &SpeechSettings::default())
            .unwrap_err();
        assert_eq!(err, SpeechError::NoMatch);
    }

    #[test]
    fn io_failures_map_to_categories() {
        let category = |kind: io::ErrorKind| SpeechError::from(io::Error::from(kind));
        assert_eq!(category(io::ErrorKind::TimedOut), SpeechError::Timeout);
        assert_eq!(category(io::ErrorKind::ResourceBusy), SpeechError::Busy);
        assert_eq!(category(io::ErrorKind::ConnectionRefused), SpeechError::Network);
        assert_eq!(category(io::ErrorKind::StaleNetworkFileHandle), SpeechError::Server);
        assert_eq!(category(io::ErrorKind::PermissionDenied), SpeechError::Permission);
        assert!(matches!(category(io::ErrorKind::Other), SpeechError::Unknown(_)));
        assert_eq!(
            SpeechError::Busy.user_message(),
            "El reconocimiento de voz está ocupado. Prueba en unos segundos."
        );
    }

    #[test]
    fn missing_recording_is_audio_error() {
        let dir = TempDir::new().unwrap();
        let err = TranscriptFileRecognizer
            .transcribe(&dir.path().join("nada.txt"), &SpeechSettings::default())
            .unwrap_err();
        assert_eq!(err, SpeechError::Audio);
    }
}
