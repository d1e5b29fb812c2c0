//! Juka configuration.
//!
//! Loaded from `~/.juka/config.toml`. Every key is optional; a missing file
//! means defaults.

use std::path::{Path, PathBuf};
use std::{fs, io};

use serde::{Deserialize, Serialize};

use crate::conversation::Settings;
use crate::services::SpeechSettings;

/// Juka configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct Config {
    /// The angler reports are filed under when `--user` and `JUKA_USER`
    /// are not set.
    pub user_id: Option<String>,

    /// Extracted details below this confidence (0.0 to 1.0) are ignored.
    pub min_confidence: f32,

    /// Photo guesses at or above this percentage fill in the species.
    pub photo_confidence: u8,

    /// Chat messages of context given to the assistant.
    pub history_limit: usize,

    pub speech: SpeechSettings,
}

impl Default for Config {
    fn default() -> Self {
        let settings = Settings::default();
        Self {
            user_id: None,
            min_confidence: settings.min_confidence,
            photo_confidence: settings.photo_confidence,
            history_limit: settings.history_limit,
            speech: settings.speech,
        }
    }
}

impl Config {
    /// Load config from `~/.juka/config.toml`.
    pub fn load() -> Result<Self, String> {
        match Self::path() {
            Some(path) => Self::load_from(&path),
            None => Ok(Self::default()),
        }
    }

    /// Load config from `path`. A missing file yields the defaults.
    pub fn load_from(path: &Path) -> Result<Self, String> {
        let contents = match fs::read_to_string(path) {
            Ok(s) => s,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Self::default()),
            Err(e) => return Err(format!("failed to read {}: {e}", path.display())),
        };

        let config: Self = toml::from_str(&contents)
            .map_err(|e| format!("invalid config at {}: {e}", path.display()))?;

        if !(0.0..=1.0).contains(&config.min_confidence) {
            return Err(format!(
                "min-confidence must be between 0 and 1 in {}",
                path.display()
            ));
        }
        if config.photo_confidence > 100 {
            return Err(format!(
                "photo-confidence must be a percentage in {}",
                path.display()
            ));
        }

        Ok(config)
    }

    /// The config file path: `~/.juka/config.toml`.
    pub fn path() -> Option<PathBuf> {
        dirs::home_dir().map(|h| h.join(".juka").join("config.toml"))
    }

    /// Conversation settings derived from this config.
    pub fn settings(&self) -> Settings {
        Settings {
            min_confidence: self.min_confidence,
            photo_confidence: self.photo_confidence,
            history_limit: self.history_limit,
            speech: self.speech.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use tempfile::TempDir;

    #[test]
    fn missing_file_gives_defaults() {
        let dir = TempDir::new().unwrap();
        let config = Config::load_from(&dir.path().join("config.toml")).unwrap();
        assert_eq!(config, Config::default());
        assert_eq!(config.settings(), Settings::default());
    }

    #[test]
    fn reads_kebab_case_keys() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(
            &path,
            "user-id = \"marina\"\n\
             min-confidence = 0.7\n\
             history-limit = 5\n\
             \n\
             [speech]\n\
             locale = \"es-MX\"\n\
             complete-silence-ms = 3000\n",
        )
        .unwrap();

        let config = Config::load_from(&path).unwrap();
        assert_eq!(config.user_id.as_deref(), Some("marina"));
        assert!((config.min_confidence - 0.7).abs() < f32::EPSILON);
        assert_eq!(config.history_limit, 5);
        assert_eq!(config.photo_confidence, 60);
        assert_eq!(config.speech.locale, "es-MX");
        assert_eq!(config.speech.complete_silence_ms, 3_000);
        assert_eq!(config.speech.minimum_length_ms, 1_500);
    }

    #[test]
    fn rejects_out_of_range_confidence() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(&path, "min-confidence = 1.5\n").unwrap();

        let err = Config::load_from(&path).unwrap_err();
        assert!(err.contains("min-confidence"));
    }

    #[test]
    fn rejects_malformed_toml() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(&path, "user-id = \n").unwrap();

        let err = Config::load_from(&path).unwrap_err();
        assert!(err.starts_with("invalid config at"));
    }
}
