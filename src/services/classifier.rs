//! Species identification from photos.

use std::path::Path;

use super::ServiceError;
use crate::report::parse;

/// Name given to photos the classifier cannot place.
pub const UNKNOWN_SPECIES: &str = "Desconocida";

/// A species guess and how sure the classifier is, in percent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpeciesGuess {
    pub species: String,
    confidence: u8,
}

impl SpeciesGuess {
    /// Builds a guess, clamping the confidence into 0..=100.
    pub fn new(species: impl Into<String>, confidence: i64) -> Self {
        Self {
            species: species.into(),
            confidence: u8::try_from(confidence.clamp(0, 100)).unwrap_or(0),
        }
    }

    pub fn confidence(&self) -> u8 {
        self.confidence
    }

    pub fn is_known(&self) -> bool {
        self.species != UNKNOWN_SPECIES
    }
}

/// Guesses the species shown in a photo.
///
/// Any confidence is a valid outcome; only an unreadable image is an error.
pub trait SpeciesClassifier {
    fn classify(&self, image: &Path) -> Result<SpeciesGuess, ServiceError>;
}

/// Stand-in classifier that reads the species from the photo's file name.
#[derive(Debug, Clone, Copy, Default)]
pub struct FileNameClassifier;

impl SpeciesClassifier for FileNameClassifier {
    fn classify(&self, image: &Path) -> Result<SpeciesGuess, ServiceError> {
        if !image.is_file() {
            return Err(ServiceError::Classifier(format!(
                "no such image: {}",
                image.display()
            )));
        }
        let stem = image
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default();
        Ok(match parse::known_species(&stem) {
            Some(species) => SpeciesGuess::new(species, 85),
            None => SpeciesGuess::new(UNKNOWN_SPECIES, 10),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::fs;

    use tempfile::TempDir;

    #[test]
    fn confidence_is_clamped() {
        assert_eq!(SpeciesGuess::new("Lubina", 140).confidence(), 100);
        assert_eq!(SpeciesGuess::new("Lubina", -3).confidence(), 0);
        assert_eq!(SpeciesGuess::new("Lubina", 42).confidence(), 42);
    }

    #[test]
    fn recognises_species_in_file_name() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("mi_dorada.jpg");
        fs::write(&path, b"jpeg").unwrap();

        let guess = FileNameClassifier.classify(&path).unwrap();
        assert_eq!(guess.species, "Dorada");
        assert!(guess.is_known());
    }

    #[test]
    fn unknown_photo_is_low_confidence_not_an_error() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("IMG_0001.jpg");
        fs::write(&path, b"jpeg").unwrap();

        let guess = FileNameClassifier.classify(&path).unwrap();
        assert!(!guess.is_known());
        assert!(guess.confidence() < 50);
    }

    #[test]
    fn missing_photo_is_an_error() {
        let err = FileNameClassifier
            .classify(Path::new("/nonexistent/lubina.jpg"))
            .unwrap_err();
        assert!(matches!(err, ServiceError::Classifier(_)));
    }
}
