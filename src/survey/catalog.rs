//! The canonical questionnaire and its structural checks.

use std::collections::HashSet;

use crate::model::{Question, QuestionKind};

/// A question list that cannot drive a survey.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CatalogError {
    #[error("the question list is empty")]
    Empty,

    #[error("question at position {position} has id {id}")]
    IdOutOfPlace { position: usize, id: u32 },

    #[error("question id {0} appears more than once")]
    DuplicateId(u32),

    #[error("choice question {0} has no options")]
    MissingOptions(u32),
}

/// Checks that ids are unique 1-based positions and that choice questions
/// offer options.
pub fn check(questions: &[Question]) -> Result<(), CatalogError> {
    if questions.is_empty() {
        return Err(CatalogError::Empty);
    }
    let mut seen = HashSet::new();
    for (index, question) in questions.iter().enumerate() {
        if !seen.insert(question.id) {
            return Err(CatalogError::DuplicateId(question.id));
        }
        let position = index + 1;
        if usize::try_from(question.id).ok() != Some(position) {
            return Err(CatalogError::IdOutOfPlace {
                position,
                id: question.id,
            });
        }
        if question.kind.is_choice() && question.options.is_empty() {
            return Err(CatalogError::MissingOptions(question.id));
        }
    }
    Ok(())
}

/// The fixed questionnaire shown to every angler.
pub fn canonical_questions() -> Vec<Question> {
    vec![
        choice(
            1,
            "¿Con qué frecuencia sales a pescar?",
            QuestionKind::SingleChoice,
            &[
                "Varias veces por semana",
                "Una vez por semana",
                "Una vez al mes",
                "Ocasionalmente",
            ],
        ),
        choice(
            2,
            "¿Qué modalidades de pesca practicas?",
            QuestionKind::MultipleChoice,
            &["Desde orilla", "Embarcación", "Kayak", "Submarina", "Mosca"],
        ),
        choice(
            3,
            "¿Cuántos años llevas pescando?",
            QuestionKind::SingleChoice,
            &["Menos de 1", "Entre 1 y 5", "Entre 5 y 10", "Más de 10"],
        ),
        plain(
            4,
            "¿Cómo valoras la facilidad para registrar un parte de pesca?",
            QuestionKind::Scale,
            "1 = muy difícil, 5 = muy fácil",
        ),
        plain(
            5,
            "¿Te resulta útil el asistente de chat?",
            QuestionKind::YesNo,
            "",
        ),
        plain(
            6,
            "¿Qué especies capturas con más frecuencia?",
            QuestionKind::FreeText,
            "Ej.: lubina, dorada, sargo",
        ),
        plain(
            7,
            "¿Cómo valoras la identificación de especies por foto?",
            QuestionKind::Scale,
            "1 = nada útil, 5 = muy útil",
        ),
        choice(
            8,
            "¿Qué funciones usas más?",
            QuestionKind::MultipleChoice,
            &[
                "Partes de pesca",
                "Chat con el asistente",
                "Identificación por foto",
                "Logros",
            ],
        ),
        plain(
            9,
            "¿Recomendarías la aplicación a otros pescadores?",
            QuestionKind::YesNo,
            "",
        ),
        Question {
            mandatory: false,
            ..plain(
                10,
                "¿Qué mejorarías de la aplicación?",
                QuestionKind::FreeText,
                "Cuéntanos lo que quieras (opcional)",
            )
        },
    ]
}

fn choice(id: u32, text: &str, kind: QuestionKind, options: &[&str]) -> Question {
    Question {
        id,
        text: text.to_string(),
        kind,
        options: options.iter().map(ToString::to_string).collect(),
        mandatory: true,
        placeholder: String::new(),
    }
}

fn plain(id: u32, text: &str, kind: QuestionKind, placeholder: &str) -> Question {
    Question {
        id,
        text: text.to_string(),
        kind,
        options: Vec::new(),
        mandatory: true,
        placeholder: placeholder.to_string(),
    }
}
