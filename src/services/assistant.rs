//! General chat: answers to anything that is not part of a report.

use crate::model::{ChatMessage, Sender};
use crate::report::parse::normalize;

use super::ServiceError;

/// Replies to the latest user turn given the whole history.
pub trait Assistant {
    fn respond(&self, history: &[ChatMessage]) -> Result<String, ServiceError>;
}

/// Keyword-driven assistant that works without a network.
#[derive(Debug, Clone, Copy, Default)]
pub struct OfflineAssistant;

impl Assistant for OfflineAssistant {
    fn respond(&self, history: &[ChatMessage]) -> Result<String, ServiceError> {
        let Some(last) = history.last() else {
            return Ok(GREETING.to_string());
        };
        if last.sender != Sender::User {
            return Err(ServiceError::Assistant(
                "history does not end with a user turn".to_string(),
            ));
        }
        let text = normalize(&last.text);
        let has = |words: &[&str]| words.iter().any(|w| text.contains(w));

        let reply = if has(&["hola", "buenas", "buenos dias"]) {
            GREETING
        } else if has(&["cebo", "carnada", "senuelo"]) {
            "Para lubina y dorada funcionan bien la gamba viva y el gusano coreano; \
             con mar movido, prueba señuelos de superficie al amanecer."
        } else if has(&["marea", "mareas"]) {
            "Las mejores horas suelen ser las dos anteriores y posteriores a la pleamar."
        } else if has(&["talla", "minima", "medida"]) {
            "Respeta siempre las tallas mínimas de tu comunidad: por ejemplo, 36 cm para la \
             lubina y 20 cm para la dorada en aguas del Mediterráneo."
        } else {
            HELP
        };
        Ok(reply.to_string())
    }
}

const GREETING: &str = "¡Hola! Soy tu asistente de pesca. Cuéntame tu jornada \
    (por ejemplo «nuevo parte: ayer pesqué 3 lubinas desde la orilla») y la registro por ti.";

const HELP: &str = "Puedo registrar tus partes de pesca: di «nuevo parte» o cuéntame qué \
    capturaste. También puedes preguntarme por cebos, mareas o tallas mínimas.";
