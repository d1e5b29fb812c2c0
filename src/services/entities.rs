//! Entity extraction: typed hints pulled out of free text.

use jiff::civil::Date;

use crate::report::parse;

use super::ServiceError;

/// What an extracted span of text refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntityKind {
    Date,
    StartTime,
    EndTime,
    /// A species, optionally preceded by its count ("3 lubinas").
    Species,
    TripType,
    Rods,
    Location,
}

/// A typed span with the extractor's confidence in it (0.0 to 1.0).
#[derive(Debug, Clone, PartialEq)]
pub struct Entity {
    pub kind: EntityKind,
    pub text: String,
    pub confidence: f32,
}

impl Entity {
    pub fn new(kind: EntityKind, text: impl Into<String>, confidence: f32) -> Self {
        Self {
            kind,
            text: text.into(),
            confidence,
        }
    }
}

/// Finds trip details in free text.
///
/// Callers must cope with an empty result and with low-confidence entities.
pub trait EntityExtractor {
    fn extract(&self, text: &str, today: Date) -> Result<Vec<Entity>, ServiceError>;
}

/// Longest message the rule extractor will scan, in characters.
pub const MAX_MESSAGE_CHARS: usize = 2_000;

/// Extractor built on the local Spanish parsers.
#[derive(Debug, Clone, Copy, Default)]
pub struct RuleExtractor;

impl EntityExtractor for RuleExtractor {
    fn extract(&self, text: &str, today: Date) -> Result<Vec<Entity>, ServiceError> {
        let chars = text.chars().count();
        if chars > MAX_MESSAGE_CHARS {
            return Err(ServiceError::Extraction(format!(
                "message of {chars} characters exceeds {MAX_MESSAGE_CHARS}"
            )));
        }
        let mut entities = Vec::new();

        if let Some(date) = parse::parse_date(text, today) {
            entities.push(Entity::new(EntityKind::Date, date.to_string(), 0.9));
        }
        let (start, end) = parse::parse_time_range(text);
        if let Some(start) = start {
            entities.push(Entity::new(
                EntityKind::StartTime,
                start.strftime("%H:%M").to_string(),
                0.8,
            ));
        }
        if let Some(end) = end {
            entities.push(Entity::new(
                EntityKind::EndTime,
                end.strftime("%H:%M").to_string(),
                0.8,
            ));
        }
        for catch in parse::parse_catches(text) {
            let text = match catch.count {
                Some(n) => format!("{n} {}", catch.species),
                None => catch.species,
            };
            entities.push(Entity::new(EntityKind::Species, text, 0.85));
        }
        if let Some(trip_type) = parse::parse_trip_type(text) {
            entities.push(Entity::new(EntityKind::TripType, trip_type.label(), 0.8));
        }
        if let Some(rods) = parse::parse_rods(text) {
            entities.push(Entity::new(EntityKind::Rods, format!("{rods} cañas"), 0.9));
        }
        if let Some(location) = parse::parse_location(text) {
            let confidence = if location.latitude.is_some() { 0.95 } else { 0.7 };
            entities.push(Entity::new(EntityKind::Location, location.name, confidence));
        }

        Ok(entities)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use jiff::civil::date;

    fn kinds(entities: &[Entity]) -> Vec<EntityKind> {
        entities.iter().map(|e| e.kind).collect()
    }

    #[test]
    fn extracts_everything_from_a_rich_message() {
        let entities = RuleExtractor
            .extract(
                "Ayer pesqué en Cabo de Palos desde la orilla de 7 a 11 con 2 cañas: 3 lubinas y una dorada",
                date(2024, 5, 11),
            )
            .unwrap();
        assert_eq!(
            kinds(&entities),
            vec![
                EntityKind::Date,
                EntityKind::StartTime,
                EntityKind::EndTime,
                EntityKind::Species,
                EntityKind::Species,
                EntityKind::TripType,
                EntityKind::Rods,
                EntityKind::Location,
            ]
        );
        assert_eq!(entities[0].text, "2024-05-10");
        assert_eq!(entities[3].text, "3 Lubina");
        assert_eq!(entities[4].text, "1 Dorada");
        assert_eq!(entities[7].text, "Cabo de Palos");
    }

    #[test]
    fn oversized_message_is_an_extraction_error() {
        let text = format!("he pescado 3 lubinas {}", "y ".repeat(MAX_MESSAGE_CHARS));
        let err = RuleExtractor.extract(&text, date(2024, 5, 11)).unwrap_err();
        assert!(matches!(err, ServiceError::Extraction(_)));
        assert_eq!(
            err.user_message(),
            "No he podido analizar el mensaje; seguimos paso a paso."
        );
    }

    #[test]
    fn plain_chat_yields_nothing() {
        let entities = RuleExtractor
            .extract("¿qué cebo me recomiendas?", date(2024, 5, 11))
            .unwrap();
        assert!(entities.is_empty());
    }
}
