//! Field-completion dialogue: one missing field asked at a time.
//!
//! A session starts from whatever the opening message revealed and asks for
//! the mandatory fields still empty, in [`ReportField::MANDATORY`] order. An
//! answer is read by the parser of the field being asked; any other details
//! it mentions fill fields that are still empty, never overwriting a value.
//! A rejected answer leaves the draft untouched and the same field open.

use jiff::Timestamp;
use jiff::civil::Date;
use tracing::debug;

use crate::model::{Location, MAX_CATCH_COUNT, TripReport};
use crate::services::{Entity, EntityKind};

use super::draft::{DraftCatch, ReportDraft, ReportError};
use super::field::ReportField;
use super::parse;

/// Most rods a single angler can declare.
pub const MAX_RODS: u32 = 20;

/// An answer that could not fill the field it was given for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum FieldError {
    #[error("No he entendido la fecha. Prueba con «hoy», «ayer» o 12/05/2024.")]
    Date,

    #[error("La fecha de la jornada no puede ser posterior a hoy.")]
    FutureDate,

    #[error("No he entendido qué especie capturaste.")]
    Species,

    #[error("Necesito un número, por ejemplo «3».")]
    Count,

    #[error("Indica la cantidad de cada especie, por ejemplo «2 lubinas y 1 dorada».")]
    CountPerSpecies,

    #[error("Esa cantidad no es creíble: como máximo 10000 piezas por especie.")]
    TooMany,

    #[error("Primero dime qué especies capturaste.")]
    NoSpeciesYet,

    #[error("Elige orilla, embarcación, kayak o submarina.")]
    TripType,

    #[error("Indica cuántas cañas usaste, entre 1 y 20.")]
    Rods,

    #[error("Dime el nombre del lugar o sus coordenadas.")]
    Location,

    #[error("No he entendido la hora. Usa el formato 7:30.")]
    Time(ReportField),

    #[error("La hora de fin no puede ser anterior a la de inicio.")]
    EndBeforeStart(ReportField),

    #[error("No hay ningún dato pendiente en el parte.")]
    NothingOpen,
}

impl FieldError {
    /// The field the rejected answer was meant for.
    pub fn field(self) -> Option<ReportField> {
        match self {
            Self::Date | Self::FutureDate => Some(ReportField::Date),
            Self::Species => Some(ReportField::Species),
            Self::Count | Self::CountPerSpecies | Self::TooMany | Self::NoSpeciesYet => {
                Some(ReportField::Count)
            }
            Self::TripType => Some(ReportField::TripType),
            Self::Rods => Some(ReportField::Rods),
            Self::Location => Some(ReportField::Location),
            Self::Time(field) | Self::EndBeforeStart(field) => Some(field),
            Self::NothingOpen => None,
        }
    }
}

/// What the session needs after an answer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    /// Ask for this field next.
    Next(ReportField),
    /// Every mandatory field is filled; the report can be submitted.
    Ready,
}

/// A report being completed through conversation.
#[derive(Debug, Clone, PartialEq)]
pub struct ReportSession {
    draft: ReportDraft,
    current: Option<ReportField>,
    today: Date,
    min_confidence: f32,
}

impl ReportSession {
    /// Opens a session seeded with the entities found in the opening message.
    ///
    /// Entities below `min_confidence` are ignored.
    pub fn start(entities: &[Entity], today: Date, min_confidence: f32) -> Self {
        let mut session = Self {
            draft: ReportDraft::default(),
            current: None,
            today,
            min_confidence,
        };
        let applied = session.apply_entities(entities);
        session.current = session.next_missing();
        debug!(applied, next = ?session.current, "report session started");
        session
    }

    pub fn draft(&self) -> &ReportDraft {
        &self.draft
    }

    /// The field the next answer will be read as.
    pub fn current_field(&self) -> Option<ReportField> {
        self.current
    }

    pub fn is_ready(&self) -> bool {
        self.draft.missing_fields().is_empty()
    }

    /// The question for the open field, naming the species when a count
    /// is what is missing.
    pub fn prompt(&self) -> String {
        match self.current {
            Some(ReportField::Count) => match self.draft.uncounted_species() {
                Some(species) if self.draft.catches.len() > 1 => {
                    format!("¿Cuántas piezas de {species} capturaste?")
                }
                _ => ReportField::Count.prompt().to_string(),
            },
            Some(field) => field.prompt().to_string(),
            None => format!(
                "El parte está completo:\n{}\n¿Lo envío? Escribe «enviar» o «cancelar».",
                self.draft.summary()
            ),
        }
    }

    /// Opens a field for editing, optional or already filled.
    pub fn select_field(&mut self, field: ReportField) {
        debug!(%field, "field selected");
        self.current = Some(field);
    }

    /// Reads `text` as the value of the open field, then uses `hints` found
    /// in the same text to fill other empty fields.
    pub fn answer(&mut self, text: &str, hints: &[Entity]) -> Result<Step, FieldError> {
        let field = self.current.ok_or(FieldError::NothingOpen)?;
        self.fill(field, text)?;
        let hints: Vec<&Entity> = hints
            .iter()
            .filter(|e| !touches(field, e.kind))
            .collect();
        let applied = self.apply(hints);
        debug!(%field, applied, "field answered");

        self.current = self.next_missing();
        Ok(match self.current {
            Some(next) => Step::Next(next),
            None => Step::Ready,
        })
    }

    /// Adds a photo reference to the draft.
    pub fn add_photo(&mut self, reference: impl Into<String>) {
        self.draft.photos.push(reference.into());
    }

    /// Records a species recognised from a photo. Only used while the
    /// draft names no species yet.
    pub fn suggest_species(&mut self, species: &str) -> bool {
        if !self.draft.catches.is_empty() {
            return false;
        }
        self.draft.catches.push(DraftCatch {
            species: species.to_string(),
            count: None,
        });
        if self.current == Some(ReportField::Species) {
            self.current = self.next_missing();
        }
        true
    }

    /// Keeps the transcript the report was dictated from.
    pub fn set_transcript(&mut self, transcript: impl Into<String>) {
        self.draft.transcript = Some(transcript.into());
    }

    /// Fills empty fields from extracted entities; returns how many were used.
    pub fn apply_entities(&mut self, entities: &[Entity]) -> usize {
        let applied = self.apply(entities.iter().collect());
        if self.current.is_some_and(|f| self.draft.is_filled(f)) {
            self.current = self.next_missing();
        }
        applied
    }

    /// Builds the finished report. Fails while mandatory fields are empty.
    pub fn complete(&self, user_id: &str, now: Timestamp) -> Result<TripReport, ReportError> {
        self.draft.build(user_id, now)
    }

    fn next_missing(&self) -> Option<ReportField> {
        self.draft.missing_fields().into_iter().next()
    }

    fn fill(&mut self, field: ReportField, text: &str) -> Result<(), FieldError> {
        let draft = &mut self.draft;
        match field {
            ReportField::Species => {
                let mut catches = parse::parse_catches(text);
                if catches.is_empty() {
                    catches = free_form_catches(text);
                }
                if catches.is_empty() {
                    return Err(FieldError::Species);
                }
                if !within_limit(&catches) {
                    return Err(FieldError::TooMany);
                }
                draft.catches = catches;
            }
            ReportField::Count => fill_count(draft, text)?,
            ReportField::Date => {
                let date = parse::parse_date(text, self.today).ok_or(FieldError::Date)?;
                if date > self.today {
                    return Err(FieldError::FutureDate);
                }
                draft.date = Some(date);
            }
            ReportField::TripType => {
                draft.trip_type = Some(parse::parse_trip_type(text).ok_or(FieldError::TripType)?);
            }
            ReportField::Rods => {
                let rods = parse::parse_rods(text)
                    .or_else(|| parse::parse_number(text))
                    .filter(|n| (1..=MAX_RODS).contains(n))
                    .ok_or(FieldError::Rods)?;
                draft.rods = Some(rods);
            }
            ReportField::Location => {
                let location = parse::parse_location(text)
                    .or_else(|| free_form_location(text))
                    .ok_or(FieldError::Location)?;
                draft.location = Some(location);
            }
            ReportField::StartTime => {
                let start =
                    parse::parse_single_time(text).ok_or(FieldError::Time(ReportField::StartTime))?;
                if draft.end_time.is_some_and(|end| end < start) {
                    return Err(FieldError::EndBeforeStart(ReportField::StartTime));
                }
                draft.start_time = Some(start);
            }
            ReportField::EndTime => {
                let end =
                    parse::parse_single_time(text).ok_or(FieldError::Time(ReportField::EndTime))?;
                if draft.start_time.is_some_and(|start| end < start) {
                    return Err(FieldError::EndBeforeStart(ReportField::EndTime));
                }
                draft.end_time = Some(end);
            }
        }
        Ok(())
    }

    fn apply(&mut self, entities: Vec<&Entity>) -> usize {
        let species_open = self.draft.catches.is_empty();
        let mut applied = 0;
        for entity in entities {
            if entity.confidence < self.min_confidence {
                continue;
            }
            if self.apply_one(entity, species_open) {
                applied += 1;
            }
        }
        applied
    }

    fn apply_one(&mut self, entity: &Entity, species_open: bool) -> bool {
        let draft = &mut self.draft;
        match entity.kind {
            EntityKind::Date if draft.date.is_none() => {
                match parse::parse_date(&entity.text, self.today).filter(|d| *d <= self.today) {
                    Some(date) => draft.date = Some(date),
                    None => return false,
                }
            }
            EntityKind::StartTime if draft.start_time.is_none() => {
                let Some(start) = parse::parse_single_time(&entity.text) else {
                    return false;
                };
                if draft.end_time.is_some_and(|end| end < start) {
                    return false;
                }
                draft.start_time = Some(start);
            }
            EntityKind::EndTime if draft.end_time.is_none() => {
                let Some(end) = parse::parse_single_time(&entity.text) else {
                    return false;
                };
                if draft.start_time.is_some_and(|start| end < start) {
                    return false;
                }
                draft.end_time = Some(end);
            }
            EntityKind::Species => {
                let mentioned = parse::parse_catches(&entity.text);
                let mentioned = if mentioned.is_empty() {
                    free_form_catches(&entity.text)
                } else {
                    mentioned
                };
                let mut used = false;
                for catch in mentioned {
                    if species_open {
                        let mut merged = draft.catches.clone();
                        parse::merge_catch(&mut merged, &catch.species, catch.count);
                        if within_limit(&merged) {
                            draft.catches = merged;
                            used = true;
                        }
                    } else if let Some(existing) = draft
                        .catches
                        .iter_mut()
                        .find(|c| c.species == catch.species && c.count.is_none())
                        && catch.count.is_some_and(|n| n <= MAX_CATCH_COUNT)
                    {
                        existing.count = catch.count;
                        used = true;
                    }
                }
                return used;
            }
            EntityKind::TripType if draft.trip_type.is_none() => {
                match parse::parse_trip_type(&entity.text) {
                    Some(trip_type) => draft.trip_type = Some(trip_type),
                    None => return false,
                }
            }
            EntityKind::Rods if draft.rods.is_none() => {
                match parse::parse_rods(&entity.text)
                    .or_else(|| parse::parse_number(&entity.text))
                    .filter(|n| (1..=MAX_RODS).contains(n))
                {
                    Some(rods) => draft.rods = Some(rods),
                    None => return false,
                }
            }
            EntityKind::Location if draft.location.is_none() => {
                let location = match parse::parse_coordinates(&entity.text) {
                    Some((lat, lon)) => Location {
                        name: entity.text.trim().to_string(),
                        latitude: Some(lat),
                        longitude: Some(lon),
                    },
                    None if !entity.text.trim().is_empty() => {
                        Location::named(entity.text.trim())
                    }
                    None => return false,
                };
                draft.location = Some(location);
            }
            _ => return false,
        }
        true
    }
}

/// Whether an entity kind describes the field just answered.
fn touches(field: ReportField, kind: EntityKind) -> bool {
    matches!(
        (field, kind),
        (ReportField::Species | ReportField::Count, EntityKind::Species)
            | (ReportField::Date, EntityKind::Date)
            | (ReportField::TripType, EntityKind::TripType)
            | (ReportField::Rods, EntityKind::Rods)
            | (ReportField::Location, EntityKind::Location)
            | (ReportField::StartTime, EntityKind::StartTime)
            | (ReportField::EndTime, EntityKind::EndTime)
    )
}

fn fill_count(draft: &mut ReportDraft, text: &str) -> Result<(), FieldError> {
    if draft.catches.is_empty() {
        return Err(FieldError::NoSpeciesYet);
    }

    let named: Vec<DraftCatch> = parse::parse_catches(text)
        .into_iter()
        .filter(|c| c.count.is_some())
        .collect();
    if !named.is_empty() {
        if !within_limit(&named) {
            return Err(FieldError::TooMany);
        }
        for catch in named {
            match draft.catches.iter_mut().find(|c| c.species == catch.species) {
                Some(existing) => existing.count = catch.count,
                None => draft.catches.push(catch),
            }
        }
        return Ok(());
    }

    let count = parse::parse_number(text).ok_or(FieldError::Count)?;
    if count > MAX_CATCH_COUNT {
        return Err(FieldError::TooMany);
    }
    let target = match draft.catches.iter().position(|c| c.count.is_none()) {
        Some(i) => i,
        None if draft.catches.len() == 1 => 0,
        None => return Err(FieldError::CountPerSpecies),
    };
    draft.catches[target].count = Some(count);
    Ok(())
}

fn within_limit(catches: &[DraftCatch]) -> bool {
    catches
        .iter()
        .all(|c| c.count.is_none_or(|n| n <= MAX_CATCH_COUNT))
}

/// Species the parser does not know: "3 chopas, una herrera".
fn free_form_catches(text: &str) -> Vec<DraftCatch> {
    let mut catches = Vec::new();
    for item in text
        .split([',', ';', '.'])
        .flat_map(|part| part.split(" y "))
        .map(str::trim)
        .filter(|item| !item.is_empty())
    {
        let mut words = item.split_whitespace().peekable();
        let count = words
            .peek()
            .and_then(|w| parse::number(&parse::normalize(w)));
        if count.is_some() {
            words.next();
        }
        let species = words.collect::<Vec<_>>().join(" ");
        if species.is_empty() || parse::parse_number(&species).is_some() {
            continue;
        }
        parse::merge_catch(&mut catches, &parse::capitalize(&species), count);
    }
    catches
}

/// A place name given as a bare answer ("Cabo de Palos", "en la playa").
fn free_form_location(text: &str) -> Option<Location> {
    let trimmed = text.trim().trim_end_matches(['.', '!']);
    let lower = trimmed.to_lowercase();
    let name = ["en ", "desde "]
        .iter()
        .find_map(|prefix| lower.starts_with(*prefix).then(|| &trimmed[prefix.len()..]))
        .unwrap_or(trimmed)
        .trim();
    (!name.is_empty()).then(|| Location::named(name))
}
