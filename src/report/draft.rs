//! The report under construction: every field optional until completion.

use std::collections::BTreeMap;
use std::fmt::Write as _;

use jiff::Timestamp;
use jiff::civil::{Date, Time};
use uuid::Uuid;

use crate::model::{
    Catch, Location, STATUS_COMPLETED, TripError, TripReport, TripType, minutes_between,
};

use super::field::ReportField;

/// A species in the draft whose count may still be unknown.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DraftCatch {
    pub species: String,
    pub count: Option<u32>,
}

/// Why a draft cannot become a report yet.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ReportError {
    #[error("Faltan datos del parte: {}", join_labels(.0))]
    MissingFields(Vec<ReportField>),

    #[error("El parte no es coherente: {0}")]
    Invalid(#[from] TripError),
}

fn join_labels(fields: &[ReportField]) -> String {
    fields
        .iter()
        .map(|f| f.label())
        .collect::<Vec<_>>()
        .join(", ")
}

/// A trip report in progress.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ReportDraft {
    pub date: Option<Date>,
    pub catches: Vec<DraftCatch>,
    pub trip_type: Option<TripType>,
    pub rods: Option<u32>,
    pub location: Option<Location>,
    pub start_time: Option<Time>,
    pub end_time: Option<Time>,
    pub photos: Vec<String>,
    pub transcript: Option<String>,
}

impl ReportDraft {
    /// Whether a field holds a value. Count is filled once every species has one.
    pub fn is_filled(&self, field: ReportField) -> bool {
        match field {
            ReportField::Species => !self.catches.is_empty(),
            ReportField::Count => {
                !self.catches.is_empty() && self.catches.iter().all(|c| c.count.is_some())
            }
            ReportField::Date => self.date.is_some(),
            ReportField::TripType => self.trip_type.is_some(),
            ReportField::Rods => self.rods.is_some(),
            ReportField::Location => self.location.is_some(),
            ReportField::StartTime => self.start_time.is_some(),
            ReportField::EndTime => self.end_time.is_some(),
        }
    }

    /// Mandatory fields still empty, in asking order.
    pub fn missing_fields(&self) -> Vec<ReportField> {
        ReportField::MANDATORY
            .into_iter()
            .filter(|f| !self.is_filled(*f))
            .collect()
    }

    /// The first species whose count is unknown.
    pub fn uncounted_species(&self) -> Option<&str> {
        self.catches
            .iter()
            .find(|c| c.count.is_none())
            .map(|c| c.species.as_str())
    }

    /// Sum of the counts known so far, saturating.
    pub fn total_count(&self) -> u32 {
        self.catches
            .iter()
            .filter_map(|c| c.count)
            .fold(0, u32::saturating_add)
    }

    /// Turns the draft into a finished report.
    ///
    /// The total is always the sum of the per-species counts.
    pub fn build(&self, user_id: &str, now: Timestamp) -> Result<TripReport, ReportError> {
        let missing = self.missing_fields();
        if !missing.is_empty() {
            return Err(ReportError::MissingFields(missing));
        }
        let (Some(date), Some(trip_type), Some(rods)) = (self.date, self.trip_type, self.rods)
        else {
            return Err(ReportError::MissingFields(self.missing_fields()));
        };

        let catches: Vec<Catch> = self
            .catches
            .iter()
            .map(|c| Catch {
                species: c.species.clone(),
                count: c.count.unwrap_or(0),
                observation: None,
            })
            .collect();
        let total_count = catches
            .iter()
            .try_fold(0u32, |sum, c| sum.checked_add(c.count))
            .ok_or(TripError::TotalOverflow)?;
        let duration_minutes = match (self.start_time, self.end_time) {
            (Some(start), Some(end)) => minutes_between(start, end),
            _ => None,
        };

        let mut user_info = BTreeMap::new();
        user_info.insert(
            "origen".to_string(),
            if self.transcript.is_some() { "voz" } else { "chat" }.to_string(),
        );

        let report = TripReport {
            id: Uuid::new_v4(),
            user_id: user_id.to_string(),
            date,
            start_time: self.start_time,
            end_time: self.end_time,
            duration_minutes,
            catches,
            total_count,
            trip_type,
            rods,
            location: self.location.clone(),
            photos: self.photos.clone(),
            transcript: self.transcript.clone(),
            user_info,
            created_at: now,
            status: STATUS_COMPLETED.to_string(),
        };
        report.validate()?;
        Ok(report)
    }

    /// Human-readable summary of what is known so far.
    pub fn summary(&self) -> String {
        let mut out = String::new();
        let catches = if self.catches.is_empty() {
            "—".to_string()
        } else {
            self.catches
                .iter()
                .map(|c| match c.count {
                    Some(n) => format!("{n} × {}", c.species),
                    None => format!("? × {}", c.species),
                })
                .collect::<Vec<_>>()
                .join(", ")
        };
        let _ = writeln!(out, "  Capturas: {catches} (total {})", self.total_count());
        let _ = writeln!(out, "  Fecha: {}", show(self.date.as_ref()));
        let _ = writeln!(out, "  Modalidad: {}", show(self.trip_type.as_ref()));
        let _ = writeln!(out, "  Cañas: {}", show(self.rods.as_ref()));
        let _ = writeln!(
            out,
            "  Lugar: {}",
            show(self.location.as_ref().map(|l| &l.name))
        );
        let _ = write!(
            out,
            "  Horario: {} - {}",
            show(self.start_time.map(|t| t.strftime("%H:%M").to_string()).as_ref()),
            show(self.end_time.map(|t| t.strftime("%H:%M").to_string()).as_ref()),
        );
        if !self.photos.is_empty() {
            let _ = write!(out, "\n  Fotos: {}", self.photos.len());
        }
        out
    }
}

fn show<T: ToString>(value: Option<&T>) -> String {
    value.map_or_else(|| "—".to_string(), ToString::to_string)
}
