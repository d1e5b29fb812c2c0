//! Trip report types: the persisted unit of work.

use std::collections::BTreeMap;
use std::fmt;

use jiff::Timestamp;
use jiff::civil::{Date, Time};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Status stored on every finished report.
pub const STATUS_COMPLETED: &str = "completado";

/// Most pieces of one species a report can hold.
pub const MAX_CATCH_COUNT: u32 = 10_000;

/// A fishing trip ("parte de pesca") and everything caught on it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TripReport {
    pub id: Uuid,
    pub user_id: String,
    pub date: Date,
    pub start_time: Option<Time>,
    pub end_time: Option<Time>,
    pub duration_minutes: Option<u32>,
    pub catches: Vec<Catch>,

    /// Sum of `count` across `catches`.
    pub total_count: u32,

    pub trip_type: TripType,
    pub rods: u32,
    pub location: Option<Location>,

    /// References to photos taken during the trip.
    pub photos: Vec<String>,

    /// The voice transcript the report was dictated from, if any.
    pub transcript: Option<String>,

    /// Free-form metadata about the angler or the source of the report.
    pub user_info: BTreeMap<String, String>,

    pub created_at: Timestamp,
    pub status: String,
}

/// Ways a report can be internally inconsistent.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TripError {
    #[error("el parte no tiene capturas")]
    NoCatches,

    #[error("el total de capturas ({total}) no coincide con la suma por especie ({sum})")]
    TotalMismatch { total: u32, sum: u32 },

    #[error("la cantidad de {species} ({count}) supera el máximo de 10000")]
    CountTooLarge { species: String, count: u32 },

    #[error("la suma de capturas desborda")]
    TotalOverflow,

    #[error("el número de cañas debe ser al menos 1")]
    NoRods,

    #[error("la hora de fin es anterior a la de inicio")]
    EndBeforeStart,

    #[error("la duración no coincide con las horas de inicio y fin")]
    DurationMismatch,
}

impl TripReport {
    /// Sum of the per-species counts, or `None` on overflow.
    pub fn catch_sum(&self) -> Option<u32> {
        self.catches
            .iter()
            .try_fold(0u32, |sum, c| sum.checked_add(c.count))
    }

    /// Checks the invariants a finished report must hold.
    pub fn validate(&self) -> Result<(), TripError> {
        if self.catches.is_empty() {
            return Err(TripError::NoCatches);
        }
        if let Some(c) = self.catches.iter().find(|c| c.count > MAX_CATCH_COUNT) {
            return Err(TripError::CountTooLarge {
                species: c.species.clone(),
                count: c.count,
            });
        }
        let sum = self.catch_sum().ok_or(TripError::TotalOverflow)?;
        if sum != self.total_count {
            return Err(TripError::TotalMismatch {
                total: self.total_count,
                sum,
            });
        }
        if self.rods == 0 {
            return Err(TripError::NoRods);
        }
        if let (Some(start), Some(end)) = (self.start_time, self.end_time) {
            let Some(minutes) = minutes_between(start, end) else {
                return Err(TripError::EndBeforeStart);
            };
            if self.duration_minutes.is_some_and(|d| d != minutes) {
                return Err(TripError::DurationMismatch);
            }
        }
        Ok(())
    }
}

/// Whole minutes from `start` to `end`, or `None` when `end` comes first.
pub fn minutes_between(start: Time, end: Time) -> Option<u32> {
    let start = i32::from(start.hour()) * 60 + i32::from(start.minute());
    let end = i32::from(end.hour()) * 60 + i32::from(end.minute());
    u32::try_from(end - start).ok()
}

/// One species caught on a trip.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Catch {
    pub species: String,
    pub count: u32,
    pub observation: Option<String>,
}

/// Where the trip took place.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Location {
    pub name: String,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
}

impl Location {
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            latitude: None,
            longitude: None,
        }
    }
}

/// How the angler fished.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum TripType {
    Shore,
    Boat,
    Kayak,
    Spearfishing,
}

impl TripType {
    pub const ALL: [Self; 4] = [Self::Shore, Self::Boat, Self::Kayak, Self::Spearfishing];

    /// Spanish label shown to the user.
    pub fn label(self) -> &'static str {
        match self {
            Self::Shore => "orilla",
            Self::Boat => "embarcación",
            Self::Kayak => "kayak",
            Self::Spearfishing => "submarina",
        }
    }
}

impl fmt::Display for TripType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use jiff::civil::{date, time};

    fn sample_report() -> TripReport {
        TripReport {
            id: Uuid::new_v4(),
            user_id: "marina".into(),
            date: date(2024, 5, 11),
            start_time: Some(time(7, 0, 0, 0)),
            end_time: Some(time(11, 30, 0, 0)),
            duration_minutes: Some(270),
            catches: vec![
                Catch {
                    species: "Lubina".into(),
                    count: 2,
                    observation: None,
                },
                Catch {
                    species: "Dorada".into(),
                    count: 1,
                    observation: Some("pequeña".into()),
                },
            ],
            total_count: 3,
            trip_type: TripType::Shore,
            rods: 2,
            location: Some(Location::named("Cabo de Palos")),
            photos: vec![],
            transcript: None,
            user_info: BTreeMap::new(),
            created_at: Timestamp::now(),
            status: STATUS_COMPLETED.into(),
        }
    }

    #[test]
    fn consistent_report_validates() {
        assert_eq!(sample_report().validate(), Ok(()));
    }

    #[test]
    fn total_must_match_sum_of_catches() {
        let mut report = sample_report();
        report.total_count = 5;
        assert_eq!(
            report.validate(),
            Err(TripError::TotalMismatch { total: 5, sum: 3 })
        );
    }

    #[test]
    fn oversized_counts_are_rejected() {
        let mut report = sample_report();
        report.catches[0].count = MAX_CATCH_COUNT + 1;
        report.total_count = MAX_CATCH_COUNT + 2;
        assert_eq!(
            report.validate(),
            Err(TripError::CountTooLarge {
                species: "Lubina".into(),
                count: MAX_CATCH_COUNT + 1,
            })
        );
    }

    #[test]
    fn overflowing_sum_is_an_error_not_a_panic() {
        let mut report = sample_report();
        report.catches[0].count = MAX_CATCH_COUNT;
        report.catches.extend((0..430_000).map(|_| Catch {
            species: "Boga".into(),
            count: MAX_CATCH_COUNT,
            observation: None,
        }));
        assert_eq!(report.catch_sum(), None);
        assert_eq!(report.validate(), Err(TripError::TotalOverflow));
    }

    #[test]
    fn report_without_catches_is_rejected() {
        let mut report = sample_report();
        report.catches.clear();
        report.total_count = 0;
        assert_eq!(report.validate(), Err(TripError::NoCatches));
    }

    #[test]
    fn end_before_start_is_rejected() {
        let mut report = sample_report();
        report.end_time = Some(time(6, 0, 0, 0));
        report.duration_minutes = None;
        assert_eq!(report.validate(), Err(TripError::EndBeforeStart));
    }

    #[test]
    fn minutes_between_counts_whole_minutes() {
        assert_eq!(minutes_between(time(7, 15, 0, 0), time(9, 0, 0, 0)), Some(105));
        assert_eq!(minutes_between(time(9, 0, 0, 0), time(7, 0, 0, 0)), None);
    }
}
