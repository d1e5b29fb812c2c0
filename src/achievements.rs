//! Collectible achievements earned from logged trips.

use std::collections::BTreeSet;

use jiff::Timestamp;
use jiff::civil::time;

use crate::model::{Achievement, TripReport};
use crate::storage::{self, Store};

/// The fixed catalogue, in display order.
pub static CATALOG: [Achievement; 8] = [
    Achievement {
        id: "first-trip",
        title: "Primer parte",
        description: "Registra tu primera jornada de pesca.",
    },
    Achievement {
        id: "ten-catches",
        title: "Diez capturas",
        description: "Acumula 10 capturas entre todos tus partes.",
    },
    Achievement {
        id: "fifty-catches",
        title: "Cincuenta capturas",
        description: "Acumula 50 capturas entre todos tus partes.",
    },
    Achievement {
        id: "five-species",
        title: "Coleccionista",
        description: "Captura 5 especies distintas.",
    },
    Achievement {
        id: "three-trip-types",
        title: "Todoterreno",
        description: "Pesca en 3 modalidades distintas.",
    },
    Achievement {
        id: "big-day",
        title: "Gran jornada",
        description: "Consigue 5 o más capturas en un mismo parte.",
    },
    Achievement {
        id: "early-bird",
        title: "Madrugador",
        description: "Empieza una jornada antes de las 7:00.",
    },
    Achievement {
        id: "survey-done",
        title: "Opinión de pescador",
        description: "Completa la encuesta de la aplicación.",
    },
];

pub fn find(id: &str) -> Option<&'static Achievement> {
    CATALOG.iter().find(|a| a.id == id)
}

/// Every achievement the given history earns.
pub fn evaluate(reports: &[TripReport], survey_done: bool) -> Vec<&'static Achievement> {
    let total: u64 = reports.iter().map(|r| u64::from(r.total_count)).sum();
    let species: BTreeSet<String> = reports
        .iter()
        .flat_map(|r| &r.catches)
        .map(|c| c.species.to_lowercase())
        .collect();
    let trip_types: BTreeSet<_> = reports.iter().map(|r| r.trip_type).collect();
    let early = time(7, 0, 0, 0);

    CATALOG
        .iter()
        .filter(|a| match a.id {
            "first-trip" => !reports.is_empty(),
            "ten-catches" => total >= 10,
            "fifty-catches" => total >= 50,
            "five-species" => species.len() >= 5,
            "three-trip-types" => trip_types.len() >= 3,
            "big-day" => reports.iter().any(|r| r.total_count >= 5),
            "early-bird" => reports
                .iter()
                .any(|r| r.start_time.is_some_and(|t| t < early)),
            "survey-done" => survey_done,
            _ => false,
        })
        .collect()
}

/// Re-evaluates a user's achievements and stores any new unlocks.
///
/// Returns only the achievements unlocked by this call.
pub fn refresh(
    store: &dyn Store,
    user_id: &str,
    now: Timestamp,
) -> storage::Result<Vec<&'static Achievement>> {
    let reports = store.list_reports(user_id, None)?;
    let survey_done = store.has_completed_survey(user_id)?;
    let earned: Vec<&str> = evaluate(&reports, survey_done)
        .into_iter()
        .map(|a| a.id)
        .collect();
    let unlocked = store.unlock_achievements(user_id, &earned, now)?;
    Ok(unlocked.iter().filter_map(|id| find(id)).collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::collections::BTreeMap;

    use jiff::civil::date;
    use tempfile::TempDir;
    use uuid::Uuid;

    use crate::model::{Catch, STATUS_COMPLETED, TripType};
    use crate::storage::{ReportStore, Storage};

    fn report(catches: &[(&str, u32)], trip_type: TripType) -> TripReport {
        let catches: Vec<Catch> = catches
            .iter()
            .map(|(species, count)| Catch {
                species: (*species).into(),
                count: *count,
                observation: None,
            })
            .collect();
        TripReport {
            id: Uuid::new_v4(),
            user_id: "marina".into(),
            date: date(2024, 5, 11),
            start_time: None,
            end_time: None,
            duration_minutes: None,
            total_count: catches.iter().map(|c| c.count).sum(),
            catches,
            trip_type,
            rods: 1,
            location: None,
            photos: vec![],
            transcript: None,
            user_info: BTreeMap::new(),
            created_at: Timestamp::now(),
            status: STATUS_COMPLETED.into(),
        }
    }

    fn ids(achievements: &[&Achievement]) -> Vec<&'static str> {
        achievements.iter().map(|a| a.id).collect()
    }

    #[test]
    fn catalogue_ids_are_unique() {
        let unique: BTreeSet<_> = CATALOG.iter().map(|a| a.id).collect();
        assert_eq!(unique.len(), CATALOG.len());
    }

    #[test]
    fn nothing_earned_without_activity() {
        assert!(evaluate(&[], false).is_empty());
        assert_eq!(ids(&evaluate(&[], true)), vec!["survey-done"]);
    }

    #[test]
    fn first_trip_and_big_day() {
        let earned = evaluate(&[report(&[("Lubina", 5)], TripType::Shore)], false);
        assert_eq!(ids(&earned), vec!["first-trip", "big-day"]);
    }

    #[test]
    fn totals_add_up_across_reports() {
        let reports = vec![
            report(&[("Lubina", 4)], TripType::Shore),
            report(&[("Dorada", 3), ("Sargo", 3)], TripType::Boat),
        ];
        let earned = ids(&evaluate(&reports, false));
        assert!(earned.contains(&"ten-catches"));
        assert!(!earned.contains(&"fifty-catches"));
    }

    #[test]
    fn history_totals_do_not_overflow() {
        let mut big = report(&[("Lubina", 1)], TripType::Shore);
        big.total_count = u32::MAX;
        let earned = ids(&evaluate(&[big.clone(), big], false));
        assert!(earned.contains(&"fifty-catches"));
    }

    #[test]
    fn species_are_counted_case_insensitively() {
        let reports = vec![
            report(&[("Lubina", 1), ("lubina", 1), ("Dorada", 1)], TripType::Shore),
            report(&[("Sargo", 1), ("Pargo", 1)], TripType::Kayak),
        ];
        assert!(!ids(&evaluate(&reports, false)).contains(&"five-species"));

        let mut more = reports;
        more.push(report(&[("Mero", 1)], TripType::Spearfishing));
        let earned = ids(&evaluate(&more, false));
        assert!(earned.contains(&"five-species"));
        assert!(earned.contains(&"three-trip-types"));
    }

    #[test]
    fn early_bird_needs_a_start_before_seven() {
        let mut trip = report(&[("Lubina", 1)], TripType::Shore);
        trip.start_time = Some(time(7, 0, 0, 0));
        assert!(!ids(&evaluate(&[trip.clone()], false)).contains(&"early-bird"));

        trip.start_time = Some(time(6, 45, 0, 0));
        assert!(ids(&evaluate(&[trip], false)).contains(&"early-bird"));
    }

    #[test]
    fn refresh_unlocks_once() {
        let dir = TempDir::new().unwrap();
        let storage = Storage::new(dir.path()).unwrap();
        storage
            .save_report(&report(&[("Lubina", 2)], TripType::Shore), &[])
            .unwrap();

        let first = refresh(&storage, "marina", Timestamp::now()).unwrap();
        assert_eq!(ids(&first), vec!["first-trip"]);

        let second = refresh(&storage, "marina", Timestamp::now()).unwrap();
        assert!(second.is_empty());
    }
}
