//! Rule-based reading of trip details out of Spanish free text.
//!
//! Every parser works on a normalised copy of the input (lowercase, accents
//! folded) except location names, which keep their original casing.

use jiff::civil::{Date, Time};

use crate::model::{Location, TripType};

use super::draft::DraftCatch;

/// Known species: normalised words and display name. Multi-word names first.
const SPECIES: &[(&str, &str)] = &[
    ("pez espada", "Pez espada"),
    ("black bass", "Black bass"),
    ("lubina", "Lubina"),
    ("dorada", "Dorada"),
    ("sargo", "Sargo"),
    ("besugo", "Besugo"),
    ("caballa", "Caballa"),
    ("jurel", "Jurel"),
    ("pargo", "Pargo"),
    ("denton", "Dentón"),
    ("corvina", "Corvina"),
    ("lenguado", "Lenguado"),
    ("trucha", "Trucha"),
    ("salmon", "Salmón"),
    ("carpa", "Carpa"),
    ("lucio", "Lucio"),
    ("barbo", "Barbo"),
    ("pulpo", "Pulpo"),
    ("calamar", "Calamar"),
    ("sepia", "Sepia"),
    ("mero", "Mero"),
    ("anjova", "Anjova"),
    ("palometa", "Palometa"),
    ("atun", "Atún"),
    ("congrio", "Congrio"),
    ("raya", "Raya"),
];

const SHORE: &[&str] = &[
    "orilla", "costa", "playa", "espigon", "escollera", "rocas", "surfcasting",
];
const BOAT: &[&str] = &["barco", "embarcacion", "lancha", "bote", "velero"];
const KAYAK: &[&str] = &["kayak", "kayac", "piragua"];
const SPEARFISHING: &[&str] = &["submarina", "apnea", "arpon", "buceo"];

const ARTICLES: &[&str] = &["el", "la", "los", "las"];
const CONNECTORS: &[&str] = &["de", "del", "la", "el", "los", "las"];

/// Lowercases and folds Spanish accents (`ñ` becomes `n`).
pub fn normalize(text: &str) -> String {
    text.chars()
        .flat_map(char::to_lowercase)
        .map(|c| match c {
            'á' | 'à' | 'ä' | 'â' => 'a',
            'é' | 'è' | 'ë' | 'ê' => 'e',
            'í' | 'ì' | 'ï' | 'î' => 'i',
            'ó' | 'ò' | 'ö' | 'ô' => 'o',
            'ú' | 'ù' | 'ü' | 'û' => 'u',
            'ñ' => 'n',
            other => other,
        })
        .collect()
}

/// Splits normalised text into words, keeping `7:30`, `12/05` and
/// `2024-05-11` whole.
pub fn tokens(normalized: &str) -> Vec<&str> {
    normalized
        .split(|c: char| !(c.is_alphanumeric() || matches!(c, ':' | '/' | '-')))
        .map(|t| t.trim_matches(|c| matches!(c, ':' | '/' | '-')))
        .filter(|t| !t.is_empty())
        .collect()
}

/// Reads a count written as digits or as a Spanish number word.
pub fn number(word: &str) -> Option<u32> {
    if let Ok(n) = word.parse() {
        return Some(n);
    }
    let n = match word {
        "un" | "uno" | "una" => 1,
        "dos" => 2,
        "tres" => 3,
        "cuatro" => 4,
        "cinco" => 5,
        "seis" => 6,
        "siete" => 7,
        "ocho" => 8,
        "nueve" => 9,
        "diez" => 10,
        "once" => 11,
        "doce" => 12,
        "trece" => 13,
        "catorce" => 14,
        "quince" => 15,
        "veinte" => 20,
        _ => return None,
    };
    Some(n)
}

/// The first number in the text.
pub fn parse_number(text: &str) -> Option<u32> {
    tokens(&normalize(text)).into_iter().find_map(number)
}

/// Known species mentioned in the text, each with the count written just
/// before it. Repeated species are merged.
pub fn parse_catches(text: &str) -> Vec<DraftCatch> {
    let normalized = normalize(text);
    let words = tokens(&normalized);
    let mut found = Vec::new();
    let mut i = 0;
    while i < words.len() {
        if let Some((species, len)) = species_at(&words, i) {
            let count = i.checked_sub(1).and_then(|p| number(words[p]));
            merge_catch(&mut found, species, count);
            i += len;
        } else {
            i += 1;
        }
    }
    found
}

/// Adds a catch to the list, summing counts with an existing entry.
///
/// Sums saturate at `u32::MAX`; the session refuses anything above
/// [`MAX_CATCH_COUNT`](crate::model::MAX_CATCH_COUNT).
pub fn merge_catch(catches: &mut Vec<DraftCatch>, species: &str, count: Option<u32>) {
    if let Some(existing) = catches
        .iter_mut()
        .find(|c| c.species.eq_ignore_ascii_case(species))
    {
        existing.count = match (existing.count, count) {
            (Some(a), Some(b)) => Some(a.saturating_add(b)),
            (a, b) => a.or(b),
        };
    } else {
        catches.push(DraftCatch {
            species: species.to_string(),
            count,
        });
    }
}

/// Display name of a known species, matched against the whole text.
pub fn known_species(text: &str) -> Option<&'static str> {
    let normalized = normalize(text);
    let words = tokens(&normalized);
    (0..words.len()).find_map(|i| species_at(&words, i).map(|(name, _)| name))
}

fn species_at(words: &[&str], i: usize) -> Option<(&'static str, usize)> {
    SPECIES.iter().find_map(|(key, display)| {
        let parts: Vec<&str> = key.split(' ').collect();
        if i + parts.len() > words.len() {
            return None;
        }
        parts
            .iter()
            .zip(&words[i..])
            .all(|(base, word)| matches_word(base, word))
            .then_some((*display, parts.len()))
    })
}

/// Singular, `-s` plural, or `-es` plural of `base`.
fn matches_word(base: &str, word: &str) -> bool {
    word == base
        || word
            .strip_suffix('s')
            .is_some_and(|w| w == base || w.strip_suffix('e') == Some(base))
}

/// A date written as `hoy`, `ayer`, `anteayer`, `dd/mm`, `dd/mm/yyyy`,
/// `dd-mm-yyyy` or `yyyy-mm-dd`.
///
/// `dd/mm` without a year means the most recent such day up to `today`.
pub fn parse_date(text: &str, today: Date) -> Option<Date> {
    let normalized = normalize(text);
    for word in tokens(&normalized) {
        match word {
            "hoy" => return Some(today),
            "ayer" => return today.yesterday().ok(),
            "anteayer" => return today.yesterday().ok()?.yesterday().ok(),
            _ => {}
        }
        if let Some(date) = numeric_date(word, today) {
            return Some(date);
        }
    }
    None
}

fn numeric_date(token: &str, today: Date) -> Option<Date> {
    let parts: Vec<&str> = if token.contains('/') {
        token.split('/').collect()
    } else if token.contains('-') {
        if let Ok(date) = token.parse::<Date>() {
            return Some(date);
        }
        let parts: Vec<&str> = token.split('-').collect();
        if parts.len() != 3 {
            return None;
        }
        parts
    } else {
        return None;
    };

    let (day, month, year) = match parts.as_slice() {
        [d, m] => (*d, *m, None),
        [d, m, y] => (*d, *m, Some(*y)),
        _ => return None,
    };
    let day: i8 = day.parse().ok()?;
    let month: i8 = month.parse().ok()?;
    match year {
        Some(y) => {
            let mut year: i16 = y.parse().ok()?;
            if y.len() == 2 {
                year += 2000;
            }
            Date::new(year, month, day).ok()
        }
        None => {
            let this_year = Date::new(today.year(), month, day).ok()?;
            if this_year > today {
                Date::new(today.year() - 1, month, day).ok()
            } else {
                Some(this_year)
            }
        }
    }
}

/// A clock time written as `7:30`, `07:30`, `7h`, `7h30` or a bare hour.
pub fn parse_time(token: &str) -> Option<Time> {
    let (hour, minute) = if let Some((h, m)) = token.split_once(':') {
        (h, m)
    } else if let Some((h, m)) = token.split_once('h') {
        (h, if m.is_empty() { "0" } else { m })
    } else {
        (token, "0")
    };
    let hour: i8 = hour.parse().ok()?;
    let minute: i8 = minute.parse().ok()?;
    if !(0..24).contains(&hour) || !(0..60).contains(&minute) {
        return None;
    }
    Time::new(hour, minute, 0, 0).ok()
}

/// Whether a token is unmistakably a time (`7:30`, `7h`), not a count.
fn is_explicit_time(token: &str) -> bool {
    (token.contains(':') || token.contains('h')) && parse_time(token).is_some()
}

/// The first time found in the text, bare hours included.
pub fn parse_single_time(text: &str) -> Option<Time> {
    let normalized = normalize(text);
    let words = tokens(&normalized);
    words
        .iter()
        .find(|w| is_explicit_time(w))
        .or_else(|| words.iter().find(|w| parse_time(w).is_some()))
        .and_then(|w| parse_time(w))
}

/// Start and end times: "de 7 a 12:30", "desde las 6 hasta las 10",
/// "entre las 6 y las 9". A lone explicit time counts as the start.
pub fn parse_time_range(text: &str) -> (Option<Time>, Option<Time>) {
    let normalized = normalize(text);
    let words = tokens(&normalized);
    let mut start_only = None;

    for (i, word) in words.iter().enumerate() {
        if !matches!(*word, "de" | "desde" | "entre" | "a") {
            continue;
        }
        let Some((start, next)) = time_after(&words, i + 1) else {
            continue;
        };
        if *word != "a"
            && let Some(separator) = words.get(next)
            && matches!(*separator, "a" | "hasta" | "y")
            && let Some((end, _)) = time_after(&words, next + 1)
        {
            return (Some(start), Some(end));
        }
        let introduced = matches!(*word, "desde" | "a") && words.get(i + 1) == Some(&"las");
        if start_only.is_none() && (introduced || is_explicit_time(words[next - 1])) {
            start_only = Some(start);
        }
    }

    let start = start_only.or_else(|| {
        words
            .iter()
            .find(|w| is_explicit_time(w))
            .and_then(|w| parse_time(w))
    });
    (start, None)
}

fn time_after(words: &[&str], mut j: usize) -> Option<(Time, usize)> {
    while words.get(j).is_some_and(|w| matches!(*w, "las" | "la")) {
        j += 1;
    }
    let time = parse_time(words.get(j)?)?;
    Some((time, j + 1))
}

/// How the angler fished, from keywords like "orilla", "barco" or "kayak".
pub fn parse_trip_type(text: &str) -> Option<TripType> {
    let normalized = normalize(text);
    tokens(&normalized).into_iter().find_map(|word| {
        TripType::ALL
            .into_iter()
            .find(|t| trip_type_words(*t).contains(&word))
    })
}

fn trip_type_words(trip_type: TripType) -> &'static [&'static str] {
    match trip_type {
        TripType::Shore => SHORE,
        TripType::Boat => BOAT,
        TripType::Kayak => KAYAK,
        TripType::Spearfishing => SPEARFISHING,
    }
}

/// Number of rods from "2 cañas" or "con una caña".
pub fn parse_rods(text: &str) -> Option<u32> {
    let normalized = normalize(text);
    let words = tokens(&normalized);
    words.iter().enumerate().find_map(|(i, word)| {
        if !matches!(*word, "cana" | "canas") {
            return None;
        }
        number(words.get(i.checked_sub(1)?)?)
    })
}

/// Decimal coordinates written as "lat, lon".
pub fn parse_coordinates(text: &str) -> Option<(f64, f64)> {
    let (lat, lon) = text.split_once(',')?;
    let lat: f64 = lat.trim().parse().ok()?;
    let lon: f64 = lon.trim().parse().ok()?;
    ((-90.0..=90.0).contains(&lat) && (-180.0..=180.0).contains(&lon)).then_some((lat, lon))
}

/// A place introduced by "en" or "desde" and written with capitals
/// ("en el Puerto de Vigo"), or a pair of coordinates.
pub fn parse_location(text: &str) -> Option<Location> {
    if let Some((lat, lon)) = parse_coordinates(text) {
        return Some(Location {
            name: format!("{lat}, {lon}"),
            latitude: Some(lat),
            longitude: Some(lon),
        });
    }

    let words: Vec<&str> = text
        .split(|c: char| c.is_whitespace() || matches!(c, ',' | '.' | ';' | '!' | '?'))
        .filter(|w| !w.is_empty())
        .collect();
    for (i, word) in words.iter().enumerate() {
        let lower = word.to_lowercase();
        if lower != "en" && lower != "desde" {
            continue;
        }
        let mut k = i + 1;
        while words
            .get(k)
            .is_some_and(|w| ARTICLES.contains(&w.to_lowercase().as_str()))
        {
            k += 1;
        }
        let mut name = Vec::new();
        while let Some(word) = words.get(k) {
            if starts_upper(word) {
                name.push(*word);
            } else if !name.is_empty()
                && CONNECTORS.contains(&word.to_lowercase().as_str())
                && words.get(k + 1).is_some_and(|w| starts_upper(w))
            {
                name.push(*word);
            } else {
                break;
            }
            k += 1;
        }
        if !name.is_empty() {
            return Some(Location::named(name.join(" ")));
        }
    }
    None
}

fn starts_upper(word: &str) -> bool {
    word.chars().next().is_some_and(char::is_uppercase)
}

/// Capitalises the first letter of a free-form species name.
pub fn capitalize(text: &str) -> String {
    let mut chars = text.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}
