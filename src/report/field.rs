//! The structured fields of a trip report that a conversation fills in.

use std::fmt;

use super::parse::normalize;

/// A field of the report being assembled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ReportField {
    Species,
    Count,
    Date,
    TripType,
    Rods,
    Location,
    StartTime,
    EndTime,
}

impl ReportField {
    /// Mandatory fields, in the order they are asked for.
    pub const MANDATORY: [Self; 5] = [
        Self::Species,
        Self::Count,
        Self::Date,
        Self::TripType,
        Self::Rods,
    ];

    pub const ALL: [Self; 8] = [
        Self::Species,
        Self::Count,
        Self::Date,
        Self::TripType,
        Self::Rods,
        Self::Location,
        Self::StartTime,
        Self::EndTime,
    ];

    pub fn is_mandatory(self) -> bool {
        Self::MANDATORY.contains(&self)
    }

    /// Short Spanish name, also accepted by [`ReportField::from_name`].
    pub fn label(self) -> &'static str {
        match self {
            Self::Species => "especies",
            Self::Count => "cantidad",
            Self::Date => "fecha",
            Self::TripType => "modalidad",
            Self::Rods => "cañas",
            Self::Location => "lugar",
            Self::StartTime => "inicio",
            Self::EndTime => "fin",
        }
    }

    /// The question the assistant asks to fill this field.
    pub fn prompt(self) -> &'static str {
        match self {
            Self::Species => "¿Qué especies capturaste? Por ejemplo: «2 lubinas y una dorada».",
            Self::Count => "¿Cuántas piezas capturaste?",
            Self::Date => "¿Qué día fue la jornada? Puedes decir «hoy», «ayer» o una fecha como 12/05/2024.",
            Self::TripType => "¿Pescaste desde orilla, embarcación, kayak o submarina?",
            Self::Rods => "¿Con cuántas cañas pescaste?",
            Self::Location => "¿Dónde pescaste? Dime el nombre del lugar o sus coordenadas.",
            Self::StartTime => "¿A qué hora empezaste?",
            Self::EndTime => "¿A qué hora terminaste?",
        }
    }

    /// Looks a field up by its Spanish name or a common synonym.
    pub fn from_name(name: &str) -> Option<Self> {
        let field = match normalize(name.trim()).as_str() {
            "especie" | "especies" | "peces" => Self::Species,
            "cantidad" | "numero" | "capturas" => Self::Count,
            "fecha" | "dia" => Self::Date,
            "modalidad" | "tipo" => Self::TripType,
            "cana" | "canas" => Self::Rods,
            "lugar" | "ubicacion" | "sitio" => Self::Location,
            "inicio" | "hora de inicio" => Self::StartTime,
            "fin" | "hora de fin" => Self::EndTime,
            _ => return None,
        };
        Some(field)
    }
}

impl fmt::Display for ReportField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn labels_round_trip_through_from_name() {
        for field in ReportField::ALL {
            assert_eq!(ReportField::from_name(field.label()), Some(field));
        }
    }

    #[test]
    fn synonyms_and_accents() {
        assert_eq!(ReportField::from_name(" Ubicación "), Some(ReportField::Location));
        assert_eq!(ReportField::from_name("día"), Some(ReportField::Date));
        assert_eq!(ReportField::from_name("cebo"), None);
    }

    #[test]
    fn optional_fields() {
        assert!(!ReportField::Location.is_mandatory());
        assert!(!ReportField::StartTime.is_mandatory());
        assert!(ReportField::Rods.is_mandatory());
    }
}
