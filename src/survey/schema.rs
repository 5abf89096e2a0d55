//! Logical survey fields and their mapping to export headers.
//!
//! The export is keyed by the full question text. Each question the
//! aggregations use is named by a [`Field`]; a [`Schema`] holds the header
//! text expected for every field, and [`Schema::resolve`] maps a concrete
//! header row onto column indices once, at load time.

use super::SurveyError;
use std::collections::{BTreeMap, HashMap};
use std::fmt;

/// A question column the aggregations know about.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Field {
    /// Academic term the respondent is in.
    Cohort,
    PriorExperience,
    NetworkingCourses,
    AiDataCourses,
    ProgrammingCourses,
    HardwareOsCourses,
    Modality,
    Willingness,
    Schedule,
    Suggestions,
}

impl Field {
    pub const ALL: [Field; 10] = [
        Field::Cohort,
        Field::PriorExperience,
        Field::NetworkingCourses,
        Field::AiDataCourses,
        Field::ProgrammingCourses,
        Field::HardwareOsCourses,
        Field::Modality,
        Field::Willingness,
        Field::Schedule,
        Field::Suggestions,
    ];

    /// Stable key used in configuration files and messages.
    pub fn key(&self) -> &'static str {
        match self {
            Field::Cohort => "cohort",
            Field::PriorExperience => "prior_experience",
            Field::NetworkingCourses => "networking_courses",
            Field::AiDataCourses => "ai_data_courses",
            Field::ProgrammingCourses => "programming_courses",
            Field::HardwareOsCourses => "hardware_os_courses",
            Field::Modality => "modality",
            Field::Willingness => "willingness",
            Field::Schedule => "schedule",
            Field::Suggestions => "suggestions",
        }
    }

    /// Header text of the question in the stock form export.
    pub fn default_header(&self) -> &'static str {
        match self {
            Field::Cohort => "¿En qué ciclo se encuentra actualmente?",
            Field::PriorExperience => {
                "¿Ha tomado anteriormente algún curso en la plataforma Cisco NetAcad?"
            }
            Field::NetworkingCourses => "Redes y ciberseguridad",
            Field::AiDataCourses => "IA y Ciencia de Datos",
            Field::ProgrammingCourses => "Programación",
            Field::HardwareOsCourses => "Hardware y Sistemas Operativos",
            Field::Modality => "¿Qué modalidad prefiere para tomar estos cursos?",
            Field::Willingness => {
                "¿Qué tan dispuesto/a estaría a participar en un curso opcional de este tipo durante el semestre?"
            }
            Field::Schedule => {
                "¿Qué días y horarios prefiere para tomar este tipo de cursos presenciales o síncronos?"
            }
            Field::Suggestions => {
                "¿Qué sugerencias tiene para estos cursos o qué otros temas le gustaría que se incluyan?"
            }
        }
    }

    pub fn from_key(key: &str) -> Option<Field> {
        Field::ALL.iter().copied().find(|f| f.key() == key)
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

/// A course catalogue area. Each area is one multi-select question.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CourseArea {
    Networking,
    AiData,
    Programming,
    HardwareOs,
}

impl CourseArea {
    pub const ALL: [CourseArea; 4] = [
        CourseArea::Networking,
        CourseArea::AiData,
        CourseArea::Programming,
        CourseArea::HardwareOs,
    ];

    pub fn field(&self) -> Field {
        match self {
            CourseArea::Networking => Field::NetworkingCourses,
            CourseArea::AiData => Field::AiDataCourses,
            CourseArea::Programming => Field::ProgrammingCourses,
            CourseArea::HardwareOs => Field::HardwareOsCourses,
        }
    }

    /// Human-readable label, used as the `interest_by_area` key.
    pub fn label(&self) -> &'static str {
        match self {
            CourseArea::Networking => "Redes y Ciberseguridad",
            CourseArea::AiData => "IA y Ciencia de Datos",
            CourseArea::Programming => "Programación",
            CourseArea::HardwareOs => "Hardware y SO",
        }
    }

    /// Key under `popular_courses`.
    pub fn key(&self) -> &'static str {
        match self {
            CourseArea::Networking => "networking_security",
            CourseArea::AiData => "ai_data_science",
            CourseArea::Programming => "programming",
            CourseArea::HardwareOs => "hardware_os",
        }
    }

    /// Section heading in the narrative report.
    pub fn title(&self) -> &'static str {
        match self {
            CourseArea::Networking => "Networking and Cybersecurity",
            CourseArea::AiData => "AI and Data Science",
            CourseArea::Programming => "Programming",
            CourseArea::HardwareOs => "Hardware and Operating Systems",
        }
    }
}

/// Compare header text ignoring surrounding and repeated whitespace.
///
/// Form exports routinely carry trailing spaces and doubled spaces inside
/// question titles.
pub fn normalize_header(raw: &str) -> String {
    raw.trim_start_matches('\u{feff}')
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

/// Expected header text for every field.
#[derive(Debug, Clone)]
pub struct Schema {
    headers: HashMap<Field, String>,
}

impl Default for Schema {
    fn default() -> Self {
        Self {
            headers: Field::ALL
                .iter()
                .map(|f| (*f, normalize_header(f.default_header())))
                .collect(),
        }
    }
}

impl Schema {
    /// Default schema with per-field header overrides keyed by [`Field::key`].
    pub fn with_overrides(overrides: &BTreeMap<String, String>) -> Result<Self, SurveyError> {
        let mut schema = Self::default();
        for (key, header) in overrides {
            let field = Field::from_key(key).ok_or_else(|| SurveyError::UnknownField {
                key: key.clone(),
            })?;
            schema.headers.insert(field, normalize_header(header));
        }
        Ok(schema)
    }

    pub fn header(&self, field: Field) -> &str {
        self.headers.get(&field).map(String::as_str).unwrap_or("")
    }

    /// Map a header row onto field columns. The first matching column wins.
    pub fn resolve<S: AsRef<str>>(&self, header_row: &[S]) -> ResolvedSchema {
        let normalized: Vec<String> = header_row
            .iter()
            .map(|h| normalize_header(h.as_ref()))
            .collect();

        let mut columns = HashMap::new();
        let mut missing = Vec::new();
        for field in Field::ALL {
            let expected = self.header(field);
            match normalized.iter().position(|h| h == expected) {
                Some(idx) => {
                    columns.insert(field, idx);
                }
                None => missing.push(field),
            }
        }

        ResolvedSchema { columns, missing }
    }

    /// The expected headers, one per line, for error messages.
    pub fn describe(&self) -> String {
        Field::ALL
            .iter()
            .map(|f| format!("  {}: \"{}\"", f.key(), self.header(*f)))
            .collect::<Vec<_>>()
            .join("\n")
    }
}

/// Which fields a concrete export provides, and where.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResolvedSchema {
    columns: HashMap<Field, usize>,
    missing: Vec<Field>,
}

impl ResolvedSchema {
    /// A schema where the given fields occupy columns `0..n` in order.
    #[cfg(test)]
    pub fn with_fields(fields: &[Field]) -> Self {
        let columns: HashMap<Field, usize> =
            fields.iter().enumerate().map(|(i, f)| (*f, i)).collect();
        let missing = Field::ALL
            .iter()
            .copied()
            .filter(|f| !columns.contains_key(f))
            .collect();
        Self { columns, missing }
    }

    pub fn column(&self, field: Field) -> Option<usize> {
        self.columns.get(&field).copied()
    }

    pub fn is_present(&self, field: Field) -> bool {
        self.columns.contains_key(&field)
    }

    pub fn missing(&self) -> &[Field] {
        &self.missing
    }

    pub fn found_count(&self) -> usize {
        self.columns.len()
    }

    /// `(field, column)` pairs in [`Field::ALL`] order.
    pub fn present(&self) -> impl Iterator<Item = (Field, usize)> + '_ {
        Field::ALL
            .iter()
            .filter_map(move |f| self.column(*f).map(|c| (*f, c)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_header_collapses_whitespace() {
        assert_eq!(
            normalize_header("Hardware  y Sistemas Operativos"),
            "Hardware y Sistemas Operativos"
        );
        assert_eq!(normalize_header("Redes y ciberseguridad "), "Redes y ciberseguridad");
        assert_eq!(normalize_header("\u{feff}Marca temporal"), "Marca temporal");
    }

    #[test]
    fn test_field_keys_round_trip() {
        for field in Field::ALL {
            assert_eq!(Field::from_key(field.key()), Some(field));
        }
        assert_eq!(Field::from_key("nope"), None);
    }

    #[test]
    fn test_resolve_stock_headers() {
        let headers = vec![
            "Marca temporal".to_string(),
            "¿En qué ciclo se encuentra actualmente?".to_string(),
            "Redes y ciberseguridad ".to_string(),
            "Hardware  y Sistemas Operativos".to_string(),
        ];
        let resolved = Schema::default().resolve(&headers);

        assert_eq!(resolved.column(Field::Cohort), Some(1));
        assert_eq!(resolved.column(Field::NetworkingCourses), Some(2));
        assert_eq!(resolved.column(Field::HardwareOsCourses), Some(3));
        assert!(!resolved.is_present(Field::Modality));
        assert_eq!(resolved.found_count(), 3);
        assert_eq!(resolved.missing().len(), Field::ALL.len() - 3);
    }

    #[test]
    fn test_overrides_replace_expected_header() {
        let mut overrides = BTreeMap::new();
        overrides.insert("cohort".to_string(), "Semester".to_string());
        let schema = Schema::with_overrides(&overrides).unwrap();

        let resolved = schema.resolve(&["Semester"]);
        assert_eq!(resolved.column(Field::Cohort), Some(0));
    }

    #[test]
    fn test_unknown_override_key_is_rejected() {
        let mut overrides = BTreeMap::new();
        overrides.insert("favourite_colour".to_string(), "Colour".to_string());
        let err = Schema::with_overrides(&overrides).unwrap_err();
        assert!(err.to_string().contains("favourite_colour"));
    }

    #[test]
    fn test_with_fields_lists_the_rest_as_missing() {
        let resolved = ResolvedSchema::with_fields(&[Field::Modality, Field::Cohort]);
        assert_eq!(resolved.column(Field::Modality), Some(0));
        assert_eq!(resolved.column(Field::Cohort), Some(1));
        assert!(resolved.missing().contains(&Field::Schedule));
        let present: Vec<Field> = resolved.present().map(|(f, _)| f).collect();
        assert_eq!(present, vec![Field::Cohort, Field::Modality]);
    }
}
