//! Builds the results document from a response table.

use crate::analysis::{
    field_tally, field_token_frequencies, group_sizes, interest_by_area, mode_by_cohort,
    suggestions, top_course_by_cohort, willingness_by_cohort, AnalysisError,
};
use crate::models::{
    CohortBreakdown, Count, OrderedMap, Preferences, ResultsDocument, ResultsMeta, Summary, Tally,
    DOCUMENT_VERSION,
};
use crate::survey::{CourseArea, Field, ResponseTable};
use chrono::{DateTime, Utc};
use tracing::{debug, warn};

/// Knobs for [`assemble`].
#[derive(Debug, Clone)]
pub struct AssemblyOptions {
    /// Courses kept per area under `popular_courses`.
    pub top_courses: usize,
    pub suggestion_stoplist: Vec<String>,
    /// Prior-experience answers counted as "yes" (case-insensitive).
    pub affirmative_answers: Vec<String>,
}

impl Default for AssemblyOptions {
    fn default() -> Self {
        let config = crate::config::AnalysisConfig::default();
        Self {
            top_courses: config.top_courses,
            suggestion_stoplist: config.suggestion_stoplist,
            affirmative_answers: config.affirmative_answers,
        }
    }
}

/// Collects degraded sections as `meta.warnings` lines.
#[derive(Default)]
struct Warnings(Vec<String>);

impl Warnings {
    /// Unwrap an aggregation, falling back to its empty value.
    fn recover<T: Default>(&mut self, section: &str, result: Result<T, AnalysisError>) -> T {
        match result {
            Ok(value) => value,
            Err(e) => {
                self.push(section, &e);
                T::default()
            }
        }
    }

    fn push(&mut self, section: &str, error: &AnalysisError) {
        warn!("{} left empty: {}", section, error);
        self.0.push(format!("{}: {}", section, error));
    }
}

/// Run every aggregation over `table` and gather the results.
///
/// A failing aggregation never aborts the others: its section is left
/// empty and the reason is recorded in `meta.warnings`.
pub fn assemble(
    table: &ResponseTable,
    options: &AssemblyOptions,
    generated_at: DateTime<Utc>,
) -> ResultsDocument {
    let mut warnings = Warnings::default();

    let preferences = Preferences {
        modality: warnings.recover("preferences.modality", field_tally(table, Field::Modality)),
        willingness: warnings.recover(
            "preferences.willingness",
            field_tally(table, Field::Willingness),
        ),
        schedules: warnings.recover(
            "preferences.schedules",
            field_token_frequencies(table, Field::Schedule, None),
        ),
    };

    let (interest, area_errors) = interest_by_area(table);
    for e in &area_errors {
        warnings.push("interest_by_area", e);
    }

    let mut popular_courses = OrderedMap::new();
    for area in CourseArea::ALL {
        // Errors already reported under interest_by_area.
        let courses =
            field_token_frequencies(table, area.field(), Some(options.top_courses)).unwrap_or_default();
        debug!("{}: {} distinct courses", area.key(), courses.len());
        popular_courses.push(area.key(), courses);
    }

    let willingness = warnings.recover("by_cohort.willingness", willingness_by_cohort(table));
    let by_cohort = CohortBreakdown {
        respondents: warnings.recover("by_cohort.respondents", group_sizes(table, Field::Cohort)),
        preferred_modality: warnings.recover(
            "by_cohort.preferred_modality",
            mode_by_cohort(table, Field::Modality),
        ),
        willingness_percentages: willingness.row_percentages(),
        willingness,
        top_course: warnings.recover("by_cohort.top_course", top_course_by_cohort(table)),
    };

    let prior_experience = warnings.recover(
        "prior_experience",
        field_tally(table, Field::PriorExperience),
    );
    let suggestions = warnings.recover(
        "suggestions",
        suggestions(table, Field::Suggestions, &options.suggestion_stoplist),
    );

    let total = Count(table.len());
    let summary = summarize(total, &preferences.modality, &prior_experience, options);

    ResultsDocument {
        meta: ResultsMeta {
            generated_at,
            version: DOCUMENT_VERSION.to_string(),
            total_responses: total,
            source: table.source().to_string(),
            warnings: warnings.0,
        },
        summary,
        preferences,
        interest_by_area: interest,
        popular_courses,
        by_cohort,
        prior_experience,
        suggestions,
    }
}

fn summarize(
    total: Count,
    modality: &Tally,
    prior_experience: &Tally,
    options: &AssemblyOptions,
) -> Summary {
    let with_prior_experience = prior_experience
        .iter()
        .filter(|(answer, _)| {
            options
                .affirmative_answers
                .iter()
                .any(|yes| yes.trim().to_lowercase() == answer.to_lowercase())
        })
        .map(|(_, entry)| entry.count.get())
        .sum();

    let (top_modality, top_modality_count) = match modality.first() {
        Some((answer, entry)) => (Some(answer.to_string()), entry.count),
        None => (None, Count(0)),
    };

    Summary {
        total_responses: total,
        with_prior_experience: Count(with_prior_experience),
        top_modality,
        top_modality_count,
    }
}
