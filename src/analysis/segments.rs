//! Per-cohort and per-area views built on the aggregator primitives.

use super::aggregator::{
    cohort_order, column, count_present, cross_tabulate, mode, token_frequencies,
};
use super::AnalysisError;
use crate::models::{Count, CrossTab, FrequencyMap, OrderedMap, TopCourse};
use crate::survey::{CourseArea, Field, ResponseTable};
use tracing::debug;

/// Rows of `table` grouped by cohort, cohorts in [`cohort_order`].
fn rows_by_cohort(table: &ResponseTable) -> Result<Vec<(&str, Vec<usize>)>, AnalysisError> {
    let cohorts = column(table, Field::Cohort)?;
    let mut groups: Vec<(&str, Vec<usize>)> = Vec::new();

    for (row, cohort) in cohorts.into_iter().enumerate() {
        let Some(cohort) = cohort else { continue };
        match groups.iter_mut().find(|(c, _)| *c == cohort) {
            Some((_, rows)) => rows.push(row),
            None => groups.push((cohort, vec![row])),
        }
    }

    groups.sort_by(|a, b| cohort_order(a.0, b.0));
    Ok(groups)
}

/// Most frequent answer of `field` within each cohort.
///
/// Cohorts with no answers for `field` are left out.
pub fn mode_by_cohort(
    table: &ResponseTable,
    field: Field,
) -> Result<OrderedMap<String>, AnalysisError> {
    let values = column(table, field)?;
    let groups = rows_by_cohort(table)?;

    Ok(groups
        .into_iter()
        .filter_map(|(cohort, rows)| {
            mode(rows.iter().map(|&r| values[r])).map(|(answer, _)| (cohort.to_string(), answer))
        })
        .collect())
}

/// Cohort × willingness counts.
pub fn willingness_by_cohort(table: &ResponseTable) -> Result<CrossTab, AnalysisError> {
    let cohorts = column(table, Field::Cohort)?;
    let willingness = column(table, Field::Willingness)?;
    Ok(cross_tabulate(cohorts.into_iter().zip(willingness)))
}

/// Most mentioned course per cohort, across every course area present.
///
/// Area columns missing from the export are skipped; if none are present
/// the result is an error for the first area.
pub fn top_course_by_cohort(
    table: &ResponseTable,
) -> Result<OrderedMap<TopCourse>, AnalysisError> {
    let areas: Vec<Vec<Option<&str>>> = CourseArea::ALL
        .iter()
        .filter_map(|area| column(table, area.field()).ok())
        .collect();
    if areas.is_empty() {
        return Err(AnalysisError::MissingColumn {
            field: CourseArea::ALL[0].field(),
        });
    }

    let groups = rows_by_cohort(table)?;
    let mut result = OrderedMap::new();
    for (cohort, rows) in groups {
        let cells = rows
            .iter()
            .flat_map(|&r| areas.iter().map(move |area| area[r]));
        let top = token_frequencies(cells, Some(1));
        match top.first() {
            Some((course, count)) => result.push(
                cohort,
                TopCourse {
                    course: course.to_string(),
                    count: *count,
                },
            ),
            None => debug!("cohort {} mentioned no courses", cohort),
        }
    }

    Ok(result)
}

/// Respondents who answered each course area, keyed by area label.
///
/// Returns the counts for the areas present and one error per missing area.
pub fn interest_by_area(table: &ResponseTable) -> (FrequencyMap, Vec<AnalysisError>) {
    let mut interest = FrequencyMap::new();
    let mut errors = Vec::new();

    for area in CourseArea::ALL {
        match column(table, area.field()) {
            Ok(cells) => interest.push(area.label(), Count(count_present(cells))),
            Err(e) => {
                interest.push(area.label(), Count(0));
                errors.push(e);
            }
        }
    }

    (interest, errors)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::survey::testing::table;

    const FIELDS: &[Field] = &[
        Field::Cohort,
        Field::Modality,
        Field::Willingness,
        Field::NetworkingCourses,
        Field::ProgrammingCourses,
    ];

    fn sample() -> ResponseTable {
        table(
            FIELDS,
            &[
                &["3ro", "Virtual", "Sí", "CCNA 1", "Python"],
                &["1ro", "Presencial", "No", "", "Python, Java"],
                &["3ro", "Virtual", "Tal vez", "CCNA 1, CyberOps", ""],
                &["1ro", "Virtual", "Sí", "", "Java"],
                &["3ro", "Presencial", "", "", ""],
                &["", "Híbrida", "Sí", "IoT", ""],
            ],
        )
    }

    #[test]
    fn test_mode_by_cohort() {
        let modes = mode_by_cohort(&sample(), Field::Modality).unwrap();
        let entries: Vec<(&str, &str)> = modes.iter().map(|(k, v)| (k, v.as_str())).collect();
        // 1ro ties 1-1: Presencial was seen first
        assert_eq!(entries, vec![("1ro", "Presencial"), ("3ro", "Virtual")]);
    }

    #[test]
    fn test_willingness_by_cohort_skips_absent() {
        let tab = willingness_by_cohort(&sample()).unwrap();
        assert_eq!(tab.rows.len(), 2);
        assert_eq!(tab.rows.get("3ro").map(|r| r.total()), Some(2));
        assert_eq!(tab.rows.get("1ro").map(|r| r.total()), Some(2));
    }

    #[test]
    fn test_top_course_by_cohort_combines_areas() {
        let top = top_course_by_cohort(&sample()).unwrap();
        assert_eq!(
            top.get("1ro"),
            Some(&TopCourse {
                course: "Java".to_string(),
                count: Count(2),
            })
        );
        assert_eq!(top.get("3ro").map(|t| t.course.as_str()), Some("CCNA 1"));
    }

    #[test]
    fn test_top_course_without_any_area_is_an_error() {
        let t = table(&[Field::Cohort], &[&["1ro"]]);
        assert!(top_course_by_cohort(&t).is_err());
    }

    #[test]
    fn test_interest_by_area_reports_missing_areas() {
        let (interest, errors) = interest_by_area(&sample());
        assert_eq!(interest.get("Redes y Ciberseguridad"), Some(&Count(3)));
        assert_eq!(interest.get("Programación"), Some(&Count(3)));
        assert_eq!(interest.get("IA y Ciencia de Datos"), Some(&Count(0)));
        assert_eq!(interest.len(), 4);
        assert_eq!(errors.len(), 2);
    }

    #[test]
    fn test_missing_cohort_column() {
        let t = table(&[Field::Modality], &[&["Virtual"]]);
        assert!(mode_by_cohort(&t, Field::Modality).is_err());
        assert!(willingness_by_cohort(&t).is_err());
    }
}
