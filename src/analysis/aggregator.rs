//! Frequency aggregation over survey columns.
//!
//! This module provides the counting primitives every report section is
//! built from: splitting multi-select answers into tokens, tallying
//! single-answer questions, and cross-tabulating two columns.

use super::AnalysisError;
use crate::models::{Count, CrossTab, FrequencyMap, Tally, TallyEntry};
use crate::survey::{Field, ResponseTable};
use std::cmp::Ordering;
use std::collections::HashMap;

/// Split a multi-select answer into its tokens.
///
/// Splits on commas, trims each fragment and drops empty ones. Applying it
/// to a token it produced yields that token unchanged.
pub fn normalize_tokens(raw: &str) -> impl Iterator<Item = &str> {
    raw.split(',').map(str::trim).filter(|t| !t.is_empty())
}

/// Counts in first-seen order.
fn count_in_order<'a, I: IntoIterator<Item = &'a str>>(items: I) -> Vec<(&'a str, usize)> {
    let mut index: HashMap<&'a str, usize> = HashMap::new();
    let mut counts: Vec<(&'a str, usize)> = Vec::new();

    for item in items {
        match index.get(item) {
            Some(&i) => counts[i].1 += 1,
            None => {
                index.insert(item, counts.len());
                counts.push((item, 1));
            }
        }
    }

    counts
}

/// Sort by count descending and keep the first `limit` entries.
///
/// The sort is stable, so among equal counts the value counted first ranks
/// first; that includes ties that straddle the `limit` cutoff.
fn rank<'a>(mut counts: Vec<(&'a str, usize)>, limit: Option<usize>) -> Vec<(&'a str, usize)> {
    counts.sort_by(|a, b| b.1.cmp(&a.1));
    if let Some(n) = limit {
        counts.truncate(n);
    }
    counts
}

/// Count tokens across multi-select answers.
///
/// Absent cells are skipped; each present cell contributes one count per
/// token from [`normalize_tokens`]. With a `limit`, only the top-N tokens
/// are kept.
pub fn token_frequencies<'a, I>(cells: I, limit: Option<usize>) -> FrequencyMap
where
    I: IntoIterator<Item = Option<&'a str>>,
{
    let tokens = cells.into_iter().flatten().flat_map(|cell| normalize_tokens(cell));
    rank(count_in_order(tokens), limit)
        .into_iter()
        .map(|(token, n)| (token.to_string(), Count(n)))
        .collect()
}

/// Count exact answers, with each answer's share of the non-absent total.
pub fn single_answer_tally<'a, I>(cells: I) -> Tally
where
    I: IntoIterator<Item = Option<&'a str>>,
{
    let counts = rank(count_in_order(cells.into_iter().flatten()), None);
    let total: usize = counts.iter().map(|(_, n)| n).sum();

    counts
        .into_iter()
        .map(|(answer, n)| {
            let percentage = if total == 0 {
                0.0
            } else {
                n as f64 / total as f64 * 100.0
            };
            (
                answer.to_string(),
                TallyEntry {
                    count: Count(n),
                    percentage,
                },
            )
        })
        .collect()
}

/// The most frequent exact answer and its count.
pub fn mode<'a, I>(cells: I) -> Option<(String, usize)>
where
    I: IntoIterator<Item = Option<&'a str>>,
{
    rank(count_in_order(cells.into_iter().flatten()), Some(1))
        .into_iter()
        .next()
        .map(|(answer, n)| (answer.to_string(), n))
}

/// Number of present cells.
pub fn count_present<'a, I>(cells: I) -> usize
where
    I: IntoIterator<Item = Option<&'a str>>,
{
    cells.into_iter().flatten().count()
}

/// Cohort → (category → count) over paired cells.
///
/// Pairs with either side absent are skipped. Cohorts are ordered by
/// [`cohort_order`]; categories keep first-seen order and are zero-filled
/// in every row.
pub fn cross_tabulate<'a, I>(pairs: I) -> CrossTab
where
    I: IntoIterator<Item = (Option<&'a str>, Option<&'a str>)>,
{
    let mut categories: Vec<&str> = Vec::new();
    let mut cells: HashMap<(&str, &str), usize> = HashMap::new();
    let mut cohorts: Vec<&str> = Vec::new();

    for (cohort, category) in pairs {
        let (Some(cohort), Some(category)) = (cohort, category) else {
            continue;
        };
        if !cohorts.contains(&cohort) {
            cohorts.push(cohort);
        }
        if !categories.contains(&category) {
            categories.push(category);
        }
        *cells.entry((cohort, category)).or_default() += 1;
    }

    cohorts.sort_by(|a, b| cohort_order(a, b));

    let rows = cohorts
        .into_iter()
        .map(|cohort| {
            let row: FrequencyMap = categories
                .iter()
                .map(|category| {
                    let n = cells.get(&(cohort, *category)).copied().unwrap_or(0);
                    (category.to_string(), Count(n))
                })
                .collect();
            (cohort.to_string(), row)
        })
        .collect();

    CrossTab { rows }
}

/// Order cohort labels the way people read academic terms.
///
/// Labels containing digits come first, by the value of their first digit
/// run ("2do ciclo" before "10mo ciclo"); labels without digits follow.
/// Remaining ties fall back to the text.
pub fn cohort_order(a: &str, b: &str) -> Ordering {
    match (leading_number(a), leading_number(b)) {
        (Some(x), Some(y)) => x.cmp(&y).then_with(|| a.cmp(b)),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => a.cmp(b),
    }
}

fn leading_number(label: &str) -> Option<u64> {
    let digits: String = label
        .chars()
        .skip_while(|c| !c.is_ascii_digit())
        .take_while(|c| c.is_ascii_digit())
        .collect();
    digits.parse().ok()
}

/// Cells of `field`, or [`AnalysisError::MissingColumn`].
pub fn column(table: &ResponseTable, field: Field) -> Result<Vec<Option<&str>>, AnalysisError> {
    table
        .column(field)
        .ok_or(AnalysisError::MissingColumn { field })
}

/// [`token_frequencies`] over one column.
pub fn field_token_frequencies(
    table: &ResponseTable,
    field: Field,
    limit: Option<usize>,
) -> Result<FrequencyMap, AnalysisError> {
    Ok(token_frequencies(column(table, field)?, limit))
}

/// [`single_answer_tally`] over one column.
pub fn field_tally(table: &ResponseTable, field: Field) -> Result<Tally, AnalysisError> {
    Ok(single_answer_tally(column(table, field)?))
}

/// Free-text answers, minus blanks and trivial negatives.
///
/// `stoplist` entries match case-insensitively against the trimmed answer.
pub fn suggestions(
    table: &ResponseTable,
    field: Field,
    stoplist: &[String],
) -> Result<Vec<String>, AnalysisError> {
    let stop: Vec<String> = stoplist.iter().map(|s| s.trim().to_lowercase()).collect();
    Ok(column(table, field)?
        .into_iter()
        .flatten()
        .map(str::trim)
        .filter(|s| !s.is_empty() && !stop.contains(&s.to_lowercase()))
        .map(String::from)
        .collect())
}

/// Respondents per answer of `field` (usually the cohort column).
pub fn group_sizes(table: &ResponseTable, field: Field) -> Result<FrequencyMap, AnalysisError> {
    let mut counts = count_in_order(column(table, field)?.into_iter().flatten());
    counts.sort_by(|a, b| cohort_order(a.0, b.0));
    Ok(counts
        .into_iter()
        .map(|(k, n)| (k.to_string(), Count(n)))
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::survey::testing::table;

    fn pairs(map: &FrequencyMap) -> Vec<(&str, usize)> {
        map.iter().map(|(k, v)| (k, v.get())).collect()
    }

    #[test]
    fn test_token_frequencies_basic() {
        let cells = vec![Some("A, B"), Some("B"), Some("A,B,C")];
        let result = token_frequencies(cells, None);
        assert_eq!(pairs(&result), vec![("B", 3), ("A", 2), ("C", 1)]);
    }

    #[test]
    fn test_token_frequencies_all_empty() {
        let cells = vec![Some(""), Some(","), Some(" , ")];
        assert!(token_frequencies(cells, None).is_empty());
        assert!(token_frequencies(Vec::<Option<&str>>::new(), None).is_empty());
        assert!(token_frequencies(vec![None, None], Some(3)).is_empty());
    }

    #[test]
    fn test_token_total_matches_fragment_count() {
        let cells = vec![
            Some(" CCNA 1 ,, CyberOps"),
            None,
            Some("Python,Python , Java"),
            Some("   "),
            Some("Linux"),
        ];
        let expected: usize = cells
            .iter()
            .flatten()
            .map(|c| c.split(',').filter(|f| !f.trim().is_empty()).count())
            .sum();

        let result = token_frequencies(cells, None);
        assert_eq!(result.total(), expected);
        assert_eq!(result.total(), 6);
    }

    #[test]
    fn test_normalization_is_idempotent() {
        let raw = vec![Some(" a ,b,, c "), Some("b , a")];
        let first = token_frequencies(raw.clone(), None);

        let renormalized: Vec<String> = raw
            .iter()
            .flatten()
            .map(|c| normalize_tokens(c).collect::<Vec<_>>().join(","))
            .collect();
        let second = token_frequencies(renormalized.iter().map(|s| Some(s.as_str())), None);

        assert_eq!(first, second);
    }

    #[test]
    fn test_limit_keeps_first_counted_on_ties() {
        let cells = vec![Some("x, y"), Some("z"), Some("y, z, x")];
        // all three tie at 2; x was counted first, then y
        let result = token_frequencies(cells, Some(2));
        assert_eq!(pairs(&result), vec![("x", 2), ("y", 2)]);
    }

    #[test]
    fn test_single_answer_tally_percentages() {
        let cells = vec![Some("Sí"), Some("No"), Some("Sí"), Some("Sí"), None];
        let tally = single_answer_tally(cells);

        let keys: Vec<&str> = tally.keys().collect();
        assert_eq!(keys, vec!["Sí", "No"]);
        assert_eq!(tally.get("Sí").map(|e| e.count), Some(Count(3)));
        assert_eq!(tally.get("Sí").map(|e| e.percentage), Some(75.0));
        assert_eq!(tally.get("No").map(|e| e.percentage), Some(25.0));

        let sum: f64 = tally.values().map(|e| e.percentage).sum();
        assert!((sum - 100.0).abs() < 1e-9);
        assert_eq!(tally.answered(), 4);
    }

    #[test]
    fn test_single_answer_tally_does_not_split() {
        let tally = single_answer_tally(vec![Some("Lunes, Martes"), Some("Lunes, Martes")]);
        assert_eq!(tally.len(), 1);
        assert!(single_answer_tally(Vec::<Option<&str>>::new()).is_empty());
    }

    #[test]
    fn test_mode_picks_first_on_tie() {
        assert_eq!(
            mode(vec![Some("Virtual"), Some("Presencial"), None]),
            Some(("Virtual".to_string(), 1))
        );
        assert_eq!(mode(vec![None]), None);
    }

    #[test]
    fn test_cross_tabulate_zero_fills_and_orders_cohorts() {
        let pairs = vec![
            (Some("10mo"), Some("Sí")),
            (Some("2do"), Some("No")),
            (Some("2do"), Some("Sí")),
            (None, Some("Sí")),
            (Some("2do"), None),
            (Some("Egresado"), Some("Tal vez")),
        ];
        let tab = cross_tabulate(pairs);

        let cohorts: Vec<&str> = tab.rows.keys().collect();
        assert_eq!(cohorts, vec!["2do", "10mo", "Egresado"]);

        let tenth = tab.rows.get("10mo").unwrap();
        let categories: Vec<&str> = tenth.keys().collect();
        assert_eq!(categories, vec!["Sí", "No", "Tal vez"]);
        assert_eq!(tenth.get("No"), Some(&Count(0)));
        assert_eq!(tab.rows.get("2do").map(|r| r.total()), Some(2));

        for (_, row) in tab.row_percentages().iter() {
            let sum: f64 = row.values().sum();
            assert!((sum - 100.0).abs() < 1e-9);
        }
    }

    #[test]
    fn test_cohort_order() {
        let mut labels = vec!["Egresado", "10mo ciclo", "2do ciclo", "Abierto", "2do"];
        labels.sort_by(|a, b| cohort_order(a, b));
        assert_eq!(
            labels,
            vec!["2do", "2do ciclo", "10mo ciclo", "Abierto", "Egresado"]
        );
    }

    #[test]
    fn test_missing_column_is_an_error() {
        let t = table(&[Field::Cohort], &[&["1"]]);
        let err = field_token_frequencies(&t, Field::Schedule, None).unwrap_err();
        assert_eq!(err, AnalysisError::MissingColumn { field: Field::Schedule });
        assert!(field_tally(&t, Field::Modality).is_err());
    }

    #[test]
    fn test_suggestions_filter_stoplist() {
        let t = table(
            &[Field::Suggestions],
            &[&["Más laboratorios"], &["Ninguna"], &[""], &["NO"], &["  Cursos de IoT "]],
        );
        let stop = vec!["ninguna".to_string(), "no".to_string()];
        let result = suggestions(&t, Field::Suggestions, &stop).unwrap();
        assert_eq!(result, vec!["Más laboratorios", "Cursos de IoT"]);
    }

    #[test]
    fn test_group_sizes_in_cohort_order() {
        let t = table(&[Field::Cohort], &[&["3ro"], &["1ro"], &["3ro"], &[""]]);
        let sizes = group_sizes(&t, Field::Cohort).unwrap();
        assert_eq!(pairs(&sizes), vec![("1ro", 1), ("3ro", 2)]);
    }
}
