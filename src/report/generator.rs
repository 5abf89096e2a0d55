//! Markdown report generation.
//!
//! This module renders the narrative report from a results document and
//! reads/writes the document itself.

use crate::models::{CohortBreakdown, FrequencyMap, ResultsDocument, ResultsMeta, Tally};
use crate::survey::CourseArea;
use anyhow::{Context, Result};
use std::io::Write;
use std::path::Path;
use tempfile::NamedTempFile;

/// Layout settings for [`generate_markdown_report`].
#[derive(Debug, Clone)]
pub struct ReportOptions {
    pub title: String,
    /// Rows per ranked table.
    pub max_table_rows: usize,
    pub max_suggestions: usize,
}

impl Default for ReportOptions {
    fn default() -> Self {
        let config = crate::config::ReportConfig::default();
        Self {
            title: config.title,
            max_table_rows: config.max_table_rows,
            max_suggestions: config.max_suggestions,
        }
    }
}

/// Generate a complete Markdown report.
pub fn generate_markdown_report(doc: &ResultsDocument, options: &ReportOptions) -> String {
    let mut output = String::new();

    // Title
    output.push_str(&format!("# {}\n\n", options.title));

    output.push_str(&generate_metadata_section(&doc.meta));
    output.push_str(&generate_summary_section(doc));
    output.push_str(&generate_preferences_section(doc, options));
    output.push_str(&generate_interest_section(&doc.interest_by_area));
    output.push_str(&generate_courses_section(doc, options));
    output.push_str(&generate_cohort_section(&doc.by_cohort));
    output.push_str(&generate_experience_section(&doc.prior_experience));
    output.push_str(&generate_suggestions_section(
        &doc.suggestions,
        options.max_suggestions,
    ));
    output.push_str(&generate_warnings_section(&doc.meta.warnings));
    output.push_str(&generate_recommendations_section(doc));
    output.push_str(&generate_footer(&doc.meta));

    output
}

/// Escape characters that would break a table cell.
fn cell(text: &str) -> String {
    text.replace('|', "\\|").replace('\n', " ")
}

fn frequency_table(heading: &str, map: &FrequencyMap, limit: usize) -> String {
    if map.is_empty() {
        return "*No answers recorded.*\n\n".to_string();
    }

    let mut table = String::new();
    table.push_str(&format!("| {} | Respondents |\n", heading));
    table.push_str("|:---|:---:|\n");
    for (value, count) in map.iter().take(limit) {
        table.push_str(&format!("| {} | {} |\n", cell(value), count));
    }
    table.push('\n');
    table
}

fn tally_table(heading: &str, tally: &Tally) -> String {
    if tally.is_empty() {
        return "*No answers recorded.*\n\n".to_string();
    }

    let mut table = String::new();
    table.push_str(&format!("| {} | Respondents | Share |\n", heading));
    table.push_str("|:---|:---:|:---:|\n");
    for (value, entry) in tally.iter() {
        table.push_str(&format!(
            "| {} | {} | {:.1}% |\n",
            cell(value),
            entry.count,
            entry.percentage
        ));
    }
    table.push_str(&format!("\n*{} respondents answered.*\n\n", tally.answered()));
    table
}

/// Generate the metadata section.
fn generate_metadata_section(meta: &ResultsMeta) -> String {
    let mut section = String::new();

    section.push_str("## Metadata\n\n");
    section.push_str(&format!("- **Source:** `{}`\n", meta.source));
    section.push_str(&format!(
        "- **Generated:** {}\n",
        meta.generated_at.format("%Y-%m-%d %H:%M:%S UTC")
    ));
    section.push_str(&format!("- **Responses:** {}\n", meta.total_responses));
    section.push_str(&format!("- **Document Version:** {}\n", meta.version));
    section.push('\n');

    section
}

/// Generate the executive summary.
fn generate_summary_section(doc: &ResultsDocument) -> String {
    let summary = &doc.summary;
    let mut section = String::new();

    section.push_str("## Executive Summary\n\n");
    section.push_str(&format!(
        "This report covers **{}** survey responses.\n\n",
        summary.total_responses
    ));
    section.push_str(&format!(
        "- **Respondents with prior experience:** {}\n",
        summary.with_prior_experience
    ));
    match summary.top_modality {
        Some(ref modality) => section.push_str(&format!(
            "- **Most requested modality:** {} ({} respondents)\n",
            modality, summary.top_modality_count
        )),
        None => section.push_str("- **Most requested modality:** n/a\n"),
    }
    if let Some((area, count)) = doc.interest_by_area.iter().max_by_key(|(_, c)| c.get()) {
        if count.get() > 0 {
            section.push_str(&format!(
                "- **Area with most interest:** {} ({} respondents)\n",
                area, count
            ));
        }
    }
    section.push('\n');

    section
}

/// Generate the general preferences section.
fn generate_preferences_section(doc: &ResultsDocument, options: &ReportOptions) -> String {
    let prefs = &doc.preferences;
    let mut section = String::new();

    section.push_str("## Preferences\n\n");

    section.push_str("### Modality\n\n");
    if let Some((modality, entry)) = prefs.modality.first() {
        section.push_str(&format!(
            "The most requested modality is **{}** with {} respondents.\n\n",
            modality, entry.count
        ));
    }
    section.push_str(&tally_table("Modality", &prefs.modality));

    section.push_str("### Willingness to Enroll\n\n");
    section.push_str(&tally_table("Answer", &prefs.willingness));

    section.push_str("### Preferred Schedules\n\n");
    section.push_str(&frequency_table(
        "Schedule",
        &prefs.schedules,
        options.max_table_rows,
    ));

    section
}

/// Generate the interest-by-area section.
fn generate_interest_section(interest: &FrequencyMap) -> String {
    let mut section = String::new();

    section.push_str("## Interest by Area\n\n");
    section.push_str(&frequency_table("Area", interest, interest.len()));

    section
}

/// Generate the popular-courses section, one table per area.
fn generate_courses_section(doc: &ResultsDocument, options: &ReportOptions) -> String {
    let mut section = String::new();

    section.push_str("## Popular Courses\n\n");
    for area in CourseArea::ALL {
        section.push_str(&format!("### {}\n\n", area.title()));
        match doc.popular_courses.get(area.key()) {
            Some(courses) => {
                section.push_str(&frequency_table("Course", courses, options.max_table_rows))
            }
            None => section.push_str("*No answers recorded.*\n\n"),
        }
    }

    section
}

/// Generate the per-cohort section.
fn generate_cohort_section(cohorts: &CohortBreakdown) -> String {
    let mut section = String::new();

    section.push_str("## By Cohort\n\n");

    if cohorts.respondents.is_empty() {
        section.push_str("*No cohort information recorded.*\n\n");
        return section;
    }

    section.push_str("### Overview\n\n");
    section.push_str("| Cohort | Respondents | Preferred Modality | Top Course |\n");
    section.push_str("|:---|:---:|:---|:---|\n");
    for (cohort, count) in cohorts.respondents.iter() {
        let modality = cohorts
            .preferred_modality
            .get(cohort)
            .map(|m| cell(m))
            .unwrap_or_else(|| "-".to_string());
        let course = cohorts
            .top_course
            .get(cohort)
            .map(|t| format!("{} ({})", cell(&t.course), t.count))
            .unwrap_or_else(|| "-".to_string());
        section.push_str(&format!(
            "| {} | {} | {} | {} |\n",
            cell(cohort),
            count,
            modality,
            course
        ));
    }
    section.push('\n');

    if !cohorts.willingness_percentages.is_empty() {
        section.push_str("### Willingness by Cohort\n\n");

        // Every row carries the same zero-filled categories.
        let categories: Vec<&str> = cohorts
            .willingness_percentages
            .first()
            .map(|(_, row)| row.keys().collect())
            .unwrap_or_default();

        section.push_str("| Cohort |");
        for category in &categories {
            section.push_str(&format!(" {} |", cell(category)));
        }
        section.push_str("\n|:---|");
        section.push_str(&":---:|".repeat(categories.len()));
        section.push('\n');

        for (cohort, row) in cohorts.willingness_percentages.iter() {
            section.push_str(&format!("| {} |", cell(cohort)));
            for category in &categories {
                let pct = row.get(category).copied().unwrap_or(0.0);
                section.push_str(&format!(" {:.1}% |", pct));
            }
            section.push('\n');
        }
        section.push('\n');
    }

    section
}

/// Generate the prior-experience section.
fn generate_experience_section(tally: &Tally) -> String {
    let mut section = String::new();

    section.push_str("## Prior Experience\n\n");
    section.push_str(&tally_table("Answer", tally));

    section
}

/// Generate the suggestions section.
fn generate_suggestions_section(suggestions: &[String], max: usize) -> String {
    let mut section = String::new();

    section.push_str("## Suggestions\n\n");
    if suggestions.is_empty() {
        section.push_str("*No suggestions were submitted.*\n\n");
        return section;
    }

    section.push_str("Selected comments from respondents:\n\n");
    for suggestion in suggestions.iter().take(max) {
        section.push_str(&format!("- {}\n", suggestion.replace('\n', " ")));
    }
    if suggestions.len() > max {
        section.push_str(&format!(
            "\n*{} more suggestions in the results document.*\n",
            suggestions.len() - max
        ));
    }
    section.push('\n');

    section
}

/// Generate the data-quality section. Empty when nothing degraded.
fn generate_warnings_section(warnings: &[String]) -> String {
    if warnings.is_empty() {
        return String::new();
    }

    let mut section = String::new();

    section.push_str("## Data Quality\n\n");
    section.push_str("Some sections could not be computed from this export:\n\n");
    for warning in warnings {
        section.push_str(&format!("- ⚠️ {}\n", warning));
    }
    section.push('\n');

    section
}

/// Generate the closing recommendations.
fn generate_recommendations_section(doc: &ResultsDocument) -> String {
    let mut section = String::new();

    section.push_str("## Recommendations\n\n");
    section.push_str("Based on the results, the following actions are recommended:\n\n");
    match doc.summary.top_modality {
        Some(ref modality) => section.push_str(&format!(
            "1. Prioritize the most requested modality: **{}**\n",
            modality
        )),
        None => section.push_str("1. Prioritize the most requested modality\n"),
    }
    section.push_str("2. Focus on the courses with the most interest in each area\n");
    section.push_str("3. Schedule sessions in the preferred time slots to maximize attendance\n");
    section.push_str("4. Take respondents' suggestions into account to improve the learning experience\n");
    section.push('\n');

    section
}

/// Generate the report footer.
fn generate_footer(meta: &ResultsMeta) -> String {
    let mut footer = String::new();

    footer.push_str("---\n\n");
    footer.push_str(&format!(
        "*Report generated by SurveyTally v{} from survey data on {}*\n",
        env!("CARGO_PKG_VERSION"),
        meta.generated_at.format("%Y-%m-%d %H:%M:%S UTC")
    ));

    footer
}

/// Generate the JSON results document.
pub fn generate_json_report(doc: &ResultsDocument) -> Result<String> {
    serde_json::to_string_pretty(doc).map_err(Into::into)
}

/// Write `content` to `path` through a temporary file in the same directory,
/// so readers never see a half-written file.
pub fn write_atomic(path: &Path, content: &str) -> Result<()> {
    let dir = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };
    std::fs::create_dir_all(dir)
        .with_context(|| format!("Failed to create directory: {}", dir.display()))?;

    let mut file = NamedTempFile::new_in(dir)
        .with_context(|| format!("Failed to create temporary file in {}", dir.display()))?;
    file.write_all(content.as_bytes())?;
    file.flush()?;
    file.persist(path)
        .with_context(|| format!("Failed to write {}", path.display()))?;

    Ok(())
}

/// Write the results document as pretty JSON.
pub fn write_results(doc: &ResultsDocument, path: &Path) -> Result<()> {
    let content = generate_json_report(doc)?;
    write_atomic(path, &content)
}

/// Read a results document written by [`write_results`].
pub fn read_results(path: &Path) -> Result<ResultsDocument> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read results: {}", path.display()))?;
    serde_json::from_str(&content)
        .with_context(|| format!("Failed to parse results: {}", path.display()))
}
