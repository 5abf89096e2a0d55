//! HTML dashboard rendering.
//!
//! A single self-contained page: summary cards, tables and horizontal bars
//! sized by share of the largest value. Willingness per cohort is drawn as
//! stacked bars. No scripts or external assets.

use crate::models::{FrequencyMap, OrderedMap, ResultsDocument, Tally};
use crate::survey::CourseArea;

const STYLE: &str = "body{font-family:sans-serif;margin:2rem auto;max-width:960px;color:#222}\
h1{margin-bottom:.2rem}.muted{color:#777;font-size:.9rem}\
.cards{display:flex;gap:1rem;flex-wrap:wrap;margin:1.5rem 0}\
.card{border:1px solid #ddd;border-radius:6px;padding:1rem;min-width:180px}\
.card b{display:block;font-size:1.6rem}\
table{border-collapse:collapse;width:100%;margin-bottom:1.5rem}\
th,td{border-bottom:1px solid #eee;padding:.35rem .5rem;text-align:left}\
.bar{background:#4a7bd0;height:.8rem;border-radius:3px}\
.warn{background:#fff4e0;border:1px solid #f0c36d;padding:.6rem;border-radius:4px}\
.stack{display:flex;height:1rem;border-radius:3px;overflow:hidden;background:#eee}\
.legend span{display:inline-block;width:.8rem;height:.8rem;margin:0 .3rem 0 .8rem}";

/// Segment colors for stacked bars, reused in order.
const PALETTE: [&str; 6] = ["#4a7bd0", "#e08a3c", "#5aa469", "#c0504d", "#8064a2", "#999999"];

/// Escape text for HTML element content and attribute values.
fn escape_html(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#39;")
}

fn bar(value: usize, max: usize) -> String {
    let width = if max == 0 {
        0.0
    } else {
        value as f64 / max as f64 * 100.0
    };
    format!("<div class=\"bar\" style=\"width:{:.1}%\"></div>", width)
}

fn frequency_bars(map: &FrequencyMap, heading: &str) -> String {
    if map.is_empty() {
        return "<p class=\"muted\">No answers recorded.</p>\n".to_string();
    }

    let max = map.max_count();
    let mut html = String::new();
    html.push_str(&format!(
        "<table><tr><th>{}</th><th>Respondents</th><th style=\"width:40%\"></th></tr>\n",
        escape_html(heading)
    ));
    for (value, count) in map.iter() {
        html.push_str(&format!(
            "<tr><td>{}</td><td>{}</td><td>{}</td></tr>\n",
            escape_html(value),
            count,
            bar(count.get(), max)
        ));
    }
    html.push_str("</table>\n");
    html
}

fn tally_bars(tally: &Tally, heading: &str) -> String {
    if tally.is_empty() {
        return "<p class=\"muted\">No answers recorded.</p>\n".to_string();
    }

    let mut html = String::new();
    html.push_str(&format!(
        "<table><tr><th>{}</th><th>Respondents</th><th>Share</th><th style=\"width:40%\"></th></tr>\n",
        escape_html(heading)
    ));
    for (value, entry) in tally.iter() {
        html.push_str(&format!(
            "<tr><td>{}</td><td>{}</td><td>{:.1}%</td><td>{}</td></tr>\n",
            escape_html(value),
            entry.count,
            entry.percentage,
            bar(entry.percentage.round() as usize, 100)
        ));
    }
    html.push_str("</table>\n");
    html
}

/// One stacked bar per cohort, segments sized by row percentage.
fn stacked_bars(rows: &OrderedMap<OrderedMap<f64>>) -> String {
    // Rows are zero-filled, so the first one names every category.
    let categories: Vec<&str> = rows
        .first()
        .map(|(_, row)| row.keys().collect())
        .unwrap_or_default();
    let color = |i: usize| PALETTE[i % PALETTE.len()];

    let mut html = String::new();
    html.push_str("<p class=\"legend\">");
    for (i, category) in categories.iter().enumerate() {
        html.push_str(&format!(
            "<span style=\"background:{}\"></span>{}",
            color(i),
            escape_html(category)
        ));
    }
    html.push_str("</p>\n");

    html.push_str("<table><tr><th>Cohort</th><th style=\"width:70%\"></th></tr>\n");
    for (cohort, row) in rows.iter() {
        html.push_str(&format!(
            "<tr><td>{}</td><td><div class=\"stack\">",
            escape_html(cohort)
        ));
        for (i, category) in categories.iter().enumerate() {
            let pct = row.get(category).copied().unwrap_or(0.0);
            if pct > 0.0 {
                html.push_str(&format!(
                    "<div style=\"width:{:.1}%;background:{}\" title=\"{}: {:.1}%\"></div>",
                    pct,
                    color(i),
                    escape_html(category),
                    pct
                ));
            }
        }
        html.push_str("</div></td></tr>\n");
    }
    html.push_str("</table>\n");
    html
}

/// Render the dashboard page for `doc`.
pub fn render_dashboard(doc: &ResultsDocument, title: &str) -> String {
    let mut html = String::new();

    html.push_str("<!DOCTYPE html>\n<html lang=\"en\">\n<head>\n<meta charset=\"utf-8\">\n");
    html.push_str(&format!("<title>{}</title>\n", escape_html(title)));
    html.push_str(&format!("<style>{}</style>\n</head>\n<body>\n", STYLE));

    html.push_str(&format!("<h1>{}</h1>\n", escape_html(title)));
    html.push_str(&format!(
        "<p class=\"muted\">{} responses from <code>{}</code>, computed {}</p>\n",
        doc.meta.total_responses,
        escape_html(&doc.meta.source),
        doc.meta.generated_at.format("%Y-%m-%d %H:%M:%S UTC")
    ));

    // Summary cards
    let summary = &doc.summary;
    html.push_str("<div class=\"cards\">\n");
    html.push_str(&format!(
        "<div class=\"card\"><b>{}</b>responses</div>\n",
        summary.total_responses
    ));
    html.push_str(&format!(
        "<div class=\"card\"><b>{}</b>with prior experience</div>\n",
        summary.with_prior_experience
    ));
    html.push_str(&format!(
        "<div class=\"card\"><b>{}</b>preferred modality ({})</div>\n",
        escape_html(summary.top_modality.as_deref().unwrap_or("n/a")),
        summary.top_modality_count
    ));
    html.push_str("</div>\n");

    if !doc.meta.warnings.is_empty() {
        html.push_str("<div class=\"warn\"><strong>Incomplete data:</strong><ul>\n");
        for warning in &doc.meta.warnings {
            html.push_str(&format!("<li>{}</li>\n", escape_html(warning)));
        }
        html.push_str("</ul></div>\n");
    }

    html.push_str("<h2>Modality</h2>\n");
    html.push_str(&tally_bars(&doc.preferences.modality, "Modality"));
    html.push_str("<h2>Willingness to Enroll</h2>\n");
    html.push_str(&tally_bars(&doc.preferences.willingness, "Answer"));
    html.push_str("<h2>Preferred Schedules</h2>\n");
    html.push_str(&frequency_bars(&doc.preferences.schedules, "Schedule"));
    html.push_str("<h2>Interest by Area</h2>\n");
    html.push_str(&frequency_bars(&doc.interest_by_area, "Area"));

    html.push_str("<h2>Popular Courses</h2>\n");
    for area in CourseArea::ALL {
        html.push_str(&format!("<h3>{}</h3>\n", area.title()));
        match doc.popular_courses.get(area.key()) {
            Some(courses) => html.push_str(&frequency_bars(courses, "Course")),
            None => html.push_str("<p class=\"muted\">No answers recorded.</p>\n"),
        }
    }

    html.push_str("<h2>Respondents by Cohort</h2>\n");
    html.push_str(&frequency_bars(&doc.by_cohort.respondents, "Cohort"));

    if !doc.by_cohort.preferred_modality.is_empty() {
        html.push_str("<h2>Preferred Modality by Cohort</h2>\n");
        html.push_str("<table><tr><th>Cohort</th><th>Modality</th><th>Top Course</th></tr>\n");
        for (cohort, modality) in doc.by_cohort.preferred_modality.iter() {
            let course = doc
                .by_cohort
                .top_course
                .get(cohort)
                .map(|t| format!("{} ({})", escape_html(&t.course), t.count))
                .unwrap_or_else(|| "-".to_string());
            html.push_str(&format!(
                "<tr><td>{}</td><td>{}</td><td>{}</td></tr>\n",
                escape_html(cohort),
                escape_html(modality),
                course
            ));
        }
        html.push_str("</table>\n");
    }

    if !doc.by_cohort.willingness_percentages.is_empty() {
        html.push_str("<h2>Willingness by Cohort</h2>\n");
        html.push_str(&stacked_bars(&doc.by_cohort.willingness_percentages));
    }

    html.push_str("<h2>Prior Experience</h2>\n");
    html.push_str(&tally_bars(&doc.prior_experience, "Answer"));

    html.push_str(
        "<p class=\"muted\"><a href=\"/api/results\">results JSON</a> · \
         <a href=\"/api/summary\">summary JSON</a> · \
         <a href=\"/download/results\">download</a></p>\n",
    );
    html.push_str("</body>\n</html>\n");

    html
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::report::{assemble, AssemblyOptions};
    use crate::survey::testing::table;
    use crate::survey::Field;
    use chrono::Utc;

    #[test]
    fn test_escape_html() {
        assert_eq!(
            escape_html("<b>\"A&B\"</b>"),
            "&lt;b&gt;&quot;A&amp;B&quot;&lt;/b&gt;"
        );
        assert_eq!(escape_html("Programación"), "Programación");
    }

    #[test]
    fn test_bar_width() {
        assert!(bar(1, 4).contains("width:25.0%"));
        assert!(bar(0, 0).contains("width:0.0%"));
    }

    #[test]
    fn test_stacked_bars_skip_empty_segments() {
        let mut row = OrderedMap::new();
        row.push("Sí", 75.0);
        row.push("No", 25.0);
        row.push("Tal vez", 0.0);
        let mut rows = OrderedMap::new();
        rows.push("3ro", row);

        let html = stacked_bars(&rows);
        assert!(html.contains("Tal vez"));
        assert!(html.contains("width:75.0%;background:#4a7bd0"));
        assert!(html.contains("width:25.0%;background:#e08a3c"));
        assert!(!html.contains("width:0.0%"));
    }

    #[test]
    fn test_render_dashboard() {
        let t = table(
            &[
                Field::Cohort,
                Field::Modality,
                Field::Schedule,
                Field::Willingness,
                Field::ProgrammingCourses,
            ],
            &[
                &["1ro", "Virtual", "Noche", "Sí", "Python, Java"],
                &["2do", "<script>", "Noche, Tarde", "No", "Python"],
                &["2do", "Virtual", "Tarde", "Sí", ""],
            ],
        );
        let doc = assemble(&t, &AssemblyOptions::default(), Utc::now());
        let html = render_dashboard(&doc, "Survey");

        assert!(html.starts_with("<!DOCTYPE html>"));
        assert!(html.contains("<title>Survey</title>"));
        assert!(html.contains("&lt;script&gt;"));
        assert!(!html.contains("<script>"));
        assert!(html.contains("<td>Noche</td><td>2</td>"));
        assert!(html.contains("Incomplete data"));

        assert!(html.contains("<h2>Popular Courses</h2>"));
        assert!(html.contains("<h3>Programming</h3>"));
        assert!(html.contains("<td>Python</td><td>2</td>"));

        assert!(html.contains("<h2>Willingness by Cohort</h2>"));
        assert!(html.contains("title=\"Sí: 50.0%\""));
        assert!(html.contains("width:100.0%;background:"));
        assert!(html.contains("href=\"/api/results\""));
    }
}
