//! Markdown rendering of evaluation and assessment results.

use serde_json::Value;

use crate::domain::assessment::AssessmentOutcome;
use crate::domain::comparison::value_to_text;
use crate::domain::evaluation::{AttributeResult, DocumentResult, SectionResult};

const MAX_CELL_CHARS: usize = 80;

/// Renders a document evaluation report.
pub fn render_document_report(result: &DocumentResult) -> String {
    let mut report = format!("# Evaluation Report: {}\n\n", result.document_id());
    report.push_str(&format!("- **Run:** {}\n", result.run_id()));
    report.push_str(&format!("- **Evaluated at:** {}\n", result.evaluated_at().to_rfc3339()));
    report.push_str(&format!("- **Execution time:** {} ms\n\n", result.execution_time_ms()));

    let metrics = result.metrics();
    report.push_str("## Summary\n\n");
    report.push_str("| Metric | Value |\n");
    report.push_str("|--------|-------|\n");
    report.push_str(&format!("| Precision | {:.3} |\n", metrics.precision));
    report.push_str(&format!("| Recall | {:.3} |\n", metrics.recall));
    report.push_str(&format!("| F1 | {:.3} |\n", metrics.f1_score));
    report.push_str(&format!("| Accuracy | {:.3} |\n", metrics.accuracy));
    report.push_str(&format!("| Weighted score | {:.3} |\n", metrics.weighted_score));
    report.push_str(&format!(
        "| Sections | {} ({} failed) |\n\n",
        metrics.section_count, metrics.failed_section_count
    ));

    for section in result.sections() {
        report.push_str(&render_section(section));
    }
    report
}

fn render_section(section: &SectionResult) -> String {
    let mut out = format!(
        "## Section {} ({})\n\n",
        section.section_id, section.document_class
    );
    if let Some(reason) = section.failure_reason() {
        out.push_str(&format!("> **Evaluation failed:** {}\n\n", cell(reason)));
        return out;
    }

    let m = &section.metrics;
    out.push_str(&format!(
        "Precision {:.3} · Recall {:.3} · F1 {:.3} · Weighted score {:.3}\n\n",
        m.precision, m.recall, m.f1_score, m.weighted_score
    ));
    out.push_str(&format!(
        "TP {} · FP {} · FN {} · FD {} · TN {}\n\n",
        m.counts.true_positives,
        m.counts.false_positives,
        m.counts.false_negatives,
        m.counts.false_discoveries,
        m.counts.true_negatives
    ));

    out.push_str("| Attribute | Expected | Actual | Method | Score | Threshold | Match | Reason |\n");
    out.push_str("|-----------|----------|--------|--------|-------|-----------|-------|--------|\n");
    for row in section.attributes.iter().flat_map(AttributeResult::walk) {
        out.push_str(&format!(
            "| {} | {} | {} | {} | {} | {} | {} | {} |\n",
            cell(&row.path),
            row.expected.as_ref().map(value_cell).unwrap_or_default(),
            value_cell(&row.actual),
            row.method.map(|m| m.to_string()).unwrap_or_default(),
            row.score.map(|s| s.to_string()).unwrap_or_default(),
            row.threshold.map(|t| format!("{}", t)).unwrap_or_default(),
            match row.matched {
                Some(true) => "✅",
                Some(false) => "❌",
                None => "",
            },
            cell(&row.reason),
        ));
    }
    out.push('\n');
    out
}

/// Renders a confidence assessment report.
pub fn render_assessment_report(outcome: &AssessmentOutcome) -> String {
    let mut report = format!(
        "# Confidence Assessment: {} ({})\n\n",
        outcome.section_id, outcome.document_class
    );
    report.push_str(&format!(
        "- **Attributes:** {}\n- **Alerts:** {}\n- **Failed tasks:** {}\n- **Cache hits:** {}\n\n",
        outcome.results.len(),
        outcome.alerts.len(),
        outcome.failures.len(),
        outcome.cache_hits
    ));

    if !outcome.alerts.is_empty() {
        report.push_str("## Alerts\n\n");
        report.push_str("| Attribute | Confidence | Threshold |\n");
        report.push_str("|-----------|------------|-----------|\n");
        for alert in &outcome.alerts {
            report.push_str(&format!(
                "| {} | {:.3} | {:.3} |\n",
                cell(&alert.attribute_name),
                alert.confidence,
                alert.confidence_threshold
            ));
        }
        report.push('\n');
    }

    report.push_str("## Attributes\n\n");
    report.push_str("| Attribute | Value | Confidence | Threshold | Reason |\n");
    report.push_str("|-----------|-------|------------|-----------|--------|\n");
    for result in &outcome.results {
        report.push_str(&format!(
            "| {} | {} | {} | {} | {} |\n",
            cell(&result.path),
            value_cell(&result.actual),
            result.confidence.map(|c| c.to_string()).unwrap_or_default(),
            result
                .confidence_threshold
                .map(|t| format!("{:.3}", t))
                .unwrap_or_default(),
            cell(&result.reason),
        ));
    }

    if !outcome.failures.is_empty() {
        report.push_str("\n## Failed tasks\n\n");
        for failure in &outcome.failures {
            report.push_str(&format!(
                "- **{}** ({}): {}\n",
                failure.task_id,
                failure.attributes.join(", "),
                cell(&failure.reason)
            ));
        }
    }
    report
}

fn value_cell(value: &Value) -> String {
    cell(&value_to_text(value))
}

/// Escapes a value for a table cell and truncates long text.
fn cell(text: &str) -> String {
    let flat = text.replace('|', "\\|").replace(['\n', '\r'], " ");
    if flat.chars().count() > MAX_CELL_CHARS {
        let truncated: String = flat.chars().take(MAX_CELL_CHARS).collect();
        format!("{}…", truncated)
    } else {
        flat
    }
}
