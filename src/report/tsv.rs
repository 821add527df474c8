use crate::report::{ComparisonOutcome, format_f64_6, format_p_value};

pub const RANKSUM_HEADER: &str =
    "variant\tcomparison\tgroup_a\tgroup_b\tn1\tn2\tW\tp_value\tmethod\tnote";

pub fn render_ranksum_tsv(outcomes: &[ComparisonOutcome]) -> String {
    let mut out = String::new();
    out.push_str(RANKSUM_HEADER);
    out.push('\n');
    for outcome in outcomes {
        let (w, p, method) = match &outcome.result {
            Some(r) => (
                format_f64_6(r.statistic),
                format_p_value(r.p_value),
                r.method.as_str().to_string(),
            ),
            None => ("NA".to_string(), "NA".to_string(), "NA".to_string()),
        };
        out.push_str(&format!(
            "{}\t{}\t{}\t{}\t{}\t{}\t{}\t{}\t{}\t{}\n",
            outcome.variant,
            outcome.comparison,
            outcome.group_a,
            outcome.group_b,
            outcome.n1,
            outcome.n2,
            w,
            p,
            method,
            outcome.note.as_deref().unwrap_or("")
        ));
    }
    out
}

/// Line printed to stdout for each comparison.
pub fn render_comparison_line(outcome: &ComparisonOutcome) -> String {
    match &outcome.result {
        Some(r) => format!(
            "[{}] {}: W = {}, p-value = {} ({}, n1 = {}, n2 = {})",
            outcome.variant,
            outcome.comparison,
            format_f64_6(r.statistic),
            format_p_value(r.p_value),
            r.method.as_str(),
            r.n1,
            r.n2
        ),
        None => format!(
            "[{}] {}: skipped ({})",
            outcome.variant,
            outcome.comparison,
            outcome.note.as_deref().unwrap_or("no result")
        ),
    }
}
