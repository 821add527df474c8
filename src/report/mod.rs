use serde::Serialize;

use crate::analysis::stats::RankSumResult;

pub mod json;
pub mod tsv;

/// Distribution of one `obs_sim` group inside a variant.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GroupStats {
    pub obs_sim: String,
    pub label: String,
    pub n: usize,
    pub median: f64,
    pub q1: f64,
    pub q3: f64,
}

/// One rank-sum comparison; `result` is absent when the comparison was skipped.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ComparisonOutcome {
    pub variant: String,
    pub comparison: String,
    pub group_a: String,
    pub group_b: String,
    pub n1: usize,
    pub n2: usize,
    pub result: Option<RankSumResult>,
    pub note: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct VariantReport {
    pub name: String,
    pub filter: String,
    pub rows: usize,
    /// Display labels of the age bins and host groups present, in display order.
    pub age_bins: Vec<String>,
    pub host_groups: Vec<String>,
    pub groups: Vec<GroupStats>,
    pub plots: Vec<String>,
    pub skipped_density_groups: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct AnalysisSummary {
    pub tool: String,
    pub version: String,
    pub input: String,
    pub rows_loaded: usize,
    pub rows_skipped: usize,
    pub variants: Vec<VariantReport>,
    pub comparisons: Vec<ComparisonOutcome>,
}

pub fn format_f64_6(v: f64) -> String {
    format!("{:.6}", v)
}

/// p-values keep their magnitude: fixed notation down to 1e-4, scientific below.
pub fn format_p_value(p: f64) -> String {
    if p == 0.0 || p >= 1e-4 {
        format!("{:.6}", p)
    } else {
        format!("{:.3e}", p)
    }
}

/// Type-7 quantile (linear interpolation between order statistics) of
/// already sorted values.
pub fn quantile_sorted(sorted: &[f64], p: f64) -> f64 {
    if sorted.is_empty() {
        return f64::NAN;
    }
    let h = (sorted.len() - 1) as f64 * p.clamp(0.0, 1.0);
    let lo = h.floor() as usize;
    let hi = (lo + 1).min(sorted.len() - 1);
    sorted[lo] + (h - lo as f64) * (sorted[hi] - sorted[lo])
}

pub fn sorted_copy(values: &[f64]) -> Vec<f64> {
    let mut sorted = values.to_vec();
    sorted.sort_by(|a, b| a.total_cmp(b));
    sorted
}

#[cfg(test)]
#[path = "../../tests/src_inline/report/mod.rs"]
mod tests;
