use std::io::Write;
use std::path::{Path, PathBuf};

use crate::input::InputError;
use crate::input::results::load_results;
use crate::model::ScoreRecord;
use crate::report::json::render_summary_json;
use crate::report::tsv::{render_comparison_line, render_ranksum_tsv};
use crate::report::{AnalysisSummary, ComparisonOutcome, GroupStats, VariantReport};

pub mod filter;
pub mod plan;
pub mod plots;
pub mod relabel;
pub mod stats;

use plan::{AnalysisPlan, Comparison, Variant, default_plan};
use plots::{PlotError, box_stats, render_boxplot, render_density};
use relabel::{LabeledRecord, relabel};
use stats::{RankSumError, rank_sum_test};

pub const RANKSUM_FILE: &str = "ranksum.tsv";
pub const SUMMARY_FILE: &str = "summary.json";

#[derive(Debug, Clone)]
pub struct AnalysisConfig {
    pub input: PathBuf,
    pub out_dir: PathBuf,
    pub plan: Option<PathBuf>,
    pub plots: bool,
}

#[derive(Debug, thiserror::Error)]
pub enum AnalysisError {
    #[error(transparent)]
    Input(#[from] InputError),
    #[error(transparent)]
    Plan(#[from] plan::PlanError),
    #[error(transparent)]
    Plot(#[from] PlotError),
    #[error("cannot write {path}: {source}")]
    Output {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("cannot serialize summary: {0}")]
    Json(#[from] serde_json::Error),
}

fn write_file(path: &Path, contents: &str) -> Result<(), AnalysisError> {
    std::fs::write(path, contents).map_err(|source| AnalysisError::Output {
        path: path.to_path_buf(),
        source,
    })
}

/// Loads the results table, runs every plan variant and writes plots,
/// `ranksum.tsv` and `summary.json` under `config.out_dir`. One line per
/// comparison goes to `stdout`.
pub fn run_analysis<W: Write>(
    config: &AnalysisConfig,
    stdout: &mut W,
) -> Result<AnalysisSummary, AnalysisError> {
    let plan = match &config.plan {
        Some(path) => AnalysisPlan::load(path)?,
        None => default_plan(),
    };
    let table = load_results(&config.input)?;
    if table.records.is_empty() {
        return Err(InputError::InvalidInput(format!(
            "{} has no usable rows",
            config.input.display()
        ))
        .into());
    }
    std::fs::create_dir_all(&config.out_dir).map_err(|source| AnalysisError::Output {
        path: config.out_dir.clone(),
        source,
    })?;

    crate::info!(
        "analysing {} rows ({} skipped) across {} variants",
        table.records.len(),
        table.skipped.len(),
        plan.variant.len()
    );

    let mut summary = AnalysisSummary {
        tool: env!("CARGO_PKG_NAME").to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        input: config.input.display().to_string(),
        rows_loaded: table.records.len(),
        rows_skipped: table.skipped.len(),
        ..AnalysisSummary::default()
    };

    for variant in &plan.variant {
        let rows = variant.filter.apply(&table.records);
        let report = run_variant(config, variant, &rows)?;
        for comparison in &variant.comparison {
            let outcome = compare(&variant.name, comparison, &rows);
            writeln!(stdout, "{}", render_comparison_line(&outcome)).map_err(|source| {
                AnalysisError::Output {
                    path: PathBuf::from("<stdout>"),
                    source,
                }
            })?;
            summary.comparisons.push(outcome);
        }
        summary.variants.push(report);
    }

    write_file(
        &config.out_dir.join(RANKSUM_FILE),
        &render_ranksum_tsv(&summary.comparisons),
    )?;
    write_file(
        &config.out_dir.join(SUMMARY_FILE),
        &render_summary_json(&summary)?,
    )?;
    Ok(summary)
}

fn run_variant(
    config: &AnalysisConfig,
    variant: &Variant,
    rows: &[ScoreRecord],
) -> Result<VariantReport, AnalysisError> {
    let labeled = relabel(rows);
    let mut report = VariantReport {
        name: variant.name.clone(),
        filter: variant.filter.describe(),
        rows: rows.len(),
        age_bins: present_labels(labeled.iter().map(|r| (r.age_bin_idx, r.age_bin_label))),
        host_groups: present_labels(labeled.iter().map(|r| (r.host_age_idx, r.host_age_label))),
        groups: group_stats(&labeled),
        ..VariantReport::default()
    };

    if labeled.is_empty() {
        crate::warn!("variant {}: no rows match, plots skipped", variant.name);
        return Ok(report);
    }
    if !config.plots {
        return Ok(report);
    }

    if variant.boxplot {
        let file = format!("{}_boxplot.svg", variant.name);
        render_boxplot(&labeled, &variant.name, &config.out_dir.join(&file))?;
        report.plots.push(file);
    }
    if variant.density {
        let file = format!("{}_density.svg", variant.name);
        match render_density(&labeled, &variant.name, &config.out_dir.join(&file)) {
            Ok(skipped) => {
                report.plots.push(file);
                report.skipped_density_groups = skipped;
            }
            Err(PlotError::NoData(_)) => {
                crate::warn!(
                    "variant {}: no group has two or more values, density skipped",
                    variant.name
                );
            }
            Err(e) => return Err(e.into()),
        }
    }
    Ok(report)
}

fn present_labels(levels: impl Iterator<Item = (usize, &'static str)>) -> Vec<String> {
    let mut seen: Vec<(usize, &str)> = levels.collect();
    seen.sort_unstable();
    seen.dedup();
    seen.into_iter().map(|(_, label)| label.to_string()).collect()
}

fn group_stats(labeled: &[LabeledRecord]) -> Vec<GroupStats> {
    let mut order: Vec<usize> = labeled.iter().map(|r| r.obs_sim_idx).collect();
    order.sort_unstable();
    order.dedup();
    order
        .into_iter()
        .filter_map(|idx| {
            let rows: Vec<&LabeledRecord> =
                labeled.iter().filter(|r| r.obs_sim_idx == idx).collect();
            let style = rows.first()?.obs_sim_style;
            let values: Vec<f64> = rows.iter().map(|r| r.record.phylop_score).collect();
            let stats = box_stats(&values)?;
            Some(GroupStats {
                obs_sim: style.value.to_string(),
                label: style.label.to_string(),
                n: stats.n,
                median: stats.median,
                q1: stats.q1,
                q3: stats.q3,
            })
        })
        .collect()
}

/// Runs one comparison inside a variant's rows; empty subgroups are
/// reported in `note` instead of producing a statistic.
pub fn compare(variant: &str, comparison: &Comparison, rows: &[ScoreRecord]) -> ComparisonOutcome {
    let a = comparison.a.scores(rows);
    let b = comparison.b.scores(rows);
    let mut outcome = ComparisonOutcome {
        variant: variant.to_string(),
        comparison: comparison.name.clone(),
        group_a: comparison.a.describe(),
        group_b: comparison.b.describe(),
        n1: a.len(),
        n2: b.len(),
        result: None,
        note: None,
    };
    match rank_sum_test(&a, &b) {
        Ok(result) => outcome.result = Some(result),
        Err(e) => {
            let note = match e {
                RankSumError::EmptyGroup(group) => format!("group {group} is empty"),
                other => other.to_string(),
            };
            crate::warn!("[{variant}] {}: comparison skipped: {note}", comparison.name);
            outcome.note = Some(note);
        }
    }
    outcome
}

#[cfg(test)]
#[path = "../../tests/src_inline/analysis/tests.rs"]
mod tests;
