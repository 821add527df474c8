use std::collections::BTreeMap;
use std::path::Path;

use plotters::prelude::*;

use crate::analysis::relabel::LabeledRecord;
use crate::model::levels::{HOST_AGE_LEVELS, ObsSimStyle};
use crate::report::{quantile_sorted, sorted_copy};

pub const KDE_POINTS: usize = 512;
const KDE_CUT: f64 = 3.0;
const WHISKER_IQR: f64 = 1.5;

const BOX_SIZE: (u32, u32) = (900, 650);
const PANEL_WIDTH: u32 = 520;
const PANEL_HEIGHT: u32 = 520;

#[derive(Debug, thiserror::Error)]
pub enum PlotError {
    #[error("nothing to plot for {0}")]
    NoData(String),
    #[error("failed to draw {path}: {message}")]
    Draw { path: String, message: String },
}

#[derive(Debug, Clone, PartialEq)]
pub struct BoxStats {
    pub n: usize,
    pub q1: f64,
    pub median: f64,
    pub q3: f64,
    pub whisker_low: f64,
    pub whisker_high: f64,
    pub outliers: Vec<f64>,
}

pub fn box_stats(values: &[f64]) -> Option<BoxStats> {
    if values.is_empty() {
        return None;
    }
    let sorted = sorted_copy(values);
    let q1 = quantile_sorted(&sorted, 0.25);
    let median = quantile_sorted(&sorted, 0.5);
    let q3 = quantile_sorted(&sorted, 0.75);
    let reach = WHISKER_IQR * (q3 - q1);
    let (lo_fence, hi_fence) = (q1 - reach, q3 + reach);

    let inside = sorted.iter().filter(|&&v| v >= lo_fence && v <= hi_fence);
    let whisker_low = inside.clone().copied().fold(f64::INFINITY, f64::min);
    let whisker_high = inside.copied().fold(f64::NEG_INFINITY, f64::max);
    let outliers = sorted
        .iter()
        .copied()
        .filter(|&v| v < lo_fence || v > hi_fence)
        .collect();

    Some(BoxStats {
        n: sorted.len(),
        q1,
        median,
        q3,
        whisker_low,
        whisker_high,
        outliers,
    })
}

fn sample_sd(values: &[f64]) -> f64 {
    let n = values.len() as f64;
    let mean = values.iter().sum::<f64>() / n;
    let ss: f64 = values.iter().map(|v| (v - mean) * (v - mean)).sum();
    (ss / (n - 1.0)).sqrt()
}

/// Silverman's rule of thumb as in R's `bw.nrd0`. Needs at least two values.
pub fn bandwidth_nrd0(values: &[f64]) -> Option<f64> {
    if values.len() < 2 {
        return None;
    }
    let sorted = sorted_copy(values);
    let sd = sample_sd(&sorted);
    let iqr = quantile_sorted(&sorted, 0.75) - quantile_sorted(&sorted, 0.25);
    let mut lo = sd.min(iqr / 1.34);
    if !(lo > 0.0) {
        lo = if sd > 0.0 {
            sd
        } else if sorted[0] != 0.0 {
            sorted[0].abs()
        } else {
            1.0
        };
    }
    Some(0.9 * lo * (sorted.len() as f64).powf(-0.2))
}

/// Gaussian kernel density on an evenly spaced grid.
pub fn kde(values: &[f64]) -> Option<Vec<(f64, f64)>> {
    let bw = bandwidth_nrd0(values)?;
    let (min, max) = values
        .iter()
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), &v| {
            (lo.min(v), hi.max(v))
        });
    let from = min - KDE_CUT * bw;
    let to = max + KDE_CUT * bw;
    let step = (to - from) / (KDE_POINTS - 1) as f64;
    let norm = 1.0 / (values.len() as f64 * bw * (2.0 * std::f64::consts::PI).sqrt());

    let curve = (0..KDE_POINTS)
        .map(|i| {
            let x = from + step * i as f64;
            let sum: f64 = values
                .iter()
                .map(|&v| {
                    let z = (x - v) / bw;
                    (-0.5 * z * z).exp()
                })
                .sum();
            (x, sum * norm)
        })
        .collect();
    Some(curve)
}

fn rgb(style: &ObsSimStyle) -> RGBColor {
    RGBColor(style.rgb.0, style.rgb.1, style.rgb.2)
}

fn draw_err<E: std::fmt::Display>(path: &Path) -> impl Fn(E) -> PlotError + '_ {
    move |e| PlotError::Draw {
        path: path.display().to_string(),
        message: e.to_string(),
    }
}

/// Scores per `obs_sim`, in display order, for groups that are present.
fn groups_by_obs_sim<'a>(
    rows: impl Iterator<Item = &'a LabeledRecord>,
) -> Vec<(&'static ObsSimStyle, Vec<f64>)> {
    let mut groups: BTreeMap<usize, (&'static ObsSimStyle, Vec<f64>)> = BTreeMap::new();
    for row in rows {
        groups
            .entry(row.obs_sim_idx)
            .or_insert_with(|| (row.obs_sim_style, Vec::new()))
            .1
            .push(row.record.phylop_score);
    }
    groups.into_values().collect()
}

fn padded_range(lo: f64, hi: f64) -> (f64, f64) {
    let pad = if hi > lo { (hi - lo) * 0.05 } else { 1.0 };
    (lo - pad, hi + pad)
}

/// One box per `obs_sim` present, coloured and labelled from the style table.
pub fn render_boxplot(rows: &[LabeledRecord], title: &str, path: &Path) -> Result<(), PlotError> {
    let groups: Vec<(&ObsSimStyle, BoxStats)> = groups_by_obs_sim(rows.iter())
        .into_iter()
        .filter_map(|(style, values)| box_stats(&values).map(|stats| (style, stats)))
        .collect();
    if groups.is_empty() {
        return Err(PlotError::NoData(title.to_string()));
    }

    let (lo, hi) = rows.iter().map(|r| r.record.phylop_score).fold(
        (f64::INFINITY, f64::NEG_INFINITY),
        |(lo, hi), v| (lo.min(v), hi.max(v)),
    );
    let (y_lo, y_hi) = padded_range(lo, hi);
    let err = draw_err(path);

    let root = SVGBackend::new(path, BOX_SIZE).into_drawing_area();
    root.fill(&WHITE).map_err(&err)?;

    let mut chart = ChartBuilder::on(&root)
        .caption(title, ("sans-serif", 24))
        .margin(15)
        .x_label_area_size(30)
        .y_label_area_size(60)
        .build_cartesian_2d(0.0..groups.len() as f64, y_lo..y_hi)
        .map_err(&err)?;

    chart
        .configure_mesh()
        .disable_x_mesh()
        .x_labels(0)
        .y_desc("phyloP score")
        .draw()
        .map_err(&err)?;

    for (i, (style, stats)) in groups.iter().enumerate() {
        let colour = rgb(style);
        let centre = i as f64 + 0.5;
        let (left, right) = (centre - 0.3, centre + 0.3);

        chart
            .draw_series(std::iter::once(Rectangle::new(
                [(left, stats.q1), (right, stats.q3)],
                colour.filled(),
            )))
            .map_err(&err)?
            .label(style.label)
            .legend(move |(x, y)| Rectangle::new([(x, y - 5), (x + 15, y + 5)], colour.filled()));

        let lines = vec![
            vec![(left, stats.q1), (right, stats.q1), (right, stats.q3), (left, stats.q3), (left, stats.q1)],
            vec![(left, stats.median), (right, stats.median)],
            vec![(centre, stats.q3), (centre, stats.whisker_high)],
            vec![(centre, stats.q1), (centre, stats.whisker_low)],
            vec![(centre - 0.1, stats.whisker_high), (centre + 0.1, stats.whisker_high)],
            vec![(centre - 0.1, stats.whisker_low), (centre + 0.1, stats.whisker_low)],
        ];
        chart
            .draw_series(
                lines
                    .into_iter()
                    .map(|points| PathElement::new(points, BLACK.stroke_width(1))),
            )
            .map_err(&err)?;
        chart
            .draw_series(
                stats
                    .outliers
                    .iter()
                    .map(|&y| Circle::new((centre, y), 3, BLACK.filled())),
            )
            .map_err(&err)?;
    }

    chart
        .configure_series_labels()
        .position(SeriesLabelPosition::UpperRight)
        .background_style(WHITE.mix(0.8))
        .border_style(BLACK)
        .draw()
        .map_err(&err)?;

    root.present().map_err(&err)?;
    Ok(())
}

/// One panel per `host_age_cat` present, one density curve per `obs_sim`.
/// Returns the `panel/obs_sim` groups skipped for having fewer than two values.
pub fn render_density(
    rows: &[LabeledRecord],
    title: &str,
    path: &Path,
) -> Result<Vec<String>, PlotError> {
    let mut skipped = Vec::new();
    let mut panels = Vec::new();
    for (idx, level) in HOST_AGE_LEVELS.iter().enumerate() {
        let panel_rows: Vec<&LabeledRecord> =
            rows.iter().filter(|r| r.host_age_idx == idx).collect();
        if panel_rows.is_empty() {
            continue;
        }
        let mut curves = Vec::new();
        for (style, values) in groups_by_obs_sim(panel_rows.into_iter()) {
            match kde(&values) {
                Some(curve) => curves.push((style, curve)),
                None => {
                    crate::warn!(
                        "{title}: {} / {} has {} value(s); density skipped",
                        level.label,
                        style.value,
                        values.len()
                    );
                    skipped.push(format!("{}/{}", level.value, style.value));
                }
            }
        }
        if !curves.is_empty() {
            panels.push((level.label, curves));
        }
    }
    if panels.is_empty() {
        return Err(PlotError::NoData(title.to_string()));
    }

    let err = draw_err(path);
    let size = (PANEL_WIDTH * panels.len() as u32, PANEL_HEIGHT);
    let root = SVGBackend::new(path, size).into_drawing_area();
    root.fill(&WHITE).map_err(&err)?;
    let root = root.titled(title, ("sans-serif", 24)).map_err(&err)?;
    let areas = root.split_evenly((1, panels.len()));

    for (area, (label, curves)) in areas.iter().zip(&panels) {
        let (mut x_lo, mut x_hi, mut y_hi) = (f64::INFINITY, f64::NEG_INFINITY, 0.0f64);
        for (_, curve) in curves {
            for &(x, y) in curve {
                x_lo = x_lo.min(x);
                x_hi = x_hi.max(x);
                y_hi = y_hi.max(y);
            }
        }
        let mut chart = ChartBuilder::on(area)
            .caption(*label, ("sans-serif", 18))
            .margin(10)
            .x_label_area_size(35)
            .y_label_area_size(55)
            .build_cartesian_2d(x_lo..x_hi, 0.0..y_hi * 1.05)
            .map_err(&err)?;
        chart
            .configure_mesh()
            .x_desc("phyloP score")
            .y_desc("density")
            .draw()
            .map_err(&err)?;

        for (style, curve) in curves {
            let colour = rgb(style);
            chart
                .draw_series(LineSeries::new(curve.iter().copied(), colour.stroke_width(2)))
                .map_err(&err)?
                .label(style.label)
                .legend(move |(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], colour));
        }
        chart
            .configure_series_labels()
            .background_style(WHITE.mix(0.8))
            .border_style(BLACK)
            .draw()
            .map_err(&err)?;
    }

    root.present().map_err(&err)?;
    Ok(skipped)
}

#[cfg(test)]
#[path = "../../tests/src_inline/analysis/plots.rs"]
mod tests;
