use super::*;
use crate::analysis::relabel::relabel;
use crate::model::{AgeBin, Category, HostAgeCat, ObsSim, ScoreRecord};
use std::fs;
use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};

static DIR_COUNTER: AtomicUsize = AtomicUsize::new(0);

fn make_temp_dir() -> PathBuf {
    let mut dir = std::env::temp_dir();
    let id = DIR_COUNTER.fetch_add(1, Ordering::SeqCst);
    dir.push(format!("kira_phylosim_plot_test_{}_{}", std::process::id(), id));
    fs::create_dir_all(&dir).unwrap();
    dir
}

fn rows(groups: &[(HostAgeCat, ObsSim, &[f64])]) -> Vec<LabeledRecord> {
    let mut out = Vec::new();
    for (host, obs_sim, values) in groups {
        for &v in values.iter() {
            out.push(ScoreRecord {
                category: Category::Intragenic,
                direction: None,
                host_age_cat: *host,
                age_bin: AgeBin::One,
                obs_sim: *obs_sim,
                phylop_score: v,
            });
        }
    }
    relabel(&out)
}

#[test]
fn test_box_stats_with_outlier() {
    let stats = box_stats(&[1.0, 2.0, 3.0, 4.0, 100.0]).unwrap();
    assert_eq!(stats.n, 5);
    assert_eq!(stats.q1, 2.0);
    assert_eq!(stats.median, 3.0);
    assert_eq!(stats.q3, 4.0);
    assert_eq!(stats.whisker_low, 1.0);
    assert_eq!(stats.whisker_high, 4.0);
    assert_eq!(stats.outliers, vec![100.0]);
    assert!(box_stats(&[]).is_none());
}

#[test]
fn test_bandwidth_nrd0() {
    assert!(bandwidth_nrd0(&[1.0]).is_none());
    // sd = 1.290994, IQR/1.34 = 1.119403 -> 0.9 * 1.119403 * 4^-0.2
    let bw = bandwidth_nrd0(&[1.0, 2.0, 3.0, 4.0]).unwrap();
    assert!((bw - 0.9 * (1.5 / 1.34) * 4f64.powf(-0.2)).abs() < 1e-12);
    // Constant non-zero data falls back to |x[0]|.
    let flat = bandwidth_nrd0(&[2.0, 2.0]).unwrap();
    assert!((flat - 0.9 * 2.0 * 2f64.powf(-0.2)).abs() < 1e-12);
}

#[test]
fn test_kde_integrates_to_one() {
    let curve = kde(&[0.0, 0.5, 1.0, 3.0]).unwrap();
    assert_eq!(curve.len(), KDE_POINTS);
    let step = curve[1].0 - curve[0].0;
    let area: f64 = curve.iter().map(|&(_, y)| y * step).sum();
    assert!((area - 1.0).abs() < 0.01, "area {area}");
    assert!(curve.iter().all(|&(_, y)| y >= 0.0));
}

#[test]
fn test_render_boxplot_writes_svg() {
    let dir = make_temp_dir();
    let path = dir.join("all_boxplot.svg");
    let data = rows(&[
        (HostAgeCat::Intergenic, ObsSim::InterObs, &[1.0, 2.0, 3.0]),
        (HostAgeCat::Intergenic, ObsSim::InterSim, &[0.5, 0.7, 9.0, 0.6, 0.4]),
    ]);
    render_boxplot(&data, "all", &path).unwrap();
    let svg = fs::read_to_string(&path).unwrap();
    assert!(svg.starts_with("<svg") || svg.starts_with("<?xml"));
    assert!(svg.contains("Intergenic (observed)"));
    assert!(svg.contains("Intergenic (simulated)"));

    let err = render_boxplot(&[], "empty", &dir.join("empty.svg")).unwrap_err();
    assert!(matches!(err, PlotError::NoData(_)));
}

#[test]
fn test_render_density_skips_singletons() {
    let dir = make_temp_dir();
    let path = dir.join("all_density.svg");
    let data = rows(&[
        (HostAgeCat::Ancestral, ObsSim::IntraAncObs, &[1.0, 2.0, 2.5]),
        (HostAgeCat::Ancestral, ObsSim::IntraAncSim, &[0.1]),
        (HostAgeCat::Novel, ObsSim::IntraNovObs, &[0.0, 1.0]),
    ]);
    let skipped = render_density(&data, "all", &path).unwrap();
    assert_eq!(skipped, vec!["ancestral/intra_anc_sim".to_string()]);
    let svg = fs::read_to_string(&path).unwrap();
    assert!(svg.contains("Intragenic ancestral"));
    assert!(svg.contains("Intragenic novel"));

    let lonely = rows(&[(HostAgeCat::Novel, ObsSim::IntraNovSim, &[1.0])]);
    let err = render_density(&lonely, "lonely", &dir.join("lonely.svg")).unwrap_err();
    assert!(matches!(err, PlotError::NoData(_)));
}
