use super::*;
use crate::analysis::filter::RowFilter;
use crate::analysis::stats::RankSumMethod;
use crate::model::ObsSim;
use std::fs;
use std::sync::atomic::{AtomicUsize, Ordering};

static DIR_COUNTER: AtomicUsize = AtomicUsize::new(0);

fn make_temp_dir() -> PathBuf {
    let mut dir = std::env::temp_dir();
    let id = DIR_COUNTER.fetch_add(1, Ordering::SeqCst);
    dir.push(format!("kira_phylosim_analysis_test_{}_{}", std::process::id(), id));
    fs::create_dir_all(&dir).unwrap();
    dir
}

const TABLE: &str = "\
category\tdirection\thost_age_cat\tage_bin\tobs_sim\tphyloP_score
intergenic\tNA\tintergenic\t1\tinter_obs\t1.0
intergenic\tNA\tintergenic\t1\tinter_obs\t2.0
intergenic\tNA\tintergenic\t1\tinter_sim\t1.5
intergenic\tNA\tintergenic\t1\tinter_sim\t1.5
intragenic\tsense\tancestral\t2_4\tintra_anc_obs\t3.0
intragenic\tantisense\tancestral\t2_4\tintra_anc_obs\t4.0
intragenic\tsense\tancestral\t2_4\tintra_anc_sim\t0.5
intragenic\tsense\tancestral\t2_4\tintra_anc_sim\t0.25
intragenic\tsense\tnovel\t5_6\tintra_nov_obs\t0.1
intragenic\tsense\tnovel\t5_6\tintra_nov_obs\tNA
";

fn config(dir: &Path, plan: Option<PathBuf>) -> AnalysisConfig {
    let input = dir.join("results.tsv");
    fs::write(&input, TABLE).unwrap();
    AnalysisConfig {
        input,
        out_dir: dir.join("out"),
        plan,
        plots: true,
    }
}

#[test]
fn test_tied_comparison_scenario() {
    let dir = make_temp_dir();
    let plan = dir.join("plan.toml");
    fs::write(
        &plan,
        "[[variant]]\nname = \"inter\"\nboxplot = false\ndensity = false\n\
         [[variant.comparison]]\nname = \"intergenic\"\n\
         a = { obs_sim = [\"inter_obs\"] }\nb = { obs_sim = [\"inter_sim\"] }\n",
    )
    .unwrap();
    let cfg = config(&dir, Some(plan));
    let mut stdout = Vec::new();
    let summary = run_analysis(&cfg, &mut stdout).unwrap();

    let result = summary.comparisons[0].result.unwrap();
    assert_eq!(result.statistic, 2.0);
    assert_eq!(result.p_value, 1.0);

    let printed = String::from_utf8(stdout).unwrap();
    assert_eq!(
        printed,
        "[inter] intergenic: W = 2.000000, p-value = 1.000000 (normal, n1 = 2, n2 = 2)\n"
    );
    assert!(!cfg.out_dir.join("inter_boxplot.svg").exists());
    assert!(cfg.out_dir.join(RANKSUM_FILE).exists());
}

#[test]
fn test_default_plan_outputs() {
    let dir = make_temp_dir();
    let cfg = config(&dir, None);
    let mut stdout = Vec::new();
    let summary = run_analysis(&cfg, &mut stdout).unwrap();

    assert_eq!(summary.rows_loaded, 9);
    assert_eq!(summary.rows_skipped, 1);
    assert_eq!(summary.variants.len(), 5);
    assert_eq!(summary.comparisons.len(), 15);

    assert!(cfg.out_dir.join("all_boxplot.svg").exists());
    assert!(cfg.out_dir.join("all_density.svg").exists());
    assert!(cfg.out_dir.join("age_1_boxplot.svg").exists());
    // No rows in this bin: nothing drawn, comparisons skipped.
    assert!(!cfg.out_dir.join("age_7_12_boxplot.svg").exists());

    let all_novel = summary
        .comparisons
        .iter()
        .find(|c| c.variant == "all" && c.comparison == "intragenic_novel")
        .unwrap();
    assert!(all_novel.result.is_none());
    assert_eq!(all_novel.note.as_deref(), Some("group b is empty"));

    let anc = summary
        .comparisons
        .iter()
        .find(|c| c.variant == "all" && c.comparison == "intragenic_ancestral")
        .unwrap()
        .result
        .unwrap();
    assert_eq!(anc.method, RankSumMethod::Exact);
    assert_eq!(anc.statistic, 4.0);

    let tsv = fs::read_to_string(cfg.out_dir.join(RANKSUM_FILE)).unwrap();
    assert_eq!(tsv.lines().count(), 16);

    let json: serde_json::Value =
        serde_json::from_str(&fs::read_to_string(cfg.out_dir.join(SUMMARY_FILE)).unwrap())
            .unwrap();
    assert_eq!(json["rows_loaded"], 9);
    assert_eq!(json["variants"][0]["name"], "all");
    assert_eq!(
        summary.variants[0].age_bins,
        vec!["1".to_string(), "2-4".to_string(), "5-6".to_string()]
    );
    assert_eq!(
        summary.variants[0].host_groups,
        vec![
            "Intergenic".to_string(),
            "Intragenic ancestral".to_string(),
            "Intragenic novel".to_string()
        ]
    );

    let printed = String::from_utf8(stdout).unwrap();
    assert_eq!(printed.lines().count(), 15);
}

#[test]
fn test_compare_reports_empty_group() {
    let comparison = Comparison {
        name: "x".to_string(),
        a: RowFilter::obs_sim(&[ObsSim::InterObs]),
        b: RowFilter::obs_sim(&[ObsSim::InterSim]),
    };
    let outcome = compare("v", &comparison, &[]);
    assert_eq!(outcome.n1, 0);
    assert_eq!(outcome.note.as_deref(), Some("group a is empty"));
}

#[test]
fn test_empty_table_is_error() {
    let dir = make_temp_dir();
    let cfg = config(&dir, None);
    fs::write(&cfg.input, "category direction host_age_cat age_bin obs_sim phyloP_score\n").unwrap();
    let err = run_analysis(&cfg, &mut Vec::new()).unwrap_err();
    assert!(matches!(err, AnalysisError::Input(InputError::InvalidInput(_))));
}
