use super::*;
use std::fs;
use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};

static DIR_COUNTER: AtomicUsize = AtomicUsize::new(0);

fn make_temp_dir() -> PathBuf {
    let mut dir = std::env::temp_dir();
    let id = DIR_COUNTER.fetch_add(1, Ordering::SeqCst);
    dir.push(format!("kira_phylosim_bed_test_{}_{}", std::process::id(), id));
    fs::create_dir_all(&dir).unwrap();
    dir
}

#[test]
fn test_parse_interval_line_rejoins_with_tabs() {
    let rec = parse_interval_line("chr1   100 200  mir-1_ENSG1_ENST1  0 +", 4).unwrap();
    assert_eq!(rec.line_no, 4);
    assert_eq!(rec.tab_line(), "chr1\t100\t200\tmir-1_ENSG1_ENST1\t0\t+");
    assert_eq!(rec.label(), "mir-1_ENSG1_ENST1");
}

#[test]
fn test_parse_interval_line_rejects_bad_fields() {
    assert!(parse_interval_line("chr1 100", 1).is_err());
    assert!(parse_interval_line("chr1 abc 200", 1).is_err());
    assert!(parse_interval_line("chr1 300 200", 1).is_err());
}

#[test]
fn test_read_interval_records_skips_headers_and_reports_malformed() {
    let dir = make_temp_dir();
    let path = dir.join("features.bed");
    fs::write(
        &path,
        "track name=test\n# comment\nchr1 10 20 a\n\nchr1 x 20 b\nchr2\t5\t9\n",
    )
    .unwrap();

    let (records, skipped) = read_interval_records(&path).unwrap();
    assert_eq!(records.len(), 2);
    assert_eq!(records[0].line_no, 3);
    assert_eq!(records[1].label(), "chr2:5-9");
    assert_eq!(skipped.len(), 1);
    assert_eq!(skipped[0].line_no, 5);
}

#[test]
fn test_missing_file_is_reported() {
    let err = read_interval_records(Path::new("/nonexistent/kira/features.bed")).unwrap_err();
    assert!(matches!(err, InputError::MissingInput(_)));
}

#[test]
fn test_region_set_overlap_query() {
    let set = RegionSet::from_regions(vec![
        NamedRegion {
            interval: Interval::new("chr1", 50, 80),
            name: Some("g2".to_string()),
        },
        NamedRegion {
            interval: Interval::new("chr1", 0, 100),
            name: Some("g1".to_string()),
        },
        NamedRegion {
            interval: Interval::new("chr1", 200, 300),
            name: None,
        },
    ]);
    assert_eq!(set.len(), 3);

    let hits = set.overlapping(&Interval::new("chr1", 60, 210));
    let names: Vec<_> = hits.iter().map(|r| r.name.clone()).collect();
    assert_eq!(
        names,
        vec![Some("g1".to_string()), Some("g2".to_string()), None]
    );
    assert!(!set.any_overlap(&Interval::new("chr1", 100, 200)));
    assert!(!set.any_overlap(&Interval::new("chr9", 0, 1000)));
}
