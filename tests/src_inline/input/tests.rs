use std::fs::{self, File};
use std::io::{Read, Write};
use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};

use flate2::Compression;
use flate2::write::GzEncoder;

use super::*;

static DIR_COUNTER: AtomicUsize = AtomicUsize::new(0);

fn make_temp_dir() -> PathBuf {
    let mut dir = std::env::temp_dir();
    let id = DIR_COUNTER.fetch_add(1, Ordering::SeqCst);
    dir.push(format!("kira_phylosim_input_test_{}_{}", std::process::id(), id));
    fs::create_dir_all(&dir).unwrap();
    dir
}

fn write_gz(path: &Path, contents: &str) {
    let mut enc = GzEncoder::new(File::create(path).unwrap(), Compression::default());
    enc.write_all(contents.as_bytes()).unwrap();
    enc.finish().unwrap();
}

#[test]
fn test_open_plain_and_gz_yield_same_text() {
    let dir = make_temp_dir();
    let plain = dir.join("table.txt");
    let gz = dir.join("table.txt.gz");
    fs::write(&plain, "a b\n1 2\n").unwrap();
    write_gz(&gz, "a b\n1 2\n");

    let mut a = String::new();
    open_maybe_gz(&plain).unwrap().read_to_string(&mut a).unwrap();
    let mut b = String::new();
    open_maybe_gz(&gz).unwrap().read_to_string(&mut b).unwrap();
    assert_eq!(a, b);
}

#[test]
fn test_open_missing_file() {
    let dir = make_temp_dir();
    let err = open_maybe_gz(&dir.join("absent.bed")).err().unwrap();
    assert!(matches!(err, InputError::MissingInput(_)));
}

#[test]
fn test_header_lines() {
    assert!(is_header_line("track name=x"));
    assert!(is_header_line("browser position chr1"));
    assert!(is_header_line("#chrom\tstart\tend"));
    assert!(!is_header_line("chr1\t1\t2"));
}
