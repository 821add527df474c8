use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};

use flate2::read::MultiGzDecoder;

pub mod bed;
pub mod results;
pub mod score_dir;

#[derive(Debug, thiserror::Error)]
pub enum InputError {
    #[error("IO error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("missing input: {0}")]
    MissingInput(String),
    #[error("invalid input: {0}")]
    InvalidInput(String),
    #[error("parse error: {0}")]
    Parse(String),
}

impl InputError {
    pub fn io(path: &Path, source: std::io::Error) -> Self {
        InputError::Io {
            path: path.to_path_buf(),
            source,
        }
    }
}

/// A line that was reported and excluded instead of aborting the load.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkippedLine {
    pub line_no: usize,
    pub reason: String,
}

pub fn is_gz(path: &Path) -> bool {
    path.extension().is_some_and(|ext| ext == "gz")
}

pub fn open_maybe_gz(path: &Path) -> Result<Box<dyn BufRead>, InputError> {
    if !path.exists() {
        return Err(InputError::MissingInput(format!(
            "{} does not exist",
            path.display()
        )));
    }
    let file = File::open(path).map_err(|e| InputError::io(path, e))?;
    if is_gz(path) {
        Ok(Box::new(BufReader::new(MultiGzDecoder::new(file))))
    } else {
        Ok(Box::new(BufReader::new(file)))
    }
}

/// BED header lines carry no interval.
pub fn is_header_line(line: &str) -> bool {
    line.starts_with('#') || line.starts_with("track") || line.starts_with("browser")
}

#[cfg(test)]
#[path = "../../tests/src_inline/input/tests.rs"]
mod tests;
