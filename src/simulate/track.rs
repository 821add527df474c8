use std::cmp::Ordering;
use std::fs::File;
use std::io::Read;
use std::ops::Deref;
use std::path::{Path, PathBuf};

use memmap2::Mmap;

use crate::input::{InputError, is_gz, open_maybe_gz};
use crate::model::{Interval, ScoredInterval};

enum TrackBytes {
    Mapped(Mmap),
    Owned(Vec<u8>),
}

impl Deref for TrackBytes {
    type Target = [u8];

    fn deref(&self) -> &[u8] {
        match self {
            TrackBytes::Mapped(m) => m,
            TrackBytes::Owned(v) => v,
        }
    }
}

/// A sorted score BED (chrom, start, end, id, score) searched in place.
///
/// Lines must be sorted by chromosome then start and must not contain fully
/// nested elements, so ends are sorted as well. Per-base phyloP tracks satisfy
/// this by construction.
pub struct ScoreTrack {
    path: PathBuf,
    bytes: TrackBytes,
}

struct TrackLine<'a> {
    chrom: &'a str,
    start: u64,
    end: u64,
    score: Option<f64>,
}

impl ScoreTrack {
    pub fn open(path: &Path) -> Result<Self, InputError> {
        let bytes = if is_gz(path) {
            let mut buf = Vec::new();
            open_maybe_gz(path)?
                .read_to_end(&mut buf)
                .map_err(|e| InputError::io(path, e))?;
            TrackBytes::Owned(buf)
        } else {
            let file = File::open(path).map_err(|e| InputError::io(path, e))?;
            let len = file.metadata().map_err(|e| InputError::io(path, e))?.len();
            if len == 0 {
                TrackBytes::Owned(Vec::new())
            } else {
                let mmap = unsafe { Mmap::map(&file).map_err(|e| InputError::io(path, e))? };
                TrackBytes::Mapped(mmap)
            }
        };
        Ok(Self {
            path: path.to_path_buf(),
            bytes,
        })
    }

    #[cfg(test)]
    pub fn from_bytes(bytes: Vec<u8>) -> Self {
        Self {
            path: PathBuf::from("<memory>"),
            bytes: TrackBytes::Owned(bytes),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// All scored lines overlapping `query`, in file order.
    pub fn extract(&self, query: &Interval) -> Vec<ScoredInterval> {
        let data: &[u8] = &self.bytes;
        let mut out = Vec::new();
        if query.end <= query.start {
            return out;
        }

        let mut pos = lower_bound(data, query).min(data.len());
        while pos < data.len() {
            let end = next_newline(data, pos);
            let raw = &data[pos..end];
            pos = end + 1;
            let Some(line) = parse_line(raw) else {
                continue;
            };
            match line.chrom.cmp(query.chrom.as_str()) {
                Ordering::Less => continue,
                Ordering::Greater => break,
                Ordering::Equal => {}
            }
            if line.start >= query.end {
                break;
            }
            if line.end > query.start {
                if let Some(score) = line.score {
                    out.push(ScoredInterval {
                        start: line.start,
                        end: line.end,
                        score,
                    });
                }
            }
        }
        out
    }
}

/// Byte offset of the first line at or past `query.start` on its chromosome.
fn lower_bound(data: &[u8], query: &Interval) -> usize {
    let mut lo = 0usize;
    let mut hi = data.len();
    while lo < hi {
        let mid = lo + (hi - lo) / 2;
        let (line_start, line_end) = line_bounds(data, mid);
        if at_or_after(&data[line_start..line_end], query) {
            hi = line_start;
        } else {
            lo = line_end + 1;
        }
    }
    lo
}

fn at_or_after(raw: &[u8], query: &Interval) -> bool {
    match parse_line(raw) {
        Some(line) => match line.chrom.cmp(query.chrom.as_str()) {
            Ordering::Less => false,
            Ordering::Greater => true,
            Ordering::Equal => line.end > query.start,
        },
        None => false,
    }
}

fn line_bounds(data: &[u8], pos: usize) -> (usize, usize) {
    let start = data[..pos]
        .iter()
        .rposition(|&b| b == b'\n')
        .map_or(0, |i| i + 1);
    (start, next_newline(data, pos))
}

fn next_newline(data: &[u8], from: usize) -> usize {
    data[from..]
        .iter()
        .position(|&b| b == b'\n')
        .map_or(data.len(), |i| from + i)
}

fn parse_line(raw: &[u8]) -> Option<TrackLine<'_>> {
    let text = std::str::from_utf8(raw).ok()?;
    let mut fields = text.split_whitespace();
    let chrom = fields.next()?;
    let start = fields.next()?.parse::<u64>().ok()?;
    let end = fields.next()?.parse::<u64>().ok()?;
    let fourth = fields.next();
    let fifth = fields.next();
    // Column 5 carries the score; bedGraph-style tracks put it in column 4.
    let score = match fifth {
        Some(v) => v.parse::<f64>().ok(),
        None => fourth.and_then(|v| v.parse::<f64>().ok()),
    };
    Some(TrackLine {
        chrom,
        start,
        end,
        score,
    })
}

#[cfg(test)]
#[path = "../../tests/src_inline/simulate/track.rs"]
mod tests;
