use std::fmt;

/// Half-open `[start, end)` interval in 0-based BED coordinates.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Interval {
    pub chrom: String,
    pub start: u64,
    pub end: u64,
}

impl Interval {
    pub fn new(chrom: impl Into<String>, start: u64, end: u64) -> Self {
        Self {
            chrom: chrom.into(),
            start,
            end,
        }
    }

    /// Builds an interval from signed arithmetic; `None` when it falls off the
    /// chromosome start or is empty.
    pub fn checked(chrom: &str, start: i64, end: i64) -> Option<Self> {
        if start < 0 || end <= start {
            return None;
        }
        Some(Self::new(chrom, start as u64, end as u64))
    }

    pub fn len(&self) -> u64 {
        self.end.saturating_sub(self.start)
    }

    pub fn overlaps(&self, other: &Interval) -> bool {
        self.chrom == other.chrom && self.start < other.end && other.start < self.end
    }
}

impl fmt::Display for Interval {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}\t{}\t{}", self.chrom, self.start, self.end)
    }
}

/// A simulation input: one BED line with its name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Feature {
    pub interval: Interval,
    pub name: String,
}

impl Feature {
    pub fn chrom(&self) -> &str {
        &self.interval.chrom
    }

    pub fn start(&self) -> u64 {
        self.interval.start
    }

    pub fn end(&self) -> u64 {
        self.interval.end
    }

    pub fn size(&self) -> u64 {
        self.interval.len()
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScoredInterval {
    pub start: u64,
    pub end: u64,
    pub score: f64,
}

/// Outcome of one simulation draw. The textual forms are the output contract
/// consumed by downstream tables.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SimScore {
    Mean(f64),
    Missing,
    UnparsableName,
    UnknownHost,
}

impl SimScore {
    pub fn from_scores(scores: &[ScoredInterval]) -> Self {
        if scores.is_empty() {
            return SimScore::Missing;
        }
        let sum: f64 = scores.iter().map(|s| s.score).sum();
        SimScore::Mean(sum / scores.len() as f64)
    }

    pub fn value(self) -> Option<f64> {
        match self {
            SimScore::Mean(v) => Some(v),
            _ => None,
        }
    }
}

impl fmt::Display for SimScore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SimScore::Mean(v) => f.write_str(&format_score(*v)),
            SimScore::Missing => f.write_str("NA"),
            SimScore::UnparsableName => f.write_str("NameError1"),
            SimScore::UnknownHost => f.write_str("NameError2"),
        }
    }
}

const SCORE_DIGITS: i32 = 12;

/// `%.12g` with a `.0` suffix on integral results, so `0.1 + 0.2` prints
/// as `0.3` and `2.0` as `2.0`.
fn format_score(v: f64) -> String {
    if v.is_nan() {
        return "nan".to_string();
    }
    if v.is_infinite() {
        return if v > 0.0 { "inf" } else { "-inf" }.to_string();
    }
    let sci = format!("{:.*e}", (SCORE_DIGITS - 1) as usize, v);
    let (mantissa, exp) = sci.split_once('e').unwrap_or((sci.as_str(), "0"));
    let exp: i32 = exp.parse().unwrap_or(0);

    let mut out = if (-4..SCORE_DIGITS).contains(&exp) {
        let fixed = format!("{:.*}", (SCORE_DIGITS - 1 - exp) as usize, v);
        trim_fraction(&fixed).to_string()
    } else {
        let sign = if exp < 0 { '-' } else { '+' };
        format!("{}e{sign}{:02}", trim_fraction(mantissa), exp.abs())
    };
    if out.bytes().all(|b| b.is_ascii_digit() || b == b'-') {
        out.push_str(".0");
    }
    out
}

fn trim_fraction(s: &str) -> &str {
    if s.contains('.') {
        s.trim_end_matches('0').trim_end_matches('.')
    } else {
        s
    }
}

#[cfg(test)]
#[path = "../../tests/src_inline/model/interval.rs"]
mod tests;
