use std::collections::HashMap;
use std::io::BufRead;
use std::path::Path;

use crate::input::{InputError, SkippedLine, is_header_line, open_maybe_gz};
use crate::model::{Feature, Interval};

/// One line of a driver interval file, re-joined with tabs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IntervalRecord {
    pub line_no: usize,
    pub chrom: String,
    pub start: u64,
    pub end: u64,
    pub extra: Vec<String>,
}

impl IntervalRecord {
    pub fn name(&self) -> Option<&str> {
        self.extra.first().map(String::as_str)
    }

    pub fn tab_line(&self) -> String {
        let mut out = format!("{}\t{}\t{}", self.chrom, self.start, self.end);
        for field in &self.extra {
            out.push('\t');
            out.push_str(field);
        }
        out
    }

    pub fn label(&self) -> String {
        match self.name() {
            Some(name) => name.to_string(),
            None => format!("{}:{}-{}", self.chrom, self.start, self.end),
        }
    }

    pub fn to_feature(&self) -> Feature {
        Feature {
            interval: Interval::new(self.chrom.clone(), self.start, self.end),
            name: self.label(),
        }
    }
}

/// Splits on any run of whitespace, so space-separated exports are accepted.
pub fn parse_interval_line(line: &str, line_no: usize) -> Result<IntervalRecord, String> {
    let fields: Vec<&str> = line.split_whitespace().collect();
    if fields.len() < 3 {
        return Err(format!("expected at least 3 fields, found {}", fields.len()));
    }
    let start = fields[1]
        .parse::<u64>()
        .map_err(|_| format!("start '{}' is not a non-negative integer", fields[1]))?;
    let end = fields[2]
        .parse::<u64>()
        .map_err(|_| format!("end '{}' is not a non-negative integer", fields[2]))?;
    if end < start {
        return Err(format!("end {} precedes start {}", end, start));
    }
    Ok(IntervalRecord {
        line_no,
        chrom: fields[0].to_string(),
        start,
        end,
        extra: fields[3..].iter().map(|s| s.to_string()).collect(),
    })
}

pub fn read_interval_records(
    path: &Path,
) -> Result<(Vec<IntervalRecord>, Vec<SkippedLine>), InputError> {
    let mut reader = open_maybe_gz(path)?;
    let mut buf = String::new();
    let mut records = Vec::new();
    let mut skipped = Vec::new();
    let mut line_no = 0usize;

    loop {
        buf.clear();
        let read = reader
            .read_line(&mut buf)
            .map_err(|e| InputError::io(path, e))?;
        if read == 0 {
            break;
        }
        line_no += 1;
        let line = buf.trim();
        if line.is_empty() || is_header_line(line) {
            continue;
        }
        match parse_interval_line(line, line_no) {
            Ok(record) => records.push(record),
            Err(reason) => {
                crate::warn!(
                    "malformed interval record in {} (line {}): {}; skipping",
                    path.display(),
                    line_no,
                    reason
                );
                skipped.push(SkippedLine { line_no, reason });
            }
        }
    }

    Ok((records, skipped))
}

pub fn read_features(path: &Path) -> Result<Vec<Feature>, InputError> {
    let (records, _) = read_interval_records(path)?;
    Ok(records.iter().map(IntervalRecord::to_feature).collect())
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NamedRegion {
    pub interval: Interval,
    pub name: Option<String>,
}

/// Background regions grouped per chromosome, sorted by start.
#[derive(Debug, Clone, Default)]
pub struct RegionSet {
    by_chrom: HashMap<String, Vec<NamedRegion>>,
}

impl RegionSet {
    pub fn from_regions(regions: Vec<NamedRegion>) -> Self {
        let mut by_chrom: HashMap<String, Vec<NamedRegion>> = HashMap::new();
        for region in regions {
            by_chrom
                .entry(region.interval.chrom.clone())
                .or_default()
                .push(region);
        }
        for list in by_chrom.values_mut() {
            list.sort_by_key(|r| (r.interval.start, r.interval.end));
        }
        Self { by_chrom }
    }

    pub fn len(&self) -> usize {
        self.by_chrom.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn iter(&self) -> impl Iterator<Item = &NamedRegion> {
        self.by_chrom.values().flatten()
    }

    /// Regions overlapping `query`, in start order.
    pub fn overlapping(&self, query: &Interval) -> Vec<&NamedRegion> {
        let Some(list) = self.by_chrom.get(&query.chrom) else {
            return Vec::new();
        };
        let upper = list.partition_point(|r| r.interval.start < query.end);
        list[..upper]
            .iter()
            .filter(|r| r.interval.end > query.start)
            .collect()
    }

    pub fn any_overlap(&self, query: &Interval) -> bool {
        !self.overlapping(query).is_empty()
    }
}

pub fn load_region_set(path: &Path) -> Result<RegionSet, InputError> {
    let (records, skipped) = read_interval_records(path)?;
    if records.is_empty() && !skipped.is_empty() {
        return Err(InputError::Parse(format!(
            "no usable regions in {} ({} malformed lines)",
            path.display(),
            skipped.len()
        )));
    }
    let regions = records
        .into_iter()
        .map(|r| NamedRegion {
            interval: Interval::new(r.chrom, r.start, r.end),
            name: r.extra.into_iter().next(),
        })
        .collect();
    Ok(RegionSet::from_regions(regions))
}

#[cfg(test)]
#[path = "../../tests/src_inline/input/bed.rs"]
mod tests;
