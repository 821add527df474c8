use std::io::BufRead;
use std::path::Path;

use crate::input::{InputError, SkippedLine, open_maybe_gz};
use crate::model::record::is_missing_token;
use crate::model::{AgeBin, Category, Direction, HostAgeCat, ObsSim, ScoreRecord};

#[derive(Debug, Clone, Default)]
pub struct ResultsTable {
    pub records: Vec<ScoreRecord>,
    pub skipped: Vec<SkippedLine>,
}

#[derive(Debug, Clone, Copy)]
struct ColumnMap {
    category: usize,
    direction: Option<usize>,
    host_age_cat: usize,
    age_bin: usize,
    obs_sim: usize,
    score: usize,
    n_columns: usize,
}

impl ColumnMap {
    fn from_header(header: &[String]) -> Result<Self, InputError> {
        let find = |names: &[&str]| {
            header
                .iter()
                .position(|h| names.iter().any(|n| h.eq_ignore_ascii_case(n)))
        };
        let require = |names: &[&str]| {
            find(names).ok_or_else(|| {
                InputError::InvalidInput(format!(
                    "results header lacks required column '{}'",
                    names[0]
                ))
            })
        };
        Ok(Self {
            category: require(&["category"])?,
            direction: find(&["direction"]),
            host_age_cat: require(&["host_age_cat"])?,
            age_bin: require(&["age_bin"])?,
            obs_sim: require(&["obs_sim"])?,
            score: require(&["phyloP_score", "phylop"])?,
            n_columns: header.len(),
        })
    }
}

pub fn load_results(path: &Path) -> Result<ResultsTable, InputError> {
    let reader = open_maybe_gz(path)?;
    let table = parse_results(reader, &path.display().to_string())?;
    crate::info!(
        "loaded {} score records from {} ({} rows skipped)",
        table.records.len(),
        path.display(),
        table.skipped.len()
    );
    Ok(table)
}

pub fn parse_results<R: BufRead>(mut reader: R, source: &str) -> Result<ResultsTable, InputError> {
    let mut buf = String::new();
    let mut line_no = 0usize;

    let header = loop {
        buf.clear();
        let read = reader
            .read_line(&mut buf)
            .map_err(|e| InputError::Parse(format!("{source}: {e}")))?;
        if read == 0 {
            return Err(InputError::Parse(format!("{source}: results table is empty")));
        }
        line_no += 1;
        let line = buf.trim();
        if !line.is_empty() {
            break split_fields(line);
        }
    };
    let columns = ColumnMap::from_header(&header)?;

    let mut table = ResultsTable::default();
    loop {
        buf.clear();
        let read = reader
            .read_line(&mut buf)
            .map_err(|e| InputError::Parse(format!("{source}: {e}")))?;
        if read == 0 {
            break;
        }
        line_no += 1;
        let line = buf.trim();
        if line.is_empty() {
            continue;
        }
        let fields = split_fields(line);
        match parse_row(&fields, &columns) {
            Ok(record) => table.records.push(record),
            Err(reason) => {
                crate::warn!(
                    "malformed results row in {} (line {}): {}; skipping",
                    source,
                    line_no,
                    reason
                );
                table.skipped.push(SkippedLine { line_no, reason });
            }
        }
    }

    Ok(table)
}

fn split_fields(line: &str) -> Vec<String> {
    line.split_whitespace()
        .map(|f| f.trim_matches('"').to_string())
        .collect()
}

fn parse_row(fields: &[String], columns: &ColumnMap) -> Result<ScoreRecord, String> {
    // Tables written with row names carry one leading field the header lacks.
    let offset = if fields.len() == columns.n_columns + 1 {
        1
    } else if fields.len() == columns.n_columns {
        0
    } else {
        return Err(format!(
            "expected {} fields, found {}",
            columns.n_columns,
            fields.len()
        ));
    };
    let field = move |idx: usize| fields[idx + offset].as_str();

    let score_raw = field(columns.score);
    if is_missing_token(score_raw) {
        return Err("missing phyloP_score".to_string());
    }
    let phylop_score = score_raw
        .parse::<f64>()
        .ok()
        .filter(|v| v.is_finite())
        .ok_or_else(|| format!("phyloP_score '{}' is not a finite number", score_raw))?;

    let direction = match columns.direction.map(field) {
        Some(raw) if !is_missing_token(raw) => {
            Some(raw.parse::<Direction>().map_err(|e| e.to_string())?)
        }
        _ => None,
    };

    Ok(ScoreRecord {
        category: field(columns.category)
            .parse::<Category>()
            .map_err(|e| e.to_string())?,
        direction,
        host_age_cat: field(columns.host_age_cat)
            .parse::<HostAgeCat>()
            .map_err(|e| e.to_string())?,
        age_bin: field(columns.age_bin)
            .parse::<AgeBin>()
            .map_err(|e| e.to_string())?,
        obs_sim: field(columns.obs_sim)
            .parse::<ObsSim>()
            .map_err(|e| e.to_string())?,
        phylop_score,
    })
}

#[cfg(test)]
#[path = "../../tests/src_inline/input/results.rs"]
mod tests;
