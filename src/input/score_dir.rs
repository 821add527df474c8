use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use crate::input::InputError;

/// Maps chromosome names to their score track, keyed by the file name up to
/// the first dot (`chrY.phyloP46way.wigFix.bed` -> `chrY`). When several
/// files share a chromosome the first by file name wins.
pub fn discover_score_files(dir: &Path) -> Result<BTreeMap<String, PathBuf>, InputError> {
    if !dir.is_dir() {
        return Err(InputError::MissingInput(format!(
            "could not find score directory {}",
            dir.display()
        )));
    }

    let mut paths = Vec::new();
    let entries = fs::read_dir(dir).map_err(|e| InputError::io(dir, e))?;
    for entry in entries {
        let entry = entry.map_err(|e| InputError::io(dir, e))?;
        paths.push(entry.path());
    }
    paths.sort_unstable_by(|a, b| a.file_name().cmp(&b.file_name()));

    let mut out: BTreeMap<String, PathBuf> = BTreeMap::new();
    for path in paths {
        if !path.is_file() {
            continue;
        }
        let Some(file_name) = path.file_name().and_then(|n| n.to_str()) else {
            continue;
        };
        if !(file_name.ends_with(".bed") || file_name.ends_with(".bed.gz")) {
            continue;
        }
        let chrom = file_name.split('.').next().unwrap_or_default().to_string();
        if chrom.is_empty() {
            continue;
        }
        match out.get(&chrom) {
            Some(kept) => crate::warn!(
                "several score files for {}; using {} over {}",
                chrom,
                kept.display(),
                path.display()
            ),
            None => {
                out.insert(chrom, path);
            }
        }
    }

    crate::debug!("discovered {} score tracks in {}", out.len(), dir.display());
    Ok(out)
}

#[cfg(test)]
#[path = "../../tests/src_inline/input/score_dir.rs"]
mod tests;
