use std::collections::HashSet;
use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::analysis::filter::RowFilter;
use crate::model::{AgeBin, ObsSim};

#[derive(Debug, thiserror::Error)]
pub enum PlanError {
    #[error("cannot read plan {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid plan {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
    #[error("invalid plan: {0}")]
    Invalid(String),
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AnalysisPlan {
    #[serde(default)]
    pub variant: Vec<Variant>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Variant {
    pub name: String,
    #[serde(default)]
    pub filter: RowFilter,
    #[serde(default = "enabled")]
    pub boxplot: bool,
    #[serde(default = "enabled")]
    pub density: bool,
    #[serde(default)]
    pub comparison: Vec<Comparison>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Comparison {
    pub name: String,
    pub a: RowFilter,
    pub b: RowFilter,
}

fn enabled() -> bool {
    true
}

impl AnalysisPlan {
    pub fn load(path: &Path) -> Result<Self, PlanError> {
        let text = std::fs::read_to_string(path).map_err(|source| PlanError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let plan: AnalysisPlan = toml::from_str(&text).map_err(|source| PlanError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        plan.validate()?;
        Ok(plan)
    }

    /// Variant names become file names, so they must be unique and path-safe.
    pub fn validate(&self) -> Result<(), PlanError> {
        if self.variant.is_empty() {
            return Err(PlanError::Invalid("plan has no [[variant]] entries".to_string()));
        }
        let mut seen = HashSet::new();
        for v in &self.variant {
            let safe = !v.name.is_empty()
                && v
                    .name
                    .chars()
                    .all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '-' | '.'));
            if !safe || v.name.starts_with('.') {
                return Err(PlanError::Invalid(format!(
                    "variant name '{}' must use only letters, digits, '_', '-' or '.'",
                    v.name
                )));
            }
            if !seen.insert(v.name.as_str()) {
                return Err(PlanError::Invalid(format!(
                    "duplicate variant name '{}'",
                    v.name
                )));
            }
        }
        Ok(())
    }
}

fn observed_vs_simulated() -> Vec<Comparison> {
    [
        ("intergenic", ObsSim::InterObs, ObsSim::InterSim),
        ("intragenic_ancestral", ObsSim::IntraAncObs, ObsSim::IntraAncSim),
        ("intragenic_novel", ObsSim::IntraNovObs, ObsSim::IntraNovSim),
    ]
    .into_iter()
    .map(|(name, obs, sim)| Comparison {
        name: name.to_string(),
        a: RowFilter::obs_sim(&[obs]),
        b: RowFilter::obs_sim(&[sim]),
    })
    .collect()
}

/// `all` plus one variant per age bin, each testing observed against
/// simulated scores within the three host groups.
pub fn default_plan() -> AnalysisPlan {
    let mut variant = vec![Variant {
        name: "all".to_string(),
        filter: RowFilter::default(),
        boxplot: true,
        density: true,
        comparison: observed_vs_simulated(),
    }];
    for &bin in AgeBin::ALL {
        variant.push(Variant {
            name: format!("age_{}", bin.as_str()),
            filter: RowFilter {
                age_bin: Some(vec![bin]),
                ..RowFilter::default()
            },
            boxplot: true,
            density: true,
            comparison: observed_vs_simulated(),
        });
    }
    AnalysisPlan { variant }
}

#[cfg(test)]
#[path = "../../tests/src_inline/analysis/plan.rs"]
mod tests;
