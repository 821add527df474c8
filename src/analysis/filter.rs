use serde::Deserialize;

use crate::model::{AgeBin, Category, Direction, HostAgeCat, ObsSim, ScoreRecord};

/// Row predicate: every set field must contain the row's value.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RowFilter {
    #[serde(default)]
    pub category: Option<Vec<Category>>,
    #[serde(default)]
    pub direction: Option<Vec<Direction>>,
    #[serde(default)]
    pub host_age_cat: Option<Vec<HostAgeCat>>,
    #[serde(default)]
    pub age_bin: Option<Vec<AgeBin>>,
    #[serde(default)]
    pub obs_sim: Option<Vec<ObsSim>>,
}

fn allows<T: PartialEq>(allowed: &Option<Vec<T>>, value: &T) -> bool {
    allowed.as_ref().is_none_or(|set| set.contains(value))
}

impl RowFilter {
    pub fn obs_sim(values: &[ObsSim]) -> Self {
        Self {
            obs_sim: Some(values.to_vec()),
            ..Self::default()
        }
    }

    pub fn is_empty(&self) -> bool {
        self == &Self::default()
    }

    pub fn matches(&self, record: &ScoreRecord) -> bool {
        let direction_ok = match &self.direction {
            None => true,
            Some(set) => record.direction.is_some_and(|d| set.contains(&d)),
        };
        direction_ok
            && allows(&self.category, &record.category)
            && allows(&self.host_age_cat, &record.host_age_cat)
            && allows(&self.age_bin, &record.age_bin)
            && allows(&self.obs_sim, &record.obs_sim)
    }

    pub fn apply(&self, records: &[ScoreRecord]) -> Vec<ScoreRecord> {
        records
            .iter()
            .filter(|r| self.matches(r))
            .cloned()
            .collect()
    }

    pub fn scores(&self, records: &[ScoreRecord]) -> Vec<f64> {
        records
            .iter()
            .filter(|r| self.matches(r))
            .map(|r| r.phylop_score)
            .collect()
    }

    pub fn describe(&self) -> String {
        fn part<T: std::fmt::Display>(out: &mut Vec<String>, name: &str, set: &Option<Vec<T>>) {
            if let Some(values) = set {
                let joined = values
                    .iter()
                    .map(|v| v.to_string())
                    .collect::<Vec<_>>()
                    .join("|");
                out.push(format!("{name}={joined}"));
            }
        }
        if self.is_empty() {
            return "all".to_string();
        }
        let mut parts = Vec::new();
        part(&mut parts, "category", &self.category);
        part(&mut parts, "direction", &self.direction);
        part(&mut parts, "host_age_cat", &self.host_age_cat);
        part(&mut parts, "age_bin", &self.age_bin);
        part(&mut parts, "obs_sim", &self.obs_sim);
        parts.join(",")
    }
}

#[cfg(test)]
#[path = "../../tests/src_inline/analysis/filter.rs"]
mod tests;
