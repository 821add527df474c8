use crate::model::ScoreRecord;
use crate::model::levels::{ObsSimStyle, age_bin_level, host_age_level, obs_sim_style};

/// A record with its display encoding attached.
#[derive(Debug, Clone, PartialEq)]
pub struct LabeledRecord {
    pub record: ScoreRecord,
    pub age_bin_idx: usize,
    pub age_bin_label: &'static str,
    pub host_age_idx: usize,
    pub host_age_label: &'static str,
    pub obs_sim_idx: usize,
    pub obs_sim_style: &'static ObsSimStyle,
}

pub fn relabel(records: &[ScoreRecord]) -> Vec<LabeledRecord> {
    records.iter().map(relabel_one).collect()
}

fn relabel_one(record: &ScoreRecord) -> LabeledRecord {
    let (age_bin_idx, age_bin_label) = age_bin_level(record.age_bin);
    let (host_age_idx, host_age_label) = host_age_level(record.host_age_cat);
    let (obs_sim_idx, obs_sim_style) = obs_sim_style(record.obs_sim);
    LabeledRecord {
        record: record.clone(),
        age_bin_idx,
        age_bin_label,
        host_age_idx,
        host_age_label,
        obs_sim_idx,
        obs_sim_style,
    }
}

#[cfg(test)]
#[path = "../../tests/src_inline/analysis/relabel.rs"]
mod tests;
