//! Display order and styling for every categorical column.
//!
//! Plots and reports iterate these tables instead of sorting level names, so
//! "7_12" always follows "5_6" and observed boxes sit left of their simulated
//! counterparts.

use crate::model::record::{AgeBin, HostAgeCat, ObsSim};

#[derive(Debug, Clone, Copy)]
pub struct Level<T: 'static> {
    pub value: T,
    pub label: &'static str,
}

pub const AGE_BIN_LEVELS: &[Level<AgeBin>] = &[
    Level {
        value: AgeBin::One,
        label: "1",
    },
    Level {
        value: AgeBin::TwoToFour,
        label: "2-4",
    },
    Level {
        value: AgeBin::FiveToSix,
        label: "5-6",
    },
    Level {
        value: AgeBin::SevenToTwelve,
        label: "7-12",
    },
];

pub const HOST_AGE_LEVELS: &[Level<HostAgeCat>] = &[
    Level {
        value: HostAgeCat::Intergenic,
        label: "Intergenic",
    },
    Level {
        value: HostAgeCat::Ancestral,
        label: "Intragenic ancestral",
    },
    Level {
        value: HostAgeCat::Novel,
        label: "Intragenic novel",
    },
];

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ObsSimStyle {
    pub value: ObsSim,
    pub label: &'static str,
    pub rgb: (u8, u8, u8),
}

pub const OBS_SIM_STYLES: &[ObsSimStyle] = &[
    ObsSimStyle {
        value: ObsSim::InterObs,
        label: "Intergenic (observed)",
        rgb: (0x1b, 0x9e, 0x77),
    },
    ObsSimStyle {
        value: ObsSim::InterSim,
        label: "Intergenic (simulated)",
        rgb: (0xa6, 0xdb, 0xc9),
    },
    ObsSimStyle {
        value: ObsSim::IntraAncObs,
        label: "Intragenic ancestral (observed)",
        rgb: (0xd9, 0x5f, 0x02),
    },
    ObsSimStyle {
        value: ObsSim::IntraAncSim,
        label: "Intragenic ancestral (simulated)",
        rgb: (0xfd, 0xc0, 0x86),
    },
    ObsSimStyle {
        value: ObsSim::IntraNovObs,
        label: "Intragenic novel (observed)",
        rgb: (0x75, 0x70, 0xb3),
    },
    ObsSimStyle {
        value: ObsSim::IntraNovSim,
        label: "Intragenic novel (simulated)",
        rgb: (0xc9, 0xc6, 0xe8),
    },
];

pub fn age_bin_level(value: AgeBin) -> (usize, &'static str) {
    level_of(AGE_BIN_LEVELS, value)
}

pub fn host_age_level(value: HostAgeCat) -> (usize, &'static str) {
    level_of(HOST_AGE_LEVELS, value)
}

pub fn obs_sim_style(value: ObsSim) -> (usize, &'static ObsSimStyle) {
    let idx = OBS_SIM_STYLES
        .iter()
        .position(|s| s.value == value)
        .unwrap_or(OBS_SIM_STYLES.len() - 1);
    (idx, &OBS_SIM_STYLES[idx])
}

fn level_of<T: PartialEq + Copy>(table: &'static [Level<T>], value: T) -> (usize, &'static str) {
    match table.iter().position(|l| l.value == value) {
        Some(idx) => (idx, table[idx].label),
        None => (table.len(), "other"),
    }
}

#[cfg(test)]
#[path = "../../tests/src_inline/model/levels.rs"]
mod tests;
