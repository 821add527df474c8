use super::*;
use crate::model::record::{AgeBin, HostAgeCat, ObsSim};

#[test]
fn test_every_level_has_exactly_one_entry() {
    for bin in AgeBin::ALL {
        assert_eq!(AGE_BIN_LEVELS.iter().filter(|l| l.value == *bin).count(), 1);
    }
    for host in HostAgeCat::ALL {
        assert_eq!(HOST_AGE_LEVELS.iter().filter(|l| l.value == *host).count(), 1);
    }
    for obs in ObsSim::ALL {
        assert_eq!(OBS_SIM_STYLES.iter().filter(|s| s.value == *obs).count(), 1);
    }
}

#[test]
fn test_age_bins_follow_numeric_order() {
    let labels: Vec<&str> = AGE_BIN_LEVELS.iter().map(|l| l.label).collect();
    assert_eq!(labels, vec!["1", "2-4", "5-6", "7-12"]);
    assert_eq!(age_bin_level(AgeBin::SevenToTwelve), (3, "7-12"));
    assert_eq!(host_age_level(HostAgeCat::Novel).0, 2);
}

#[test]
fn test_observed_precedes_simulated() {
    let (obs_idx, obs) = obs_sim_style(ObsSim::IntraNovObs);
    let (sim_idx, _) = obs_sim_style(ObsSim::IntraNovSim);
    assert!(obs_idx < sim_idx);
    assert_eq!(obs.label, "Intragenic novel (observed)");
}
