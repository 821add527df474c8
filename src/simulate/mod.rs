use std::collections::{BTreeMap, HashMap};
use std::io::Write;
use std::path::PathBuf;

use rand::SeedableRng;
use rand::rngs::StdRng;

use crate::input::InputError;
use crate::input::bed::{RegionSet, load_region_set, read_features};
use crate::input::score_dir::discover_score_files;
use crate::model::{Feature, SimScore};

pub mod flanking;
pub mod random;
pub mod track;

use random::HostRegions;
use track::ScoreTrack;

pub const DEFAULT_WINDOW: u64 = 10_000;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SimulationMode {
    Flanking,
    RandomIntragenic,
    RandomFlanking,
}

impl SimulationMode {
    /// Flag understood by `simulate` and by the external scoring script.
    pub fn flag(self) -> &'static str {
        match self {
            SimulationMode::Flanking => "--flanking",
            SimulationMode::RandomIntragenic => "--random",
            SimulationMode::RandomFlanking => "--random_flank",
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            SimulationMode::Flanking => "flanking",
            SimulationMode::RandomIntragenic => "random-intragenic",
            SimulationMode::RandomFlanking => "random-flanking",
        }
    }
}

#[derive(Debug, Clone)]
pub struct SimulationConfig {
    pub features: PathBuf,
    pub regions: PathBuf,
    pub score_dir: PathBuf,
    pub mode: SimulationMode,
    pub iterations: u32,
    pub window_down: u64,
    pub window_up: u64,
    pub seed: Option<u64>,
}

#[derive(Debug, thiserror::Error)]
pub enum SimulationError {
    #[error(transparent)]
    Input(#[from] InputError),
    #[error("failed to write simulation output: {0}")]
    Output(#[source] std::io::Error),
    #[error("invalid simulation options: {0}")]
    InvalidOptions(String),
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SimulationSummary {
    pub features: usize,
    pub written: usize,
    pub missing_track: usize,
}

impl SimulationConfig {
    pub fn validate(&self) -> Result<(), SimulationError> {
        if self.iterations == 0 {
            return Err(SimulationError::InvalidOptions(
                "-n must be at least 1".to_string(),
            ));
        }
        if self.mode == SimulationMode::Flanking && self.iterations != 1 {
            return Err(SimulationError::InvalidOptions(
                "-n is only accepted with --random or --random_flank".to_string(),
            ));
        }
        if self.mode != SimulationMode::RandomFlanking
            && (self.window_down != DEFAULT_WINDOW || self.window_up != DEFAULT_WINDOW)
        {
            return Err(SimulationError::InvalidOptions(
                "window sizes are only accepted with --random_flank".to_string(),
            ));
        }
        Ok(())
    }
}

/// Scores every feature and writes one tab-separated line per feature.
pub fn run_simulation<W: Write>(
    config: &SimulationConfig,
    out: &mut W,
) -> Result<SimulationSummary, SimulationError> {
    config.validate()?;

    let features = read_features(&config.features)?;
    let score_files = discover_score_files(&config.score_dir)?;
    let regions = load_region_set(&config.regions)?;
    if regions.is_empty() {
        crate::warn!("{} holds no regions", config.regions.display());
    }
    let hosts = match config.mode {
        SimulationMode::RandomIntragenic => {
            let hosts = HostRegions::from_region_set(&regions);
            crate::debug!("{} host transcripts in background", hosts.len());
            hosts
        }
        _ => HostRegions::default(),
    };
    let mut rng = match config.seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_os_rng(),
    };

    crate::debug!(
        "simulating {} features ({} mode, {} iterations, {} background regions)",
        features.len(),
        config.mode.name(),
        config.iterations,
        regions.len()
    );

    let mut tracks = TrackCache::new(score_files);
    let mut summary = SimulationSummary {
        features: features.len(),
        ..SimulationSummary::default()
    };

    for feature in &features {
        let Some(track) = tracks.get(feature.chrom())? else {
            crate::warn!(
                "could not find a score file for {} (feature {}); skipping",
                feature.chrom(),
                feature.name
            );
            summary.missing_track += 1;
            continue;
        };
        let scores = simulate_feature(config, feature, &regions, &hosts, track, &mut rng);
        writeln!(out, "{}", format_line(&feature.name, &scores)).map_err(SimulationError::Output)?;
        summary.written += 1;
    }

    out.flush().map_err(SimulationError::Output)?;
    Ok(summary)
}

pub fn simulate_feature(
    config: &SimulationConfig,
    feature: &Feature,
    regions: &RegionSet,
    hosts: &HostRegions,
    track: &ScoreTrack,
    rng: &mut StdRng,
) -> Vec<SimScore> {
    match config.mode {
        SimulationMode::Flanking => vec![flanking::flanking_simulation(feature, regions, track)],
        SimulationMode::RandomIntragenic => (0..config.iterations)
            .map(|_| random::random_intragenic_simulation(feature, hosts, track, rng))
            .collect(),
        SimulationMode::RandomFlanking => (0..config.iterations)
            .map(|_| {
                random::random_flanking_simulation(
                    feature,
                    regions,
                    track,
                    config.window_down,
                    config.window_up,
                    rng,
                )
            })
            .collect(),
    }
}

pub fn format_line(name: &str, scores: &[SimScore]) -> String {
    let mut line = name.to_string();
    for score in scores {
        line.push('\t');
        line.push_str(&score.to_string());
    }
    line
}

/// Opens each chromosome's track on first use.
struct TrackCache {
    files: BTreeMap<String, PathBuf>,
    open: HashMap<String, ScoreTrack>,
}

impl TrackCache {
    fn new(files: BTreeMap<String, PathBuf>) -> Self {
        Self {
            files,
            open: HashMap::new(),
        }
    }

    fn get(&mut self, chrom: &str) -> Result<Option<&ScoreTrack>, InputError> {
        if !self.open.contains_key(chrom) {
            let Some(path) = self.files.get(chrom) else {
                return Ok(None);
            };
            let track = ScoreTrack::open(path)?;
            crate::debug!("opened score track {}", track.path().display());
            self.open.insert(chrom.to_string(), track);
        }
        Ok(self.open.get(chrom))
    }
}

#[cfg(test)]
#[path = "../../tests/src_inline/simulate/tests.rs"]
mod tests;
