use std::collections::HashMap;

use rand::Rng;
use rand::seq::IndexedRandom;

use crate::input::bed::RegionSet;
use crate::model::{Feature, Interval, SimScore};
use crate::simulate::track::ScoreTrack;

pub const MAX_ATTEMPTS: u32 = 100;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct HostKey {
    pub gene: String,
    pub transcript: String,
    pub chrom: String,
}

/// Allowed sampling spans per host gene and transcript.
#[derive(Debug, Clone, Default)]
pub struct HostRegions {
    spans: HashMap<HostKey, Vec<(u64, u64)>>,
}

impl HostRegions {
    /// Groups regions named `GENE_TRANSCRIPT[_...]`; other names are ignored.
    pub fn from_region_set(regions: &RegionSet) -> Self {
        let mut spans: HashMap<HostKey, Vec<(u64, u64)>> = HashMap::new();
        for region in regions.iter() {
            let Some(name) = region.name.as_deref() else {
                continue;
            };
            let mut parts = name.split('_');
            let (Some(gene), Some(transcript)) = (parts.next(), parts.next()) else {
                continue;
            };
            spans
                .entry(HostKey {
                    gene: gene.to_string(),
                    transcript: transcript.to_string(),
                    chrom: region.interval.chrom.clone(),
                })
                .or_default()
                .push((region.interval.start, region.interval.end));
        }
        for list in spans.values_mut() {
            list.sort_unstable();
        }
        Self { spans }
    }

    pub fn len(&self) -> usize {
        self.spans.len()
    }

    pub fn get(&self, key: &HostKey) -> Option<&[(u64, u64)]> {
        self.spans.get(key).map(Vec::as_slice)
    }
}

/// Host key from an intragenic feature name `feat_GENE_TRANSCRIPT[_...]`.
pub fn host_key_for(feature: &Feature) -> Option<HostKey> {
    let parts: Vec<&str> = feature.name.split('_').collect();
    if parts.len() < 3 {
        return None;
    }
    Some(HostKey {
        gene: parts[1].to_string(),
        transcript: parts[2].to_string(),
        chrom: feature.chrom().to_string(),
    })
}

/// A feature-sized interval inside one of `allowed`, disjoint from the feature.
pub fn random_region<R: Rng + ?Sized>(
    feature: &Feature,
    allowed: &[(u64, u64)],
    rng: &mut R,
) -> Option<Interval> {
    let size = feature.size();
    for _ in 0..MAX_ATTEMPTS {
        let &(region_start, region_end) = allowed.choose(rng)?;
        if region_end <= region_start {
            continue;
        }
        let random_start = rng.random_range(region_start..region_end);
        let random_end = random_start + size;
        let candidate = Interval::new(feature.chrom(), random_start, random_end);
        if random_end < region_end && !candidate.overlaps(&feature.interval) {
            return Some(candidate);
        }
    }
    None
}

pub fn random_intragenic_simulation<R: Rng + ?Sized>(
    feature: &Feature,
    hosts: &HostRegions,
    track: &ScoreTrack,
    rng: &mut R,
) -> SimScore {
    let Some(key) = host_key_for(feature) else {
        return SimScore::UnparsableName;
    };
    let Some(allowed) = hosts.get(&key) else {
        return SimScore::UnknownHost;
    };
    sample_until_scored(track, || random_region(feature, allowed, rng))
}

/// A feature-sized interval in the upstream or downstream window that stays
/// clear of the feature; a window hitting `not_allowed` shrinks to the gap
/// between the feature and the nearest blocking region.
pub fn random_flanking_region<R: Rng + ?Sized>(
    feature: &Feature,
    not_allowed: &RegionSet,
    window_down: u64,
    window_up: u64,
    rng: &mut R,
) -> Option<Interval> {
    let start = feature.start() as i64;
    let end = feature.end() as i64;
    let size = feature.size() as i64;

    let right = ordered(end + 1, end + window_down as i64);
    let left = if window_up as i64 >= start {
        ordered(start - 1, 0)
    } else {
        ordered(start - 1, start - window_up as i64)
    };

    for _ in 0..MAX_ATTEMPTS {
        let (flank_lo, flank_hi) = if rng.random_bool(0.5) { right } else { left };
        let (range_lo, range_hi) = match Interval::checked(feature.chrom(), flank_lo, flank_hi) {
            Some(flank) => {
                let blocking = not_allowed.overlapping(&flank);
                if blocking.is_empty() {
                    (flank_lo, flank_hi)
                } else if flank_hi < start {
                    let nearest = blocking
                        .iter()
                        .map(|r| r.interval.end as i64)
                        .max()
                        .unwrap_or(start);
                    (nearest, start)
                } else if flank_hi > end {
                    let nearest = blocking
                        .iter()
                        .map(|r| r.interval.start as i64)
                        .min()
                        .unwrap_or(end);
                    (end, nearest)
                } else {
                    continue;
                }
            }
            None => continue,
        };
        if range_hi <= range_lo || range_lo < 0 {
            continue;
        }
        let random_start = rng.random_range(range_lo..range_hi);
        let random_end = random_start + size;
        let candidate = Interval::new(feature.chrom(), random_start as u64, random_end as u64);
        if random_end < flank_hi
            && !candidate.overlaps(&feature.interval)
            && !not_allowed.any_overlap(&candidate)
        {
            return Some(candidate);
        }
    }
    None
}

pub fn random_flanking_simulation<R: Rng + ?Sized>(
    feature: &Feature,
    not_allowed: &RegionSet,
    track: &ScoreTrack,
    window_down: u64,
    window_up: u64,
    rng: &mut R,
) -> SimScore {
    sample_until_scored(track, || {
        random_flanking_region(feature, not_allowed, window_down, window_up, rng)
    })
}

/// Draws regions until one carries scores, giving up after `MAX_ATTEMPTS`.
fn sample_until_scored<F>(track: &ScoreTrack, mut draw: F) -> SimScore
where
    F: FnMut() -> Option<Interval>,
{
    for _ in 0..MAX_ATTEMPTS {
        let Some(region) = draw() else {
            continue;
        };
        let hits = track.extract(&region);
        if !hits.is_empty() {
            return SimScore::from_scores(&hits);
        }
    }
    SimScore::Missing
}

fn ordered(a: i64, b: i64) -> (i64, i64) {
    if a <= b { (a, b) } else { (b, a) }
}

#[cfg(test)]
#[path = "../../tests/src_inline/simulate/random.rs"]
mod tests;
