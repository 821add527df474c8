use crate::input::bed::RegionSet;
use crate::model::{Feature, Interval, SimScore};
use crate::simulate::track::ScoreTrack;

/// Same-size intervals one base past each end of the feature: `(right, left)`.
/// A flank that would cross the chromosome start is `None`.
pub fn flanking_regions(feature: &Feature) -> (Option<Interval>, Option<Interval>) {
    let start = feature.start() as i64;
    let end = feature.end() as i64;
    let size = feature.size() as i64;
    let right = Interval::checked(feature.chrom(), end + 1, end + size + 1);
    let left = Interval::checked(feature.chrom(), start - 1 - size, start - 1);
    (right, left)
}

/// Mean score over the flanks that avoid `not_allowed`; both flanks averaged
/// when both are usable.
pub fn flanking_simulation(
    feature: &Feature,
    not_allowed: &RegionSet,
    track: &ScoreTrack,
) -> SimScore {
    let (right, left) = flanking_regions(feature);
    let blocked = |flank: &Option<Interval>| {
        flank
            .as_ref()
            .is_some_and(|interval| not_allowed.any_overlap(interval))
    };
    let score_of = |flank: &Option<Interval>| match flank {
        Some(interval) => SimScore::from_scores(&track.extract(interval)),
        None => SimScore::Missing,
    };

    match (blocked(&right), blocked(&left)) {
        (true, true) => SimScore::Missing,
        (true, false) => score_of(&left),
        (false, true) => score_of(&right),
        (false, false) => match (score_of(&left).value(), score_of(&right).value()) {
            (Some(l), Some(r)) => SimScore::Mean((l + r) / 2.0),
            (Some(v), None) | (None, Some(v)) => SimScore::Mean(v),
            (None, None) => SimScore::Missing,
        },
    }
}

#[cfg(test)]
#[path = "../../tests/src_inline/simulate/flanking.rs"]
mod tests;
