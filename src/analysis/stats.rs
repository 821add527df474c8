//! Two-sample Wilcoxon rank-sum (Mann-Whitney) test.
//!
//! `W` is the rank sum of the first sample minus its minimum possible value,
//! so swapping the samples turns `W` into `n1 * n2 - W` and leaves the
//! two-sided p-value unchanged.

use serde::Serialize;
use statrs::distribution::{ContinuousCDF, Normal};

/// Both samples must be below this size for the exact null distribution.
pub const EXACT_LIMIT: usize = 50;

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum RankSumError {
    #[error("subgroup '{0}' has no values")]
    EmptyGroup(&'static str),
    #[error("subgroup '{0}' contains a non-finite value")]
    NonFinite(&'static str),
    #[error("normal distribution unavailable: {0}")]
    Distribution(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RankSumMethod {
    Exact,
    Normal,
}

impl RankSumMethod {
    pub fn as_str(self) -> &'static str {
        match self {
            RankSumMethod::Exact => "exact",
            RankSumMethod::Normal => "normal",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct RankSumResult {
    pub statistic: f64,
    pub p_value: f64,
    pub method: RankSumMethod,
    pub n1: usize,
    pub n2: usize,
}

pub fn rank_sum_test(a: &[f64], b: &[f64]) -> Result<RankSumResult, RankSumError> {
    if a.is_empty() {
        return Err(RankSumError::EmptyGroup("a"));
    }
    if b.is_empty() {
        return Err(RankSumError::EmptyGroup("b"));
    }
    if a.iter().any(|v| !v.is_finite()) {
        return Err(RankSumError::NonFinite("a"));
    }
    if b.iter().any(|v| !v.is_finite()) {
        return Err(RankSumError::NonFinite("b"));
    }

    let n1 = a.len();
    let n2 = b.len();
    let ranked = mid_ranks(a, b);
    let r1: f64 = ranked.ranks[..n1].iter().sum();
    let statistic = r1 - (n1 * (n1 + 1)) as f64 / 2.0;

    let (p_value, method) = if n1 < EXACT_LIMIT && n2 < EXACT_LIMIT && !ranked.has_ties {
        (exact_p_value(statistic, n1, n2), RankSumMethod::Exact)
    } else {
        (
            normal_p_value(statistic, n1, n2, ranked.tie_term)?,
            RankSumMethod::Normal,
        )
    };

    Ok(RankSumResult {
        statistic,
        p_value,
        method,
        n1,
        n2,
    })
}

struct Ranked {
    /// Ranks in input order: `a` first, then `b`.
    ranks: Vec<f64>,
    /// Sum of `t^3 - t` over tie groups.
    tie_term: f64,
    has_ties: bool,
}

fn mid_ranks(a: &[f64], b: &[f64]) -> Ranked {
    let values: Vec<f64> = a.iter().chain(b.iter()).copied().collect();
    let mut order: Vec<usize> = (0..values.len()).collect();
    order.sort_by(|&i, &j| values[i].total_cmp(&values[j]));

    let mut ranks = vec![0.0; values.len()];
    let mut tie_term = 0.0;
    let mut start = 0;
    while start < order.len() {
        let mut end = start + 1;
        while end < order.len() && values[order[end]] == values[order[start]] {
            end += 1;
        }
        // Positions start..end share the average of ranks start+1..=end.
        let rank = (start + 1 + end) as f64 / 2.0;
        for &idx in &order[start..end] {
            ranks[idx] = rank;
        }
        let t = (end - start) as f64;
        tie_term += t * t * t - t;
        start = end;
    }

    Ranked {
        ranks,
        tie_term,
        has_ties: tie_term > 0.0,
    }
}

/// `2 * P(U <= min(W, n1*n2 - W))` under the exact null, capped at 1.
fn exact_p_value(statistic: f64, n1: usize, n2: usize) -> f64 {
    let counts = u_distribution(n1, n2);
    let total: f64 = counts.iter().sum();
    let max_u = n1 * n2;
    let q = statistic.min(max_u as f64 - statistic).floor().max(0.0) as usize;
    let lower: f64 = counts[..=q.min(max_u)].iter().sum();
    (2.0 * lower / total).min(1.0)
}

/// Number of rank arrangements giving each `U` in `0..=n1*n2`.
///
/// Counts subsets of size `k = min(n1, n2)` of `1..=n1+n2` by rank sum; the
/// distribution of `U` does not depend on which sample is the smaller one.
fn u_distribution(n1: usize, n2: usize) -> Vec<f64> {
    let k = n1.min(n2);
    let n = n1 + n2;
    let max_sum = n * (n + 1) / 2;
    // dp[j][s]: subsets of size j with rank sum s.
    let mut dp = vec![vec![0.0f64; max_sum + 1]; k + 1];
    dp[0][0] = 1.0;
    for r in 1..=n {
        for j in (1..=k.min(r)).rev() {
            let (lower, upper) = dp.split_at_mut(j);
            let prev = &lower[j - 1];
            let cur = &mut upper[0];
            for s in (r..=max_sum).rev() {
                cur[s] += prev[s - r];
            }
        }
    }
    let min_sum = k * (k + 1) / 2;
    (0..=n1 * n2).map(|u| dp[k][u + min_sum]).collect()
}

fn normal_p_value(
    statistic: f64,
    n1: usize,
    n2: usize,
    tie_term: f64,
) -> Result<f64, RankSumError> {
    let (n1f, n2f) = (n1 as f64, n2 as f64);
    let n = n1f + n2f;
    let variance = n1f * n2f / 12.0 * ((n + 1.0) - tie_term / (n * (n - 1.0)));
    if !(variance > 0.0) {
        return Ok(1.0);
    }
    let sigma = variance.sqrt();
    let diff = (statistic - n1f * n2f / 2.0).abs();
    let correction = if diff > 0.0 { 0.5 } else { 0.0 };
    let z = (diff - correction) / sigma;

    let normal = Normal::new(0.0, 1.0).map_err(|e| RankSumError::Distribution(e.to_string()))?;
    Ok((2.0 * normal.cdf(-z)).min(1.0))
}

#[cfg(test)]
#[path = "../../tests/src_inline/analysis/stats.rs"]
mod tests;
