//! Per-prime residue statistics.
//!
//! One ascending pass over the primes up to a bound produces four aligned
//! mappings, all keyed by prime:
//!
//! - the residue set of each prime,
//! - its size,
//! - the change in size from the previous prime,
//! - that change divided by the prime gap.
//!
//! The two difference mappings skip the first prime, which has no
//! predecessor.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::primes::primes_up_to;
use crate::residues::{residue_set, ResidueVariant};

/// Gate deciding which primes receive a difference entry.
///
/// Over the primes both comparisons admit exactly `3, 5, 7, ...`; they are
/// kept separate so either historical form can be selected by name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum DiffThreshold {
    /// `p > 2`
    #[default]
    AboveTwo,
    /// `p >= 3`
    AtLeastThree,
}

impl DiffThreshold {
    pub fn admits(self, p: u64) -> bool {
        match self {
            DiffThreshold::AboveTwo => p > 2,
            DiffThreshold::AtLeastThree => p >= 3,
        }
    }
}

impl fmt::Display for DiffThreshold {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DiffThreshold::AboveTwo => write!(f, "above-two"),
            DiffThreshold::AtLeastThree => write!(f, "at-least-three"),
        }
    }
}

impl FromStr for DiffThreshold {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "above-two" => Ok(DiffThreshold::AboveTwo),
            "at-least-three" => Ok(DiffThreshold::AtLeastThree),
            other => Err(format!(
                "unknown diff threshold '{}' (expected above-two or at-least-three)",
                other
            )),
        }
    }
}

/// Settings that change the computed mappings.
///
/// Cached artifacts record these so a cache written under one setting is
/// never served for another.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct AggregatorConfig {
    pub variant: ResidueVariant,
    pub threshold: DiffThreshold,
}

/// The four aligned mappings for one bound.
#[derive(Debug, Clone, PartialEq)]
pub struct PerfectSquareInfo {
    pub bound: u64,
    pub config: AggregatorConfig,
    /// Residue set of each prime.
    pub residue_sets: BTreeMap<u64, BTreeSet<u64>>,
    /// Size of each residue set.
    pub counts: BTreeMap<u64, u64>,
    /// `count(p) - count(previous prime)`.
    pub diffs: BTreeMap<u64, i64>,
    /// `diff(p) / (p - previous prime)`.
    pub normalized_diffs: BTreeMap<u64, f64>,
}

impl PerfectSquareInfo {
    /// Enumerated primes in ascending order.
    pub fn primes(&self) -> impl Iterator<Item = u64> + '_ {
        self.counts.keys().copied()
    }

    pub fn is_empty(&self) -> bool {
        self.counts.is_empty()
    }

    /// `(prime, count)` points in ascending prime order.
    pub fn count_points(&self) -> Vec<(f64, f64)> {
        self.counts
            .iter()
            .map(|(&p, &c)| (p as f64, c as f64))
            .collect()
    }

    /// `(prime, diff)` points in ascending prime order.
    pub fn diff_points(&self) -> Vec<(f64, f64)> {
        self.diffs
            .iter()
            .map(|(&p, &d)| (p as f64, d as f64))
            .collect()
    }

    /// `(prime, normalized diff)` points in ascending prime order.
    pub fn normalized_diff_points(&self) -> Vec<(f64, f64)> {
        self.normalized_diffs
            .iter()
            .map(|(&p, &d)| (p as f64, d))
            .collect()
    }

    /// Check that the four mappings describe the same primes.
    ///
    /// Residue sets and counts must share a domain and agree on sizes; the
    /// difference mappings must share a domain contained in it.
    pub fn is_aligned(&self) -> bool {
        self.residue_sets.len() == self.counts.len()
            && self
                .residue_sets
                .iter()
                .zip(&self.counts)
                .all(|((p, set), (q, &c))| p == q && set.len() as u64 == c)
            && self.diffs.len() == self.normalized_diffs.len()
            && self
                .diffs
                .keys()
                .zip(self.normalized_diffs.keys())
                .all(|(p, q)| p == q && self.counts.contains_key(p))
    }
}

/// Compute all four mappings for the primes up to `bound`.
///
/// A bound below 2 yields empty mappings.
pub fn perfect_square_info(bound: u64, config: &AggregatorConfig) -> PerfectSquareInfo {
    let mut residue_sets = BTreeMap::new();
    let mut counts = BTreeMap::new();
    let mut diffs = BTreeMap::new();
    let mut normalized_diffs = BTreeMap::new();

    // 0 is never prime, so it marks "no previous prime yet".
    let mut last_prime = 0u64;
    let mut last_count = 0u64;

    for p in primes_up_to(bound) {
        let residues = residue_set(p, config.variant);
        let count = residues.len() as u64;
        residue_sets.insert(p, residues);
        counts.insert(p, count);

        if config.threshold.admits(p) && last_prime != 0 {
            debug_assert!(p > last_prime, "primes must be strictly ascending");
            let diff = count as i64 - last_count as i64;
            let gap = p - last_prime;
            diffs.insert(p, diff);
            normalized_diffs.insert(p, diff as f64 / gap as f64);
        }

        last_prime = p;
        last_count = count;
    }

    log::debug!(
        "Computed residue statistics for {} primes up to {} ({}, {})",
        counts.len(),
        bound,
        config.variant,
        config.threshold
    );

    PerfectSquareInfo {
        bound,
        config: *config,
        residue_sets,
        counts,
        diffs,
        normalized_diffs,
    }
}
