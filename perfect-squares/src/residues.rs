//! Quadratic residues ("perfect squares") modulo a prime.
//!
//! Two historical ways of collecting the residues are kept side by side as
//! [`ResidueVariant`]s. They differ in whether `0` (the square of `0`) is
//! counted, which shifts every downstream count by one.

use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

use num_integer::Roots;
use serde::{Deserialize, Serialize};

use crate::primes::is_prime;

/// How the residue set of a prime is collected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ResidueVariant {
    /// Squares of `1..p`, keeping only nonzero values. This is the
    /// validated default and what the plots are drawn from.
    #[default]
    ExcludeZero,
    /// Squares of `0..p`. Whether the residue `0` is reported is explicit,
    /// since the two sources that used this form disagree on it.
    Full { include_zero: bool },
}

impl ResidueVariant {
    /// Whether `0` can appear in a residue set produced by this variant.
    pub fn includes_zero(self) -> bool {
        matches!(self, ResidueVariant::Full { include_zero: true })
    }
}

impl fmt::Display for ResidueVariant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ResidueVariant::ExcludeZero => write!(f, "exclude-zero"),
            ResidueVariant::Full { include_zero: true } => write!(f, "full"),
            ResidueVariant::Full { include_zero: false } => write!(f, "full-nonzero"),
        }
    }
}

impl FromStr for ResidueVariant {
    type Err = ResidueError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "exclude-zero" => Ok(ResidueVariant::ExcludeZero),
            "full" => Ok(ResidueVariant::Full { include_zero: true }),
            "full-nonzero" => Ok(ResidueVariant::Full { include_zero: false }),
            other => Err(ResidueError::UnknownVariant(other.to_string())),
        }
    }
}

/// Errors from the checked residue entry points.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ResidueError {
    #[error("{0} is not prime")]
    NotPrime(u64),

    #[error("unknown residue variant '{0}' (expected exclude-zero, full or full-nonzero)")]
    UnknownVariant(String),
}

/// Set of distinct `i^2 mod p` values collected according to `variant`.
///
/// `p` must be prime; this is not checked here (see [`checked_residue_set`]).
/// Squares are formed in `u128` so any `u64` modulus is safe.
pub fn residue_set(p: u64, variant: ResidueVariant) -> BTreeSet<u64> {
    match variant {
        ResidueVariant::ExcludeZero => (1..p)
            .map(|i| square_mod(i, p))
            .filter(|&r| r != 0)
            .collect(),
        ResidueVariant::Full { include_zero } => {
            let mut residues = full_residues(p);
            if !include_zero {
                residues.remove(&0);
            }
            residues
        }
    }
}

/// Like [`residue_set`], but rejects a non-prime modulus.
pub fn checked_residue_set(p: u64, variant: ResidueVariant) -> Result<BTreeSet<u64>, ResidueError> {
    if !is_prime(p) {
        return Err(ResidueError::NotPrime(p));
    }
    Ok(residue_set(p, variant))
}

/// Closed-form size of the residue set of prime `p`.
///
/// For odd `p`, `i` and `p - i` share a square, so the nonzero squares
/// number `(p - 1) / 2`. For `p = 2` the only nonzero square is `1`.
pub fn expected_count(p: u64, variant: ResidueVariant) -> u64 {
    let nonzero = if p == 2 { 1 } else { p.saturating_sub(1) / 2 };
    if variant.includes_zero() {
        nonzero + 1
    } else {
        nonzero
    }
}

fn square_mod(i: u64, p: u64) -> u64 {
    ((i as u128 * i as u128) % p as u128) as u64
}

/// Squares of every `i` in `0..p`.
///
/// Below `isqrt(p)` the square is already smaller than `p`, so it is used
/// unreduced once `square < p` has been confirmed.
fn full_residues(p: u64) -> BTreeSet<u64> {
    let root = p.sqrt();
    let mut residues = BTreeSet::new();

    for i in 0..root {
        let square = i * i;
        residues.insert(if square < p { square } else { square % p });
    }
    for i in root..p {
        residues.insert(square_mod(i, p));
    }

    residues
}
