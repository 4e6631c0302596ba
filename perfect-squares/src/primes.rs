//! Prime enumeration by trial division.
//!
//! The bounds this tool targets are a few thousand at most, so a sieve buys
//! nothing observable. Every prime `p` with `2 <= p <= bound` is produced in
//! strictly ascending order.

use num_integer::Roots;

/// Trial-division primality test over `[2, isqrt(n)]`.
///
/// `0` and `1` are not prime. `2` and `3` pass vacuously because their
/// division range is empty.
pub fn is_prime(n: u64) -> bool {
    if n < 2 {
        return false;
    }
    let limit = n.sqrt();
    (2..=limit).all(|d| n % d != 0)
}

/// Lazy, restartable iterator over the primes up to an inclusive bound.
///
/// Cloning a `Primes` yields an independent iterator positioned at the same
/// candidate, so a fresh pass is always `primes_up_to(bound)` or a clone
/// taken before iteration started.
#[derive(Debug, Clone)]
pub struct Primes {
    next_candidate: u64,
    bound: u64,
}

impl Iterator for Primes {
    type Item = u64;

    fn next(&mut self) -> Option<u64> {
        while self.next_candidate <= self.bound {
            let candidate = self.next_candidate;
            match candidate.checked_add(1) {
                Some(next) => self.next_candidate = next,
                // u64::MAX was the last candidate; close the range.
                None => self.bound = 0,
            }
            if is_prime(candidate) {
                return Some(candidate);
            }
        }
        None
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = self.bound.saturating_sub(self.next_candidate) + 1;
        (0, usize::try_from(remaining).ok())
    }
}

impl std::iter::FusedIterator for Primes {}

/// Primes `p` with `2 <= p <= bound`. Empty when `bound < 2`.
pub fn primes_up_to(bound: u64) -> Primes {
    Primes {
        next_candidate: 2,
        bound,
    }
}

/// Materialized form of [`primes_up_to`].
pub fn collect_primes(bound: u64) -> Vec<u64> {
    primes_up_to(bound).collect()
}
