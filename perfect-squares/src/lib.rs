//! Perfect squares modulo primes.
//!
//! For every prime `p` up to a bound, collect the quadratic residues mod `p`,
//! track how their number changes from one prime to the next, and cache the
//! results on disk so repeated runs for the same bound skip the computation.
//!
//! Pipeline: [`primes`] → [`residues`] → [`stats`] → [`cache`], with
//! [`present`] consuming the finished mappings.

pub mod cache;
pub mod config;
pub mod present;
pub mod primes;
pub mod residues;
pub mod stats;

pub use cache::{CacheError, CacheStatus, MappingKind, ResultCache};
pub use config::{Config, ConfigError};
pub use primes::{collect_primes, is_prime, primes_up_to, Primes};
pub use residues::{
    checked_residue_set, expected_count, residue_set, ResidueError, ResidueVariant,
};
pub use stats::{perfect_square_info, AggregatorConfig, DiffThreshold, PerfectSquareInfo};
