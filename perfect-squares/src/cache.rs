//! On-disk cache of computed statistics, one JSON artifact per mapping.
//!
//! # Layout
//!
//! For a bound `N`, four files live directly under the storage root:
//!
//! - `perfect_squares_{N}.json` (residue sets, the primary artifact)
//! - `perfect_square_counts_{N}.json`
//! - `perfect_square_counts_diffs_{N}.json`
//! - `perfect_square_counts_diffs_normalized_{N}.json`
//!
//! The primary artifact alone decides hit versus miss. It is written last,
//! so a save interrupted part way reads back as a miss.
//!
//! # Schema versioning
//!
//! Every artifact carries `schema_version`, the bound, the mapping kind and
//! the [`AggregatorConfig`] that produced it. Bump [`SCHEMA_VERSION`] when
//! the entry encoding changes. An artifact that fails any of these checks is
//! treated by [`ResultCache::ensure`] as a full miss.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::path::PathBuf;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::stats::{perfect_square_info, AggregatorConfig, PerfectSquareInfo};

/// Current artifact schema version.
pub const SCHEMA_VERSION: &str = "perfect-squares-v1";

/// Crate version from Cargo.toml, embedded at compile time.
pub const CRATE_VERSION: &str = env!("CARGO_PKG_VERSION");

// ---------------------------------------------------------------------------
// Artifact kinds and file format
// ---------------------------------------------------------------------------

/// Which of the four mappings an artifact holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum MappingKind {
    ResidueSets,
    Counts,
    Diffs,
    NormalizedDiffs,
}

impl MappingKind {
    pub const ALL: [MappingKind; 4] = [
        MappingKind::ResidueSets,
        MappingKind::Counts,
        MappingKind::Diffs,
        MappingKind::NormalizedDiffs,
    ];

    /// File name stem, before the `_{bound}.json` suffix.
    pub fn file_stem(self) -> &'static str {
        match self {
            MappingKind::ResidueSets => "perfect_squares",
            MappingKind::Counts => "perfect_square_counts",
            MappingKind::Diffs => "perfect_square_counts_diffs",
            MappingKind::NormalizedDiffs => "perfect_square_counts_diffs_normalized",
        }
    }
}

impl fmt::Display for MappingKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MappingKind::ResidueSets => write!(f, "residue-sets"),
            MappingKind::Counts => write!(f, "counts"),
            MappingKind::Diffs => write!(f, "diffs"),
            MappingKind::NormalizedDiffs => write!(f, "normalized-diffs"),
        }
    }
}

/// One persisted mapping.
///
/// Entries are `[prime, value]` pairs in ascending prime order, so the
/// file reads the same way the mapping iterates.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ArtifactFile<V> {
    pub schema_version: String,
    pub crate_version: String,
    pub bound: u64,
    pub kind: MappingKind,
    pub config: AggregatorConfig,
    pub entries: Vec<(u64, V)>,
}

/// Outcome of [`ResultCache::ensure`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheStatus {
    /// All four artifacts were present and valid.
    Loaded,
    /// No primary artifact; computed and saved.
    Computed,
    /// Artifacts existed but at least one was unusable; recomputed and
    /// overwritten.
    Recomputed,
}

/// Errors from cache reads and writes.
#[derive(Debug, thiserror::Error)]
pub enum CacheError {
    #[error("artifact {} is missing", path.display())]
    Missing { path: PathBuf },

    #[error("failed to parse {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("failed to serialize {kind} for bound {bound}: {source}")]
    Serialize {
        kind: MappingKind,
        bound: u64,
        #[source]
        source: serde_json::Error,
    },

    #[error("artifact {} does not match the request: {reason}", path.display())]
    Mismatch { path: PathBuf, reason: String },

    #[error("cached mappings for bound {0} are not aligned")]
    Misaligned(u64),

    #[error("I/O error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

// ---------------------------------------------------------------------------
// Cache
// ---------------------------------------------------------------------------

/// File-backed cache of [`PerfectSquareInfo`] keyed by bound.
#[derive(Debug, Clone)]
pub struct ResultCache {
    root: PathBuf,
    config: AggregatorConfig,
}

impl ResultCache {
    pub fn new(root: impl Into<PathBuf>, config: AggregatorConfig) -> Self {
        ResultCache {
            root: root.into(),
            config,
        }
    }

    pub fn config(&self) -> &AggregatorConfig {
        &self.config
    }

    /// Deterministic path of one artifact.
    pub fn artifact_path(&self, bound: u64, kind: MappingKind) -> PathBuf {
        self.root.join(format!("{}_{}.json", kind.file_stem(), bound))
    }

    /// Whether the primary artifact for `bound` exists.
    pub fn is_cached(&self, bound: u64) -> bool {
        self.artifact_path(bound, MappingKind::ResidueSets).exists()
    }

    /// Load cached statistics for `bound`, or compute and persist them.
    ///
    /// Any problem with an existing artifact (missing secondary file, bad
    /// JSON, other schema or settings) is logged and handled like a miss:
    /// everything is recomputed and all four files are overwritten. Write
    /// failures are returned.
    pub fn ensure(&self, bound: u64) -> Result<(PerfectSquareInfo, CacheStatus), CacheError> {
        let status = if self.is_cached(bound) {
            match self.load(bound) {
                Ok(info) => {
                    log::info!(
                        "Loaded statistics for {} primes up to {} from {}",
                        info.counts.len(),
                        bound,
                        self.root.display()
                    );
                    return Ok((info, CacheStatus::Loaded));
                }
                Err(e) => {
                    log::warn!("Cache for bound {} unusable ({}), recomputing", bound, e);
                    CacheStatus::Recomputed
                }
            }
        } else {
            CacheStatus::Computed
        };

        log::info!("Computing statistics for primes up to {}", bound);
        let info = perfect_square_info(bound, &self.config);
        self.save(&info)?;
        Ok((info, status))
    }

    /// Persist all four mappings of `info`, primary artifact last.
    pub fn save(&self, info: &PerfectSquareInfo) -> Result<(), CacheError> {
        std::fs::create_dir_all(&self.root).map_err(|source| CacheError::Io {
            path: self.root.clone(),
            source,
        })?;

        self.write_artifact(info, MappingKind::Counts, &info.counts)?;
        self.write_artifact(info, MappingKind::Diffs, &info.diffs)?;
        self.write_artifact(info, MappingKind::NormalizedDiffs, &info.normalized_diffs)?;
        self.write_artifact(info, MappingKind::ResidueSets, &info.residue_sets)?;

        log::info!(
            "Saved statistics for {} primes up to {} to {}",
            info.counts.len(),
            info.bound,
            self.root.display()
        );
        Ok(())
    }

    /// Read and validate all four artifacts for `bound`.
    pub fn load(&self, bound: u64) -> Result<PerfectSquareInfo, CacheError> {
        let residue_sets: BTreeMap<u64, BTreeSet<u64>> =
            self.read_artifact(bound, MappingKind::ResidueSets)?;
        let counts: BTreeMap<u64, u64> = self.read_artifact(bound, MappingKind::Counts)?;
        let diffs: BTreeMap<u64, i64> = self.read_artifact(bound, MappingKind::Diffs)?;
        let normalized_diffs: BTreeMap<u64, f64> =
            self.read_artifact(bound, MappingKind::NormalizedDiffs)?;

        let info = PerfectSquareInfo {
            bound,
            config: self.config,
            residue_sets,
            counts,
            diffs,
            normalized_diffs,
        };
        if !info.is_aligned() {
            return Err(CacheError::Misaligned(bound));
        }
        Ok(info)
    }

    /// Remove every artifact for `bound`. Absent files are skipped.
    pub fn clear(&self, bound: u64) -> Result<(), CacheError> {
        for kind in MappingKind::ALL {
            let path = self.artifact_path(bound, kind);
            match std::fs::remove_file(&path) {
                Ok(()) => log::debug!("Removed {}", path.display()),
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
                Err(source) => return Err(CacheError::Io { path, source }),
            }
        }
        Ok(())
    }

    fn write_artifact<V: Serialize + Clone>(
        &self,
        info: &PerfectSquareInfo,
        kind: MappingKind,
        mapping: &BTreeMap<u64, V>,
    ) -> Result<(), CacheError> {
        let file = ArtifactFile {
            schema_version: SCHEMA_VERSION.to_string(),
            crate_version: CRATE_VERSION.to_string(),
            bound: info.bound,
            kind,
            config: info.config,
            entries: mapping.iter().map(|(&p, v)| (p, v.clone())).collect(),
        };

        let json = serde_json::to_string(&file).map_err(|source| CacheError::Serialize {
            kind,
            bound: info.bound,
            source,
        })?;
        let path = self.artifact_path(info.bound, kind);
        std::fs::write(&path, json).map_err(|source| CacheError::Io {
            path: path.clone(),
            source,
        })?;
        log::debug!("Wrote {} ({} entries)", path.display(), mapping.len());
        Ok(())
    }

    fn read_artifact<V: DeserializeOwned>(
        &self,
        bound: u64,
        kind: MappingKind,
    ) -> Result<BTreeMap<u64, V>, CacheError> {
        let path = self.artifact_path(bound, kind);
        let contents = match std::fs::read_to_string(&path) {
            Ok(contents) => contents,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(CacheError::Missing { path });
            }
            Err(source) => return Err(CacheError::Io { path, source }),
        };

        let file: ArtifactFile<V> =
            serde_json::from_str(&contents).map_err(|source| CacheError::Parse {
                path: path.clone(),
                source,
            })?;

        let mismatch = if file.schema_version != SCHEMA_VERSION {
            Some(format!(
                "schema {} (expected {})",
                file.schema_version, SCHEMA_VERSION
            ))
        } else if file.bound != bound {
            Some(format!("bound {} (expected {})", file.bound, bound))
        } else if file.kind != kind {
            Some(format!("kind {} (expected {})", file.kind, kind))
        } else if file.config != self.config {
            Some(format!(
                "written with {}/{} (expected {}/{})",
                file.config.variant,
                file.config.threshold,
                self.config.variant,
                self.config.threshold
            ))
        } else if !file.entries.windows(2).all(|w| w[0].0 < w[1].0) {
            Some("entries are not in ascending prime order".to_string())
        } else {
            None
        };
        if let Some(reason) = mismatch {
            return Err(CacheError::Mismatch { path, reason });
        }

        Ok(file.entries.into_iter().collect())
    }
}
