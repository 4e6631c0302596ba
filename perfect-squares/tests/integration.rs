//! End-to-end tests: enumeration → residues → statistics → cache → presentation.

use std::collections::BTreeSet;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use perfect_squares::present;
use perfect_squares::{
    collect_primes, is_prime, perfect_square_info, residue_set, AggregatorConfig, CacheStatus,
    DiffThreshold, MappingKind, ResidueVariant, ResultCache,
};

const FULL: ResidueVariant = ResidueVariant::Full { include_zero: true };

// ---------------------------------------------------------------------------
// Closed forms
// ---------------------------------------------------------------------------

#[test]
fn test_exclude_zero_count_closed_form_sampled() {
    let mut rng = StdRng::seed_from_u64(42);
    let mut checked = 0;
    while checked < 40 {
        let p: u64 = rng.gen_range(3..20_000);
        if !is_prime(p) {
            continue;
        }
        let count = residue_set(p, ResidueVariant::ExcludeZero).len() as u64;
        assert_eq!(count, (p - 1) / 2, "p = {}", p);
        checked += 1;
    }
    assert_eq!(residue_set(2, ResidueVariant::ExcludeZero).len(), 1);
}

#[test]
fn test_full_count_closed_form_sampled() {
    let mut rng = StdRng::seed_from_u64(7);
    let mut checked = 0;
    while checked < 40 {
        let p: u64 = rng.gen_range(3..20_000);
        if !is_prime(p) {
            continue;
        }
        assert_eq!(residue_set(p, FULL).len() as u64, (p + 1) / 2, "p = {}", p);
        checked += 1;
    }
    assert_eq!(residue_set(2, FULL), BTreeSet::from([0, 1]));
}

// ---------------------------------------------------------------------------
// Aggregation scenarios
// ---------------------------------------------------------------------------

#[test]
fn test_scenario_bound_ten() {
    let info = perfect_square_info(10, &AggregatorConfig::default());
    assert_eq!(collect_primes(10), vec![2, 3, 5, 7]);
    assert_eq!(info.residue_sets[&5], BTreeSet::from([1, 4]));
    assert_eq!(info.residue_sets[&7], BTreeSet::from([1, 2, 4]));
    assert_eq!(info.counts[&5], 2);
    assert_eq!(info.counts[&7], 3);
    assert_eq!(info.diffs[&7], 1);
    assert_eq!(info.normalized_diffs[&7], 0.5);
    assert_eq!(info.diffs.keys().copied().collect::<Vec<_>>(), vec![3, 5, 7]);
}

#[test]
fn test_scenario_bound_two() {
    let info = perfect_square_info(2, &AggregatorConfig::default());
    assert_eq!(info.counts.len(), 1);
    assert_eq!(info.counts[&2], 1);
    assert!(info.diffs.is_empty());
    assert!(info.normalized_diffs.is_empty());
}

#[test]
fn test_diff_definitions_for_random_bounds() {
    let mut rng = StdRng::seed_from_u64(1234);
    for _ in 0..5 {
        let bound = rng.gen_range(2..3000);
        let info = perfect_square_info(bound, &AggregatorConfig::default());
        let primes: Vec<u64> = info.primes().collect();
        assert_eq!(primes, collect_primes(bound));
        for pair in primes.windows(2) {
            let (prev, p) = (pair[0], pair[1]);
            assert_ne!(p, prev);
            let diff = info.counts[&p] as i64 - info.counts[&prev] as i64;
            assert_eq!(info.diffs[&p], diff);
            assert_eq!(info.normalized_diffs[&p], diff as f64 / (p - prev) as f64);
        }
    }
}

// ---------------------------------------------------------------------------
// Cache behaviour
// ---------------------------------------------------------------------------

#[test]
fn test_cache_roundtrip_matches_fresh_computation() {
    let tmpdir = tempfile::tempdir().unwrap();
    for variant in [ResidueVariant::ExcludeZero, FULL] {
        let config = AggregatorConfig {
            variant,
            threshold: DiffThreshold::AtLeastThree,
        };
        let cache = ResultCache::new(tmpdir.path().join(variant.to_string()), config);
        let fresh = perfect_square_info(1000, &config);

        cache.save(&fresh).unwrap();
        let loaded = cache.load(1000).unwrap();

        assert_eq!(loaded, fresh);
        assert!(loaded.diffs.keys().eq(fresh.diffs.keys()));
        assert!(loaded
            .normalized_diffs
            .iter()
            .zip(&fresh.normalized_diffs)
            .all(|((p, a), (q, b))| p == q && a.to_bits() == b.to_bits()));
    }
}

#[test]
fn test_ensure_is_idempotent() {
    let tmpdir = tempfile::tempdir().unwrap();
    let cache = ResultCache::new(tmpdir.path(), AggregatorConfig::default());

    let (first, first_status) = cache.ensure(300).unwrap();
    let (second, second_status) = cache.ensure(300).unwrap();

    assert_eq!(first_status, CacheStatus::Computed);
    assert_eq!(second_status, CacheStatus::Loaded);
    assert_eq!(first, second);
}

#[test]
fn test_cache_hit_does_not_recompute() {
    let tmpdir = tempfile::tempdir().unwrap();
    let cache = ResultCache::new(tmpdir.path(), AggregatorConfig::default());
    cache.ensure(100).unwrap();

    let primary = cache.artifact_path(100, MappingKind::ResidueSets);
    let before = std::fs::metadata(&primary).unwrap().modified().unwrap();
    let (_, status) = cache.ensure(100).unwrap();
    let after = std::fs::metadata(&primary).unwrap().modified().unwrap();

    assert_eq!(status, CacheStatus::Loaded);
    assert_eq!(before, after);
}

#[test]
fn test_partial_save_reads_as_miss() {
    let tmpdir = tempfile::tempdir().unwrap();
    let cache = ResultCache::new(tmpdir.path(), AggregatorConfig::default());
    cache.ensure(80).unwrap();

    // Primary written last: losing it looks like an interrupted save.
    std::fs::remove_file(cache.artifact_path(80, MappingKind::ResidueSets)).unwrap();
    assert!(!cache.is_cached(80));

    let (info, status) = cache.ensure(80).unwrap();
    assert_eq!(status, CacheStatus::Computed);
    assert_eq!(info, perfect_square_info(80, &AggregatorConfig::default()));
}

#[test]
fn test_bounds_are_cached_independently() {
    let tmpdir = tempfile::tempdir().unwrap();
    let cache = ResultCache::new(tmpdir.path(), AggregatorConfig::default());

    let (small, _) = cache.ensure(10).unwrap();
    let (large, _) = cache.ensure(100).unwrap();
    assert_eq!(small.counts.len(), 4);
    assert_eq!(large.counts.len(), 25);
    assert_eq!(cache.ensure(10).unwrap().0, small);
}

// ---------------------------------------------------------------------------
// Presentation
// ---------------------------------------------------------------------------

#[test]
fn test_cached_data_renders() {
    let tmpdir = tempfile::tempdir().unwrap();
    let cache = ResultCache::new(tmpdir.path().join("data"), AggregatorConfig::default());
    let (info, _) = cache.ensure(100).unwrap();

    let text = present::render_text(&info);
    assert_eq!(text.lines().count(), 25);
    assert!(text.starts_with("2: {1}\n3: {1}\n5: {1, 4}\n"));

    let written = present::render_all(&info, &tmpdir.path().join("plots")).unwrap();
    assert_eq!(written.len(), 3);
    for path in written {
        let svg = std::fs::read_to_string(&path).unwrap();
        assert!(svg.contains("<svg"), "{} is not SVG", path.display());
    }
}
