//! Benchmarks for the normalization hot paths
//!
//! Tests throughput for:
//! - Channel sanitization at typical lap lengths
//! - Distance derivation from speed and time
//! - Lap row normalization across a session
//! - Roster classification and resolution
//! - Session cache hits
//!
//! Platform: Cross-platform (synthetic data, CI-safe)

use criterion::{BenchmarkId, Criterion, Throughput, criterion_group, criterion_main};
use pitlane::normalize::{DistancePolicy, RosterShape, add_distance, normalize_lap, sanitize};
use pitlane::schema::{Channel, RawCarData};
use pitlane::test_utils::{MockUpstream, car_data, lap, sample_key, sample_session};
use pitlane::{CacheConfig, SessionCache};
use std::hint::black_box;
use std::sync::Arc;
use std::time::Duration;

/// Sample counts of a short sprint lap, a typical lap and a long street circuit lap.
const LAP_LENGTHS: [usize; 3] = [300, 700, 1_200];

fn bench_sanitize(c: &mut Criterion) {
    let mut group = c.benchmark_group("sanitize");

    for length in LAP_LENGTHS {
        let raw = car_data(length);
        group.throughput(Throughput::Elements(length as u64));
        group.bench_with_input(BenchmarkId::new("strict", length), &raw, |b, raw| {
            b.iter(|| black_box(sanitize(raw, length, DistancePolicy::Strict).unwrap()))
        });
    }

    group.finish();
}

fn bench_add_distance(c: &mut Criterion) {
    let mut group = c.benchmark_group("add_distance");

    for length in LAP_LENGTHS {
        let rows = 0..length;
        let raw = RawCarData::new()
            .with_values(Channel::Speed, rows.clone().map(|i| 250.0 + (i % 50) as f64))
            .with_values(Channel::Time, rows.map(|i| i as f64 * 0.06));

        group.throughput(Throughput::Elements(length as u64));
        group.bench_with_input(BenchmarkId::from_parameter(length), &raw, |b, raw| {
            b.iter(|| {
                let mut raw = raw.clone();
                black_box(add_distance(&mut raw))
            })
        });
    }

    group.finish();
}

fn bench_normalize_laps(c: &mut Criterion) {
    let laps: Vec<_> = (1..=57)
        .flat_map(|number| {
            ["VER", "PER", "ALO", "SAI", "HAM"]
                .map(|driver| lap(driver, number, Some(93.0 + number as f64 * 0.01), None))
        })
        .collect();

    let mut group = c.benchmark_group("normalize_lap");
    group.throughput(Throughput::Elements(laps.len() as u64));
    group.bench_function("race_distance", |b| {
        b.iter(|| {
            let normalized = laps.iter().filter_map(|raw| normalize_lap(raw).ok()).count();
            black_box(normalized)
        })
    });
    group.finish();
}

fn bench_roster(c: &mut Criterion) {
    let session = sample_session();
    let drivers = session.drivers.as_ref();

    let mut group = c.benchmark_group("roster");
    group.bench_function("classify_keyed", |b| b.iter(|| black_box(RosterShape::classify(drivers))));

    let roster = RosterShape::classify(drivers);
    group.bench_function("resolve", |b| {
        b.iter(|| {
            black_box(roster.resolve("VER"));
            black_box(roster.resolve("SAR"))
        })
    });
    group.finish();
}

fn bench_cache_hit(c: &mut Criterion) {
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_time()
        .build()
        .expect("Failed to build runtime");

    let key = sample_key();
    let upstream = MockUpstream::default().with_session(key.clone(), sample_session());
    let cache = SessionCache::new(Arc::new(upstream), CacheConfig::unbounded(), Duration::from_secs(5));
    runtime.block_on(cache.get_or_load(&key)).expect("Failed to warm cache");

    c.bench_function("cache_hit", |b| {
        b.iter(|| black_box(runtime.block_on(cache.get_or_load(&key)).unwrap()))
    });
}

criterion_group!(
    benches,
    bench_sanitize,
    bench_add_distance,
    bench_normalize_laps,
    bench_roster,
    bench_cache_hit
);
criterion_main!(benches);
