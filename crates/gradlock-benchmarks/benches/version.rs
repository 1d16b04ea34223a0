//! Version parsing and comparison benchmarks.

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use gradlock_benchmarks::criterion_config;
use gradlock_core::types::{Version, VersionCache};

const SOURCES: &[&str] = &[
    "1.0",
    "1.0.1",
    "2.13.4",
    "1.0-rc1",
    "1.0-SNAPSHOT",
    "5.3.29-beta2",
    "2020.4.1-final",
    "1.7.36+build.2009",
];

fn bench_parse(c: &mut Criterion) {
    c.bench_function("version_parse", |b| {
        b.iter(|| {
            for source in SOURCES {
                black_box(Version::parse(source));
            }
        })
    });
}

fn bench_parse_cached(c: &mut Criterion) {
    c.bench_function("version_parse_cached", |b| {
        let cache = VersionCache::new();
        b.iter(|| {
            for source in SOURCES {
                black_box(cache.parse(source));
            }
        })
    });
}

fn bench_compare(c: &mut Criterion) {
    let versions: Vec<Version> = SOURCES.iter().map(|s| Version::parse(s)).collect();
    c.bench_function("version_compare", |b| {
        b.iter(|| {
            for a in &versions {
                for z in &versions {
                    black_box(a.cmp(z));
                }
            }
        })
    });
}

criterion_group! {
    name = benches;
    config = criterion_config();
    targets = bench_parse, bench_parse_cached, bench_compare
}
criterion_main!(benches);
