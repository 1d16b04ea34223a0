//! Pattern engine benchmarks.

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use gradlock_benchmarks::criterion_config;
use gradlock_registry::{fill, Attributes, MatcherCache, PatternMatcher, M2_PATTERN};

fn maven_pattern() -> String {
    format!("https://repo.maven.apache.org/maven2/{M2_PATTERN}")
}

fn attributes() -> Attributes {
    [
        ("organisation", "com/example"),
        ("module", "lib"),
        ("revision", "1.2.3"),
        ("artifact", "lib"),
        ("ext", "jar"),
    ]
    .into_iter()
    .map(|(k, v)| (k.to_string(), v.to_string()))
    .collect()
}

fn bench_fill(c: &mut Criterion) {
    let pattern = maven_pattern();
    let attributes = attributes();
    c.bench_function("pattern_fill", |b| {
        b.iter(|| black_box(fill(&pattern, &attributes)))
    });
}

fn bench_compile(c: &mut Criterion) {
    let pattern = maven_pattern();
    c.bench_function("pattern_compile", |b| {
        b.iter(|| black_box(PatternMatcher::compile_maven(&pattern).unwrap()))
    });
}

fn bench_match_cached(c: &mut Criterion) {
    let pattern = maven_pattern();
    let url = "https://repo.maven.apache.org/maven2/com/example/lib/1.2.3/lib-1.2.3.jar";
    let cache = MatcherCache::new();
    c.bench_function("pattern_match_cached", |b| {
        b.iter(|| {
            let matcher = cache.matcher(&pattern).unwrap();
            black_box(matcher.matches(url))
        })
    });
}

criterion_group! {
    name = benches;
    config = criterion_config();
    targets = bench_fill, bench_compile, bench_match_cached
}
criterion_main!(benches);
