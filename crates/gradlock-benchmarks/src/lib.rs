//! Benchmark suite for gradlock.
//!
//! Covers the two hot paths of a merge run: version parsing/comparison
//! (every dependency edge) and pattern compilation/matching (every
//! observed URL).

use criterion::Criterion;
use std::time::Duration;

/// Shared criterion configuration for all benchmarks.
pub fn criterion_config() -> Criterion {
    Criterion::default()
        .measurement_time(Duration::from_secs(5))
        .sample_size(50)
}
