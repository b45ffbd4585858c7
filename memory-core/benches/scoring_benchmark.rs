//! Benchmarks for composite scoring and ranking.
//!
//! Run with: cargo bench --package memory-core -- scoring

use chrono::{Duration, Utc};
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use memory_core::scoring::{rank, ScoringConfig};
use memory_core::store::AnnHit;
use memory_core::types::{Difficulty, Memory, Outcome};

fn make_hits(size: u32) -> Vec<AnnHit> {
    let now = Utc::now();
    (0..size)
        .map(|i| {
            let mut memory = Memory::new(
                "bench-ws".to_string(),
                format!("memory-{i}"),
                "description".to_string(),
                "content".to_string(),
                vec![0.1, 0.2, 0.3],
                Difficulty::Simple,
                "bench-domain".to_string(),
                Outcome::Success,
            );
            memory.timestamp = now - Duration::hours(i64::from(i));
            AnnHit { id: memory.id, distance: f32::from(i % 100) / 100.0, memory }
        })
        .collect()
}

fn bench_rank(c: &mut Criterion) {
    let mut group = c.benchmark_group("rank");
    let config = ScoringConfig::default();

    for size in &[100, 1000, 10000] {
        let hits = make_hits(*size);
        group.bench_with_input(BenchmarkId::new("composite", size), size, |b, _| {
            b.iter(|| {
                let top = rank(black_box(hits.clone()), Utc::now(), 10, &config);
                black_box(top);
            });
        });
    }

    group.finish();
}

criterion_group!(benches, bench_rank);
criterion_main!(benches);
