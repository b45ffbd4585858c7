//! Benchmarks for the redb-backed `MemoryStore`: batched upsert and ANN
//! query throughput at increasing store sizes.
//!
//! Run with: cargo bench --package memory-benches -- redb

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use memory_core::store::{Filter, MemoryStore};
use memory_core::types::{Difficulty, Memory, Outcome};
use memory_storage_redb::RedbStore;
use tempfile::tempdir;

fn fixture(workspace_id: &str, index: u32) -> Memory {
    Memory::new(
        workspace_id.to_string(),
        format!("memory-{index}"),
        "description".to_string(),
        "content".to_string(),
        vec![f32::from(index % 97) / 97.0, 0.2, 0.3],
        Difficulty::Simple,
        "bench-domain".to_string(),
        Outcome::Success,
    )
}

fn bench_upsert(c: &mut Criterion) {
    let rt = tokio::runtime::Runtime::new().expect("tokio runtime");
    let mut group = c.benchmark_group("redb_upsert");

    for size in &[100u32, 1_000] {
        group.bench_with_input(BenchmarkId::new("batched", size), size, |b, &size| {
            b.to_async(&rt).iter(|| async move {
                let dir = tempdir().expect("tempdir");
                let store = RedbStore::open(&dir.path().join("bench.redb")).await.expect("open store");
                let batch: Vec<Memory> = (0..size).map(|i| fixture("bench-ws", i)).collect();
                store.upsert(black_box(batch)).await.expect("upsert");
            });
        });
    }

    group.finish();
}

fn bench_ann_query(c: &mut Criterion) {
    let rt = tokio::runtime::Runtime::new().expect("tokio runtime");
    let mut group = c.benchmark_group("redb_ann_query");

    for size in &[100u32, 1_000] {
        let dir = tempdir().expect("tempdir");
        let store = rt.block_on(async {
            let store = RedbStore::open(&dir.path().join("bench.redb")).await.expect("open store");
            let batch: Vec<Memory> = (0..*size).map(|i| fixture("bench-ws", i)).collect();
            store.upsert(batch).await.expect("seed upsert");
            store
        });

        group.bench_with_input(BenchmarkId::new("top_10", size), size, |b, _| {
            b.to_async(&rt).iter(|| async {
                let hits = store
                    .ann_query(black_box(&[0.5, 0.2, 0.3]), 10, &Filter::workspace("bench-ws"))
                    .await
                    .expect("ann_query");
                black_box(hits);
            });
        });
    }

    group.finish();
}

criterion_group!(benches, bench_upsert, bench_ann_query);
criterion_main!(benches);
