//! Integration tests exercising `RedbStore` through the `MemoryStore`
//! trait object, the way `memory-core` actually calls it.

use crate::RedbStore;
use memory_core::store::{Filter, MemoryStore, TraceFilter};
use memory_core::types::{Difficulty, Memory, Outcome, Trace};
use std::sync::Arc;
use tempfile::tempdir;

fn memory(ws: &str, vec: Vec<f32>) -> Memory {
    Memory::new(ws.into(), "title".into(), "desc".into(), "content".into(), vec, Difficulty::Simple, "dom".into(), Outcome::Success)
}

async fn open_store() -> (tempfile::TempDir, Arc<dyn MemoryStore>) {
    let dir = tempdir().unwrap();
    let store = RedbStore::open(&dir.path().join("store.redb")).await.unwrap();
    (dir, Arc::new(store))
}

#[tokio::test]
async fn store_roundtrips_a_sealed_trace_and_its_memories() {
    let (_dir, store) = open_store().await;

    let mut trace = Trace::new("ws1".into(), "do the thing".into());
    let mem = memory("ws1", vec![0.5, 0.5]);
    trace.memory_items.push(mem.clone());

    store.upsert(trace.memory_items.clone()).await.unwrap();
    store.upsert_trace(&trace).await.unwrap();

    let traces = store.scan_traces(&TraceFilter::workspace("ws1")).await.unwrap();
    assert_eq!(traces.len(), 1);
    assert_eq!(traces[0].trace_id, trace.trace_id);

    let memories = store.scan(&Filter::workspace("ws1")).await.unwrap();
    assert_eq!(memories.len(), 1);
    assert_eq!(memories[0].id, mem.id);
}

#[tokio::test]
async fn delete_workspace_cascade_removes_traces_and_memories() {
    let (_dir, store) = open_store().await;

    let mut trace = Trace::new("ws1".into(), "task".into());
    trace.memory_items.push(memory("ws1", vec![1.0, 0.0]));
    store.upsert(trace.memory_items.clone()).await.unwrap();
    store.upsert_trace(&trace).await.unwrap();

    let deleted_traces = store.delete_traces(&TraceFilter::workspace("ws1")).await.unwrap();
    assert_eq!(deleted_traces, 1);

    let deleted_memories = store.delete(&Filter::workspace("ws1")).await.unwrap();
    assert_eq!(deleted_memories, 0, "cascade already removed the owned memories");

    assert_eq!(store.count(&Filter::workspace("ws1")).await.unwrap(), 0);
    assert!(store.scan_traces(&TraceFilter::workspace("ws1")).await.unwrap().is_empty());
}

#[tokio::test]
async fn ann_query_is_scoped_by_filter() {
    let (_dir, store) = open_store().await;
    store.upsert(vec![memory("ws1", vec![1.0, 0.0]), memory("ws2", vec![1.0, 0.0])]).await.unwrap();

    let hits = store.ann_query(&[1.0, 0.0], 10, &Filter::workspace("ws1")).await.unwrap();
    assert_eq!(hits.len(), 1);
    assert_eq!(hits[0].memory.workspace_id, "ws1");
}

#[tokio::test]
async fn reopening_the_same_path_preserves_data() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("persist.redb");

    {
        let store = RedbStore::open(&path).await.unwrap();
        store.upsert(vec![memory("ws1", vec![1.0, 0.0])]).await.unwrap();
    }

    let store = RedbStore::open(&path).await.unwrap();
    let memories = store.scan(&Filter::workspace("ws1")).await.unwrap();
    assert_eq!(memories.len(), 1);
}
