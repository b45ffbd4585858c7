//! `impl MemoryStore for RedbStore`: delegates every method to the
//! helpers in [`crate::memories`] and [`crate::traces`].

use crate::store::RedbStore;
use async_trait::async_trait;
use memory_core::error::Result;
use memory_core::store::{AnnHit, Filter, MemoryStore, TraceFilter};
use memory_core::types::{Memory, Trace};

#[async_trait]
impl MemoryStore for RedbStore {
    async fn upsert(&self, records: Vec<Memory>) -> Result<()> {
        self.upsert_memories(records).await
    }

    async fn ann_query(&self, embedding: &[f32], k: usize, filter: &Filter) -> Result<Vec<AnnHit>> {
        self.ann_query_memories(embedding, k, filter).await
    }

    async fn scan(&self, filter: &Filter) -> Result<Vec<Memory>> {
        self.scan_memories(filter).await
    }

    async fn delete(&self, filter: &Filter) -> Result<u64> {
        self.delete_memories(filter).await
    }

    async fn count(&self, filter: &Filter) -> Result<u64> {
        self.count_memories(filter).await
    }

    async fn upsert_trace(&self, trace: &Trace) -> Result<()> {
        self.upsert_trace_row(trace.clone()).await
    }

    async fn scan_traces(&self, filter: &TraceFilter) -> Result<Vec<Trace>> {
        self.scan_traces_rows(filter).await
    }

    async fn delete_traces(&self, filter: &TraceFilter) -> Result<u64> {
        self.delete_traces_rows(filter).await
    }
}
