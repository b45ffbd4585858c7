//! `Trace` row CRUD, including the cascade delete into the `memories`
//! table required by the ownership invariant (§3: a Trace exclusively
//! owns the Memories it extracted).

use crate::store::{with_db_timeout, RedbStore};
use crate::tables::{MAX_TRACE_SIZE, TRACES_TABLE};
use memory_core::error::{Error, Result};
use memory_core::store::TraceFilter;
use memory_core::types::Trace;
use redb::ReadableTable;
use std::sync::Arc;

fn encode(trace: &Trace) -> Result<Vec<u8>> {
    let bytes = postcard::to_allocvec(trace).map_err(|e| Error::Serialization(e.to_string()))?;
    if bytes.len() > MAX_TRACE_SIZE {
        return Err(Error::Serialization(format!("trace {} serialized to {} bytes, exceeds {MAX_TRACE_SIZE}", trace.trace_id, bytes.len())));
    }
    Ok(bytes)
}

fn decode(bytes: &[u8]) -> Result<Trace> {
    postcard::from_bytes(bytes).map_err(|e| Error::Serialization(e.to_string()))
}

impl RedbStore {
    pub(crate) async fn upsert_trace_row(&self, trace: Trace) -> Result<()> {
        let db = Arc::clone(&self.db);
        with_db_timeout(move || {
            let key = trace.trace_id.to_string();
            let bytes = encode(&trace)?;
            let write_txn = db.begin_write().map_err(|e| Error::MemoryStorage(format!("failed to begin write transaction: {e}")))?;
            {
                let mut table = write_txn
                    .open_table(TRACES_TABLE)
                    .map_err(|e| Error::MemoryStorage(format!("failed to open traces table: {e}")))?;
                table
                    .insert(key.as_str(), bytes.as_slice())
                    .map_err(|e| Error::MemoryStorage(format!("failed to insert trace {}: {e}", trace.trace_id)))?;
            }
            write_txn.commit().map_err(|e| Error::MemoryStorage(format!("failed to commit transaction: {e}")))?;
            Ok(())
        })
        .await
    }

    async fn scan_traces_raw(&self) -> Result<Vec<Trace>> {
        let db = Arc::clone(&self.db);
        with_db_timeout(move || {
            let read_txn = db.begin_read().map_err(|e| Error::MemoryRetrieval(format!("failed to begin read transaction: {e}")))?;
            let table = read_txn
                .open_table(TRACES_TABLE)
                .map_err(|e| Error::MemoryRetrieval(format!("failed to open traces table: {e}")))?;
            let mut out = Vec::new();
            for item in table.iter().map_err(|e| Error::MemoryRetrieval(format!("failed to iterate traces: {e}")))? {
                let (_key, value) = item.map_err(|e| Error::MemoryRetrieval(format!("failed to read trace row: {e}")))?;
                out.push(decode(value.value())?);
            }
            Ok(out)
        })
        .await
    }

    pub(crate) async fn scan_traces_rows(&self, filter: &TraceFilter) -> Result<Vec<Trace>> {
        Ok(self.scan_traces_raw().await?.into_iter().filter(|t| filter.matches(t)).collect())
    }

    /// Deletes every matching Trace row and, per the ownership invariant,
    /// every Memory it owns. Returns the number of traces deleted.
    pub(crate) async fn delete_traces_rows(&self, filter: &TraceFilter) -> Result<u64> {
        let matching = self.scan_traces_rows(filter).await?;
        let trace_ids: Vec<String> = matching.iter().map(|t| t.trace_id.to_string()).collect();
        let memory_ids: Vec<String> = matching.iter().flat_map(|t| t.memory_items.iter().map(|m| m.id.to_string())).collect();

        if !memory_ids.is_empty() {
            self.delete_memory_ids(&memory_ids).await?;
        }

        if trace_ids.is_empty() {
            return Ok(0);
        }

        let db = Arc::clone(&self.db);
        with_db_timeout(move || {
            let write_txn = db.begin_write().map_err(|e| Error::MemoryStorage(format!("failed to begin write transaction: {e}")))?;
            {
                let mut table = write_txn
                    .open_table(TRACES_TABLE)
                    .map_err(|e| Error::MemoryStorage(format!("failed to open traces table: {e}")))?;
                for id in &trace_ids {
                    table.remove(id.as_str()).map_err(|e| Error::MemoryStorage(format!("failed to remove trace {id}: {e}")))?;
                }
            }
            write_txn.commit().map_err(|e| Error::MemoryStorage(format!("failed to commit transaction: {e}")))?;
            Ok(())
        })
        .await?;

        Ok(trace_ids.len() as u64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use memory_core::store::Filter;
    use memory_core::types::{Difficulty, Memory, Outcome};
    use tempfile::tempdir;

    fn trace_with_memory(ws: &str) -> Trace {
        let mut trace = Trace::new(ws.to_string(), "task".into());
        trace.memory_items.push(Memory::new(ws.to_string(), "t".into(), "d".into(), "c".into(), vec![1.0], Difficulty::Simple, "dom".into(), Outcome::Success));
        trace
    }

    #[tokio::test]
    async fn upsert_then_scan_round_trips() {
        let dir = tempdir().unwrap();
        let store = RedbStore::open(&dir.path().join("t.redb")).await.unwrap();
        let trace = trace_with_memory("ws1");
        let id = trace.trace_id;
        store.upsert_trace_row(trace).await.unwrap();

        let found = store.scan_traces_rows(&TraceFilter::workspace("ws1")).await.unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].trace_id, id);
    }

    #[tokio::test]
    async fn delete_cascades_into_owned_memories() {
        let dir = tempdir().unwrap();
        let store = RedbStore::open(&dir.path().join("t.redb")).await.unwrap();
        let trace = trace_with_memory("ws1");
        let memory_id = trace.memory_items[0].id;
        store.upsert_memories(vec![trace.memory_items[0].clone()]).await.unwrap();
        store.upsert_trace_row(trace).await.unwrap();

        let deleted = store.delete_traces_rows(&TraceFilter::workspace("ws1")).await.unwrap();
        assert_eq!(deleted, 1);

        let remaining = store.scan_memories(&Filter::workspace("ws1")).await.unwrap();
        assert!(!remaining.iter().any(|m| m.id == memory_id));
    }
}
