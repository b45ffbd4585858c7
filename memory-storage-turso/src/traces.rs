//! `Trace` row CRUD, including the cascade delete into the `memories`
//! table required by the ownership invariant (§3).

use crate::store::TursoStore;
use libsql::params;
use memory_core::error::{Error, Result};
use memory_core::store::TraceFilter;
use memory_core::types::Trace;

fn encode(trace: &Trace) -> Result<Vec<u8>> {
    postcard::to_allocvec(trace).map_err(|e| Error::Serialization(e.to_string()))
}

fn decode(bytes: &[u8]) -> Result<Trace> {
    postcard::from_bytes(bytes).map_err(|e| Error::Serialization(e.to_string()))
}

impl TursoStore {
    pub(crate) async fn upsert_trace_row(&self, trace: &Trace) -> Result<()> {
        let payload = encode(trace)?;
        let conn = self.conn().await;
        conn.execute(
            "INSERT OR REPLACE INTO traces (trace_id, workspace_id, created_at, payload) VALUES (?1, ?2, ?3, ?4)",
            params![trace.trace_id.to_string(), trace.workspace_id.clone(), trace.created_at.timestamp(), payload],
        )
        .await
        .map_err(|e| Error::MemoryStorage(format!("failed to upsert trace {}: {e}", trace.trace_id)))?;
        Ok(())
    }

    async fn scan_workspace_raw(&self, workspace_id: Option<&str>) -> Result<Vec<Trace>> {
        let conn = self.conn().await;
        let mut rows = match workspace_id {
            Some(ws) => conn
                .query("SELECT payload FROM traces WHERE workspace_id = ?1", params![ws.to_string()])
                .await
                .map_err(|e| Error::MemoryRetrieval(format!("failed to scan traces: {e}")))?,
            None => conn.query("SELECT payload FROM traces", ()).await.map_err(|e| Error::MemoryRetrieval(format!("failed to scan traces: {e}")))?,
        };

        let mut out = Vec::new();
        while let Some(row) = rows.next().await.map_err(|e| Error::MemoryRetrieval(format!("failed to read trace row: {e}")))? {
            let payload: Vec<u8> = row.get(0).map_err(|e| Error::MemoryRetrieval(format!("malformed trace row: {e}")))?;
            out.push(decode(&payload)?);
        }
        Ok(out)
    }

    pub(crate) async fn scan_traces_rows(&self, filter: &TraceFilter) -> Result<Vec<Trace>> {
        Ok(self.scan_workspace_raw(filter.workspace_id.as_deref()).await?.into_iter().filter(|t| filter.matches(t)).collect())
    }

    /// Deletes every matching Trace row and, per the ownership invariant,
    /// every Memory it owns. Returns the number of traces deleted.
    pub(crate) async fn delete_traces_rows(&self, filter: &TraceFilter) -> Result<u64> {
        let matching = self.scan_traces_rows(filter).await?;
        let memory_ids: Vec<String> = matching.iter().flat_map(|t| t.memory_items.iter().map(|m| m.id.to_string())).collect();
        if !memory_ids.is_empty() {
            self.delete_memory_ids(&memory_ids).await?;
        }

        let conn = self.conn().await;
        for trace in &matching {
            conn.execute("DELETE FROM traces WHERE trace_id = ?1", params![trace.trace_id.to_string()])
                .await
                .map_err(|e| Error::MemoryStorage(format!("failed to delete trace {}: {e}", trace.trace_id)))?;
        }
        Ok(matching.len() as u64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use memory_core::store::Filter;
    use memory_core::types::{Difficulty, Memory, Outcome};

    fn trace_with_memory(ws: &str) -> Trace {
        let mut trace = Trace::new(ws.to_string(), "task".into());
        trace.memory_items.push(Memory::new(ws.to_string(), "t".into(), "d".into(), "c".into(), vec![1.0], Difficulty::Simple, "dom".into(), Outcome::Success));
        trace
    }

    #[tokio::test]
    async fn upsert_then_scan_round_trips() {
        let store = TursoStore::connect(":memory:", "").await.unwrap();
        let trace = trace_with_memory("ws1");
        let id = trace.trace_id;
        store.upsert_trace_row(&trace).await.unwrap();

        let found = store.scan_traces_rows(&TraceFilter::workspace("ws1")).await.unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].trace_id, id);
    }

    #[tokio::test]
    async fn delete_cascades_into_owned_memories() {
        let store = TursoStore::connect(":memory:", "").await.unwrap();
        let trace = trace_with_memory("ws1");
        let memory_id = trace.memory_items[0].id;
        store.upsert_memories(vec![trace.memory_items[0].clone()]).await.unwrap();
        store.upsert_trace_row(&trace).await.unwrap();

        let deleted = store.delete_traces_rows(&TraceFilter::workspace("ws1")).await.unwrap();
        assert_eq!(deleted, 1);

        let remaining = store.scan_memories(&Filter::workspace("ws1")).await.unwrap();
        assert!(!remaining.iter().any(|m| m.id == memory_id));
    }
}
