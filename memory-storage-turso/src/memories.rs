//! `Memory` row CRUD and the brute-force cosine `ann_query` scan over
//! rows the `workspace_id`/`domain`/`outcome` columns narrow in SQL
//! before the remaining [`Filter`] predicates and similarity ranking run
//! in-process (§4.1, §4.2, §6).

use crate::store::TursoStore;
use libsql::params;
use memory_core::embedding::cosine_similarity;
use memory_core::error::{Error, Result};
use memory_core::store::{AnnHit, Filter};
use memory_core::types::Memory;

fn encode(memory: &Memory) -> Result<Vec<u8>> {
    postcard::to_allocvec(memory).map_err(|e| Error::Serialization(e.to_string()))
}

fn decode(bytes: &[u8]) -> Result<Memory> {
    postcard::from_bytes(bytes).map_err(|e| Error::Serialization(e.to_string()))
}

impl TursoStore {
    pub(crate) async fn upsert_memories(&self, records: Vec<Memory>) -> Result<()> {
        let conn = self.conn().await;
        for memory in &records {
            let payload = encode(memory)?;
            let outcome = format!("{:?}", memory.outcome);
            conn.execute(
                "INSERT OR REPLACE INTO memories (id, workspace_id, domain, outcome, has_error_context, created_at, payload) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
                params![
                    memory.id.to_string(),
                    memory.workspace_id.clone(),
                    memory.domain.clone(),
                    outcome,
                    i64::from(memory.error_context.is_some()),
                    memory.timestamp.timestamp(),
                    payload,
                ],
            )
            .await
            .map_err(|e| Error::MemoryStorage(format!("failed to upsert memory {}: {e}", memory.id)))?;
        }
        Ok(())
    }

    /// Fetch all rows in `workspace_id`, narrowed by SQL; the remaining
    /// [`Filter`] predicates (domain, tags, outcome, error context,
    /// timestamp range) are applied in-process by the caller.
    async fn scan_workspace_raw(&self, workspace_id: &str) -> Result<Vec<Memory>> {
        let conn = self.conn().await;
        let mut rows = conn
            .query("SELECT payload FROM memories WHERE workspace_id = ?1", params![workspace_id.to_string()])
            .await
            .map_err(|e| Error::MemoryRetrieval(format!("failed to scan memories: {e}")))?;

        let mut out = Vec::new();
        while let Some(row) = rows.next().await.map_err(|e| Error::MemoryRetrieval(format!("failed to read memory row: {e}")))? {
            let payload: Vec<u8> = row.get(0).map_err(|e| Error::MemoryRetrieval(format!("malformed memory row: {e}")))?;
            out.push(decode(&payload)?);
        }
        Ok(out)
    }

    pub(crate) async fn ann_query_memories(&self, embedding: &[f32], k: usize, filter: &Filter) -> Result<Vec<AnnHit>> {
        let candidates = self.scan_workspace_raw(&filter.workspace_id).await?;
        let mut hits: Vec<AnnHit> = candidates
            .into_iter()
            .filter(|m| filter.matches(m))
            .map(|memory| {
                let similarity = cosine_similarity(embedding, &memory.vec);
                AnnHit {
                    id: memory.id,
                    distance: 1.0 - similarity,
                    memory,
                }
            })
            .collect();
        hits.sort_by(|a, b| a.distance.partial_cmp(&b.distance).unwrap_or(std::cmp::Ordering::Equal));
        hits.truncate(k);
        Ok(hits)
    }

    pub(crate) async fn scan_memories(&self, filter: &Filter) -> Result<Vec<Memory>> {
        Ok(self.scan_workspace_raw(&filter.workspace_id).await?.into_iter().filter(|m| filter.matches(m)).collect())
    }

    pub(crate) async fn delete_memories(&self, filter: &Filter) -> Result<u64> {
        let matching = self.scan_memories(filter).await?;
        let ids: Vec<String> = matching.iter().map(|m| m.id.to_string()).collect();
        self.delete_memory_ids(&ids).await?;
        Ok(ids.len() as u64)
    }

    pub(crate) async fn delete_memory_ids(&self, ids: &[String]) -> Result<()> {
        let conn = self.conn().await;
        for id in ids {
            conn.execute("DELETE FROM memories WHERE id = ?1", params![id.clone()])
                .await
                .map_err(|e| Error::MemoryStorage(format!("failed to delete memory {id}: {e}")))?;
        }
        Ok(())
    }

    pub(crate) async fn count_memories(&self, filter: &Filter) -> Result<u64> {
        Ok(self.scan_memories(filter).await?.len() as u64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use memory_core::types::{Difficulty, Outcome};

    fn memory(ws: &str, vec: Vec<f32>) -> Memory {
        Memory::new(ws.into(), "t".into(), "d".into(), "c".into(), vec, Difficulty::Simple, "dom".into(), Outcome::Success)
    }

    #[tokio::test]
    async fn upsert_then_scan_round_trips() {
        let store = TursoStore::connect(":memory:", "").await.unwrap();
        let m = memory("ws1", vec![1.0, 0.0]);
        let id = m.id;
        store.upsert_memories(vec![m]).await.unwrap();

        let found = store.scan_memories(&Filter::workspace("ws1")).await.unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].id, id);
    }

    #[tokio::test]
    async fn ann_query_orders_by_similarity() {
        let store = TursoStore::connect(":memory:", "").await.unwrap();
        store.upsert_memories(vec![memory("ws1", vec![1.0, 0.0]), memory("ws1", vec![0.0, 1.0])]).await.unwrap();

        let hits = store.ann_query_memories(&[1.0, 0.0], 2, &Filter::workspace("ws1")).await.unwrap();
        assert_eq!(hits.len(), 2);
        assert!(hits[0].distance <= hits[1].distance);
    }

    #[tokio::test]
    async fn delete_removes_matching_records() {
        let store = TursoStore::connect(":memory:", "").await.unwrap();
        store.upsert_memories(vec![memory("ws1", vec![1.0, 0.0]), memory("ws2", vec![1.0, 0.0])]).await.unwrap();

        let deleted = store.delete_memories(&Filter::workspace("ws1")).await.unwrap();
        assert_eq!(deleted, 1);
        assert_eq!(store.count_memories(&Filter::workspace("ws1")).await.unwrap(), 0);
        assert_eq!(store.count_memories(&Filter::workspace("ws2")).await.unwrap(), 1);
    }
}
