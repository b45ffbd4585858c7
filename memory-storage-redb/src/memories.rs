//! `Memory` row CRUD and the brute-force cosine `ann_query` scan (§4.1,
//! §4.2, §6).

use crate::store::{with_db_timeout, RedbStore};
use crate::tables::{MAX_MEMORY_SIZE, MEMORIES_TABLE};
use memory_core::embedding::cosine_similarity;
use memory_core::error::{Error, Result};
use memory_core::store::{AnnHit, Filter};
use memory_core::types::Memory;
use redb::ReadableTable;
use std::sync::Arc;

fn encode(memory: &Memory) -> Result<Vec<u8>> {
    let bytes = postcard::to_allocvec(memory).map_err(|e| Error::Serialization(e.to_string()))?;
    if bytes.len() > MAX_MEMORY_SIZE {
        return Err(Error::Serialization(format!("memory {} serialized to {} bytes, exceeds {MAX_MEMORY_SIZE}", memory.id, bytes.len())));
    }
    Ok(bytes)
}

fn decode(bytes: &[u8]) -> Result<Memory> {
    postcard::from_bytes(bytes).map_err(|e| Error::Serialization(e.to_string()))
}

impl RedbStore {
    pub(crate) async fn upsert_memories(&self, records: Vec<Memory>) -> Result<()> {
        let db = Arc::clone(&self.db);
        with_db_timeout(move || {
            let write_txn = db.begin_write().map_err(|e| Error::MemoryStorage(format!("failed to begin write transaction: {e}")))?;
            {
                let mut table = write_txn
                    .open_table(MEMORIES_TABLE)
                    .map_err(|e| Error::MemoryStorage(format!("failed to open memories table: {e}")))?;
                for memory in &records {
                    let key = memory.id.to_string();
                    let bytes = encode(memory)?;
                    table
                        .insert(key.as_str(), bytes.as_slice())
                        .map_err(|e| Error::MemoryStorage(format!("failed to insert memory {}: {e}", memory.id)))?;
                }
            }
            write_txn.commit().map_err(|e| Error::MemoryStorage(format!("failed to commit transaction: {e}")))?;
            Ok(())
        })
        .await
    }

    async fn scan_raw(&self) -> Result<Vec<Memory>> {
        let db = Arc::clone(&self.db);
        with_db_timeout(move || {
            let read_txn = db.begin_read().map_err(|e| Error::MemoryRetrieval(format!("failed to begin read transaction: {e}")))?;
            let table = read_txn
                .open_table(MEMORIES_TABLE)
                .map_err(|e| Error::MemoryRetrieval(format!("failed to open memories table: {e}")))?;
            let mut out = Vec::new();
            for item in table.iter().map_err(|e| Error::MemoryRetrieval(format!("failed to iterate memories: {e}")))? {
                let (_key, value) = item.map_err(|e| Error::MemoryRetrieval(format!("failed to read memory row: {e}")))?;
                out.push(decode(value.value())?);
            }
            Ok(out)
        })
        .await
    }

    pub(crate) async fn ann_query_memories(&self, embedding: &[f32], k: usize, filter: &Filter) -> Result<Vec<AnnHit>> {
        let candidates = self.scan_raw().await?;
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
        Ok(self.scan_raw().await?.into_iter().filter(|m| filter.matches(m)).collect())
    }

    pub(crate) async fn delete_memories(&self, filter: &Filter) -> Result<u64> {
        let matching = self.scan_memories(filter).await?;
        let ids: Vec<String> = matching.iter().map(|m| m.id.to_string()).collect();
        self.delete_memory_ids(&ids).await?;
        Ok(ids.len() as u64)
    }

    pub(crate) async fn delete_memory_ids(&self, ids: &[String]) -> Result<()> {
        if ids.is_empty() {
            return Ok(());
        }
        let db = Arc::clone(&self.db);
        let ids = ids.to_vec();
        with_db_timeout(move || {
            let write_txn = db.begin_write().map_err(|e| Error::MemoryStorage(format!("failed to begin write transaction: {e}")))?;
            {
                let mut table = write_txn
                    .open_table(MEMORIES_TABLE)
                    .map_err(|e| Error::MemoryStorage(format!("failed to open memories table: {e}")))?;
                for id in &ids {
                    table.remove(id.as_str()).map_err(|e| Error::MemoryStorage(format!("failed to remove memory {id}: {e}")))?;
                }
            }
            write_txn.commit().map_err(|e| Error::MemoryStorage(format!("failed to commit transaction: {e}")))?;
            Ok(())
        })
        .await
    }

    pub(crate) async fn count_memories(&self, filter: &Filter) -> Result<u64> {
        Ok(self.scan_memories(filter).await?.len() as u64)
    }
}
