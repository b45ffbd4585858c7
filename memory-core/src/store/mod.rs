//! Memory Store Adapter (D): a uniform, workspace-scoped CRUD+ANN
//! interface over pluggable backends (§4.1, §6, §9).
//!
//! Per the re-architecture notes in §9, this is a capability interface —
//! `{upsert, ann_query, scan, delete, count}` — not a duck-typed handle.
//! The engine never dereferences backend-specific objects; genealogy
//! traversal goes through `scan`, never a raw collection reference.

mod filter;

pub use filter::Filter;

use crate::error::Result;
use crate::types::{Memory, Trace};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

/// Predicate for trace-level queries (`scan_traces`, `delete_traces`):
/// workspace scoping plus an optional age cutoff, as used by
/// `statistics` and `cleanup` (§4.1).
#[derive(Debug, Clone, Default)]
pub struct TraceFilter {
    pub workspace_id: Option<String>,
    pub created_before: Option<DateTime<Utc>>,
}

impl TraceFilter {
    #[must_use]
    pub fn workspace(workspace_id: impl Into<String>) -> Self {
        Self {
            workspace_id: Some(workspace_id.into()),
            created_before: None,
        }
    }

    #[must_use]
    pub fn before(mut self, ts: DateTime<Utc>) -> Self {
        self.created_before = Some(ts);
        self
    }

    #[must_use]
    pub fn matches(&self, trace: &Trace) -> bool {
        if let Some(ws) = &self.workspace_id {
            if &trace.workspace_id != ws {
                return false;
            }
        }
        if let Some(before) = self.created_before {
            if trace.created_at >= before {
                return false;
            }
        }
        true
    }
}

/// One ANN search hit: the stored record id, its distance from the query
/// embedding (lower is closer), and the full Memory.
#[derive(Debug, Clone)]
pub struct AnnHit {
    pub id: Uuid,
    pub distance: f32,
    pub memory: Memory,
}

/// Uniform storage backend contract. Implementations are tagged variants
/// selected by configuration (e.g. a local in-process ANN index vs a
/// remote vector database) — never resolved via dynamic attribute access.
#[async_trait]
pub trait MemoryStore: Send + Sync {
    /// Insert or overwrite records. Used both for individual Memory writes
    /// and for the Memory Core's transactional `store(trace, memories)`
    /// (§4.1), which the adapter may serialize as a single upsert batch.
    ///
    /// # Errors
    ///
    /// Returns [`crate::error::Error::MemoryStorage`] on backend failure;
    /// the caller must treat the whole batch as not committed.
    async fn upsert(&self, records: Vec<Memory>) -> Result<()>;

    /// Approximate nearest-neighbor query: the `k` closest records to
    /// `embedding`, restricted to records matching `filter`.
    ///
    /// # Errors
    ///
    /// Returns [`crate::error::Error::MemoryRetrieval`] on backend failure.
    async fn ann_query(&self, embedding: &[f32], k: usize, filter: &Filter) -> Result<Vec<AnnHit>>;

    /// Return every record matching `filter`, unordered. Used by genealogy
    /// traversal and statistics — never via a raw backend handle.
    ///
    /// # Errors
    ///
    /// Returns [`crate::error::Error::MemoryRetrieval`] on backend failure.
    async fn scan(&self, filter: &Filter) -> Result<Vec<Memory>>;

    /// Delete every record matching `filter`, returning the count removed.
    ///
    /// # Errors
    ///
    /// Returns [`crate::error::Error::MemoryStorage`] on backend failure.
    async fn delete(&self, filter: &Filter) -> Result<u64>;

    /// Count records matching `filter` without materializing them.
    ///
    /// # Errors
    ///
    /// Returns [`crate::error::Error::MemoryRetrieval`] on backend failure.
    async fn count(&self, filter: &Filter) -> Result<u64>;

    /// Persist (insert or overwrite) a sealed Trace's metadata row,
    /// alongside the `upsert` of its `memory_items` (§3, §4.1). Stored
    /// separately from Memory rows since a Trace is not itself embedded
    /// or ANN-searchable.
    ///
    /// # Errors
    ///
    /// Returns [`crate::error::Error::MemoryStorage`] on backend failure.
    async fn upsert_trace(&self, trace: &Trace) -> Result<()>;

    /// Return every Trace matching `filter`, unordered. Used by
    /// `statistics` and `cleanup` (§4.1).
    ///
    /// # Errors
    ///
    /// Returns [`crate::error::Error::MemoryRetrieval`] on backend failure.
    async fn scan_traces(&self, filter: &TraceFilter) -> Result<Vec<Trace>>;

    /// Delete every Trace matching `filter`, returning the count removed.
    /// Deleting a Trace also deletes the Memories it owns (§3: "A Trace
    /// exclusively owns the Memories it extracts; deleting a Trace
    /// deletes its Memories").
    ///
    /// # Errors
    ///
    /// Returns [`crate::error::Error::MemoryStorage`] on backend failure.
    async fn delete_traces(&self, filter: &TraceFilter) -> Result<u64>;
}
