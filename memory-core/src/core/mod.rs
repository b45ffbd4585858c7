//! Memory Core (F): trace persistence, learning extraction, genealogy,
//! and statistics — the facade every external request surface calls into
//! (§4.1).

mod solve;
mod stats;

pub use solve::{SolveOptions, SolveResult};
pub use stats::Statistics;

use crate::embedding::Embedder;
use crate::error::{Error, Result};
use crate::genealogy::{genealogy_of, Genealogy};
use crate::judge::Judge;
use crate::llm::cache::{CacheStats, ResponseCache};
use crate::llm::gateway::ApiStats;
use crate::llm::{Gateway, LlmClient};
use crate::scoring::{self, ScoringConfig};
use crate::store::{Filter, MemoryStore, TraceFilter};
use crate::types::{Memory, Outcome, Trace};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

/// `restore(path, target_workspace?, overwrite=false)` response (§6).
#[derive(Debug, Clone)]
pub struct RestoreResult {
    pub workspace_id: String,
    pub memories_restored: usize,
}

/// Retrieval options (§4.1 opts).
#[derive(Debug, Clone, Default)]
pub struct RetrieveOptions {
    pub include_errors: Option<bool>,
    pub domain: Option<String>,
    pub pattern_tags: Vec<String>,
    pub min_score: Option<f32>,
}

/// All collaborators the Memory Core needs, constructed once at startup
/// and shared by `Arc` — there is no implicit process-wide singleton
/// (§9).
pub struct MemoryCore {
    store: Arc<dyn MemoryStore>,
    embedder: Arc<dyn Embedder>,
    gateway: Arc<Gateway>,
    scoring: ScoringConfig,
}

impl MemoryCore {
    /// Construct a Memory Core. `llm_backend` is the raw transport client
    /// (e.g. [`crate::llm::pool::HttpLlmClient`]); it is wrapped in a
    /// [`Gateway`] here so every caller that receives `llm_ref()` gets the
    /// cache+retry-composed client, never the bare transport (§4.5).
    #[must_use]
    pub fn new(
        store: Arc<dyn MemoryStore>,
        embedder: Arc<dyn Embedder>,
        llm_backend: Arc<dyn LlmClient>,
        cache: Arc<ResponseCache>,
    ) -> Self {
        Self {
            store,
            embedder,
            gateway: Arc::new(Gateway::new(llm_backend, cache)),
            scoring: ScoringConfig::default(),
        }
    }

    #[must_use]
    pub fn with_scoring_config(mut self, config: ScoringConfig) -> Self {
        self.scoring = config;
        self
    }

    /// `solve(task, workspace_id, opts) -> result` (§6).
    ///
    /// # Errors
    ///
    /// See [`crate::error::Error`]: most notably `InvalidTask`,
    /// `TokenBudgetExceeded`, `LlmError`, `MemoryStorageError`.
    pub async fn solve(
        &self,
        task: &str,
        workspace_id: &str,
        opts: SolveOptions,
        cancellation: CancellationToken,
    ) -> Result<SolveResult> {
        solve::solve(self, task, workspace_id, opts, cancellation).await
    }

    /// `retrieve(query_text, workspace, n, opts) -> ranked memories` (§4.1).
    ///
    /// # Errors
    ///
    /// Returns [`Error::Embedding`] if the query cannot be embedded, or
    /// [`Error::MemoryRetrieval`] if the store's ANN query fails.
    pub async fn retrieve(
        &self,
        query_text: &str,
        workspace_id: &str,
        n: usize,
        opts: &RetrieveOptions,
    ) -> Result<Vec<scoring::ScoredMemory>> {
        let embedding = self
            .embedder
            .embed(query_text)
            .await
            .map_err(|e| Error::Embedding(e.to_string()))?;

        let mut filter = Filter::workspace(workspace_id);
        if let Some(domain) = &opts.domain {
            filter = filter.with_domain(domain.clone());
        }
        if !opts.pattern_tags.is_empty() {
            filter = filter.with_pattern_tags(opts.pattern_tags.clone());
        }
        if opts.include_errors == Some(false) {
            filter = filter.excluding_errors();
        }

        // Over-fetch so that the composite scorer (which may re-rank
        // below raw ANN distance order) still has enough candidates to
        // pick the true top-n from.
        let hits = self.store.ann_query(&embedding, n.max(1) * 4, &filter).await?;

        let now = chrono::Utc::now();
        let mut ranked = scoring::rank(hits, now, n, &self.scoring);

        if let Some(min_score) = opts.min_score {
            ranked.retain(|m| m.composite >= min_score);
        }

        Ok(ranked)
    }

    /// `judge_solution(task, solution) -> { verdict, score, reasoning, learnings[] }` (§4.1).
    #[must_use]
    pub fn judge(&self, workspace_id: &str, model: &str) -> Judge {
        Judge::new(self.llm_ref(), model.to_string(), workspace_id.to_string())
    }

    /// `store(trace, memories, workspace) -> trace_id` (§4.1): persists a
    /// trace and its memories as a single upsert batch. Partial failures
    /// are surfaced as `MemoryStorageError`; the caller must not consider
    /// the trace committed.
    ///
    /// # Errors
    ///
    /// Returns [`Error::MemoryStorage`] on backend failure.
    pub async fn store(&self, trace: &Trace) -> Result<Uuid> {
        self.store.upsert(trace.memory_items.clone()).await?;
        self.store.upsert_trace(trace).await?;
        Ok(trace.trace_id)
    }

    /// `genealogy(memory_id, workspace) -> {...}` (§4.1, §4.6).
    ///
    /// # Errors
    ///
    /// Returns [`Error::GenealogyCycle`] if the genealogy graph contains a
    /// cycle.
    pub async fn genealogy(&self, memory_id: Uuid, workspace_id: &str) -> Result<Genealogy> {
        let memories = self.store.scan(&Filter::workspace(workspace_id)).await?;
        genealogy_of(memory_id, &memories)
    }

    /// `statistics(workspace?) -> {...}` (§4.1, §6).
    ///
    /// # Errors
    ///
    /// Returns [`Error::MemoryRetrieval`] on backend failure.
    pub async fn statistics(&self, workspace_id: Option<&str>) -> Result<Statistics> {
        stats::statistics(self, workspace_id).await
    }

    /// `cleanup(retention_days, workspace?) -> {...}` (§4.1, §6).
    ///
    /// # Errors
    ///
    /// Returns [`Error::MemoryStorage`] on backend failure.
    pub async fn cleanup(&self, retention_days: u32, workspace_id: Option<&str>) -> Result<stats::CleanupResult> {
        stats::cleanup(self, retention_days, workspace_id).await
    }

    /// `backup(path, workspace_id?, incremental=false) -> archive bytes` (§6).
    /// `incremental` is accepted for surface compatibility but not yet
    /// implemented — every backup is currently a full snapshot.
    ///
    /// # Errors
    ///
    /// Returns [`Error::MemoryRetrieval`] if the workspace cannot be
    /// scanned.
    pub async fn backup(&self, workspace_id: &str) -> Result<Vec<u8>> {
        crate::backup::backup(&self.store, workspace_id).await
    }

    /// `restore(path, target_workspace?, overwrite=false) -> {...}` (§6):
    /// decodes an archive produced by [`Self::backup`] and upserts its
    /// Memories into `target_workspace` (or the archive's original
    /// workspace id if `None`). When `overwrite` is `false`, Memories
    /// whose id already exists in the target workspace are skipped rather
    /// than clobbered.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidArchive`] if the archive is malformed, or
    /// [`Error::MemoryStorage`] if the restored records cannot be written.
    pub async fn restore(&self, archive_bytes: &[u8], target_workspace: Option<&str>, overwrite: bool) -> Result<RestoreResult> {
        let (metadata, memories) = crate::backup::restore(archive_bytes)?;
        let workspace_id = target_workspace.unwrap_or(&metadata.workspace_id);

        let mut restored = memories;
        for memory in &mut restored {
            memory.workspace_id = workspace_id.to_string();
        }

        if !overwrite {
            let existing = self.store.scan(&Filter::workspace(workspace_id)).await?;
            let existing_ids: std::collections::HashSet<Uuid> = existing.iter().map(|m| m.id).collect();
            restored.retain(|m| !existing_ids.contains(&m.id));
        }

        let memories_restored = restored.len();
        self.store.upsert(restored).await?;

        Ok(RestoreResult { workspace_id: workspace_id.to_string(), memories_restored })
    }

    /// `validate(path)` (§6): checks every Memory in an archive against
    /// the required-field invariant (§3) without writing anything.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidArchive`] if the archive is malformed, or
    /// [`Error::MemoryValidation`] naming the first invalid record.
    pub fn validate_backup(archive_bytes: &[u8]) -> Result<usize> {
        let (_, memories) = crate::backup::restore(archive_bytes)?;
        Ok(memories.len())
    }

    /// `delete_workspace(workspace_id, confirm) -> {...}` (§6): refuses
    /// without `confirm=true`. Deletes both the workspace's Traces and any
    /// Memories not already removed by the backend's trace cascade, so a
    /// workspace leaves no orphaned rows behind (§3 ownership).
    ///
    /// # Errors
    ///
    /// Returns [`Error::ConfirmationRequired`] unless `confirm` is `true`,
    /// or [`Error::MemoryStorage`] on backend failure.
    pub async fn delete_workspace(&self, workspace_id: &str, confirm: bool) -> Result<u64> {
        if !confirm {
            return Err(Error::ConfirmationRequired(workspace_id.to_string()));
        }
        self.store.delete_traces(&TraceFilter::workspace(workspace_id)).await?;
        self.store.delete(&Filter::workspace(workspace_id)).await
    }

    pub(crate) fn store_ref(&self) -> &Arc<dyn MemoryStore> {
        &self.store
    }

    pub(crate) fn embedder_ref(&self) -> &Arc<dyn Embedder> {
        &self.embedder
    }

    /// The gateway-composed LLM client (cache + retry + pool already
    /// applied), as an `Arc<dyn LlmClient>` for the controller/MaTTS/judge
    /// to hold (§4.5).
    pub(crate) fn llm_ref(&self) -> Arc<dyn LlmClient> {
        Arc::clone(&self.gateway) as Arc<dyn LlmClient>
    }

    /// Response cache statistics, part of `statistics()` (§6).
    #[must_use]
    pub fn cache_stats(&self) -> CacheStats {
        self.gateway.cache_stats()
    }

    /// Gateway call statistics, part of `statistics()` (§6).
    #[must_use]
    pub fn api_stats(&self) -> ApiStats {
        self.gateway.api_stats()
    }

    /// Derive an `Outcome` classification from a judge verdict and score,
    /// used when the caller wants only a coarse success/failure label.
    #[must_use]
    pub fn classify(score: f32, threshold: f32) -> Outcome {
        crate::controller::outcome_from_score(score, threshold)
    }
}
