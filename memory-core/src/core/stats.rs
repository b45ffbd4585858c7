//! Aggregate statistics and retention-based cleanup (§4.1, §6).

use super::MemoryCore;
use crate::error::Result;
use crate::llm::cache::CacheStats;
use crate::llm::gateway::ApiStats;
use crate::store::TraceFilter;
use crate::types::Outcome;
use chrono::{DateTime, Utc};

/// `statistics(workspace?)` response (§4.1, §6): trace/memory counts,
/// success rate, and the gateway's cache/API statistics. Memory counts
/// are derived from `Trace::memory_items` rather than a separate store
/// count, since a Trace exclusively owns the Memories it extracts (§3) —
/// summing owned items is exact, not an approximation.
#[derive(Debug, Clone, Copy, Default)]
pub struct Statistics {
    pub traces: u64,
    pub memories: u64,
    pub success_rate: f32,
    pub cache: CacheStats,
    pub api: ApiStats,
}

/// `cleanup(retention_days, workspace?)` response (§4.1, §6).
#[derive(Debug, Clone, Copy)]
pub struct CleanupResult {
    pub deleted_traces: u64,
    pub deleted_memories: u64,
    pub freed_mb_est: f64,
    pub cutoff_ts: DateTime<Utc>,
}

/// Rough average serialized size (embedding + metadata) used only to
/// produce the `freed_mb_est` estimate named in §6 — not exact byte
/// accounting, which the store adapter does not expose.
const BYTES_PER_MEMORY_EST: u64 = 2048;

pub(super) async fn statistics(core: &MemoryCore, workspace_id: Option<&str>) -> Result<Statistics> {
    let filter = workspace_id.map_or_else(TraceFilter::default, TraceFilter::workspace);
    let traces = core.store_ref().scan_traces(&filter).await?;

    let memories: u64 = traces.iter().map(|t| t.memory_items.len() as u64).sum();
    let successes = traces.iter().filter(|t| t.outcome == Outcome::Success).count();
    let success_rate = if traces.is_empty() {
        0.0
    } else {
        #[allow(clippy::cast_precision_loss)]
        let rate = successes as f32 / traces.len() as f32;
        rate
    };

    Ok(Statistics {
        traces: traces.len() as u64,
        memories,
        success_rate,
        cache: core.cache_stats(),
        api: core.api_stats(),
    })
}

/// Deletes every Trace (and, by the store adapter's cascading delete, the
/// Memories it owns) older than `now - retention_days` (§4.1). The
/// pre-deletion scan supplies the `deleted_memories` count since the
/// adapter's `delete_traces` return value only counts trace rows.
pub(super) async fn cleanup(core: &MemoryCore, retention_days: u32, workspace_id: Option<&str>) -> Result<CleanupResult> {
    let cutoff = Utc::now() - chrono::Duration::days(i64::from(retention_days));
    let filter = workspace_id
        .map_or_else(TraceFilter::default, TraceFilter::workspace)
        .before(cutoff);

    let expiring = core.store_ref().scan_traces(&filter).await?;
    let deleted_memories: u64 = expiring.iter().map(|t| t.memory_items.len() as u64).sum();

    let deleted_traces = core.store_ref().delete_traces(&filter).await?;

    Ok(CleanupResult {
        deleted_traces,
        deleted_memories,
        freed_mb_est: (deleted_memories * BYTES_PER_MEMORY_EST) as f64 / 1_048_576.0,
        cutoff_ts: cutoff,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Difficulty, Memory, Trace};

    fn trace_with_memories(workspace: &str, outcome: Outcome, n: usize, age_days: i64) -> Trace {
        let mut trace = Trace::new(workspace.to_string(), "task".into());
        trace.created_at = Utc::now() - chrono::Duration::days(age_days);
        trace.outcome = outcome;
        trace.memory_items = (0..n)
            .map(|i| {
                Memory::new(
                    workspace.to_string(),
                    format!("m{i}"),
                    "d".into(),
                    "c".into(),
                    vec![0.1],
                    Difficulty::Simple,
                    "dom".into(),
                    outcome,
                )
            })
            .collect();
        trace
    }

    #[test]
    fn cleanup_cutoff_is_retention_days_before_now() {
        let cutoff_from_30 = Utc::now() - chrono::Duration::days(30);
        let trace = trace_with_memories("ws1", Outcome::Success, 1, 40);
        assert!(trace.created_at < cutoff_from_30);
        let trace_recent = trace_with_memories("ws1", Outcome::Success, 1, 1);
        assert!(trace_recent.created_at > cutoff_from_30);
    }
}
