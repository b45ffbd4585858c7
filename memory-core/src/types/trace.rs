//! Trace and trajectory types, plus the LLM-level cache entry (§3, §4.5).

use super::memory::{Memory, Outcome};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::time::Instant;
use uuid::Uuid;

/// The kind of reasoning step recorded in a trajectory.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TrajectoryKind {
    Think,
    Evaluate,
    Refine,
    Judge,
}

/// A single step in a reasoning trajectory.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrajectoryStep {
    pub iteration: u32,
    pub kind: TrajectoryKind,
    pub content: String,
    pub score: Option<f32>,
    pub feedback: Option<String>,
    pub timestamp: DateTime<Utc>,
    pub tokens: u64,
}

impl TrajectoryStep {
    #[must_use]
    pub fn new(iteration: u32, kind: TrajectoryKind, content: String, tokens: u64) -> Self {
        Self {
            iteration,
            kind,
            content,
            score: None,
            feedback: None,
            timestamp: Utc::now(),
            tokens,
        }
    }

    #[must_use]
    pub fn with_score(mut self, score: f32) -> Self {
        self.score = Some(score);
        self
    }

    #[must_use]
    pub fn with_feedback(mut self, feedback: String) -> Self {
        self.feedback = Some(feedback);
        self
    }

    /// Normalized content used for loop-detection hashing: lowercase,
    /// whitespace-collapsed.
    #[must_use]
    pub fn normalized_content(&self) -> String {
        self.content.split_whitespace().collect::<Vec<_>>().join(" ").to_lowercase()
    }
}

/// Metadata recorded alongside a trace: model, effort, MaTTS params,
/// iteration count, cumulative tokens.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TraceMetadata {
    pub model: Option<String>,
    pub reasoning_effort: Option<String>,
    pub matts_k: Option<u32>,
    pub matts_mode: Option<String>,
    pub iteration_count: u32,
    pub cumulative_tokens: u64,
    pub extra: Value,
}

/// A single reasoning attempt, created by the controller on request entry,
/// appended-to on each step, and sealed by the memory core at `store`
/// (§3). Never mutated thereafter.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Trace {
    pub trace_id: Uuid,
    pub workspace_id: String,
    pub task: String,
    pub trajectory: Vec<TrajectoryStep>,
    pub outcome: Outcome,
    pub final_score: f32,
    pub metadata: TraceMetadata,
    pub parent_trace_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub memory_items: Vec<Memory>,
}

impl Trace {
    #[must_use]
    pub fn new(workspace_id: String, task: String) -> Self {
        Self {
            trace_id: Uuid::new_v4(),
            workspace_id,
            task,
            trajectory: Vec::new(),
            outcome: Outcome::Partial,
            final_score: 0.0,
            metadata: TraceMetadata::default(),
            parent_trace_id: None,
            created_at: Utc::now(),
            memory_items: Vec::new(),
        }
    }

    pub fn push_step(&mut self, step: TrajectoryStep) {
        self.metadata.cumulative_tokens += step.tokens;
        self.metadata.iteration_count = self.metadata.iteration_count.max(step.iteration + 1);
        self.trajectory.push(step);
    }

    pub fn seal(&mut self, outcome: Outcome, final_score: f32, memory_items: Vec<Memory>) {
        self.outcome = outcome;
        self.final_score = final_score;
        self.memory_items = memory_items;
    }
}

/// Entry stored by the LLM response cache: the cached value plus LRU/TTL
/// bookkeeping timestamps (§4.5, §3).
#[derive(Debug, Clone)]
pub struct CacheEntry<V> {
    pub key: u64,
    pub value: V,
    pub inserted_at: Instant,
    pub last_access: Instant,
}

impl<V> CacheEntry<V> {
    #[must_use]
    pub fn new(key: u64, value: V) -> Self {
        let now = Instant::now();
        Self {
            key,
            value,
            inserted_at: now,
            last_access: now,
        }
    }

    #[must_use]
    pub fn is_expired(&self, ttl: std::time::Duration) -> bool {
        self.inserted_at.elapsed() > ttl
    }

    pub fn touch(&mut self) {
        self.last_access = Instant::now();
    }
}
