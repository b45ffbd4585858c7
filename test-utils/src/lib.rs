//! Shared test fixtures for `memory-core` and its storage backends: an
//! in-memory `MemoryStore`, a scripted `LlmClient`, and builders for
//! `Memory`/`Trace` test data.

use async_trait::async_trait;
use memory_core::error::Result;
use memory_core::llm::{CompletionRequest, CompletionResponse, LlmClient};
use memory_core::store::{AnnHit, Filter, MemoryStore, TraceFilter};
use memory_core::types::{Difficulty, Memory, Outcome, Trace};
use std::collections::VecDeque;
use std::sync::Mutex;
use uuid::Uuid;

/// Build a root Memory with a deterministic embedding derived from
/// `title`, for workspace-isolation and genealogy fixtures.
#[must_use]
pub fn memory_fixture(workspace_id: &str, title: &str, domain: &str, outcome: Outcome) -> Memory {
    Memory::new(
        workspace_id.to_string(),
        title.to_string(),
        format!("description of {title}"),
        format!("content of {title}"),
        vec![0.1, 0.2, 0.3],
        Difficulty::Simple,
        domain.to_string(),
        outcome,
    )
}

/// A `Memory` derived from one or more parents, for genealogy fixtures
/// (§3, §4.6, Scenario S7).
#[must_use]
pub fn derived_memory_fixture(workspace_id: &str, title: &str, parents: &[Uuid]) -> Memory {
    let mut memory = memory_fixture(workspace_id, title, "dom", Outcome::Success);
    memory.derived_from = parents.to_vec();
    memory
}

/// An in-process `MemoryStore` backed by a `Mutex<Vec<Memory>>` /
/// `Mutex<Vec<Trace>>`, for tests that need the full `MemoryCore` facade
/// without a real backend. `ann_query` ranks by cosine distance over
/// dense `f32` vectors — adequate for small fixture sets, not a
/// production ANN index.
#[derive(Default)]
pub struct InMemoryStore {
    memories: Mutex<Vec<Memory>>,
    traces: Mutex<Vec<Trace>>,
}

impl InMemoryStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn seeded(memories: Vec<Memory>) -> Self {
        Self { memories: Mutex::new(memories), traces: Mutex::new(Vec::new()) }
    }
}

fn cosine_distance(a: &[f32], b: &[f32]) -> f32 {
    let len = a.len().min(b.len());
    if len == 0 {
        return 1.0;
    }
    let dot: f32 = a[..len].iter().zip(&b[..len]).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a[..len].iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b[..len].iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm_a == 0.0 || norm_b == 0.0 {
        return 1.0;
    }
    1.0 - (dot / (norm_a * norm_b))
}

#[async_trait]
impl MemoryStore for InMemoryStore {
    async fn upsert(&self, records: Vec<Memory>) -> Result<()> {
        let mut guard = self.memories.lock().expect("memories mutex poisoned");
        for record in records {
            guard.retain(|m| m.id != record.id);
            guard.push(record);
        }
        Ok(())
    }

    async fn ann_query(&self, embedding: &[f32], k: usize, filter: &Filter) -> Result<Vec<AnnHit>> {
        let guard = self.memories.lock().expect("memories mutex poisoned");
        let mut hits: Vec<AnnHit> = guard
            .iter()
            .filter(|m| filter.matches(m))
            .map(|m| AnnHit { id: m.id, distance: cosine_distance(embedding, &m.vec), memory: m.clone() })
            .collect();
        hits.sort_by(|a, b| a.distance.partial_cmp(&b.distance).unwrap_or(std::cmp::Ordering::Equal));
        hits.truncate(k);
        Ok(hits)
    }

    async fn scan(&self, filter: &Filter) -> Result<Vec<Memory>> {
        let guard = self.memories.lock().expect("memories mutex poisoned");
        Ok(guard.iter().filter(|m| filter.matches(m)).cloned().collect())
    }

    async fn delete(&self, filter: &Filter) -> Result<u64> {
        let mut guard = self.memories.lock().expect("memories mutex poisoned");
        let before = guard.len();
        guard.retain(|m| !filter.matches(m));
        Ok((before - guard.len()) as u64)
    }

    async fn count(&self, filter: &Filter) -> Result<u64> {
        let guard = self.memories.lock().expect("memories mutex poisoned");
        Ok(guard.iter().filter(|m| filter.matches(m)).count() as u64)
    }

    async fn upsert_trace(&self, trace: &Trace) -> Result<()> {
        let mut guard = self.traces.lock().expect("traces mutex poisoned");
        guard.retain(|t| t.trace_id != trace.trace_id);
        guard.push(trace.clone());
        Ok(())
    }

    async fn scan_traces(&self, filter: &TraceFilter) -> Result<Vec<Trace>> {
        let guard = self.traces.lock().expect("traces mutex poisoned");
        Ok(guard.iter().filter(|t| filter.matches(t)).cloned().collect())
    }

    async fn delete_traces(&self, filter: &TraceFilter) -> Result<u64> {
        let mut guard = self.traces.lock().expect("traces mutex poisoned");
        let before = guard.len();
        guard.retain(|t| !filter.matches(t));
        Ok((before - guard.len()) as u64)
    }
}

/// A queued `LlmClient` test double: each call pops the next scripted
/// response, repeating the last one once the queue is drained. Used to
/// drive the controller/MaTTS/judge through deterministic Think →
/// Evaluate (→ Refine) → Judge sequences without a network call.
pub struct ScriptedLlmClient {
    responses: Mutex<VecDeque<CompletionResponse>>,
    last: Mutex<Option<CompletionResponse>>,
}

impl ScriptedLlmClient {
    #[must_use]
    pub fn new(responses: Vec<CompletionResponse>) -> Self {
        Self { responses: Mutex::new(responses.into()), last: Mutex::new(None) }
    }

    /// A scripted response carrying `text`, with token counts fixed at 10
    /// prompt / 10 completion tokens.
    #[must_use]
    pub fn text(text: impl Into<String>) -> CompletionResponse {
        CompletionResponse { text: text.into(), prompt_tokens: 10, completion_tokens: 10, reasoning_tokens: None }
    }
}

#[async_trait]
impl LlmClient for ScriptedLlmClient {
    async fn complete(&self, _request: &CompletionRequest) -> Result<CompletionResponse> {
        let mut queue = self.responses.lock().expect("responses mutex poisoned");
        let response = queue.pop_front();
        drop(queue);

        let response = match response {
            Some(r) => {
                *self.last.lock().expect("last mutex poisoned") = Some(r.clone());
                r
            }
            None => self.last.lock().expect("last mutex poisoned").clone().unwrap_or_else(|| ScriptedLlmClient::text("")),
        };
        Ok(response)
    }
}

/// A scripted judge response body, fenced in ` ```json ` the way a real
/// completion endpoint commonly returns structured output.
#[must_use]
pub fn judge_response_json(verdict: &str, score: f32, learnings_json: &str) -> String {
    format!(
        "```json\n{{\"verdict\": \"{verdict}\", \"score\": {score}, \"reasoning\": \"looks correct\", \"learnings\": {learnings_json}}}\n```"
    )
}
