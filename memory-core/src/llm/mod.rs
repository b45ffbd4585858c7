//! LLM Gateway (A): a pooled, retrying, cached dispatcher to an external
//! completion endpoint (§4.5). Every LLM invocation inside the controller,
//! MaTTS orchestrator, and judge flows through this module:
//! `cache.lookup -> on miss: retry-loop{ pool.post } -> cache.insert`.

pub mod cache;
pub mod gateway;
pub mod pool;
pub mod retry;

pub use gateway::Gateway;

use crate::error::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// One chat-style message in a completion request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Hash)]
pub struct Message {
    pub role: String,
    pub content: String,
}

/// Reasoning-effort hint passed to the endpoint, mirrored from the
/// external solve() opts (§6).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Hash)]
#[serde(rename_all = "lowercase")]
pub enum ReasoningEffort {
    Low,
    Medium,
    High,
}

/// A completion request as seen at the gateway boundary (§6: `complete`).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompletionRequest {
    pub model: String,
    pub messages: Vec<Message>,
    pub temperature: f32,
    pub max_tokens: u32,
    pub reasoning_effort: ReasoningEffort,
}

impl CompletionRequest {
    /// Whether this call is eligible for response caching: deterministic
    /// calls only (`temperature == 0`), per §4.5.
    #[must_use]
    pub fn is_deterministic(&self) -> bool {
        self.temperature == 0.0
    }
}

/// The endpoint's completion response.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompletionResponse {
    pub text: String,
    pub prompt_tokens: u64,
    pub completion_tokens: u64,
    pub reasoning_tokens: Option<u64>,
}

/// Transport-level contract to the completion endpoint, independent of
/// cache/retry/pool wiring. Production code composes an `LlmClient` impl
/// with [`cache::ResponseCache`] and [`retry::RetryPolicy`]; tests can
/// substitute a fake client directly.
#[async_trait]
pub trait LlmClient: Send + Sync {
    /// Issue one completion call.
    ///
    /// # Errors
    ///
    /// Returns [`crate::error::Error::Llm`], [`crate::error::Error::RateLimited`],
    /// or [`crate::error::Error::Transport`] depending on failure mode.
    async fn complete(&self, request: &CompletionRequest) -> Result<CompletionResponse>;
}
