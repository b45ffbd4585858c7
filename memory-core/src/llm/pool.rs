//! HTTP Pool: a persistent connection pool of fixed size, with per-call
//! `(connect, read)` timeouts (§4.5, §9 — "a single-value timeout is
//! insufficient and MUST be avoided").
//!
//! Grounded on the `reqwest::Client` request shape used for chat
//! completion calls elsewhere in the example corpus (bearer auth,
//! `.json(&payload)`, OpenAI-style `choices[0].message.content` response
//! parsing), adapted to this gateway's `LlmClient` trait and wrapped in a
//! `tokio::sync::Semaphore` to bound concurrent in-flight requests.

use super::{CompletionRequest, CompletionResponse, LlmClient, Message};
use crate::error::Error;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tokio::sync::Semaphore;

/// `(connect, read)` timeout pair. A single scalar timeout is explicitly
/// disallowed by §9.
#[derive(Debug, Clone, Copy)]
pub struct TimeoutPair {
    pub connect: Duration,
    pub read: Duration,
}

impl Default for TimeoutPair {
    fn default() -> Self {
        Self {
            connect: Duration::from_secs(10),
            read: Duration::from_secs(120),
        }
    }
}

/// Pool construction parameters.
#[derive(Debug, Clone)]
pub struct PoolConfig {
    pub endpoint: String,
    pub api_key: String,
    pub pool_size: usize,
    pub timeouts: TimeoutPair,
}

impl PoolConfig {
    /// Default pool size of 10, per §4.5.
    #[must_use]
    pub fn new(endpoint: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
            api_key: api_key.into(),
            pool_size: 10,
            timeouts: TimeoutPair::default(),
        }
    }
}

#[derive(Serialize)]
struct WireRequest<'a> {
    model: &'a str,
    messages: &'a [Message],
    temperature: f32,
    max_tokens: u32,
}

#[derive(Deserialize)]
struct WireResponse {
    choices: Vec<WireChoice>,
    usage: Option<WireUsage>,
}

#[derive(Deserialize)]
struct WireChoice {
    message: WireMessage,
}

#[derive(Deserialize)]
struct WireMessage {
    content: String,
}

#[derive(Deserialize)]
struct WireUsage {
    prompt_tokens: u64,
    completion_tokens: u64,
    #[serde(default)]
    reasoning_tokens: Option<u64>,
}

/// Production `LlmClient`: a pooled `reqwest::Client` dispatching to a
/// configurable completion endpoint, with a semaphore bounding concurrent
/// in-flight calls to `pool_size` (acquire/release is nonblocking unless
/// the pool is exhausted, per §5).
pub struct HttpLlmClient {
    http: reqwest::Client,
    endpoint: String,
    api_key: String,
    permits: Semaphore,
}

impl HttpLlmClient {
    /// Construct a client from `config`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ApiKey`] if `config.api_key` is empty — the gateway
    /// fails fast at initialization per §7 rather than at first call.
    pub fn new(config: PoolConfig) -> Result<Self, Error> {
        if config.api_key.trim().is_empty() {
            return Err(Error::ApiKey("no API credential configured".into()));
        }
        let http = reqwest::Client::builder()
            .connect_timeout(config.timeouts.connect)
            .timeout(config.timeouts.read)
            .build()
            .map_err(|e| Error::Transport(e.to_string()))?;
        Ok(Self {
            http,
            endpoint: config.endpoint,
            api_key: config.api_key,
            permits: Semaphore::new(config.pool_size),
        })
    }
}

#[async_trait]
impl LlmClient for HttpLlmClient {
    async fn complete(&self, request: &CompletionRequest) -> Result<CompletionResponse, Error> {
        let _permit = self
            .permits
            .acquire()
            .await
            .map_err(|_| Error::Transport("connection pool closed".into()))?;

        let wire = WireRequest {
            model: &request.model,
            messages: &request.messages,
            temperature: request.temperature,
            max_tokens: request.max_tokens,
        };

        let response = self
            .http
            .post(&self.endpoint)
            .bearer_auth(&self.api_key)
            .json(&wire)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() || e.is_connect() {
                    Error::Transport(e.to_string())
                } else {
                    Error::Llm(e.to_string())
                }
            })?;

        let status = response.status().as_u16();

        if status == 429 {
            let retry_after = response
                .headers()
                .get("retry-after")
                .and_then(|v| v.to_str().ok())
                .and_then(|v| v.parse::<u64>().ok());
            return Err(Error::RateLimited {
                retry_after_secs: retry_after,
            });
        }

        if Error::is_retryable_status(status) {
            return Err(Error::Transport(format!("endpoint returned {status}")));
        }

        if Error::is_terminal_status(status) {
            return Err(Error::Llm(format!("endpoint rejected request: {status}")));
        }

        if !response.status().is_success() {
            return Err(Error::Llm(format!("unexpected status {status}")));
        }

        let body: WireResponse = response
            .json()
            .await
            .map_err(|e| Error::Llm(format!("malformed completion response: {e}")))?;

        let text = body
            .choices
            .into_iter()
            .next()
            .map(|c| c.message.content)
            .ok_or_else(|| Error::Llm("completion response had no choices".into()))?;

        let usage = body.usage.unwrap_or(WireUsage {
            prompt_tokens: 0,
            completion_tokens: 0,
            reasoning_tokens: None,
        });

        Ok(CompletionResponse {
            text,
            prompt_tokens: usage.prompt_tokens,
            completion_tokens: usage.completion_tokens,
            reasoning_tokens: usage.reasoning_tokens,
        })
    }
}
