//! The composed gateway: every LLM invocation inside the controller,
//! MaTTS orchestrator, and judge flows through one `Gateway` instance,
//! which implements `LlmClient` itself by wrapping
//! `cache.lookup -> on miss: retry-loop{ pool.post } -> cache.insert`
//! (§2, §4.5, §5 "Retry ordering with cache").

use super::cache::{CacheStats, ResponseCache};
use super::retry::{RetryConfig, RetryMetrics, RetryPolicy};
use super::{CompletionRequest, CompletionResponse, LlmClient};
use crate::error::Result;
use async_trait::async_trait;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Instant;

/// Point-in-time snapshot of gateway-level call statistics (§6:
/// `statistics().api`).
#[derive(Debug, Clone, Copy, Default)]
pub struct ApiStats {
    pub calls: u64,
    pub errors: u64,
    pub avg_latency_ms: f64,
}

#[derive(Default)]
struct ApiMetrics {
    calls: AtomicU64,
    errors: AtomicU64,
    total_latency_micros: AtomicU64,
}

impl ApiMetrics {
    fn record(&self, elapsed: std::time::Duration, succeeded: bool) {
        self.calls.fetch_add(1, Ordering::Relaxed);
        if !succeeded {
            self.errors.fetch_add(1, Ordering::Relaxed);
        }
        #[allow(clippy::cast_possible_truncation)]
        self.total_latency_micros.fetch_add(elapsed.as_micros() as u64, Ordering::Relaxed);
    }

    fn stats(&self) -> ApiStats {
        let calls = self.calls.load(Ordering::Relaxed);
        let errors = self.errors.load(Ordering::Relaxed);
        let total_micros = self.total_latency_micros.load(Ordering::Relaxed);
        let avg_latency_ms = if calls == 0 {
            0.0
        } else {
            (total_micros as f64 / calls as f64) / 1_000.0
        };
        ApiStats {
            calls,
            errors,
            avg_latency_ms,
        }
    }
}

/// The LLM Gateway (A): composes the response cache (C), retry policy
/// (B), and a pooled transport client into a single `LlmClient`
/// implementation. Every caller — the iterative controller, the MaTTS
/// orchestrator, the judge — depends only on `LlmClient`, so none of them
/// can accidentally bypass caching or retry by holding the raw transport
/// client directly.
pub struct Gateway {
    transport: Arc<dyn LlmClient>,
    cache: Arc<ResponseCache>,
    retry: RetryPolicy,
    retry_metrics: RetryMetrics,
    api_metrics: ApiMetrics,
}

impl Gateway {
    #[must_use]
    pub fn new(transport: Arc<dyn LlmClient>, cache: Arc<ResponseCache>) -> Self {
        Self::with_retry_config(transport, cache, RetryConfig::default())
    }

    #[must_use]
    pub fn with_retry_config(transport: Arc<dyn LlmClient>, cache: Arc<ResponseCache>, retry_config: RetryConfig) -> Self {
        Self {
            transport,
            cache,
            retry: RetryPolicy::new(retry_config),
            retry_metrics: RetryMetrics::new(),
            api_metrics: ApiMetrics::default(),
        }
    }

    #[must_use]
    pub fn cache_stats(&self) -> CacheStats {
        self.cache.stats()
    }

    #[must_use]
    pub fn api_stats(&self) -> ApiStats {
        self.api_metrics.stats()
    }

    #[must_use]
    pub fn retry_attempts(&self) -> u64 {
        self.retry_metrics.attempts()
    }
}

#[async_trait]
impl LlmClient for Gateway {
    async fn complete(&self, request: &CompletionRequest) -> Result<CompletionResponse> {
        if let Some(cached) = self.cache.get(request) {
            return Ok(cached);
        }

        let start = Instant::now();
        let result = self
            .retry
            .execute(&self.retry_metrics, || self.transport.complete(request))
            .await;
        self.api_metrics.record(start.elapsed(), result.is_ok());

        if let Ok(response) = &result {
            self.cache.put(request, response.clone());
        }

        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::{Message, ReasoningEffort};
    use std::sync::atomic::AtomicU32;

    struct CountingClient {
        calls: AtomicU32,
        fail_first_n: u32,
    }

    #[async_trait]
    impl LlmClient for CountingClient {
        async fn complete(&self, _request: &CompletionRequest) -> Result<CompletionResponse> {
            let n = self.calls.fetch_add(1, Ordering::Relaxed);
            if n < self.fail_first_n {
                return Err(crate::error::Error::Transport("simulated".into()));
            }
            Ok(CompletionResponse {
                text: "ok".into(),
                prompt_tokens: 1,
                completion_tokens: 1,
                reasoning_tokens: None,
            })
        }
    }

    fn request(temperature: f32) -> CompletionRequest {
        CompletionRequest {
            model: "m".into(),
            messages: vec![Message {
                role: "user".into(),
                content: "hi".into(),
            }],
            temperature,
            max_tokens: 10,
            reasoning_effort: ReasoningEffort::Medium,
        }
    }

    #[tokio::test]
    async fn second_identical_deterministic_call_is_a_cache_hit() {
        let transport = Arc::new(CountingClient {
            calls: AtomicU32::new(0),
            fail_first_n: 0,
        });
        let gateway = Gateway::new(transport.clone(), Arc::new(ResponseCache::new()));

        let req = request(0.0);
        gateway.complete(&req).await.unwrap();
        gateway.complete(&req).await.unwrap();

        assert_eq!(transport.calls.load(Ordering::Relaxed), 1);
        assert_eq!(gateway.cache_stats().hits, 1);
    }

    #[tokio::test]
    async fn retries_through_gateway_then_caches_final_success() {
        let transport = Arc::new(CountingClient {
            calls: AtomicU32::new(0),
            fail_first_n: 2,
        });
        let gateway = Gateway::with_retry_config(
            transport.clone(),
            Arc::new(ResponseCache::new()),
            RetryConfig::default().with_base_delay(std::time::Duration::from_millis(1)),
        );

        let req = request(0.0);
        let result = gateway.complete(&req).await;
        assert!(result.is_ok());
        assert_eq!(transport.calls.load(Ordering::Relaxed), 3);

        gateway.complete(&req).await.unwrap();
        assert_eq!(transport.calls.load(Ordering::Relaxed), 3, "second call should hit cache, not transport");
        assert_eq!(gateway.cache_stats().hits, 1);
    }
}
