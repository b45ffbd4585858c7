//! Response Cache (C): LRU+TTL cache keyed on `(model, messages, params)`,
//! bypassing non-deterministic calls entirely (§4.5).
//!
//! Grounded on the same `lru::LruCache` + `Arc<RwLock<_>>` structure the
//! retrieval-side query cache uses elsewhere in this codebase: eviction is
//! strict LRU on `last_access`, O(1) per lookup/insert via the `lru`
//! crate's intrusive doubly-linked-list implementation (§9: "naive
//! scan-for-oldest is a known defect").

use super::{CompletionRequest, CompletionResponse};
use crate::types::CacheEntry;
use lru::LruCache;
use sha2::{Digest, Sha256};
use std::num::NonZeroUsize;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::RwLock;
use std::time::Duration;

/// Default maximum number of cached responses (§4.5).
pub const DEFAULT_MAX_SIZE: usize = 100;
/// Default time-to-live for a cached response, in seconds (§4.5).
pub const DEFAULT_TTL_SECS: u64 = 3_600;

/// Point-in-time snapshot of cache statistics (§4.5, §6).
#[derive(Debug, Clone, Copy, Default)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
    pub bypassed: u64,
    pub evictions: u64,
}

impl CacheStats {
    #[must_use]
    pub fn hit_rate(&self) -> f32 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            self.hits as f32 / total as f32
        }
    }
}

#[derive(Default)]
struct Counters {
    hits: AtomicU64,
    misses: AtomicU64,
    bypassed: AtomicU64,
    evictions: AtomicU64,
}

/// LRU+TTL response cache. Shared across requests via `Arc`; internal
/// state is protected so concurrent lookups/insertions never corrupt the
/// structure (§5).
pub struct ResponseCache {
    entries: RwLock<LruCache<u64, CacheEntry<CompletionResponse>>>,
    ttl: Duration,
    counters: Counters,
}

impl ResponseCache {
    /// Construct a cache with the §4.5 defaults: `max_size=100`,
    /// `ttl_seconds=3600`.
    #[must_use]
    pub fn new() -> Self {
        Self::with_capacity_and_ttl(DEFAULT_MAX_SIZE, Duration::from_secs(DEFAULT_TTL_SECS))
    }

    #[must_use]
    pub fn with_capacity_and_ttl(capacity: usize, ttl: Duration) -> Self {
        let capacity = NonZeroUsize::new(capacity).unwrap_or(NonZeroUsize::new(1).unwrap());
        Self {
            entries: RwLock::new(LruCache::new(capacity)),
            ttl,
            counters: Counters::default(),
        }
    }

    /// Deterministic SHA-256 key over `(model, canonical_messages_json,
    /// sorted_kwargs, temperature)` (§4.5). `messages` are hashed via their
    /// derived `Hash` impl rather than re-serialized JSON, which is
    /// equivalent for the purpose of key stability and avoids a
    /// `serde_json::to_string` allocation per lookup.
    #[must_use]
    pub fn key_for(request: &CompletionRequest) -> u64 {
        use std::hash::{Hash, Hasher};
        // Mix a SHA-256 of the stable fields into a u64 key, matching the
        // spec's "SHA-256 over the tuple" while keeping the in-memory index
        // a u64 (consistent with the LRU map's key type).
        let mut hasher = Sha256::new();
        hasher.update(request.model.as_bytes());
        for m in &request.messages {
            hasher.update(m.role.as_bytes());
            hasher.update(m.content.as_bytes());
        }
        hasher.update(request.temperature.to_bits().to_le_bytes());
        hasher.update(request.max_tokens.to_le_bytes());
        let digest = hasher.finalize();
        let mut std_hasher = std::collections::hash_map::DefaultHasher::new();
        digest[..16].hash(&mut std_hasher);
        std_hasher.finish()
    }

    /// Look up a cached response. Non-deterministic requests always miss
    /// and increment `bypassed`, never touching the lookup structure
    /// (§4.5 caching policy).
    #[must_use]
    pub fn get(&self, request: &CompletionRequest) -> Option<CompletionResponse> {
        if !request.is_deterministic() {
            self.counters.bypassed.fetch_add(1, Ordering::Relaxed);
            return None;
        }

        let key = Self::key_for(request);
        let mut entries = self.entries.write().expect("response cache lock poisoned");

        let Some(entry) = entries.get_mut(&key) else {
            drop(entries);
            self.counters.misses.fetch_add(1, Ordering::Relaxed);
            return None;
        };

        if entry.is_expired(self.ttl) {
            entries.pop(&key);
            drop(entries);
            self.counters.misses.fetch_add(1, Ordering::Relaxed);
            self.counters.evictions.fetch_add(1, Ordering::Relaxed);
            return None;
        }

        entry.touch();
        let value = entry.value.clone();
        drop(entries);
        self.counters.hits.fetch_add(1, Ordering::Relaxed);
        Some(value)
    }

    /// Insert a response. Non-deterministic requests are never inserted
    /// (§4.5).
    pub fn put(&self, request: &CompletionRequest, response: CompletionResponse) {
        if !request.is_deterministic() {
            return;
        }
        let key = Self::key_for(request);
        let mut entries = self.entries.write().expect("response cache lock poisoned");
        let evicted_before = entries.len() == entries.cap().get() && !entries.contains(&key);
        entries.put(key, CacheEntry::new(key, response));
        if evicted_before {
            self.counters.evictions.fetch_add(1, Ordering::Relaxed);
        }
    }

    /// Current statistics snapshot.
    #[must_use]
    pub fn stats(&self) -> CacheStats {
        CacheStats {
            hits: self.counters.hits.load(Ordering::Relaxed),
            misses: self.counters.misses.load(Ordering::Relaxed),
            bypassed: self.counters.bypassed.load(Ordering::Relaxed),
            evictions: self.counters.evictions.load(Ordering::Relaxed),
        }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.read().expect("response cache lock poisoned").len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for ResponseCache {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::{Message, ReasoningEffort};

    fn request(temperature: f32, content: &str) -> CompletionRequest {
        CompletionRequest {
            model: "test-model".into(),
            messages: vec![Message {
                role: "user".into(),
                content: content.into(),
            }],
            temperature,
            max_tokens: 100,
            reasoning_effort: ReasoningEffort::Medium,
        }
    }

    fn response(text: &str) -> CompletionResponse {
        CompletionResponse {
            text: text.into(),
            prompt_tokens: 10,
            completion_tokens: 5,
            reasoning_tokens: None,
        }
    }

    #[test]
    fn deterministic_hit_increments_hits() {
        let cache = ResponseCache::new();
        let req = request(0.0, "hello");
        assert!(cache.get(&req).is_none());
        cache.put(&req, response("world"));
        assert_eq!(cache.get(&req).unwrap().text, "world");
        let stats = cache.stats();
        assert_eq!(stats.hits, 1);
        assert_eq!(stats.misses, 1);
    }

    #[test]
    fn non_deterministic_calls_bypass_cache() {
        let cache = ResponseCache::new();
        let req = request(0.7, "hello");
        cache.put(&req, response("world"));
        assert!(cache.is_empty());
        assert!(cache.get(&req).is_none());
        assert_eq!(cache.stats().bypassed, 2);
    }

    #[test]
    fn expired_entries_are_treated_as_misses() {
        let cache = ResponseCache::with_capacity_and_ttl(10, Duration::from_millis(0));
        let req = request(0.0, "hello");
        cache.put(&req, response("world"));
        std::thread::sleep(Duration::from_millis(5));
        assert!(cache.get(&req).is_none());
    }

    #[test]
    fn lru_evicts_oldest_on_overflow() {
        let cache = ResponseCache::with_capacity_and_ttl(2, Duration::from_secs(60));
        let k1 = request(0.0, "one");
        let k2 = request(0.0, "two");
        let k3 = request(0.0, "three");
        cache.put(&k1, response("1"));
        cache.put(&k2, response("2"));
        // touch k1 so k2 becomes the least-recently-used entry
        assert!(cache.get(&k1).is_some());
        cache.put(&k3, response("3"));
        assert!(cache.get(&k2).is_none());
        assert!(cache.get(&k1).is_some());
        assert!(cache.get(&k3).is_some());
    }
}
