//! Embedding interface: `embed(text) -> vector<float, D>`, treated as a
//! pure, deterministic function (§1, §6). This module provides the trait
//! boundary plus a deterministic hash-based test double; production
//! embedding models are external collaborators.

use crate::error::{Error, Result};
use async_trait::async_trait;

/// A pure, deterministic text-to-vector embedding function. `D` (the
/// embedding dimension) is fixed at construction and reported by
/// `dimension()`.
#[async_trait]
pub trait Embedder: Send + Sync {
    /// Embed a single text into a fixed-dimension vector.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Embedding`] if the underlying model/call fails.
    async fn embed(&self, text: &str) -> Result<Vec<f32>>;

    /// Embed a batch of texts. The default implementation calls `embed`
    /// sequentially; implementations backed by a batching API should
    /// override this.
    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        let mut out = Vec::with_capacity(texts.len());
        for text in texts {
            out.push(self.embed(text).await?);
        }
        Ok(out)
    }

    /// The fixed output dimension `D`.
    fn dimension(&self) -> usize;
}

/// Deterministic, dependency-free embedder used in tests and local
/// development: hashes overlapping character shingles into a
/// fixed-dimension vector and L2-normalizes it. Not semantically
/// meaningful, but stable — identical input always yields an identical
/// vector, which is what the memory-immutability property (§8.3) and the
/// `retrieve` tests require.
pub struct HashEmbedder {
    dimension: usize,
}

impl HashEmbedder {
    #[must_use]
    pub fn new(dimension: usize) -> Self {
        Self { dimension }
    }
}

#[async_trait]
impl Embedder for HashEmbedder {
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        if text.is_empty() {
            return Err(Error::Embedding("cannot embed empty text".into()));
        }
        let mut v = vec![0f32; self.dimension];
        let bytes = text.as_bytes();
        let shingle = 3usize.min(bytes.len());
        for window in bytes.windows(shingle.max(1)) {
            let h = fnv1a(window);
            let idx = (h as usize) % self.dimension;
            v[idx] += 1.0;
        }
        Ok(normalize(&v))
    }

    fn dimension(&self) -> usize {
        self.dimension
    }
}

fn fnv1a(bytes: &[u8]) -> u64 {
    let mut hash: u64 = 0xcbf2_9ce4_8422_2325;
    for &b in bytes {
        hash ^= u64::from(b);
        hash = hash.wrapping_mul(0x0000_0100_0000_01b3);
    }
    hash
}

/// L2-normalize a vector in place semantics (returns a new vector).
#[must_use]
pub fn normalize(v: &[f32]) -> Vec<f32> {
    let norm = v.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm <= f32::EPSILON {
        return v.to_vec();
    }
    v.iter().map(|x| x / norm).collect()
}

/// Cosine similarity between two vectors, normalized to `[0, 1]` as
/// required by the composite scorer (§4.2): raw cosine lies in `[-1, 1]`,
/// so the result is rescaled as `(cos + 1) / 2`.
///
/// Returns `0.0` for mismatched dimensions or zero vectors rather than
/// panicking, since the scorer must clamp to `[0,1]` unconditionally.
#[must_use]
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() || a.is_empty() {
        return 0.0;
    }
    let dot: f32 = a.iter().zip(b).map(|(x, y)| x * y).sum();
    let norm_a = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b = b.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm_a <= f32::EPSILON || norm_b <= f32::EPSILON {
        return 0.0;
    }
    let cos = (dot / (norm_a * norm_b)).clamp(-1.0, 1.0);
    ((cos + 1.0) / 2.0).clamp(0.0, 1.0)
}
