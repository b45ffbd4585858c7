//! Composite Scorer (E): fuses semantic similarity, recency decay, and
//! error-context boost into a single ranking score (§4.2).
//!
//! ```text
//! recency(m)     = exp(-(t - m.timestamp_days) / HALFLIFE_DAYS)
//! error_boost(m) = BOOST if m.error_context present else 1.0
//! composite(m)   = w_sim*s + w_rec*recency(m) + w_err*error_boost(m)
//! ```
//!
//! All three components are clamped to `[0,1]` before weighting. Clamping
//! `error_boost(m)` directly would send both the `BOOST` (e.g. `1.2`) and
//! `1.0` branches to the same ceiling, erasing the boost entirely — so the
//! `[0,1]`-normalized component is `1.0` for an error-context memory and
//! `1.0/BOOST` for its non-error twin, which clamps cleanly while
//! preserving the `BOOST`-to-one ratio between them. The scorer is
//! ordinal, not probabilistic — weights need not sum to 1.

use crate::store::AnnHit;
use chrono::{DateTime, Utc};
use uuid::Uuid;

/// Tunable weights and constants for the composite scorer. Defaults match
/// §4.2 exactly.
#[derive(Debug, Clone, Copy)]
pub struct ScoringConfig {
    pub w_sim: f32,
    pub w_rec: f32,
    pub w_err: f32,
    pub halflife_days: f32,
    pub error_boost: f32,
}

impl Default for ScoringConfig {
    fn default() -> Self {
        Self {
            w_sim: 0.6,
            w_rec: 0.3,
            w_err: 0.1,
            halflife_days: 30.0,
            error_boost: 1.2,
        }
    }
}

/// A scored Memory annotated with its three component scores, as required
/// by §4.2 ("Output is a stably-sorted top-n of Memories annotated with
/// their three component scores").
#[derive(Debug, Clone)]
pub struct ScoredMemory {
    pub hit: AnnHit,
    pub similarity: f32,
    pub recency: f32,
    pub error_boost: f32,
    pub composite: f32,
}

/// Clamp a raw score into `[0,1]`, as mandated before weighting.
fn clamp01(x: f32) -> f32 {
    x.clamp(0.0, 1.0)
}

/// `recency(m)` per §4.2: exponential decay over age in days.
#[must_use]
pub fn recency(timestamp: DateTime<Utc>, now: DateTime<Utc>, halflife_days: f32) -> f32 {
    let age_days = (now - timestamp).num_seconds().max(0) as f32 / 86_400.0;
    clamp01((-age_days / halflife_days).exp())
}

/// `error_boost(m)` per §4.2, normalized into `[0,1]` before `clamp01`
/// ever sees it: an error-context Memory scores `1.0` and its non-error
/// twin scores `1.0/boost`, so the ratio between them is exactly `boost`
/// instead of both saturating at the same clamp ceiling.
#[must_use]
pub fn error_boost_raw(has_error_context: bool, boost: f32) -> f32 {
    if has_error_context {
        1.0
    } else if boost > 0.0 {
        1.0 / boost
    } else {
        1.0
    }
}

/// Rank a set of ANN hits by composite score, returning the top `n`.
///
/// Ties are broken by `timestamp` descending, then by UUID lexicographic
/// order, per §4.2.
#[must_use]
pub fn rank(hits: Vec<AnnHit>, now: DateTime<Utc>, n: usize, config: &ScoringConfig) -> Vec<ScoredMemory> {
    let mut scored: Vec<ScoredMemory> = hits
        .into_iter()
        .map(|hit| score_one(hit, now, config))
        .collect();

    scored.sort_by(|a, b| {
        b.composite
            .partial_cmp(&a.composite)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then_with(|| b.hit.memory.timestamp.cmp(&a.hit.memory.timestamp))
            .then_with(|| tie_break_id(&a.hit.id).cmp(&tie_break_id(&b.hit.id)))
    });

    scored.truncate(n);
    scored
}

fn tie_break_id(id: &Uuid) -> String {
    id.to_string()
}

fn score_one(hit: AnnHit, now: DateTime<Utc>, config: &ScoringConfig) -> ScoredMemory {
    // `distance` from the store is assumed to already be a [0,1]-normalized
    // cosine similarity (see `embedding::cosine_similarity`); store adapters
    // that use a different metric are responsible for normalizing before
    // they populate `AnnHit::distance`.
    let similarity = clamp01(1.0 - hit.distance.clamp(0.0, 1.0));
    let rec = recency(hit.memory.timestamp, now, config.halflife_days);
    let err = clamp01(error_boost_raw(hit.memory.is_error_context(), config.error_boost));

    let composite = config.w_sim * similarity + config.w_rec * rec + config.w_err * err;

    ScoredMemory {
        hit,
        similarity,
        recency: rec,
        error_boost: err,
        composite,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Difficulty, ErrorContext, Memory, Outcome};
    use chrono::Duration;

    fn hit(distance: f32, age_days: i64, error_context: bool, now: DateTime<Utc>) -> AnnHit {
        let mut memory = Memory::new(
            "ws1".into(),
            "t".into(),
            "d".into(),
            "c".into(),
            vec![0.1, 0.2],
            Difficulty::Simple,
            "dom".into(),
            Outcome::Success,
        );
        memory.timestamp = now - Duration::days(age_days);
        if error_context {
            memory.error_context = Some(ErrorContext {
                error_type: "off_by_one".into(),
                failure_pattern: "p".into(),
                corrective_guidance: "g".into(),
            });
        }
        AnnHit {
            id: memory.id,
            distance,
            memory,
        }
    }

    #[test]
    fn components_are_bounded_and_composite_matches_formula() {
        let now = Utc::now();
        let config = ScoringConfig::default();
        let h = hit(0.2, 5, true, now);
        let scored = score_one(h, now, &config);
        assert!((0.0..=1.0).contains(&scored.similarity));
        assert!((0.0..=1.0).contains(&scored.recency));
        assert!((0.0..=1.0).contains(&scored.error_boost));
        let expected = config.w_sim * scored.similarity
            + config.w_rec * scored.recency
            + config.w_err * scored.error_boost;
        assert!((scored.composite - expected).abs() < 1e-6);
    }

    #[test]
    fn error_context_boosts_composite_relative_to_twin() {
        let now = Utc::now();
        let config = ScoringConfig::default();
        let with_err = score_one(hit(0.2, 5, true, now), now, &config);
        let without_err = score_one(hit(0.2, 5, false, now), now, &config);
        assert!(with_err.composite > without_err.composite);
        assert!(with_err.error_boost >= 1.2 * without_err.error_boost - 1e-6);
    }

    #[test]
    fn recency_monotonic_newer_beats_older_at_equal_similarity() {
        let now = Utc::now();
        let config = ScoringConfig::default();
        let newer = score_one(hit(0.3, 1, false, now), now, &config);
        let older = score_one(hit(0.3, 60, false, now), now, &config);
        assert!(newer.composite >= older.composite);
    }

    #[test]
    fn rank_truncates_to_n_and_sorts_descending() {
        let now = Utc::now();
        let hits = vec![hit(0.9, 100, false, now), hit(0.1, 1, false, now), hit(0.5, 10, false, now)];
        let ranked = rank(hits, now, 2, &ScoringConfig::default());
        assert_eq!(ranked.len(), 2);
        assert!(ranked[0].composite >= ranked[1].composite);
    }
}
