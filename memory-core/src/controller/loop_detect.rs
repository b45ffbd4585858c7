//! Trajectory-hash loop detection (§4.3): a stable hash of
//! `(kind, normalized content)` is computed for each step; if the same
//! hash recurs at the same `kind` within a request, the controller
//! terminates with `loop_detected=true`.

use crate::error::Result;
use crate::types::{TrajectoryKind, TrajectoryStep};
use std::collections::HashMap;
use std::hash::{Hash, Hasher};

/// Tracks seen `(kind, normalized content)` hashes for a single request.
#[derive(Debug, Default)]
pub struct LoopDetector {
    seen: HashMap<TrajectoryKind, Vec<u64>>,
    last_was_duplicate: bool,
}

impl LoopDetector {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Record `step` and flag whether it is a duplicate of a prior step of
    /// the same kind within this request. Never errors — the controller
    /// reads `last_was_duplicate()` after calling this rather than
    /// propagating a hard failure, since a detected loop still returns the
    /// best score seen (§4.3), not an error.
    pub fn check(&mut self, step: &TrajectoryStep) -> Result<()> {
        let hash = hash_step(step);
        let bucket = self.seen.entry(step.kind).or_default();
        self.last_was_duplicate = bucket.contains(&hash);
        bucket.push(hash);
        Ok(())
    }

    #[must_use]
    pub fn last_was_duplicate(&self) -> bool {
        self.last_was_duplicate
    }
}

fn hash_step(step: &TrajectoryStep) -> u64 {
    let mut hasher = std::collections::hash_map::DefaultHasher::new();
    step.kind.hash(&mut hasher);
    step.normalized_content().hash(&mut hasher);
    hasher.finish()
}
