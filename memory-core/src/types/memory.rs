//! The `Memory` type: an atomic, immutable unit of learning.

use crate::error::{Error, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use uuid::Uuid;

/// Difficulty classification attached to a Memory at extraction time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Difficulty {
    Simple,
    Moderate,
    Complex,
}

/// Terminal outcome of the trace/solution a Memory or Trace is associated with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Outcome {
    Success,
    Failure,
    Partial,
}

/// Structured description of a past failure, attached to a Memory so that
/// retrieval can surface it as a prominent warning (§4.6).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorContext {
    pub error_type: String,
    pub failure_pattern: String,
    pub corrective_guidance: String,
}

/// An atomic unit of learning extracted from a judged trace.
///
/// Identity is a 128-bit UUID, immutable once stored: a `Memory` is never
/// mutated after creation, revisions are new Memories with `parent_id` set
/// (§3).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Memory {
    pub id: Uuid,
    pub workspace_id: String,
    pub title: String,
    pub description: String,
    pub content: String,
    pub vec: Vec<f32>,
    pub pattern_tags: HashSet<String>,
    pub difficulty: Difficulty,
    pub domain: String,
    pub error_context: Option<ErrorContext>,
    pub parent_id: Option<Uuid>,
    pub derived_from: Vec<Uuid>,
    pub evolution_stage: u32,
    pub trace_id: Option<Uuid>,
    pub timestamp: DateTime<Utc>,
    pub outcome: Outcome,
}

impl Memory {
    /// Construct a root Memory (`evolution_stage = 0`, no ancestors).
    #[must_use]
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        workspace_id: String,
        title: String,
        description: String,
        content: String,
        vec: Vec<f32>,
        difficulty: Difficulty,
        domain: String,
        outcome: Outcome,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            workspace_id,
            title,
            description,
            content,
            vec,
            pattern_tags: HashSet::new(),
            difficulty,
            domain,
            error_context: None,
            parent_id: None,
            derived_from: Vec::new(),
            evolution_stage: 0,
            trace_id: None,
            timestamp: Utc::now(),
            outcome,
        }
    }

    #[must_use]
    pub fn with_tags(mut self, tags: impl IntoIterator<Item = String>) -> Self {
        self.pattern_tags = tags.into_iter().collect();
        self
    }

    #[must_use]
    pub fn with_error_context(mut self, ctx: ErrorContext) -> Self {
        self.error_context = Some(ctx);
        self
    }

    #[must_use]
    pub fn with_trace(mut self, trace_id: Uuid) -> Self {
        self.trace_id = Some(trace_id);
        self
    }

    /// Attach genealogy, recomputing `evolution_stage` from ancestor stages
    /// per §3: `evolution_stage = 1 + max(stage of ancestors)`.
    #[must_use]
    pub fn with_genealogy(
        mut self,
        parent_id: Option<Uuid>,
        derived_from: Vec<Uuid>,
        ancestor_stages: &[u32],
    ) -> Self {
        self.parent_id = parent_id;
        self.derived_from = derived_from;
        self.evolution_stage = ancestor_stages
            .iter()
            .max()
            .map_or(0, |max_stage| max_stage + 1);
        self
    }

    /// Validate the required-field invariant from §3: `title`, `description`,
    /// and `content` must all be non-empty, and the embedding must be
    /// non-empty.
    ///
    /// # Errors
    ///
    /// Returns [`Error::MemoryValidation`] naming the first offending field.
    pub fn validate(&self) -> Result<()> {
        if self.title.trim().is_empty() {
            return Err(Error::MemoryValidation("title is empty".into()));
        }
        if self.description.trim().is_empty() {
            return Err(Error::MemoryValidation("description is empty".into()));
        }
        if self.content.trim().is_empty() {
            return Err(Error::MemoryValidation("content is empty".into()));
        }
        if self.vec.is_empty() {
            return Err(Error::MemoryValidation("embedding vector is empty".into()));
        }
        if self.workspace_id.trim().is_empty() {
            return Err(Error::MemoryValidation("workspace_id is empty".into()));
        }
        Ok(())
    }

    /// `true` if this Memory carries a warning-worthy error context.
    #[must_use]
    pub fn is_error_context(&self) -> bool {
        self.error_context.is_some()
    }

    /// `true` if this Memory has no recorded ancestors.
    #[must_use]
    pub fn is_root(&self) -> bool {
        self.parent_id.is_none() && self.derived_from.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Memory {
        Memory::new(
            "ws1".into(),
            "title".into(),
            "description".into(),
            "content".into(),
            vec![0.1, 0.2],
            Difficulty::Simple,
            "dom".into(),
            Outcome::Success,
        )
    }

    #[test]
    fn root_memory_has_stage_zero() {
        let m = sample();
        assert_eq!(m.evolution_stage, 0);
        assert!(m.is_root());
        assert!(m.validate().is_ok());
    }

    #[test]
    fn genealogy_stage_is_max_ancestor_plus_one() {
        let m = sample().with_genealogy(None, vec![Uuid::new_v4(), Uuid::new_v4()], &[0, 2, 1]);
        assert_eq!(m.evolution_stage, 3);
        assert!(!m.is_root());
    }

    #[test]
    fn empty_vec_fails_validation() {
        let mut m = sample();
        m.vec.clear();
        assert!(m.validate().is_err());
    }
}
