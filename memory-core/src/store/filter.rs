//! Structured predicate over Memory metadata, consumed by the store
//! adapter's `ann_query`, `scan`, `delete`, and `count` (§6).

use crate::types::Outcome;

/// Whether an `error_context IS [NOT] NULL` filter is applied, and if so
/// which way.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorContextFilter {
    /// No constraint on `error_context`.
    Any,
    /// `error_context IS NOT NULL`.
    Present,
    /// `error_context IS NULL`.
    Absent,
}

/// A structured predicate over Memory metadata keys: `workspace_id`,
/// `timestamp` range, `outcome`, `domain`, `pattern_tags` (OR semantics),
/// and `error_context IS [NOT] NULL` (§6, §4.1 opts).
#[derive(Debug, Clone)]
pub struct Filter {
    pub workspace_id: String,
    pub domain: Option<String>,
    pub pattern_tags: Vec<String>,
    pub outcome: Option<Outcome>,
    pub error_context: ErrorContextFilter,
    pub timestamp_after: Option<chrono::DateTime<chrono::Utc>>,
    pub timestamp_before: Option<chrono::DateTime<chrono::Utc>>,
}

impl Filter {
    /// A filter scoped to a workspace with no further constraints.
    #[must_use]
    pub fn workspace(workspace_id: impl Into<String>) -> Self {
        Self {
            workspace_id: workspace_id.into(),
            domain: None,
            pattern_tags: Vec::new(),
            outcome: None,
            error_context: ErrorContextFilter::Any,
            timestamp_after: None,
            timestamp_before: None,
        }
    }

    #[must_use]
    pub fn with_domain(mut self, domain: impl Into<String>) -> Self {
        self.domain = Some(domain.into());
        self
    }

    #[must_use]
    pub fn with_pattern_tags(mut self, tags: Vec<String>) -> Self {
        self.pattern_tags = tags;
        self
    }

    #[must_use]
    pub fn excluding_errors(mut self) -> Self {
        self.error_context = ErrorContextFilter::Absent;
        self
    }

    #[must_use]
    pub fn only_errors(mut self) -> Self {
        self.error_context = ErrorContextFilter::Present;
        self
    }

    #[must_use]
    pub fn before(mut self, ts: chrono::DateTime<chrono::Utc>) -> Self {
        self.timestamp_before = Some(ts);
        self
    }

    /// Whether a Memory satisfies this predicate. Implemented here, not
    /// per-backend, so every `MemoryStore` impl (including remote ones
    /// that push filters down) agrees on semantics.
    #[must_use]
    pub fn matches(&self, m: &crate::types::Memory) -> bool {
        if m.workspace_id != self.workspace_id {
            return false;
        }
        if let Some(domain) = &self.domain {
            if &m.domain != domain {
                return false;
            }
        }
        if !self.pattern_tags.is_empty() && !self.pattern_tags.iter().any(|t| m.pattern_tags.contains(t)) {
            return false;
        }
        if let Some(outcome) = self.outcome {
            if m.outcome != outcome {
                return false;
            }
        }
        match self.error_context {
            ErrorContextFilter::Any => {}
            ErrorContextFilter::Present if !m.is_error_context() => return false,
            ErrorContextFilter::Absent if m.is_error_context() => return false,
            ErrorContextFilter::Present | ErrorContextFilter::Absent => {}
        }
        if let Some(after) = self.timestamp_after {
            if m.timestamp < after {
                return false;
            }
        }
        if let Some(before) = self.timestamp_before {
            if m.timestamp >= before {
                return false;
            }
        }
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Difficulty, ErrorContext, Memory};

    fn memory_in(ws: &str) -> Memory {
        Memory::new(
            ws.into(),
            "t".into(),
            "d".into(),
            "c".into(),
            vec![0.1],
            Difficulty::Simple,
            "dom".into(),
            Outcome::Success,
        )
    }

    #[test]
    fn filter_scopes_to_workspace() {
        let filter = Filter::workspace("ws1");
        assert!(filter.matches(&memory_in("ws1")));
        assert!(!filter.matches(&memory_in("ws2")));
    }

    #[test]
    fn excluding_errors_drops_error_context_memories() {
        let mut m = memory_in("ws1").with_error_context(ErrorContext {
            error_type: "off_by_one".into(),
            failure_pattern: "p".into(),
            corrective_guidance: "g".into(),
        });
        m.domain = "algorithms".into();
        let filter = Filter::workspace("ws1").excluding_errors();
        assert!(!filter.matches(&m));
        let filter = Filter::workspace("ws1").only_errors();
        assert!(filter.matches(&m));
    }
}
