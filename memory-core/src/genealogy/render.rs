//! Rendering a Memory into a prompt block (§4.6).

use crate::types::Memory;
use std::fmt::Write as _;

/// Render a Memory as a prompt block: title, description, content, and —
/// if present — an explicit, visually prominent warning section. Error-
/// context memories are always rendered with their warning even if their
/// composite score placed them lower than non-error memories within the
/// top-N, per §4.6.
#[must_use]
pub fn render_memory(memory: &Memory) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "### {}", memory.title);
    let _ = writeln!(out, "{}", memory.description);
    let _ = writeln!(out, "\n{}", memory.content);

    if let Some(ctx) = &memory.error_context {
        let _ = writeln!(out, "\n⚠ WARNING — past failure recorded here:");
        let _ = writeln!(out, "  error_type: {}", ctx.error_type);
        let _ = writeln!(out, "  failure_pattern: {}", ctx.failure_pattern);
        let _ = writeln!(out, "  corrective_guidance: {}", ctx.corrective_guidance);
    }

    if !memory.pattern_tags.is_empty() {
        let mut tags: Vec<&String> = memory.pattern_tags.iter().collect();
        tags.sort();
        let tags: Vec<&str> = tags.into_iter().map(String::as_str).collect();
        let _ = writeln!(out, "\ntags: {}", tags.join(", "));
    }

    out
}

/// Render an ordered set of Memories into the single block handed to
/// THINK (§4.3): error-context memories are emitted first regardless of
/// rank, so they stay visually prominent even when their composite score
/// was lower than a non-error memory in the same top-N.
#[must_use]
pub fn render_memories(memories: &[Memory]) -> String {
    let mut ordered: Vec<&Memory> = memories.iter().collect();
    ordered.sort_by_key(|m| !m.is_error_context());

    ordered
        .into_iter()
        .map(render_memory)
        .collect::<Vec<_>>()
        .join("\n---\n")
}
