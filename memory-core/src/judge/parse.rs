//! Structured parsing of the judge's response, accepting fenced or
//! unfenced JSON payloads (§4.7).

use crate::error::{Error, Result};
use crate::types::{Difficulty, ErrorContext, Memory, Outcome};
use serde::Deserialize;
use std::collections::HashSet;

/// A learning as it arrives from the judge, before it is turned into a
/// stored `Memory` (which requires a `workspace_id` not known to the LLM).
#[derive(Debug, Deserialize)]
pub struct LearningPayload {
    pub title: String,
    pub description: String,
    pub content: String,
    #[serde(default)]
    pub pattern_tags: Vec<String>,
    pub difficulty: Difficulty,
    pub domain: String,
    #[serde(default)]
    pub error_context: Option<ErrorContext>,
}

impl LearningPayload {
    /// Convert into a stored `Memory`, validating the required-field
    /// invariant. The embedding vector is left empty here — the caller
    /// (the memory core) fills it in by calling the embedder before
    /// persisting, since the judge never computes embeddings itself.
    ///
    /// # Errors
    ///
    /// Returns [`Error::MemoryValidation`] if a required field is empty.
    pub fn into_memory(self, workspace_id: &str) -> Result<Memory> {
        let outcome = if self.error_context.is_some() {
            Outcome::Failure
        } else {
            Outcome::Success
        };

        let mut memory = Memory::new(
            workspace_id.to_string(),
            self.title,
            self.description,
            self.content,
            Vec::new(),
            self.difficulty,
            self.domain,
            outcome,
        )
        .with_tags(self.pattern_tags.into_iter().collect::<HashSet<_>>());

        if let Some(ctx) = self.error_context {
            memory = memory.with_error_context(ctx);
        }

        // Validate everything except the embedding, which is populated
        // downstream; re-validated in full once the embedder has run.
        if memory.title.trim().is_empty() {
            return Err(Error::MemoryValidation("title is empty".into()));
        }
        if memory.description.trim().is_empty() {
            return Err(Error::MemoryValidation("description is empty".into()));
        }
        if memory.content.trim().is_empty() {
            return Err(Error::MemoryValidation("content is empty".into()));
        }

        Ok(memory)
    }
}

/// The judge's top-level structured response (§4.7).
#[derive(Debug, Deserialize)]
pub struct JudgePayload {
    pub verdict: Outcome,
    pub score: f32,
    pub reasoning: String,
    #[serde(default)]
    pub learnings: Vec<LearningPayload>,
}

/// Parse a judge response, accepting either a bare JSON object or one
/// fenced in a ```json ... ``` (or plain ``` ... ```) code block.
///
/// # Errors
///
/// Returns [`Error::JsonParse`] if no valid JSON object can be extracted.
pub fn parse_judge_response(text: &str) -> Result<JudgePayload> {
    let candidate = extract_json(text);
    let payload: JudgePayload = serde_json::from_str(candidate)?;
    Ok(payload)
}

fn extract_json(text: &str) -> &str {
    let trimmed = text.trim();

    if let Some(start) = trimmed.find("```") {
        let after_fence = &trimmed[start + 3..];
        let after_fence = after_fence.strip_prefix("json").unwrap_or(after_fence);
        if let Some(end) = after_fence.find("```") {
            return after_fence[..end].trim();
        }
    }

    trimmed
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_unfenced_json() {
        let text = r#"{"verdict":"success","score":0.9,"reasoning":"ok","learnings":[]}"#;
        let payload = parse_judge_response(text).unwrap();
        assert_eq!(payload.verdict, Outcome::Success);
        assert!((payload.score - 0.9).abs() < 1e-6);
    }

    #[test]
    fn parses_fenced_json() {
        let text = "Here is the result:\n```json\n{\"verdict\":\"failure\",\"score\":0.2,\"reasoning\":\"bad\",\"learnings\":[]}\n```\n";
        let payload = parse_judge_response(text).unwrap();
        assert_eq!(payload.verdict, Outcome::Failure);
    }

    #[test]
    fn invalid_learning_is_rejected_by_into_memory() {
        let learning = LearningPayload {
            title: String::new(),
            description: "d".into(),
            content: "c".into(),
            pattern_tags: vec![],
            difficulty: Difficulty::Simple,
            domain: "dom".into(),
            error_context: None,
        };
        assert!(learning.into_memory("ws1").is_err());
    }

    #[test]
    fn malformed_text_fails_to_parse() {
        assert!(parse_judge_response("not json at all").is_err());
    }
}
