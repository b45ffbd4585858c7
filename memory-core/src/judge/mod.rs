//! Judge & Extractor (J): scores a solution and parses structured
//! learnings out of the judge's LLM response (§4.7).

mod parse;

pub use parse::JudgePayload;

use crate::llm::{CompletionRequest, LlmClient, Message, ReasoningEffort};
use crate::types::{Memory, Outcome};
use std::sync::Arc;
use tracing::warn;

/// Outcome of `judge_solution` (§4.1, §6).
#[derive(Debug, Clone)]
pub struct Verdict {
    pub verdict: Outcome,
    pub score: f32,
    pub reasoning: String,
    pub learnings: Vec<Memory>,
    pub dropped_invalid: u32,
}

/// Judges a task/solution pair via a constrained LLM call, then parses and
/// validates the structured response.
pub struct Judge {
    client: Arc<dyn LlmClient>,
    model: String,
    workspace_id: String,
}

impl Judge {
    #[must_use]
    pub fn new(client: Arc<dyn LlmClient>, model: String, workspace_id: String) -> Self {
        Self {
            client,
            model,
            workspace_id,
        }
    }

    /// Judge `solution` against `task`.
    ///
    /// Parsing accepts fenced or unfenced JSON. On first parse failure, one
    /// retry is issued with a stricter instruction; on a second failure,
    /// returns `verdict=partial, score=best_known, learnings=[]` rather
    /// than propagating a `JsonParseError` (§4.7).
    pub async fn judge(&self, task: &str, solution: &str, best_known_score: f32) -> Verdict {
        match self.call_and_parse(task, solution, false).await {
            Ok(payload) => self.into_verdict(payload),
            Err(first_err) => {
                warn!(error = %first_err, "judge response failed to parse, retrying with stricter prompt");
                match self.call_and_parse(task, solution, true).await {
                    Ok(payload) => self.into_verdict(payload),
                    Err(second_err) => {
                        warn!(error = %second_err, "judge response failed to parse twice, downgrading to partial");
                        Verdict {
                            verdict: Outcome::Partial,
                            score: best_known_score,
                            reasoning: "judge response could not be parsed".into(),
                            learnings: Vec::new(),
                            dropped_invalid: 0,
                        }
                    }
                }
            }
        }
    }

    async fn call_and_parse(
        &self,
        task: &str,
        solution: &str,
        strict: bool,
    ) -> Result<JudgePayload, crate::error::Error> {
        let instruction = if strict {
            "Return ONLY a single JSON object matching the schema. No prose, no markdown fences."
        } else {
            "Return a JSON object matching the schema, optionally fenced in ```json."
        };

        let request = CompletionRequest {
            model: self.model.clone(),
            messages: vec![
                Message {
                    role: "system".into(),
                    content: format!(
                        "You are judging a solved task. {instruction} Schema: {{\"verdict\": \"success|failure|partial\", \"score\": 0.0-1.0, \"reasoning\": \"...\", \"learnings\": [{{\"title\":\"...\",\"description\":\"...\",\"content\":\"...\",\"pattern_tags\":[...],\"difficulty\":\"simple|moderate|complex\",\"domain\":\"...\",\"error_context\":{{\"error_type\":\"...\",\"failure_pattern\":\"...\",\"corrective_guidance\":\"...\"}}}}]}}"
                    ),
                },
                Message {
                    role: "user".into(),
                    content: format!("Task: {task}\n\nSolution:\n{solution}"),
                },
            ],
            temperature: 0.0,
            max_tokens: 2000,
            reasoning_effort: ReasoningEffort::Medium,
        };

        let response = self.client.complete(&request).await?;
        parse::parse_judge_response(&response.text)
    }

    fn into_verdict(&self, payload: JudgePayload) -> Verdict {
        let mut learnings = Vec::with_capacity(payload.learnings.len());
        let mut dropped = 0u32;

        for candidate in payload.learnings {
            match candidate.into_memory(&self.workspace_id) {
                Ok(memory) => learnings.push(memory),
                Err(err) => {
                    warn!(error = %err, "dropping invalid learning from judge response");
                    dropped += 1;
                }
            }
        }

        Verdict {
            verdict: payload.verdict,
            score: payload.score,
            reasoning: payload.reasoning,
            learnings,
            dropped_invalid: dropped,
        }
    }
}
