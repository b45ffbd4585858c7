//! Iterative Controller (G): the Think → Evaluate → Refine state machine
//! with early termination, trajectory-hash loop detection, and
//! token-budget management (§4.3).

mod loop_detect;

pub use loop_detect::LoopDetector;

use crate::budget::{self, TokenAccount, DEFAULT_MAX_PROMPT_TOKENS};
use crate::error::{Error, Result};
use crate::llm::{CompletionRequest, LlmClient, Message, ReasoningEffort};
use crate::types::{Memory, Outcome, TrajectoryKind, TrajectoryStep};
use std::sync::Arc;
use tracing::warn;

/// Configuration for one controller run (§4.3, §6 opts).
#[derive(Debug, Clone)]
pub struct ControllerConfig {
    pub success_threshold: f32,
    pub max_iterations: u32,
    pub max_prompt_tokens: u64,
    pub request_token_budget: u64,
    pub model: String,
    pub reasoning_effort: ReasoningEffort,
}

impl Default for ControllerConfig {
    fn default() -> Self {
        Self {
            success_threshold: 0.8,
            max_iterations: 3,
            max_prompt_tokens: DEFAULT_MAX_PROMPT_TOKENS,
            request_token_budget: 100_000,
            model: "default".into(),
            reasoning_effort: ReasoningEffort::Medium,
        }
    }
}

/// Result of one controller run (§4.3).
#[derive(Debug, Clone)]
pub struct ControllerOutcome {
    pub solution: String,
    pub score: f32,
    pub trajectory: Vec<TrajectoryStep>,
    pub iterations: u32,
    pub early_termination: bool,
    pub loop_detected: bool,
    pub total_tokens: u64,
}

/// Drives one Think→Evaluate→(Refine→Evaluate)* loop for a single
/// request. Holds no state across calls to `run` — a fresh
/// `TokenAccount`/`LoopDetector` pair is created per invocation so the
/// controller is safely reentrant across concurrent requests (§5).
pub struct IterativeController {
    client: Arc<dyn LlmClient>,
    config: ControllerConfig,
}

impl IterativeController {
    #[must_use]
    pub fn new(client: Arc<dyn LlmClient>, config: ControllerConfig) -> Self {
        Self { client, config }
    }

    /// Run the loop for `task`, rendering `memories` into the THINK
    /// prompt.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidTask`] if `task` is empty (rejected before
    /// any LLM call, per §7), or [`Error::TokenBudgetExceeded`] if the
    /// cumulative token account is exceeded mid-loop.
    pub async fn run(&self, task: &str, memories: &[Memory]) -> Result<ControllerOutcome> {
        if task.trim().is_empty() {
            return Err(Error::InvalidTask("task text is empty".into()));
        }

        let rendered_memories = crate::genealogy::render_memory;
        let memory_block = memories.iter().map(rendered_memories).collect::<Vec<_>>().join("\n---\n");

        let mut trajectory = Vec::new();
        let mut account = TokenAccount::new(self.config.request_token_budget);
        let mut detector = LoopDetector::new();
        let mut feedback: Option<String> = None;
        let mut solution = String::new();
        let mut best_score = 0.0f32;
        let mut iterations = 0u32;
        let mut loop_detected = false;
        let mut early_termination = false;

        'outer: for iteration in 0..self.config.max_iterations {
            iterations = iteration + 1;

            solution = if iteration == 0 {
                self.think(task, &memory_block, feedback.as_deref(), iteration, &mut account, &mut trajectory, &mut detector)
                    .await?
            } else {
                self.refine(
                    task,
                    &solution,
                    feedback.as_deref().unwrap_or_default(),
                    iteration,
                    &mut account,
                    &mut trajectory,
                    &mut detector,
                )
                .await?
            };
            if detector.last_was_duplicate() {
                loop_detected = true;
                break 'outer;
            }

            let (score, eval_feedback) = self
                .evaluate(task, &solution, iteration, &mut account, &mut trajectory, &mut detector)
                .await?;
            if detector.last_was_duplicate() {
                loop_detected = true;
                break 'outer;
            }

            best_score = best_score.max(score);

            if score >= self.config.success_threshold {
                early_termination = true;
                break 'outer;
            }

            if iteration + 1 >= self.config.max_iterations {
                break 'outer;
            }

            feedback = Some(eval_feedback);
        }

        Ok(ControllerOutcome {
            solution,
            score: best_score,
            trajectory,
            iterations,
            early_termination,
            loop_detected,
            total_tokens: account.used(),
        })
    }

    async fn think(
        &self,
        task: &str,
        memory_block: &str,
        feedback: Option<&str>,
        iteration: u32,
        account: &mut TokenAccount,
        trajectory: &mut Vec<TrajectoryStep>,
        detector: &mut LoopDetector,
    ) -> Result<String> {
        let mut prompt = format!("Task: {task}\n\nRelevant prior memories:\n{memory_block}\n");
        if let Some(fb) = feedback {
            prompt.push_str(&format!("\nPrevious attempt feedback:\n{fb}\n"));
        }
        let prompt = self.budget_check(prompt, account)?;

        let response = self.call(&prompt).await?;
        account.account(response.prompt_tokens, response.completion_tokens)?;

        let step = TrajectoryStep::new(iteration, TrajectoryKind::Think, response.text.clone(), response.prompt_tokens + response.completion_tokens);
        detector.check(&step)?;
        trajectory.push(step);

        Ok(response.text)
    }

    /// REFINE: revise `solution` using the evaluator's `feedback` (§4.3).
    async fn refine(
        &self,
        task: &str,
        solution: &str,
        feedback: &str,
        iteration: u32,
        account: &mut TokenAccount,
        trajectory: &mut Vec<TrajectoryStep>,
        detector: &mut LoopDetector,
    ) -> Result<String> {
        let prompt = format!(
            "Task: {task}\n\nCurrent solution:\n{solution}\n\nEvaluator feedback:\n{feedback}\n\nProvide a revised solution that addresses the feedback."
        );
        let prompt = self.budget_check(prompt, account)?;

        let response = self.call(&prompt).await?;
        account.account(response.prompt_tokens, response.completion_tokens)?;

        let step = TrajectoryStep::new(iteration, TrajectoryKind::Refine, response.text.clone(), response.prompt_tokens + response.completion_tokens);
        detector.check(&step)?;
        trajectory.push(step);

        Ok(response.text)
    }

    async fn evaluate(
        &self,
        task: &str,
        solution: &str,
        iteration: u32,
        account: &mut TokenAccount,
        trajectory: &mut Vec<TrajectoryStep>,
        detector: &mut LoopDetector,
    ) -> Result<(f32, String)> {
        let prompt = format!(
            "Task: {task}\n\nProposed solution:\n{solution}\n\nScore this solution from 0.0 to 1.0 and give actionable feedback. Respond as \"SCORE: <n>\\nFEEDBACK: <text>\"."
        );
        let prompt = self.budget_check(prompt, account)?;

        let response = self.call(&prompt).await?;
        account.account(response.prompt_tokens, response.completion_tokens)?;

        let (score, feedback) = parse_evaluation(&response.text);

        let step = TrajectoryStep::new(iteration, TrajectoryKind::Evaluate, response.text.clone(), response.prompt_tokens + response.completion_tokens)
            .with_score(score)
            .with_feedback(feedback.clone());
        detector.check(&step)?;
        trajectory.push(step);

        Ok((score, feedback))
    }

    fn budget_check(&self, prompt: String, _account: &TokenAccount) -> Result<String> {
        let tokens = budget::estimate(&prompt);
        if tokens > self.config.max_prompt_tokens {
            warn!(tokens, max = self.config.max_prompt_tokens, "prompt exceeds budget, compressing");
            Ok(budget::compress(&prompt, self.config.max_prompt_tokens))
        } else {
            Ok(prompt)
        }
    }

    /// Issue one raw completion call outside the think/evaluate/refine
    /// bookkeeping. Used by the MaTTS orchestrator's refinement pass,
    /// which runs one extra think+evaluate round after candidate
    /// selection rather than through the full iteration loop.
    pub(crate) async fn call_raw(&self, prompt: &str) -> Result<crate::llm::CompletionResponse> {
        self.call(prompt).await
    }

    async fn call(&self, prompt: &str) -> Result<crate::llm::CompletionResponse> {
        let request = CompletionRequest {
            model: self.config.model.clone(),
            messages: vec![Message {
                role: "user".into(),
                content: prompt.to_string(),
            }],
            temperature: 0.0,
            max_tokens: 2000,
            reasoning_effort: self.config.reasoning_effort,
        };
        self.client.complete(&request).await
    }
}

/// Parse the evaluator's `SCORE: <n>\nFEEDBACK: <text>` convention.
/// Falls back to `score=0.0` and the raw text as feedback if the
/// convention isn't followed, rather than failing the request.
pub(crate) fn parse_evaluation(text: &str) -> (f32, String) {
    let mut score = 0.0f32;
    let mut feedback = text.to_string();

    for line in text.lines() {
        if let Some(rest) = line.strip_prefix("SCORE:") {
            score = rest.trim().parse().unwrap_or(0.0).clamp(0.0, 1.0);
        } else if let Some(rest) = line.strip_prefix("FEEDBACK:") {
            feedback = rest.trim().to_string();
        }
    }

    (score, feedback)
}

/// A Think→Evaluate outcome used by the MaTTS orchestrator to build a
/// single candidate attempt without running `REFINE` (§4.4).
pub async fn think_and_evaluate(
    controller: &IterativeController,
    task: &str,
    memory_block: &str,
) -> Result<(String, f32, String, u64, Vec<TrajectoryStep>)> {
    let mut trajectory = Vec::new();
    let mut account = TokenAccount::new(controller.config.request_token_budget);
    let mut detector = LoopDetector::new();

    let solution = controller
        .think(task, memory_block, None, 0, &mut account, &mut trajectory, &mut detector)
        .await?;
    let (score, feedback) = controller
        .evaluate(task, &solution, 0, &mut account, &mut trajectory, &mut detector)
        .await?;

    Ok((solution, score, feedback, account.used(), trajectory))
}

pub(crate) fn outcome_from_score(score: f32, success_threshold: f32) -> Outcome {
    if score >= success_threshold {
        Outcome::Success
    } else if score <= 0.0 {
        Outcome::Failure
    } else {
        Outcome::Partial
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_evaluation_reads_score_and_feedback() {
        let (score, feedback) = parse_evaluation("SCORE: 0.75\nFEEDBACK: looks good but slow");
        assert!((score - 0.75).abs() < 1e-6);
        assert_eq!(feedback, "looks good but slow");
    }

    #[test]
    fn parse_evaluation_falls_back_on_malformed_text() {
        let (score, feedback) = parse_evaluation("no convention followed here");
        assert_eq!(score, 0.0);
        assert_eq!(feedback, "no convention followed here");
    }

    #[test]
    fn outcome_thresholds_match_success_failure_partial() {
        assert_eq!(outcome_from_score(0.9, 0.8), Outcome::Success);
        assert_eq!(outcome_from_score(0.0, 0.8), Outcome::Failure);
        assert_eq!(outcome_from_score(0.5, 0.8), Outcome::Partial);
    }
}
