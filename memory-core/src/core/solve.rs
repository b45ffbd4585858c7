//! `solve(task, workspace_id, opts) -> result` (§6): wires retrieval,
//! the iterative controller (or MaTTS fan-out), the judge, and trace
//! persistence into the single external entry point.

use super::MemoryCore;
use crate::controller::{ControllerConfig, IterativeController};
use crate::error::Result;
use crate::genealogy::render_memories;
use crate::llm::ReasoningEffort;
use crate::matts::{run_matts, MattsConfig, MattsMode};
use crate::types::{Outcome, Trace, TrajectoryKind, TrajectoryStep};
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

/// `solve` request options (§6).
#[derive(Debug, Clone)]
pub struct SolveOptions {
    pub use_memory: bool,
    pub enable_matts: bool,
    pub matts_k: u32,
    pub matts_mode: MattsMode,
    pub refine_best: bool,
    pub store_result: bool,
    pub max_iterations: u32,
    pub success_threshold: f32,
    pub model: String,
    pub reasoning_effort: ReasoningEffort,
}

impl Default for SolveOptions {
    fn default() -> Self {
        Self {
            use_memory: true,
            enable_matts: false,
            matts_k: 3,
            matts_mode: MattsMode::Parallel,
            refine_best: false,
            store_result: true,
            max_iterations: 3,
            success_threshold: 0.8,
            model: "default".into(),
            reasoning_effort: ReasoningEffort::Medium,
        }
    }
}

/// `solve` response (§6).
#[derive(Debug, Clone)]
pub struct SolveResult {
    pub trace_id: Option<Uuid>,
    pub solution: String,
    pub score: f32,
    pub verdict: Outcome,
    pub iterations: u32,
    pub early_termination: bool,
    pub loop_detected: bool,
    pub memories_used: usize,
    pub total_tokens: u64,
    pub judge_reasoning: String,
    pub learnings_extracted: usize,
}

pub(super) async fn solve(
    core: &MemoryCore,
    task: &str,
    workspace_id: &str,
    opts: SolveOptions,
    cancellation: CancellationToken,
) -> Result<SolveResult> {
    let memories = if opts.use_memory {
        let retrieved = core
            .retrieve(task, workspace_id, 5, &super::RetrieveOptions::default())
            .await?;
        retrieved.into_iter().map(|s| s.hit.memory).collect::<Vec<_>>()
    } else {
        Vec::new()
    };
    let memories_used = memories.len();
    let memory_block = render_memories(&memories);

    let controller_config = ControllerConfig {
        success_threshold: opts.success_threshold,
        max_iterations: opts.max_iterations,
        model: opts.model.clone(),
        reasoning_effort: opts.reasoning_effort,
        ..ControllerConfig::default()
    };
    let controller = IterativeController::new(core.llm_ref(), controller_config);

    let mut trace = Trace::new(workspace_id.to_string(), task.to_string());

    let (solution, score, trajectory, iterations, early_termination, loop_detected, total_tokens) =
        if opts.enable_matts {
            let k = opts.matts_k.clamp(2, 10);
            let matts_config = MattsConfig {
                k,
                mode: opts.matts_mode,
                refine_best: opts.refine_best,
                success_threshold: opts.success_threshold,
            };
            let outcome = run_matts(&controller, task, &memory_block, &matts_config, cancellation).await?;
            let tokens = outcome.winner.tokens;
            (
                outcome.winner.solution,
                outcome.winner.score,
                outcome.trajectory,
                1,
                outcome.winner.score >= opts.success_threshold,
                false,
                tokens,
            )
        } else {
            let outcome = controller.run(task, &memories).await?;
            (
                outcome.solution,
                outcome.score,
                outcome.trajectory,
                outcome.iterations,
                outcome.early_termination,
                outcome.loop_detected,
                outcome.total_tokens,
            )
        };

    for step in trajectory {
        trace.push_step(step);
    }

    let judge = core.judge(workspace_id, &opts.model);
    let verdict = judge.judge(task, &solution, score).await;

    let judge_step = TrajectoryStep::new(
        trace.metadata.iteration_count,
        TrajectoryKind::Judge,
        verdict.reasoning.clone(),
        0,
    )
    .with_score(verdict.score);
    trace.push_step(judge_step);

    // Embed each learning before persisting: the judge never computes
    // embeddings, only the engine that owns the embedder does.
    let mut embedded_learnings = Vec::with_capacity(verdict.learnings.len());
    for mut learning in verdict.learnings {
        match core.embedder_ref().embed(&learning.content).await {
            Ok(vec) => {
                learning.vec = vec;
                learning.trace_id = Some(trace.trace_id);
                if learning.validate().is_ok() {
                    embedded_learnings.push(learning);
                }
            }
            Err(_) => continue,
        }
    }
    let learnings_extracted = embedded_learnings.len();

    trace.seal(verdict.verdict, verdict.score, embedded_learnings);

    // Failed traces are persisted by default too (§9 open question: persist
    // failures to enable error-context learning) -- `store_result` is the
    // single gate, with no separate opt-out for the failure case.
    let trace_id = if opts.store_result {
        Some(core.store(&trace).await?)
    } else {
        None
    };

    Ok(SolveResult {
        trace_id,
        solution: trace
            .trajectory
            .iter()
            .rev()
            .find(|s| matches!(s.kind, TrajectoryKind::Think | TrajectoryKind::Refine))
            .map(|s| s.content.clone())
            .unwrap_or(solution),
        score: verdict.score,
        verdict: verdict.verdict,
        iterations,
        early_termination,
        loop_detected,
        memories_used,
        total_tokens,
        judge_reasoning: verdict.reasoning,
        learnings_extracted,
    })
}
