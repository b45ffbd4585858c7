//! `memory-cli solve`: run the iterative controller (optionally MaTTS)
//! against a task, store the resulting trace, and print the outcome.

use crate::output::Render;
use clap::Args;
use memory_core::core::{MemoryCore, SolveOptions};
use memory_core::llm::ReasoningEffort;
use memory_core::matts::MattsMode;
use serde::Serialize;
use tokio_util::sync::CancellationToken;

#[derive(Args, Debug)]
pub struct SolveArgs {
    /// Task description to solve.
    pub task: String,

    /// Workspace to retrieve memories from and store the result in.
    #[arg(long)]
    pub workspace: String,

    /// Retrieve and condition on prior Memories before solving.
    #[arg(long, default_value_t = true)]
    pub use_memory: bool,

    /// Run k-way MaTTS fan-out instead of a single iterative run.
    #[arg(long)]
    pub matts: bool,

    /// Candidate count for MaTTS, clamped to [2, 10].
    #[arg(long, default_value_t = 3)]
    pub matts_k: u32,

    /// Run MaTTS candidates sequentially instead of in parallel.
    #[arg(long)]
    pub matts_sequential: bool,

    /// Attempt one refinement pass if the MaTTS winner is below threshold.
    #[arg(long)]
    pub refine_best: bool,

    /// Maximum Think/Evaluate iterations.
    #[arg(long, default_value_t = 3)]
    pub max_iterations: u32,

    /// Score at or above which the controller accepts the solution.
    #[arg(long, default_value_t = 0.8)]
    pub success_threshold: f32,

    /// Model identifier passed to the LLM gateway.
    #[arg(long, default_value = "default")]
    pub model: String,
}

#[derive(Debug, Serialize)]
pub struct SolveView {
    pub trace_id: Option<uuid::Uuid>,
    pub solution: String,
    pub score: f32,
    pub verdict: String,
    pub iterations: u32,
    pub early_termination: bool,
    pub loop_detected: bool,
    pub memories_used: usize,
    pub total_tokens: u64,
    pub learnings_extracted: usize,
}

impl Render for SolveView {
    fn render_human(&self) -> String {
        format!(
            "verdict={} score={:.2} iterations={} memories_used={} learnings_extracted={} tokens={}\n\n{}",
            self.verdict, self.score, self.iterations, self.memories_used, self.learnings_extracted, self.total_tokens, self.solution
        )
    }
}

pub async fn run(core: &MemoryCore, args: SolveArgs) -> anyhow::Result<SolveView> {
    let opts = SolveOptions {
        use_memory: args.use_memory,
        enable_matts: args.matts,
        matts_k: args.matts_k,
        matts_mode: if args.matts_sequential { MattsMode::Sequential } else { MattsMode::Parallel },
        refine_best: args.refine_best,
        store_result: true,
        max_iterations: args.max_iterations,
        success_threshold: args.success_threshold,
        model: args.model,
        reasoning_effort: ReasoningEffort::Medium,
    };

    let result = core.solve(&args.task, &args.workspace, opts, CancellationToken::new()).await?;

    Ok(SolveView {
        trace_id: result.trace_id,
        solution: result.solution,
        score: result.score,
        verdict: format!("{:?}", result.verdict).to_lowercase(),
        iterations: result.iterations,
        early_termination: result.early_termination,
        loop_detected: result.loop_detected,
        memories_used: result.memories_used,
        total_tokens: result.total_tokens,
        learnings_extracted: result.learnings_extracted,
    })
}
