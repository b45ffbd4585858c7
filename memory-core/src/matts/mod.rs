//! MaTTS Orchestrator (H): concurrent fan-out of k candidate solutions
//! followed by best-of-k selection and optional refinement (§4.4).
//!
//! Modeled as parallel tasks joined at a barrier with a semaphore bounding
//! fan-out, per §9's re-architecture note. Cancellation is hierarchical:
//! cancelling the parent token cancels every outstanding candidate task.

use crate::controller::{think_and_evaluate, IterativeController};
use crate::error::{Error, Result};
use crate::types::{TrajectoryKind, TrajectoryStep};
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::Semaphore;
use tokio_util::sync::CancellationToken;

/// Fan-out mode (§4.4, §6).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MattsMode {
    Parallel,
    Sequential,
}

/// MaTTS parameters. `k` is clamped to `[2, 10]` by the caller (the
/// external `solve` surface) before construction.
#[derive(Debug, Clone)]
pub struct MattsConfig {
    pub k: u32,
    pub mode: MattsMode,
    pub refine_best: bool,
    pub success_threshold: f32,
}

/// One candidate's outcome from a THINK→EVALUATE attempt (§4.4).
#[derive(Debug, Clone)]
pub struct Candidate {
    pub index: u32,
    pub solution: String,
    pub score: f32,
    pub feedback: String,
    pub tokens: u64,
    pub completed_at: Instant,
    pub trajectory: Vec<TrajectoryStep>,
}

/// Result of one MaTTS run: the merged trajectory (candidates in
/// deterministic candidate-id order, per §5), the winning candidate, and
/// whether a refinement pass ran.
#[derive(Debug, Clone)]
pub struct MattsOutcome {
    pub winner: Candidate,
    pub trajectory: Vec<TrajectoryStep>,
    pub refined: bool,
    pub degraded_warning: bool,
}

/// Fan out `config.k` independent THINK→EVALUATE attempts and select the
/// best.
///
/// # Errors
///
/// Returns [`Error::MemoryRetrieval`] here only propagates the
/// underlying controller's first fatal (non-candidate) error; most
/// per-candidate failures are recorded and do not abort the batch, per
/// §4.4 step 3. Returns a `MattsDegraded`-flavored [`Error::Llm`] if
/// `ceil(k/2)` or more candidates fail.
pub async fn run_matts(
    controller: &IterativeController,
    task: &str,
    memory_block: &str,
    config: &MattsConfig,
    cancellation: CancellationToken,
) -> Result<MattsOutcome> {
    let permits = (config.k as usize).min(10);
    let semaphore = Arc::new(Semaphore::new(permits));

    let attempts: Vec<_> = match config.mode {
        MattsMode::Parallel => run_parallel(controller, task, memory_block, config.k, &semaphore, &cancellation).await,
        MattsMode::Sequential => run_sequential(controller, task, memory_block, config.k, &cancellation).await,
    };

    let succeeded: Vec<Candidate> = attempts.into_iter().flatten().collect();
    let failed = config.k as usize - succeeded.len();

    if failed >= config.k.div_ceil(2) as usize {
        return Err(Error::Llm(format!(
            "matts degraded: {failed} of {} candidates failed",
            config.k
        )));
    }

    let mut winner = select_best(succeeded.clone()).expect("at least one candidate succeeded");

    let mut trajectory = merge_trajectories(&succeeded);
    let mut refined = false;

    if config.refine_best && winner.score < config.success_threshold {
        if let Some(refined_candidate) = refine_once(controller, task, &winner).await? {
            if refined_candidate.score > winner.score {
                trajectory.extend(refined_candidate.trajectory.clone());
                winner = refined_candidate;
                refined = true;
            }
        }
    }

    Ok(MattsOutcome {
        winner,
        trajectory,
        refined,
        degraded_warning: failed > 0,
    })
}

async fn run_parallel(
    controller: &IterativeController,
    task: &str,
    memory_block: &str,
    k: u32,
    semaphore: &Arc<Semaphore>,
    cancellation: &CancellationToken,
) -> Vec<Option<Candidate>> {
    // Each future acquires its own permit for the duration of its
    // THINK→EVALUATE attempt, bounding concurrent fan-out to `permits`
    // (§5), and races against the (hierarchically derived) cancellation
    // token so a parent cancel aborts outstanding candidates.
    let futures = (0..k).map(|index| {
        let semaphore = Arc::clone(semaphore);
        let child_token = cancellation.child_token();
        async move {
            let _permit = semaphore.acquire().await.ok()?;
            if child_token.is_cancelled() {
                return None;
            }
            run_one_candidate(controller, task, memory_block, index, &child_token).await
        }
    });

    futures::future::join_all(futures).await
}

async fn run_sequential(
    controller: &IterativeController,
    task: &str,
    memory_block: &str,
    k: u32,
    cancellation: &CancellationToken,
) -> Vec<Option<Candidate>> {
    let mut results = Vec::with_capacity(k as usize);
    for index in 0..k {
        if cancellation.is_cancelled() {
            results.push(None);
            continue;
        }
        results.push(run_one_candidate(controller, task, memory_block, index, cancellation).await);
    }
    results
}

async fn run_one_candidate(
    controller: &IterativeController,
    task: &str,
    memory_block: &str,
    index: u32,
    cancellation: &CancellationToken,
) -> Option<Candidate> {
    let attempt = tokio::select! {
        result = think_and_evaluate(controller, task, memory_block) => result,
        () = cancellation.cancelled() => return None,
    };

    match attempt {
        Ok((solution, score, feedback, tokens, trajectory)) => Some(Candidate {
            index,
            solution,
            score,
            feedback,
            tokens,
            completed_at: Instant::now(),
            trajectory,
        }),
        Err(_) => None,
    }
}

/// Select the candidate with maximum score; ties broken by lower token
/// count, then earliest completion time (§4.4 step 4).
fn select_best(candidates: Vec<Candidate>) -> Option<Candidate> {
    candidates.into_iter().max_by(|a, b| {
        a.score
            .partial_cmp(&b.score)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then_with(|| b.tokens.cmp(&a.tokens))
            .then_with(|| b.completed_at.cmp(&a.completed_at))
    })
}

/// Merge candidate trajectories into a single parent trajectory in
/// deterministic candidate-id (index) order (§5).
fn merge_trajectories(candidates: &[Candidate]) -> Vec<TrajectoryStep> {
    let mut sorted: Vec<&Candidate> = candidates.iter().collect();
    sorted.sort_by_key(|c| c.index);
    sorted.into_iter().flat_map(|c| c.trajectory.clone()).collect()
}

async fn refine_once(controller: &IterativeController, task: &str, winner: &Candidate) -> Result<Option<Candidate>> {
    let refine_prompt = format!(
        "Task: {task}\n\nCurrent best solution:\n{}\n\nFeedback:\n{}\n\nProvide an improved solution.",
        winner.solution, winner.feedback
    );

    let response = controller.call_raw(&refine_prompt).await?;
    let refine_step = TrajectoryStep::new(
        0,
        TrajectoryKind::Refine,
        response.text.clone(),
        response.prompt_tokens + response.completion_tokens,
    );

    let eval_prompt = format!("Task: {task}\n\nProposed solution:\n{}\n\nScore this solution from 0.0 to 1.0 and give actionable feedback. Respond as \"SCORE: <n>\\nFEEDBACK: <text>\".", response.text);
    let eval_response = controller.call_raw(&eval_prompt).await?;
    let (score, feedback) = crate::controller::parse_evaluation(&eval_response.text);
    let eval_step = TrajectoryStep::new(
        0,
        TrajectoryKind::Evaluate,
        eval_response.text.clone(),
        eval_response.prompt_tokens + eval_response.completion_tokens,
    )
    .with_score(score);

    Ok(Some(Candidate {
        index: winner.index,
        solution: response.text,
        score,
        feedback,
        tokens: winner.tokens + response.prompt_tokens + response.completion_tokens + eval_response.prompt_tokens + eval_response.completion_tokens,
        completed_at: Instant::now(),
        trajectory: vec![refine_step, eval_step],
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn candidate(index: u32, score: f32, tokens: u64) -> Candidate {
        Candidate {
            index,
            solution: format!("solution-{index}"),
            score,
            feedback: String::new(),
            tokens,
            completed_at: Instant::now(),
            trajectory: Vec::new(),
        }
    }

    #[test]
    fn select_best_picks_max_score() {
        let candidates = vec![candidate(0, 0.5, 10), candidate(1, 0.9, 20), candidate(2, 0.3, 5)];
        let best = select_best(candidates).unwrap();
        assert_eq!(best.index, 1);
    }

    #[test]
    fn ties_broken_by_lower_token_count() {
        let candidates = vec![candidate(0, 0.8, 50), candidate(1, 0.8, 10)];
        let best = select_best(candidates).unwrap();
        assert_eq!(best.index, 1);
    }

    #[test]
    fn merge_trajectories_preserves_candidate_id_order() {
        let mut c0 = candidate(0, 0.5, 1);
        c0.trajectory = vec![TrajectoryStep::new(0, TrajectoryKind::Think, "a".into(), 1)];
        let mut c1 = candidate(1, 0.9, 1);
        c1.trajectory = vec![TrajectoryStep::new(0, TrajectoryKind::Think, "b".into(), 1)];
        let merged = merge_trajectories(&[c1, c0]);
        assert_eq!(merged[0].content, "a");
        assert_eq!(merged[1].content, "b");
    }
}
