//! MaTTS best-of-k fan-out and optional refinement through the real
//! `IterativeController`, with a scripted LLM client standing in for the
//! endpoint (§4.4, Scenario S3).

use memory_core::controller::{ControllerConfig, IterativeController};
use memory_core::matts::{run_matts, MattsConfig, MattsMode};
use std::sync::Arc;
use test_utils::ScriptedLlmClient;
use tokio_util::sync::CancellationToken;

fn controller(responses: Vec<memory_core::llm::CompletionResponse>) -> IterativeController {
    let client = Arc::new(ScriptedLlmClient::new(responses));
    IterativeController::new(client, ControllerConfig::default())
}

#[tokio::test]
async fn sequential_fan_out_selects_max_scoring_candidate() {
    // Sequential mode visits candidates 0..k in order, so the scripted
    // queue can be laid out one think/evaluate pair per candidate.
    let responses = vec![
        ScriptedLlmClient::text("sol-0"),
        ScriptedLlmClient::text("SCORE: 0.6\nFEEDBACK: f0"),
        ScriptedLlmClient::text("sol-1"),
        ScriptedLlmClient::text("SCORE: 0.95\nFEEDBACK: f1"),
        ScriptedLlmClient::text("sol-2"),
        ScriptedLlmClient::text("SCORE: 0.7\nFEEDBACK: f2"),
    ];
    let controller = controller(responses);
    let config = MattsConfig { k: 3, mode: MattsMode::Sequential, refine_best: false, success_threshold: 0.9 };

    let outcome = run_matts(&controller, "task", "", &config, CancellationToken::new()).await.expect("matts should succeed");

    assert_eq!(outcome.winner.index, 1);
    assert!((outcome.winner.score - 0.95).abs() < 1e-6);
    assert!(!outcome.refined);
    assert!(!outcome.degraded_warning);
    // One think + one evaluate trajectory step per candidate, merged in
    // candidate-id order (§5).
    assert_eq!(outcome.trajectory.len(), 6);
}

#[tokio::test]
async fn refine_best_improves_a_below_threshold_winner() {
    let responses = vec![
        ScriptedLlmClient::text("sol-0"),
        ScriptedLlmClient::text("SCORE: 0.5\nFEEDBACK: needs work"),
        ScriptedLlmClient::text("sol-1"),
        ScriptedLlmClient::text("SCORE: 0.6\nFEEDBACK: close"),
        // Refinement pass on the winner (candidate 1): one refine call,
        // one re-evaluate call.
        ScriptedLlmClient::text("sol-1-refined"),
        ScriptedLlmClient::text("SCORE: 0.85\nFEEDBACK: much better"),
    ];
    let controller = controller(responses);
    let config = MattsConfig { k: 2, mode: MattsMode::Sequential, refine_best: true, success_threshold: 0.9 };

    let outcome = run_matts(&controller, "task", "", &config, CancellationToken::new()).await.expect("matts should succeed");

    assert!(outcome.refined, "winner was below threshold, refinement should have run");
    assert!((outcome.winner.score - 0.85).abs() < 1e-6);
    assert_eq!(outcome.winner.solution, "sol-1-refined");
}

#[tokio::test]
async fn majority_candidate_failure_returns_degraded_error() {
    // A one-token request budget means every candidate's first THINK
    // call (10 scripted prompt + 10 completion tokens, see
    // `ScriptedLlmClient::text`) blows the budget immediately, so all k
    // candidates fail, well over the ceil(k/2) degradation threshold.
    let client = Arc::new(ScriptedLlmClient::new(Vec::new()));
    let config_ctrl = ControllerConfig { request_token_budget: 1, ..ControllerConfig::default() };
    let controller = IterativeController::new(client, config_ctrl);
    let config = MattsConfig { k: 3, mode: MattsMode::Sequential, refine_best: false, success_threshold: 0.8 };

    let result = run_matts(&controller, "some task", "", &config, CancellationToken::new()).await;
    assert!(result.is_err(), "all candidates exceeding the token budget should degrade the batch");
}
