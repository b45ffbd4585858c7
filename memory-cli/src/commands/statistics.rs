//! `memory-cli statistics`: aggregate trace/memory counts, success rate,
//! and gateway cache/API statistics, optionally scoped to one workspace
//! (§4.1, §6).

use crate::output::Render;
use clap::Args;
use memory_core::core::MemoryCore;
use serde::Serialize;

#[derive(Args, Debug)]
pub struct StatisticsArgs {
    #[arg(long)]
    pub workspace: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct StatisticsView {
    pub traces: u64,
    pub memories: u64,
    pub success_rate: f32,
    pub cache_hits: u64,
    pub cache_misses: u64,
    pub cache_evictions: u64,
    pub cache_hit_rate: f32,
    pub api_calls: u64,
    pub api_avg_latency_ms: f64,
    pub api_error_rate: f32,
}

impl Render for StatisticsView {
    fn render_human(&self) -> String {
        format!(
            "traces={} memories={} success_rate={:.2}\ncache: hits={} misses={} evictions={} hit_rate={:.2}\napi: calls={} avg_latency_ms={:.1} error_rate={:.2}",
            self.traces,
            self.memories,
            self.success_rate,
            self.cache_hits,
            self.cache_misses,
            self.cache_evictions,
            self.cache_hit_rate,
            self.api_calls,
            self.api_avg_latency_ms,
            self.api_error_rate,
        )
    }
}

pub async fn run(core: &MemoryCore, args: StatisticsArgs) -> anyhow::Result<StatisticsView> {
    let stats = core.statistics(args.workspace.as_deref()).await?;

    Ok(StatisticsView {
        traces: stats.traces,
        memories: stats.memories,
        success_rate: stats.success_rate,
        cache_hits: stats.cache.hits,
        cache_misses: stats.cache.misses,
        cache_evictions: stats.cache.evictions,
        cache_hit_rate: stats.cache.hit_rate(),
        api_calls: stats.api.calls,
        api_avg_latency_ms: stats.api.avg_latency_ms,
        api_error_rate: if stats.api.calls == 0 {
            0.0
        } else {
            #[allow(clippy::cast_precision_loss)]
            let rate = stats.api.errors as f32 / stats.api.calls as f32;
            rate
        },
    })
}
