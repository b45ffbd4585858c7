//! `memory-cli cleanup`: delete Traces (and their owned Memories) older
//! than a retention window, optionally scoped to one workspace (§4.1, §6).

use crate::output::Render;
use clap::Args;
use memory_core::core::MemoryCore;
use serde::Serialize;

#[derive(Args, Debug)]
pub struct CleanupArgs {
    /// Delete traces created more than this many days ago.
    #[arg(long)]
    pub retention_days: u32,

    #[arg(long)]
    pub workspace: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct CleanupView {
    pub deleted_traces: u64,
    pub deleted_memories: u64,
    pub freed_mb_est: f64,
    pub cutoff_ts: chrono::DateTime<chrono::Utc>,
}

impl Render for CleanupView {
    fn render_human(&self) -> String {
        format!(
            "deleted {} traces, {} memories (~{:.2} MB freed), cutoff={}",
            self.deleted_traces, self.deleted_memories, self.freed_mb_est, self.cutoff_ts
        )
    }
}

pub async fn run(core: &MemoryCore, args: CleanupArgs) -> anyhow::Result<CleanupView> {
    let result = core.cleanup(args.retention_days, args.workspace.as_deref()).await?;

    Ok(CleanupView {
        deleted_traces: result.deleted_traces,
        deleted_memories: result.deleted_memories,
        freed_mb_est: result.freed_mb_est,
        cutoff_ts: result.cutoff_ts,
    })
}
