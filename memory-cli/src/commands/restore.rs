//! `memory-cli restore`: load a `backup` archive back into a store (§6).

use crate::output::Render;
use clap::Args;
use memory_core::core::MemoryCore;
use serde::Serialize;
use std::path::PathBuf;

#[derive(Args, Debug)]
pub struct RestoreArgs {
    /// Archive file produced by `memory-cli backup`.
    #[arg(long)]
    pub path: PathBuf,

    /// Workspace to restore into; defaults to the archive's original
    /// workspace id.
    #[arg(long)]
    pub target_workspace: Option<String>,

    /// Overwrite Memories that already exist in the target workspace.
    #[arg(long)]
    pub overwrite: bool,
}

#[derive(Debug, Serialize)]
pub struct RestoreView {
    pub workspace_id: String,
    pub memories_restored: usize,
}

impl Render for RestoreView {
    fn render_human(&self) -> String {
        format!("restored {} memories into workspace {}", self.memories_restored, self.workspace_id)
    }
}

pub async fn run(core: &MemoryCore, args: RestoreArgs) -> anyhow::Result<RestoreView> {
    let archive = std::fs::read(&args.path)?;
    let result = core.restore(&archive, args.target_workspace.as_deref(), args.overwrite).await?;

    Ok(RestoreView { workspace_id: result.workspace_id, memories_restored: result.memories_restored })
}
