//! `memory-cli backup` / `restore` / `validate`: a gzip-compressed tar
//! archive of a workspace's Memories (§6, `memory_core::backup`).

use crate::output::Render;
use clap::Args;
use memory_core::core::MemoryCore;
use serde::Serialize;
use std::path::PathBuf;

#[derive(Args, Debug)]
pub struct BackupArgs {
    pub workspace: String,

    /// Archive file to write.
    #[arg(long)]
    pub path: PathBuf,
}

#[derive(Debug, Serialize)]
pub struct BackupView {
    pub workspace: String,
    pub path: PathBuf,
    pub bytes_written: usize,
}

impl Render for BackupView {
    fn render_human(&self) -> String {
        format!("wrote {} ({} bytes) for workspace {}", self.path.display(), self.bytes_written, self.workspace)
    }
}

pub async fn run(core: &MemoryCore, args: BackupArgs) -> anyhow::Result<BackupView> {
    let archive = core.backup(&args.workspace).await?;
    std::fs::write(&args.path, &archive)?;

    Ok(BackupView { workspace: args.workspace, path: args.path, bytes_written: archive.len() })
}
