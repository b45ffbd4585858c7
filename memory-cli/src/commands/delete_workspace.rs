//! `memory-cli delete-workspace`: irreversibly remove every Trace and
//! Memory in a workspace. Refuses without `--confirm` (§6,
//! `ConfirmationRequired`).

use crate::output::Render;
use clap::Args;
use memory_core::core::MemoryCore;
use serde::Serialize;

#[derive(Args, Debug)]
pub struct DeleteWorkspaceArgs {
    pub workspace: String,

    /// Required to actually perform the deletion.
    #[arg(long)]
    pub confirm: bool,
}

#[derive(Debug, Serialize)]
pub struct DeleteWorkspaceView {
    pub workspace: String,
    pub deleted_memories: u64,
}

impl Render for DeleteWorkspaceView {
    fn render_human(&self) -> String {
        format!("deleted workspace {} ({} memories)", self.workspace, self.deleted_memories)
    }
}

pub async fn run(core: &MemoryCore, args: DeleteWorkspaceArgs) -> anyhow::Result<DeleteWorkspaceView> {
    let deleted_memories = core.delete_workspace(&args.workspace, args.confirm).await?;

    Ok(DeleteWorkspaceView { workspace: args.workspace, deleted_memories })
}
