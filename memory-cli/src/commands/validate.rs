//! `memory-cli validate`: check a backup archive's Memories against the
//! required-field invariant without writing anything (§3, §6).

use crate::output::Render;
use clap::Args;
use memory_core::core::MemoryCore;
use serde::Serialize;
use std::path::PathBuf;

#[derive(Args, Debug)]
pub struct ValidateArgs {
    #[arg(long)]
    pub path: PathBuf,
}

#[derive(Debug, Serialize)]
pub struct ValidateView {
    pub path: PathBuf,
    pub memory_count: usize,
    pub valid: bool,
}

impl Render for ValidateView {
    fn render_human(&self) -> String {
        format!("{}: {} memories, valid={}", self.path.display(), self.memory_count, self.valid)
    }
}

pub async fn run(_core: &MemoryCore, args: ValidateArgs) -> anyhow::Result<ValidateView> {
    let archive = std::fs::read(&args.path)?;
    let memory_count = MemoryCore::validate_backup(&archive)?;

    Ok(ValidateView { path: args.path, memory_count, valid: true })
}
