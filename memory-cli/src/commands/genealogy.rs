//! `memory-cli genealogy`: show a Memory's ancestor chain, descendants,
//! and evolution stage (§4.1, §4.6).

use crate::output::Render;
use clap::Args;
use memory_core::core::MemoryCore;
use serde::Serialize;
use uuid::Uuid;

#[derive(Args, Debug)]
pub struct GenealogyArgs {
    /// Memory id to trace.
    pub memory_id: Uuid,

    #[arg(long)]
    pub workspace: String,
}

#[derive(Debug, Serialize)]
pub struct GenealogyView {
    pub memory_id: Uuid,
    pub ancestors: Vec<Uuid>,
    pub descendants: Vec<Uuid>,
    pub chain: Vec<Uuid>,
    pub stage: u32,
    pub is_root: bool,
    pub is_leaf: bool,
}

impl Render for GenealogyView {
    fn render_human(&self) -> String {
        format!(
            "memory {} stage={} root={} leaf={}\nancestors: {}\ndescendants: {}\nchain: {}",
            self.memory_id,
            self.stage,
            self.is_root,
            self.is_leaf,
            join_ids(&self.ancestors),
            join_ids(&self.descendants),
            join_ids(&self.chain),
        )
    }
}

fn join_ids(ids: &[Uuid]) -> String {
    if ids.is_empty() {
        return "(none)".to_string();
    }
    ids.iter().map(ToString::to_string).collect::<Vec<_>>().join(", ")
}

pub async fn run(core: &MemoryCore, args: GenealogyArgs) -> anyhow::Result<GenealogyView> {
    let genealogy = core.genealogy(args.memory_id, &args.workspace).await?;

    Ok(GenealogyView {
        memory_id: args.memory_id,
        ancestors: genealogy.ancestors,
        descendants: genealogy.descendants,
        chain: genealogy.chain,
        stage: genealogy.stage,
        is_root: genealogy.is_root,
        is_leaf: genealogy.is_leaf,
    })
}
