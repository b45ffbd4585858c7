//! `memory-cli retrieve`: rank stored Memories against a query by
//! composite score (§4.1, §4.2).

use crate::output::Render;
use clap::Args;
use memory_core::core::{MemoryCore, RetrieveOptions};
use serde::Serialize;

#[derive(Args, Debug)]
pub struct RetrieveArgs {
    pub query: String,

    #[arg(long)]
    pub workspace: String,

    #[arg(long, default_value_t = 5)]
    pub n: usize,

    #[arg(long)]
    pub domain: Option<String>,

    /// Exclude Memories carrying an `error_context` warning.
    #[arg(long)]
    pub exclude_errors: bool,

    #[arg(long)]
    pub min_score: Option<f32>,
}

#[derive(Debug, Serialize)]
pub struct RetrievedMemory {
    pub id: uuid::Uuid,
    pub title: String,
    pub domain: String,
    pub composite: f32,
    pub similarity: f32,
    pub recency: f32,
    pub error_boost: f32,
    pub has_error_context: bool,
}

#[derive(Debug, Serialize)]
pub struct RetrieveView {
    pub matches: Vec<RetrievedMemory>,
}

impl Render for RetrieveView {
    fn render_human(&self) -> String {
        if self.matches.is_empty() {
            return "no matching memories".to_string();
        }
        self.matches
            .iter()
            .map(|m| {
                let warning = if m.has_error_context { " [!] prior failure on record" } else { "" };
                format!("{:.3}  {}  ({}){warning}", m.composite, m.title, m.domain)
            })
            .collect::<Vec<_>>()
            .join("\n")
    }
}

pub async fn run(core: &MemoryCore, args: RetrieveArgs) -> anyhow::Result<RetrieveView> {
    let opts = RetrieveOptions {
        include_errors: Some(!args.exclude_errors),
        domain: args.domain,
        pattern_tags: Vec::new(),
        min_score: args.min_score,
    };

    let ranked = core.retrieve(&args.query, &args.workspace, args.n, &opts).await?;

    let matches = ranked
        .into_iter()
        .map(|scored| RetrievedMemory {
            id: scored.hit.memory.id,
            title: scored.hit.memory.title.clone(),
            domain: scored.hit.memory.domain.clone(),
            composite: scored.composite,
            similarity: scored.similarity,
            recency: scored.recency,
            error_boost: scored.error_boost,
            has_error_context: scored.hit.memory.error_context.is_some(),
        })
        .collect();

    Ok(RetrieveView { matches })
}
