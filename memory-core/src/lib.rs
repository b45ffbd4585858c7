#![allow(clippy::cast_precision_loss)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::missing_docs_in_private_items)]
#![allow(clippy::cast_possible_wrap)]
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::needless_pass_by_value)]
#![allow(clippy::redundant_closure_for_method_calls)]
#![allow(clippy::unused_self)]
#![allow(clippy::items_after_statements)]
#![allow(clippy::match_same_arms)]
#![allow(clippy::cast_sign_loss)]
#![allow(clippy::assigning_clones)]
#![allow(clippy::borrowed_box)]
#![allow(clippy::float_cmp)]
#![allow(clippy::ref_option)]

//! # Memory Core
//!
//! The self-evolving episodic memory engine for LLM agents: vector-similarity
//! retrieval with composite recency/error-aware scoring, an iterative
//! Think → Evaluate → Refine reasoning controller, a memory-aware
//! test-time-scaling (MaTTS) fan-out orchestrator, and a cached, retrying
//! LLM gateway — composed behind one [`core::MemoryCore`] facade.
//!
//! ## Module Organization
//!
//! - [`backup`]: `backup`/`restore`/`validate` as a gzip-compressed tar
//!   archive of a workspace's Memories.
//! - [`types`]: the data model — [`types::Memory`], [`types::Trace`],
//!   [`types::TrajectoryStep`].
//! - [`store`]: the [`store::MemoryStore`] capability interface pluggable
//!   backends implement (vector upsert/query/scan/delete, trace
//!   persistence).
//! - [`embedding`]: the [`embedding::Embedder`] trait and similarity math.
//! - [`scoring`]: composite `similarity/recency/error_boost` ranking.
//! - [`genealogy`]: ancestor/descendant traversal over a Memory's
//!   `parent_id`/`derived_from` links.
//! - [`llm`]: the LLM Gateway ([`llm::Gateway`]) — response cache, retry
//!   policy, and pooled HTTP transport composed into one [`llm::LlmClient`].
//! - [`controller`]: the iterative Think → Evaluate → Refine reasoning loop.
//! - [`matts`]: parallel/sequential best-of-k fan-out over the controller.
//! - [`judge`]: LLM-graded verdicts and learning extraction.
//! - [`budget`]: token estimation, prompt compression, per-request budgets.
//! - [`workspace`]: deterministic workspace identity from an absolute path.
//! - [`core`]: [`core::MemoryCore`], the facade `solve`/`retrieve`/`store`/
//!   `genealogy`/`statistics`/`cleanup`/`delete_workspace` entry points bind
//!   to.
//!
//! ## Quick Start
//!
//! ```no_run
//! use memory_core::core::{MemoryCore, SolveOptions};
//! use memory_core::embedding::HashEmbedder;
//! use memory_core::llm::cache::ResponseCache;
//! use memory_core::llm::pool::{HttpLlmClient, PoolConfig};
//! use std::sync::Arc;
//! use tokio_util::sync::CancellationToken;
//!
//! # async fn example(store: Arc<dyn memory_core::store::MemoryStore>) -> memory_core::error::Result<()> {
//! let embedder = Arc::new(HashEmbedder::new(256));
//! let transport = Arc::new(HttpLlmClient::new(PoolConfig::new("https://api.example.com", "key"))?);
//! let cache = Arc::new(ResponseCache::new());
//! let core = MemoryCore::new(store, embedder, transport, cache);
//!
//! let result = core
//!     .solve("fix the off-by-one in binary search", "ws_0123456789abcdef", SolveOptions::default(), CancellationToken::new())
//!     .await?;
//! println!("score: {}", result.score);
//! # Ok(())
//! # }
//! ```
//!
//! ## Error Handling
//!
//! Every fallible operation returns [`error::Result<T>`]; see [`error::Error`]
//! for the full failure taxonomy and which variants are retryable.

pub mod backup;
pub mod budget;
pub mod controller;
pub mod core;
pub mod embedding;
pub mod error;
pub mod genealogy;
pub mod judge;
pub mod llm;
pub mod matts;
pub mod scoring;
pub mod store;
pub mod types;
pub mod workspace;

pub use core::MemoryCore;
pub use error::{Error, Result};
pub use types::{Memory, Outcome, Trace};
pub use workspace::Workspace;
