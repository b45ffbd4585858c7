#![allow(clippy::excessive_nesting)]

//! # Memory Storage — redb
//!
//! Embedded `MemoryStore` backend over the `redb` key-value store: one
//! table of postcard-serialized `Memory` rows (scanned brute-force for
//! `ann_query`, adequate at the single-workspace scale spec.md §1
//! assumes) and one table of `Trace` rows, for single-process and
//! development deployments.
//!
//! ## Example
//!
//! ```no_run
//! use memory_storage_redb::RedbStore;
//! use std::path::Path;
//!
//! # async fn example() -> memory_core::error::Result<()> {
//! let store = RedbStore::open(Path::new("./memory.redb")).await?;
//! # Ok(())
//! # }
//! ```

mod memories;
mod store;
mod tables;
mod trait_impl;
mod traces;

pub use store::RedbStore;

#[cfg(test)]
mod tests;
