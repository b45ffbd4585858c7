//! # Memory Storage — Turso
//!
//! Remote/cloud `MemoryStore` backend over [`libsql`]: the same
//! `memories`/`traces` schema `memory-storage-redb` uses locally, served
//! through a Turso (`libsql://`) endpoint or, for development, a local
//! libSQL file, for deployments that need a shared durable store across
//! multiple agent processes.
//!
//! ## Example
//!
//! ```no_run
//! use memory_storage_turso::TursoStore;
//!
//! # async fn example() -> memory_core::error::Result<()> {
//! let store = TursoStore::connect("libsql://my-db.turso.io", "auth-token").await?;
//! # Ok(())
//! # }
//! ```

mod memories;
mod schema;
mod store;
mod trait_impl;
mod traces;

pub use store::TursoStore;

#[cfg(test)]
mod tests;
