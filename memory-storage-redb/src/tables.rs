//! Table definitions for the redb-backed `MemoryStore` (§4.1, §6).

use redb::TableDefinition;

/// `Memory.id` (UUID string) -> postcard-serialized `Memory`.
pub(crate) const MEMORIES_TABLE: TableDefinition<&str, &[u8]> = TableDefinition::new("memories");

/// `Trace.trace_id` (UUID string) -> postcard-serialized `Trace`, which
/// embeds its owned `memory_items` (§3).
pub(crate) const TRACES_TABLE: TableDefinition<&str, &[u8]> = TableDefinition::new("traces");

/// Limits deserialization size to guard against a corrupted or maliciously
/// large row crashing the process.
pub(crate) const MAX_MEMORY_SIZE: usize = 1_000_000;
pub(crate) const MAX_TRACE_SIZE: usize = 10_000_000;
