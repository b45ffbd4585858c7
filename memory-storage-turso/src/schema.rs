//! Database schema for the Turso/libSQL-backed `MemoryStore` (§4.1, §6).

/// `memories`: one row per Memory, keyed by its UUID. `payload` is the
/// postcard-serialized `Memory`; `workspace_id`/`domain`/`outcome`/
/// `created_at` are duplicated into real columns so filtering happens in
/// SQL instead of a full-table deserialize.
pub const CREATE_MEMORIES_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS memories (
    id TEXT PRIMARY KEY NOT NULL,
    workspace_id TEXT NOT NULL,
    domain TEXT NOT NULL,
    outcome TEXT NOT NULL,
    has_error_context INTEGER NOT NULL,
    created_at INTEGER NOT NULL,
    payload BLOB NOT NULL
)
"#;

pub const CREATE_MEMORIES_WORKSPACE_INDEX: &str = r#"
CREATE INDEX IF NOT EXISTS idx_memories_workspace ON memories(workspace_id)
"#;

/// `traces`: one row per Trace, keyed by its UUID. `payload` embeds the
/// trace's owned `memory_items` (§3), so deleting a trace row and its
/// matching `memories` rows must happen together.
pub const CREATE_TRACES_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS traces (
    trace_id TEXT PRIMARY KEY NOT NULL,
    workspace_id TEXT NOT NULL,
    created_at INTEGER NOT NULL,
    payload BLOB NOT NULL
)
"#;

pub const CREATE_TRACES_WORKSPACE_INDEX: &str = r#"
CREATE INDEX IF NOT EXISTS idx_traces_workspace ON traces(workspace_id)
"#;
