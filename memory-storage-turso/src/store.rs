//! The Turso/libSQL-backed `MemoryStore`: connection setup and schema
//! initialization for remote/cloud deployments (§6, §9).

use crate::schema::{CREATE_MEMORIES_TABLE, CREATE_MEMORIES_WORKSPACE_INDEX, CREATE_TRACES_TABLE, CREATE_TRACES_WORKSPACE_INDEX};
use libsql::{Builder, Connection, Database};
use memory_core::error::{Error, Result};
use tokio::sync::Mutex;
use tracing::info;

/// Remote/cloud `MemoryStore` backend over libSQL (local file, in-memory,
/// or a `libsql://` Turso endpoint).
///
/// libSQL connections are not `Sync` across concurrent statements on the
/// same connection, so access is serialized through a [`Mutex`] rather
/// than pooled — adequate at the request rate a single-agent workspace
/// produces (§1).
pub struct TursoStore {
    #[allow(dead_code)]
    db: Database,
    conn: Mutex<Connection>,
}

impl TursoStore {
    /// Connect to `url` (`libsql://...`, `file:...`, or `:memory:`) and
    /// ensure the `memories`/`traces` tables exist.
    ///
    /// Remote connections require a non-empty `token`; local and
    /// in-memory databases do not.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Transport`] if the URL uses an unsupported
    /// protocol, a remote URL has no token, the connection cannot be
    /// established, or schema initialization fails.
    pub async fn connect(url: &str, token: &str) -> Result<Self> {
        if !url.starts_with("libsql://") && !url.starts_with("file:") && !url.starts_with(":memory:") {
            return Err(Error::Transport(format!("unsupported database url scheme: {url} (expected libsql://, file:, or :memory:)")));
        }
        if url.starts_with("libsql://") && token.trim().is_empty() {
            return Err(Error::Transport("remote Turso connections require a non-empty auth token".into()));
        }

        info!(url, "connecting to turso/libsql memory store");

        let db = if url.starts_with("libsql://") {
            Builder::new_remote(url.to_string(), token.to_string()).build().await.map_err(|e| Error::Transport(format!("failed to connect to turso: {e}")))?
        } else {
            let path = url.strip_prefix("file:").unwrap_or(url);
            Builder::new_local(path).build().await.map_err(|e| Error::Transport(format!("failed to open local libsql database: {e}")))?
        };

        let conn = db.connect().map_err(|e| Error::Transport(format!("failed to open connection: {e}")))?;
        let store = Self { db, conn: Mutex::new(conn) };
        store.initialize_schema().await?;
        Ok(store)
    }

    async fn initialize_schema(&self) -> Result<()> {
        let conn = self.conn.lock().await;
        for stmt in [CREATE_MEMORIES_TABLE, CREATE_MEMORIES_WORKSPACE_INDEX, CREATE_TRACES_TABLE, CREATE_TRACES_WORKSPACE_INDEX] {
            conn.execute(stmt, ()).await.map_err(|e| Error::Transport(format!("failed to initialize schema: {e}")))?;
        }
        Ok(())
    }

    pub(crate) async fn conn(&self) -> tokio::sync::MutexGuard<'_, Connection> {
        self.conn.lock().await
    }
}
