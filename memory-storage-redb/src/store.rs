//! The redb-backed `MemoryStore`: construction, table initialization, and
//! the `spawn_blocking`+timeout wrapper every blocking redb call runs
//! through.

use crate::tables::{MEMORIES_TABLE, TRACES_TABLE};
use memory_core::error::{Error, Result};
use redb::Database;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tracing::info;

/// Timeout for a single redb operation, run via `spawn_blocking` since
/// redb's transactions are synchronous (§9: never block the async
/// runtime on a synchronous store call).
const DB_OPERATION_TIMEOUT: Duration = Duration::from_secs(10);

/// Run a blocking redb operation off the async runtime, bounded by
/// [`DB_OPERATION_TIMEOUT`].
pub(crate) async fn with_db_timeout<T, F>(operation: F) -> Result<T>
where
    F: FnOnce() -> Result<T> + Send + 'static,
    T: Send + 'static,
{
    match tokio::time::timeout(DB_OPERATION_TIMEOUT, tokio::task::spawn_blocking(operation)).await {
        Ok(Ok(result)) => result,
        Ok(Err(join_err)) => Err(Error::MemoryStorage(format!("task join error: {join_err}"))),
        Err(_) => Err(Error::MemoryStorage(format!("redb operation timed out after {DB_OPERATION_TIMEOUT:?}"))),
    }
}

/// Embedded `MemoryStore` backend over a single redb database file.
pub struct RedbStore {
    pub(crate) db: Arc<Database>,
}

impl RedbStore {
    /// Open (creating if absent) the redb database at `path` and ensure
    /// its tables exist.
    ///
    /// # Errors
    ///
    /// Returns [`Error::MemoryStorage`] if the database cannot be created
    /// or its tables cannot be initialized.
    pub async fn open(path: &Path) -> Result<Self> {
        info!(path = %path.display(), "opening redb memory store");

        let path_buf = path.to_path_buf();
        let db = with_db_timeout(move || {
            Database::create(&path_buf).map_err(|e| Error::MemoryStorage(format!("failed to create redb database: {e}")))
        })
        .await?;

        let store = Self { db: Arc::new(db) };
        store.initialize_tables().await?;
        Ok(store)
    }

    async fn initialize_tables(&self) -> Result<()> {
        let db = Arc::clone(&self.db);
        with_db_timeout(move || {
            let write_txn = db.begin_write().map_err(|e| Error::MemoryStorage(format!("failed to begin write transaction: {e}")))?;
            {
                let _ = write_txn
                    .open_table(MEMORIES_TABLE)
                    .map_err(|e| Error::MemoryStorage(format!("failed to open memories table: {e}")))?;
                let _ = write_txn
                    .open_table(TRACES_TABLE)
                    .map_err(|e| Error::MemoryStorage(format!("failed to open traces table: {e}")))?;
            }
            write_txn.commit().map_err(|e| Error::MemoryStorage(format!("failed to commit transaction: {e}")))?;
            Ok(())
        })
        .await
    }
}
