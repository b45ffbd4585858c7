//! Error taxonomy for the episodic memory engine.
//!
//! Every fallible operation in this crate returns [`Result<T>`], an alias
//! over [`Error`]. Variant names track the error *kinds* named in the
//! service's external contract, not internal implementation types, so that
//! callers across the tool-protocol boundary can match on a stable surface.

use uuid::Uuid;

/// Result type alias used throughout the crate.
pub type Result<T> = std::result::Result<T, Error>;

/// Error kinds produced by the memory engine.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Failure raised by the store adapter or composite scorer while
    /// answering a `retrieve` request. Not retried: the backend is
    /// presumed internally consistent.
    #[error("memory retrieval failed: {0}")]
    MemoryRetrieval(String),

    /// Failure while persisting a trace and its memories. The caller must
    /// treat the trace as not committed; partial writes are rolled back by
    /// the adapter.
    #[error("memory storage failed: {0}")]
    MemoryStorage(String),

    /// A candidate Memory failed the required-field invariant (§3) and was
    /// dropped rather than stored.
    #[error("memory validation failed: {0}")]
    MemoryValidation(String),

    /// The LLM gateway exhausted its retry budget. Carries the terminal
    /// cause; intermediate attempts are logged, not chained, to avoid
    /// unbounded error nesting.
    #[error("llm call failed after retries: {0}")]
    Llm(String),

    /// The judge's structured response could not be parsed after the
    /// single stricter-instruction retry.
    #[error("failed to parse judge response as JSON: {0}")]
    JsonParse(#[from] serde_json::Error),

    /// The embedding function failed for a given text.
    #[error("embedding failed: {0}")]
    Embedding(String),

    /// No valid API credential was found at gateway construction time.
    #[error("missing or invalid API credential: {0}")]
    ApiKey(String),

    /// A request's cumulative token accounting exceeded its budget.
    #[error("token budget exceeded: used {used}, budget {budget}")]
    TokenBudgetExceeded {
        /// Tokens consumed so far.
        used: u64,
        /// Configured request budget.
        budget: u64,
    },

    /// The controller rejected a task before any LLM call was made.
    #[error("invalid task: {0}")]
    InvalidTask(String),

    /// Genealogy traversal re-encountered an already-visited memory.
    #[error("genealogy cycle detected at memory {0}")]
    GenealogyCycle(Uuid),

    /// The gateway received HTTP 429; treated as retryable by the retry
    /// policy, surfaced only on exhaustion.
    #[error("rate limited, retry after {retry_after_secs:?}s")]
    RateLimited {
        /// Server-provided `Retry-After` hint, if any, already clamped to
        /// the 30s cap.
        retry_after_secs: Option<u64>,
    },

    /// A destructive workspace deletion was requested without `confirm=true`.
    #[error("confirmation required to delete workspace {0}")]
    ConfirmationRequired(String),

    /// Transport-level I/O failure (connect/read timeout, reset).
    #[error("transport error: {0}")]
    Transport(String),

    /// Backup/restore archive failed validation (checksum, schema version).
    #[error("backup archive invalid: {0}")]
    InvalidArchive(String),

    /// Serialization failure unrelated to the judge parse path (e.g. backup).
    #[error("serialization error: {0}")]
    Serialization(String),

    /// Filesystem I/O failure.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Whether the gateway's retry policy should attempt this error again.
    ///
    /// Only transport-level failures and explicit rate limiting are
    /// recoverable; everything else (validation, parse, budget, cycle,
    /// confirmation) is terminal by construction.
    #[must_use]
    pub fn is_recoverable(&self) -> bool {
        matches!(self, Error::Transport(_) | Error::RateLimited { .. })
    }

    /// Whether an HTTP status code is classified as retryable per §4.5.
    #[must_use]
    pub fn is_retryable_status(status: u16) -> bool {
        matches!(status, 408 | 429 | 500 | 502 | 503 | 504)
    }

    /// Whether an HTTP status code is a terminal "invalid request" class.
    #[must_use]
    pub fn is_terminal_status(status: u16) -> bool {
        matches!(status, 400 | 401 | 403 | 404)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn transport_and_rate_limit_are_recoverable() {
        assert!(Error::Transport("reset".into()).is_recoverable());
        assert!(
            Error::RateLimited {
                retry_after_secs: Some(5)
            }
            .is_recoverable()
        );
    }

    #[test]
    fn validation_and_budget_are_terminal() {
        assert!(!Error::MemoryValidation("missing title".into()).is_recoverable());
        assert!(
            !Error::TokenBudgetExceeded {
                used: 100,
                budget: 50
            }
            .is_recoverable()
        );
        assert!(!Error::GenealogyCycle(Uuid::new_v4()).is_recoverable());
    }

    #[test]
    fn status_classification_matches_spec_table() {
        for status in [408, 429, 500, 502, 503, 504] {
            assert!(Error::is_retryable_status(status), "{status} should retry");
        }
        for status in [400, 401, 403, 404] {
            assert!(Error::is_terminal_status(status), "{status} should be terminal");
        }
        assert!(!Error::is_retryable_status(200));
    }
}
