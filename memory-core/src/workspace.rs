//! Workspace Resolver (I): deterministic workspace ids from directory paths.
//!
//! A workspace is identified by a 16-hex-character id derived from the
//! first 64 bits of SHA-256 over the absolute canonical path of a
//! directory (§3). Ids are pure functions of the path: the same path
//! always resolves to the same workspace, and distinct paths never
//! collide (assuming SHA-256 collision resistance).

use sha2::{Digest, Sha256};
use std::path::Path;

/// A resolved workspace: an opaque 16-hex-character id plus the canonical
/// path it was derived from (kept for diagnostics, not part of identity).
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Workspace {
    pub id: String,
    pub path: std::path::PathBuf,
}

/// Error returned when a workspace directory path cannot be canonicalized.
#[derive(Debug, thiserror::Error)]
#[error("could not resolve workspace path {path}: {source}")]
pub struct WorkspaceResolveError {
    path: std::path::PathBuf,
    #[source]
    source: std::io::Error,
}

impl Workspace {
    /// Resolve a workspace id from a directory path, canonicalizing it
    /// first so that `.`/`..` and symlinks don't produce distinct ids for
    /// the same directory.
    ///
    /// # Errors
    ///
    /// Returns [`WorkspaceResolveError`] if the path does not exist or
    /// cannot be canonicalized.
    pub fn resolve(path: impl AsRef<Path>) -> Result<Self, WorkspaceResolveError> {
        let canonical = path
            .as_ref()
            .canonicalize()
            .map_err(|source| WorkspaceResolveError {
                path: path.as_ref().to_path_buf(),
                source,
            })?;
        Ok(Self {
            id: workspace_id_for_path(&canonical),
            path: canonical,
        })
    }
}

/// Compute the 16-hex-character workspace id for an already-canonical
/// absolute path, without touching the filesystem. Exposed separately from
/// [`Workspace::resolve`] so callers holding a path that is known-canonical
/// (e.g. round-tripped from storage) can skip the `canonicalize` syscall.
#[must_use]
pub fn workspace_id_for_path(abs_path: &Path) -> String {
    let mut hasher = Sha256::new();
    hasher.update(abs_path.to_string_lossy().as_bytes());
    let digest = hasher.finalize();
    digest[..8].iter().map(|b| format!("{b:02x}")).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn workspace_id_is_deterministic() {
        let p = PathBuf::from("/tmp/some/workspace");
        assert_eq!(workspace_id_for_path(&p), workspace_id_for_path(&p));
    }

    #[test]
    fn workspace_id_is_16_hex_chars() {
        let id = workspace_id_for_path(&PathBuf::from("/tmp/x"));
        assert_eq!(id.len(), 16);
        assert!(id.chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn distinct_paths_produce_distinct_ids() {
        let a = workspace_id_for_path(&PathBuf::from("/tmp/a"));
        let b = workspace_id_for_path(&PathBuf::from("/tmp/b"));
        assert_ne!(a, b);
    }
}
