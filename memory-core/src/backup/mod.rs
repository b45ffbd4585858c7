//! `backup`/`restore`/`validate` (§6): a gzip-compressed tar archive of a
//! workspace's Memories, for portability between store backends.
//!
//! The archive holds two entries: `metadata.json` (format version,
//! workspace id, memory count, creation timestamp) and `memories.json`
//! (the full `Vec<Memory>`, JSON rather than postcard so an operator can
//! inspect or hand-edit a backup).

use crate::error::{Error, Result};
use crate::store::{Filter, MemoryStore};
use crate::types::Memory;
use chrono::{DateTime, Utc};
use flate2::read::GzDecoder;
use flate2::write::GzEncoder;
use flate2::Compression;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::io::Read;
use std::sync::Arc;

/// Archive format version. Bumped whenever `metadata.json`'s shape or
/// `memories.json`'s encoding changes in a way `restore` must branch on.
const ARCHIVE_VERSION: u32 = 1;

/// `metadata.json` contents.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BackupMetadata {
    pub version: u32,
    pub workspace_id: String,
    pub memory_count: usize,
    pub created_at: DateTime<Utc>,
    /// SHA-256 hex digest of `memories.json`'s bytes, checked by `restore`
    /// and `validate` before anything is deserialized (§6 archive format).
    pub checksum: String,
}

fn checksum_of(memories_json: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(memories_json);
    hex_encode(&hasher.finalize())
}

fn hex_encode(bytes: &[u8]) -> String {
    bytes.iter().map(|b| format!("{b:02x}")).collect()
}

/// `backup(workspace_id) -> archive bytes` (§6).
///
/// # Errors
///
/// Returns [`Error::MemoryRetrieval`] if the workspace's Memories cannot
/// be scanned, or [`Error::Serialization`]/[`Error::Io`] if the archive
/// cannot be built.
pub async fn backup(store: &Arc<dyn MemoryStore>, workspace_id: &str) -> Result<Vec<u8>> {
    let memories = store.scan(&Filter::workspace(workspace_id)).await?;

    let memories_json = serde_json::to_vec_pretty(&memories).map_err(|e| Error::Serialization(e.to_string()))?;

    let metadata = BackupMetadata {
        version: ARCHIVE_VERSION,
        workspace_id: workspace_id.to_string(),
        memory_count: memories.len(),
        created_at: Utc::now(),
        checksum: checksum_of(&memories_json),
    };

    let metadata_json = serde_json::to_vec_pretty(&metadata).map_err(|e| Error::Serialization(e.to_string()))?;

    let encoder = GzEncoder::new(Vec::new(), Compression::default());
    let mut tar_builder = tar::Builder::new(encoder);

    append_entry(&mut tar_builder, "metadata.json", &metadata_json)?;
    append_entry(&mut tar_builder, "memories.json", &memories_json)?;

    let encoder = tar_builder.into_inner().map_err(Error::Io)?;
    encoder.finish().map_err(Error::Io)
}

fn append_entry<W: std::io::Write>(builder: &mut tar::Builder<W>, name: &str, contents: &[u8]) -> Result<()> {
    let mut header = tar::Header::new_gnu();
    header.set_size(contents.len() as u64);
    header.set_mode(0o644);
    header.set_cksum();
    builder.append_data(&mut header, name, contents).map_err(Error::Io)
}

/// `restore(archive_bytes) -> memories` (§6): decodes and validates the
/// archive, but does not write to a store — callers `upsert` the result
/// themselves so a failed write doesn't leave a partially-restored
/// workspace indistinguishable from a partially-read archive.
///
/// # Errors
///
/// Returns [`Error::InvalidArchive`] if the archive is malformed, missing
/// an expected entry, fails checksum validation, or carries an
/// unsupported `version`; [`Error::MemoryValidation`] if a restored
/// Memory fails the required-field invariant (§3).
pub fn restore(archive_bytes: &[u8]) -> Result<(BackupMetadata, Vec<Memory>)> {
    let decoder = GzDecoder::new(archive_bytes);
    let mut archive = tar::Archive::new(decoder);

    let mut metadata: Option<BackupMetadata> = None;
    let mut memories_json: Option<Vec<u8>> = None;

    let entries = archive.entries().map_err(|e| Error::InvalidArchive(format!("failed to read archive entries: {e}")))?;
    for entry in entries {
        let mut entry = entry.map_err(|e| Error::InvalidArchive(format!("corrupt archive entry: {e}")))?;
        let path = entry.path().map_err(|e| Error::InvalidArchive(format!("malformed entry path: {e}")))?.to_path_buf();
        let mut contents = Vec::new();
        entry.read_to_end(&mut contents).map_err(Error::Io)?;

        match path.to_str() {
            Some("metadata.json") => {
                metadata = Some(serde_json::from_slice(&contents).map_err(|e| Error::InvalidArchive(format!("malformed metadata.json: {e}")))?);
            }
            Some("memories.json") => {
                memories_json = Some(contents);
            }
            _ => {}
        }
    }

    let metadata = metadata.ok_or_else(|| Error::InvalidArchive("archive missing metadata.json".into()))?;
    let memories_json = memories_json.ok_or_else(|| Error::InvalidArchive("archive missing memories.json".into()))?;

    if metadata.version != ARCHIVE_VERSION {
        return Err(Error::InvalidArchive(format!("unsupported archive version {} (expected {ARCHIVE_VERSION})", metadata.version)));
    }

    let actual_checksum = checksum_of(&memories_json);
    if actual_checksum != metadata.checksum {
        return Err(Error::InvalidArchive(format!(
            "memories.json checksum mismatch: expected {}, got {actual_checksum}",
            metadata.checksum
        )));
    }

    let memories: Vec<Memory> = serde_json::from_slice(&memories_json).map_err(|e| Error::InvalidArchive(format!("malformed memories.json: {e}")))?;

    if memories.len() != metadata.memory_count {
        return Err(Error::InvalidArchive(format!("metadata declares {} memories but archive holds {}", metadata.memory_count, memories.len())));
    }

    validate(&memories)?;

    Ok((metadata, memories))
}

/// `validate(archive_bytes | memories)` (§6): checks every Memory against
/// the required-field invariant (§3) without writing anything.
///
/// # Errors
///
/// Returns [`Error::MemoryValidation`] naming the first invalid record.
pub fn validate(memories: &[Memory]) -> Result<()> {
    for memory in memories {
        memory.validate()?;
    }
    Ok(())
}
