//! CLI-level configuration: backend selection, LLM credentials, and
//! engine assembly. Resolved from `--config <file>` (TOML) overridden by
//! environment variables, falling back to per-platform defaults (§9: the
//! backend is selected by configuration, never resolved via attribute
//! access on a duck-typed handle).

use anyhow::{Context, Result};
use memory_core::core::MemoryCore;
use memory_core::embedding::HashEmbedder;
use memory_core::llm::cache::ResponseCache;
use memory_core::llm::pool::{HttpLlmClient, PoolConfig};
use memory_core::llm::LlmClient;
use memory_core::store::MemoryStore;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::sync::Arc;

#[derive(Debug, Clone, Deserialize, Default)]
pub struct FileConfig {
    pub backend: Option<BackendConfig>,
    pub llm: Option<LlmConfig>,
    pub embedding_dimension: Option<usize>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum BackendConfig {
    Redb { path: PathBuf },
    Turso { url: String, token: Option<String> },
}

#[derive(Debug, Clone, Deserialize)]
pub struct LlmConfig {
    pub endpoint: String,
    pub api_key: Option<String>,
}

pub const DEFAULT_EMBEDDING_DIMENSION: usize = 256;

/// Resolved configuration ready to build a [`MemoryCore`] from.
pub struct ResolvedConfig {
    pub backend: BackendConfig,
    pub llm_endpoint: String,
    pub llm_api_key: String,
    pub embedding_dimension: usize,
}

/// Load `config_path` if given, then apply environment overrides, then
/// fill in defaults.
///
/// # Errors
///
/// Returns an error if `config_path` is given but cannot be read or
/// parsed as TOML.
pub fn load(config_path: Option<&Path>) -> Result<ResolvedConfig> {
    let file = match config_path {
        Some(path) => {
            let raw = std::fs::read_to_string(path).with_context(|| format!("reading config file {}", path.display()))?;
            toml::from_str(&raw).with_context(|| format!("parsing config file {}", path.display()))?
        }
        None => FileConfig::default(),
    };

    let backend = std::env::var("MEMORY_BACKEND_URL").ok().map_or_else(
        || file.backend.clone().unwrap_or_else(default_redb_backend),
        |url| BackendConfig::Turso { url, token: std::env::var("MEMORY_BACKEND_TOKEN").ok() },
    );

    let llm_endpoint = std::env::var("MEMORY_LLM_ENDPOINT").ok().or_else(|| file.llm.as_ref().map(|l| l.endpoint.clone())).unwrap_or_else(|| "https://api.openai.com/v1/chat/completions".to_string());

    let llm_api_key = std::env::var("MEMORY_LLM_API_KEY").ok().or_else(|| file.llm.as_ref().and_then(|l| l.api_key.clone())).unwrap_or_default();

    let embedding_dimension = file.embedding_dimension.unwrap_or(DEFAULT_EMBEDDING_DIMENSION);

    Ok(ResolvedConfig { backend, llm_endpoint, llm_api_key, embedding_dimension })
}

fn default_redb_backend() -> BackendConfig {
    let dir = dirs::data_local_dir().unwrap_or_else(std::env::temp_dir).join("memory-cli");
    BackendConfig::Redb { path: dir.join("memory.redb") }
}

/// Build the `MemoryStore` named by `backend`, creating parent
/// directories for a local redb file if needed.
///
/// # Errors
///
/// Returns an error if the store cannot be opened or connected to.
pub async fn open_store(backend: &BackendConfig) -> Result<Arc<dyn MemoryStore>> {
    match backend {
        BackendConfig::Redb { path } => {
            if let Some(parent) = path.parent() {
                std::fs::create_dir_all(parent).with_context(|| format!("creating {}", parent.display()))?;
            }
            let store = memory_storage_redb::RedbStore::open(path).await.with_context(|| format!("opening redb store at {}", path.display()))?;
            Ok(Arc::new(store))
        }
        BackendConfig::Turso { url, token } => {
            let store = memory_storage_turso::TursoStore::connect(url, token.as_deref().unwrap_or("")).await.with_context(|| format!("connecting to turso store at {url}"))?;
            Ok(Arc::new(store))
        }
    }
}

/// Assemble a [`MemoryCore`] from resolved configuration.
///
/// # Errors
///
/// Returns an error if the store backend cannot be opened or the LLM
/// transport cannot be constructed (e.g. a missing API key).
pub async fn build_core(config: &ResolvedConfig) -> Result<MemoryCore> {
    let store = open_store(&config.backend).await?;
    let embedder = Arc::new(HashEmbedder::new(config.embedding_dimension));
    let transport: Arc<dyn LlmClient> = Arc::new(HttpLlmClient::new(PoolConfig::new(config.llm_endpoint.clone(), config.llm_api_key.clone()))?);
    let cache = Arc::new(ResponseCache::new());
    Ok(MemoryCore::new(store, embedder, transport, cache))
}
