use crate::code::Code;
use async_trait::async_trait;
use directories::ProjectDirs;
use itertools::Itertools;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use thiserror::Error;
use tokio::fs;
use tokio::sync::{Mutex, RwLock};

/// How long a fetched page stays valid: 7 days, in milliseconds.
pub const CACHE_TTL_MS: i64 = 7 * 24 * 60 * 60 * 1000;

/// Name of the cache document inside the host's storage directory.
pub const CACHE_FILE_NAME: &str = "gcode-cache.json";

/// Platform data directory used when the host does not supply one
/// (`~/.local/share/gcode-hover` on Linux).
pub fn default_storage_dir() -> Option<PathBuf> {
    ProjectDirs::from("", "", "gcode-hover").map(|dirs| dirs.data_dir().to_path_buf())
}

#[derive(Debug, Error)]
pub enum CacheError {
    #[error("Cache I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("Cache serialization error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Documentation for one code and the time (Unix ms) it was fetched.
#[derive(Debug, Clone, Serialize, Deserialize, Eq, PartialEq)]
pub struct CacheEntry {
    pub content: String,
    pub timestamp: i64,
}

impl CacheEntry {
    /// An entry exactly [`CACHE_TTL_MS`] old is still valid.
    pub fn is_expired(&self, now: i64) -> bool {
        now.saturating_sub(self.timestamp) > CACHE_TTL_MS
    }
}

/// On-disk shape: `{ "G01": { "content": "...", "timestamp": 1700000000000 } }`.
type CacheData = BTreeMap<String, CacheEntry>;

/// Trait for an expiring code documentation cache.
///
/// Mutations only touch memory; callers follow each one with [`Cache::save`].
#[async_trait]
pub trait Cache: Send + Sync {
    /// Returns the entry for `code` unless it has expired at `now`.
    async fn get(&self, code: &Code, now: i64) -> Option<CacheEntry>;
    async fn put(&self, code: &Code, content: String, timestamp: i64);
    /// Drops every entry expired at `now`. Returns whether anything was removed.
    async fn prune_expired(&self, now: i64) -> bool;
    async fn len(&self) -> usize;
    async fn clear(&self);
    /// Writes the full map to storage, replacing what was there.
    async fn save(&self) -> Result<(), CacheError>;
    /// Replaces the in-memory map with the stored one. A missing or corrupt
    /// document yields an empty cache. Returns the number of entries loaded.
    async fn load(&self) -> usize;
}

/// Cache held in memory and persisted as a single JSON document.
#[derive(Debug, Clone)]
pub struct JsonFileCache {
    entries: Arc<RwLock<CacheData>>,
    path: Option<PathBuf>,
    /// Held across write and rename so concurrent saves never share the temp file.
    write_lock: Arc<Mutex<()>>,
}

impl JsonFileCache {
    pub fn new(path: PathBuf) -> Self {
        Self {
            entries: Arc::new(RwLock::new(CacheData::new())),
            path: Some(path),
            write_lock: Arc::new(Mutex::new(())),
        }
    }

    /// Cache stored under `storage_dir` with the fixed file name.
    pub fn in_dir(storage_dir: &Path) -> Self {
        Self::new(storage_dir.join(CACHE_FILE_NAME))
    }

    /// Cache that never touches the filesystem.
    pub fn in_memory() -> Self {
        Self {
            entries: Arc::new(RwLock::new(CacheData::new())),
            path: None,
            write_lock: Arc::new(Mutex::new(())),
        }
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    async fn read_file(path: &Path) -> Result<Option<CacheData>, CacheError> {
        let content = match fs::read_to_string(path).await {
            Ok(content) => content,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };
        Ok(Some(serde_json::from_str(&content)?))
    }
}

#[async_trait]
impl Cache for JsonFileCache {
    async fn get(&self, code: &Code, now: i64) -> Option<CacheEntry> {
        self.entries
            .read()
            .await
            .get(code.as_str())
            .filter(|entry| !entry.is_expired(now))
            .cloned()
    }

    async fn put(&self, code: &Code, content: String, timestamp: i64) {
        self.entries
            .write()
            .await
            .insert(code.to_string(), CacheEntry { content, timestamp });
    }

    async fn prune_expired(&self, now: i64) -> bool {
        let mut entries = self.entries.write().await;
        let expired: Vec<String> = entries
            .iter()
            .filter(|(_, entry)| entry.is_expired(now))
            .map(|(code, _)| code.clone())
            .collect();
        for code in &expired {
            entries.remove(code);
        }

        if !expired.is_empty() {
            tracing::info!(
                "Pruned {} expired cache entries: {}",
                expired.len(),
                expired.iter().join(", ")
            );
        }
        !expired.is_empty()
    }

    async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    async fn clear(&self) {
        self.entries.write().await.clear();
    }

    async fn save(&self) -> Result<(), CacheError> {
        let Some(path) = &self.path else {
            return Ok(());
        };
        let _writing = self.write_lock.lock().await;
        // Serialize under the read lock, write after releasing it.
        let serialized = {
            let entries = self.entries.read().await;
            serde_json::to_string_pretty(&*entries)?
        };

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).await?;
        }
        let temp_path = path.with_extension("json.tmp");
        fs::write(&temp_path, serialized).await?;
        fs::rename(&temp_path, path).await?;

        tracing::debug!("Saved cache to {:?}", path);
        Ok(())
    }

    async fn load(&self) -> usize {
        let Some(path) = &self.path else {
            return self.len().await;
        };
        let loaded = match Self::read_file(path).await {
            Ok(Some(data)) => data,
            Ok(None) => {
                tracing::info!("Cache file {:?} not found, starting with empty cache.", path);
                CacheData::new()
            }
            Err(e) => {
                tracing::error!(
                    "Error reading cache file {:?}: {}. Starting with empty cache.",
                    path,
                    e
                );
                CacheData::new()
            }
        };

        let count = loaded.len();
        *self.entries.write().await = loaded;
        tracing::info!("Cache loaded from {:?} - {} entries.", path, count);
        count
    }
}
