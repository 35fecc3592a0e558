//! Persistent directory-tree cache with per-source staleness windows.
//!
//! The cache is the sole place that decides fetch-vs-reuse. Entries live in
//! one JSON file under the per-user cache dir; every write serialises a
//! snapshot to a temp file in the same directory and renames it over the
//! old file, so a crash mid-write never corrupts previously valid entries.
//! A corrupt or unreadable file is logged and treated as empty.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::{Mutex, RwLock};
use tracing::{debug, warn};

use crate::error::{DirectoryError, Result};
use crate::node::{Node, SourceId};
use crate::source::DirectorySource;

pub const CACHE_FILE: &str = "directory.json";

/// One cached category listing. Created on first successful fetch,
/// overwritten in place on refresh, removed only by [`DirectoryCache::clear`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CacheEntry {
    pub source: SourceId,
    pub category_id: String,
    pub fetched_at: DateTime<Utc>,
    pub children: Vec<Node>,
}

/// On-disk representation: a flat list; the key is (source, category_id).
#[derive(Debug, Default, Serialize, Deserialize)]
struct CacheFile {
    entries: Vec<CacheEntry>,
}

type Key = (SourceId, String);

pub struct DirectoryCache {
    path: PathBuf,
    /// Stale window per source; sources absent from the map use the default.
    windows: HashMap<SourceId, Duration>,
    entries: RwLock<HashMap<Key, CacheEntry>>,
    /// Per-key fetch locks: at most one in-flight fetch per (source,
    /// category-id); gets for different keys proceed in parallel. Entries
    /// are dropped once the last holder releases them.
    fetch_locks: Mutex<HashMap<Key, Arc<Mutex<()>>>>,
    /// Serialises temp-file writes: parallel different-key gets must not
    /// race on the temp path mid-publish.
    persist_lock: Mutex<()>,
}

impl DirectoryCache {
    /// Open (or start empty) the cache file under `dir`.
    pub fn open(dir: &Path, windows: HashMap<SourceId, Duration>) -> Self {
        let path = dir.join(CACHE_FILE);
        let entries = match load_entries(&path) {
            Ok(entries) => entries,
            Err(err) => {
                warn!("{err}; starting with an empty cache");
                HashMap::new()
            }
        };
        Self {
            path,
            windows,
            entries: RwLock::new(entries),
            fetch_locks: Mutex::new(HashMap::new()),
            persist_lock: Mutex::new(()),
        }
    }

    /// Children of `category_id`, from cache when fresh, refetching when
    /// stale or absent. The returned flag is true when a stale listing is
    /// served because a refresh failed and `allow_stale` permitted it.
    pub async fn get(
        &self,
        source: &dyn DirectorySource,
        category_id: &str,
        allow_stale: bool,
    ) -> Result<(Vec<Node>, bool)> {
        let key: Key = (source.id(), category_id.to_string());
        let lock = self.fetch_lock(&key).await;
        let result = {
            let _in_flight = lock.lock().await;
            self.get_locked(source, &key, category_id, allow_stale).await
        };
        self.release_fetch_lock(&key, &lock).await;
        result
    }

    async fn get_locked(
        &self,
        source: &dyn DirectorySource,
        key: &Key,
        category_id: &str,
        allow_stale: bool,
    ) -> Result<(Vec<Node>, bool)> {
        // Re-check under the key lock: a coalesced concurrent get may have
        // populated the entry while we waited.
        if let Some(entry) = self.entries.read().await.get(key) {
            if Utc::now() - entry.fetched_at < self.window(source.id()) {
                return Ok((entry.children.clone(), false));
            }
        }

        match source.list_category(category_id).await {
            Ok(children) => {
                let entry = CacheEntry {
                    source: source.id(),
                    category_id: category_id.to_string(),
                    fetched_at: Utc::now(),
                    children: children.clone(),
                };
                {
                    let mut entries = self.entries.write().await;
                    entries.insert(key.clone(), entry);
                }
                if let Err(err) = self.persist().await {
                    // In-memory state is good; losing the disk copy only
                    // costs a refetch after restart.
                    warn!("failed to persist directory cache: {err}");
                }
                Ok((children, false))
            }
            Err(err) => {
                if allow_stale {
                    if let Some(entry) = self.entries.read().await.get(key) {
                        warn!(
                            category = %category_id,
                            "refresh failed ({err}); serving stale listing"
                        );
                        return Ok((entry.children.clone(), true));
                    }
                }
                Err(err)
            }
        }
    }

    /// Out-of-band cache clear: drops all entries and the file.
    pub async fn clear(&self) -> Result<()> {
        self.entries.write().await.clear();
        match tokio::fs::remove_file(&self.path).await {
            Ok(()) => Ok(()),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(err) => Err(DirectoryError::Persist(err)),
        }
    }

    fn window(&self, source: SourceId) -> Duration {
        self.windows.get(&source).copied().unwrap_or_else(|| Duration::hours(12))
    }

    async fn fetch_lock(&self, key: &Key) -> Arc<Mutex<()>> {
        let mut locks = self.fetch_locks.lock().await;
        locks.entry(key.clone()).or_default().clone()
    }

    /// Drop the map entry once no other get holds a clone (the map's
    /// reference plus ours is a strong count of 2).
    async fn release_fetch_lock(&self, key: &Key, lock: &Arc<Mutex<()>>) {
        let mut locks = self.fetch_locks.lock().await;
        if Arc::strong_count(lock) == 2 {
            locks.remove(key);
        }
    }

    /// Snapshot the entry map and atomically publish it: write to a temp
    /// file beside the target, then rename. One writer at a time, so a
    /// rename never publishes a temp file another writer is mid-write on.
    async fn persist(&self) -> std::io::Result<()> {
        let _writing = self.persist_lock.lock().await;
        let snapshot = {
            let entries = self.entries.read().await;
            let mut list: Vec<CacheEntry> = entries.values().cloned().collect();
            list.sort_by(|a, b| {
                (a.source.label(), &a.category_id).cmp(&(b.source.label(), &b.category_id))
            });
            CacheFile { entries: list }
        };
        let json = serde_json::to_vec_pretty(&snapshot)
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::Other, e))?;

        if let Some(parent) = self.path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        let tmp = self.path.with_extension("json.tmp");
        tokio::fs::write(&tmp, &json).await?;
        tokio::fs::rename(&tmp, &self.path).await?;
        debug!(path = %self.path.display(), "directory cache persisted");
        Ok(())
    }
}

fn load_entries(path: &Path) -> Result<HashMap<Key, CacheEntry>> {
    let content = match std::fs::read_to_string(path) {
        Ok(content) => content,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
            return Ok(HashMap::new());
        }
        Err(err) => {
            return Err(DirectoryError::CacheCorrupt {
                path: path.display().to_string(),
                reason: err.to_string(),
            });
        }
    };
    let file: CacheFile =
        serde_json::from_str(&content).map_err(|e| DirectoryError::CacheCorrupt {
            path: path.display().to_string(),
            reason: e.to_string(),
        })?;
    Ok(file
        .entries
        .into_iter()
        .map(|e| ((e.source, e.category_id.clone()), e))
        .collect())
}
