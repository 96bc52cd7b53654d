// File-persisted cache backend
//
// The whole map is stored as one JSON object. Reads reload it and writes
// re-read it before rewriting, so several processes can share one cache
// file. Last writer wins. A missing or blank file does not clear the
// in-memory mirror: values already seen keep being served until a write
// or `remove_all` replaces them. Writes go through a temporary file that is
// renamed over the cache file, so readers never see a partial write.

use dashmap::DashMap;
use serde_json::Value;
use std::collections::BTreeMap;
use std::io::{ErrorKind, Write};
use tempfile::NamedTempFile;
use std::path::{Path, PathBuf};

use super::{Cache, CacheError, Result};

/// File name used inside the settings directory
pub const CACHE_FILE_NAME: &str = "cache";

/// JSON file cache with an in-memory mirror
pub struct DiskCache {
    /// Backing file
    path: PathBuf,

    /// Last known contents of the file
    mirror: DashMap<String, Value>,
}

impl DiskCache {
    /// Create a cache backed by `path`; the file is created on first write
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            mirror: DashMap::new(),
        }
    }

    /// Create a cache stored as [`CACHE_FILE_NAME`] inside `settings_dir`
    pub fn in_dir(settings_dir: &Path) -> Self {
        Self::new(settings_dir.join(CACHE_FILE_NAME))
    }

    /// Path of the backing file
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Replace the mirror with the file contents.
    /// A missing or blank file leaves the mirror untouched.
    fn reload(&self) -> Result<()> {
        let contents = match std::fs::read_to_string(&self.path) {
            Ok(contents) => contents,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(()),
            Err(source) => {
                return Err(CacheError::Io {
                    path: self.path.clone(),
                    source,
                })
            }
        };

        if contents.trim().is_empty() {
            return Ok(());
        }

        let data: BTreeMap<String, Value> = serde_json::from_str(&contents)?;
        self.mirror.clear();
        for (key, value) in data {
            self.mirror.insert(key, value);
        }

        Ok(())
    }

    /// Write the mirror to disk, creating parent directories as needed
    fn persist(&self) -> Result<()> {
        let parent = self
            .path
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .unwrap_or_else(|| Path::new("."));
        std::fs::create_dir_all(parent).map_err(|source| CacheError::Io {
            path: parent.to_path_buf(),
            source,
        })?;

        let snapshot: BTreeMap<String, Value> = self
            .mirror
            .iter()
            .map(|entry| (entry.key().clone(), entry.value().clone()))
            .collect();
        let body = serde_json::to_string(&snapshot)?;

        let io_err = |source: std::io::Error| CacheError::Io {
            path: self.path.clone(),
            source,
        };
        let mut staged = NamedTempFile::new_in(parent).map_err(io_err)?;
        staged.write_all(body.as_bytes()).map_err(io_err)?;
        staged.persist(&self.path).map_err(|e| io_err(e.error))?;

        tracing::trace!(
            path = %self.path.display(),
            keys = snapshot.len(),
            "Persisted cache file"
        );
        Ok(())
    }
}

impl Cache for DiskCache {
    fn get(&self, key: &str) -> Result<Option<Value>> {
        self.reload()?;
        Ok(self.mirror.get(key).map(|entry| entry.value().clone()))
    }

    fn set(&self, key: &str, value: Value) -> Result<()> {
        match self.reload() {
            Ok(()) => {}
            Err(CacheError::Serde(e)) => {
                tracing::warn!(
                    path = %self.path.display(),
                    "Cache file is malformed, overwriting it: {}",
                    e
                );
            }
            Err(e) => return Err(e),
        }
        self.mirror.insert(key.to_string(), value);
        self.persist()
    }

    fn remove(&self, key: &str) -> Result<()> {
        self.reload()?;
        self.mirror.remove(key);
        self.persist()
    }

    fn remove_all(&self) -> Result<()> {
        self.mirror.clear();
        self.persist()
    }
}
