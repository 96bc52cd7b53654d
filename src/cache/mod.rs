// Key-value cache abstraction
// Backs token storage for the authentication manager

mod disk;
mod memory;

pub use disk::DiskCache;
pub use memory::InMemoryCache;

use serde::{de::DeserializeOwned, Serialize};
use serde_json::Value;
use std::path::PathBuf;
use thiserror::Error;

/// Errors raised by cache backends
#[derive(Error, Debug)]
pub enum CacheError {
    /// Reading or writing the backing file failed
    #[error("Cache file I/O failed for {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A value could not be converted to or from JSON
    #[error("Cache serialization failed: {0}")]
    Serde(#[from] serde_json::Error),
}

/// Result type alias for cache operations
pub type Result<T> = std::result::Result<T, CacheError>;

/// String-keyed store of JSON values
///
/// Last writer wins. Backends make no promise beyond single-call atomicity,
/// so a read followed by a write may interleave with other writers.
pub trait Cache: Send + Sync {
    /// Value stored under `key`, or `None` if it was never set or was removed
    fn get(&self, key: &str) -> Result<Option<Value>>;

    /// Store `value` under `key`, replacing any previous value
    fn set(&self, key: &str, value: Value) -> Result<()>;

    /// Delete `key` if present
    fn remove(&self, key: &str) -> Result<()>;

    /// Delete every key
    fn remove_all(&self) -> Result<()>;
}

/// Typed access on top of any [`Cache`]
pub trait CacheExt: Cache {
    fn get_as<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>> {
        match self.get(key)? {
            Some(value) => Ok(Some(serde_json::from_value(value)?)),
            None => Ok(None),
        }
    }

    fn set_as<T: Serialize>(&self, key: &str, value: &T) -> Result<()> {
        self.set(key, serde_json::to_value(value)?)
    }
}

impl<C: Cache + ?Sized> CacheExt for C {}
