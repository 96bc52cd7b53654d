// In-process cache backend

use dashmap::DashMap;
use serde_json::Value;
use std::sync::Arc;

use super::{Cache, Result};

/// Thread-safe in-memory cache
///
/// Clones share the same underlying map.
#[derive(Clone, Default)]
pub struct InMemoryCache {
    data: Arc<DashMap<String, Value>>,
}

impl InMemoryCache {
    /// Create an empty cache
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored keys
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Check if the cache is empty
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}

impl Cache for InMemoryCache {
    fn get(&self, key: &str) -> Result<Option<Value>> {
        Ok(self.data.get(key).map(|entry| entry.value().clone()))
    }

    fn set(&self, key: &str, value: Value) -> Result<()> {
        self.data.insert(key.to_string(), value);
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<()> {
        self.data.remove(key);
        Ok(())
    }

    fn remove_all(&self) -> Result<()> {
        tracing::debug!("Clearing in-memory cache ({} keys)", self.data.len());
        self.data.clear();
        Ok(())
    }
}
