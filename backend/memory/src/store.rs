use std::collections::HashMap;

use anyhow::Result;
use async_trait::async_trait;
use tokio::sync::RwLock;

use screentask_core::{OutputCache, OutputRecord};

/// Simple in-memory output cache for tests and local runs.
/// Uniqueness on `source_img` comes from the map key.
pub struct InMemoryOutputCache {
    records: RwLock<HashMap<String, OutputRecord>>,
}

impl InMemoryOutputCache {
    pub fn new() -> Self {
        Self {
            records: RwLock::new(HashMap::new()),
        }
    }

    /// Number of cached rows.
    pub async fn len(&self) -> usize {
        self.records.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.records.read().await.is_empty()
    }
}

impl Default for InMemoryOutputCache {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl OutputCache for InMemoryOutputCache {
    async fn lookup(&self, source_img: &str) -> Result<Option<OutputRecord>> {
        Ok(self.records.read().await.get(source_img).cloned())
    }

    async fn insert(&self, record: &OutputRecord) -> Result<bool> {
        let mut records = self.records.write().await;
        if records.contains_key(&record.source_img) {
            return Ok(false);
        }
        records.insert(record.source_img.clone(), record.clone());
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(url: &str, name: &str) -> OutputRecord {
        OutputRecord {
            name: name.to_string(),
            description: "reason".to_string(),
            category: "other".to_string(),
            source_img: url.to_string(),
        }
    }

    #[tokio::test]
    async fn test_lookup_missing_is_none() {
        let cache = InMemoryOutputCache::new();
        assert!(cache.lookup("https://cdn/a.png").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_insert_then_lookup() {
        let cache = InMemoryOutputCache::new();
        assert!(cache.insert(&record("https://cdn/a.png", "first")).await.unwrap());

        let found = cache.lookup("https://cdn/a.png").await.unwrap().unwrap();
        assert_eq!(found.name, "first");
    }

    #[tokio::test]
    async fn test_second_insert_keeps_first_row() {
        let cache = InMemoryOutputCache::new();
        assert!(cache.insert(&record("https://cdn/a.png", "first")).await.unwrap());
        assert!(!cache.insert(&record("https://cdn/a.png", "second")).await.unwrap());

        assert_eq!(cache.len().await, 1);
        let found = cache.lookup("https://cdn/a.png").await.unwrap().unwrap();
        assert_eq!(found.name, "first");
    }
}
