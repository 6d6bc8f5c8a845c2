use crate::core::cache::KeyValueCollection;
use anyhow::Result;
use async_trait::async_trait;
use serde_json::Value;
use std::collections::BTreeMap;
use tokio::sync::Mutex;
use tracing::debug;

/// In-memory collection, lost when the process exits.
#[derive(Default)]
pub struct MemoryCollection {
    inner: Mutex<BTreeMap<String, Value>>,
}

impl MemoryCollection {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl KeyValueCollection for MemoryCollection {
    async fn get(&self, key: &str) -> Result<Option<Value>> {
        let entries = self.inner.lock().await;
        let value = entries.get(key).cloned();
        if value.is_some() {
            debug!("Collection HIT for key: {}", key);
        } else {
            debug!("Collection MISS for key: {}", key);
        }
        Ok(value)
    }

    async fn put(&self, key: &str, value: Value) -> Result<()> {
        let mut entries = self.inner.lock().await;
        debug!("Collection PUT for key: {}", key);
        entries.insert(key.to_string(), value);
        Ok(())
    }

    async fn remove(&self, key: &str) -> Result<bool> {
        let mut entries = self.inner.lock().await;
        debug!("Collection REMOVE for key: {}", key);
        Ok(entries.remove(key).is_some())
    }

    async fn entries(&self) -> Result<Vec<(String, Value)>> {
        let entries = self.inner.lock().await;
        Ok(entries
            .iter()
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn test_collection_get_put() {
        let collection = MemoryCollection::new();

        // Initially, collection is empty
        assert!(collection.get("key1").await.unwrap().is_none());

        collection.put("key1", json!(123)).await.unwrap();

        assert_eq!(collection.get("key1").await.unwrap(), Some(json!(123)));
        assert!(collection.get("key2").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_collection_remove() {
        let collection = MemoryCollection::new();

        collection.put("key1", json!({"a": 1})).await.unwrap();
        assert!(collection.remove("key1").await.unwrap());
        assert!(!collection.remove("key1").await.unwrap());
        assert!(collection.get("key1").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_collection_entries_sorted() {
        let collection = MemoryCollection::new();

        collection.put("b", json!(2)).await.unwrap();
        collection.put("a", json!(1)).await.unwrap();

        let entries = collection.entries().await.unwrap();
        assert_eq!(
            entries,
            vec![("a".to_string(), json!(1)), ("b".to_string(), json!(2))]
        );
    }
}
