use crate::core::cache::KeyValueCollection;
use anyhow::{Context, Result};
use async_trait::async_trait;
use fjall::{Keyspace, PartitionHandle, PersistMode};
use serde_json::Value;
use std::sync::Arc;
use tracing::debug;

/// Collection backed by a single fjall partition. Every write is synced to
/// disk before returning, so a successful `put` is durable.
pub struct DiskCollection {
    keyspace: Arc<Keyspace>,
    partition: PartitionHandle,
}

impl DiskCollection {
    pub fn new(keyspace: Arc<Keyspace>, partition: PartitionHandle) -> Self {
        Self {
            keyspace,
            partition,
        }
    }

    fn persist(&self) -> Result<()> {
        self.keyspace
            .persist(PersistMode::SyncAll)
            .context("Failed to flush keyspace to disk")
    }
}

#[async_trait]
impl KeyValueCollection for DiskCollection {
    async fn get(&self, key: &str) -> Result<Option<Value>> {
        match self.partition.get(key)? {
            Some(bytes) => {
                debug!("Collection HIT for key: {}", key);
                let value = serde_json::from_slice(&bytes)
                    .with_context(|| format!("Corrupt entry for key: {key}"))?;
                Ok(Some(value))
            }
            None => {
                debug!("Collection MISS for key: {}", key);
                Ok(None)
            }
        }
    }

    async fn put(&self, key: &str, value: Value) -> Result<()> {
        self.partition.insert(key, serde_json::to_vec(&value)?)?;
        self.persist()?;
        debug!("Collection PUT for key: {}", key);
        Ok(())
    }

    async fn remove(&self, key: &str) -> Result<bool> {
        let existed = self.partition.contains_key(key)?;
        if existed {
            self.partition.remove(key)?;
            self.persist()?;
        }
        debug!("Collection REMOVE for key: {}", key);
        Ok(existed)
    }

    async fn entries(&self) -> Result<Vec<(String, Value)>> {
        let mut entries = Vec::new();
        for item in self.partition.iter() {
            let (key, bytes) = item?;
            let key = String::from_utf8(key.to_vec()).context("Non UTF-8 key in collection")?;
            let value = serde_json::from_slice(&bytes)
                .with_context(|| format!("Corrupt entry for key: {key}"))?;
            entries.push((key, value));
        }
        Ok(entries)
    }
}
