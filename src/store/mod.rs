pub mod disk;
#[cfg(test)]
pub mod memory;

use crate::core::cache::KeyValueCollection;
use anyhow::{Context, Result};
use disk::DiskCollection;
use fjall::{Keyspace, PartitionCreateOptions};
use std::{
    collections::HashMap,
    path::Path,
    sync::{Arc, RwLock},
};
use tracing::debug;

pub const EXPENSES_COLLECTION: &str = "expenses";
pub const SETTINGS_COLLECTION: &str = "settings";
pub const RATES_COLLECTION: &str = "exchange_rates";

/// A thread-safe key-value store that can hold multiple named collections,
/// each one a partition of the same fjall keyspace.
pub struct KeyValueStore {
    collections: RwLock<HashMap<String, Arc<dyn KeyValueCollection>>>,
    keyspace: Arc<Keyspace>,
}

impl KeyValueStore {
    pub fn open(data_path: &Path) -> Result<Self> {
        let store_dir = data_path.join("store");
        std::fs::create_dir_all(&store_dir)
            .with_context(|| format!("Failed to create directory: {}", store_dir.display()))?;
        let keyspace = fjall::Config::new(&store_dir)
            .open()
            .with_context(|| format!("Failed to open store at {}", store_dir.display()))?;
        debug!("Opened store at {}", store_dir.display());

        Ok(Self {
            collections: RwLock::new(HashMap::new()),
            keyspace: Arc::new(keyspace),
        })
    }

    /// Returns the named collection, creating it on first use.
    pub fn collection(&self, name: &str) -> Result<Arc<dyn KeyValueCollection>> {
        if let Some(existing) = self
            .collections
            .read()
            .map_err(|_| anyhow::anyhow!("Collection registry poisoned"))?
            .get(name)
        {
            return Ok(Arc::clone(existing));
        }

        let mut collections = self
            .collections
            .write()
            .map_err(|_| anyhow::anyhow!("Collection registry poisoned"))?;
        if let Some(existing) = collections.get(name) {
            return Ok(Arc::clone(existing));
        }

        let partition = self
            .keyspace
            .open_partition(name, PartitionCreateOptions::default())
            .with_context(|| format!("Failed to open collection: {name}"))?;
        let collection: Arc<dyn KeyValueCollection> =
            Arc::new(DiskCollection::new(Arc::clone(&self.keyspace), partition));
        collections.insert(name.to_string(), Arc::clone(&collection));
        Ok(collection)
    }
}
