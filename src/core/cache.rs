//! Key-value collection abstraction shared by the record store, the settings
//! store and the exchange-rate cache.

use anyhow::{Context, Result};
use async_trait::async_trait;
use serde::{Serialize, de::DeserializeOwned};
use serde_json::Value;

#[async_trait]
pub trait KeyValueCollection: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<Value>>;

    async fn put(&self, key: &str, value: Value) -> Result<()>;

    /// Returns `true` if the key was present.
    async fn remove(&self, key: &str) -> Result<bool>;

    /// All entries, ordered by key.
    async fn entries(&self) -> Result<Vec<(String, Value)>>;
}

/// Reads `key` and deserializes it into `T`.
pub async fn get_as<T: DeserializeOwned>(
    collection: &dyn KeyValueCollection,
    key: &str,
) -> Result<Option<T>> {
    match collection.get(key).await? {
        Some(value) => {
            let typed = serde_json::from_value(value)
                .with_context(|| format!("Failed to decode stored value for key: {key}"))?;
            Ok(Some(typed))
        }
        None => Ok(None),
    }
}

/// Serializes `value` and writes it under `key`.
pub async fn put_as<T: Serialize + ?Sized>(
    collection: &dyn KeyValueCollection,
    key: &str,
    value: &T,
) -> Result<()> {
    let value = serde_json::to_value(value)
        .with_context(|| format!("Failed to encode value for key: {key}"))?;
    collection.put(key, value).await
}
