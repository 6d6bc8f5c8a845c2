//! Per-user settings persistence.

use async_trait::async_trait;
use chrono::Utc;
use std::sync::Arc;
use tracing::{debug, info};

use crate::budget::Policy;
use crate::core::cache::{self, KeyValueCollection};
use crate::error::{EngineError, Result};

#[async_trait]
pub trait SettingsStore: Send + Sync {
    /// Returns the owner's policy. A user without one gets the default
    /// policy, which is persisted before being returned.
    async fn get_or_create(&self, owner: &str) -> Result<Policy>;

    /// Returns the stored policy without creating one.
    async fn find(&self, owner: &str) -> Result<Option<Policy>>;

    /// Replaces the owner's policy and returns what was stored.
    async fn put(&self, owner: &str, policy: &Policy) -> Result<Policy>;
}

/// Settings kept in a key-value collection, one entry per owner.
pub struct CollectionSettingsStore {
    collection: Arc<dyn KeyValueCollection>,
}

impl CollectionSettingsStore {
    pub fn new(collection: Arc<dyn KeyValueCollection>) -> Self {
        Self { collection }
    }
}

fn check_owner(owner: &str) -> Result<()> {
    if owner.trim().is_empty() {
        return Err(EngineError::validation("Owner is required"));
    }
    Ok(())
}

#[async_trait]
impl SettingsStore for CollectionSettingsStore {
    async fn get_or_create(&self, owner: &str) -> Result<Policy> {
        if let Some(existing) = self.find(owner).await? {
            debug!(owner, "Found existing settings");
            return Ok(existing);
        }

        let defaults = Policy::default_as_of(Utc::now());
        cache::put_as(self.collection.as_ref(), owner, &defaults).await?;
        info!(owner, "Created default settings for new user");
        Ok(defaults)
    }

    async fn find(&self, owner: &str) -> Result<Option<Policy>> {
        check_owner(owner)?;
        Ok(cache::get_as(self.collection.as_ref(), owner).await?)
    }

    async fn put(&self, owner: &str, policy: &Policy) -> Result<Policy> {
        check_owner(owner)?;
        cache::put_as(self.collection.as_ref(), owner, policy).await?;
        debug!(owner, "Settings saved");
        Ok(policy.clone())
    }
}
