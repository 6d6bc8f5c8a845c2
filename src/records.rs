//! Authoritative store of expense records.

use async_trait::async_trait;
use chrono::Utc;
use std::cmp::{Ordering, Reverse};
use std::sync::Arc;
use tracing::{debug, info};
use uuid::Uuid;

use crate::core::cache::{self, KeyValueCollection};
use crate::core::expense::{ExpenseChanges, ExpenseRecord, NewExpense};
use crate::core::month::DateRange;
use crate::error::{EngineError, Result};

/// Every mutation of an existing record checks that the requester owns it.
#[async_trait]
pub trait RecordStore: Send + Sync {
    /// Records of `owner`, newest date first, optionally limited to `range`.
    async fn list(&self, owner: &str, range: Option<DateRange>) -> Result<Vec<ExpenseRecord>>;

    async fn create(&self, owner: &str, expense: NewExpense) -> Result<ExpenseRecord>;

    async fn update(&self, owner: &str, id: &str, changes: ExpenseChanges)
    -> Result<ExpenseRecord>;

    async fn delete(&self, owner: &str, id: &str) -> Result<()>;
}

/// Record store over a key-value collection, keyed by record id.
pub struct CollectionRecordStore {
    collection: Arc<dyn KeyValueCollection>,
}

impl CollectionRecordStore {
    pub fn new(collection: Arc<dyn KeyValueCollection>) -> Self {
        Self { collection }
    }

    /// Loads a record and verifies ownership.
    async fn owned(&self, owner: &str, id: &str) -> Result<ExpenseRecord> {
        let record: ExpenseRecord = cache::get_as(self.collection.as_ref(), id)
            .await?
            .ok_or_else(|| EngineError::NotFound(format!("expense {id}")))?;
        if record.owner != owner {
            debug!(id, "Rejected access to expense of another owner");
            return Err(EngineError::Forbidden);
        }
        Ok(record)
    }
}

fn check_owner(owner: &str) -> Result<()> {
    if owner.trim().is_empty() {
        return Err(EngineError::validation("Owner is required"));
    }
    Ok(())
}

/// Newest date first. Same-day records: most recently created first, then id.
pub fn newest_first(a: &ExpenseRecord, b: &ExpenseRecord) -> Ordering {
    (Reverse(a.date), Reverse(a.created_at), &a.id).cmp(&(
        Reverse(b.date),
        Reverse(b.created_at),
        &b.id,
    ))
}

#[async_trait]
impl RecordStore for CollectionRecordStore {
    async fn list(&self, owner: &str, range: Option<DateRange>) -> Result<Vec<ExpenseRecord>> {
        check_owner(owner)?;
        let mut records = Vec::new();
        for (key, value) in self.collection.entries().await? {
            let record: ExpenseRecord = serde_json::from_value(value).map_err(|e| {
                EngineError::Upstream(anyhow::anyhow!("Corrupt expense {key}: {e}"))
            })?;
            if record.owner != owner {
                continue;
            }
            if range.is_some_and(|r| !r.contains(record.date)) {
                continue;
            }
            records.push(record);
        }
        records.sort_by(newest_first);
        debug!(owner, count = records.len(), "Listed expenses");
        Ok(records)
    }

    async fn create(&self, owner: &str, expense: NewExpense) -> Result<ExpenseRecord> {
        check_owner(owner)?;
        let expense = expense.normalize()?;
        let now = Utc::now();
        let record = ExpenseRecord {
            id: Uuid::new_v4().to_string(),
            owner: owner.to_string(),
            name: expense.name,
            amount: expense.amount,
            category: expense.category,
            date: expense.date,
            note: expense.note,
            created_at: now,
            updated_at: now,
        };
        cache::put_as(self.collection.as_ref(), &record.id, &record).await?;
        info!(owner, id = %record.id, "Expense created");
        Ok(record)
    }

    async fn update(
        &self,
        owner: &str,
        id: &str,
        changes: ExpenseChanges,
    ) -> Result<ExpenseRecord> {
        check_owner(owner)?;
        let changes = changes.normalize()?;
        let mut record = self.owned(owner, id).await?;

        changes.apply_to(&mut record);
        record.updated_at = Utc::now();
        cache::put_as(self.collection.as_ref(), id, &record).await?;
        info!(owner, id, "Expense updated");
        Ok(record)
    }

    async fn delete(&self, owner: &str, id: &str) -> Result<()> {
        check_owner(owner)?;
        self.owned(owner, id).await?;
        self.collection.remove(id).await?;
        info!(owner, id, "Expense deleted");
        Ok(())
    }
}
