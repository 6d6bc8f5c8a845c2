//! In-memory mirror of one owner's records.
//!
//! Mutations go to the record store first. The mirror only changes after the
//! store call succeeded, so it never shows state that was not committed.
use rust_decimal::{Decimal, RoundingStrategy};
use serde::Serialize;
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::debug;

use crate::budget::Policy;
use crate::core::expense::{Category, ExpenseChanges, ExpenseRecord, NewExpense};
use crate::core::money::{add_to_total, round_cents};
use crate::core::month::YearMonth;
use crate::error::Result;
use crate::records::{RecordStore, newest_first};
use crate::summary::{self, AmountView, MonthlySummary};

pub const RECENT_EXPENSES_LIMIT: usize = 10;

/// The category with the largest spend.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TopCategory {
    pub category: Category,
    pub amount: Decimal,
    /// Share of all spending, whole percent.
    pub percentage: Decimal,
}

/// Picks the largest of `by_category`, with its share of `total`. Equal sums
/// go to the category listed first in [`Category::ALL`].
pub fn top_category(
    by_category: &BTreeMap<Category, Decimal>,
    total: Decimal,
) -> Option<TopCategory> {
    let mut top: Option<(Category, Decimal)> = None;
    for (&category, &amount) in by_category {
        if top.is_none_or(|(_, best)| amount > best) {
            top = Some((category, amount));
        }
    }

    let (category, amount) = top?;
    // amount <= total, so the share never exceeds 100
    let percentage = amount
        .checked_div(total)
        .and_then(|share| share.checked_mul(Decimal::ONE_HUNDRED))
        .map(|p| p.round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero))
        .unwrap_or(Decimal::ZERO);
    Some(TopCategory {
        category,
        amount: round_cents(amount),
        percentage,
    })
}

pub struct ExpenseMirror {
    owner: String,
    store: Arc<dyn RecordStore>,
    records: Vec<ExpenseRecord>,
}

impl ExpenseMirror {
    pub async fn load(owner: &str, store: Arc<dyn RecordStore>) -> Result<Self> {
        let records = store.list(owner, None).await?;
        debug!(owner, count = records.len(), "Loaded expense mirror");
        Ok(Self {
            owner: owner.to_string(),
            store,
            records,
        })
    }

    pub fn owner(&self) -> &str {
        &self.owner
    }

    pub fn records(&self) -> &[ExpenseRecord] {
        &self.records
    }

    pub fn find(&self, id: &str) -> Option<&ExpenseRecord> {
        self.records.iter().find(|r| r.id == id)
    }

    pub async fn add(&mut self, expense: NewExpense) -> Result<&ExpenseRecord> {
        let record = self.store.create(&self.owner, expense).await?;
        self.records.insert(0, record);
        Ok(&self.records[0])
    }

    pub async fn update(&mut self, id: &str, changes: ExpenseChanges) -> Result<&ExpenseRecord> {
        let record = self.store.update(&self.owner, id, changes).await?;
        let index = match self.records.iter().position(|r| r.id == id) {
            Some(index) => {
                self.records[index] = record;
                index
            }
            None => {
                self.records.insert(0, record);
                0
            }
        };
        Ok(&self.records[index])
    }

    pub async fn delete(&mut self, id: &str) -> Result<()> {
        self.store.delete(&self.owner, id).await?;
        self.records.retain(|r| r.id != id);
        Ok(())
    }

    /// Sum of every mirrored record, base currency.
    pub fn total_expenses(&self) -> Decimal {
        round_cents(
            self.records
                .iter()
                .fold(Decimal::ZERO, |total, r| add_to_total(total, r.amount)),
        )
    }

    /// The most recent records, newest date first.
    pub fn recent_expenses(&self) -> Vec<&ExpenseRecord> {
        let mut recent: Vec<&ExpenseRecord> = self.records.iter().collect();
        recent.sort_by(|a, b| newest_first(a, b));
        recent.truncate(RECENT_EXPENSES_LIMIT);
        recent
    }

    pub fn expenses_by_category(&self) -> BTreeMap<Category, Decimal> {
        let mut totals = BTreeMap::new();
        for record in &self.records {
            let total = totals.entry(record.category).or_insert(Decimal::ZERO);
            *total = add_to_total(*total, record.amount);
        }
        totals
    }

    /// Equal sums go to the category listed first in [`Category::ALL`].
    pub fn top_category(&self) -> Option<TopCategory> {
        top_category(&self.expenses_by_category(), self.total_expenses())
    }

    pub fn expenses_in_month(&self, month: YearMonth) -> Vec<&ExpenseRecord> {
        self.records
            .iter()
            .filter(|r| month.contains(r.date))
            .collect()
    }

    pub fn expenses_in_category(&self, category: Category) -> Vec<&ExpenseRecord> {
        self.records
            .iter()
            .filter(|r| r.category == category)
            .collect()
    }

    pub fn summarize(
        &self,
        month: YearMonth,
        policy: &Policy,
        view: &dyn AmountView,
    ) -> MonthlySummary {
        summary::summarize(&self.records, month, policy, view)
    }
}
