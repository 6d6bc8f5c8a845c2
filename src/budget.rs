//! Monthly budget policy.
//!
//! A policy holds one budget amount (base currency) and the first month it
//! applies to. Changing the amount moves that month to the current one; no
//! history of earlier amounts is kept.
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, info};

use crate::conversion::CurrencyConverter;
use crate::core::currency::{BASE_CURRENCY, Currency};
use crate::core::money::{checked_amount, parse_amount};
use crate::core::month::YearMonth;
use crate::error::Result;
use crate::settings::SettingsStore;
use crate::summary::AmountView;

pub const DEFAULT_MONTHLY_BUDGET: Decimal = Decimal::from_parts(3000, 0, 0, false, 0);

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Policy {
    pub currency: Currency,
    pub monthly_budget: Decimal,
    pub budget_effective_from: YearMonth,
    pub created_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
}

impl Policy {
    /// Default policy for a user seen for the first time at `now`.
    pub fn default_as_of(now: DateTime<Utc>) -> Self {
        Self {
            currency: BASE_CURRENCY,
            monthly_budget: DEFAULT_MONTHLY_BUDGET,
            budget_effective_from: YearMonth::from_date(now.date_naive()),
            created_at: now,
            updated_at: None,
        }
    }

    pub fn has_budget_for_month(&self, month: YearMonth) -> bool {
        month >= self.budget_effective_from
    }

    /// Budget for `month` as seen through `view`, `None` before the
    /// effective month.
    pub fn budget_for_month(&self, month: YearMonth, view: &dyn AmountView) -> Option<Decimal> {
        self.has_budget_for_month(month)
            .then(|| view.present(self.monthly_budget))
    }

    /// The policy after applying `update` at `now`.
    pub fn updated(&self, update: &PolicyUpdate, now: DateTime<Utc>) -> Self {
        let budget_changed = update.monthly_budget != self.monthly_budget;
        Self {
            currency: update.currency,
            monthly_budget: update.monthly_budget,
            budget_effective_from: if budget_changed {
                YearMonth::from_date(now.date_naive())
            } else {
                self.budget_effective_from
            },
            created_at: self.created_at,
            updated_at: Some(now),
        }
    }
}

/// A validated settings change.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PolicyUpdate {
    pub monthly_budget: Decimal,
    pub currency: Currency,
}

impl PolicyUpdate {
    pub fn new(monthly_budget: Decimal, currency: Currency) -> Result<Self> {
        Ok(Self {
            monthly_budget: checked_amount(monthly_budget, "Monthly budget")?,
            currency,
        })
    }

    /// Validates raw input, both fields are required.
    pub fn parse(monthly_budget: &str, currency: &str) -> Result<Self> {
        let amount = parse_amount(monthly_budget)?;
        let currency = currency.parse()?;
        Self::new(amount, currency)
    }
}

/// Budget policy of one owner, mirrored from the settings store.
pub struct BudgetPolicy {
    owner: String,
    store: Arc<dyn SettingsStore>,
    policy: Policy,
}

impl BudgetPolicy {
    /// Loads the owner's policy, creating the default one on first access.
    pub async fn load(owner: &str, store: Arc<dyn SettingsStore>) -> Result<Self> {
        let policy = store.get_or_create(owner).await?;
        debug!(owner, effective_from = %policy.budget_effective_from, "Loaded budget policy");
        Ok(Self {
            owner: owner.to_string(),
            store,
            policy,
        })
    }

    pub fn policy(&self) -> &Policy {
        &self.policy
    }

    pub fn has_budget_for_month(&self, month: YearMonth) -> bool {
        self.policy.has_budget_for_month(month)
    }

    /// Budget for `month` in the converter's display currency.
    pub fn budget_for_month(
        &self,
        month: YearMonth,
        converter: &CurrencyConverter,
    ) -> Option<Decimal> {
        self.has_budget_for_month(month)
            .then(|| converter.convert_from_base(self.policy.monthly_budget))
    }

    pub async fn update(&mut self, update: PolicyUpdate) -> Result<&Policy> {
        self.update_as_of(update, Utc::now()).await
    }

    /// Writes the new policy to the store first. Local state only changes
    /// once that write succeeded.
    pub async fn update_as_of(
        &mut self,
        update: PolicyUpdate,
        now: DateTime<Utc>,
    ) -> Result<&Policy> {
        let next = self.policy.updated(&update, now);
        let stored = self.store.put(&self.owner, &next).await?;
        info!(
            owner = %self.owner,
            budget = %stored.monthly_budget,
            currency = %stored.currency,
            effective_from = %stored.budget_effective_from,
            "Budget policy updated"
        );
        self.policy = stored;
        Ok(&self.policy)
    }
}
