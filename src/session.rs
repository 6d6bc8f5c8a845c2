//! Per-owner engine state.
//!
//! A session owns the converter, the budget policy and the mirror of one
//! owner. Nothing is shared between sessions: a new owner always starts from
//! built-in rates and a freshly loaded policy.
use std::sync::Arc;
use tracing::{debug, info};

use crate::budget::{BudgetPolicy, Policy, PolicyUpdate};
use crate::conversion::{CurrencyConverter, RefreshOutcome};
use crate::core::cache::KeyValueCollection;
use crate::core::currency::RateFeed;
use crate::core::month::YearMonth;
use crate::error::{EngineError, Result};
use crate::mirror::ExpenseMirror;
use crate::records::RecordStore;
use crate::settings::SettingsStore;
use crate::summary::MonthlySummary;

/// Backends a session is opened against.
#[derive(Clone)]
pub struct SessionDeps {
    pub records: Arc<dyn RecordStore>,
    pub settings: Arc<dyn SettingsStore>,
    pub primary: Arc<dyn RateFeed>,
    pub fallback: Arc<dyn RateFeed>,
    /// Durable copy of the last refreshed rate table.
    pub rate_cache: Option<Arc<dyn KeyValueCollection>>,
}

pub struct Session {
    owner: String,
    converter: CurrencyConverter,
    budget: BudgetPolicy,
    mirror: ExpenseMirror,
}

impl Session {
    /// Loads cached rates, the owner's policy and records. Rates are
    /// refreshed when stale; a failed refresh is not an error.
    pub async fn open(owner: &str, deps: &SessionDeps) -> Result<Self> {
        if owner.trim().is_empty() {
            return Err(EngineError::validation("Owner is required"));
        }

        let mut converter =
            CurrencyConverter::new(Arc::clone(&deps.primary), Arc::clone(&deps.fallback));
        if let Some(cache) = &deps.rate_cache {
            converter = converter.with_cache(Arc::clone(cache));
            converter.load_cached().await;
        }

        let budget = BudgetPolicy::load(owner, Arc::clone(&deps.settings)).await?;
        converter.set_display_currency(budget.policy().currency.code());

        if converter.should_refresh() {
            let outcome = converter.refresh_rates().await;
            debug!(owner, ?outcome, "Refreshed stale exchange rates");
        }

        let mirror = ExpenseMirror::load(owner, Arc::clone(&deps.records)).await?;
        info!(
            owner,
            currency = converter.display_currency(),
            expenses = mirror.records().len(),
            "Session opened"
        );

        Ok(Self {
            owner: owner.to_string(),
            converter,
            budget,
            mirror,
        })
    }

    pub fn owner(&self) -> &str {
        &self.owner
    }

    pub fn converter(&self) -> &CurrencyConverter {
        &self.converter
    }

    pub fn policy(&self) -> &Policy {
        self.budget.policy()
    }

    pub fn budget(&self) -> &BudgetPolicy {
        &self.budget
    }

    pub fn mirror(&self) -> &ExpenseMirror {
        &self.mirror
    }

    pub fn mirror_mut(&mut self) -> &mut ExpenseMirror {
        &mut self.mirror
    }

    /// Summary of `month` in the display currency.
    pub fn monthly_summary(&self, month: YearMonth) -> MonthlySummary {
        self.mirror
            .summarize(month, self.budget.policy(), &self.converter)
    }

    /// Persists new settings and switches the display currency once the
    /// write went through.
    pub async fn update_settings(&mut self, update: PolicyUpdate) -> Result<&Policy> {
        self.budget.update(update).await?;
        self.converter
            .set_display_currency(update.currency.code());
        Ok(self.budget.policy())
    }

    pub async fn refresh_rates(&mut self) -> RefreshOutcome {
        self.converter.refresh_rates().await
    }

    /// Ends the session. Rates go back to the built-in table before the
    /// policy and mirror are dropped.
    pub fn close(mut self) {
        self.converter.reset();
        info!(owner = %self.owner, "Session closed");
    }
}
