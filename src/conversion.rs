//! Conversion between the base currency and the display currency.
//!
//! The converter owns a rate table anchored to [`BASE_CURRENCY`]. Rates are
//! refreshed from a primary feed, falling back to a secondary feed that is
//! anchored elsewhere and re-anchored before use. Refresh failures never
//! propagate; they are kept as unit state and the previous table stays.
use chrono::{DateTime, TimeDelta, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::core::cache::{self, KeyValueCollection};
use crate::core::currency::{BASE_CURRENCY, RateFeed};
use crate::core::money::round_cents;

/// Key of the cached table inside the rates collection. Not user scoped.
pub const CACHED_RATES_KEY: &str = "latest";

const REFRESH_INTERVAL_HOURS: i64 = 24;

/// Rates used until the first refresh completes.
const DEFAULT_RATES: [(&str, Decimal); 4] = [
    ("EUR", Decimal::ONE),
    ("USD", Decimal::from_parts(108, 0, 0, false, 2)),
    ("GBP", Decimal::from_parts(86, 0, 0, false, 2)),
    ("JPY", Decimal::from_parts(16150, 0, 0, false, 2)),
];

/// Units of each currency per one unit of the base currency.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RateTable {
    rates: BTreeMap<String, Decimal>,
    last_updated: Option<DateTime<Utc>>,
}

impl Default for RateTable {
    fn default() -> Self {
        Self {
            rates: DEFAULT_RATES
                .iter()
                .map(|(code, rate)| (code.to_string(), *rate))
                .collect(),
            last_updated: None,
        }
    }
}

impl RateTable {
    pub fn rate(&self, code: &str) -> Option<Decimal> {
        self.rates.get(&code.to_uppercase()).copied()
    }

    pub fn rates(&self) -> &BTreeMap<String, Decimal> {
        &self.rates
    }

    pub fn last_updated(&self) -> Option<DateTime<Utc>> {
        self.last_updated
    }

    /// Merges freshly fetched rates over the current ones. Codes the feed
    /// did not return keep their previous value.
    fn install(&mut self, fresh: HashMap<String, Decimal>, at: DateTime<Utc>) {
        for (code, rate) in fresh {
            if rate > Decimal::ZERO {
                self.rates.insert(code.to_uppercase(), rate);
            }
        }
        self.rates
            .insert(BASE_CURRENCY.code().to_string(), Decimal::ONE);
        self.last_updated = Some(at);
    }

    fn normalized(mut self) -> Self {
        self.rates.retain(|_, rate| *rate > Decimal::ZERO);
        self.rates
            .insert(BASE_CURRENCY.code().to_string(), Decimal::ONE);
        self
    }
}

/// Which source, if any, supplied the rates during a refresh.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefreshOutcome {
    Primary,
    Fallback,
    Failed,
}

pub struct CurrencyConverter {
    table: RateTable,
    display_currency: String,
    last_error: Option<String>,
    primary: Arc<dyn RateFeed>,
    fallback: Arc<dyn RateFeed>,
    cache: Option<Arc<dyn KeyValueCollection>>,
}

impl CurrencyConverter {
    pub fn new(primary: Arc<dyn RateFeed>, fallback: Arc<dyn RateFeed>) -> Self {
        Self {
            table: RateTable::default(),
            display_currency: BASE_CURRENCY.code().to_string(),
            last_error: None,
            primary,
            fallback,
            cache: None,
        }
    }

    /// Persists refreshed tables to `cache` and allows [`Self::load_cached`].
    pub fn with_cache(mut self, cache: Arc<dyn KeyValueCollection>) -> Self {
        self.cache = Some(cache);
        self
    }

    pub fn table(&self) -> &RateTable {
        &self.table
    }

    pub fn display_currency(&self) -> &str {
        &self.display_currency
    }

    pub fn set_display_currency(&mut self, code: &str) {
        self.display_currency = code.trim().to_uppercase();
    }

    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    pub fn has_error(&self) -> bool {
        self.last_error.is_some()
    }

    /// Rate for the display currency. An unknown code converts 1:1.
    pub fn display_rate(&self) -> Decimal {
        self.table
            .rate(&self.display_currency)
            .unwrap_or(Decimal::ONE)
    }

    /// Converts a base currency amount for display. `None` and zero give zero.
    /// A product outside the `Decimal` range leaves the amount unconverted.
    pub fn convert_from_base(&self, amount: impl Into<Option<Decimal>>) -> Decimal {
        match amount.into() {
            Some(amount) if !amount.is_zero() => {
                let rate = self.display_rate();
                amount.checked_mul(rate).map(round_cents).unwrap_or_else(|| {
                    warn!(
                        %amount,
                        %rate,
                        currency = %self.display_currency,
                        "Conversion from base overflowed, showing unconverted amount"
                    );
                    round_cents(amount)
                })
            }
            _ => Decimal::ZERO,
        }
    }

    /// Converts a display currency amount back to the base currency.
    pub fn convert_to_base(&self, amount: impl Into<Option<Decimal>>) -> Decimal {
        match amount.into() {
            Some(amount) if !amount.is_zero() => {
                let rate = self.display_rate();
                amount.checked_div(rate).map(round_cents).unwrap_or_else(|| {
                    warn!(
                        %amount,
                        %rate,
                        currency = %self.display_currency,
                        "Conversion to base overflowed, keeping unconverted amount"
                    );
                    round_cents(amount)
                })
            }
            _ => Decimal::ZERO,
        }
    }

    pub fn should_refresh(&self) -> bool {
        self.should_refresh_at(Utc::now())
    }

    pub fn should_refresh_at(&self, now: DateTime<Utc>) -> bool {
        match self.table.last_updated {
            None => true,
            Some(last) => now - last > TimeDelta::hours(REFRESH_INTERVAL_HOURS),
        }
    }

    pub async fn refresh_rates(&mut self) -> RefreshOutcome {
        self.refresh_rates_at(Utc::now()).await
    }

    /// Fetches from the primary feed, then the fallback. On total failure
    /// the current table is kept and the error is recorded.
    pub async fn refresh_rates_at(&mut self, now: DateTime<Utc>) -> RefreshOutcome {
        let primary = Arc::clone(&self.primary);
        let fallback = Arc::clone(&self.fallback);

        let primary_error = match fetch_anchored(primary.as_ref()).await {
            Ok((anchor, rates)) => {
                self.install(rates, now).await;
                info!(feed = primary.name(), anchor = %anchor, "Exchange rates refreshed");
                return RefreshOutcome::Primary;
            }
            Err(e) => e,
        };
        warn!(
            feed = primary.name(),
            error = %primary_error,
            "Primary rate feed failed, trying fallback"
        );

        let fallback_error = match fetch_anchored(fallback.as_ref()).await {
            Ok((anchor, rates)) => {
                self.install(rates, now).await;
                info!(
                    feed = fallback.name(),
                    anchor = %anchor,
                    "Exchange rates refreshed from fallback"
                );
                return RefreshOutcome::Fallback;
            }
            Err(e) => e,
        };
        warn!(
            feed = fallback.name(),
            error = %fallback_error,
            "Fallback rate feed failed, keeping previous rates"
        );

        self.last_error = Some(format!(
            "Failed to refresh exchange rates: {} ({primary_error}); {} ({fallback_error})",
            primary.name(),
            fallback.name(),
        ));
        RefreshOutcome::Failed
    }

    async fn install(&mut self, rates: HashMap<String, Decimal>, at: DateTime<Utc>) {
        self.table.install(rates, at);
        self.last_error = None;

        if let Some(cache) = &self.cache {
            if let Err(e) = cache::put_as(cache.as_ref(), CACHED_RATES_KEY, &self.table).await {
                debug!("Failed to cache exchange rates: {:#}", e);
            }
        }
    }

    /// Replaces the table with the last cached one, if any. Used on cold
    /// start before the first network refresh.
    pub async fn load_cached(&mut self) -> bool {
        let Some(cache) = &self.cache else {
            return false;
        };
        match cache::get_as::<RateTable>(cache.as_ref(), CACHED_RATES_KEY).await {
            Ok(Some(table)) => {
                debug!(last_updated = ?table.last_updated, "Loaded cached exchange rates");
                self.table = table.normalized();
                true
            }
            Ok(None) => false,
            Err(e) => {
                debug!("Failed to read cached exchange rates: {:#}", e);
                false
            }
        }
    }

    /// Back to built-in rates, base display currency and no error.
    pub fn reset(&mut self) {
        self.table = RateTable::default();
        self.display_currency = BASE_CURRENCY.code().to_string();
        self.last_error = None;
    }
}

/// Fetches a quote and expresses it against the base currency.
async fn fetch_anchored(feed: &dyn RateFeed) -> anyhow::Result<(String, HashMap<String, Decimal>)> {
    let quote = feed.fetch_rates().await?;
    let rates = quote.reanchor(BASE_CURRENCY.code())?;
    Ok((quote.anchor, rates))
}
