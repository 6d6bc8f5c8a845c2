//! Currencies and exchange-rate feed abstractions

use anyhow::{Result, anyhow};
use async_trait::async_trait;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt::Display;
use std::str::FromStr;

use crate::error::EngineError;

/// Currency every amount is stored in.
pub const BASE_CURRENCY: Currency = Currency::Eur;

/// Display currencies a user can pick.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Currency {
    Eur,
    Usd,
    Gbp,
    Jpy,
}

impl Currency {
    pub const ALL: [Currency; 4] = [Currency::Eur, Currency::Usd, Currency::Gbp, Currency::Jpy];

    pub fn code(&self) -> &'static str {
        match self {
            Currency::Eur => "EUR",
            Currency::Usd => "USD",
            Currency::Gbp => "GBP",
            Currency::Jpy => "JPY",
        }
    }

    pub fn symbol(&self) -> &'static str {
        match self {
            Currency::Eur => "€",
            Currency::Usd => "$",
            Currency::Gbp => "£",
            Currency::Jpy => "¥",
        }
    }
}

impl Default for Currency {
    fn default() -> Self {
        BASE_CURRENCY
    }
}

impl Display for Currency {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.code())
    }
}

impl FromStr for Currency {
    type Err = EngineError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Currency::ALL
            .into_iter()
            .find(|c| c.code().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| EngineError::validation(format!("Unsupported currency: {s}")))
    }
}

/// Rates as published by a feed: units of each currency per one unit of
/// `anchor`.
#[derive(Debug, Clone, PartialEq)]
pub struct RateQuote {
    pub anchor: String,
    pub rates: HashMap<String, Decimal>,
}

impl RateQuote {
    /// Re-expresses the quote relative to `base`.
    ///
    /// With the anchor at `a` and `r_base` units of `base` per one `a`, one
    /// `base` buys `1 / r_base` of `a`, so every rate is multiplied through by
    /// `1 / r_base`. The anchor itself ends up at `1 / r_base` and `base` at
    /// exactly one.
    pub fn reanchor(&self, base: &str) -> Result<HashMap<String, Decimal>> {
        let mut rates = HashMap::with_capacity(self.rates.len() + 1);
        if self.anchor.eq_ignore_ascii_case(base) {
            rates.extend(
                self.rates
                    .iter()
                    .filter(|(_, rate)| rate.is_sign_positive() && !rate.is_zero())
                    .map(|(code, rate)| (code.to_uppercase(), *rate)),
            );
            rates.insert(base.to_uppercase(), Decimal::ONE);
            return Ok(rates);
        }

        let base_rate = self
            .rates
            .iter()
            .find(|(code, _)| code.eq_ignore_ascii_case(base))
            .map(|(_, rate)| *rate)
            .ok_or_else(|| anyhow!("Quote anchored to {} has no rate for {}", self.anchor, base))?;
        if base_rate <= Decimal::ZERO {
            return Err(anyhow!("Invalid {} rate in {} quote: {}", base, self.anchor, base_rate));
        }
        let inverse = Decimal::ONE
            .checked_div(base_rate)
            .ok_or_else(|| anyhow!("Cannot invert {} rate {}", base, base_rate))?;

        for (code, rate) in &self.rates {
            if *rate <= Decimal::ZERO {
                continue;
            }
            if let Some(converted) = rate.checked_mul(inverse) {
                rates.insert(code.to_uppercase(), converted);
            }
        }
        rates.insert(self.anchor.to_uppercase(), inverse);
        rates.insert(base.to_uppercase(), Decimal::ONE);
        Ok(rates)
    }
}

#[async_trait]
pub trait RateFeed: Send + Sync {
    /// Short name used in logs and error messages.
    fn name(&self) -> &str;

    async fn fetch_rates(&self) -> Result<RateQuote>;
}
