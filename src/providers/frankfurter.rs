use anyhow::{Result, anyhow};
use async_trait::async_trait;
use rust_decimal::Decimal;
use serde::Deserialize;
use std::collections::HashMap;
use tracing::{debug, instrument};

use crate::core::currency::{BASE_CURRENCY, RateFeed, RateQuote};

/// Primary feed: ECB reference rates published by Frankfurter, requested
/// directly against the base currency.
pub struct FrankfurterFeed {
    base_url: String,
    client: reqwest::Client,
}

impl FrankfurterFeed {
    pub fn new(base_url: &str) -> Result<Self> {
        let client = reqwest::Client::builder().user_agent("outlay/1.0").build()?;
        Ok(FrankfurterFeed {
            base_url: base_url.trim_end_matches('/').to_string(),
            client,
        })
    }
}

#[derive(Debug, Deserialize)]
struct FrankfurterResponse {
    base: String,
    rates: HashMap<String, Decimal>,
}

#[async_trait]
impl RateFeed for FrankfurterFeed {
    fn name(&self) -> &str {
        "frankfurter"
    }

    #[instrument(name = "FrankfurterFetch", skip(self))]
    async fn fetch_rates(&self) -> Result<RateQuote> {
        let url = format!("{}/latest?from={}", self.base_url, BASE_CURRENCY.code());
        debug!("Requesting exchange rates from {}", url);

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| anyhow!("Request error: {} for URL: {}", e, url))?;

        if !response.status().is_success() {
            return Err(anyhow!(
                "HTTP error: {} from {}",
                response.status(),
                self.name()
            ));
        }

        let text = response.text().await?;
        let data: FrankfurterResponse = serde_json::from_str(&text)
            .map_err(|e| anyhow!("Failed to parse JSON response from {}: {}", self.name(), e))?;

        if data.rates.is_empty() {
            return Err(anyhow!("No rates found in {} response", self.name()));
        }
        debug!(anchor = %data.base, count = data.rates.len(), "Received rates");

        Ok(RateQuote {
            anchor: data.base,
            rates: data.rates,
        })
    }
}
