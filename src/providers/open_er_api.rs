use anyhow::{Result, anyhow};
use async_trait::async_trait;
use rust_decimal::Decimal;
use serde::Deserialize;
use std::collections::HashMap;
use tracing::{debug, instrument};

use crate::core::currency::{RateFeed, RateQuote};

/// Fallback feed: open.er-api.com. Its quotes are anchored to `anchor`
/// (USD by default), not to the base currency, so callers must re-anchor.
pub struct OpenErApiFeed {
    base_url: String,
    anchor: String,
    client: reqwest::Client,
}

impl OpenErApiFeed {
    pub fn new(base_url: &str, anchor: &str) -> Result<Self> {
        let client = reqwest::Client::builder().user_agent("outlay/1.0").build()?;
        Ok(OpenErApiFeed {
            base_url: base_url.trim_end_matches('/').to_string(),
            anchor: anchor.to_uppercase(),
            client,
        })
    }
}

#[derive(Debug, Deserialize)]
struct OpenErApiResponse {
    result: String,
    #[serde(default)]
    base_code: Option<String>,
    #[serde(default)]
    rates: HashMap<String, Decimal>,
    #[serde(default, rename = "error-type")]
    error_type: Option<String>,
}

#[async_trait]
impl RateFeed for OpenErApiFeed {
    fn name(&self) -> &str {
        "open.er-api"
    }

    #[instrument(name = "OpenErApiFetch", skip(self), fields(anchor = %self.anchor))]
    async fn fetch_rates(&self) -> Result<RateQuote> {
        let url = format!("{}/v6/latest/{}", self.base_url, self.anchor);
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
        let data: OpenErApiResponse = serde_json::from_str(&text)
            .map_err(|e| anyhow!("Failed to parse JSON response from {}: {}", self.name(), e))?;

        if data.result != "success" {
            return Err(anyhow!(
                "{} reported failure: {}",
                self.name(),
                data.error_type.as_deref().unwrap_or("unknown error")
            ));
        }
        if data.rates.is_empty() {
            return Err(anyhow!("No rates found in {} response", self.name()));
        }

        let anchor = data.base_code.unwrap_or_else(|| self.anchor.clone());
        debug!(anchor = %anchor, count = data.rates.len(), "Received rates");
        Ok(RateQuote {
            anchor,
            rates: data.rates,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    async fn mount(server: &MockServer, response: ResponseTemplate) {
        Mock::given(method("GET"))
            .and(path("/v6/latest/USD"))
            .respond_with(response)
            .mount(server)
            .await;
    }

    #[tokio::test]
    async fn test_successful_rates_fetch() {
        let mock_server = MockServer::start().await;
        let mock_response = r#"{
            "result": "success",
            "base_code": "USD",
            "rates": {"USD": 1, "EUR": 0.92, "GBP": 0.79}
        }"#;
        mount(
            &mock_server,
            ResponseTemplate::new(200).set_body_string(mock_response),
        )
        .await;

        let feed = OpenErApiFeed::new(&mock_server.uri(), "usd").unwrap();
        let quote = feed.fetch_rates().await.unwrap();
        assert_eq!(quote.anchor, "USD");
        assert_eq!(quote.rates["EUR"], "0.92".parse::<Decimal>().unwrap());
        assert_eq!(quote.rates["USD"], Decimal::ONE);
    }

    #[tokio::test]
    async fn test_reported_failure() {
        let mock_server = MockServer::start().await;
        mount(
            &mock_server,
            ResponseTemplate::new(200)
                .set_body_string(r#"{"result": "error", "error-type": "unsupported-code"}"#),
        )
        .await;

        let feed = OpenErApiFeed::new(&mock_server.uri(), "USD").unwrap();
        let result = feed.fetch_rates().await;
        assert_eq!(
            result.unwrap_err().to_string(),
            "open.er-api reported failure: unsupported-code"
        );
    }

    #[tokio::test]
    async fn test_api_error_response() {
        let mock_server = MockServer::start().await;
        mount(&mock_server, ResponseTemplate::new(500)).await;

        let feed = OpenErApiFeed::new(&mock_server.uri(), "USD").unwrap();
        let result = feed.fetch_rates().await;
        assert_eq!(
            result.unwrap_err().to_string(),
            "HTTP error: 500 Internal Server Error from open.er-api"
        );
    }
}
