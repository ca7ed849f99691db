// =============================================================================
// Yahoo Finance Quote Client (via RapidAPI): secondary price source
// =============================================================================
//
// Only used to cross-check the primary quote. Callers treat every failure here
// as "no secondary quote".
// =============================================================================

use std::time::Duration;

use anyhow::{Context, Result};
use reqwest::header::{HeaderMap, HeaderValue};
use serde_json::Value;
use tracing::{debug, instrument};

use crate::runtime_config::RuntimeConfig;

/// Yahoo Finance quote client authenticated with a RapidAPI key.
#[derive(Clone)]
pub struct YahooQuoteClient {
    base_url: String,
    timeout: Duration,
    client: reqwest::Client,
}

impl YahooQuoteClient {
    /// Create a new client. The key is sent as the `X-RapidAPI-Key` header on
    /// every request.
    pub fn new(api_key: &str, config: &RuntimeConfig) -> Result<Self> {
        let mut default_headers = HeaderMap::new();
        let mut key = HeaderValue::from_str(api_key).context("YF_API_KEY is not a valid header value")?;
        key.set_sensitive(true);
        default_headers.insert("X-RapidAPI-Key", key);

        let client = reqwest::Client::builder()
            .default_headers(default_headers)
            .build()
            .context("failed to build Yahoo HTTP client")?;

        debug!(base_url = %config.secondary_base_url, "YahooQuoteClient initialised");

        Ok(Self {
            base_url: config.secondary_base_url.clone(),
            timeout: config.quote_timeout(),
            client,
        })
    }

    /// GET {base}?symbols={symbol}
    #[instrument(skip(self), name = "yahoo::get_quote")]
    pub async fn get_quote(&self, symbol: &str) -> Result<f64> {
        let resp = self
            .client
            .get(&self.base_url)
            .query(&[("symbols", symbol)])
            .timeout(self.timeout)
            .send()
            .await
            .context("Yahoo quote request failed")?;

        let status = resp.status();
        let body: Value = resp
            .json()
            .await
            .context("failed to parse Yahoo quote response")?;

        if !status.is_success() {
            anyhow::bail!("Yahoo quote returned {}: {}", status, body);
        }

        let price = parse_quote(&body)?;
        debug!(symbol, price, "secondary quote fetched");
        Ok(price)
    }
}

impl std::fmt::Debug for YahooQuoteClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("YahooQuoteClient")
            .field("api_key", &"<redacted>")
            .field("base_url", &self.base_url)
            .finish()
    }
}

/// Extract `quoteResponse.result[0].regularMarketPrice`.
pub fn parse_quote(body: &Value) -> Result<f64> {
    let price = body["quoteResponse"]["result"]
        .get(0)
        .and_then(|q| q["regularMarketPrice"].as_f64())
        .context("quote response has no regularMarketPrice")?;

    if !price.is_finite() || price <= 0.0 {
        anyhow::bail!("regularMarketPrice must be positive, got {price}");
    }
    Ok(price)
}
