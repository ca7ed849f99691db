// =============================================================================
// Alpha Vantage REST Client: primary series and quote source
// =============================================================================
//
// SECURITY: the API key travels as the `apikey` query parameter (the only form
// Alpha Vantage accepts). It is never logged, `Debug` redacts it, and request
// URLs are stripped from transport errors before they propagate.
//
// Alpha Vantage answers HTTP 200 even for errors and rate limits; the real
// outcome is in the body (`Note`, `Information` or `Error Message`), so every
// payload is inspected before use.
// =============================================================================

use std::time::Duration;

use anyhow::{Context, Result};
use serde_json::Value;
use tracing::{debug, instrument};

use crate::market_data::{PriceBar, PriceSeries};
use crate::runtime_config::RuntimeConfig;

/// Alpha Vantage REST API client.
#[derive(Clone)]
pub struct AlphaVantageClient {
    api_key: String,
    base_url: String,
    max_bars: usize,
    series_timeout: Duration,
    quote_timeout: Duration,
    client: reqwest::Client,
}

impl AlphaVantageClient {
    // -------------------------------------------------------------------------
    // Construction
    // -------------------------------------------------------------------------

    /// Create a new client using the endpoint, window and timeouts from `config`.
    pub fn new(api_key: impl Into<String>, config: &RuntimeConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .build()
            .context("failed to build Alpha Vantage HTTP client")?;

        debug!(base_url = %config.primary_base_url, "AlphaVantageClient initialised");

        Ok(Self {
            api_key: api_key.into(),
            base_url: config.primary_base_url.clone(),
            max_bars: config.max_bars,
            series_timeout: config.series_timeout(),
            quote_timeout: config.quote_timeout(),
            client,
        })
    }

    // -------------------------------------------------------------------------
    // Endpoints
    // -------------------------------------------------------------------------

    /// function=TIME_SERIES_INTRADAY, outputsize=full.
    ///
    /// Returns the most recent `max_bars` bars, oldest first.
    #[instrument(skip(self), name = "alpha_vantage::get_intraday")]
    pub async fn get_intraday(&self, symbol: &str, interval: &str) -> Result<PriceSeries> {
        let body = self
            .get_json(
                &[
                    ("function", "TIME_SERIES_INTRADAY"),
                    ("symbol", symbol),
                    ("interval", interval),
                    ("outputsize", "full"),
                ],
                self.series_timeout,
            )
            .await
            .context("TIME_SERIES_INTRADAY request failed")?;

        let series = parse_intraday(&body, interval, self.max_bars)?;
        debug!(symbol, interval, count = series.len(), "intraday series fetched");
        Ok(series)
    }

    /// function=GLOBAL_QUOTE.
    #[instrument(skip(self), name = "alpha_vantage::get_global_quote")]
    pub async fn get_global_quote(&self, symbol: &str) -> Result<f64> {
        let body = self
            .get_json(
                &[("function", "GLOBAL_QUOTE"), ("symbol", symbol)],
                self.quote_timeout,
            )
            .await
            .context("GLOBAL_QUOTE request failed")?;

        let price = parse_global_quote(&body)?;
        debug!(symbol, price, "global quote fetched");
        Ok(price)
    }

    // -------------------------------------------------------------------------
    // Internal helpers
    // -------------------------------------------------------------------------

    async fn get_json(&self, params: &[(&str, &str)], timeout: Duration) -> Result<Value> {
        let resp = self
            .client
            .get(&self.base_url)
            .query(params)
            .query(&[("apikey", self.api_key.as_str())])
            .timeout(timeout)
            .send()
            .await
            .map_err(reqwest::Error::without_url)?;

        let status = resp.status();
        let body: Value = resp
            .json()
            .await
            .map_err(reqwest::Error::without_url)
            .context("failed to parse Alpha Vantage response")?;

        if !status.is_success() {
            anyhow::bail!("Alpha Vantage returned {}: {}", status, body);
        }

        Ok(body)
    }
}

impl std::fmt::Debug for AlphaVantageClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AlphaVantageClient")
            .field("api_key", &"<redacted>")
            .field("base_url", &self.base_url)
            .field("max_bars", &self.max_bars)
            .finish()
    }
}

// =============================================================================
// Payload parsing
// =============================================================================

/// Extract the bars under `Time Series ({interval})`, sorted by timestamp,
/// keeping only the last `max_bars`.
pub fn parse_intraday(body: &Value, interval: &str, max_bars: usize) -> Result<PriceSeries> {
    let key = format!("Time Series ({interval})");
    let Some(rows) = body.get(&key).and_then(Value::as_object) else {
        anyhow::bail!("{}", provider_message(body));
    };

    let mut rows: Vec<(&String, &Value)> = rows.iter().collect();
    rows.sort_by(|a, b| a.0.cmp(b.0));
    let start = rows.len().saturating_sub(max_bars);

    let mut bars = Vec::with_capacity(rows.len() - start);
    for (ts, row) in &rows[start..] {
        let field = |name: &str| {
            parse_str_f64(&row[name]).with_context(|| format!("bar {ts}: bad '{name}'"))
        };
        let open = field("1. open")?;
        let high = field("2. high")?;
        let low = field("3. low")?;
        let close = field("4. close")?;
        // Volume arrives as a decimal string; truncate toward zero.
        let volume = field("5. volume")?.max(0.0) as u64;

        bars.push(PriceBar {
            timestamp: (*ts).clone(),
            open,
            high,
            low,
            close,
            volume,
        });
    }

    Ok(PriceSeries::new(bars))
}

/// Extract `Global Quote` → `05. price`.
pub fn parse_global_quote(body: &Value) -> Result<f64> {
    let Some(quote) = body.get("Global Quote") else {
        anyhow::bail!("{}", provider_message(body));
    };
    let price = parse_str_f64(&quote["05. price"])
        .context("Global Quote is missing a usable '05. price'")?;
    if price <= 0.0 {
        anyhow::bail!("Global Quote price must be positive, got {price}");
    }
    Ok(price)
}

/// Best human-readable explanation from an Alpha Vantage error payload.
fn provider_message(body: &Value) -> String {
    ["Note", "Information", "Error Message"]
        .iter()
        .find_map(|k| body.get(*k).and_then(Value::as_str))
        .unwrap_or("Alpha Vantage response error")
        .to_string()
}

/// Parse a JSON value that may be either a string or a number into a finite `f64`.
fn parse_str_f64(val: &Value) -> Result<f64> {
    let n = if let Some(s) = val.as_str() {
        s.trim()
            .parse::<f64>()
            .with_context(|| format!("failed to parse '{s}' as f64"))?
    } else if let Some(n) = val.as_f64() {
        n
    } else {
        anyhow::bail!("expected string or number, got: {val}")
    };
    if !n.is_finite() {
        anyhow::bail!("non-finite value: {val}");
    }
    Ok(n)
}
