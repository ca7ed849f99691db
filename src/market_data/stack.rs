// =============================================================================
// ProviderStack: Alpha Vantage primary + optional Yahoo secondary
// =============================================================================

use anyhow::Result;
use async_trait::async_trait;
use tracing::warn;

use crate::error::ReportError;
use crate::market_data::alpha_vantage::AlphaVantageClient;
use crate::market_data::yahoo::YahooQuoteClient;
use crate::market_data::{MarketDataSource, PriceSeries};
use crate::runtime_config::RuntimeConfig;

/// The production `MarketDataSource`.
#[derive(Debug, Clone)]
pub struct ProviderStack {
    primary: AlphaVantageClient,
    secondary: Option<YahooQuoteClient>,
}

impl ProviderStack {
    /// Build the stack from explicit credentials.
    ///
    /// Only the primary client can fail construction. A missing or unusable
    /// secondary key leaves the secondary source absent.
    pub fn new(
        config: &RuntimeConfig,
        primary_key: &str,
        secondary_key: Option<&str>,
    ) -> Result<Self> {
        let primary = AlphaVantageClient::new(primary_key, config)?;
        let secondary = secondary_key.and_then(|key| match YahooQuoteClient::new(key, config) {
            Ok(client) => Some(client),
            Err(e) => {
                let reason = format!("{e:#}");
                warn!(error = %reason, "secondary quote source disabled");
                None
            }
        });
        Ok(Self { primary, secondary })
    }

    pub fn has_secondary(&self) -> bool {
        self.secondary.is_some()
    }
}

#[async_trait]
impl MarketDataSource for ProviderStack {
    async fn fetch_intraday_series(
        &self,
        symbol: &str,
        interval: &str,
    ) -> Result<PriceSeries, ReportError> {
        self.primary
            .get_intraday(symbol, interval)
            .await
            .map_err(|e| ReportError::data_unavailable(format!("{e:#}")))
    }

    async fn fetch_primary_price(&self, symbol: &str) -> Result<f64, ReportError> {
        self.primary
            .get_global_quote(symbol)
            .await
            .map_err(|e| ReportError::data_unavailable(format!("{e:#}")))
    }

    async fn fetch_secondary_price(&self, symbol: &str) -> Option<f64> {
        let client = self.secondary.as_ref()?;
        match client.get_quote(symbol).await {
            Ok(price) => Some(price),
            Err(e) => {
                let reason = format!("{e:#}");
                warn!(symbol, error = %reason, "secondary quote unavailable; continuing without it");
                None
            }
        }
    }
}
