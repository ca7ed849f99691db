// =============================================================================
// Market Data: bar model and the data-source seam
// =============================================================================
//
// The report pipeline only sees `MarketDataSource`. Concrete providers live in
// the submodules and are combined by `ProviderStack`.
// =============================================================================

pub mod alpha_vantage;
pub mod stack;
#[cfg(test)]
pub(crate) mod test_support;
pub mod yahoo;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::ReportError;

pub use stack::ProviderStack;

// ---------------------------------------------------------------------------
// Data types
// ---------------------------------------------------------------------------

/// A single OHLCV observation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriceBar {
    /// Provider timestamp, e.g. `2024-05-03 15:55:00`. Only its ordering matters.
    pub timestamp: String,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: u64,
}

/// Bars in ascending timestamp order with no duplicate timestamps.
///
/// The ordering is established by whoever builds the series; it is not
/// re-checked here.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PriceSeries(Vec<PriceBar>);

impl PriceSeries {
    pub fn new(bars: Vec<PriceBar>) -> Self {
        Self(bars)
    }

    pub fn bars(&self) -> &[PriceBar] {
        &self.0
    }

    /// Close prices in bar order.
    pub fn closes(&self) -> Vec<f64> {
        self.0.iter().map(|b| b.close).collect()
    }

    /// Timestamp of the most recent bar.
    pub fn last_timestamp(&self) -> Option<&str> {
        self.0.last().map(|b| b.timestamp.as_str())
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

// ---------------------------------------------------------------------------
// Source abstraction
// ---------------------------------------------------------------------------

/// Everything the report pipeline needs from the outside world.
#[async_trait]
pub trait MarketDataSource: Send + Sync {
    /// Recent intraday bars for `symbol` at `interval`, oldest first.
    async fn fetch_intraday_series(
        &self,
        symbol: &str,
        interval: &str,
    ) -> Result<PriceSeries, ReportError>;

    /// Latest price from the primary provider.
    async fn fetch_primary_price(&self, symbol: &str) -> Result<f64, ReportError>;

    /// Latest price from the secondary provider. `None` when the provider is
    /// not configured or fails; that is never a request failure.
    async fn fetch_secondary_price(&self, symbol: &str) -> Option<f64>;
}
