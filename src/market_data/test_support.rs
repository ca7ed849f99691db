//! Scripted in-memory `MarketDataSource` for unit tests.

use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;

use crate::error::ReportError;
use crate::market_data::{MarketDataSource, PriceBar, PriceSeries};

pub(crate) struct ScriptedSource {
    pub series: Result<Vec<PriceBar>, String>,
    pub primary: Result<f64, String>,
    pub secondary: Option<f64>,
    calls: AtomicUsize,
}

impl ScriptedSource {
    pub fn new(closes: &[f64], primary: f64, secondary: Option<f64>) -> Self {
        Self {
            series: Ok(bars_from_closes(closes)),
            primary: Ok(primary),
            secondary,
            calls: AtomicUsize::new(0),
        }
    }

    /// Total number of fetches of any kind.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

/// One bar per close, five minutes apart.
pub(crate) fn bars_from_closes(closes: &[f64]) -> Vec<PriceBar> {
    closes
        .iter()
        .enumerate()
        .map(|(i, &c)| PriceBar {
            timestamp: format!("2024-05-03 {:02}:{:02}:00", 4 + i / 12, (i % 12) * 5),
            open: c,
            high: c + 0.5,
            low: c - 0.5,
            close: c,
            volume: 1_000 + i as u64,
        })
        .collect()
}

#[async_trait]
impl MarketDataSource for ScriptedSource {
    async fn fetch_intraday_series(
        &self,
        _symbol: &str,
        _interval: &str,
    ) -> Result<PriceSeries, ReportError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.series
            .clone()
            .map(PriceSeries::new)
            .map_err(ReportError::DataUnavailable)
    }

    async fn fetch_primary_price(&self, _symbol: &str) -> Result<f64, ReportError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.primary.clone().map_err(ReportError::DataUnavailable)
    }

    async fn fetch_secondary_price(&self, _symbol: &str) -> Option<f64> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.secondary
    }
}
