// =============================================================================
// Indicator Report: compose indicators and the reconciled price
// =============================================================================
//
// Flow for one request:
//   1. Normalise and validate the request (symbol required).
//   2. Fetch the bar series and both quotes concurrently.
//   3. Compute every indicator from the closes, reconcile the quotes.
//   4. Return one immutable report, or a single error. Nothing partial.
// =============================================================================

use std::sync::Arc;

use serde::Serialize;
use tracing::{debug, info};

use crate::error::ReportError;
use crate::indicators::{
    ema, macd, rsi, MacdState, RsiState, EMA_LONG_PERIOD, EMA_MEDIUM_PERIOD, MACD_FAST,
    MACD_SIGNAL, MACD_SLOW, RSI_PERIOD,
};
use crate::market_data::{MarketDataSource, PriceSeries};
use crate::reconcile::{reconcile, ReconciledPrice};

// ---------------------------------------------------------------------------
// Request
// ---------------------------------------------------------------------------

/// A validated report request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReportRequest {
    /// Trimmed, upper-cased ticker.
    pub symbol: String,
    /// Bar interval label, passed to the provider verbatim.
    pub interval: String,
}

impl ReportRequest {
    /// Normalise raw request parameters. A blank interval falls back to
    /// `default_interval`; a blank symbol is rejected.
    pub fn new(
        symbol: Option<&str>,
        interval: Option<&str>,
        default_interval: &str,
    ) -> Result<Self, ReportError> {
        let symbol = symbol.unwrap_or("").trim().to_uppercase();
        if symbol.is_empty() {
            return Err(ReportError::MissingInput("symbol is required".to_string()));
        }

        let interval = interval
            .map(str::trim)
            .filter(|i| !i.is_empty())
            .unwrap_or(default_interval)
            .to_string();

        Ok(Self { symbol, interval })
    }
}

// ---------------------------------------------------------------------------
// Indicator snapshot
// ---------------------------------------------------------------------------

/// Every indicator reported for a symbol. `None` means insufficient history.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct IndicatorSet {
    pub ema50: Option<f64>,
    pub ema200: Option<f64>,
    pub rsi14: Option<f64>,
    pub rsi_state: RsiState,
    pub macd: Option<f64>,
    pub macd_signal: Option<f64>,
    pub macd_hist: Option<f64>,
    pub macd_state: Option<MacdState>,
}

impl IndicatorSet {
    pub fn from_closes(closes: &[f64]) -> Self {
        let rsi14 = rsi(closes, RSI_PERIOD);
        let reading = macd(closes, MACD_FAST, MACD_SLOW, MACD_SIGNAL);

        Self {
            ema50: ema(closes, EMA_MEDIUM_PERIOD),
            ema200: ema(closes, EMA_LONG_PERIOD),
            rsi14,
            rsi_state: RsiState::from_rsi(rsi14),
            macd: reading.map(|m| m.line),
            macd_signal: reading.map(|m| m.signal),
            macd_hist: reading.map(|m| m.histogram),
            macd_state: reading.as_ref().map(MacdState::from_macd),
        }
    }
}

// ---------------------------------------------------------------------------
// Report
// ---------------------------------------------------------------------------

/// The full response for one symbol.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct IndicatorReport {
    pub symbol: String,
    pub interval: String,
    /// Timestamp of the latest bar; `None` for an empty series.
    pub as_of: Option<String>,
    #[serde(flatten)]
    pub price: ReconciledPrice,
    pub indicators: IndicatorSet,
    pub ohlcv: PriceSeries,
}

impl IndicatorReport {
    /// Pure composition step: no I/O, never fails.
    pub fn assemble(
        request: ReportRequest,
        series: PriceSeries,
        primary: f64,
        secondary: Option<f64>,
    ) -> Self {
        let closes = series.closes();
        let indicators = IndicatorSet::from_closes(&closes);
        let price = reconcile(primary, secondary);

        debug!(
            symbol = %request.symbol,
            bars = closes.len(),
            rsi_state = %indicators.rsi_state,
            macd_defined = indicators.macd.is_some(),
            "indicator set computed"
        );

        Self {
            as_of: series.last_timestamp().map(str::to_string),
            symbol: request.symbol,
            interval: request.interval,
            price,
            indicators,
            ohlcv: series,
        }
    }
}

// ---------------------------------------------------------------------------
// Service
// ---------------------------------------------------------------------------

/// Entry point used by the HTTP layer.
#[derive(Clone)]
pub struct ReportService {
    source: Option<Arc<dyn MarketDataSource>>,
    default_interval: String,
}

impl ReportService {
    /// `source` is `None` when the primary provider has no credentials; every
    /// valid request is then rejected as misconfigured.
    pub fn new(source: Option<Arc<dyn MarketDataSource>>, default_interval: impl Into<String>) -> Self {
        Self {
            source,
            default_interval: default_interval.into(),
        }
    }

    pub fn primary_configured(&self) -> bool {
        self.source.is_some()
    }

    /// Validate, fetch, compute and assemble a report.
    pub async fn report(
        &self,
        symbol: Option<&str>,
        interval: Option<&str>,
    ) -> Result<IndicatorReport, ReportError> {
        let request = ReportRequest::new(symbol, interval, &self.default_interval)?;

        let source = self
            .source
            .as_deref()
            .ok_or_else(|| ReportError::Misconfigured("ALPHA_VANTAGE_KEY not set".to_string()))?;

        let (series, primary, secondary) = tokio::join!(
            source.fetch_intraday_series(&request.symbol, &request.interval),
            source.fetch_primary_price(&request.symbol),
            source.fetch_secondary_price(&request.symbol),
        );
        let series = series?;
        let primary = primary?;

        let report = IndicatorReport::assemble(request, series, primary, secondary);

        info!(
            symbol = %report.symbol,
            interval = %report.interval,
            bars = report.ohlcv.len(),
            price = report.price.price,
            price_source = %report.price.price_source,
            diff_bps = ?report.price.price_diff_bps,
            "indicator report ready"
        );

        Ok(report)
    }
}

// =============================================================================
// Tests
// =============================================================================
#[cfg(test)]
mod tests {
    use super::*;
    use crate::market_data::test_support::{bars_from_closes, ScriptedSource};
    use crate::types::PriceSource;

    fn rising(n: usize) -> Vec<f64> {
        (0..n).map(|i| 10.0 + i as f64).collect()
    }

    /// Slope grows every bar, so the MACD line keeps pulling away from its signal.
    fn accelerating(n: usize, direction: f64) -> Vec<f64> {
        (0..n)
            .map(|i| {
                let x = i as f64;
                2_000.0 + direction * (x + 0.01 * x * x)
            })
            .collect()
    }

    fn service(source: ScriptedSource) -> (ReportService, Arc<ScriptedSource>) {
        let source = Arc::new(source);
        let svc = ReportService::new(Some(source.clone() as Arc<dyn MarketDataSource>), "5min");
        (svc, source)
    }

    // ---- ReportRequest ---------------------------------------------------

    #[test]
    fn request_normalises_symbol_and_defaults_interval() {
        let req = ReportRequest::new(Some("  aapl "), None, "5min").unwrap();
        assert_eq!(req.symbol, "AAPL");
        assert_eq!(req.interval, "5min");

        let req = ReportRequest::new(Some("msft"), Some(" 15min "), "5min").unwrap();
        assert_eq!(req.interval, "15min");

        let req = ReportRequest::new(Some("msft"), Some(""), "5min").unwrap();
        assert_eq!(req.interval, "5min");
    }

    #[test]
    fn request_rejects_blank_symbol() {
        for raw in [None, Some(""), Some("   ")] {
            let err = ReportRequest::new(raw, None, "5min").unwrap_err();
            assert!(matches!(err, ReportError::MissingInput(_)));
            assert_eq!(err.to_string(), "symbol is required");
        }
    }

    // ---- IndicatorSet ----------------------------------------------------

    #[test]
    fn fifty_rising_closes() {
        let set = IndicatorSet::from_closes(&rising(50));
        assert!(set.ema50.is_some());
        assert!(set.ema200.is_none());
        assert_eq!(set.rsi14, Some(100.0));
        assert_eq!(set.rsi_state, RsiState::Overbought);
        // 50 >= 35, so MACD is defined here; below 35 it is not.
        assert!(set.macd.is_some());

        let short = IndicatorSet::from_closes(&rising(34));
        assert!(short.macd.is_none());
        assert!(short.macd_signal.is_none());
        assert!(short.macd_hist.is_none());
        assert!(short.macd_state.is_none());
        assert_eq!(short.rsi14, Some(100.0));
    }

    #[test]
    fn empty_closes_yield_nothing_but_neutral() {
        let set = IndicatorSet::from_closes(&[]);
        assert_eq!(
            set,
            IndicatorSet {
                ema50: None,
                ema200: None,
                rsi14: None,
                rsi_state: RsiState::Neutral,
                macd: None,
                macd_signal: None,
                macd_hist: None,
                macd_state: None,
            }
        );
    }

    #[test]
    fn macd_group_is_all_or_nothing() {
        for n in [0, 20, 34, 35, 36, 120, 300] {
            let set = IndicatorSet::from_closes(&rising(n));
            let defined = [set.macd, set.macd_signal, set.macd_hist]
                .iter()
                .filter(|v| v.is_some())
                .count();
            assert!(defined == 0 || defined == 3, "n={n}: {defined} of 3 defined");
            assert_eq!(set.macd_state.is_some(), defined == 3);
        }
    }

    #[test]
    fn falling_closes_are_oversold_and_bearish() {
        let set = IndicatorSet::from_closes(&accelerating(250, -1.0));
        assert!(set.ema200.is_some());
        assert_eq!(set.rsi_state, RsiState::Oversold);
        assert_eq!(set.macd_state, Some(MacdState::Bearish));
    }

    // ---- IndicatorReport::assemble --------------------------------------

    #[test]
    fn assemble_carries_bars_and_as_of() {
        let bars = bars_from_closes(&rising(60));
        let last_ts = bars.last().unwrap().timestamp.clone();
        let request = ReportRequest::new(Some("ibm"), Some("5min"), "5min").unwrap();
        let report = IndicatorReport::assemble(request, PriceSeries::new(bars.clone()), 100.0, Some(100.05));

        assert_eq!(report.symbol, "IBM");
        assert_eq!(report.as_of.as_deref(), Some(last_ts.as_str()));
        assert_eq!(report.ohlcv.bars(), bars.as_slice());
        assert_eq!(report.price.price_source, PriceSource::Primary);
    }

    #[test]
    fn assemble_empty_series() {
        let request = ReportRequest::new(Some("ibm"), None, "5min").unwrap();
        let report = IndicatorReport::assemble(request, PriceSeries::default(), 50.0, None);
        assert!(report.as_of.is_none());
        assert!(report.ohlcv.is_empty());
        assert_eq!(report.indicators.rsi_state, RsiState::Neutral);
        assert_eq!(report.price.price, 50.0);
    }

    #[test]
    fn report_json_shape() {
        let request = ReportRequest::new(Some("ibm"), None, "5min").unwrap();
        let series = PriceSeries::new(bars_from_closes(&rising(3)));
        let report = IndicatorReport::assemble(request, series, 100.0, Some(100.20));
        let json = serde_json::to_value(&report).unwrap();

        for key in [
            "symbol", "interval", "as_of", "price", "price_source", "price_primary",
            "price_secondary", "price_diff_bps", "indicators", "ohlcv",
        ] {
            assert!(json.get(key).is_some(), "missing {key}");
        }
        assert_eq!(json["price_source"], "secondary");
        assert_eq!(json["indicators"]["rsi_state"], "Neutral");
        assert!(json["indicators"]["ema50"].is_null());
        assert!(json["indicators"]["macd_state"].is_null());
        assert_eq!(json["ohlcv"].as_array().unwrap().len(), 3);
    }

    // ---- ReportService ---------------------------------------------------

    #[tokio::test]
    async fn report_end_to_end() {
        let (svc, source) = service(ScriptedSource::new(&accelerating(300, 1.0), 100.0, Some(100.20)));
        let report = svc.report(Some("aapl"), None).await.unwrap();

        assert_eq!(report.symbol, "AAPL");
        assert_eq!(report.interval, "5min");
        assert_eq!(report.ohlcv.len(), 300);
        assert!(report.indicators.ema200.is_some());
        assert_eq!(report.indicators.macd_state, Some(MacdState::Bullish));
        assert_eq!(report.price.price, 100.20);
        assert_eq!(report.price.price_source, PriceSource::Secondary);
        assert_eq!(source.calls(), 3);
    }

    #[tokio::test]
    async fn missing_symbol_fetches_nothing() {
        let (svc, source) = service(ScriptedSource::new(&rising(10), 100.0, None));
        let err = svc.report(Some("  "), None).await.unwrap_err();
        assert!(matches!(err, ReportError::MissingInput(_)));
        assert_eq!(source.calls(), 0);
    }

    #[tokio::test]
    async fn missing_symbol_wins_over_misconfiguration() {
        let svc = ReportService::new(None, "5min");
        let err = svc.report(None, None).await.unwrap_err();
        assert!(matches!(err, ReportError::MissingInput(_)));
    }

    #[tokio::test]
    async fn unconfigured_primary_is_rejected() {
        let svc = ReportService::new(None, "5min");
        assert!(!svc.primary_configured());
        let err = svc.report(Some("AAPL"), None).await.unwrap_err();
        assert!(matches!(err, ReportError::Misconfigured(_)));
        assert_eq!(err.to_string(), "ALPHA_VANTAGE_KEY not set");
    }

    #[tokio::test]
    async fn series_failure_fails_the_request() {
        let mut scripted = ScriptedSource::new(&[], 100.0, Some(100.0));
        scripted.series = Err("Thank you for using Alpha Vantage!".to_string());
        let (svc, _) = service(scripted);
        let err = svc.report(Some("AAPL"), None).await.unwrap_err();
        assert!(matches!(err, ReportError::DataUnavailable(ref m) if m.contains("Alpha Vantage")));
    }

    #[tokio::test]
    async fn primary_quote_failure_fails_the_request() {
        let mut scripted = ScriptedSource::new(&rising(40), 100.0, Some(100.0));
        scripted.primary = Err("Global Quote is missing a usable '05. price'".to_string());
        let (svc, _) = service(scripted);
        let err = svc.report(Some("AAPL"), None).await.unwrap_err();
        assert!(matches!(err, ReportError::DataUnavailable(_)));
    }

    #[tokio::test]
    async fn absent_secondary_still_reports() {
        let (svc, _) = service(ScriptedSource::new(&rising(40), 100.0, None));
        let report = svc.report(Some("AAPL"), Some("1min")).await.unwrap();
        assert_eq!(report.interval, "1min");
        assert_eq!(report.price.price_source, PriceSource::Primary);
        assert!(report.price.price_diff_bps.is_none());
        assert!(report.price.price_secondary.is_none());
    }
}
