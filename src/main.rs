// =============================================================================
// Indicators Plus: Main Entry Point
// =============================================================================
//
// Serves technical indicators (EMA, RSI, MACD) and a cross-checked price for
// one symbol per request. The service still starts without provider
// credentials; report requests are then rejected as misconfigured.
// =============================================================================

// ── Module declarations ──────────────────────────────────────────────────────
mod api;
mod app_state;
mod error;
mod indicators;
mod market_data;
mod reconcile;
mod report;
mod runtime_config;
mod types;

use std::sync::Arc;

use anyhow::Context;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use crate::app_state::AppState;
use crate::market_data::{MarketDataSource, ProviderStack};
use crate::report::ReportService;
use crate::runtime_config::{Credentials, RuntimeConfig};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // ── 1. Environment & config ──────────────────────────────────────────
    let _ = dotenv::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config_path =
        std::env::var("INDICATORS_CONFIG").unwrap_or_else(|_| "indicators_config.json".into());
    let mut config = RuntimeConfig::load(&config_path).unwrap_or_else(|e| {
        warn!(error = %e, "Failed to load config, using defaults");
        RuntimeConfig::default()
    });
    config.apply_env_overrides();

    let credentials = Credentials::from_env();

    // ── 2. Data sources ──────────────────────────────────────────────────
    let mut secondary_configured = false;
    let source: Option<Arc<dyn MarketDataSource>> = match &credentials.primary_api_key {
        Some(primary_key) => {
            let stack = ProviderStack::new(
                &config,
                primary_key,
                credentials.secondary_api_key.as_deref(),
            )
            .context("failed to build market data providers")?;
            secondary_configured = stack.has_secondary();
            Some(Arc::new(stack) as Arc<dyn MarketDataSource>)
        }
        None => {
            warn!("ALPHA_VANTAGE_KEY is not set; indicator requests will be rejected");
            None
        }
    };

    info!(
        primary_configured = source.is_some(),
        secondary_configured,
        default_interval = %config.default_interval,
        max_bars = config.max_bars,
        "market data sources ready"
    );

    // ── 3. Shared state ──────────────────────────────────────────────────
    let report_service = ReportService::new(source, config.default_interval.clone());
    let bind_addr = config.bind_addr.clone();
    let state = Arc::new(AppState::new(config, report_service, secondary_configured));

    // ── 4. API server ────────────────────────────────────────────────────
    let app = api::rest::router(state);
    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .with_context(|| format!("failed to bind API server on {bind_addr}"))?;
    info!(addr = %bind_addr, "API server listening");

    // ── 5. Graceful shutdown ─────────────────────────────────────────────
    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                warn!(error = %e, "failed to listen for shutdown signal; running until killed");
                std::future::pending::<()>().await;
            }
            warn!("Shutdown signal received; stopping gracefully");
        })
        .await
        .context("API server failed")?;

    info!("Indicators Plus shut down complete.");
    Ok(())
}
