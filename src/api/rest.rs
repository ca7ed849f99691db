// =============================================================================
// HTTP surface for indicator reports
// =============================================================================
//
// No authentication: the service only reads public market data. Errors are
// returned as `{"error": "<message>"}` with the status chosen per error kind.
//
// Any origin may call these routes.
// =============================================================================

use std::sync::Arc;

use axum::{
    extract::{rejection::QueryRejection, Json, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
    Router,
};
use serde::Serialize;
use tower_http::cors::{Any, CorsLayer};
use tracing::{info_span, warn, Instrument};
use uuid::Uuid;

use crate::app_state::AppState;
use crate::error::ReportError;
use crate::report::IndicatorReport;

const INDICATORS_ROUTE: &str = "/get-indicators-plus";

// =============================================================================
// Routing
// =============================================================================

/// Routes for the index, health probe and indicator report.
pub fn router(state: Arc<AppState>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/", get(index))
        .route("/api/v1/health", get(health))
        .route(INDICATORS_ROUTE, get(indicators_plus))
        .layer(cors)
        .with_state(state)
}

// =============================================================================
// Error mapping
// =============================================================================

impl IntoResponse for ReportError {
    fn into_response(self) -> Response {
        let status = match &self {
            ReportError::MissingInput(_) => StatusCode::BAD_REQUEST,
            ReportError::Misconfigured(_) => StatusCode::INTERNAL_SERVER_ERROR,
            ReportError::DataUnavailable(_) => StatusCode::BAD_REQUEST,
        };
        let body = serde_json::json!({ "error": self.to_string() });
        (status, Json(body)).into_response()
    }
}

// =============================================================================
// Index
// =============================================================================

async fn index(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let example = format!(
        "{INDICATORS_ROUTE}?symbol=AAPL&interval={}",
        state.runtime_config.default_interval
    );
    Json(serde_json::json!({ "ok": true, "routes": [example] }))
}

// =============================================================================
// Health
// =============================================================================

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    primary_configured: bool,
    secondary_configured: bool,
    server_time: i64,
}

async fn health(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let resp = HealthResponse {
        status: "ok",
        primary_configured: state.report_service.primary_configured(),
        secondary_configured: state.secondary_configured,
        server_time: chrono::Utc::now().timestamp_millis(),
    };
    Json(resp)
}

// =============================================================================
// Indicators
// =============================================================================

/// Query parameters for the report route. A repeated key keeps its first
/// value.
#[derive(Debug, Default, PartialEq)]
struct IndicatorsQuery {
    symbol: Option<String>,
    interval: Option<String>,
}

impl IndicatorsQuery {
    fn from_pairs(pairs: Vec<(String, String)>) -> Self {
        let mut query = Self::default();
        for (key, value) in pairs {
            let slot = match key.as_str() {
                "symbol" => &mut query.symbol,
                "interval" => &mut query.interval,
                _ => continue,
            };
            slot.get_or_insert(value);
        }
        query
    }
}

async fn indicators_plus(
    State(state): State<Arc<AppState>>,
    raw: Result<Query<Vec<(String, String)>>, QueryRejection>,
) -> Result<Json<IndicatorReport>, ReportError> {
    let Query(pairs) = raw.map_err(|e| ReportError::MissingInput(e.body_text()))?;
    let query = IndicatorsQuery::from_pairs(pairs);
    let request_id = Uuid::new_v4();
    let span = info_span!(
        "indicators_plus",
        %request_id,
        symbol = query.symbol.as_deref().unwrap_or(""),
    );

    let result = state
        .report_service
        .report(query.symbol.as_deref(), query.interval.as_deref())
        .instrument(span)
        .await;

    if let Err(e) = &result {
        warn!(%request_id, error = %e, "indicator report failed");
    }
    result.map(Json)
}
