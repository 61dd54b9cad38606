//! Route table.

use axum::http::{StatusCode, Uri};
use axum::routing::{get, post, put};
use axum::Router;
use tower_http::trace::TraceLayer;

use super::error::ApiError;
use super::handler::{analysis, market, scheduler, signal, system};
use super::state::AppState;

/// Build the API router over shared state.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(system::index))
        .route("/status", get(system::status))
        .route("/system/time-status", get(system::time_status))
        .route("/symbols", get(market::symbols))
        .route("/symbols/popular", get(market::popular))
        .route("/symbols/active", put(market::set_active))
        .route(
            "/price/:symbol",
            get(market::latest_price).post(market::ingest_price),
        )
        .route(
            "/candles/:symbol/:timeframe",
            get(market::candles).post(market::ingest_candles),
        )
        .route("/indicators/multi/:symbol", get(market::multi_indicators))
        .route("/indicators/:symbol/:timeframe", get(market::indicators))
        .route("/data/refresh", post(market::refresh))
        .route("/data/freshness", get(market::freshness))
        .route("/signals/all", get(signal::preview_all))
        .route("/signals/latest", get(signal::latest))
        .route("/signals/:symbol", get(signal::preview))
        .route("/analysis", post(analysis::record))
        .route("/analysis/history", get(analysis::history))
        .route("/scheduler/status", get(scheduler::status))
        .route("/scheduler/sync-info", get(scheduler::sync_info))
        .route("/scheduler/start", post(scheduler::start))
        .route("/scheduler/stop", post(scheduler::stop))
        .route("/scheduler/signals/run", post(scheduler::run_signals))
        .route(
            "/scheduler/verification/run",
            post(scheduler::run_verification),
        )
        .fallback(not_found)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn not_found(uri: Uri) -> ApiError {
    ApiError::new(StatusCode::NOT_FOUND, format!("no route for {}", uri.path()))
}
