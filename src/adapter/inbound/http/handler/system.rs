//! Service banner, health and clock endpoints.

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use chrono::Utc;
use serde_json::{json, Value};

use crate::adapter::inbound::http::error::ApiResult;
use crate::adapter::inbound::http::state::AppState;
use crate::domain::Timeframe;
use crate::infrastructure::orchestration::scheduler::TimeStatus;

/// `GET /`
pub async fn index(State(state): State<AppState>) -> Json<Value> {
    let services = &state.services;
    Json(json!({
        "service": "solbot",
        "message": "Multi-Symbol Trading Bot",
        "version": env!("CARGO_PKG_VERSION"),
        "active_symbols": services.market.active_symbols(),
        "timeframes": Timeframe::ALL,
        "signal_timeframe": services.config.scheduler.signal_timeframe,
        "features": [
            "candle and price ingest",
            "technical indicators",
            "multi-timeframe analysis",
            "signal detection",
            "analysis verification",
            "clock-synchronized scheduler",
        ],
    }))
}

/// `GET /status`: 200 when every critical check passes, 503 otherwise.
pub async fn status(State(state): State<AppState>) -> ApiResult<Response> {
    let report = state.blocking(|services| Ok(services.health())).await?;
    let now = Utc::now();
    let healthy = report.is_healthy();
    let body = Json(json!({
        "status": if healthy { "healthy" } else { "unhealthy" },
        "version": env!("CARGO_PKG_VERSION"),
        "uptime_seconds": state.services.uptime(now).num_seconds(),
        "scheduler_running": state.services.scheduler.is_running(),
        "checks": report.checks(),
        "timestamp": now,
    }));
    let code = if healthy {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };
    Ok((code, body).into_response())
}

/// `GET /system/time-status`
pub async fn time_status(State(state): State<AppState>) -> Json<TimeStatus> {
    Json(state.services.scheduler.time_status(Utc::now()))
}
