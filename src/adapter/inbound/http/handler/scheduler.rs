//! Scheduler views, lifecycle and manual runs.

use axum::extract::State;
use axum::Json;
use chrono::Utc;
use serde_json::{json, Value};

use crate::adapter::inbound::http::error::ApiResult;
use crate::adapter::inbound::http::state::AppState;
use crate::application::verification::VerificationReport;
use crate::infrastructure::orchestration::scheduler::{SchedulerStatus, SignalRound, SyncInfo};

/// `GET /scheduler/status`
pub async fn status(State(state): State<AppState>) -> Json<SchedulerStatus> {
    Json(state.services.scheduler.status(Utc::now()))
}

/// `GET /scheduler/sync-info`
pub async fn sync_info(State(state): State<AppState>) -> Json<SyncInfo> {
    Json(state.services.scheduler.sync_info(Utc::now()))
}

/// `POST /scheduler/start`
pub async fn start(State(state): State<AppState>) -> Json<Value> {
    let scheduler = &state.services.scheduler;
    let started = scheduler.start();
    Json(json!({
        "started": started,
        "message": if started { "scheduler started" } else { "scheduler already running" },
        "status": scheduler.status(Utc::now()),
    }))
}

/// `POST /scheduler/stop`
pub async fn stop(State(state): State<AppState>) -> Json<Value> {
    let stopped = state.services.scheduler.stop().await;
    Json(json!({
        "stopped": stopped,
        "message": if stopped { "scheduler stopped" } else { "scheduler was not running" },
    }))
}

/// `POST /scheduler/signals/run`
pub async fn run_signals(State(state): State<AppState>) -> ApiResult<Json<SignalRound>> {
    let round = state
        .blocking(|s| Ok(s.scheduler.run_signal_check(Utc::now())))
        .await?;
    Ok(Json(round))
}

/// `POST /scheduler/verification/run`
pub async fn run_verification(
    State(state): State<AppState>,
) -> ApiResult<Json<VerificationReport>> {
    let report = state
        .blocking(|s| s.scheduler.run_verification(Utc::now()))
        .await?;
    Ok(Json(report))
}
