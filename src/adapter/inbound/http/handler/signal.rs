//! Signal previews and the signal board.

use axum::extract::rejection::QueryRejection;
use axum::extract::{Path, Query, State};
use axum::Json;
use chrono::Utc;
use serde::Deserialize;
use serde_json::{json, Value};

use super::{parse_timeframe, path_symbol};
use crate::adapter::inbound::http::error::ApiResult;
use crate::adapter::inbound::http::state::AppState;
use crate::domain::signal::describe;
use crate::domain::{SignalSummary, Timeframe};

#[derive(Debug, Deserialize)]
pub struct TimeframeQuery {
    pub timeframe: Option<String>,
}

fn timeframe_or_default(state: &AppState, raw: Option<&str>) -> ApiResult<Timeframe> {
    raw.map_or(
        Ok(state.services.config.scheduler.signal_timeframe),
        parse_timeframe,
    )
}

/// `GET /signals/{symbol}`: detection without touching the cooldown.
pub async fn preview(
    State(state): State<AppState>,
    Path(raw): Path<String>,
    query: Result<Query<TimeframeQuery>, QueryRejection>,
) -> ApiResult<Json<Value>> {
    let symbol = path_symbol(&raw)?;
    let Query(query) = query?;
    let timeframe = timeframe_or_default(&state, query.timeframe.as_deref())?;

    let lookup = symbol.clone();
    let signals = state
        .blocking(move |s| s.detector.preview(&lookup, timeframe))
        .await?;
    Ok(Json(json!({
        "symbol": symbol,
        "symbol_display": symbol.display_name(),
        "timeframe": timeframe,
        "count": signals.len(),
        "description": describe(&signals),
        "signals": signals,
        "timestamp": Utc::now(),
    })))
}

/// `GET /signals/all`: preview across the active symbols.
pub async fn preview_all(
    State(state): State<AppState>,
    query: Result<Query<TimeframeQuery>, QueryRejection>,
) -> ApiResult<Json<Value>> {
    let Query(query) = query?;
    let timeframe = timeframe_or_default(&state, query.timeframe.as_deref())?;

    let signals = state
        .blocking(move |s| {
            let symbols = s.market.active_symbols();
            Ok(s.detector.preview_all(&symbols, timeframe).signals)
        })
        .await?;
    let summary = SignalSummary::from_signals(&signals, Utc::now());
    Ok(Json(json!({
        "timeframe": timeframe,
        "signals": signals,
        "summary": summary,
    })))
}

/// `GET /signals/latest`: results of scheduled detection rounds.
pub async fn latest(State(state): State<AppState>) -> Json<Value> {
    let board = &state.services.board;
    Json(json!({
        "symbols": board.latest(),
        "last_round": board.last_round(),
    }))
}
