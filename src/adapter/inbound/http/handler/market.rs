//! Symbols, prices, candles, indicators and data maintenance.

use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use chrono::{DateTime, Utc};
use serde::Deserialize;
use serde_json::{json, Value};

use super::{parse_timeframe, path_symbol};
use crate::adapter::inbound::http::error::{ApiError, ApiResult};
use crate::adapter::inbound::http::state::AppState;
use crate::application::market::{
    FreshnessReport, IngestReport, MultiTimeframeReport, RefreshReport, TechnicalReport,
};
use crate::domain::symbol::parse_list;
use crate::domain::{timeframe, Candle, PriceTick, Symbol};
use crate::error::Error;

/// Largest candle page returned by `GET /candles`.
pub const MAX_CANDLE_LIMIT: usize = 1_000;

/// Bounds on indicator series length.
pub const PERIODS_RANGE: std::ops::RangeInclusive<usize> = 5..=500;

fn check_periods(periods: Option<usize>, default: usize) -> ApiResult<usize> {
    let periods = periods.unwrap_or(default);
    if PERIODS_RANGE.contains(&periods) {
        Ok(periods)
    } else {
        Err(ApiError::bad_request(format!(
            "periods must be between {} and {}",
            PERIODS_RANGE.start(),
            PERIODS_RANGE.end()
        )))
    }
}

/// `GET /symbols`
pub async fn symbols(State(state): State<AppState>) -> ApiResult<Json<Value>> {
    let known = state.blocking(|s| s.market.known_symbols()).await?;
    let active = state.services.market.active_symbols();
    Ok(Json(json!({
        "total": known.len(),
        "active": active,
        "symbols": known,
    })))
}

/// `GET /symbols/popular`
pub async fn popular() -> Json<Value> {
    let symbols: Vec<Value> = Symbol::popular()
        .iter()
        .map(|s| json!({ "symbol": s, "display_name": s.display_name() }))
        .collect();
    Json(json!({ "symbols": symbols }))
}

#[derive(Debug, Deserialize)]
pub struct ActiveSymbolsRequest {
    pub symbols: Vec<String>,
}

/// `PUT /symbols/active`
pub async fn set_active(
    State(state): State<AppState>,
    body: Result<Json<ActiveSymbolsRequest>, JsonRejection>,
) -> ApiResult<Json<Value>> {
    let Json(request) = body?;
    let symbols = parse_list(&request.symbols.join(",")).map_err(Error::from)?;
    let active = state.services.market.set_active_symbols(symbols)?;
    state.services.board.retain(&active);
    Ok(Json(json!({ "active": active })))
}

/// `GET /price/{symbol}`
pub async fn latest_price(
    State(state): State<AppState>,
    Path(raw): Path<String>,
) -> ApiResult<Json<PriceTick>> {
    let symbol = path_symbol(&raw)?;
    let tick = state
        .blocking(move |s| s.market.latest_price(&symbol))
        .await?;
    Ok(Json(tick))
}

#[derive(Debug, Deserialize)]
pub struct PriceRequest {
    pub price: f64,
    #[serde(default)]
    pub volume_24h: f64,
    #[serde(default)]
    pub change_24h: f64,
    pub timestamp: Option<DateTime<Utc>>,
}

/// `POST /price/{symbol}`
pub async fn ingest_price(
    State(state): State<AppState>,
    Path(raw): Path<String>,
    body: Result<Json<PriceRequest>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<PriceTick>)> {
    let symbol = path_symbol(&raw)?;
    let Json(request) = body?;
    let tick = PriceTick::try_new(
        symbol,
        request.price,
        request.volume_24h,
        request.change_24h,
        request.timestamp.unwrap_or_else(Utc::now),
    )
    .map_err(Error::from)?;

    let stored = tick.clone();
    state
        .blocking(move |s| s.market.ingest_price(&stored))
        .await?;
    Ok((StatusCode::CREATED, Json(tick)))
}

#[derive(Debug, Deserialize)]
pub struct LimitQuery {
    pub limit: Option<usize>,
}

/// `GET /candles/{symbol}/{timeframe}`
pub async fn candles(
    State(state): State<AppState>,
    Path((raw_symbol, raw_timeframe)): Path<(String, String)>,
    query: Result<Query<LimitQuery>, QueryRejection>,
) -> ApiResult<Json<Value>> {
    let symbol = path_symbol(&raw_symbol)?;
    let timeframe = parse_timeframe(&raw_timeframe)?;
    let Query(query) = query?;
    let limit = query.limit.unwrap_or(100).clamp(1, MAX_CANDLE_LIMIT);

    let lookup = symbol.clone();
    let candles = state
        .blocking(move |s| s.market.latest_candles(&lookup, timeframe, limit))
        .await?;
    Ok(Json(json!({
        "symbol": symbol,
        "timeframe": timeframe,
        "count": candles.len(),
        "candles": candles,
    })))
}

#[derive(Debug, Deserialize)]
pub struct CandleBatch {
    pub candles: Vec<Candle>,
}

/// `POST /candles/{symbol}/{timeframe}`
pub async fn ingest_candles(
    State(state): State<AppState>,
    Path((raw_symbol, raw_timeframe)): Path<(String, String)>,
    body: Result<Json<CandleBatch>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<IngestReport>)> {
    let symbol = path_symbol(&raw_symbol)?;
    let timeframe = parse_timeframe(&raw_timeframe)?;
    let Json(batch) = body?;
    if batch.candles.is_empty() {
        return Err(ApiError::bad_request("candles must not be empty"));
    }

    let report = state
        .blocking(move |s| s.market.ingest_candles(&symbol, timeframe, batch.candles))
        .await?;
    Ok((StatusCode::CREATED, Json(report)))
}

#[derive(Debug, Deserialize)]
pub struct PeriodsQuery {
    pub periods: Option<usize>,
}

/// `GET /indicators/{symbol}/{timeframe}`
pub async fn indicators(
    State(state): State<AppState>,
    Path((raw_symbol, raw_timeframe)): Path<(String, String)>,
    query: Result<Query<PeriodsQuery>, QueryRejection>,
) -> ApiResult<Json<TechnicalReport>> {
    let symbol = path_symbol(&raw_symbol)?;
    let timeframe = parse_timeframe(&raw_timeframe)?;
    let Query(query) = query?;
    let periods = check_periods(query.periods, state.services.market.default_periods())?;

    let report = state
        .blocking(move |s| {
            s.market
                .technical_report(&symbol, timeframe, periods, Utc::now())
        })
        .await?;
    Ok(Json(report))
}

#[derive(Debug, Deserialize)]
pub struct MultiQuery {
    /// Comma-separated timeframes.
    pub timeframes: Option<String>,
    pub periods: Option<usize>,
}

/// `GET /indicators/multi/{symbol}`
pub async fn multi_indicators(
    State(state): State<AppState>,
    Path(raw): Path<String>,
    query: Result<Query<MultiQuery>, QueryRejection>,
) -> ApiResult<Json<MultiTimeframeReport>> {
    let symbol = path_symbol(&raw)?;
    let Query(query) = query?;
    let periods = check_periods(query.periods, state.services.market.default_periods())?;
    let timeframes = match query.timeframes.as_deref() {
        Some(raw) => timeframe::parse_list(raw).map_err(Error::from)?,
        None => state.services.market.timeframes().to_vec(),
    };
    if timeframes.is_empty() {
        return Err(ApiError::bad_request("timeframes must not be empty"));
    }

    let report = state
        .blocking(move |s| {
            s.market
                .multi_timeframe(&symbol, &timeframes, periods, Utc::now())
        })
        .await?;
    Ok(Json(report))
}

#[derive(Debug, Deserialize)]
pub struct SymbolsQuery {
    /// Comma-separated symbols; defaults to the active set.
    pub symbols: Option<String>,
}

/// `POST /data/refresh`
pub async fn refresh(
    State(state): State<AppState>,
    query: Result<Query<SymbolsQuery>, QueryRejection>,
) -> ApiResult<Json<RefreshReport>> {
    let Query(query) = query?;
    let symbols = match query.symbols.as_deref() {
        Some(raw) => parse_list(raw).map_err(Error::from)?,
        None => state.services.market.active_symbols(),
    };

    let report = state
        .blocking(move |s| {
            let timeframes = s.market.timeframes().to_vec();
            Ok(s.market.refresh(&symbols, &timeframes, Utc::now()))
        })
        .await?;
    Ok(Json(report))
}

#[derive(Debug, Deserialize)]
pub struct SymbolQuery {
    pub symbol: Option<String>,
}

/// `GET /data/freshness`
pub async fn freshness(
    State(state): State<AppState>,
    query: Result<Query<SymbolQuery>, QueryRejection>,
) -> ApiResult<Json<FreshnessReport>> {
    let Query(query) = query?;
    let symbol = query
        .symbol
        .as_deref()
        .map(Symbol::normalize)
        .transpose()
        .map_err(Error::from)?;

    let report = state
        .blocking(move |s| s.market.freshness(symbol.as_ref(), Utc::now()))
        .await?;
    Ok(Json(report))
}
