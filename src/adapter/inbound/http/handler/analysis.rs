//! Recording and listing analyses.

use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::Json;
use chrono::Utc;
use serde::Deserialize;
use serde_json::{json, Value};

use crate::adapter::inbound::http::error::ApiResult;
use crate::adapter::inbound::http::state::AppState;
use crate::domain::{AnalysisRecord, NewAnalysis, Recommendation, Symbol};
use crate::error::Error;

/// Largest history page.
pub const MAX_HISTORY_LIMIT: usize = 500;

#[derive(Debug, Deserialize)]
pub struct AnalysisRequest {
    pub symbol: Option<String>,
    pub agent_name: Option<String>,
    /// BUY, SELL or HOLD in any case.
    pub recommendation: String,
    pub confidence: f64,
    #[serde(default)]
    pub analysis: String,
    pub entry_price: f64,
    pub target_price: Option<f64>,
    pub stop_loss: Option<f64>,
}

impl AnalysisRequest {
    fn into_new(self, default_symbol: Symbol) -> crate::error::Result<NewAnalysis> {
        let symbol = match self.symbol.as_deref() {
            Some(raw) => Symbol::normalize(raw)?,
            None => default_symbol,
        };
        Ok(NewAnalysis {
            symbol,
            agent_name: self.agent_name,
            recommendation: self.recommendation.parse::<Recommendation>()?,
            confidence: self.confidence,
            analysis: self.analysis,
            entry_price: self.entry_price,
            target_price: self.target_price,
            stop_loss: self.stop_loss,
        })
    }
}

/// `POST /analysis`
pub async fn record(
    State(state): State<AppState>,
    body: Result<Json<AnalysisRequest>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<AnalysisRecord>)> {
    let Json(request) = body?;
    let analysis = request.into_new(state.services.config.default_symbol()?)?;
    let record = state
        .blocking(move |s| s.verifier.record(&analysis, Utc::now()))
        .await?;
    Ok((StatusCode::CREATED, Json(record)))
}

#[derive(Debug, Deserialize)]
pub struct HistoryQuery {
    pub limit: Option<usize>,
    pub symbol: Option<String>,
}

/// `GET /analysis/history`
pub async fn history(
    State(state): State<AppState>,
    query: Result<Query<HistoryQuery>, QueryRejection>,
) -> ApiResult<Json<Value>> {
    let Query(query) = query?;
    let limit = query.limit.unwrap_or(50).clamp(1, MAX_HISTORY_LIMIT);
    let symbol = query
        .symbol
        .as_deref()
        .map(Symbol::normalize)
        .transpose()
        .map_err(Error::from)?;

    let analyses = state
        .blocking(move |s| s.verifier.history(symbol.as_ref(), limit))
        .await?;
    Ok(Json(json!({
        "count": analyses.len(),
        "analyses": analyses,
    })))
}
