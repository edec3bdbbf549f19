//! HTTP request handlers for web adapter.

use axum::{
    Json,
    extract::{
        Query, State,
        rejection::{JsonRejection, QueryRejection},
    },
};
use chrono::NaiveDateTime;
use serde::Deserialize;
use serde_json::{Value, json};
use std::sync::Arc;
use tracing::{info, warn};

use crate::domain::error::CrossoverError;
use crate::domain::price_bar::{PriceBar, StoredBar};
use crate::domain::signal::PerformanceSummary;
use crate::domain::timestamp;

use super::{AppState, WebError};

/// Runs a store operation off the async executor.
async fn blocking<T, F>(f: F) -> Result<T, WebError>
where
    F: FnOnce() -> Result<T, CrossoverError> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(f)
        .await
        .map_err(|e| WebError::internal(format!("store task failed: {e}")))?
        .map_err(WebError::from)
}

pub async fn health() -> Json<Value> {
    Json(json!({ "ok": true }))
}

pub async fn not_found() -> WebError {
    WebError::not_found("no such route")
}

pub async fn create_bar(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<PriceBar>, JsonRejection>,
) -> Result<Json<StoredBar>, WebError> {
    let Json(mut bar) = payload?;
    bar.instrument = bar.instrument.trim().to_string();
    bar.validate()?;

    let store = Arc::clone(&state.store);
    let result = blocking(move || store.insert(&bar)).await;

    match &result {
        Ok(stored) => info!(id = stored.id, instrument = %stored.bar.instrument, "stored bar"),
        Err(e) => warn!(status = %e.status, error = %e.message, "rejected bar"),
    }
    result.map(Json)
}

#[derive(Debug, Deserialize)]
pub struct ListParams {
    pub instrument: Option<String>,
}

pub async fn list_bars(
    State(state): State<Arc<AppState>>,
    params: Result<Query<ListParams>, QueryRejection>,
) -> Result<Json<Vec<StoredBar>>, WebError> {
    let Query(params) = params?;
    let store = Arc::clone(&state.store);

    let bars = blocking(move || match params.instrument {
        Some(instrument) => store.list(&instrument),
        None => store.list_all(),
    })
    .await?;

    Ok(Json(bars))
}

#[derive(Debug, Deserialize)]
pub struct StrategyParams {
    pub instrument: Option<String>,
    pub short_window: Option<i64>,
    pub long_window: Option<i64>,
}

pub async fn stored_performance(
    State(state): State<Arc<AppState>>,
    params: Result<Query<StrategyParams>, QueryRejection>,
) -> Result<Json<PerformanceSummary>, WebError> {
    let Query(params) = params?;
    let strategy = state.strategy.with_overrides(params.short_window, params.long_window)?;
    let instrument = params
        .instrument
        .unwrap_or_else(|| state.default_instrument.clone());

    let store = Arc::clone(&state.store);
    let bars = blocking(move || store.list(&instrument)).await?;

    Ok(Json(strategy.evaluate_bars(&bars)?))
}

#[derive(Debug, Deserialize)]
pub struct SeriesRequest {
    #[serde(deserialize_with = "timestamp::deserialize_all")]
    pub timestamps: Vec<NaiveDateTime>,
    pub closes: Vec<f64>,
    pub short_window: Option<i64>,
    pub long_window: Option<i64>,
}

pub async fn series_performance(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<SeriesRequest>, JsonRejection>,
) -> Result<Json<PerformanceSummary>, WebError> {
    let Json(req) = payload?;
    let strategy = state.strategy.with_overrides(req.short_window, req.long_window)?;
    Ok(Json(strategy.evaluate(&req.timestamps, &req.closes)?))
}
