//! API routes

use axum::extract::rejection::QueryRejection;
use axum::extract::{Query, State};
use axum::http::header;
use axum::response::IntoResponse;
use axum::routing::get;
use axum::{Json, Router};
use serde::Deserialize;
use serde_json::Value;
use tower_http::catch_panic::CatchPanicLayer;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use super::error::{panic_response, ApiError};
use super::state::AppState;
use crate::data::calendar::CalendarQuery;
use crate::data::CalendarEvent;

#[derive(Debug, Deserialize)]
pub struct QuoteParams {
    pub symbols: Option<String>,
}

/// Builds the API router
///
/// CORS is the outermost layer so that error and panic responses carry the
/// allow-origin header too.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/api/ff-calendar", get(ff_calendar))
        .route("/api/quotes", get(quotes))
        .route("/api/yahoo-rss", get(yahoo_rss))
        .with_state(state)
        .layer(CatchPanicLayer::custom(panic_response))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
}

/// GET /api/ff-calendar?date=YYYY-MM-DD&countries=USD,EUR&imp=high,medium
async fn ff_calendar(
    State(state): State<AppState>,
    query: Result<Query<CalendarQuery>, QueryRejection>,
) -> Result<Json<Vec<CalendarEvent>>, ApiError> {
    let Query(query) = query?;
    Ok(Json(state.calendar.resolve(&query).await))
}

/// GET /api/quotes?symbols=SPY,QQQ,^VIX
async fn quotes(
    State(state): State<AppState>,
    params: Result<Query<QuoteParams>, QueryRejection>,
) -> Result<Json<Value>, ApiError> {
    let Query(params) = params?;
    state
        .quotes
        .quotes(params.symbols.as_deref())
        .await
        .map(Json)
        .map_err(ApiError::Quotes)
}

/// GET /api/yahoo-rss
async fn yahoo_rss(State(state): State<AppState>) -> Result<impl IntoResponse, ApiError> {
    let feed = state.headlines.headlines().await.map_err(ApiError::Headlines)?;
    Ok(([(header::CONTENT_TYPE, "text/xml; charset=utf-8")], feed))
}
