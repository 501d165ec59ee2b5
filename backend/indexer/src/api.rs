//! Axum REST API over the indexed sale events.

use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use serde::Serialize;
use sqlx::SqlitePool;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::error;

use crate::db;
use crate::errors::IndexerError;
use crate::events::EventRecord;

#[derive(Clone)]
pub struct ApiState {
    pub pool: SqlitePool,
}

pub fn router(state: Arc<ApiState>) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/events", get(get_all_events))
        .route("/relays/:id/events", get(get_relay_events))
        .route("/contributors/:address/events", get(get_contributor_events))
        .route("/sale", get(get_sale))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

#[derive(Serialize)]
pub struct EventsResponse {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub relay_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub contributor: Option<String>,
    pub count: usize,
    pub events: Vec<EventRecord>,
}

impl EventsResponse {
    fn new(events: Vec<EventRecord>) -> Self {
        EventsResponse {
            relay_id: None,
            contributor: None,
            count: events.len(),
            events,
        }
    }
}

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub version: &'static str,
}

#[derive(Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

impl IntoResponse for IndexerError {
    fn into_response(self) -> Response {
        error!("API request failed: {self}");
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(ErrorResponse {
                error: self.to_string(),
            }),
        )
            .into_response()
    }
}

type ApiResult<T> = std::result::Result<Json<T>, IndexerError>;

/// `GET /health`
pub async fn health() -> impl IntoResponse {
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
    })
}

/// `GET /events`
pub async fn get_all_events(State(state): State<Arc<ApiState>>) -> ApiResult<EventsResponse> {
    let events = db::get_all_events(&state.pool).await?;
    Ok(Json(EventsResponse::new(events)))
}

/// `GET /relays/:id/events`
pub async fn get_relay_events(
    State(state): State<Arc<ApiState>>,
    Path(relay_id): Path<u32>,
) -> ApiResult<EventsResponse> {
    let relay_id = relay_id.to_string();
    let events = db::get_events_for_relay(&state.pool, &relay_id).await?;
    Ok(Json(EventsResponse {
        relay_id: Some(relay_id),
        ..EventsResponse::new(events)
    }))
}

/// `GET /contributors/:address/events`
///
/// Relay, contribution and refund events for one contributor account.
pub async fn get_contributor_events(
    State(state): State<Arc<ApiState>>,
    Path(address): Path<String>,
) -> ApiResult<EventsResponse> {
    let events = db::get_events_for_contributor(&state.pool, &address).await?;
    Ok(Json(EventsResponse {
        contributor: Some(address),
        ..EventsResponse::new(events)
    }))
}

/// `GET /sale`
pub async fn get_sale(State(state): State<Arc<ApiState>>) -> ApiResult<crate::events::SaleSummary> {
    Ok(Json(db::sale_summary(&state.pool).await?))
}
