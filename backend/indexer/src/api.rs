//! Axum REST API handlers.

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
use tracing::error;

use crate::db;
use crate::errors::IndexerError;
use crate::events::EventRecord;
use crate::positions::{self, LedgerSnapshot};

#[derive(Clone)]
pub struct ApiState {
    pub pool: SqlitePool,
}

/// All API routes; layers are added by the caller.
pub fn router(state: Arc<ApiState>) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/events", get(get_all_events))
        .route("/funders", get(get_funders))
        .route("/funders/:address/events", get(get_funder_events))
        .with_state(state)
}

// ─────────────────────────────────────────────────────────
// Response shapes
// ─────────────────────────────────────────────────────────

#[derive(Serialize)]
pub struct FunderEventsResponse {
    pub address: String,
    pub count: usize,
    pub events: Vec<EventRecord>,
}

#[derive(Serialize)]
pub struct AllEventsResponse {
    pub count: usize,
    pub events: Vec<EventRecord>,
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

fn internal_error(e: IndexerError) -> Response {
    error!("API query failed: {e}");
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(ErrorResponse {
            error: e.to_string(),
        }),
    )
        .into_response()
}

// ─────────────────────────────────────────────────────────
// Handlers
// ─────────────────────────────────────────────────────────

/// `GET /health`
pub async fn health() -> impl IntoResponse {
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
    })
}

/// `GET /events`
///
/// Returns every indexed event.
pub async fn get_all_events(State(state): State<Arc<ApiState>>) -> Response {
    match db::get_all_events(&state.pool).await {
        Ok(events) => {
            let count = events.len();
            (StatusCode::OK, Json(AllEventsResponse { count, events })).into_response()
        }
        Err(e) => internal_error(e),
    }
}

/// `GET /funders`
///
/// Returns the funding ledger replayed from indexed events: one position
/// per funder since the last withdrawal.
pub async fn get_funders(State(state): State<Arc<ApiState>>) -> Response {
    match db::get_all_events(&state.pool).await {
        Ok(events) => {
            let snapshot: LedgerSnapshot = positions::replay(&events);
            (StatusCode::OK, Json(snapshot)).into_response()
        }
        Err(e) => internal_error(e),
    }
}

/// `GET /funders/:address/events`
///
/// Returns every event where `address` was the funder or the withdrawing owner.
pub async fn get_funder_events(
    State(state): State<Arc<ApiState>>,
    Path(address): Path<String>,
) -> Response {
    match db::get_events_for_actor(&state.pool, &address).await {
        Ok(events) => {
            let count = events.len();
            (
                StatusCode::OK,
                Json(FunderEventsResponse {
                    address,
                    count,
                    events,
                }),
            )
                .into_response()
        }
        Err(e) => internal_error(e),
    }
}
