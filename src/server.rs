//! HTTP ingress for staging-write events.
//!
//! The hosting platform posts the new value of
//! `room-messages/{roomId}/TRANSLATE/{messageId}` to this service. A failed
//! fan-out answers `502` so the platform redelivers the event.

use crate::error::FanOutError;
use crate::fanout::TranslationFanOut;
use crate::i18n::TranslationMetrics;
use crate::message::{parse_payload, StagingEvent};
use crate::retry::{with_retry_if, RetryConfig};
use crate::security::{secret_matches, WEBHOOK_SECRET_HEADER};
use crate::store::is_valid_segment;
use axum::body::Bytes;
use axum::extract::{Path, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde_json::json;
use std::sync::Arc;
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

/// Shared state for request handlers.
#[derive(Clone)]
pub struct AppState {
    pub fanout: Arc<TranslationFanOut>,
    pub webhook_secret: Option<String>,
    pub redelivery: RetryConfig,
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/metrics", get(metrics))
        .route(
            "/events/room-messages/:room_id/TRANSLATE/:message_id",
            post(handle_staging_write),
        )
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn health() -> &'static str {
    "OK"
}

async fn metrics() -> impl IntoResponse {
    Json(TranslationMetrics::global().report())
}

fn error_response(status: StatusCode, message: impl Into<String>) -> Response {
    (status, Json(json!({ "error": message.into() }))).into_response()
}

async fn handle_staging_write(
    State(state): State<AppState>,
    Path((room_id, message_id)): Path<(String, String)>,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    let provided = headers
        .get(WEBHOOK_SECRET_HEADER)
        .and_then(|v| v.to_str().ok());
    if !secret_matches(state.webhook_secret.as_deref(), provided) {
        warn!("Rejected staging event for {}/{}: bad secret", room_id, message_id);
        return error_response(StatusCode::UNAUTHORIZED, "invalid webhook secret");
    }

    if !is_valid_segment(&room_id) || !is_valid_segment(&message_id) {
        return error_response(StatusCode::BAD_REQUEST, "invalid room or message id");
    }

    let payload = match parse_payload(&body) {
        Ok(Some(payload)) => payload,
        Ok(None) => {
            info!("Staging record {}/{} deleted, nothing to translate", room_id, message_id);
            return StatusCode::NO_CONTENT.into_response();
        }
        Err(e) => {
            warn!("Malformed staging payload for {}/{}: {}", room_id, message_id, e);
            return error_response(StatusCode::BAD_REQUEST, format!("malformed payload: {}", e));
        }
    };

    let event = StagingEvent::new(room_id, message_id, payload);
    let operation = format!("Fan-out {}/{}", event.room_id, event.message_id);

    let result = with_retry_if(
        &state.redelivery,
        &operation,
        || state.fanout.run(&event),
        FanOutError::is_transient,
    )
    .await;

    match result {
        Ok(report) => (StatusCode::OK, Json(report)).into_response(),
        Err(err) => {
            let failed: Vec<_> = err.failures.iter().map(|f| f.target().to_string()).collect();
            (
                StatusCode::BAD_GATEWAY,
                Json(json!({
                    "error": err.to_string(),
                    "failed": failed,
                })),
            )
                .into_response()
        }
    }
}
